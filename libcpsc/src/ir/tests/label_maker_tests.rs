// Copyright 2025-2026 Neil Henderson

use super::super::label_maker::{LabelMaker, LoopLabels, LoopStack};

#[test]
fn per_prefix_counters_are_independent() {
    let mut maker = LabelMaker::new();

    assert_eq!(maker.new_label("WHILE"), "L_WHILE_0");
    assert_eq!(maker.new_label("WHILE"), "L_WHILE_1");
    assert_eq!(maker.new_label("IF_END"), "L_IF_END_0");
    assert_eq!(maker.new_label("WHILE"), "L_WHILE_2");
    assert_eq!(maker.new_label("IF_END"), "L_IF_END_1");
    assert_eq!(maker.new_label("AND"), "L_AND_0");
}

#[test]
fn loop_stack_tracks_the_innermost_loop() {
    let mut stack = LoopStack::new();
    assert!(stack.break_label().is_none());
    assert!(stack.continue_label().is_none());

    stack.push(LoopLabels {
        start: "L_WHILE_0".to_string(),
        end: "L_WHILE_1".to_string(),
        continue_label: "L_WHILE_0".to_string(),
    });
    stack.push(LoopLabels {
        start: "L_FOR_0".to_string(),
        end: "L_FOR_1".to_string(),
        continue_label: "L_FOR_2".to_string(),
    });

    assert_eq!(stack.depth(), 2);
    assert_eq!(stack.break_label(), Some("L_FOR_1"));
    assert_eq!(stack.continue_label(), Some("L_FOR_2"));

    stack.pop();
    assert_eq!(stack.break_label(), Some("L_WHILE_1"));
    assert_eq!(stack.continue_label(), Some("L_WHILE_0"));
}
