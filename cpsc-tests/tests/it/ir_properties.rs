// Copyright 2025-2026 Neil Henderson

//! Property tests over generated quadruple streams, checked for every scenario program: label
//! uniqueness and liveness, temporary single-writer discipline, function bracketing, parameter
//! grouping, and the overall shape of the emitted assembly.

use std::collections::{HashMap, HashSet};

use cpsc_tests::{compile_to_assembly, quads_for};
use libcpsc::compiler_driver::Driver;
use libcpsc::ir::{QuadOp, Quadruple, TempMaker};
use libcpsc::{lexer, parser, sema};

/// Scenario programs covering loops, functions, arrays, classes, closures and short-circuit
/// evaluation.
const PROGRAMS: &[&str] = &[
    // S1: while
    "let i = 0; while (i < 3) { print(i); i = i + 1; }",
    // S2: for
    "let s = 0; for (let i = 1; i <= 4; i = i + 1) { s = s + i; } print(s);",
    // S3: recursion
    "function fact(n: integer): integer { if (n <= 1) { return 1; } return n * fact(n - 1); } print(fact(5));",
    // S4: foreach over an array
    "let a: integer[] = [10, 20, 30]; let s = 0; foreach (x in a) { s = s + x; } print(s);",
    // S5: classes
    "class P { var x: integer; var y: integer; function sum(): integer { return this.x + this.y; } } \
     let p = new P(); p.x = 3; p.y = 4; print(p.sum());",
    // S6: short-circuit
    "let a = 1; let b = 0; if (a == 1 && b == 0) { print(1); } else { print(0); }",
    // Closures over a global
    "let total = 0; function add(n: integer) { total = total + n; } add(3); add(4); print(total);",
    // Nested functions and an environment chain
    "function outer(): integer { let x = 1; function middle(): integer { \
         function inner(): integer { return x; } return inner(); } return middle(); } print(outer());",
    // Mixed control flow
    "let n = 10; let i = 0; do { i = i + 1; if (i % 2 == 0) { continue; } if (i > 7) { break; } } while (i < n); \
     print(i > 5 ? \"big\" : \"small\");",
];

#[test]
fn scope_stack_balances_for_every_program() {
    // The analyzer asserts enter/exit balance internally; a completed analysis with the global
    // dump present means every nested scope was popped.
    for source in PROGRAMS {
        let mut driver = Driver::for_testing();
        let tokens = lexer::lex(&mut driver, source);
        let program = parser::parse(&mut driver, tokens);
        let analysis = sema::analyze(&mut driver, &program);

        assert!(!driver.has_error_diagnostics());
        assert!(analysis.scope_dump().contains("Global"));
    }
}

#[test]
fn labels_are_defined_once_and_referenced() {
    for source in PROGRAMS {
        let quads = quads_for(source);

        let mut defined: HashMap<&str, usize> = HashMap::new();
        let mut referenced: HashSet<&str> = HashSet::new();

        for quad in &quads {
            match quad.op {
                QuadOp::Label => {
                    *defined.entry(quad.arg1.as_deref().unwrap()).or_insert(0) += 1;
                }
                _ => {
                    if quad.is_jump() {
                        referenced.insert(quad.label_operand().unwrap());
                    }
                }
            }
        }

        for (label, count) in &defined {
            assert_eq!(*count, 1, "label '{label}' defined {count} times in: {source}");
            assert!(referenced.contains(label), "label '{label}' is never referenced in: {source}");
        }

        for label in &referenced {
            assert!(defined.contains_key(label), "jump target '{label}' is undefined in: {source}");
        }
    }
}

#[test]
fn temporaries_are_single_writer_within_basic_blocks() {
    // Basic blocks end at labels and after any jump or return. Within a block, overwriting a
    // temporary whose value was never read would lose it; a second write is only legal after a
    // read of the first.
    for source in PROGRAMS {
        let quads = quads_for(source);

        for block in basic_blocks(&quads) {
            let mut unread_write: HashSet<&str> = HashSet::new();

            for quad in block {
                for read in read_temps(quad) {
                    unread_write.remove(read);
                }

                if let Some(written) = written_temp(quad) {
                    assert!(
                        !unread_write.contains(written),
                        "'{written}' written twice without an intervening read in: {source}"
                    );
                    unread_write.insert(written);
                }
            }
        }
    }
}

#[test]
fn functions_are_bracketed_and_never_nest() {
    for source in PROGRAMS {
        let quads = quads_for(source);

        let mut open: Option<&str> = None;
        let mut seen: HashSet<&str> = HashSet::new();

        for quad in &quads {
            match quad.op {
                QuadOp::BeginFunc => {
                    let name = quad.arg1.as_deref().unwrap();
                    assert!(open.is_none(), "BEGIN_FUNC '{name}' nested inside another function in: {source}");
                    assert!(seen.insert(name), "function '{name}' defined twice in: {source}");
                    open = Some(name);
                }
                QuadOp::EndFunc => {
                    assert_eq!(open, quad.arg1.as_deref(), "mismatched END_FUNC in: {source}");
                    open = None;
                }
                _ => {}
            }
        }

        assert!(open.is_none(), "unterminated function block in: {source}");
    }
}

#[test]
fn params_group_directly_before_their_call() {
    for source in PROGRAMS {
        let quads = quads_for(source);

        for (index, quad) in quads.iter().enumerate() {
            // Every PARAM run must terminate in a call.
            if quad.op == QuadOp::Param {
                let next_non_param = quads[index..].iter().find(|q| q.op != QuadOp::Param).unwrap();
                assert!(
                    matches!(next_non_param.op, QuadOp::Call | QuadOp::CallMethod),
                    "PARAM not followed by a call in: {source}"
                );
            }

            // A CALL with n arguments sits directly after exactly n PARAMs.
            if quad.op == QuadOp::Call {
                let count: usize = quad.arg2.as_deref().unwrap().parse().unwrap();

                for back in 1..=count {
                    assert_eq!(quads[index - back].op, QuadOp::Param, "missing PARAM {back} in: {source}");
                }

                if index > count {
                    assert_ne!(quads[index - count - 1].op, QuadOp::Param, "extra PARAM in: {source}");
                }
            }
        }
    }
}

#[test]
fn assembly_is_structurally_sound() {
    for source in PROGRAMS {
        let asm = compile_to_assembly(source);

        assert!(asm.contains(".data"));
        assert!(asm.contains(".text"));
        assert!(asm.contains(".globl main"));
        assert!(asm.contains("li $v0, 10"), "missing program exit in assembly for: {source}");

        // Every jump or call target is defined as a label.
        let defined: HashSet<&str> = asm
            .lines()
            .filter(|line| !line.starts_with(' ') && line.ends_with(':'))
            .map(|line| line.trim_end_matches(':'))
            .collect();

        for line in asm.lines() {
            let line = line.trim();
            let target = if let Some(rest) = line.strip_prefix("j ") {
                Some(rest)
            } else if let Some(rest) = line.strip_prefix("jal ") {
                Some(rest)
            } else if let Some(rest) = line.strip_prefix("beqz ").or_else(|| line.strip_prefix("bnez ")) {
                rest.split(", ").nth(1)
            } else {
                None
            };

            if let Some(target) = target {
                assert!(defined.contains(target), "'{target}' is not defined in the assembly for: {source}");
            }
        }
    }
}

// ---------------- Quadruple classification ----------------

/// Splits a stream into basic blocks: a `LABEL` begins a new block, a jump or return ends one.
fn basic_blocks(quads: &[Quadruple]) -> Vec<Vec<&Quadruple>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&Quadruple> = Vec::new();

    for quad in quads {
        match quad.op {
            QuadOp::Label | QuadOp::BeginFunc | QuadOp::EndFunc => {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            }
            QuadOp::Goto | QuadOp::IfFalse | QuadOp::IfTrue | QuadOp::Return => {
                current.push(quad);
                blocks.push(std::mem::take(&mut current));
            }
            _ => current.push(quad),
        }
    }

    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// The temporary a quadruple writes, if any.
fn written_temp(quad: &Quadruple) -> Option<&str> {
    let writes_result = matches!(
        quad.op,
        QuadOp::Add
            | QuadOp::Sub
            | QuadOp::Mul
            | QuadOp::Div
            | QuadOp::Mod
            | QuadOp::Neg
            | QuadOp::And
            | QuadOp::Or
            | QuadOp::Not
            | QuadOp::Lt
            | QuadOp::Le
            | QuadOp::Gt
            | QuadOp::Ge
            | QuadOp::Eq
            | QuadOp::Ne
            | QuadOp::Assign
            | QuadOp::Copy
            | QuadOp::Call
            | QuadOp::CallMethod
            | QuadOp::ArrayNew
            | QuadOp::ArrayLoad
            | QuadOp::ArrayLen
            | QuadOp::New
            | QuadOp::GetField
    );

    if !writes_result {
        return None;
    }

    quad.result.as_deref().filter(|token| TempMaker::is_temp(token))
}

/// The temporaries a quadruple reads.
fn read_temps(quad: &Quadruple) -> Vec<&str> {
    let tokens: Vec<Option<&str>> = match quad.op {
        QuadOp::Add
        | QuadOp::Sub
        | QuadOp::Mul
        | QuadOp::Div
        | QuadOp::Mod
        | QuadOp::And
        | QuadOp::Or
        | QuadOp::Lt
        | QuadOp::Le
        | QuadOp::Gt
        | QuadOp::Ge
        | QuadOp::Eq
        | QuadOp::Ne => vec![quad.arg1.as_deref(), quad.arg2.as_deref()],

        QuadOp::Neg | QuadOp::Not | QuadOp::Assign | QuadOp::Copy => vec![quad.arg1.as_deref()],

        QuadOp::IfFalse | QuadOp::IfTrue | QuadOp::Param | QuadOp::Return | QuadOp::Print => {
            vec![quad.arg1.as_deref()]
        }

        QuadOp::ArrayNew | QuadOp::ArrayLen | QuadOp::GetField => vec![quad.arg1.as_deref()],

        QuadOp::ArrayLoad => vec![quad.arg1.as_deref(), quad.arg2.as_deref()],

        // value, array, index
        QuadOp::ArrayStore => vec![quad.arg1.as_deref(), quad.arg2.as_deref(), quad.result.as_deref()],

        // value, object
        QuadOp::SetField => vec![quad.arg1.as_deref(), quad.arg2.as_deref()],

        // receiver
        QuadOp::CallMethod => vec![quad.arg1.as_deref()],

        QuadOp::New | QuadOp::Goto | QuadOp::Label | QuadOp::Call | QuadOp::BeginFunc | QuadOp::EndFunc => vec![],
    };

    tokens.into_iter().flatten().filter(|token| TempMaker::is_temp(token)).collect()
}
