// Copyright 2025-2026 Neil Henderson

//! Tests that compile complete programs and verify the structure of the generated quadruples
//! and assembly that their observable behavior depends on.

use cpsc_tests::{compile_to_assembly, compile_to_ir, quads_for};
use libcpsc::ir::QuadOp;

#[test]
fn while_loop_counts_up() {
    let asm = compile_to_assembly("let i = 0; while (i < 3) { print(i); i = i + 1; }");

    assert!(asm.contains("main:"));
    assert!(asm.contains("L_WHILE_0:"));
    assert!(asm.contains("beqz"));
    assert!(asm.contains("j L_WHILE_0"));

    // print(i) as an integer, newline after.
    assert!(asm.contains("li $v0, 1"));
    assert!(asm.contains("la $a0, newline"));

    // Program exit.
    assert!(asm.contains("li $v0, 10"));
}

#[test]
fn for_loop_accumulates() {
    let asm = compile_to_assembly("let s = 0; for (let i = 1; i <= 4; i = i + 1) { s = s + i; } print(s);");

    assert!(asm.contains("L_FOR_0:"));

    // `i <= 4` lowers through slt with negation.
    assert!(asm.contains("xori"));
    assert!(asm.contains("addu"));
}

#[test]
fn recursive_factorial() {
    let source = "function fact(n: integer): integer { \
                      if (n <= 1) { return 1; } \
                      return n * fact(n - 1); \
                  } \
                  print(fact(5));";

    let asm = compile_to_assembly(source);

    assert!(asm.contains("fact:"));
    assert!(asm.contains("jal fact"));

    // The parameter is bound to a callee-saved register, which is preserved around the
    // recursive call so the multiply sees the caller's `n`.
    assert!(asm.contains("move $s0, $a0"));
    assert!(asm.contains("sw $s0, -4($fp)"));
    assert!(asm.contains("lw $s0, -4($fp)"));
    assert!(asm.contains("mul"));

    let quads = quads_for(source);
    let begin = quads.iter().position(|q| q.op == QuadOp::BeginFunc).expect("has a function");
    assert_eq!(quads[begin].arg1.as_deref(), Some("fact"));
}

#[test]
fn foreach_sums_an_array() {
    let source = "let a: integer[] = [10, 20, 30]; let s = 0; foreach (x in a) { s = s + x; } print(s);";

    let quads = quads_for(source);

    assert!(quads.iter().any(|q| q.op == QuadOp::ArrayNew && q.arg1.as_deref() == Some("3")));
    assert_eq!(quads.iter().filter(|q| q.op == QuadOp::ArrayStore).count(), 3);
    assert!(quads.iter().any(|q| q.op == QuadOp::ArrayLen));
    assert!(quads.iter().any(|q| q.op == QuadOp::ArrayLoad && q.result.as_deref() == Some("x")));

    // Heap allocation through sbrk.
    let asm = compile_to_assembly(source);
    assert!(asm.contains("li $v0, 9"));
}

#[test]
fn class_fields_and_method_dispatch() {
    let source = "class P { \
                      var x: integer; \
                      var y: integer; \
                      function sum(): integer { return this.x + this.y; } \
                  } \
                  let p = new P(); p.x = 3; p.y = 4; print(p.sum());";

    let quads = quads_for(source);

    assert!(quads.iter().any(|q| q.op == QuadOp::New && q.arg1.as_deref() == Some("P")));
    assert!(quads.iter().any(|q| q.op == QuadOp::SetField && q.result.as_deref() == Some("P.x")));
    assert!(quads.iter().any(|q| q.op == QuadOp::SetField && q.result.as_deref() == Some("P.y")));
    assert!(quads.iter().any(|q| q.op == QuadOp::CallMethod && q.arg2.as_deref() == Some("P.sum")));

    let asm = compile_to_assembly(source);

    // Two words allocated and zero-filled; `y` sits one word past `x`.
    assert!(asm.contains("li $a0, 8"));
    assert!(asm.contains("jal P_sum"));
    assert!(asm.contains("P_sum:"));
}

#[test]
fn short_circuit_and_does_not_evaluate_the_right_operand() {
    let source = "let a = 1; let b = 0; if (a == 1 && b == 0) { print(1); } else { print(0); }";

    let quads = quads_for(source);

    let branch = quads
        .iter()
        .position(|q| q.op == QuadOp::IfFalse && q.arg2.as_deref() == Some("L_AND_0"))
        .expect("short-circuit branch");
    let right = quads
        .iter()
        .position(|q| q.op == QuadOp::Eq && q.arg1.as_deref() == Some("b"))
        .expect("right comparison");

    assert!(branch < right, "the right operand must only be evaluated after the short-circuit test");

    let asm = compile_to_assembly(source);
    assert!(asm.contains("L_AND_0:"));
    assert!(asm.contains("L_ELSE_0:"));
}

#[test]
fn closures_share_mutable_state_through_environment_records() {
    let source = "let total = 0; \
                  function add(n: integer) { total = total + n; } \
                  add(3); add(4); print(total);";

    let ir = compile_to_ir(source);

    // `total` lives in the global environment record on the heap.
    assert!(ir.layouts.class_sizes.contains_key("__env_main"));
    assert!(ir.quads.iter().any(|q| q.op == QuadOp::New && q.arg1.as_deref() == Some("__env_main")));

    // Both calls pass the environment as the implicit first argument.
    let param_envs =
        ir.quads.iter().filter(|q| q.op == QuadOp::Param && q.arg1.as_deref() == Some("__env")).count();
    assert_eq!(param_envs, 2);

    let asm = compile_to_assembly(source);
    assert!(asm.contains("jal add"));
}

#[test]
fn nested_closure_reads_through_the_environment_chain() {
    let source = "function outer(): integer { \
                      let x = 10; \
                      function middle(): integer { \
                          function inner(): integer { return x + 1; } \
                          return inner(); \
                      } \
                      return middle(); \
                  } \
                  print(outer());";

    let ir = compile_to_ir(source);

    // `middle` forwards `outer`'s environment to `inner` without using it itself, so its own
    // record chains upward.
    assert!(ir.layouts.field_offsets.contains_key("__env_outer.x"));
    assert!(ir.layouts.field_offsets.contains_key("__env_outer.middle.__up"));

    assert!(
        ir.quads
            .iter()
            .any(|q| q.op == QuadOp::GetField && q.arg2.as_deref() == Some("__env_outer.middle.__up"))
    );
}

#[test]
fn ternary_and_do_while_compile() {
    let asm = compile_to_assembly(
        "let n = 5; \
         let kind = n % 2 == 0 ? \"even\" : \"odd\"; \
         let i = 0; \
         do { i = i + 1; } while (i < n); \
         print(kind); print(i);",
    );

    assert!(asm.contains("L_TERN_0:"));
    assert!(asm.contains("L_DOWHILE_0:"));
    assert!(asm.contains("mfhi"));
    assert!(asm.contains(".asciiz \"even\""));
    assert!(asm.contains(".asciiz \"odd\""));
}

#[test]
fn string_literals_are_pooled_once() {
    let asm = compile_to_assembly("print(\"hi\"); print(\"hi\"); print(\"bye\");");

    assert_eq!(asm.matches(".asciiz \"hi\"").count(), 1);
    assert_eq!(asm.matches(".asciiz \"bye\"").count(), 1);
}

#[test]
fn float_declarations_and_defaults() {
    let asm = compile_to_assembly("let f: float; let g = 2.5; print(3.25);");

    // Float literals are pooled; printing one elects syscall 2.
    assert!(asm.contains(".float 0.0"));
    assert!(asm.contains(".float 2.5"));
    assert!(asm.contains(".float 3.25"));
    assert!(asm.contains("lwc1 $f12, "));
    assert!(asm.contains("li $v0, 2"));
}

#[test]
fn print_string_uses_syscall_4() {
    let asm = compile_to_assembly("print(\"hola\");");

    assert!(asm.contains("str_0: .asciiz \"hola\""));
    assert!(asm.contains("la $a0, str_0"));
    assert!(asm.contains("li $v0, 4"));
}
