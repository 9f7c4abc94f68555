// Copyright 2025 Neil Henderson, Blue Tarp Media.
//
//! The `emit` module iterates the quadruple stream and dispatches on opcode to produce the
//! MIPS32 assembly text.
//!
//! Top-level quadruples (everything before the first `BEGIN_FUNC`) become the `main` body;
//! each `BEGIN_FUNC`/`END_FUNC` block becomes one function. Every quadruple is preceded by a
//! `# (OP, ...)` comment for traceability. Arithmetic uses the wrapping instruction forms, so
//! integer overflow wraps instead of trapping.

use std::collections::{HashMap, HashSet};

use crate::ICE;
use crate::codegen::GenerationError;
use crate::ir::{IrProgram, QuadOp, Quadruple, TempMaker};

use super::data_segment::DataSegment;
use super::frame;
use super::register_manager::RegisterManager;
use super::registers::Register;

/// Emits the complete assembly text for the program.
pub fn emit_program(ir: &IrProgram) -> Result<String, GenerationError> {
    let quads = &ir.quads;
    let main_end = quads.iter().position(|q| q.op == QuadOp::BeginFunc).unwrap_or(quads.len());

    let mut data = DataSegment::new();
    let mut text: Vec<String> = vec![".text".to_string(), ".globl main".to_string(), String::new()];

    // The main body: top-level quadruples, then the program exit.
    {
        let mut emitter = FunctionEmitter::new(ir, &mut data);
        for quad in &quads[..main_end] {
            emitter.translate(quad)?;
        }
        emitter.finish_main(&mut text);
    }

    // One block per function. Function definitions never nest, so each block runs to the next
    // `END_FUNC`.
    let mut index = main_end;
    while index < quads.len() {
        let Some(label) = quads[index].arg1.as_deref() else {
            ICE!("BEGIN_FUNC without a function name");
        };

        let end = match quads[index..].iter().position(|q| q.op == QuadOp::EndFunc) {
            Some(offset) => index + offset,
            None => ICE!("BEGIN_FUNC '{label}' without a matching END_FUNC"),
        };

        let mut emitter = FunctionEmitter::new(ir, &mut data);
        emitter.bind_params(label)?;
        for quad in &quads[index + 1..end] {
            emitter.translate(quad)?;
        }
        emitter.finish_function(label, &mut text);

        index = end + 1;
    }

    let mut out = data.render();
    out.push('\n');
    out.push_str(&text.join("\n"));
    out.push('\n');

    Ok(out)
}

/// A classified operand token.
enum Operand<'t> {
    Int(i64),
    Bool(bool),
    Null,
    Float(&'t str),
    Str(&'t str),
    Name(&'t str),
}

fn classify(token: &str) -> Operand<'_> {
    if token.starts_with('"') {
        return Operand::Str(token);
    }

    match token {
        "true" => return Operand::Bool(true),
        "false" => return Operand::Bool(false),
        "null" => return Operand::Null,
        _ => {}
    }

    if let Ok(value) = token.parse::<i64>() {
        return Operand::Int(value);
    }

    if token.contains('.') && token.parse::<f64>().is_ok() {
        return Operand::Float(token);
    }

    Operand::Name(token)
}

/// Mangles a qualified label (`P.sum`, `outer.inner`) into an assembler-safe symbol.
fn mangle(label: &str) -> String {
    label.replace('.', "_")
}

/// Per-function emission state: register allocation, the frame bookkeeping, and the pending
/// parameter group of the next call.
struct FunctionEmitter<'a> {
    ir: &'a IrProgram,
    data: &'a mut DataSegment,
    regs: RegisterManager,

    /// Frame slots assigned to temporaries, for preserving caller-save registers across calls.
    temp_slots: HashMap<String, usize>,

    /// Distinct named variables seen, counted into the frame reservation.
    locals: HashSet<String>,

    /// Tokens of the `PARAM` quadruples since the last call, in source order.
    pending_params: Vec<String>,

    lines: Vec<String>,
}

impl<'a> FunctionEmitter<'a> {
    fn new(ir: &'a IrProgram, data: &'a mut DataSegment) -> Self {
        Self {
            ir,
            data,
            regs: RegisterManager::new(),
            temp_slots: HashMap::new(),
            locals: HashSet::new(),
            pending_params: Vec::new(),
            lines: Vec::new(),
        }
    }

    // ---------------- Function scaffolding ----------------

    /// Binds the function's parameters to saved registers: the first four arrive in
    /// `$a0..$a3`, the rest on the stack.
    fn bind_params(&mut self, label: &str) -> Result<(), GenerationError> {
        let Some(params) = self.ir.frames.get(label) else {
            ICE!("No frame record for function '{label}'");
        };

        let params = params.clone();
        for (index, name) in params.iter().enumerate() {
            let register = self.name_register(name)?;

            if index < 4 {
                self.instr(format!("move {register}, {}", Register::ARG_POOL[index]));
            } else {
                self.instr(format!("lw {register}, {}($fp)", frame::stack_arg_offset(index)));
            }
        }

        Ok(())
    }

    /// Assembles the function: label, prologue sized to the body's needs, then the body.
    fn finish_function(mut self, label: &str, text: &mut Vec<String>) {
        let frame_bytes = frame::frame_bytes(self.locals.len(), self.temp_slots.len());

        text.push(format!("{}:", mangle(label)));
        for line in frame::prologue(frame_bytes, &self.regs.saved_used()) {
            text.push(format!("    {line}"));
        }

        text.append(&mut self.lines);
        text.push(String::new());
    }

    /// Assembles the main body. It shares the function scaffolding (its temporaries need frame
    /// slots across calls) and always ends with the exit syscall.
    fn finish_main(mut self, text: &mut Vec<String>) {
        let frame_bytes = frame::frame_bytes(self.locals.len(), self.temp_slots.len());

        text.push("main:".to_string());
        for line in frame::prologue(frame_bytes, &self.regs.saved_used()) {
            text.push(format!("    {line}"));
        }

        text.append(&mut self.lines);

        text.push("    # Exit program".to_string());
        text.push("    li $v0, 10".to_string());
        text.push("    syscall".to_string());
        text.push(String::new());
    }

    // ---------------- Quadruple dispatch ----------------

    fn translate(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        self.lines.push(format!("    # {quad}"));

        match quad.op {
            QuadOp::Add => self.three_reg("addu", quad)?,
            QuadOp::Sub => self.three_reg("subu", quad)?,
            QuadOp::Mul => self.three_reg("mul", quad)?,
            QuadOp::Div => self.div_mod("mflo", quad)?,
            QuadOp::Mod => self.div_mod("mfhi", quad)?,
            QuadOp::Neg => self.two_reg("negu", quad)?,

            QuadOp::And => self.three_reg("and", quad)?,
            QuadOp::Or => self.three_reg("or", quad)?,
            QuadOp::Not => self.two_reg_not(quad)?,

            QuadOp::Lt => self.compare(quad, false, false)?,
            QuadOp::Gt => self.compare(quad, true, false)?,
            QuadOp::Ge => self.compare(quad, false, true)?,
            QuadOp::Le => self.compare(quad, true, true)?,
            QuadOp::Eq => self.equality(quad, true)?,
            QuadOp::Ne => self.equality(quad, false)?,

            QuadOp::Assign | QuadOp::Copy => {
                let dest = self.result_register(quad)?;
                self.load_into(dest, arg1(quad))?;
            }

            QuadOp::Goto => {
                self.instr(format!("j {}", arg1(quad)));
            }

            QuadOp::IfFalse => self.branch("beqz", quad)?,
            QuadOp::IfTrue => self.branch("bnez", quad)?,

            QuadOp::Label => {
                self.lines.push(format!("{}:", arg1(quad)));
            }

            QuadOp::Param => {
                self.pending_params.push(arg1(quad).to_string());
            }

            QuadOp::Call => {
                let count: usize = match arg2(quad).parse() {
                    Ok(count) => count,
                    Err(_) => ICE!("CALL argument count is not a number"),
                };
                if count != self.pending_params.len() {
                    ICE!("CALL to '{}' expects {count} params, {} are pending", arg1(quad), self.pending_params.len());
                }

                self.flush_call(None, arg1(quad), quad.result.as_deref())?;
            }

            QuadOp::CallMethod => {
                let receiver = arg1(quad).to_string();
                self.flush_call(Some(receiver.as_str()), arg2(quad), quad.result.as_deref())?;
            }

            QuadOp::Return => self.emit_return(quad)?,

            QuadOp::Print => self.print(quad)?,

            QuadOp::ArrayNew => self.array_new(quad)?,
            QuadOp::ArrayLoad => self.array_load(quad)?,
            QuadOp::ArrayStore => self.array_store(quad)?,
            QuadOp::ArrayLen => {
                let (array, array_scratch) = self.operand_register(arg1(quad))?;
                let dest = self.result_register(quad)?;
                self.instr(format!("lw {dest}, 0({array})"));
                self.release(array, array_scratch);
            }

            QuadOp::New => self.new_object(quad)?,
            QuadOp::GetField => self.get_field(quad)?,
            QuadOp::SetField => self.set_field(quad)?,

            QuadOp::BeginFunc | QuadOp::EndFunc => {
                ICE!("Function boundary quadruple reached the instruction dispatcher");
            }
        }

        Ok(())
    }

    // ---------------- Arithmetic and logic ----------------

    fn three_reg(&mut self, mnemonic: &str, quad: &Quadruple) -> Result<(), GenerationError> {
        let (a, a_scratch) = self.operand_register(arg1(quad))?;
        let (b, b_scratch) = self.operand_register(arg2(quad))?;
        let dest = self.result_register(quad)?;

        self.instr(format!("{mnemonic} {dest}, {a}, {b}"));

        self.release(a, a_scratch);
        self.release(b, b_scratch);
        Ok(())
    }

    fn two_reg(&mut self, mnemonic: &str, quad: &Quadruple) -> Result<(), GenerationError> {
        let (src, src_scratch) = self.operand_register(arg1(quad))?;
        let dest = self.result_register(quad)?;

        self.instr(format!("{mnemonic} {dest}, {src}"));

        self.release(src, src_scratch);
        Ok(())
    }

    /// Logical NOT of a 0/1 value: `dest = (src == 0)`.
    fn two_reg_not(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let (src, src_scratch) = self.operand_register(arg1(quad))?;
        let dest = self.result_register(quad)?;

        self.instr(format!("sltiu {dest}, {src}, 1"));

        self.release(src, src_scratch);
        Ok(())
    }

    /// `div` computes quotient and remainder into LO/HI; the mnemonic picks which one.
    fn div_mod(&mut self, move_from: &str, quad: &Quadruple) -> Result<(), GenerationError> {
        let (a, a_scratch) = self.operand_register(arg1(quad))?;
        let (b, b_scratch) = self.operand_register(arg2(quad))?;
        let dest = self.result_register(quad)?;

        self.instr(format!("div {a}, {b}"));
        self.instr(format!("{move_from} {dest}"));

        self.release(a, a_scratch);
        self.release(b, b_scratch);
        Ok(())
    }

    /// Orderings via `slt`: swap the operands for GT/LE, negate with `xori` for GE/LE.
    fn compare(&mut self, quad: &Quadruple, swap: bool, negate: bool) -> Result<(), GenerationError> {
        let (a, a_scratch) = self.operand_register(arg1(quad))?;
        let (b, b_scratch) = self.operand_register(arg2(quad))?;
        let dest = self.result_register(quad)?;

        if swap {
            self.instr(format!("slt {dest}, {b}, {a}"));
        } else {
            self.instr(format!("slt {dest}, {a}, {b}"));
        }

        if negate {
            self.instr(format!("xori {dest}, {dest}, 1"));
        }

        self.release(a, a_scratch);
        self.release(b, b_scratch);
        Ok(())
    }

    /// Equality via subtraction: zero difference means equal.
    fn equality(&mut self, quad: &Quadruple, equal: bool) -> Result<(), GenerationError> {
        let (a, a_scratch) = self.operand_register(arg1(quad))?;
        let (b, b_scratch) = self.operand_register(arg2(quad))?;
        let dest = self.result_register(quad)?;

        self.instr(format!("subu {dest}, {a}, {b}"));

        if equal {
            self.instr(format!("sltiu {dest}, {dest}, 1"));
        } else {
            self.instr(format!("sltu {dest}, $zero, {dest}"));
        }

        self.release(a, a_scratch);
        self.release(b, b_scratch);
        Ok(())
    }

    fn branch(&mut self, mnemonic: &str, quad: &Quadruple) -> Result<(), GenerationError> {
        let (condition, scratch) = self.operand_register(arg1(quad))?;
        self.instr(format!("{mnemonic} {condition}, {}", arg2(quad)));
        self.release(condition, scratch);
        Ok(())
    }

    // ---------------- Calls ----------------

    /// Materializes a buffered call: preserve live caller-save registers, place the arguments
    /// (receiver first for methods, then the pending `PARAM` group), jump, and clean up.
    fn flush_call(
        &mut self,
        receiver: Option<&str>,
        target: &str,
        result: Option<&str>,
    ) -> Result<(), GenerationError> {
        let params = std::mem::take(&mut self.pending_params);

        let mut slots: Vec<String> = Vec::new();
        if let Some(receiver) = receiver {
            slots.push(receiver.to_string());
        }
        slots.extend(params);

        // $t registers are caller-save: store the live ones to their frame slots.
        let live = self.regs.mapped_temps();
        for (name, register) in &live {
            let slot = self.temp_slot(name);
            self.instr(format!("sw {register}, {}($fp)", frame::temp_slot_offset(slot)));
        }

        let stack_args = slots.len().saturating_sub(4);
        if stack_args > 0 {
            self.instr(format!("addiu $sp, $sp, -{}", 4 * stack_args));
        }

        for (index, token) in slots.iter().enumerate() {
            if index < 4 {
                self.load_into(Register::ARG_POOL[index], token)?;
            } else {
                let (register, scratch) = self.operand_register(token)?;
                self.instr(format!("sw {register}, {}($sp)", 4 * (index - 4)));
                self.release(register, scratch);
            }
        }

        self.instr(format!("jal {}", mangle(target)));

        if stack_args > 0 {
            self.instr(format!("addiu $sp, $sp, {}", 4 * stack_args));
        }

        for (name, register) in &live {
            let slot = self.temp_slot(name);
            self.instr(format!("lw {register}, {}($fp)", frame::temp_slot_offset(slot)));
        }

        if let Some(result) = result {
            let dest = self.name_register(result)?;
            self.instr(format!("move {dest}, $v0"));
        }

        Ok(())
    }

    fn emit_return(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        if let Some(value) = quad.arg1.as_deref() {
            self.load_into(Register::V0, value)?;
        }

        for line in frame::epilogue(&self.regs.saved_used()) {
            self.instr(line);
        }

        Ok(())
    }

    // ---------------- I/O ----------------

    /// `PRINT` dispatches on the operand's form: string literals use syscall 4, float literals
    /// syscall 2, and everything else prints as an integer. A newline always follows.
    fn print(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        match classify(arg1(quad)) {
            Operand::Str(literal) => {
                let label = self.data.intern_string(literal);
                self.instr(format!("la $a0, {label}"));
                self.instr("li $v0, 4".to_string());
                self.instr("syscall".to_string());
            }

            Operand::Float(literal) => {
                let label = self.data.intern_float(literal);
                self.instr(format!("lwc1 $f12, {label}"));
                self.instr("li $v0, 2".to_string());
                self.instr("syscall".to_string());
            }

            operand => {
                match operand {
                    Operand::Name(name) => {
                        let register = self.name_register(name)?;
                        self.instr(format!("move $a0, {register}"));
                    }
                    other => self.load_literal(Register::A0, &other),
                }
                self.instr("li $v0, 1".to_string());
                self.instr("syscall".to_string());
            }
        }

        self.instr("la $a0, newline".to_string());
        self.instr("li $v0, 4".to_string());
        self.instr("syscall".to_string());

        Ok(())
    }

    // ---------------- Heap objects ----------------

    /// Arrays are `n + 1` word heap blocks from `sbrk`: the length in word 0, elements after.
    fn array_new(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let size_token = arg1(quad).to_string();

        match classify(&size_token) {
            Operand::Int(n) => self.instr(format!("li $a0, {}", 4 * (n + 1))),
            Operand::Name(name) => {
                let register = self.name_register(name)?;
                self.instr(format!("sll $a0, {register}, 2"));
                self.instr("addiu $a0, $a0, 4".to_string());
            }
            _ => ICE!("ARRAY_NEW size is neither a literal nor a name"),
        }

        self.instr("li $v0, 9".to_string());
        self.instr("syscall".to_string());

        let dest = self.result_register(quad)?;
        self.instr(format!("move {dest}, $v0"));

        match classify(&size_token) {
            Operand::Int(n) => {
                let scratch = self.regs.allocate_scratch()?;
                self.instr(format!("li {scratch}, {n}"));
                self.instr(format!("sw {scratch}, 0({dest})"));
                self.regs.free_temp(scratch);
            }
            Operand::Name(name) => {
                let register = self.name_register(name)?;
                self.instr(format!("sw {register}, 0({dest})"));
            }
            _ => unreachable!(),
        }

        Ok(())
    }

    fn array_load(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let (array, array_scratch) = self.operand_register(arg1(quad))?;

        match classify(arg2(quad)) {
            Operand::Int(index) => {
                let dest = self.result_register(quad)?;
                self.instr(format!("lw {dest}, {}({array})", 4 + 4 * index));
            }
            Operand::Name(name) => {
                let index = self.name_register(name)?;
                let address = self.regs.allocate_scratch()?;
                self.instr(format!("sll {address}, {index}, 2"));
                self.instr(format!("addu {address}, {address}, {array}"));
                let dest = self.result_register(quad)?;
                self.instr(format!("lw {dest}, 4({address})"));
                self.regs.free_temp(address);
            }
            _ => ICE!("ARRAY_LOAD index is neither a literal nor a name"),
        }

        self.release(array, array_scratch);
        Ok(())
    }

    fn array_store(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let (value, value_scratch) = self.operand_register(arg1(quad))?;
        let (array, array_scratch) = self.operand_register(arg2(quad))?;

        match classify(result(quad)) {
            Operand::Int(index) => {
                self.instr(format!("sw {value}, {}({array})", 4 + 4 * index));
            }
            Operand::Name(name) => {
                let index = self.name_register(name)?;
                let address = self.regs.allocate_scratch()?;
                self.instr(format!("sll {address}, {index}, 2"));
                self.instr(format!("addu {address}, {address}, {array}"));
                self.instr(format!("sw {value}, 4({address})"));
                self.regs.free_temp(address);
            }
            _ => ICE!("ARRAY_STORE index is neither a literal nor a name"),
        }

        self.release(value, value_scratch);
        self.release(array, array_scratch);
        Ok(())
    }

    /// Class instances are `sbrk` blocks of `4 * field_count` bytes, zero-filled.
    fn new_object(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let class = arg1(quad);
        let Some(size) = self.ir.layouts.class_sizes.get(class).copied() else {
            ICE!("NEW of unregistered class '{class}'");
        };

        self.instr(format!("li $a0, {}", 4 * size));
        self.instr("li $v0, 9".to_string());
        self.instr("syscall".to_string());

        let dest = self.result_register(quad)?;
        self.instr(format!("move {dest}, $v0"));

        for field in 0..size {
            self.instr(format!("sw $zero, {}({dest})", 4 * field));
        }

        Ok(())
    }

    fn get_field(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let offset = self.field_offset(arg2(quad));

        let (object, object_scratch) = self.operand_register(arg1(quad))?;
        let dest = self.result_register(quad)?;
        self.instr(format!("lw {dest}, {}({object})", 4 * offset));

        self.release(object, object_scratch);
        Ok(())
    }

    fn set_field(&mut self, quad: &Quadruple) -> Result<(), GenerationError> {
        let offset = self.field_offset(result(quad));

        let (value, value_scratch) = self.operand_register(arg1(quad))?;
        let (object, object_scratch) = self.operand_register(arg2(quad))?;
        self.instr(format!("sw {value}, {}({object})", 4 * offset));

        self.release(value, value_scratch);
        self.release(object, object_scratch);
        Ok(())
    }

    fn field_offset(&self, token: &str) -> usize {
        match self.ir.layouts.field_offsets.get(token) {
            Some(offset) => *offset,
            None => ICE!("Field token '{token}' is not in the layout table"),
        }
    }

    // ---------------- Operands ----------------

    /// The register holding a named variable or temporary, allocated on first sight.
    fn name_register(&mut self, name: &str) -> Result<Register, GenerationError> {
        if TempMaker::is_temp(name) {
            self.regs.allocate_temp(name)
        } else {
            self.locals.insert(name.to_string());
            self.regs.allocate_saved(name)
        }
    }

    /// A register holding the operand's value. Literals load into a scratch register, which
    /// the caller releases with [FunctionEmitter::release].
    fn operand_register(&mut self, token: &str) -> Result<(Register, bool), GenerationError> {
        match classify(token) {
            Operand::Name(name) => Ok((self.name_register(name)?, false)),
            literal => {
                let scratch = self.regs.allocate_scratch()?;
                self.load_literal(scratch, &literal);
                Ok((scratch, true))
            }
        }
    }

    fn result_register(&mut self, quad: &Quadruple) -> Result<Register, GenerationError> {
        self.name_register(result(quad))
    }

    fn release(&mut self, register: Register, scratch: bool) {
        if scratch {
            self.regs.free_temp(register);
        }
    }

    fn load_literal(&mut self, dest: Register, operand: &Operand<'_>) {
        match operand {
            Operand::Int(value) => self.instr(format!("li {dest}, {value}")),
            Operand::Bool(value) => self.instr(format!("li {dest}, {}", *value as i32)),
            Operand::Null => self.instr(format!("li {dest}, 0")),
            Operand::Str(literal) => {
                let label = self.data.intern_string(literal);
                self.instr(format!("la {dest}, {label}"));
            }
            Operand::Float(literal) => {
                let label = self.data.intern_float(literal);
                self.instr(format!("lw {dest}, {label}"));
            }
            Operand::Name(_) => ICE!("load_literal invoked with a name operand"),
        }
    }

    /// Loads any operand into a specific register.
    fn load_into(&mut self, dest: Register, token: &str) -> Result<(), GenerationError> {
        match classify(token) {
            Operand::Name(name) => {
                let source = self.name_register(name)?;
                if source != dest {
                    self.instr(format!("move {dest}, {source}"));
                }
            }
            literal => self.load_literal(dest, &literal),
        }

        Ok(())
    }

    fn temp_slot(&mut self, name: &str) -> usize {
        let next = self.temp_slots.len();
        *self.temp_slots.entry(name.to_string()).or_insert(next)
    }

    fn instr(&mut self, text: String) {
        self.lines.push(format!("    {text}"));
    }
}

fn arg1(quad: &Quadruple) -> &str {
    match quad.arg1.as_deref() {
        Some(token) => token,
        None => ICE!("Missing arg1 in {quad}"),
    }
}

fn arg2(quad: &Quadruple) -> &str {
    match quad.arg2.as_deref() {
        Some(token) => token,
        None => ICE!("Missing arg2 in {quad}"),
    }
}

fn result(quad: &Quadruple) -> &str {
    match quad.result.as_deref() {
        Some(token) => token,
        None => ICE!("Missing result in {quad}"),
    }
}
