//! NASM text emission: walks the typed, `has_call`-annotated AST and writes
//! x86-64 SysV assembly directly, buffering each function's body so the
//! prologue's `sub rsp`/callee-saved push count can be computed from the
//! body's own high-water marks before either is written out.

use std::collections::HashMap;
use std::collections::HashSet;

use lumenc_par::ast::{
    Ast, BinOpKind, Block, ElseBranch, Expr, ExprKind, FunctionDef, IfStmt, Literal, Stmt,
    UnaryOpKind, WhileStmt,
};
use lumenc_util::{Interner, Span, Symbol, ValueType};

use crate::annotate;
use crate::error::CodegenError;
use crate::layout::{build_function_layout, FrameLayout};
use crate::registers::{Physical, ARG_REGISTERS, CALLEE_SAVED, CALLER_SAVED_NO_RDX};

const RESULT_FMT_LABEL: &str = "result_fmt";

fn round_up(n: u64, multiple: u64) -> u64 {
    if multiple == 0 {
        return n;
    }
    n.div_ceil(multiple) * multiple
}

/// The `sub rsp, N` argument. `push rbp` already restores 16-byte alignment
/// on entry, so `N` itself only needs to land on a 16-byte boundary when no
/// callee-saved registers are pushed afterward; each such push shifts the
/// boundary by 8, so an odd push count needs `N`'s own remainder nudged by 8
/// to compensate.
fn aligned_frame_size(locals_size: u32, callee_saved_count: u32) -> u32 {
    let mut frame = round_up(locals_size as u64, 16) as u32;
    if callee_saved_count % 2 == 1 {
        frame += 8;
    }
    frame
}

fn data_directive(size: u32) -> &'static str {
    match size {
        1 => "db",
        2 => "dw",
        4 => "dd",
        _ => "dq",
    }
}

/// Evaluates a top-level initializer at compile time. Only integer, bool,
/// and char folding is supported; float folding is explicitly rejected
/// rather than silently miscompiled.
fn fold_const(e: &Expr) -> Result<i64, CodegenError> {
    match &e.kind {
        ExprKind::Value(Literal::Int(v)) => Ok(*v),
        ExprKind::Value(Literal::Bool(b)) => Ok(*b as i64),
        ExprKind::Value(Literal::Char(c)) => Ok(*c as i64),
        ExprKind::Value(Literal::Float(_)) => Err(CodegenError::FloatFoldUnsupported { span: e.span }),
        ExprKind::Wrapper(inner) => fold_const(inner),
        ExprKind::Unary { op: UnaryOpKind::Neg, operand } => Ok(-fold_const(operand)?),
        ExprKind::Unary { op: UnaryOpKind::Not, operand } => {
            Ok((fold_const(operand)? == 0) as i64)
        }
        ExprKind::BinOp { op, left, right } => {
            let l = fold_const(left)?;
            let r = fold_const(right)?;
            Ok(match op {
                BinOpKind::Add => l + r,
                BinOpKind::Sub => l - r,
                BinOpKind::Mul => l * r,
                BinOpKind::Div => l / r,
                BinOpKind::Mod => l % r,
                BinOpKind::Lt => (l < r) as i64,
                BinOpKind::Le => (l <= r) as i64,
                BinOpKind::Gt => (l > r) as i64,
                BinOpKind::Ge => (l >= r) as i64,
                BinOpKind::Eq => (l == r) as i64,
                BinOpKind::Neq => (l != r) as i64,
            })
        }
        _ => Err(CodegenError::NonConstantGlobal { span: e.span }),
    }
}

struct Global {
    value: i64,
    ty: ValueType,
}

/// Drives emission of a whole program: the `.data` section, then one
/// `.text` body per function.
pub struct CodeGenerator<'a> {
    interner: &'a Interner,
    globals: HashMap<Symbol, Global>,
    return_types: HashMap<Symbol, ValueType>,
    rodata: Vec<String>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            globals: HashMap::new(),
            return_types: HashMap::new(),
            rodata: Vec::new(),
        }
    }

    pub fn generate(&mut self, ast: &mut Ast) -> Result<String, CodegenError> {
        for stmt in ast.iter_mut() {
            if let Stmt::Function(f) = stmt {
                self.return_types.insert(f.name, f.return_type);
                annotate::annotate_function(f);
            }
        }

        for stmt in ast.iter() {
            if let Stmt::Expr(e) = stmt {
                if let ExprKind::Assign { target, value } = &e.kind {
                    let folded = fold_const(value)?;
                    self.globals.insert(*target, Global { value: folded, ty: value.value_type });
                }
            }
        }

        let globals_visible: HashSet<Symbol> = self.globals.keys().copied().collect();

        let mut functions_text = String::new();
        for stmt in ast.iter() {
            if let Stmt::Function(f) = stmt {
                let name = self.interner.resolve(f.name).to_string();
                let is_main = name == "main";
                let layout = build_function_layout(f, &globals_visible);
                let mut emitter = FunctionEmitter::new(
                    self.interner,
                    name,
                    is_main,
                    layout,
                    &globals_visible,
                    &self.return_types,
                    &mut self.rodata,
                );
                functions_text.push_str(&emitter.emit_function(f)?);
                functions_text.push('\n');
            }
        }

        Ok(self.assemble(&functions_text))
    }

    fn assemble(&self, functions_text: &str) -> String {
        let mut out = String::new();
        out.push_str("extern printf\n\n");

        if !self.rodata.is_empty() {
            out.push_str("section .rodata\n");
            for (i, s) in self.rodata.iter().enumerate() {
                out.push_str(&format!("\tstr_{}: ", i));
                let bytes: Vec<String> = s.bytes().map(|b| b.to_string()).collect();
                out.push_str(&format!("db {},0\n", bytes.join(",")));
            }
            out.push('\n');
        }

        out.push_str("section .data\n");
        out.push_str(&format!("\t{}: db \"Result was: %d\", 10, 0\n", RESULT_FMT_LABEL));
        for (sym, global) in &self.globals {
            let name = self.interner.resolve(*sym);
            out.push_str(&format!("\tglobal {}\n", name));
            out.push_str(&format!("\talign {}\n", global.ty.size().max(1)));
            out.push_str(&format!(
                "\t{}: {} {}\n",
                name,
                data_directive(global.ty.size()),
                global.value
            ));
        }
        out.push('\n');

        out.push_str("section .text\n");
        out.push_str("\tglobal main\n\n");
        out.push_str(functions_text);
        out
    }
}

/// Per-function emission state: the buffered body, the label counters, and
/// the high-water mark of callee-saved registers used while lowering it.
struct FunctionEmitter<'a> {
    interner: &'a Interner,
    name: String,
    is_main: bool,
    layout: FrameLayout,
    globals: &'a HashSet<Symbol>,
    return_types: &'a HashMap<Symbol, ValueType>,
    rodata: &'a mut Vec<String>,
    label_counters: HashMap<&'static str, u32>,
    max_callee_used: usize,
    body: String,
}

impl<'a> FunctionEmitter<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        interner: &'a Interner,
        name: String,
        is_main: bool,
        layout: FrameLayout,
        globals: &'a HashSet<Symbol>,
        return_types: &'a HashMap<Symbol, ValueType>,
        rodata: &'a mut Vec<String>,
    ) -> Self {
        Self {
            interner,
            name,
            is_main,
            layout,
            globals,
            return_types,
            rodata,
            label_counters: HashMap::new(),
            max_callee_used: 0,
            body: String::new(),
        }
    }

    fn push_line(&mut self, line: String) {
        self.body.push('\t');
        self.body.push_str(&line);
        self.body.push('\n');
    }

    fn new_label(&mut self, kind: &'static str) -> String {
        let counter = self.label_counters.entry(kind).or_insert(0);
        let label = format!("{}_{}_{}", self.name, kind, counter);
        *counter += 1;
        label
    }

    fn return_label(&self) -> String {
        format!("{}_return", self.name)
    }

    fn mem_operand(&self, sym: Symbol) -> String {
        if let Some(offset) = self.layout.offsets.get(&sym) {
            format!("[rbp{}]", offset)
        } else {
            debug_assert!(
                self.globals.contains(&sym),
                "a symbol absent from the stack layout must be a global"
            );
            format!("[{}]", self.interner.resolve(sym))
        }
    }

    fn alloc(&mut self, callee_pool: bool, watermark: usize, span: Span) -> Result<Physical, CodegenError> {
        if callee_pool {
            if watermark >= CALLEE_SAVED.len() {
                return Err(CodegenError::OutOfCalleeSavedRegisters { span });
            }
            self.max_callee_used = self.max_callee_used.max(watermark + 1);
            Ok(CALLEE_SAVED[watermark])
        } else {
            if watermark >= CALLER_SAVED_NO_RDX.len() {
                return Err(CodegenError::OutOfCallerSavedRegisters { span });
            }
            Ok(CALLER_SAVED_NO_RDX[watermark])
        }
    }

    fn intern_rodata(&mut self, s: &str) -> String {
        let index = self.rodata.len();
        self.rodata.push(s.to_string());
        format!("str_{}", index)
    }

    // --- function-level emission --------------------------------------

    fn emit_function(&mut self, f: &FunctionDef) -> Result<String, CodegenError> {
        // Copy incoming SysV argument registers into their stack slots so
        // the body can address every parameter uniformly via `[rbp-N]`.
        for (param, arg_reg) in f.params.iter().zip(ARG_REGISTERS.iter()) {
            let operand = self.mem_operand(param.name);
            self.push_line(format!("mov {}, {}", operand, arg_reg.name(param.ty)));
        }

        for stmt in &f.body.stmts {
            self.emit_stmt(stmt)?;
        }

        let mut out = String::new();
        out.push_str(&format!("{}:\n", self.name));
        out.push_str("\tpush rbp\n\tmov rbp, rsp\n");

        let frame = aligned_frame_size(self.layout.frame_size, self.max_callee_used as u32);
        if frame > 0 {
            out.push_str(&format!("\tsub rsp, {}\n", frame));
        }
        for reg in CALLEE_SAVED.iter().take(self.max_callee_used) {
            out.push_str(&format!("\tpush {}\n", reg.name(ValueType::I64)));
        }

        out.push_str(&self.body);

        out.push_str(&format!("{}:\n", self.return_label()));
        if self.is_main {
            out.push_str("\tlea rdi, [rel result_fmt]\n");
            out.push_str("\tmov esi, eax\n");
            out.push_str("\txor eax, eax\n");
            out.push_str("\tcall printf\n");
        }
        for reg in CALLEE_SAVED.iter().take(self.max_callee_used).rev() {
            out.push_str(&format!("\tpop {}\n", reg.name(ValueType::I64)));
        }
        out.push_str("\tleave\n\tret\n");
        Ok(out)
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CodegenError> {
        match stmt {
            // A bare, uninitialized declaration has no runtime effect; it
            // exists purely to register a type with the checker.
            Stmt::Expr(e) if matches!(e.kind, ExprKind::Variable(_)) => Ok(()),
            Stmt::Expr(e) => {
                self.lower(e, 0)?;
                Ok(())
            }
            Stmt::Block(b) => self.emit_block(b),
            Stmt::While(w) => self.emit_while(w),
            Stmt::If(i) => self.emit_if(i),
            Stmt::Function(_) => Ok(()),
            Stmt::Return(e, _) => self.emit_return(e),
        }
    }

    fn emit_block(&mut self, block: &Block) -> Result<(), CodegenError> {
        for stmt in &block.stmts {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_while(&mut self, w: &WhileStmt) -> Result<(), CodegenError> {
        let start = self.new_label("start_while");
        let end = self.new_label("end_while");
        self.push_line(format!("{}:", start));
        let reg = self.lower(&w.cond, 0)?;
        self.push_line(format!("test {0}, {0}", reg.name(ValueType::Bool)));
        self.push_line(format!("jz {}", end));
        self.emit_block(&w.body)?;
        self.push_line(format!("jmp {}", start));
        self.push_line(format!("{}:", end));
        Ok(())
    }

    fn emit_if(&mut self, stmt: &IfStmt) -> Result<(), CodegenError> {
        let reg = self.lower(&stmt.cond, 0)?;
        self.push_line(format!("test {0}, {0}", reg.name(ValueType::Bool)));
        match &stmt.else_branch {
            None => {
                let end = self.new_label("end_if");
                self.push_line(format!("jz {}", end));
                self.emit_block(&stmt.then_body)?;
                self.push_line(format!("{}:", end));
            }
            Some(branch) => {
                let else_label = self.new_label("else");
                let end = self.new_label("end_if");
                self.push_line(format!("jz {}", else_label));
                self.emit_block(&stmt.then_body)?;
                self.push_line(format!("jmp {}", end));
                self.push_line(format!("{}:", else_label));
                match branch {
                    ElseBranch::Block(b) => self.emit_block(b)?,
                    ElseBranch::If(nested) => self.emit_if(nested)?,
                }
                self.push_line(format!("{}:", end));
            }
        }
        Ok(())
    }

    fn emit_return(&mut self, e: &Expr) -> Result<(), CodegenError> {
        let reg = self.lower(e, 0)?;
        if reg != Physical::Rax {
            self.push_line(format!("mov {}, {}", Physical::Rax.name(e.value_type), reg.name(e.value_type)));
        }
        let label = self.return_label();
        self.push_line(format!("jmp {}", label));
        Ok(())
    }

    // --- expression lowering -------------------------------------------

    fn lower(&mut self, e: &Expr, watermark: usize) -> Result<Physical, CodegenError> {
        match &e.kind {
            ExprKind::Value(lit) => {
                let reg = self.alloc(e.has_call, watermark, e.span)?;
                self.emit_load_literal(reg, lit, e.value_type, e.span)?;
                Ok(reg)
            }
            ExprKind::Variable(sym) => {
                let reg = self.alloc(e.has_call, watermark, e.span)?;
                let operand = self.mem_operand(*sym);
                self.push_line(format!("mov {}, {}", reg.name(e.value_type), operand));
                Ok(reg)
            }
            ExprKind::Wrapper(inner) => self.lower(inner, watermark),
            ExprKind::Unary { op, operand } => {
                let reg = self.lower(operand, watermark)?;
                self.emit_unary(*op, reg, operand.value_type, e.span)?;
                Ok(reg)
            }
            ExprKind::BinOp { op, left, right } => {
                let left_reg = self.lower(left, watermark)?;
                let right_reg = self.lower(right, watermark + 1)?;
                self.emit_binop(*op, left_reg, right_reg, left.value_type, e.span)?;
                Ok(left_reg)
            }
            ExprKind::Assign { target, value } => {
                let reg = self.lower(value, watermark)?;
                let operand = self.mem_operand(*target);
                self.push_line(format!("mov {}, {}", operand, reg.name(value.value_type)));
                Ok(reg)
            }
            ExprKind::FunctionCall { name, args } => self.emit_call(*name, args, watermark, e.span),
        }
    }

    fn emit_load_literal(&mut self, reg: Physical, lit: &Literal, ty: ValueType, span: Span) -> Result<(), CodegenError> {
        match lit {
            Literal::Int(v) => self.push_line(format!("mov {}, {}", reg.name(ty), v)),
            Literal::Bool(b) => self.push_line(format!("mov {}, {}", reg.name(ty), *b as i32)),
            Literal::Char(c) => self.push_line(format!("mov {}, {}", reg.name(ty), *c as u32)),
            Literal::Float(_) => return Err(CodegenError::FloatArithmeticUnimplemented { span }),
            Literal::Str(s) => {
                let label = self.intern_rodata(s);
                self.push_line(format!("lea {}, [rel {}]", reg.name(ValueType::I64), label));
            }
        }
        Ok(())
    }

    fn emit_unary(&mut self, op: UnaryOpKind, reg: Physical, ty: ValueType, span: Span) -> Result<(), CodegenError> {
        match op {
            UnaryOpKind::Neg => {
                if ty.is_float() {
                    return Err(CodegenError::FloatArithmeticUnimplemented { span });
                }
                self.push_line(format!("neg {}", reg.name(ty)));
            }
            UnaryOpKind::Not => {
                self.push_line(format!("test {0}, {0}", reg.name(ty)));
                self.push_line(format!("setz {}", reg.byte_name()));
                self.push_line(format!("movzx {}, {}", reg.name(ValueType::I32), reg.byte_name()));
            }
        }
        Ok(())
    }

    fn emit_binop(
        &mut self,
        op: BinOpKind,
        left: Physical,
        right: Physical,
        ty: ValueType,
        span: Span,
    ) -> Result<(), CodegenError> {
        if ty.is_float() {
            return Err(CodegenError::FloatArithmeticUnimplemented { span });
        }
        match op {
            BinOpKind::Add => self.push_line(format!("add {}, {}", left.name(ty), right.name(ty))),
            BinOpKind::Sub => self.push_line(format!("sub {}, {}", left.name(ty), right.name(ty))),
            BinOpKind::Mul => self.push_line(format!("imul {}, {}", left.name(ty), right.name(ty))),
            BinOpKind::Div => self.emit_div(left, right, ty),
            BinOpKind::Mod => return Err(CodegenError::ModulusUnimplemented { span }),
            BinOpKind::Lt | BinOpKind::Le | BinOpKind::Gt | BinOpKind::Ge | BinOpKind::Eq | BinOpKind::Neq => {
                self.emit_compare(op, left, right, ty)
            }
        }
        Ok(())
    }

    fn emit_div(&mut self, left: Physical, right: Physical, ty: ValueType) {
        if left != Physical::Rax {
            self.push_line(format!("mov {}, {}", Physical::Rax.name(ty), left.name(ty)));
        }
        if ty.size() > 4 {
            self.push_line("cqo".to_string());
        } else {
            self.push_line("cdq".to_string());
        }
        self.push_line(format!("idiv {}", right.name(ty)));
        if left != Physical::Rax {
            self.push_line(format!("mov {}, {}", left.name(ty), Physical::Rax.name(ty)));
        }
    }

    fn emit_compare(&mut self, op: BinOpKind, left: Physical, right: Physical, ty: ValueType) {
        self.push_line(format!("cmp {}, {}", left.name(ty), right.name(ty)));
        let set = match op {
            BinOpKind::Lt => "setl",
            BinOpKind::Le => "setle",
            BinOpKind::Gt => "setg",
            BinOpKind::Ge => "setge",
            BinOpKind::Eq => "sete",
            BinOpKind::Neq => "setne",
            _ => unreachable!("non-comparison operator routed to emit_compare"),
        };
        self.push_line(format!("{} {}", set, left.byte_name()));
        self.push_line(format!("movzx {}, {}", left.name(ValueType::I32), left.byte_name()));
    }

    fn emit_call(&mut self, name: Symbol, args: &[Expr], watermark: usize, span: Span) -> Result<Physical, CodegenError> {
        if args.len() > ARG_REGISTERS.len() {
            return Err(CodegenError::TooManyArguments(args.len(), span));
        }

        let mut stashed = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let reg = self.lower(arg, watermark + i)?;
            stashed.push((reg, arg.value_type));
        }
        for ((reg, ty), arg_reg) in stashed.iter().zip(ARG_REGISTERS.iter()) {
            if reg != arg_reg {
                self.push_line(format!("mov {}, {}", arg_reg.name(*ty), reg.name(*ty)));
            }
        }

        let fname = self.interner.resolve(name).to_string();
        self.push_line(format!("call {}", fname));

        // The stashed argument slots are dead once copied into their SysV
        // registers, so the result can reclaim the first one instead of
        // needing a slot beyond the ones the arguments already used.
        let ret_ty = self.return_types.get(&name).copied().unwrap_or(ValueType::I32);
        let dest = self.alloc(true, watermark, span)?;
        if dest != Physical::Rax {
            self.push_line(format!("mov {}, {}", dest.name(ret_ty), Physical::Rax.name(ret_ty)));
        }
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenc_par::{Algorithm, Parser};
    use lumenc_sem::TypeChecker;

    fn compile(source: &str) -> String {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let mut ast = parser.parse().unwrap();
        TypeChecker::new().check_program(&mut ast).unwrap();
        CodeGenerator::new(&interner).generate(&mut ast).unwrap()
    }

    // Every frame size, once the callee-saved push count is folded in,
    // lands on a 16-byte boundary.
    #[test]
    fn frame_size_plus_pushes_is_sixteen_byte_aligned() {
        for callee_used in 0..=5u32 {
            for locals in [0u32, 1, 4, 5, 12, 37] {
                let frame = aligned_frame_size(locals, callee_used);
                assert_eq!(
                    (frame + 8 * callee_used) % 16,
                    0,
                    "locals={locals} callee_used={callee_used} frame={frame}"
                );
            }
        }
    }

    #[test]
    fn constant_arithmetic_computes_seven() {
        let asm = compile("i32 main() { return 1 + 2 * 3; }");
        assert!(asm.contains("mov eax, 1"));
        assert!(asm.contains("call printf"));
        assert!(asm.contains("Result was: %d"));
    }

    #[test]
    fn global_is_emitted_and_loaded() {
        let asm = compile("i32 x = 10; i32 main() { return x; }");
        assert!(asm.contains("x: dd 10"));
        assert!(asm.contains("[x]"));
    }

    #[test]
    fn reassigning_a_global_writes_back_to_the_global_not_a_stack_slot() {
        let asm = compile("i32 g = 42; i32 main() { g = g + 1; return g; }");
        assert!(asm.contains("g: dd 42"));
        assert!(!asm.contains("[rbp-4]"));
        assert!(asm.contains("[g]"));
    }

    // Exactly one `else`/`end_if` label pair, no duplicates.
    #[test]
    fn if_else_emits_one_label_pair() {
        let asm = compile(
            "i32 main() { i32 a = 1; if (a == 1) { a = 2; } else { a = 3; } return a; }",
        );
        assert_eq!(asm.matches("main_else_0:").count(), 1);
        assert_eq!(asm.matches("main_end_if_0:").count(), 1);
        assert_eq!(asm.matches("_else_").count(), 1);
        assert_eq!(asm.matches("_end_if_").count(), 1);
    }

    // Parameters land at `[rbp-4]`/`[rbp-8]`; the call site loads `edi`/`esi`
    // before `call add`.
    #[test]
    fn call_site_populates_argument_registers() {
        let asm = compile(
            "i32 add(i32 a, i32 b) { return a + b; } i32 main() { return add(2, 3); }",
        );
        assert!(asm.contains("[rbp-4]"));
        assert!(asm.contains("[rbp-8]"));
        assert!(asm.contains("mov edi,"));
        assert!(asm.contains("mov esi,"));
        assert!(asm.contains("call add"));
    }

    // rdx never appears as a plain arithmetic operand outside division or as
    // the 4th SysV argument register.
    #[test]
    fn rdx_is_reserved_for_division_and_the_fourth_argument() {
        let asm = compile(
            "i32 f(i32 a, i32 b, i32 c, i32 d, i32 e) { return a + b + c + d + e; } \
             i32 main() { return f(1, 2, 3, 4, 5); }",
        );
        for line in asm.lines() {
            let line = line.trim();
            if line.starts_with("add ") || line.starts_with("sub ") || line.starts_with("imul ") {
                assert!(!line.contains("edx") && !line.contains("rdx"), "{line}");
            }
        }
    }

    #[test]
    fn division_routes_through_rax_and_idiv() {
        let asm = compile("i32 main() { return 10 / 2; }");
        assert!(asm.contains("idiv"));
        assert!(asm.contains("cdq"));
    }

    #[test]
    fn modulus_is_rejected_as_unimplemented() {
        let mut interner = Interner::new();
        let mut parser =
            Parser::new("i32 main() { return 10 % 3; }", &mut interner, Algorithm::PrecedenceClimbing).unwrap();
        let mut ast = parser.parse().unwrap();
        TypeChecker::new().check_program(&mut ast).unwrap();
        let err = CodeGenerator::new(&interner).generate(&mut ast).unwrap_err();
        assert!(matches!(err, CodegenError::ModulusUnimplemented { .. }));
    }
}
