//! AST to three-address code
//!
//! [`IrGenerator`] expects a program that passed semantic analysis and does
//! no checking of its own. Literals and variable reads become operands
//! directly; every operator application gets a fresh temporary.
//!
//! # Control flow
//!
//! ```text
//! if:     cond; iffalse c goto Lelse; then; [goto Lend; Lelse:; else; Lend:] | Lelse:
//! while:  Lstart:; cond; iffalse c goto Lend; body; goto Lstart; Lend:
//! for:    init; Lstart:; [cond; iffalse c goto Lend]; body; Lstep:; step; goto Lstart; Lend:
//! ```
//!
//! `break` jumps to the innermost loop's end label, `continue` to its start
//! (`while`) or step (`for`) label.
//!
//! # Variables
//!
//! Variables are named by their source identifier only. A local that shadows
//! an outer one lowers to the same [`Operand::Var`], so a backend cannot treat
//! variable names as unique storage slots.

use crate::ir::instruction::{Instruction, IrProgram, Opcode, Operand};
use crate::parser::ast::*;

/// Jump targets of an enclosing loop
#[derive(Debug, Clone, Copy)]
struct LoopLabels {
    continue_label: usize,
    break_label: usize,
}

#[derive(Default)]
pub struct IrGenerator {
    program: IrProgram,
    loops: Vec<LoopLabels>,
}

impl IrGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a whole program. Global initializers are emitted at top
    /// level in source order; prototypes emit nothing.
    pub fn generate(mut self, program: &Program) -> IrProgram {
        for node in &program.nodes {
            match node {
                AstNode::FunctionDecl {
                    name,
                    body: Some(body),
                    ..
                } => self.gen_function(name, body),
                AstNode::FunctionDecl { body: None, .. } => {}
                other => self.gen_statement(other),
            }
        }

        log::debug!(
            "generated {} instructions ({} temporaries, {} labels)",
            self.program.len(),
            self.program.temp_count(),
            self.program.label_count()
        );
        self.program
    }

    fn gen_function(&mut self, name: &str, body: &[AstNode]) {
        self.program.emit(Instruction::func_begin(name));
        for statement in body {
            self.gen_statement(statement);
        }
        self.program.emit(Instruction::func_end(name));
    }

    // ===== Statements =====

    fn gen_statement(&mut self, node: &AstNode) {
        match node {
            AstNode::VarDecl {
                name,
                init: Some(init),
                ..
            } => {
                let value = self.gen_expression(init);
                self.program
                    .emit(Instruction::assign(Operand::Var(name.clone()), value));
            }
            AstNode::VarDecl { init: None, .. } => {}

            AstNode::Block { statements, .. } => {
                for statement in statements {
                    self.gen_statement(statement);
                }
            }

            AstNode::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let cond = self.gen_expression(condition);
                let else_label = self.program.new_label();
                self.program.emit(Instruction::if_false(cond, else_label));
                self.gen_statement(then_branch);

                match else_branch {
                    Some(else_branch) => {
                        let end_label = self.program.new_label();
                        self.program.emit(Instruction::goto(end_label));
                        self.program.emit(Instruction::label(else_label));
                        self.gen_statement(else_branch);
                        self.program.emit(Instruction::label(end_label));
                    }
                    None => self.program.emit(Instruction::label(else_label)),
                }
            }

            AstNode::While {
                condition, body, ..
            } => {
                let start = self.program.new_label();
                let end = self.program.new_label();

                self.program.emit(Instruction::label(start));
                let cond = self.gen_expression(condition);
                self.program.emit(Instruction::if_false(cond, end));
                self.gen_loop_body(body, start, end);
                self.program.emit(Instruction::goto(start));
                self.program.emit(Instruction::label(end));
            }

            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.gen_statement(init);
                }

                let start = self.program.new_label();
                let step = self.program.new_label();
                let end = self.program.new_label();

                self.program.emit(Instruction::label(start));
                if let Some(condition) = condition {
                    let cond = self.gen_expression(condition);
                    self.program.emit(Instruction::if_false(cond, end));
                }
                self.gen_loop_body(body, step, end);
                self.program.emit(Instruction::label(step));
                if let Some(increment) = increment {
                    self.gen_expression(increment);
                }
                self.program.emit(Instruction::goto(start));
                self.program.emit(Instruction::label(end));
            }

            AstNode::Return { expr, .. } => {
                let value = expr.as_deref().map(|expr| self.gen_expression(expr));
                self.program.emit(Instruction::ret(value));
            }

            AstNode::Break { .. } => self.gen_jump(|labels| labels.break_label),
            AstNode::Continue { .. } => self.gen_jump(|labels| labels.continue_label),

            AstNode::ExpressionStatement { expr, .. } => {
                self.gen_expression(expr);
            }

            AstNode::FunctionDecl { .. } => {}

            expr => {
                self.gen_expression(expr);
            }
        }
    }

    fn gen_loop_body(&mut self, body: &AstNode, continue_label: usize, break_label: usize) {
        self.loops.push(LoopLabels {
            continue_label,
            break_label,
        });
        self.gen_statement(body);
        self.loops.pop();
    }

    fn gen_jump(&mut self, target: impl Fn(&LoopLabels) -> usize) {
        match self.loops.last() {
            Some(labels) => {
                let label = target(labels);
                self.program.emit(Instruction::goto(label));
            }
            // Rejected by the analyzer; keep the instruction stream intact
            None => self.program.emit(Instruction::nop()),
        }
    }

    // ===== Expressions =====

    /// Emit the code for `node` and return the operand holding its value
    fn gen_expression(&mut self, node: &AstNode) -> Operand {
        match node {
            AstNode::IntLiteral(value, _) => Operand::Int(*value),
            AstNode::FloatLiteral(value, _) => Operand::Float(*value),
            AstNode::CharLiteral(value, _) => Operand::Int(i64::from(u32::from(*value))),
            AstNode::BoolLiteral(value, _) => Operand::Int(i64::from(*value)),
            AstNode::StringLiteral(value, _) => Operand::Str(value.clone()),
            AstNode::Identifier(name, _) => Operand::Var(name.clone()),

            AstNode::Assignment { target, value, .. } => {
                let value = self.gen_expression(value);
                let target = Operand::Var(target.clone());
                self.program.emit(Instruction::assign(target.clone(), value));
                target
            }

            AstNode::BinaryOp {
                op, left, right, ..
            } => {
                let left = self.gen_expression(left);
                let right = self.gen_expression(right);
                let result = self.program.new_temp();
                self.program.emit(Instruction::new(
                    binary_opcode(*op),
                    result.clone(),
                    left,
                    right,
                ));
                result
            }

            AstNode::UnaryOp { op, operand, .. } => {
                let operand = self.gen_expression(operand);
                let opcode = match op {
                    UnOp::Neg => Opcode::Neg,
                    UnOp::Not => Opcode::Not,
                };
                let result = self.program.new_temp();
                self.program
                    .emit(Instruction::new(opcode, result.clone(), operand, Operand::None));
                result
            }

            AstNode::FunctionCall { name, args, .. } => {
                // Nested calls must finish before this call's params start
                let values: Vec<Operand> =
                    args.iter().map(|arg| self.gen_expression(arg)).collect();
                for value in values {
                    self.program.emit(Instruction::param(value));
                }
                let result = self.program.new_temp();
                self.program
                    .emit(Instruction::call(result.clone(), name, args.len()));
                result
            }

            other => {
                log::trace!("no value for statement node at {}", other.location());
                Operand::None
            }
        }
    }
}

pub fn binary_opcode(op: BinOp) -> Opcode {
    match op {
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
        BinOp::Mod => Opcode::Mod,
        BinOp::Eq => Opcode::Eq,
        BinOp::Ne => Opcode::Ne,
        BinOp::Lt => Opcode::Lt,
        BinOp::Le => Opcode::Le,
        BinOp::Gt => Opcode::Gt,
        BinOp::Ge => Opcode::Ge,
        BinOp::And => Opcode::And,
        BinOp::Or => Opcode::Or,
    }
}

/// Translate a checked program
pub fn generate(program: &Program) -> IrProgram {
    IrGenerator::new().generate(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::parse;

    fn ir_for(source: &str) -> IrProgram {
        let outcome = parse(source);
        assert!(!outcome.had_error(), "{:?}", outcome.errors);
        generate(&outcome.program)
    }

    fn listing(program: &IrProgram) -> Vec<String> {
        program.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_arithmetic_order() {
        let ir = ir_for("int main() { int x = 1 + 2 * 3; return x; }");
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "t0 = 2 MUL 3",
                "t1 = 1 ADD t0",
                "x = t1",
                "return x",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_shadowed_locals_share_a_name() {
        let ir = ir_for("int main() { int x = 1; { int x = 2; } return x; }");
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "x = 1",
                "x = 2",
                "return x",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_if_without_else_uses_one_label() {
        let ir = ir_for("int main() { int a = 0; if (a < 1) a = 1; return a; }");
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "a = 0",
                "t0 = a LT 1",
                "iffalse t0 goto L0",
                "a = 1",
                "L0:",
                "return a",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_if_else_layout() {
        let ir = ir_for("int main() { if (true) return 1; else return 2; }");
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "iffalse 1 goto L0",
                "return 1",
                "goto L1",
                "L0:",
                "return 2",
                "L1:",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_while_layout() {
        let ir = ir_for("void main() { int i = 0; while (i < 10) { i = i + 1; } }");
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "i = 0",
                "L0:",
                "t0 = i LT 10",
                "iffalse t0 goto L1",
                "t1 = i ADD 1",
                "i = t1",
                "goto L0",
                "L1:",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_for_with_break_and_continue() {
        let ir = ir_for(
            "void main() { for (int i = 0; i < 3; i = i + 1) { if (i == 1) continue; break; } }",
        );
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "i = 0",
                "L0:",
                "t0 = i LT 3",
                "iffalse t0 goto L2",
                "t1 = i EQ 1",
                "iffalse t1 goto L3",
                "goto L1",
                "L3:",
                "goto L2",
                "L1:",
                "t2 = i ADD 1",
                "i = t2",
                "goto L0",
                "L2:",
                "end function main",
            ]
        );
        assert!(ir.labels_are_consistent());
    }

    #[test]
    fn test_calls_push_params_in_order() {
        let ir = ir_for(
            "int add(int a, int b); int main() { return add(add(1, 2), 'A'); }",
        );
        assert_eq!(
            listing(&ir),
            vec![
                "function main:",
                "param 1",
                "param 2",
                "t0 = call add, 2",
                "param t0",
                "param 65",
                "t1 = call add, 2",
                "return t1",
                "end function main",
            ]
        );
        let call = ir.instructions()[6].clone();
        assert_eq!(call.opcode, Opcode::Call);
        assert_eq!(call.arg_count, 2);
    }

    #[test]
    fn test_globals_and_unary() {
        let ir = ir_for("int g = -5; bool on = !false; void main() { }");
        assert_eq!(
            listing(&ir),
            vec![
                "t0 = - 5",
                "g = t0",
                "t1 = ! 0",
                "on = t1",
                "function main:",
                "end function main",
            ]
        );
    }

    #[test]
    fn test_logical_operators_are_plain_instructions() {
        let ir = ir_for("bool f(bool a, bool b) { return a && b || !a; }");
        let opcodes: Vec<Opcode> = ir.iter().map(|inst| inst.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                Opcode::FuncBegin,
                Opcode::And,
                Opcode::Not,
                Opcode::Or,
                Opcode::Return,
                Opcode::FuncEnd,
            ]
        );
    }
}
