//! Three-address instructions and the IR program container
//!
//! Every instruction has an opcode and up to three operands: `result`,
//! `arg1` and `arg2`. Control-flow instructions keep their target label
//! in `result`; `CALL` additionally records its argument count.
//!
//! The textual form produced by `Display` is a debugging aid:
//!
//! ```text
//! function main:
//!     t0 = 2 MUL 3
//!     t1 = 1 ADD t0
//!     x = t1
//!     return x
//! end function main
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Assignment and arithmetic
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    // Logical
    And,
    Or,
    Not,
    // Control flow
    Label,
    Goto,
    If,
    IfFalse,
    // Functions
    FuncBegin,
    FuncEnd,
    Param,
    Call,
    Return,
    Nop,
}

impl Opcode {
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Assign => "ASSIGN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Le => "LE",
            Opcode::Ge => "GE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Label => "LABEL",
            Opcode::Goto => "GOTO",
            Opcode::If => "IF",
            Opcode::IfFalse => "IFFALSE",
            Opcode::FuncBegin => "FUNC_BEGIN",
            Opcode::FuncEnd => "FUNC_END",
            Opcode::Param => "PARAM",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Nop => "NOP",
        }
    }

    /// Opcodes whose `result` is a label to jump to
    pub fn is_jump(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::If | Opcode::IfFalse)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An instruction operand
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Operand {
    #[default]
    None,
    Temp(usize),
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    Label(usize),
    Func(String),
}

impl Operand {
    pub fn is_none(&self) -> bool {
        matches!(self, Operand::None)
    }

    pub fn label_id(&self) -> Option<usize> {
        match self {
            Operand::Label(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Temp(id) => write!(f, "t{}", id),
            Operand::Var(name) | Operand::Func(name) => f.write_str(name),
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                write!(f, "{:.1}", value)
            }
            Operand::Float(value) => write!(f, "{}", value),
            Operand::Str(value) => write!(f, "{:?}", value),
            Operand::Label(id) => write!(f, "L{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub result: Operand,
    pub arg1: Operand,
    pub arg2: Operand,
    /// Number of arguments, `CALL` only
    pub arg_count: usize,
}

impl Instruction {
    pub fn new(opcode: Opcode, result: Operand, arg1: Operand, arg2: Operand) -> Self {
        Self {
            opcode,
            result,
            arg1,
            arg2,
            arg_count: 0,
        }
    }

    pub fn assign(target: Operand, value: Operand) -> Self {
        Self::new(Opcode::Assign, target, value, Operand::None)
    }

    pub fn label(id: usize) -> Self {
        Self::new(Opcode::Label, Operand::Label(id), Operand::None, Operand::None)
    }

    pub fn goto(id: usize) -> Self {
        Self::new(Opcode::Goto, Operand::Label(id), Operand::None, Operand::None)
    }

    pub fn if_false(condition: Operand, id: usize) -> Self {
        Self::new(Opcode::IfFalse, Operand::Label(id), condition, Operand::None)
    }

    pub fn func_begin(name: &str) -> Self {
        Self::new(
            Opcode::FuncBegin,
            Operand::Func(name.to_string()),
            Operand::None,
            Operand::None,
        )
    }

    pub fn func_end(name: &str) -> Self {
        Self::new(
            Opcode::FuncEnd,
            Operand::Func(name.to_string()),
            Operand::None,
            Operand::None,
        )
    }

    pub fn param(value: Operand) -> Self {
        Self::new(Opcode::Param, Operand::None, value, Operand::None)
    }

    pub fn call(result: Operand, name: &str, arg_count: usize) -> Self {
        Self {
            arg_count,
            ..Self::new(
                Opcode::Call,
                result,
                Operand::Func(name.to_string()),
                Operand::None,
            )
        }
    }

    pub fn ret(value: Option<Operand>) -> Self {
        Self::new(
            Opcode::Return,
            Operand::None,
            value.unwrap_or_default(),
            Operand::None,
        )
    }

    pub fn nop() -> Self {
        Self::new(Opcode::Nop, Operand::None, Operand::None, Operand::None)
    }

    /// Label this instruction jumps to, if it is a jump
    pub fn jump_target(&self) -> Option<usize> {
        if self.opcode.is_jump() {
            self.result.label_id()
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Label => write!(f, "{}:", self.result),
            Opcode::Goto => write!(f, "goto {}", self.result),
            Opcode::If => write!(f, "if {} goto {}", self.arg1, self.result),
            Opcode::IfFalse => write!(f, "iffalse {} goto {}", self.arg1, self.result),
            Opcode::FuncBegin => write!(f, "function {}:", self.result),
            Opcode::FuncEnd => write!(f, "end function {}", self.result),
            Opcode::Param => write!(f, "param {}", self.arg1),
            Opcode::Call => write!(f, "{} = call {}, {}", self.result, self.arg1, self.arg_count),
            Opcode::Return if self.arg1.is_none() => f.write_str("return"),
            Opcode::Return => write!(f, "return {}", self.arg1),
            Opcode::Assign => write!(f, "{} = {}", self.result, self.arg1),
            Opcode::Neg => write!(f, "{} = - {}", self.result, self.arg1),
            Opcode::Not => write!(f, "{} = ! {}", self.result, self.arg1),
            Opcode::Nop => f.write_str("nop"),
            op => write!(f, "{} = {} {} {}", self.result, self.arg1, op, self.arg2),
        }
    }
}

/// An ordered instruction list plus the temporary and label counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IrProgram {
    instructions: Vec<Instruction>,
    temp_counter: usize,
    label_counter: usize,
}

impl IrProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh temporary, never handed out twice
    pub fn new_temp(&mut self) -> Operand {
        let id = self.temp_counter;
        self.temp_counter += 1;
        log::trace!("allocated t{}", id);
        Operand::Temp(id)
    }

    /// Fresh label id, never handed out twice
    pub fn new_label(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        log::trace!("allocated L{}", id);
        id
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn temp_count(&self) -> usize {
        self.temp_counter
    }

    pub fn label_count(&self) -> usize {
        self.label_counter
    }

    /// Ids of every emitted `LABEL`, in program order
    pub fn labels(&self) -> Vec<usize> {
        self.instructions
            .iter()
            .filter(|inst| inst.opcode == Opcode::Label)
            .filter_map(|inst| inst.result.label_id())
            .collect()
    }

    /// Labels are pairwise distinct and every jump lands on one of them
    pub fn labels_are_consistent(&self) -> bool {
        let labels = self.labels();
        let mut seen = rustc_hash::FxHashSet::default();
        if !labels.iter().all(|id| seen.insert(*id)) {
            return false;
        }
        self.instructions
            .iter()
            .filter_map(Instruction::jump_target)
            .all(|target| seen.contains(&target))
    }
}

impl<'a> IntoIterator for &'a IrProgram {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            match inst.opcode {
                Opcode::Label | Opcode::FuncBegin => writeln!(f, "{}", inst)?,
                Opcode::FuncEnd => writeln!(f, "{}\n", inst)?,
                _ => writeln!(f, "    {}", inst)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let add = Instruction::new(
            Opcode::Add,
            Operand::Temp(0),
            Operand::Var("a".into()),
            Operand::Int(1),
        );
        assert_eq!(add.to_string(), "t0 = a ADD 1");
        assert_eq!(Instruction::label(3).to_string(), "L3:");
        assert_eq!(Instruction::goto(1).to_string(), "goto L1");
        assert_eq!(
            Instruction::if_false(Operand::Temp(2), 1).to_string(),
            "iffalse t2 goto L1"
        );
        assert_eq!(
            Instruction::call(Operand::Temp(4), "f", 2).to_string(),
            "t4 = call f, 2"
        );
        assert_eq!(Instruction::ret(None).to_string(), "return");
        assert_eq!(
            Instruction::ret(Some(Operand::Float(2.0))).to_string(),
            "return 2.0"
        );
        assert_eq!(
            Instruction::param(Operand::Str("hi\n".into())).to_string(),
            "param \"hi\\n\""
        );
        assert_eq!(Instruction::func_begin("main").to_string(), "function main:");
        assert_eq!(Instruction::func_end("main").to_string(), "end function main");
    }

    #[test]
    fn test_counters_are_monotonic() {
        let mut program = IrProgram::new();
        assert_eq!(program.new_temp(), Operand::Temp(0));
        assert_eq!(program.new_temp(), Operand::Temp(1));
        assert_eq!(program.new_label(), 0);
        assert_eq!(program.new_label(), 1);
        assert_eq!(program.temp_count(), 2);
        assert_eq!(program.label_count(), 2);
    }

    #[test]
    fn test_label_consistency() {
        let mut program = IrProgram::new();
        program.emit(Instruction::label(0));
        program.emit(Instruction::goto(0));
        assert!(program.labels_are_consistent());

        program.emit(Instruction::goto(7));
        assert!(!program.labels_are_consistent());

        let mut duplicated = IrProgram::new();
        duplicated.emit(Instruction::label(0));
        duplicated.emit(Instruction::label(0));
        assert!(!duplicated.labels_are_consistent());
    }

    #[test]
    fn test_program_listing_indents_body() {
        let mut program = IrProgram::new();
        program.emit(Instruction::func_begin("main"));
        program.emit(Instruction::ret(Some(Operand::Int(0))));
        program.emit(Instruction::func_end("main"));
        assert_eq!(
            program.to_string(),
            "function main:\n    return 0\nend function main\n\n"
        );
    }
}
