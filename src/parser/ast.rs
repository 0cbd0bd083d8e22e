// AST (Abstract Syntax Tree) definitions for the minic front end

use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Types a declaration can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Float,
    Char,
    Void,
    String,
    Bool,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::Char => "char",
            BaseType::Void => "void",
            BaseType::String => "string",
            BaseType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// Source spelling of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // !x
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnOp::Neg => f.write_str("-"),
            UnOp::Not => f.write_str("!"),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub param_type: BaseType,
    pub location: SourceLocation,
}

/// AST nodes representing declarations, statements and expressions.
///
/// Every node owns its children; optional branches (`else`, initializers,
/// return values, `for` clauses) are the only places a child may be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Top-level declarations
    /// `body` is `None` for a prototype (`int f(int a);`)
    FunctionDecl {
        name: String,
        params: Vec<Param>,
        return_type: BaseType,
        body: Option<Vec<AstNode>>,
        location: SourceLocation,
    },

    // Statements
    VarDecl {
        name: String,
        var_type: BaseType,
        init: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
        location: SourceLocation,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        increment: Option<Box<AstNode>>,
        body: Box<AstNode>,
        location: SourceLocation,
    },
    Return {
        expr: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },

    // Expressions
    Assignment {
        target: String,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    FunctionCall {
        name: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    Identifier(String, SourceLocation),
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    CharLiteral(char, SourceLocation),
    StringLiteral(String, SourceLocation),
    BoolLiteral(bool, SourceLocation),
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::FunctionDecl { location, .. } => location,
            AstNode::VarDecl { location, .. } => location,
            AstNode::Block { location, .. } => location,
            AstNode::If { location, .. } => location,
            AstNode::While { location, .. } => location,
            AstNode::For { location, .. } => location,
            AstNode::Return { location, .. } => location,
            AstNode::Break { location } => location,
            AstNode::Continue { location } => location,
            AstNode::ExpressionStatement { location, .. } => location,
            AstNode::Assignment { location, .. } => location,
            AstNode::BinaryOp { location, .. } => location,
            AstNode::UnaryOp { location, .. } => location,
            AstNode::FunctionCall { location, .. } => location,
            AstNode::Identifier(_, loc) => loc,
            AstNode::IntLiteral(_, loc) => loc,
            AstNode::FloatLiteral(_, loc) => loc,
            AstNode::CharLiteral(_, loc) => loc,
            AstNode::StringLiteral(_, loc) => loc,
            AstNode::BoolLiteral(_, loc) => loc,
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub nodes: Vec<AstNode>, // Global variables, prototypes and function definitions
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
