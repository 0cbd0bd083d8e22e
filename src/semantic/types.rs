//! Type rules shared by the analyzer
//!
//! minic has no user-defined types, so every rule is a small function over
//! [`BaseType`]. `char`, `int` and `float` are the numeric types and widen
//! in that order.

use crate::parser::ast::{BaseType, BinOp, UnOp};

pub fn is_numeric(ty: BaseType) -> bool {
    matches!(ty, BaseType::Int | BaseType::Float | BaseType::Char)
}

pub fn is_integral(ty: BaseType) -> bool {
    matches!(ty, BaseType::Int | BaseType::Char)
}

/// Types accepted where a truth value is expected
pub fn is_condition(ty: BaseType) -> bool {
    ty == BaseType::Bool || is_numeric(ty)
}

/// Wider of two numeric types (float > int > char)
pub fn promote(left: BaseType, right: BaseType) -> Option<BaseType> {
    if !is_numeric(left) || !is_numeric(right) {
        return None;
    }
    let rank = |ty: BaseType| match ty {
        BaseType::Float => 2,
        BaseType::Int => 1,
        _ => 0,
    };
    Some(if rank(left) >= rank(right) { left } else { right })
}

/// Conversions allowed without a cast: identity, int→float, char→int, char→float
pub fn can_implicitly_cast(from: BaseType, to: BaseType) -> bool {
    from == to
        || matches!(
            (from, to),
            (BaseType::Int, BaseType::Float)
                | (BaseType::Char, BaseType::Int)
                | (BaseType::Char, BaseType::Float)
        )
}

/// Operands that may be compared with each other; `void` never is
pub fn compatible(left: BaseType, right: BaseType) -> bool {
    left != BaseType::Void && (left == right || (is_numeric(left) && is_numeric(right)))
}

/// Result type of `left op right`, or `None` when the operands are invalid
pub fn binary_result(op: BinOp, left: BaseType, right: BaseType) -> Option<BaseType> {
    match op {
        BinOp::Add if left == BaseType::String && right == BaseType::String => {
            Some(BaseType::String)
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => promote(left, right),
        BinOp::Mod if is_integral(left) && is_integral(right) => promote(left, right),
        BinOp::Mod => None,
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            compatible(left, right).then_some(BaseType::Bool)
        }
        BinOp::And | BinOp::Or => {
            (is_condition(left) && is_condition(right)).then_some(BaseType::Bool)
        }
    }
}

/// Result type of `op operand`, or `None` when the operand is invalid
pub fn unary_result(op: UnOp, operand: BaseType) -> Option<BaseType> {
    match op {
        UnOp::Neg => is_numeric(operand).then_some(operand),
        UnOp::Not => is_condition(operand).then_some(BaseType::Bool),
    }
}
