//! Three-address intermediate representation
//!
//! - [`instruction`]: opcodes, operands, instructions and [`IrProgram`]
//! - [`generator`]: lowering of a checked AST into an [`IrProgram`]

pub mod generator;
pub mod instruction;

pub use generator::{generate, IrGenerator};
pub use instruction::{Instruction, IrProgram, Opcode, Operand};
