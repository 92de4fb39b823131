//! Method bodies and their control flow
//!
//! ### Structure
//!
//! The bytecode of a method is pushed off into [just another method attribute](Code), along
//! with the exception table and (optionally) line numbers. Method bodies are a CFG of basic
//! blocks, but the class file only stores the flat instruction stream, so block boundaries have
//! to be recovered by walking [the instructions][0]:
//!
//!   - most instructions just continue to the next one
//!   - branches, `jsr`, and switches add targets which start new blocks
//!   - returns, `athrow`, `goto`, `ret`, and switches don't continue to the next instruction
//!
//! No values are interpreted: the scanner only cares about where control can go.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-6.html#jvms-6.5

mod basic_block;
mod code;
pub mod opcodes;
mod references;

pub use basic_block::*;
pub use code::*;
pub use references::*;
