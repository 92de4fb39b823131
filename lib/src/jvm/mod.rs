//! Read JVM classes
//!
//! ### Simple example
//!
//! Consider the following Java class, compiled for Java 8:
//!
//! ```java,ignore,no_run
//! package me.alec;
//!
//! public class Point {
//!     public int norm(int x, int y) {
//!         return x < 0 ? -x + y : x + y;
//!     }
//! }
//! ```
//!
//! Decoding the class file and finding where the basic blocks in `norm` start goes as follows:
//!
//! ```no_run
//! use jphase::jvm::class_file::ClassFile;
//! use jphase::jvm::*;
//!
//! # fn inspect_class(class_bytes: &[u8]) -> Result<(), Error> {
//! let class = ClassFile::parse(class_bytes)?;
//! assert_eq!(class.this_class.as_str(), "me.alec.Point");
//!
//! let norm = class
//!     .methods
//!     .iter()
//!     .find(|method| method.name.as_str() == "norm")
//!     .expect("method is declared");
//! assert_eq!(norm.descriptor.parameters, vec![FieldType::int(), FieldType::int()]);
//!
//! if let Some(code) = &norm.code {
//!     for block_start in code.block_starts()? {
//!         println!("block at {} (line {})", block_start.0, code.line_number(block_start.0));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod access_flags;
pub mod annotations;
pub mod class_file;
pub mod code;
mod descriptors;
mod errors;
mod names;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
