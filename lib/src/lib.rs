//! Decode JVM class files and check lifecycle phase annotations across override chains
//!
//! The crate is split in two layers:
//!
//!   - [`jvm`] is a reader for the class file format: constant pool, descriptors, method bodies,
//!     annotations, and a scanner that recovers basic block boundaries from raw bytecode
//!   - [`phase`] uses that reader to load the classes of an artifact on demand and report
//!     methods whose lifecycle phase annotations are missing or inconsistent
//!

pub mod jvm;
pub mod phase;
pub mod util;
