use super::class_file::Version;

/// Ways a class file can fail to decode
///
/// These are all fatal for the class being read.
#[derive(Debug)]
pub enum Error {
    /// Tried to read `requested` bytes at `position`, but the input ran out
    UnexpectedEof { position: usize, requested: usize },

    /// Only the one byte that was just read can be pushed back
    InvalidPushBack(usize),

    /// First four bytes were not `0xCAFEBABE`
    BadMagic(u32),

    UnsupportedVersion(Version),

    UnknownConstantTag { index: u16, tag: u8 },
    BadMethodHandleKind(u8),

    /// Index is 0, past the end of the pool, or the unusable slot after a `long`/`double`
    InvalidConstantIndex(u16),

    /// Constant exists, but is not the kind of constant that was expected
    UnexpectedConstant { index: u16, expected: &'static str },

    /// The constant pool count claims a slot that is the second half of a `long`/`double`
    ConstantPoolOverflow(u16),

    /// Byte sequence that isn't valid modified UTF-8 (position is relative to the string)
    MalformedUtf8(usize),

    MalformedName(String),
    BadDescriptor { descriptor: String, reason: String },

    /// A super class index of 0 on something other than `java.lang.Object`
    MissingSuperclass(String),

    /// Structure parsed, but bytes were left over
    TrailingBytes(usize),

    DuplicateAttribute(&'static str),

    BadOpcode { offset: usize, opcode: u8 },
    BadBranchTarget { offset: usize, target: i64 },
    BadSwitchBounds { offset: usize, low: i32, high: i32 },

    /// Execution can run past the last instruction
    CodeOverrun(usize),

    BadElementValueTag(u8),
    AnnotationNestingTooDeep,
}
