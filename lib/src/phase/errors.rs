use crate::jvm;
use crate::jvm::ClassName;

#[derive(Debug)]
pub enum Error {
    /// Class was found, but could not be decoded
    ClassFormat(ClassName, jvm::Error),

    /// Class is not in the artifact
    MissingClass(ClassName),

    /// Class was requested under one name, but declares a different one
    ClassNameMismatch {
        requested: ClassName,
        found: ClassName,
    },

    /// Walking up the superclasses came back around to this class
    CyclicHierarchy(ClassName),

    /// Configured name is not a valid class name
    MalformedName(String),

    IoError(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}
