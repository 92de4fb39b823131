use super::{Attribute, ByteCursor, ConstantIndex, ConstantPool, Utf8ConstantIndex};
use crate::jvm::code::Code;
use crate::jvm::{
    ClassName, Error, MethodAccessFlags, MethodDescriptor, Name, ParseDescriptor, UnqualifiedName,
};
use std::fmt::{Display, Error as FmtError, Formatter};

/// Method declared by a class or interface
///
/// The descriptor and the `Code` attribute are decoded once, when the method is read.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.6
#[derive(Debug)]
pub struct Method {
    /// Class declaring the method
    pub class: ClassName,
    pub access_flags: MethodAccessFlags,
    pub name: UnqualifiedName,
    pub raw_descriptor: String,
    pub descriptor: MethodDescriptor,
    pub code: Option<Code>,
    pub attributes: Vec<Attribute>,
}

impl Method {
    pub fn parse(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        class: &ClassName,
    ) -> Result<Method, Error> {
        let access_flags = MethodAccessFlags::from_bits_truncate(reader.read_u16()?);
        let name = constants.utf8(Utf8ConstantIndex(ConstantIndex(reader.read_u16()?)))?;
        let name = UnqualifiedName::from_string(name.to_owned()).map_err(Error::MalformedName)?;
        let raw_descriptor = constants
            .utf8(Utf8ConstantIndex(ConstantIndex(reader.read_u16()?)))?
            .to_owned();
        let descriptor = MethodDescriptor::parse(&raw_descriptor)?;
        let attributes = Attribute::parse_all(reader, constants)?;
        let code = Attribute::find::<Code>(&attributes, constants)?;

        Ok(Method {
            class: class.clone(),
            access_flags,
            name,
            raw_descriptor,
            descriptor,
            code,
            attributes,
        })
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::PRIVATE)
    }

    /// Can this method override (or be overridden by) a method in another class?
    ///
    /// Initializers, static methods, and private methods are never dispatched virtually.
    pub fn is_virtual(&self) -> bool {
        !self.name.is_initializer() && !self.is_static() && !self.is_private()
    }

    /// Do the two methods have the same name and parameter types? (Return types may differ.)
    pub fn has_same_signature(&self, other: &Method) -> bool {
        self.name == other.name && self.descriptor.parameters == other.descriptor.parameters
    }

    /// Source line of a bytecode offset (0 when unknown or when the method has no code)
    pub fn line_number(&self, offset: usize) -> u16 {
        self.code
            .as_ref()
            .map_or(0, |code| code.line_number(offset))
    }
}

/// Renders as `some.Class.name(descriptor)`
impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "{}.{}{}",
            self.class.as_str(),
            self.name.as_str(),
            self.raw_descriptor
        )
    }
}
