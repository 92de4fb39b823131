use super::{Attribute, ByteCursor, ConstantIndex, ConstantPool, Utf8ConstantIndex};
use crate::jvm::{
    ClassName, Error, FieldAccessFlags, FieldType, Name, ParseDescriptor, UnqualifiedName,
};

/// Field declared by a class or interface
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.5
#[derive(Debug)]
pub struct Field {
    /// Class declaring the field
    pub class: ClassName,
    pub access_flags: FieldAccessFlags,
    pub name: UnqualifiedName,
    pub raw_descriptor: String,
    pub field_type: FieldType,
    pub attributes: Vec<Attribute>,
}

impl Field {
    pub fn parse(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        class: &ClassName,
    ) -> Result<Field, Error> {
        let access_flags = FieldAccessFlags::from_bits_truncate(reader.read_u16()?);
        let name = constants.utf8(Utf8ConstantIndex(ConstantIndex(reader.read_u16()?)))?;
        let name = UnqualifiedName::from_string(name.to_owned()).map_err(Error::MalformedName)?;
        let raw_descriptor = constants
            .utf8(Utf8ConstantIndex(ConstantIndex(reader.read_u16()?)))?
            .to_owned();
        let field_type = FieldType::parse(&raw_descriptor)?;
        let attributes = Attribute::parse_all(reader, constants)?;

        Ok(Field {
            class: class.clone(),
            access_flags,
            name,
            raw_descriptor,
            field_type,
            attributes,
        })
    }
}
