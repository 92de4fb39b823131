use super::{ByteCursor, ConstantIndex, ConstantPool, Utf8ConstantIndex};
use crate::jvm::Error;

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Only the name is resolved when the attribute is read. The payload stays as raw bytes until
/// something asks for it to be decoded as a particular [`AttributeLike`].
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub info: Vec<u8>,
}

impl Attribute {
    /// Read one attribute
    pub fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Attribute, Error> {
        let name_index = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        let name = constants.utf8(name_index)?.to_owned();

        // Attribute info length is 4 bytes
        let length = reader.read_u32()? as usize;
        let info = reader.read_fully(length)?.to_vec();

        Ok(Attribute { name, info })
    }

    /// Read a `u16` count of attributes followed by that many attributes
    pub fn parse_all(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
    ) -> Result<Vec<Attribute>, Error> {
        let count = reader.read_u16()?;
        (0..count)
            .map(|_| Attribute::parse(reader, constants))
            .collect()
    }

    /// Decode the payload, requiring that every byte of it is used
    pub fn decode<A: AttributeLike>(&self, constants: &ConstantPool) -> Result<A, Error> {
        let mut reader = ByteCursor::new(&self.info);
        let attribute = A::parse(&mut reader, constants)?;
        if !reader.is_exhausted() {
            return Err(Error::TrailingBytes(reader.remaining()));
        }
        Ok(attribute)
    }

    /// Find and decode the attribute with name `A::NAME`, if there is one
    ///
    /// More than one attribute with that name is an error.
    pub fn find<A: AttributeLike>(
        attributes: &[Attribute],
        constants: &ConstantPool,
    ) -> Result<Option<A>, Error> {
        let mut matching = attributes.iter().filter(|attr| attr.name == A::NAME);
        match (matching.next(), matching.next()) {
            (None, _) => Ok(None),
            (Some(attribute), None) => attribute.decode(constants).map(Some),
            (Some(_), Some(_)) => Err(Error::DuplicateAttribute(A::NAME)),
        }
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be decoded out of attributes.
pub trait AttributeLike: Sized {
    /// Name of the attribute
    const NAME: &'static str;

    /// Decode the attribute payload
    fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Self, Error>;
}
