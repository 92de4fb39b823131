use super::{
    Attribute, ByteCursor, ClassConstantIndex, ConstantIndex, ConstantPool, Field, Method, Version,
};
use crate::jvm::{ClassAccessFlags, ClassName, Error, Name};

/// Representation of the [`class` file format of the JVM][0]
///
/// Symbolic names (this class, super class, interfaces) are resolved out of the constant pool
/// while reading, so they are available without going back to the pool.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html
#[derive(Debug)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassName,

    /// Only `java.lang.Object` has no super class
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic number every class file starts with
    pub const MAGIC: u32 = 0xCAFEBABE;

    /// Decode a class file
    ///
    /// Decoding fails on the first problem encountered, and the whole input must be used up.
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, Error> {
        let mut reader = ByteCursor::new(bytes);

        let magic = reader.read_u32()?;
        if magic != ClassFile::MAGIC {
            return Err(Error::BadMagic(magic));
        }
        let version = Version::parse(&mut reader)?;
        let constants = ConstantPool::parse(&mut reader)?;
        let access_flags = ClassAccessFlags::from_bits_truncate(reader.read_u16()?);

        let this_class = constants.class_name(class_index(reader.read_u16()?))?;
        let super_class = match reader.read_u16()? {
            0 if this_class == ClassName::OBJECT => None,
            0 => return Err(Error::MissingSuperclass(this_class.as_str().to_owned())),
            idx => Some(constants.class_name(class_index(idx))?),
        };

        let interfaces_count = reader.read_u16()?;
        let interfaces = (0..interfaces_count)
            .map(|_| constants.class_name(class_index(reader.read_u16()?)))
            .collect::<Result<Vec<_>, Error>>()?;

        let fields_count = reader.read_u16()?;
        let fields = (0..fields_count)
            .map(|_| Field::parse(&mut reader, &constants, &this_class))
            .collect::<Result<Vec<_>, Error>>()?;

        let methods_count = reader.read_u16()?;
        let methods = (0..methods_count)
            .map(|_| Method::parse(&mut reader, &constants, &this_class))
            .collect::<Result<Vec<_>, Error>>()?;

        let attributes = Attribute::parse_all(&mut reader, &constants)?;

        if !reader.is_exhausted() {
            return Err(Error::TrailingBytes(reader.remaining()));
        }

        log::trace!(
            "Decoded '{}' ({} fields, {} methods)",
            this_class,
            fields.len(),
            methods.len()
        );

        Ok(ClassFile {
            version,
            constants,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }
}

fn class_index(idx: u16) -> ClassConstantIndex {
    ClassConstantIndex(ConstantIndex(idx))
}
