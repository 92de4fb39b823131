use super::ByteCursor;
use crate::jvm::{ClassName, Error, MethodDescriptor, Name, ParseDescriptor, UnqualifiedName};
use crate::util::{Offset, OffsetResult, OffsetVec, Width};
use std::convert::TryFrom;

/// Class file constant pool, as read out of a class file
///
/// Indexing starts at 1 (index 0 is reserved and never resolves). Since `long` and `double`
/// constants take up two slots, the index right after one of them doesn't resolve either.
#[derive(Debug)]
pub struct ConstantPool {
    constants: OffsetVec<Constant>,
}

impl ConstantPool {
    /// Read the constant pool count and then all of the constants
    pub fn parse(reader: &mut ByteCursor) -> Result<ConstantPool, Error> {
        let count = reader.read_u16()?;
        let mut constants = OffsetVec::new_starting_at(Offset(1));
        while constants.offset_len().0 < count as usize {
            let index = constants.offset_len().0 as u16;
            constants.push(Constant::parse(reader, index)?);
        }

        // A `long` or `double` in the last slot spills past the declared count
        if constants.offset_len().0 != count as usize {
            return Err(Error::ConstantPoolOverflow(count));
        }

        Ok(ConstantPool { constants })
    }

    /// Number of constants (not the same as the number of slots)
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Iterate over constants and their indices
    pub fn iter(&self) -> impl Iterator<Item = (ConstantIndex, &Constant)> {
        self.constants
            .iter()
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant))
    }

    /// Look up any constant
    pub fn get(&self, index: ConstantIndex) -> Result<&Constant, Error> {
        match self.constants.get_offset(Offset(index.0 as usize)) {
            OffsetResult::Ok(constant) => Ok(constant),
            OffsetResult::InvalidOffset | OffsetResult::TooLarge => {
                Err(Error::InvalidConstantIndex(index.0))
            }
        }
    }

    /// Look up a `CONSTANT_Utf8`
    pub fn utf8(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.get(index.0)? {
            Constant::Utf8(string) => Ok(string),
            _ => Err(Error::UnexpectedConstant {
                index: (index.0).0,
                expected: "Utf8",
            }),
        }
    }

    /// Look up a `CONSTANT_Class` and return its dotted name
    pub fn class_name(&self, index: ClassConstantIndex) -> Result<ClassName, Error> {
        match self.get(index.0)? {
            Constant::Class(name) => {
                ClassName::from_internal(self.utf8(*name)?).map_err(Error::MalformedName)
            }
            _ => Err(Error::UnexpectedConstant {
                index: (index.0).0,
                expected: "Class",
            }),
        }
    }

    /// Look up a `CONSTANT_NameAndType`, returning the name and the raw descriptor
    pub fn name_and_type(&self, index: NameAndTypeConstantIndex) -> Result<(&str, &str), Error> {
        match self.get(index.0)? {
            Constant::NameAndType { name, descriptor } => {
                Ok((self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(Error::UnexpectedConstant {
                index: (index.0).0,
                expected: "NameAndType",
            }),
        }
    }

    /// Look up a `CONSTANT_Methodref` or `CONSTANT_InterfaceMethodref`
    pub fn method_ref(&self, index: ConstantIndex) -> Result<MethodRef, Error> {
        match self.get(index)? {
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                let (name, descriptor) = self.name_and_type(*name_and_type)?;
                Ok(MethodRef {
                    class: self.class_name(*class)?,
                    name: UnqualifiedName::from_string(name.to_owned())
                        .map_err(Error::MalformedName)?,
                    descriptor: MethodDescriptor::parse(descriptor)?,
                    is_interface: *is_interface,
                })
            }
            _ => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "Methodref",
            }),
        }
    }
}

/// Symbolic reference to a method, resolved out of the constant pool
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct MethodRef {
    pub class: ClassName,
    pub name: UnqualifiedName,
    pub descriptor: MethodDescriptor,
    pub is_interface: bool,
}

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`)
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        method_descriptor: NameAndTypeConstantIndex,
    },
}

impl Constant {
    /// Read one constant (`index` is only used for error reporting)
    pub fn parse(reader: &mut ByteCursor, index: u16) -> Result<Constant, Error> {
        fn utf8(reader: &mut ByteCursor) -> Result<Utf8ConstantIndex, Error> {
            reader.read_u16().map(|idx| Utf8ConstantIndex(ConstantIndex(idx)))
        }
        fn class(reader: &mut ByteCursor) -> Result<ClassConstantIndex, Error> {
            reader.read_u16().map(|idx| ClassConstantIndex(ConstantIndex(idx)))
        }
        fn name_and_type(reader: &mut ByteCursor) -> Result<NameAndTypeConstantIndex, Error> {
            reader
                .read_u16()
                .map(|idx| NameAndTypeConstantIndex(ConstantIndex(idx)))
        }

        let constant = match reader.read_u8()? {
            1 => Constant::Utf8(reader.read_utf8()?),
            3 => Constant::Integer(reader.read_i32()?),
            4 => Constant::Float(reader.read_f32()?),
            5 => Constant::Long(reader.read_i64()?),
            6 => Constant::Double(reader.read_f64()?),
            7 => Constant::Class(utf8(reader)?),
            8 => Constant::String(utf8(reader)?),
            9 => Constant::FieldRef(class(reader)?, name_and_type(reader)?),
            10 => Constant::MethodRef {
                class: class(reader)?,
                name_and_type: name_and_type(reader)?,
                is_interface: false,
            },
            11 => Constant::MethodRef {
                class: class(reader)?,
                name_and_type: name_and_type(reader)?,
                is_interface: true,
            },
            12 => Constant::NameAndType {
                name: utf8(reader)?,
                descriptor: utf8(reader)?,
            },
            15 => Constant::MethodHandle {
                handle_kind: HandleKind::try_from(reader.read_u8()?)?,
                member: ConstantIndex(reader.read_u16()?),
            },
            16 => Constant::MethodType {
                descriptor: utf8(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: reader.read_u16()?,
                method_descriptor: name_and_type(reader)?,
            },
            tag => return Err(Error::UnknownConstantTag { index, tag }),
        };
        Ok(constant)
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Kind of a method handle constant
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-5.html#jvms-5.4.3.5
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl TryFrom<u8> for HandleKind {
    type Error = Error;

    fn try_from(kind: u8) -> Result<HandleKind, Error> {
        let handle_kind = match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return Err(Error::BadMethodHandleKind(kind)),
        };
        Ok(handle_kind)
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(pub ConstantIndex);

/// Decode the modified UTF-8 used for strings in class files
///
/// This differs from UTF-8 in two ways: the null character is encoded on two bytes, and
/// supplementary characters are encoded as a surrogate pair with each surrogate taking three
/// bytes. Unpaired surrogates (which Java strings allow but Rust strings don't) become
/// `U+FFFD`.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.4.7
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, Error> {
    let mut string = String::with_capacity(bytes.len());
    let mut position = 0;

    // Read one code unit (a `u16` in Java), returning it and how many bytes it took
    let code_unit = |at: usize| -> Result<(u32, usize), Error> {
        let continuation = |offset: usize| -> Result<u32, Error> {
            match bytes.get(at + offset) {
                Some(&byte) if byte & 0b1100_0000 == 0b1000_0000 => Ok((byte & 0x3F) as u32),
                _ => Err(Error::MalformedUtf8(at)),
            }
        };
        let first = bytes[at];
        if first & 0b1000_0000 == 0 && first != 0 {
            Ok((first as u32, 1))
        } else if first & 0b1110_0000 == 0b1100_0000 {
            Ok((((first & 0x1F) as u32) << 6 | continuation(1)?, 2))
        } else if first & 0b1111_0000 == 0b1110_0000 {
            let high = ((first & 0x0F) as u32) << 12 | continuation(1)? << 6;
            Ok((high | continuation(2)?, 3))
        } else {
            Err(Error::MalformedUtf8(at))
        }
    };

    while position < bytes.len() {
        let (unit, len) = code_unit(position)?;
        position += len;

        let c = match unit {
            0xD800..=0xDBFF => {
                // High surrogate: try to pair it with a low surrogate
                match (position < bytes.len()).then(|| code_unit(position)) {
                    Some(Ok((low @ 0xDC00..=0xDFFF, low_len))) => {
                        position += low_len;
                        let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                    }
                    Some(Err(err)) => return Err(err),
                    _ => char::REPLACEMENT_CHARACTER,
                }
            }
            _ => char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER),
        };
        string.push(c);
    }

    Ok(string)
}
