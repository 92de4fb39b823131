use super::{ClassName, Error};
use std::fmt::{Display, Error as FmtError, Formatter};

/// Utility trait for converting descriptors to string representations
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Write the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

/// Utility trait for parsing descriptors out of strings
///
/// Parsing works on prefixes: every parser reports how many bytes of the source it consumed,
/// which is what lets a caller walk a sequence of back-to-back tokens (eg. method parameters).
pub trait ParseDescriptor: Sized {
    /// Parse a descriptor from a string, requiring that the whole string is used
    fn parse(source: &str) -> Result<Self, Error> {
        let (ret, consumed) = Self::parse_prefix(source)?;
        if consumed == source.len() {
            Ok(ret)
        } else {
            Err(bad_descriptor(
                source,
                format!("unexpected leftover input '{}'", &source[consumed..]),
            ))
        }
    }

    /// Parse a descriptor from the start of a string, returning how many bytes were consumed
    fn parse_prefix(source: &str) -> Result<(Self, usize), Error>;
}

fn bad_descriptor(descriptor: &str, reason: impl Into<String>) -> Error {
    Error::BadDescriptor {
        descriptor: descriptor.to_owned(),
        reason: reason.into(),
    }
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    fn from_char(c: char) -> Option<BaseType> {
        let typ = match c {
            'B' => BaseType::Byte,
            'C' => BaseType::Char,
            'D' => BaseType::Double,
            'F' => BaseType::Float,
            'I' => BaseType::Int,
            'J' => BaseType::Long,
            'S' => BaseType::Short,
            'Z' => BaseType::Boolean,
            _ => return None,
        };
        Some(typ)
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        let c = match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        };
        write_to.push(c);
    }
}

impl ParseDescriptor for BaseType {
    fn parse_prefix(source: &str) -> Result<(Self, usize), Error> {
        match source.chars().next() {
            None => Err(bad_descriptor(source, "missing base type character")),
            Some(c) => match BaseType::from_char(c) {
                Some(typ) => Ok((typ, 1)),
                None => Err(bad_descriptor(
                    source,
                    format!("invalid base type character '{}'", c),
                )),
            },
        }
    }
}

/// Type of a field, parameter, or return value
///
/// Unlike the JVM's own verification types, arrays are kept as a plain recursive wrapper: `[[I`
/// is an array of arrays of `int`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType {
    Base(BaseType),
    Object(ClassName),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Most dimensions an array type may have
    pub const MAX_ARRAY_DIMENSIONS: usize = 255;

    pub fn array(element_type: FieldType) -> FieldType {
        FieldType::Array(Box::new(element_type))
    }

    pub const fn object(class_name: ClassName) -> FieldType {
        FieldType::Object(class_name)
    }

    pub const fn int() -> FieldType {
        FieldType::Base(BaseType::Int)
    }

    pub const fn long() -> FieldType {
        FieldType::Base(BaseType::Long)
    }

    pub const fn float() -> FieldType {
        FieldType::Base(BaseType::Float)
    }

    pub const fn double() -> FieldType {
        FieldType::Base(BaseType::Double)
    }

    pub const fn char() -> FieldType {
        FieldType::Base(BaseType::Char)
    }

    pub const fn short() -> FieldType {
        FieldType::Base(BaseType::Short)
    }

    pub const fn byte() -> FieldType {
        FieldType::Base(BaseType::Byte)
    }

    pub const fn boolean() -> FieldType {
        FieldType::Base(BaseType::Boolean)
    }

    /// Is this an object or array type?
    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldType::Base(_))
    }
}

impl RenderDescriptor for FieldType {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Object(class_name) => {
                write_to.push('L');
                write_to.push_str(&class_name.to_internal());
                write_to.push(';');
            }
            FieldType::Array(element_type) => {
                write_to.push('[');
                element_type.render_to(write_to);
            }
        }
    }
}

impl ParseDescriptor for FieldType {
    fn parse_prefix(source: &str) -> Result<(Self, usize), Error> {
        let dimensions = source.bytes().take_while(|b| *b == b'[').count();
        if dimensions > FieldType::MAX_ARRAY_DIMENSIONS {
            return Err(bad_descriptor(source, "too many array dimensions"));
        }

        let element_source = &source[dimensions..];
        let (mut field_type, consumed) = match element_source.chars().next() {
            None if dimensions > 0 => {
                return Err(bad_descriptor(source, "invalid array element type"))
            }
            None => return Err(bad_descriptor(source, "missing field type")),
            Some('L') => {
                let end = element_source
                    .find(';')
                    .ok_or_else(|| bad_descriptor(source, "missing ';' after class name"))?;
                let class_name = ClassName::from_internal(&element_source[1..end])
                    .map_err(|msg| bad_descriptor(source, msg))?;
                (FieldType::Object(class_name), end + 1)
            }
            Some(_) => BaseType::parse_prefix(element_source)
                .map(|(base_type, consumed)| (FieldType::Base(base_type), consumed))
                .map_err(|err| {
                    if dimensions > 0 {
                        bad_descriptor(source, "invalid array element type")
                    } else {
                        err
                    }
                })?,
        };

        for _ in 0..dimensions {
            field_type = FieldType::array(field_type);
        }
        Ok((field_type, dimensions + consumed))
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(&self.render())
    }
}

/// Signature of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_type: Option<FieldType>, // `None` is for `void` (ie. no return)
}

impl RenderDescriptor for MethodDescriptor {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(typ) => typ.render_to(write_to),
        };
    }
}

impl ParseDescriptor for MethodDescriptor {
    fn parse_prefix(source: &str) -> Result<(Self, usize), Error> {
        // Exactly one of each parenthesis, with the opening one first
        if source.matches('(').count() != 1 || source.matches(')').count() != 1 {
            return Err(bad_descriptor(
                source,
                "expected exactly one '(' and one ')'",
            ));
        }
        if !source.starts_with('(') {
            return Err(bad_descriptor(source, "expected '(' for method"));
        }
        let close = source
            .find(')')
            .ok_or_else(|| bad_descriptor(source, "expected ')' for method"))?;

        // Parse parameters
        let mut parameters = vec![];
        let mut position = 1;
        while position < close {
            let (parameter, consumed) = FieldType::parse_prefix(&source[position..close])
                .map_err(|_| bad_descriptor(source, "invalid parameter type"))?;
            parameters.push(parameter);
            position += consumed;
        }

        // Parse return
        let tail = &source[close + 1..];
        let return_type = if tail == "V" {
            None
        } else if tail.is_empty() {
            return Err(bad_descriptor(source, "missing return type"));
        } else {
            let (return_type, consumed) = FieldType::parse_prefix(tail)
                .map_err(|_| bad_descriptor(source, "invalid return type"))?;
            if consumed != tail.len() {
                return Err(bad_descriptor(source, "leftover input after return type"));
            }
            Some(return_type)
        };

        Ok((
            MethodDescriptor {
                parameters,
                return_type,
            },
            source.len(),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::Name;
    use std::fmt::Debug;

    fn round_trip<T: RenderDescriptor + ParseDescriptor + Debug + Eq>(rendered: &str, parsed: T) {
        assert_eq!(rendered, parsed.render());
        assert_eq!(T::parse(rendered).unwrap(), parsed);
    }

    fn object(name: &'static str) -> FieldType {
        FieldType::object(ClassName::from_string(String::from(name)).unwrap())
    }

    #[test]
    fn base_types() {
        round_trip("B", BaseType::Byte);
        round_trip("C", BaseType::Char);
        round_trip("D", BaseType::Double);
        round_trip("F", BaseType::Float);
        round_trip("I", BaseType::Int);
        round_trip("J", BaseType::Long);
        round_trip("S", BaseType::Short);
        round_trip("Z", BaseType::Boolean);
        assert!(BaseType::parse("V").is_err());
    }

    #[test]
    fn field_types() {
        round_trip("I", FieldType::int());
        round_trip("Ljava/lang/Object;", FieldType::object(ClassName::OBJECT));
        round_trip(
            "[[[D",
            FieldType::array(FieldType::array(FieldType::array(FieldType::double()))),
        );
        round_trip(
            "[Ljava/lang/String;",
            FieldType::array(object("java.lang.String")),
        );
    }

    #[test]
    fn field_type_prefixes_report_consumed_length() {
        let source = "[Ljava/lang/String;IJ";
        let (first, first_len) = FieldType::parse_prefix(source).unwrap();
        assert_eq!(first, FieldType::array(object("java.lang.String")));
        assert_eq!(first_len, 19);

        let (second, second_len) = FieldType::parse_prefix(&source[first_len..]).unwrap();
        assert_eq!(second, FieldType::int());
        assert_eq!(second_len, 1);
    }

    #[test]
    fn malformed_field_types() {
        assert!(FieldType::parse("").is_err());
        assert!(FieldType::parse("Ljava/lang/Object").is_err());
        assert!(FieldType::parse("Ljava.lang.Object;").is_err());
        assert!(FieldType::parse("[").is_err());
        assert!(FieldType::parse("II").is_err());
        assert!(FieldType::parse("Q").is_err());
    }

    #[test]
    fn array_dimension_limit() {
        let deepest = format!("{}I", "[".repeat(255));
        let (parsed, consumed) = FieldType::parse_prefix(&deepest).unwrap();
        assert_eq!(consumed, 256);
        assert_eq!(parsed.render(), deepest);

        let too_deep = format!("{}I", "[".repeat(256));
        assert!(matches!(
            FieldType::parse(&too_deep),
            Err(Error::BadDescriptor { .. })
        ));

        let huge = format!("({}I)V", "[".repeat(60_000));
        assert!(MethodDescriptor::parse(&huge).is_err());
    }

    #[test]
    fn method_descriptors() {
        round_trip(
            "(IDLjava/lang/Integer;)Ljava/lang/Object;",
            MethodDescriptor {
                parameters: vec![
                    FieldType::int(),
                    FieldType::double(),
                    object("java.lang.Integer"),
                ],
                return_type: Some(FieldType::object(ClassName::OBJECT)),
            },
        );
        round_trip(
            "()V",
            MethodDescriptor {
                parameters: vec![],
                return_type: None,
            },
        );
        round_trip(
            "([[IZ)[J",
            MethodDescriptor {
                parameters: vec![
                    FieldType::array(FieldType::array(FieldType::int())),
                    FieldType::boolean(),
                ],
                return_type: Some(FieldType::array(FieldType::long())),
            },
        );
    }

    #[test]
    fn method_descriptor_consumes_every_character() {
        for source in &[
            "()V",
            "(I)I",
            "(Ljava/lang/String;[I)V",
            "(JD[[Ljava/util/List;)Ljava/util/Map;",
        ] {
            let close = source.find(')').unwrap();
            let mut position = 1;
            while position < close {
                let (_, consumed) = FieldType::parse_prefix(&source[position..close]).unwrap();
                assert!(consumed > 0);
                position += consumed;
            }
            assert_eq!(position, close, "parameters of {}", source);

            let tail = &source[close + 1..];
            if tail != "V" {
                let (_, consumed) = FieldType::parse_prefix(tail).unwrap();
                assert_eq!(consumed, tail.len(), "return type of {}", source);
            }

            let (_, consumed) = MethodDescriptor::parse_prefix(source).unwrap();
            assert_eq!(consumed, source.len());
        }
    }

    #[test]
    fn malformed_method_descriptors() {
        assert!(MethodDescriptor::parse("I)V").is_err());
        assert!(MethodDescriptor::parse("(I").is_err());
        assert!(MethodDescriptor::parse("((I)V").is_err());
        assert!(MethodDescriptor::parse("(I))V").is_err());
        assert!(MethodDescriptor::parse("(I)").is_err());
        assert!(MethodDescriptor::parse("(I)VV").is_err());
        assert!(MethodDescriptor::parse("(I)II").is_err());
        assert!(MethodDescriptor::parse("(V)V").is_err());
        assert!(MethodDescriptor::parse("(Lfoo.Bar;)V").is_err());
    }
}
