//! Annotations attached to classes, fields, and methods
//!
//! Annotations live in two attributes that share the same layout: `RuntimeVisibleAnnotations`
//! and `RuntimeInvisibleAnnotations`. Which one the compiler picks depends on the retention
//! policy of the annotation type, so anything looking for a particular annotation needs to check
//! both.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.16

use crate::jvm::class_file::{
    Attribute, AttributeLike, ByteCursor, ConstantIndex, ConstantPool, Utf8ConstantIndex,
};
use crate::jvm::{BaseType, ClassName, Error, FieldType, ParseDescriptor};

/// Annotations can nest inside annotations. Past this depth, the class file is rejected instead
/// of recursing further.
pub const MAX_ANNOTATION_NESTING: usize = 64;

/// Which attribute an annotation was found in
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Retention {
    Visible,
    Invisible,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Annotation {
    /// Annotation interface
    pub type_name: ClassName,

    /// Element-value pairs, in the order they are stored
    pub elements: Vec<(String, ElementValue)>,

    pub retention: Retention,
}

impl Annotation {
    fn parse(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        retention: Retention,
        depth: usize,
    ) -> Result<Annotation, Error> {
        if depth > MAX_ANNOTATION_NESTING {
            return Err(Error::AnnotationNestingTooDeep);
        }

        let type_index = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        let type_name = annotation_type(constants.utf8(type_index)?)?;

        let pair_count = reader.read_u16()?;
        let mut elements = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let name_index = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
            let name = constants.utf8(name_index)?.to_owned();
            let value = ElementValue::parse(reader, constants, retention, depth)?;
            elements.push((name, value));
        }

        Ok(Annotation {
            type_name,
            elements,
            retention,
        })
    }

    /// Look up an element by name
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(element_name, _)| element_name == name)
            .map(|(_, value)| value)
    }
}

/// Annotation types are stored as field descriptors, but must be class types
fn annotation_type(descriptor: &str) -> Result<ClassName, Error> {
    match FieldType::parse(descriptor)? {
        FieldType::Object(class_name) => Ok(class_name),
        _ => Err(Error::BadDescriptor {
            descriptor: descriptor.to_owned(),
            reason: String::from("annotation type must be a class"),
        }),
    }
}

/// Value of an annotation element
///
/// Constants are kept as indices into the constant pool of the enclosing class.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ElementValue {
    /// `B`, `C`, `D`, `F`, `I`, `J`, `S`, `Z`
    Primitive(BaseType, ConstantIndex),

    /// `s`
    String(Utf8ConstantIndex),

    /// `e`
    Enum {
        type_name: Utf8ConstantIndex,
        const_name: Utf8ConstantIndex,
    },

    /// `c` (a return descriptor, so possibly `V`)
    Class(Utf8ConstantIndex),

    /// `@`
    Annotation(Annotation),

    /// `[`
    Array(Vec<ElementValue>),
}

impl ElementValue {
    fn parse(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        retention: Retention,
        depth: usize,
    ) -> Result<ElementValue, Error> {
        let tag = reader.read_u8()?;
        match tag {
            b'B' => ElementValue::parse_primitive(reader, BaseType::Byte),
            b'C' => ElementValue::parse_primitive(reader, BaseType::Char),
            b'D' => ElementValue::parse_primitive(reader, BaseType::Double),
            b'F' => ElementValue::parse_primitive(reader, BaseType::Float),
            b'I' => ElementValue::parse_primitive(reader, BaseType::Int),
            b'J' => ElementValue::parse_primitive(reader, BaseType::Long),
            b'S' => ElementValue::parse_primitive(reader, BaseType::Short),
            b'Z' => ElementValue::parse_primitive(reader, BaseType::Boolean),
            b's' => ElementValue::parse_string(reader),
            b'e' => ElementValue::parse_enum(reader),
            b'c' => ElementValue::parse_class(reader),
            b'@' => ElementValue::parse_annotation(reader, constants, retention, depth),
            b'[' => ElementValue::parse_array(reader, constants, retention, depth),
            other => Err(Error::BadElementValueTag(other)),
        }
    }

    fn parse_primitive(reader: &mut ByteCursor, base_type: BaseType) -> Result<Self, Error> {
        let index = ConstantIndex(reader.read_u16()?);
        Ok(ElementValue::Primitive(base_type, index))
    }

    fn parse_string(reader: &mut ByteCursor) -> Result<Self, Error> {
        let index = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        Ok(ElementValue::String(index))
    }

    fn parse_enum(reader: &mut ByteCursor) -> Result<Self, Error> {
        let type_name = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        let const_name = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        Ok(ElementValue::Enum {
            type_name,
            const_name,
        })
    }

    fn parse_class(reader: &mut ByteCursor) -> Result<Self, Error> {
        let index = Utf8ConstantIndex(ConstantIndex(reader.read_u16()?));
        Ok(ElementValue::Class(index))
    }

    fn parse_annotation(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        retention: Retention,
        depth: usize,
    ) -> Result<Self, Error> {
        let nested = Annotation::parse(reader, constants, retention, depth + 1)?;
        Ok(ElementValue::Annotation(nested))
    }

    fn parse_array(
        reader: &mut ByteCursor,
        constants: &ConstantPool,
        retention: Retention,
        depth: usize,
    ) -> Result<Self, Error> {
        if depth + 1 > MAX_ANNOTATION_NESTING {
            return Err(Error::AnnotationNestingTooDeep);
        }
        let count = reader.read_u16()?;
        let values = (0..count)
            .map(|_| ElementValue::parse(reader, constants, retention, depth + 1))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(ElementValue::Array(values))
    }
}

fn parse_annotation_list(
    reader: &mut ByteCursor,
    constants: &ConstantPool,
    retention: Retention,
) -> Result<Vec<Annotation>, Error> {
    let count = reader.read_u16()?;
    (0..count)
        .map(|_| Annotation::parse(reader, constants, retention, 0))
        .collect()
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.16
pub struct RuntimeVisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeVisibleAnnotations {
    const NAME: &'static str = "RuntimeVisibleAnnotations";

    fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Self, Error> {
        parse_annotation_list(reader, constants, Retention::Visible).map(RuntimeVisibleAnnotations)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.7.17
pub struct RuntimeInvisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeInvisibleAnnotations {
    const NAME: &'static str = "RuntimeInvisibleAnnotations";

    fn parse(reader: &mut ByteCursor, constants: &ConstantPool) -> Result<Self, Error> {
        parse_annotation_list(reader, constants, Retention::Invisible)
            .map(RuntimeInvisibleAnnotations)
    }
}

/// Decode all annotations in a list of attributes
///
/// Annotations are returned in attribute order, and within each attribute in the order they
/// were stored.
pub fn annotations(
    attributes: &[Attribute],
    constants: &ConstantPool,
) -> Result<Vec<Annotation>, Error> {
    let mut found = vec![];
    for attribute in attributes {
        if attribute.name == RuntimeVisibleAnnotations::NAME {
            let decoded: RuntimeVisibleAnnotations = attribute.decode(constants)?;
            found.extend(decoded.0);
        } else if attribute.name == RuntimeInvisibleAnnotations::NAME {
            let decoded: RuntimeInvisibleAnnotations = attribute.decode(constants)?;
            found.extend(decoded.0);
        }
    }
    Ok(found)
}

/// Check if a list of attributes has an annotation of some type
pub fn has_annotation(
    attributes: &[Attribute],
    constants: &ConstantPool,
    type_name: &ClassName,
) -> Result<bool, Error> {
    let found = annotations(attributes, constants)?;
    Ok(found
        .iter()
        .any(|annotation| &annotation.type_name == type_name))
}
