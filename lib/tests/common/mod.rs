//! Hand-rolled class file writer for building test fixtures
#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};
use jphase::jvm::annotations::Retention;
use jphase::jvm::{ClassName, Name};
use jphase::phase::MemoryArtifact;
use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SUPER: u16 = 0x0020;

pub const SETUP: &str = "Lccre/verifier/SetupPhase;";
pub const FLOW: &str = "Lccre/verifier/FlowPhase;";
pub const IGNORED: &str = "Lccre/verifier/IgnoredPhase;";
pub const OVERRIDE: &str = "Ljava/lang/Override;";

/// Builds a Java 8 class file one piece at a time
pub struct ClassWriter {
    name: String,
    constants: Vec<u8>,
    next_index: u16,
    utf8s: HashMap<String, u16>,
    classes: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    methods: Vec<Vec<u8>>,
}

impl ClassWriter {
    /// New class (names are in internal form, eg. `java/lang/Object`)
    pub fn new(name: &str, super_name: Option<&str>) -> ClassWriter {
        let mut writer = ClassWriter {
            name: name.to_owned(),
            constants: vec![],
            next_index: 1,
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: vec![],
            methods: vec![],
        };
        writer.this_class = writer.class(name);
        if let Some(super_name) = super_name {
            writer.super_class = writer.class(super_name);
        }
        writer
    }

    /// Dotted name of the class being written
    pub fn class_name(&self) -> ClassName {
        ClassName::from_internal(&self.name).unwrap()
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8s.get(value) {
            return *index;
        }
        self.constants.write_u8(1).unwrap();
        self.constants.write_u16::<BigEndian>(value.len() as u16).unwrap();
        self.constants.extend_from_slice(value.as_bytes());
        let index = self.bump(1);
        self.utf8s.insert(value.to_owned(), index);
        index
    }

    pub fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        self.constants.write_u8(7).unwrap();
        self.constants.write_u16::<BigEndian>(name_index).unwrap();
        let index = self.bump(1);
        self.classes.insert(name.to_owned(), index);
        index
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.constants.write_u8(12).unwrap();
        self.constants.write_u16::<BigEndian>(name_index).unwrap();
        self.constants.write_u16::<BigEndian>(descriptor_index).unwrap();
        self.bump(1)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.constants.write_u8(10).unwrap();
        self.constants.write_u16::<BigEndian>(class_index).unwrap();
        self.constants.write_u16::<BigEndian>(name_and_type_index).unwrap();
        self.bump(1)
    }

    /// Long constants take up two slots in the pool
    pub fn long(&mut self, value: i64) -> u16 {
        self.constants.write_u8(5).unwrap();
        self.constants.write_i64::<BigEndian>(value).unwrap();
        self.bump(2)
    }

    pub fn interface(&mut self, name: &str) {
        let index = self.class(name);
        self.interfaces.push(index);
    }

    /// Add a method, with annotations given as descriptors (eg. `Lcom/Foo;`)
    ///
    /// The annotations are written with class retention, like most phase annotations.
    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        annotations: &[&str],
        code: Option<&[u8]>,
    ) {
        let annotations: Vec<(&str, Retention)> = annotations
            .iter()
            .map(|annotation| (*annotation, Retention::Invisible))
            .collect();
        self.method_with_retention(access_flags, name, descriptor, &annotations, code)
    }

    /// Add a method, choosing which annotations attribute each annotation goes in
    pub fn method_with_retention(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        annotations: &[(&str, Retention)],
        code: Option<&[u8]>,
    ) {
        let mut method = vec![];
        method.write_u16::<BigEndian>(access_flags).unwrap();
        method.write_u16::<BigEndian>(self.utf8(name)).unwrap();
        method.write_u16::<BigEndian>(self.utf8(descriptor)).unwrap();

        let visible: Vec<&str> = annotations
            .iter()
            .filter(|(_, retention)| *retention == Retention::Visible)
            .map(|(annotation, _)| *annotation)
            .collect();
        let invisible: Vec<&str> = annotations
            .iter()
            .filter(|(_, retention)| *retention == Retention::Invisible)
            .map(|(annotation, _)| *annotation)
            .collect();

        let attribute_count =
            !visible.is_empty() as u16 + !invisible.is_empty() as u16 + code.is_some() as u16;
        method.write_u16::<BigEndian>(attribute_count).unwrap();

        if !visible.is_empty() {
            self.annotations_attribute(&mut method, "RuntimeVisibleAnnotations", &visible);
        }
        if !invisible.is_empty() {
            self.annotations_attribute(&mut method, "RuntimeInvisibleAnnotations", &invisible);
        }

        if let Some(code) = code {
            method.write_u16::<BigEndian>(self.utf8("Code")).unwrap();
            method
                .write_u32::<BigEndian>(12 + code.len() as u32)
                .unwrap();
            method.write_u16::<BigEndian>(4).unwrap(); // max stack
            method.write_u16::<BigEndian>(4).unwrap(); // max locals
            method.write_u32::<BigEndian>(code.len() as u32).unwrap();
            method.extend_from_slice(code);
            method.write_u16::<BigEndian>(0).unwrap(); // exception handlers
            method.write_u16::<BigEndian>(0).unwrap(); // attributes
        }

        self.methods.push(method);
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = vec![];
        out.write_u32::<BigEndian>(0xCAFEBABE).unwrap();
        out.write_u16::<BigEndian>(0).unwrap();
        out.write_u16::<BigEndian>(52).unwrap();
        out.write_u16::<BigEndian>(self.next_index).unwrap();
        out.extend_from_slice(&self.constants);
        out.write_u16::<BigEndian>(ACC_PUBLIC | ACC_SUPER).unwrap();
        out.write_u16::<BigEndian>(self.this_class).unwrap();
        out.write_u16::<BigEndian>(self.super_class).unwrap();
        out.write_u16::<BigEndian>(self.interfaces.len() as u16).unwrap();
        for interface in &self.interfaces {
            out.write_u16::<BigEndian>(*interface).unwrap();
        }
        out.write_u16::<BigEndian>(0).unwrap(); // fields
        out.write_u16::<BigEndian>(self.methods.len() as u16).unwrap();
        for method in &self.methods {
            out.extend_from_slice(method);
        }
        out.write_u16::<BigEndian>(0).unwrap(); // attributes
        out
    }

    /// Annotations attribute where every annotation has no elements
    fn annotations_attribute(&mut self, out: &mut Vec<u8>, attribute: &str, annotations: &[&str]) {
        out.write_u16::<BigEndian>(self.utf8(attribute)).unwrap();
        out.write_u32::<BigEndian>(2 + 4 * annotations.len() as u32).unwrap();
        out.write_u16::<BigEndian>(annotations.len() as u16).unwrap();
        for annotation in annotations {
            out.write_u16::<BigEndian>(self.utf8(annotation)).unwrap();
            out.write_u16::<BigEndian>(0).unwrap();
        }
    }

    fn bump(&mut self, slots: u16) -> u16 {
        let index = self.next_index;
        self.next_index += slots;
        index
    }
}

/// Artifact holding the classes, each under its declared name
pub fn artifact(classes: Vec<ClassWriter>) -> MemoryArtifact {
    let mut artifact = MemoryArtifact::new();
    for class in classes {
        let name = class.class_name();
        artifact.insert(name, class.finish());
    }
    artifact
}

pub fn name(dotted: &str) -> ClassName {
    ClassName::from_string(dotted.to_owned()).unwrap()
}
