use super::Error;
use crate::jvm::ClassName;
use std::collections::BTreeMap;

/// Collection of classes to verify (eg. the contents of a jar or of a build directory)
pub trait Artifact {
    /// Get the bytes of a class file
    ///
    /// A class that is not in the artifact is an [`Error::MissingClass`].
    fn load_class_file(&self, name: &ClassName) -> Result<Vec<u8>, Error>;

    /// Names of all the classes in the artifact
    fn class_names(&self) -> Result<Box<dyn Iterator<Item = ClassName> + '_>, Error>;
}

/// Artifact whose class files are all held in memory
#[derive(Default, Debug)]
pub struct MemoryArtifact {
    classes: BTreeMap<ClassName, Vec<u8>>,
}

impl MemoryArtifact {
    pub fn new() -> MemoryArtifact {
        MemoryArtifact::default()
    }

    /// Add (or replace) a class file
    pub fn insert(&mut self, name: ClassName, class_file: Vec<u8>) {
        self.classes.insert(name, class_file);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Artifact for MemoryArtifact {
    fn load_class_file(&self, name: &ClassName) -> Result<Vec<u8>, Error> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingClass(name.clone()))
    }

    fn class_names(&self) -> Result<Box<dyn Iterator<Item = ClassName> + '_>, Error> {
        Ok(Box::new(self.classes.keys().cloned()))
    }
}
