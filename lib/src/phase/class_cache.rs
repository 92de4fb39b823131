use super::{Artifact, Error};
use crate::jvm::class_file::ClassFile;
use crate::jvm::{ClassName, FieldType};
use elsa::map::FrozenMap;
use std::collections::HashSet;

/// Classes loaded from an artifact, by name
///
/// Classes are loaded on demand and kept for the lifetime of the cache. Since loaded classes are
/// never evicted, references to them can be handed out from `&self`.
pub struct ClassCache<'a, A: Artifact + ?Sized> {
    artifact: &'a A,

    /// Package prefixes of classes that are never loaded
    library_prefixes: Vec<String>,

    classes: FrozenMap<ClassName, Box<ClassFile>>,
}

impl<'a, A: Artifact + ?Sized> ClassCache<'a, A> {
    pub fn new(artifact: &'a A, library_prefixes: Vec<String>) -> ClassCache<'a, A> {
        ClassCache {
            artifact,
            library_prefixes,
            classes: FrozenMap::new(),
        }
    }

    pub fn is_library(&self, name: &ClassName) -> bool {
        self.library_prefixes
            .iter()
            .any(|prefix| name.has_package_prefix(prefix))
    }

    /// Load a class from the artifact (or from the cache, if it was already loaded)
    pub fn load(&self, name: &ClassName) -> Result<&ClassFile, Error> {
        if let Some(class) = self.classes.get(name) {
            return Ok(class);
        }

        log::debug!("Loading class '{}'", name);
        let bytes = self.artifact.load_class_file(name)?;
        let class =
            ClassFile::parse(&bytes).map_err(|err| Error::ClassFormat(name.clone(), err))?;
        if &class.this_class != name {
            return Err(Error::ClassNameMismatch {
                requested: name.clone(),
                found: class.this_class,
            });
        }

        Ok(self.classes.insert(name.clone(), Box::new(class)))
    }

    /// Load a class, unless it is a library class or isn't in the artifact
    ///
    /// Failing to decode a class that is in the artifact is still an error.
    pub fn load_optional(&self, name: &ClassName) -> Result<Option<&ClassFile>, Error> {
        if self.is_library(name) {
            return Ok(None);
        }
        match self.load(name) {
            Ok(class) => Ok(Some(class)),
            Err(Error::MissingClass(missing)) => {
                log::debug!("Class '{}' is not in the artifact", missing);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Superclasses of a class, nearest first
    ///
    /// The walk stops at the first superclass that is a library class or that is missing from
    /// the artifact.
    pub fn superclasses<'s>(&'s self, class: &'s ClassFile) -> Result<Vec<&'s ClassFile>, Error> {
        let mut superclasses = vec![];
        let mut seen: HashSet<&ClassName> = HashSet::new();
        seen.insert(&class.this_class);

        let mut next = class.super_class.as_ref();
        while let Some(name) = next {
            if !seen.insert(name) {
                return Err(Error::CyclicHierarchy(name.clone()));
            }
            match self.load_optional(name)? {
                Some(superclass) => {
                    superclasses.push(superclass);
                    next = superclass.super_class.as_ref();
                }
                None => break,
            }
        }

        Ok(superclasses)
    }

    /// Is the first class a subtype of the second?
    ///
    /// This does a traversal of super types (superclasses and interfaces). Library and missing
    /// classes are opaque: the only thing known about them is that they are subtypes of
    /// `java.lang.Object`.
    pub fn is_class_assignable(
        &self,
        sub_type: &ClassName,
        super_type: &ClassName,
    ) -> Result<bool, Error> {
        if super_type == &ClassName::OBJECT {
            return Ok(true);
        }

        let mut supertypes_to_visit: Vec<ClassName> = vec![sub_type.clone()];
        let mut dont_revisit: HashSet<ClassName> = HashSet::new();
        dont_revisit.insert(sub_type.clone());

        while let Some(class_name) = supertypes_to_visit.pop() {
            if &class_name == super_type {
                return Ok(true);
            }
            let class = match self.load_optional(&class_name)? {
                Some(class) => class,
                None => continue,
            };

            // Enqueue next types to visit
            for next in class.super_class.iter().chain(class.interfaces.iter()) {
                if dont_revisit.insert(next.clone()) {
                    supertypes_to_visit.push(next.clone());
                }
            }
        }

        Ok(false)
    }

    /// Is the first type assignable to the second?
    pub fn is_assignable(&self, sub_type: &FieldType, super_type: &FieldType) -> Result<bool, Error> {
        if sub_type == super_type {
            return Ok(true);
        }
        match (sub_type, super_type) {
            (FieldType::Object(cls1), FieldType::Object(cls2)) => {
                self.is_class_assignable(cls1, cls2)
            }

            // Special superclass and interfaces of all arrays
            (FieldType::Array(_), FieldType::Object(cls)) => Ok(cls == &ClassName::OBJECT
                || cls == &ClassName::CLONEABLE
                || cls == &ClassName::SERIALIZABLE),

            // Covariance of arrays of references
            (FieldType::Array(elem1), FieldType::Array(elem2))
                if elem1.is_reference() && elem2.is_reference() =>
            {
                self.is_assignable(elem1, elem2)
            }

            _ => Ok(false),
        }
    }
}
