use super::{Artifact, ClassCache, Error, PhaseTag, Settings, WarningSink};
use crate::jvm::annotations::{annotations, Annotation};
use crate::jvm::class_file::{ClassFile, Method};
use crate::jvm::{ClassName, UnqualifiedName};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Identity of a method across the whole artifact
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
struct MethodKey {
    class: ClassName,
    name: UnqualifiedName,
    descriptor: String,
}

impl MethodKey {
    fn of(method: &Method) -> MethodKey {
        MethodKey {
            class: method.class.clone(),
            name: method.name.clone(),
            descriptor: method.raw_descriptor.clone(),
        }
    }
}

/// Checks lifecycle phase annotations over the classes of an artifact
///
/// A verifier is meant for a single run: classes and phases are cached as they are computed and
/// only dropped along with the verifier. Problems with the annotations themselves are reported
/// as warnings through the sink and never abort the run. Only failing to load or decode a class
/// does that.
pub struct PhaseVerifier<'a, A: Artifact + ?Sized, S: WarningSink> {
    artifact: &'a A,
    settings: Settings,
    classes: ClassCache<'a, A>,

    /// Declared phase of every method whose phase has been computed
    phases: RefCell<HashMap<MethodKey, Option<PhaseTag>>>,

    sink: RefCell<S>,
    warning_count: Cell<usize>,
}

impl<'a, A: Artifact + ?Sized, S: WarningSink> PhaseVerifier<'a, A, S> {
    pub fn new(artifact: &'a A, settings: Settings, sink: S) -> PhaseVerifier<'a, A, S> {
        let classes = ClassCache::new(artifact, settings.library_prefixes.clone());
        PhaseVerifier {
            artifact,
            settings,
            classes,
            phases: RefCell::new(HashMap::new()),
            sink: RefCell::new(sink),
            warning_count: Cell::new(0),
        }
    }

    /// Classes loaded so far
    pub fn classes(&self) -> &ClassCache<'a, A> {
        &self.classes
    }

    /// Number of warnings reported so far
    pub fn warning_count(&self) -> usize {
        self.warning_count.get()
    }

    /// Finish the run, giving back the sink
    pub fn into_sink(self) -> S {
        self.sink.into_inner()
    }

    fn warn(&self, message: String) {
        self.warning_count.set(self.warning_count.get() + 1);
        self.sink.borrow_mut().warn(&message);
    }

    /// Verify every method of every class in the artifact
    ///
    /// Returns the total number of warnings reported.
    pub fn verify_all(&self) -> Result<usize, Error> {
        for class_name in self.artifact.class_names()? {
            let class = self.classes.load(&class_name)?;
            log::debug!(
                "Verifying {} methods of '{}'",
                class.methods.len(),
                class_name
            );
            for method in &class.methods {
                self.verify(class, method)?;
            }
        }
        Ok(self.warning_count())
    }

    /// Verify one method: it must declare a phase, and that phase must be consistent with the
    /// method it overrides and the methods it calls
    pub fn verify(&self, class: &ClassFile, method: &Method) -> Result<(), Error> {
        let phase = match self.get_phase(class, method)? {
            Some(phase) => phase,
            None => {
                self.warn(format!("no phase declared for {}", method));
                return Ok(());
            }
        };

        for (callee_class, callee) in self.enumerate_references(class, method)? {
            if let Some(callee_phase) = self.get_phase(callee_class, callee)? {
                if callee_phase != phase {
                    self.warn(format!(
                        "mismatched phase between caller {} ({}) and callee {} ({})",
                        method, phase, callee, callee_phase
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get the phase declared on a method
    ///
    /// The first time this is called for a method, the method is also checked against the
    /// method it overrides (if any).
    pub fn get_phase(
        &self,
        class: &ClassFile,
        method: &Method,
    ) -> Result<Option<PhaseTag>, Error> {
        let key = MethodKey::of(method);
        if let Some(phase) = self.phases.borrow().get(&key) {
            return Ok(*phase);
        }

        let annotations = annotations(&method.attributes, &class.constants)
            .map_err(|err| Error::ClassFormat(class.this_class.clone(), err))?;

        let declared: Vec<PhaseTag> = annotations
            .iter()
            .filter_map(|annotation| self.settings.phase_of(&annotation.type_name))
            .collect();
        if declared.len() > 1 {
            let declared_list: Vec<String> = declared.iter().map(|tag| tag.to_string()).collect();
            self.warn(format!(
                "multiple phases declared on {}: {}",
                method,
                declared_list.join(", ")
            ));
        }
        let phase = declared.first().copied();

        // Cache before looking at overridden methods, so each method is only checked once
        self.phases.borrow_mut().insert(key, phase);

        match self.find_overridden(class, method)? {
            Some((super_class, super_method)) => {
                log::debug!("{} overrides {}", method, super_method);
                let super_phase = self.get_phase(super_class, super_method)?;
                if let (Some(phase), Some(super_phase)) = (phase, super_phase) {
                    if phase != super_phase {
                        self.warn(format!(
                            "mismatched phase between method {} ({}) and overridden method {} ({})",
                            method, phase, super_method, super_phase
                        ));
                    }
                }
            }
            None if self.has_override_marker(&annotations) => {
                self.warn(format!(
                    "{} is marked as overriding, but no superclass declares it",
                    method
                ));
            }
            None => (),
        }

        Ok(phase)
    }

    fn has_override_marker(&self, annotations: &[Annotation]) -> bool {
        annotations
            .iter()
            .any(|annotation| annotation.type_name == self.settings.override_annotation)
    }

    /// Find the nearest method in the superclasses that this method overrides
    ///
    /// Overriding is by name and parameter types. When a superclass has more than one candidate
    /// (covariant returns produce bridge methods), the one whose return type is a supertype of
    /// the others wins, falling back to the first declared.
    pub fn find_overridden<'s>(
        &'s self,
        class: &'s ClassFile,
        method: &Method,
    ) -> Result<Option<(&'s ClassFile, &'s Method)>, Error> {
        if !method.is_virtual() {
            return Ok(None);
        }

        for super_class in self.classes.superclasses(class)? {
            let candidates: Vec<&Method> = super_class
                .methods
                .iter()
                .filter(|candidate| candidate.is_virtual() && candidate.has_same_signature(method))
                .collect();
            if let Some(first) = candidates.first() {
                let chosen = self.most_general_return(&candidates)?.unwrap_or(*first);
                return Ok(Some((super_class, chosen)));
            }
        }

        Ok(None)
    }

    /// Among methods with the same signature, find the one whose return type is a supertype of
    /// all the others
    fn most_general_return<'m>(
        &self,
        candidates: &[&'m Method],
    ) -> Result<Option<&'m Method>, Error> {
        if candidates.len() < 2 {
            return Ok(candidates.first().copied());
        }
        'candidates: for candidate in candidates {
            for other in candidates {
                let returns = (
                    &other.descriptor.return_type,
                    &candidate.descriptor.return_type,
                );
                let assignable = match returns {
                    (None, None) => true,
                    (Some(other_return), Some(candidate_return)) => {
                        self.classes.is_assignable(other_return, candidate_return)?
                    }
                    _ => false,
                };
                if !assignable {
                    continue 'candidates;
                }
            }
            return Ok(Some(*candidate));
        }
        Ok(None)
    }

    /// Methods in the artifact called from the body of a method
    ///
    /// This only finds anything when call edges are being checked. Calls to library classes and
    /// to methods that can't be found in the artifact are skipped.
    pub fn enumerate_references<'s>(
        &'s self,
        class: &ClassFile,
        method: &Method,
    ) -> Result<Vec<(&'s ClassFile, &'s Method)>, Error> {
        if !self.settings.check_call_edges {
            return Ok(vec![]);
        }
        let code = match &method.code {
            Some(code) => code,
            None => return Ok(vec![]),
        };

        let references = code
            .method_references(&class.constants)
            .map_err(|err| Error::ClassFormat(class.this_class.clone(), err))?;

        let mut callees = vec![];
        for reference in references.iter() {
            let referenced_class = match self.classes.load_optional(&reference.class)? {
                Some(referenced_class) => referenced_class,
                None => {
                    log::debug!(
                        "Skipping call from {} to outside class '{}'",
                        method,
                        reference.class
                    );
                    continue;
                }
            };

            // Resolve like the JVM does: the named class, then its superclasses
            let mut resolved = None;
            let superclasses = self.classes.superclasses(referenced_class)?;
            for candidate_class in std::iter::once(referenced_class).chain(superclasses) {
                let found = candidate_class.methods.iter().find(|candidate| {
                    candidate.name == reference.name && candidate.descriptor == reference.descriptor
                });
                if let Some(callee) = found {
                    resolved = Some((candidate_class, callee));
                    break;
                }
            }

            match resolved {
                Some(callee) => callees.push(callee),
                None => log::debug!(
                    "Could not resolve call from {} to {}.{}",
                    method,
                    reference.class,
                    reference.name
                ),
            }
        }

        Ok(callees)
    }
}
