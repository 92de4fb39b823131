use super::{Error, PhaseTag};
use crate::jvm::{ClassName, Name};

pub struct Settings {
    /// Annotation marking methods that run in the setup phase
    pub setup_annotation: ClassName,

    /// Annotation marking methods that run in the flow phase
    pub flow_annotation: ClassName,

    /// Annotation marking methods exempt from phase checking
    pub ignored_annotation: ClassName,

    /// Annotation marking a method as intended to override something
    ///
    /// If this is found on a method that overrides nothing in its superclasses, a warning is
    /// reported. The default, `java.lang.Override`, is retained only in source, so compilers
    /// never write it to class files: the check only fires for a marker with class or runtime
    /// retention (see `--override-annotation`).
    pub override_annotation: ClassName,

    /// Package prefixes (eg. `java.`) of classes outside the artifact
    ///
    /// These classes are never loaded. In particular, walking up superclasses stops at the first
    /// one of these.
    pub library_prefixes: Vec<String>,

    /// Check phases across method calls, not just across overrides
    ///
    /// When enabled, `invoke*` instructions in reachable code are resolved to methods in the
    /// artifact and the phase of the callee must match that of the caller.
    pub check_call_edges: bool,
}

impl Settings {
    pub const DEFAULT_ANNOTATION_PACKAGE: &'static str = "ccre.verifier";

    pub fn new() -> Result<Settings, Error> {
        let mut settings = Settings {
            setup_annotation: ClassName::OBJECT,
            flow_annotation: ClassName::OBJECT,
            ignored_annotation: ClassName::OBJECT,
            override_annotation: ClassName::OVERRIDE,
            library_prefixes: ["java.", "javax.", "jdk.", "sun."]
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            check_call_edges: false,
        };
        settings.set_annotation_package(Self::DEFAULT_ANNOTATION_PACKAGE)?;
        Ok(settings)
    }

    /// Use the phase annotations `SetupPhase`, `FlowPhase`, and `IgnoredPhase` from a package
    pub fn with_annotation_package(mut self, package: &str) -> Result<Settings, Error> {
        self.set_annotation_package(package)?;
        Ok(self)
    }

    fn set_annotation_package(&mut self, package: &str) -> Result<(), Error> {
        fn make_name(package: &str, tag: PhaseTag) -> Result<ClassName, Error> {
            let name = if package.is_empty() {
                tag.annotation_simple_name().to_owned()
            } else {
                format!("{}.{}", package, tag.annotation_simple_name())
            };
            ClassName::from_string(name).map_err(Error::MalformedName)
        }

        self.setup_annotation = make_name(package, PhaseTag::Setup)?;
        self.flow_annotation = make_name(package, PhaseTag::Flow)?;
        self.ignored_annotation = make_name(package, PhaseTag::Ignored)?;
        Ok(())
    }

    /// Annotation type marking a phase
    pub fn phase_annotation(&self, tag: PhaseTag) -> &ClassName {
        match tag {
            PhaseTag::Setup => &self.setup_annotation,
            PhaseTag::Flow => &self.flow_annotation,
            PhaseTag::Ignored => &self.ignored_annotation,
        }
    }

    /// Phase marked by an annotation type, if it is a phase annotation
    pub fn phase_of(&self, annotation: &ClassName) -> Option<PhaseTag> {
        PhaseTag::ALL
            .iter()
            .copied()
            .find(|tag| self.phase_annotation(*tag) == annotation)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_annotations() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.setup_annotation.as_str(), "ccre.verifier.SetupPhase");
        assert_eq!(settings.flow_annotation.as_str(), "ccre.verifier.FlowPhase");
        assert_eq!(settings.ignored_annotation.as_str(), "ccre.verifier.IgnoredPhase");
        assert_eq!(settings.override_annotation, ClassName::OVERRIDE);
        assert!(!settings.check_call_edges);

        let flow = ClassName::from_string(String::from("ccre.verifier.FlowPhase")).unwrap();
        assert_eq!(settings.phase_of(&flow), Some(PhaseTag::Flow));
        assert_eq!(settings.phase_of(&ClassName::OVERRIDE), None);
    }

    #[test]
    fn custom_package() {
        let settings = Settings::new()
            .unwrap()
            .with_annotation_package("org.example.phases")
            .unwrap();
        assert_eq!(
            settings.phase_annotation(PhaseTag::Ignored).as_str(),
            "org.example.phases.IgnoredPhase"
        );

        assert!(matches!(
            Settings::new().unwrap().with_annotation_package("org/example"),
            Err(Error::MalformedName(_))
        ));
    }
}
