use std::fmt::{Display, Error as FmtError, Formatter};

/// Lifecycle phase a method is allowed to run in
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PhaseTag {
    /// Runs while the system is being wired up
    Setup,

    /// Runs once the system is live, in response to events
    Flow,

    /// Deliberately exempt from phase checking
    Ignored,
}

impl PhaseTag {
    pub const ALL: [PhaseTag; 3] = [PhaseTag::Setup, PhaseTag::Flow, PhaseTag::Ignored];

    /// Simple name of the annotation type for this phase (eg. `SetupPhase`)
    pub fn annotation_simple_name(self) -> &'static str {
        match self {
            PhaseTag::Setup => "SetupPhase",
            PhaseTag::Flow => "FlowPhase",
            PhaseTag::Ignored => "IgnoredPhase",
        }
    }
}

impl Display for PhaseTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        let name = match self {
            PhaseTag::Setup => "setup",
            PhaseTag::Flow => "flow",
            PhaseTag::Ignored => "ignored",
        };
        f.write_str(name)
    }
}
