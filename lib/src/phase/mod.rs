//! Check lifecycle phase annotations across an artifact
//!
//! Methods declare which phase they run in with one of three annotations (see [`PhaseTag`]).
//! Since a call through an overridden method can end up in any override, a method and the
//! method it overrides must agree on their phase. The [`PhaseVerifier`] loads classes from an
//! [`Artifact`] on demand, walks up superclasses to find overridden methods, and reports every
//! inconsistency to a [`WarningSink`].
//!
//! ```no_run
//! use jphase::phase::*;
//!
//! # fn check(artifact: &MemoryArtifact) -> Result<(), Error> {
//! let verifier = PhaseVerifier::new(artifact, Settings::new()?, LogWarnings);
//! let warnings = verifier.verify_all()?;
//! println!("{} warning(s)", warnings);
//! # Ok(())
//! # }
//! ```

mod artifact;
mod class_cache;
mod errors;
mod settings;
mod tag;
mod verifier;
mod warnings;

pub use artifact::*;
pub use class_cache::*;
pub use errors::*;
pub use settings::*;
pub use tag::*;
pub use verifier::*;
pub use warnings::*;
