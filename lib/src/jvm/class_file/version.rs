use super::ByteCursor;
use crate::jvm::Error;

/// Version of the class file, which is used to verify that the JVM has the
/// necessary features to interpret the class
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct Version {
    pub minor_version: u16,
    pub major_version: u16,
}

impl Version {
    /// JVM class file version corresponding to Java SE 8 (released March 2014)
    pub const JAVA8: Version = Version {
        minor_version: 0,
        major_version: 52,
    };

    /// The one version that can be read
    ///
    /// There is no attempt at reading older or newer class files: anything else is rejected.
    pub const SUPPORTED: Version = Version::JAVA8;

    /// Read the minor and major version, rejecting anything but the supported version
    pub fn parse(reader: &mut ByteCursor) -> Result<Version, Error> {
        let minor_version = reader.read_u16()?;
        let major_version = reader.read_u16()?;
        let version = Version {
            minor_version,
            major_version,
        };
        if version != Version::SUPPORTED {
            return Err(Error::UnsupportedVersion(version));
        }
        Ok(version)
    }
}
