use std::borrow::Cow;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// Names of methods and fields
///
/// See <https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces, in dotted form (eg. `java.lang.Object`)
///
/// Class files store these with `/` as the package separator (the "internal form"). Every name
/// read out of a class file is converted on the way in, so the rest of the crate only ever sees
/// the dotted form.
///
/// See <https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ClassName(Cow<'static, str>);

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extact the raw underlying string data
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extact the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.contains(&['.', ';', '[', '/'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.is_empty() {
            Err(String::from("Unqualified name is empty"))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(UnqualifiedName(Cow::Owned(name)))
    }
}

impl Name for ClassName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(String::from("Class name is empty"))
        } else if name.contains('/') {
            Err(format!("Class name '{}' is not in dotted form", name))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        Self::check_valid(&name)?;
        Ok(ClassName(Cow::Owned(name)))
    }
}

impl ClassName {
    pub const OBJECT: Self = Self::name("java.lang.Object");
    pub const CLONEABLE: Self = Self::name("java.lang.Cloneable");
    pub const SERIALIZABLE: Self = Self::name("java.io.Serializable");
    pub const OVERRIDE: Self = Self::name("java.lang.Override");

    const fn name(name: &'static str) -> Self {
        ClassName(Cow::Borrowed(name))
    }

    /// Convert a name in internal form (`java/lang/Object`) into a dotted class name
    ///
    /// A dot in the internal form is rejected rather than silently accepted, since after the
    /// conversion it would be indistinguishable from a package separator.
    pub fn from_internal(internal: &str) -> Result<ClassName, String> {
        if internal.contains('.') {
            return Err(format!(
                "Class name '{}' contains a '.' in internal form",
                internal
            ));
        }
        ClassName::from_string(internal.replace('/', "."))
    }

    /// Name in internal form (`java/lang/Object`)
    pub fn to_internal(&self) -> String {
        self.as_str().replace('.', "/")
    }

    /// Does this class live in the package (or a sub-package of the package) with this prefix?
    ///
    /// The prefix is expected to end in a `.` (eg. `java.`).
    pub fn has_package_prefix(&self, prefix: &str) -> bool {
        self.as_str().starts_with(prefix)
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Debug for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Display for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl UnqualifiedName {
    pub const INIT: Self = UnqualifiedName(Cow::Borrowed("<init>"));
    pub const CLINIT: Self = UnqualifiedName(Cow::Borrowed("<clinit>"));

    /// Is this the name of an instance or class initializer?
    pub fn is_initializer(&self) -> bool {
        self == &Self::INIT || self == &Self::CLINIT
    }
}
