use jphase::jvm::class_file::ByteCursor;
use jphase::jvm::{ClassName, Name};
use jphase::phase::{Artifact, Error};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Artifact backed by a directory of class files, laid out by package (eg. the output directory
/// of `javac -d`)
pub struct DirectoryArtifact {
    root: PathBuf,

    /// Restrict verification to these classes (instead of every class file in the directory)
    class_list: Option<Vec<ClassName>>,
}

impl DirectoryArtifact {
    pub fn new(root: impl Into<PathBuf>) -> DirectoryArtifact {
        DirectoryArtifact {
            root: root.into(),
            class_list: None,
        }
    }

    /// Only verify the classes named in a file, one per line
    ///
    /// Blank lines and lines starting with `#` are skipped. Names can be dotted or in internal
    /// form.
    pub fn with_class_list(mut self, path: &Path) -> Result<DirectoryArtifact, Error> {
        let bytes = fs::read(path)?;
        let mut reader = ByteCursor::new(&bytes);
        let mut class_list = vec![];
        let mut line_number = 0;
        loop {
            line_number += 1;
            let line = match reader.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    return Err(Error::MalformedName(format!(
                        "{}:{}: {:?}",
                        path.display(),
                        line_number,
                        err
                    )))
                }
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let class_name = if line.contains('/') {
                ClassName::from_internal(line)
            } else {
                ClassName::from_string(line.to_owned())
            };
            class_list.push(class_name.map_err(Error::MalformedName)?);
        }
        log::debug!("Read {} class names from {:?}", class_list.len(), path);
        self.class_list = Some(class_list);
        Ok(self)
    }

    fn class_file_path(&self, name: &ClassName) -> PathBuf {
        self.root.join(format!("{}.class", name.to_internal()))
    }

    /// Find every class file under the root directory
    fn walk_class_names(&self) -> Result<Vec<ClassName>, Error> {
        let mut class_names = vec![];
        for entry in WalkDir::new(&self.root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "class") {
                continue;
            }

            let relative = match path.strip_prefix(&self.root) {
                Ok(relative) => relative.with_extension(""),
                Err(_) => continue,
            };
            let parts: Vec<String> = relative
                .components()
                .map(|part| part.as_os_str().to_string_lossy().into_owned())
                .collect();
            let dotted = parts.join(".");

            // Module and package descriptors are not classes in the usual sense
            if dotted.ends_with("module-info") || dotted.ends_with("package-info") {
                continue;
            }

            match ClassName::from_string(dotted) {
                Ok(class_name) => class_names.push(class_name),
                Err(msg) => log::warn!("Skipping {:?}: {}", path, msg),
            }
        }
        Ok(class_names)
    }
}

impl Artifact for DirectoryArtifact {
    fn load_class_file(&self, name: &ClassName) -> Result<Vec<u8>, Error> {
        let path = self.class_file_path(name);
        if !path.is_file() {
            return Err(Error::MissingClass(name.clone()));
        }
        log::debug!("Reading {:?}", path);
        Ok(fs::read(&path)?)
    }

    fn class_names(&self) -> Result<Box<dyn Iterator<Item = ClassName> + '_>, Error> {
        let class_names = match &self.class_list {
            Some(class_list) => class_list.clone(),
            None => self.walk_class_names()?,
        };
        Ok(Box::new(class_names.into_iter()))
    }
}
