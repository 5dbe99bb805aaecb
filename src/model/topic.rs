use std::path::PathBuf;

/// A top-level directory under the workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    /// Directory the topic lives in (the workspace root)
    pub base_path: PathBuf,
}

impl Topic {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Topic {
            name: name.into(),
            base_path: base_path.into(),
        }
    }

    /// Absolute directory of this topic: `base_path/name`
    pub fn path(&self) -> PathBuf {
        self.base_path.join(&self.name)
    }

    /// The same topic under a different name, rooted at the same base path.
    pub fn renamed(&self, name: &str) -> Topic {
        Topic::new(name, &self.base_path)
    }
}
