//! Module sources read from disk.

use std::path::{Path, PathBuf};

use quill_eval::ModuleLoader;
use tracing::debug;

/// Extension of Quill source files.
pub const SOURCE_EXTENSION: &str = "ql";

/// Resolves `import name;` to `<root>/name.ql`.
#[derive(Clone, Debug)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsLoader { root: root.into() }
    }

    /// A loader rooted at the directory containing `file`.
    pub fn beside(file: &Path) -> Self {
        let root = file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        FsLoader::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where module `name` would be read from.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name).with_extension(SOURCE_EXTENSION)
    }
}

impl ModuleLoader for FsLoader {
    fn source(&self, name: &str) -> Option<String> {
        let path = self.path_of(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(path = %path.display(), %err, "module source unavailable");
                None
            }
        }
    }
}

/// Module name for a source file: its file stem.
pub fn module_name(file: &Path) -> Option<String> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
}
