//! User-code membership: does a function come from the user's source tree?
//!
//! A function is user code when its debug metadata names a source file
//! under the configured root. Functions without debug metadata never are,
//! and without a root nothing is (fail-closed).

use crate::ir::{DebugLocation, Function};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// How a source path is compared against the root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PathMatch {
    /// Whole path components: `/root2/x.c` is not under `/root`
    #[default]
    Components,
    /// Character prefix of the path string: `/root2/x.c` is under `/root`
    StringPrefix,
}

/// Decides whether functions are user-defined
#[derive(Debug, Clone)]
pub struct MembershipClassifier {
    root: Option<PathBuf>,
    mode: PathMatch,
}

impl MembershipClassifier {
    /// Create a classifier for one run
    ///
    /// An empty root counts as no root. Without one every classification
    /// returns false; reporting that is left to the caller.
    pub fn new(root: Option<PathBuf>, mode: PathMatch) -> Self {
        Self {
            root: root
                .filter(|r| !r.as_os_str().is_empty())
                .map(|r| normalize_lexically(&r)),
            mode,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Is this function defined in the user's source tree?
    pub fn is_user_defined(&self, function: &Function) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        let Some(debug) = &function.debug else {
            tracing::debug!("{}: no debug metadata, not user code", function.name);
            return false;
        };

        let source = source_path(debug);
        let inside = match self.mode {
            PathMatch::Components => source.starts_with(root),
            PathMatch::StringPrefix => source
                .to_string_lossy()
                .starts_with(root.to_string_lossy().as_ref()),
        };

        tracing::debug!(
            "{}: source {} {} root {}",
            function.name,
            source.display(),
            if inside { "inside" } else { "outside" },
            root.display()
        );
        inside
    }
}

/// Directory joined with file name; an absolute file name wins
pub fn source_path(debug: &DebugLocation) -> PathBuf {
    normalize_lexically(&Path::new(&debug.directory).join(&debug.filename))
}

/// Resolve `.` and `..` without touching the filesystem
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
