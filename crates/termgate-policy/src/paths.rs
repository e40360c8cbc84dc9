//! Path authorization — canonicalize, then check containment.
//!
//! The containment check always runs on the canonical (absolute,
//! symlink-resolved, `..`-free) form of the requested path, never on the
//! raw input. A symlink inside an allowed root that resolves outside
//! every root is therefore denied.

use std::path::{Path, PathBuf};

use crate::policy::Policy;

/// What the caller intends to do with the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    List,
    Delete,
}

/// Why a path was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDenyReason {
    /// Empty, `.`, NUL-containing, or unresolvable input.
    InvalidPath(String),
    /// Canonical path is not under any allowed root.
    OutsideRoots,
    /// Write target's extension is not in the allowed set.
    ExtensionNotAllowed(String),
}

impl std::fmt::Display for PathDenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPath(detail) => write!(f, "invalid path: {detail}"),
            Self::OutsideRoots => write!(f, "path is outside the allowed roots"),
            Self::ExtensionNotAllowed(ext) => {
                write!(f, "file extension not permitted for writing: .{ext}")
            }
        }
    }
}

/// Outcome of a path authorization check.
///
/// On `Allowed` the canonical path is carried along; callers must perform
/// the file operation on that path, not on the raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathDecision {
    Allowed { canonical: PathBuf },
    Denied { reason: PathDenyReason },
}

impl PathDecision {
    fn denied(reason: PathDenyReason) -> Self {
        Self::Denied { reason }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Authorize `requested` for `mode` against `policy`.
pub fn authorize_path(policy: &Policy, requested: &str, mode: AccessMode) -> PathDecision {
    if requested.is_empty() || requested == "." {
        return PathDecision::denied(PathDenyReason::InvalidPath(
            "path must be a non-empty absolute path".into(),
        ));
    }
    if requested.contains('\0') {
        return PathDecision::denied(PathDenyReason::InvalidPath(
            "path contains a NUL byte".into(),
        ));
    }

    let canonical = match canonicalize_lenient(Path::new(requested)) {
        Ok(p) => p,
        Err(e) => {
            return PathDecision::denied(PathDenyReason::InvalidPath(e.to_string()));
        }
    };

    if !policy
        .allowed_roots()
        .iter()
        .any(|root| canonical.starts_with(root))
    {
        tracing::debug!(path = %canonical.display(), "path outside allowed roots");
        return PathDecision::denied(PathDenyReason::OutsideRoots);
    }

    if mode == AccessMode::Write {
        let ext = canonical
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();
        if !policy.write_extension_allowed(&ext) {
            return PathDecision::denied(PathDenyReason::ExtensionNotAllowed(ext));
        }
    }

    PathDecision::Allowed { canonical }
}

/// Canonicalize `path`, tolerating a missing tail.
///
/// A Write may create a new file, and a Read/Delete of a missing file
/// must still authorize so the file layer can report it as not found
/// rather than denied. Missing components are rejoined onto their
/// nearest existing ancestor's canonical form. `file_name()` returns
/// `None` for components ending in `..`, so traversal cannot hide in
/// the unresolved tail.
fn canonicalize_lenient(path: &Path) -> std::io::Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let name = path
                .file_name()
                .ok_or_else(|| std::io::Error::new(e.kind(), "path has no file name"))?;
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .ok_or_else(|| std::io::Error::new(e.kind(), "path has no parent directory"))?;
            Ok(canonicalize_lenient(parent)?.join(name))
        }
        Err(e) => Err(e),
    }
}
