//! Path existence queries.

use std::fs;
use std::path::Path;

/// How [`path_exists`] treats a symbolic link in the final component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Follow the link and test its target.
    Deref,
    /// Test the link entry itself, even if its target is missing.
    NoDeref,
}

/// Checks whether `path` exists.
///
/// Fails closed: a trailing separator on something that is not a directory,
/// or a trailing backslash on platforms where it is not a separator, yields
/// `false` instead of an error.
pub fn path_exists(path: impl AsRef<Path>, mode: LinkMode) -> bool {
    let path = path.as_ref();
    let raw = path.as_os_str().to_string_lossy();

    if raw.is_empty() {
        return false;
    }

    if cfg!(not(windows)) && raw.ends_with('\\') {
        log::debug!("Trailing escape in {}, treating as missing", raw);
        return false;
    }

    if raw.ends_with(std::path::is_separator) {
        // Only directories may carry a trailing separator
        return fs::metadata(path).is_ok_and(|m| m.is_dir());
    }

    match mode {
        LinkMode::Deref => fs::metadata(path).is_ok(),
        LinkMode::NoDeref => fs::symlink_metadata(path).is_ok(),
    }
}
