//! Path helpers shared by the walker, the grouper and the trash manager.
//!
//! Covers three concerns:
//!
//! - NFC keys, so a file reachable under two Unicode spellings (macOS NFD
//!   vs. NFC) is scored exactly once
//! - Filters: supported-extension test and reserved trash-component test
//! - Collision-free destination names (`name_1.ext`, `name_2.ext`, ...)
//!
//! # Example
//!
//! ```
//! use photosift::scanner::path_utils::{has_component, numbered_name, path_key};
//! use std::path::Path;
//!
//! assert_eq!(path_key(Path::new("cafe\u{0301}.jpg")), path_key(Path::new("café.jpg")));
//! assert!(has_component(Path::new("/photos/Trash/a.jpg"), "Trash"));
//! assert_eq!(numbered_name("photo.jpg", 2), "photo_2.jpg");
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
#[must_use]
pub fn normalize_path_str(s: &str) -> String {
    s.nfc().collect()
}

/// Create a normalized comparison key for a path.
///
/// Suitable for HashSet keys where Unicode normalization differences
/// must not create two entries for one file.
#[must_use]
pub fn path_key(path: &Path) -> String {
    normalize_path_str(&path.to_string_lossy())
}

/// Check whether any component of `path` is literally `name`.
#[must_use]
pub fn has_component(path: &Path, name: &str) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(part) if part == OsStr::new(name)))
}

/// Lowercased extension of `path`, if any.
#[must_use]
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase)
}

/// Check whether `path` has one of `extensions` (lowercase, no dot).
#[must_use]
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    extension_lowercase(path).is_some_and(|ext| extensions.iter().any(|e| *e == ext))
}

/// Display-friendly file name of `path` (lossy).
#[must_use]
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Insert `_n` before the extension of `file_name`.
///
/// `n == 0` returns the name unchanged. Names without an extension get the
/// suffix appended; a leading dot (hidden file) is not treated as an
/// extension separator. Works on raw OS strings, so names that are not
/// valid UTF-8 keep their bytes.
#[must_use]
pub fn numbered_name(file_name: impl AsRef<OsStr>, n: usize) -> OsString {
    let file_name = file_name.as_ref();
    if n == 0 {
        return file_name.to_os_string();
    }
    let path = Path::new(file_name);
    let (Some(stem), Some(ext)) = (path.file_stem(), path.extension()) else {
        let mut name = file_name.to_os_string();
        name.push(format!("_{n}"));
        return name;
    };
    let mut name = stem.to_os_string();
    name.push(format!("_{n}."));
    name.push(ext);
    name
}

/// First path in `dir` named `file_name` or `numbered_name(file_name, n)`
/// that does not exist yet.
#[must_use]
pub fn free_destination(dir: &Path, file_name: impl AsRef<OsStr>) -> PathBuf {
    let file_name = file_name.as_ref();
    let mut n = 0;
    loop {
        let candidate = dir.join(numbered_name(file_name, n));
        // symlink_metadata so a dangling link still counts as taken
        if std::fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        n += 1;
    }
}
