//! File actions module.
//!
//! The only destructive action is relocation into the per-folder trash
//! directory, which is always reversible:
//!
//! ```no_run
//! use photosift::actions::TrashManager;
//! use std::path::{Path, PathBuf};
//!
//! let manager = TrashManager::default();
//! let moved = manager
//!     .move_to_trash(&[PathBuf::from("/photos/dark.jpg")], Path::new("/photos"))
//!     .unwrap();
//! let names: Vec<String> = moved
//!     .moved
//!     .iter()
//!     .filter_map(|m| m.destination.file_name())
//!     .map(|n| n.to_string_lossy().into_owned())
//!     .collect();
//! manager.restore(&names, Path::new("/photos")).unwrap();
//! ```

pub mod trash;

pub use trash::{TrashError, TrashManager, TrashOperationResult, TrashedFile};
