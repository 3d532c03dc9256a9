//! Move-to-trash and restore against a real folder.

use photosift::actions::{TrashError, TrashManager};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &std::path::Path, rel: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_move_creates_trash_dir() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.jpg", b"a");
    let b = write(dir.path(), "b.jpg", b"b");

    let manager = TrashManager::default();
    let result = manager.move_to_trash(&[a.clone(), b.clone()], dir.path()).unwrap();

    assert_eq!(result.moved_count, 2);
    assert!(result.all_succeeded());
    assert!(!a.exists());
    assert!(!b.exists());
    assert_eq!(fs::read(dir.path().join("Trash/a.jpg")).unwrap(), b"a");
    assert_eq!(fs::read(dir.path().join("Trash/b.jpg")).unwrap(), b"b");
    assert_eq!(manager.trashed_count(dir.path()), 2);
    assert_eq!(result.summary(), "2 moved");
}

#[test]
fn test_name_collision_gets_suffix() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Trash/a.jpg", b"older");
    let a = write(dir.path(), "a.jpg", b"newer");

    let result = TrashManager::default()
        .move_to_trash(&[a], dir.path())
        .unwrap();

    assert_eq!(result.moved_count, 1);
    assert_eq!(result.moved[0].destination, dir.path().join("Trash/a_1.jpg"));
    assert_eq!(fs::read(dir.path().join("Trash/a.jpg")).unwrap(), b"older");
    assert_eq!(fs::read(dir.path().join("Trash/a_1.jpg")).unwrap(), b"newer");
}

#[test]
fn test_same_name_from_subfolders() {
    let dir = TempDir::new().unwrap();
    let first = write(dir.path(), "2023/img.png", b"1");
    let second = write(dir.path(), "2024/img.png", b"2");
    let third = write(dir.path(), "img.png", b"3");

    let result = TrashManager::default()
        .move_to_trash(&[first, second, third], dir.path())
        .unwrap();

    assert_eq!(result.moved_count, 3);
    let trash = dir.path().join("Trash");
    assert_eq!(fs::read(trash.join("img.png")).unwrap(), b"1");
    assert_eq!(fs::read(trash.join("img_1.png")).unwrap(), b"2");
    assert_eq!(fs::read(trash.join("img_2.png")).unwrap(), b"3");
}

#[test]
fn test_partial_failure_continues() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.jpg", b"a");
    let missing = dir.path().join("missing.jpg");
    let c = write(dir.path(), "c.jpg", b"c");

    let result = TrashManager::default()
        .move_to_trash(&[a, missing, c], dir.path())
        .unwrap();

    assert_eq!(result.moved_count, 2);
    assert_eq!(result.failed, vec!["missing.jpg".to_string()]);
    assert!(!result.all_succeeded());
    assert_eq!(result.summary(), "2 moved, 1 failed: [missing.jpg]");
}

#[test]
fn test_file_already_in_trash_fails() {
    let dir = TempDir::new().unwrap();
    let trashed = write(dir.path(), "Trash/a.jpg", b"a");

    let result = TrashManager::default()
        .move_to_trash(&[trashed.clone()], dir.path())
        .unwrap();

    assert_eq!(result.moved_count, 0);
    assert_eq!(result.failed, vec!["a.jpg".to_string()]);
    assert!(trashed.exists());
}

#[test]
fn test_empty_selection_is_noop() {
    let dir = TempDir::new().unwrap();
    let result = TrashManager::default()
        .move_to_trash(&[], dir.path())
        .unwrap();
    assert_eq!(result.moved_count, 0);
    assert!(result.failed.is_empty());
}

#[test]
fn test_missing_base_folder_is_error() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("gone");
    let result = TrashManager::default().move_to_trash(&[base.join("a.jpg")], &base);
    assert!(matches!(result, Err(TrashError::NotADirectory(_))));
    assert!(!base.exists());
}

#[test]
fn test_custom_trash_dir_name() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.jpg", b"a");

    let manager = TrashManager::new("Rejects");
    manager.move_to_trash(&[a], dir.path()).unwrap();

    assert!(dir.path().join("Rejects/a.jpg").exists());
    assert!(!dir.path().join("Trash").exists());
    assert_eq!(manager.trash_dir(dir.path()), dir.path().join("Rejects"));
}

#[test]
fn test_restore_round_trip() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "sub/a.jpg", b"a");
    let manager = TrashManager::default();
    manager.move_to_trash(&[a], dir.path()).unwrap();

    let result = manager
        .restore(&["a.jpg".to_string()], dir.path())
        .unwrap();

    assert_eq!(result.moved_count, 1);
    // Restores land in the base folder, not the original subfolder.
    assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"a");
    assert_eq!(manager.trashed_count(dir.path()), 0);
}

#[test]
fn test_restore_does_not_overwrite() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.jpg", b"trashed");
    let manager = TrashManager::default();
    manager.move_to_trash(&[a], dir.path()).unwrap();
    write(dir.path(), "a.jpg", b"replacement");

    let result = manager
        .restore(&["a.jpg".to_string()], dir.path())
        .unwrap();

    assert_eq!(result.moved[0].destination, dir.path().join("a_1.jpg"));
    assert_eq!(fs::read(dir.path().join("a.jpg")).unwrap(), b"replacement");
    assert_eq!(fs::read(dir.path().join("a_1.jpg")).unwrap(), b"trashed");
}

#[test]
fn test_restore_rejects_paths() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "Trash/a.jpg", b"a");
    write(dir.path(), "outside.jpg", b"o");

    let result = TrashManager::default()
        .restore(
            &[
                "../outside.jpg".to_string(),
                "missing.jpg".to_string(),
                "a.jpg".to_string(),
            ],
            dir.path(),
        )
        .unwrap();

    assert_eq!(result.moved_count, 1);
    assert_eq!(
        result.failed,
        vec!["../outside.jpg".to_string(), "missing.jpg".to_string()]
    );
    assert!(dir.path().join("outside.jpg").exists());
}

#[test]
fn test_manager_is_reusable_after_operation() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.jpg", b"a");
    let b = write(dir.path(), "b.jpg", b"b");
    let manager = TrashManager::default();

    manager.move_to_trash(&[a], dir.path()).unwrap();
    assert!(!manager.is_busy());
    manager.move_to_trash(&[b], dir.path()).unwrap();
    assert_eq!(manager.trashed_count(dir.path()), 2);
}
