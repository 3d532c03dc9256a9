use photosift::actions::TrashManager;
use photosift::scanner::{Walker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use unicode_normalization::UnicodeNormalization;

fn touch(dir: &Path, rel: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, b"pixels").unwrap();
    path
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    Walker::new(dir, WalkerConfig::default())
        .collect_files()
        .unwrap()
}

#[test]
fn test_paths_with_quotes_and_spaces() {
    let dir = tempdir().unwrap();

    // Windows does not allow double quotes in filenames.
    if cfg!(not(windows)) {
        let quoted = touch(dir.path(), "holiday \"best\" shot.jpg");
        let spaced = touch(dir.path(), "my photos/beach day.png");

        let files = walk(dir.path());
        assert_eq!(files.len(), 2);
        assert!(files.contains(&quoted));
        assert!(files.contains(&spaced));

        let result = TrashManager::default()
            .move_to_trash(&[quoted], dir.path())
            .unwrap();
        assert_eq!(result.moved_count, 1);
        assert!(dir.path().join("Trash/holiday \"best\" shot.jpg").exists());
    }
}

#[test]
fn test_paths_with_newlines() {
    let dir = tempdir().unwrap();

    // Windows does not allow newlines in filenames.
    if cfg!(not(windows)) {
        let odd = touch(dir.path(), "line\nbreak.jpg");
        let files = walk(dir.path());
        assert_eq!(files, vec![odd]);
    }
}

#[test]
fn test_unicode_names() {
    let dir = tempdir().unwrap();
    let names = ["café.jpg", "日本の写真.png", "фото.webp", "🌅.jpeg"];
    for name in names {
        touch(dir.path(), name);
    }

    let files = walk(dir.path());
    assert_eq!(files.len(), names.len());

    let manager = TrashManager::default();
    let result = manager.move_to_trash(&files, dir.path()).unwrap();
    assert_eq!(result.moved_count, names.len());

    let restored: Vec<String> = names.iter().map(|n| (*n).to_string()).collect();
    let back = manager.restore(&restored, dir.path()).unwrap();
    assert_eq!(back.moved_count, names.len());
    for name in names {
        assert!(dir.path().join(name).exists(), "{name} not restored");
    }
}

#[test]
fn test_decomposed_unicode_name_is_found() {
    let dir = tempdir().unwrap();
    let decomposed: String = "résumé.png".nfd().collect();
    touch(dir.path(), &decomposed);

    let files = walk(dir.path());
    assert_eq!(files.len(), 1);
    let found = files[0].file_name().unwrap().to_string_lossy();
    let found_nfc: String = found.nfc().collect();
    assert_eq!(found_nfc, "résumé.png");
}

#[test]
fn test_trash_lookalikes_are_scanned() {
    let dir = tempdir().unwrap();
    let kept = [
        touch(dir.path(), "Trashcan/a.jpg"),
        touch(dir.path(), "old_Trash/b.jpg"),
        touch(dir.path(), "Trash.jpg"),
    ];
    touch(dir.path(), "Trash/d.jpg");
    touch(dir.path(), "x/y/Trash/z/e.jpg");

    let files = walk(dir.path());
    assert_eq!(files.len(), kept.len());
    for path in &kept {
        assert!(files.contains(path), "{} missing", path.display());
    }
}

#[test]
fn test_non_image_lookalikes_are_skipped() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.png.bak");
    touch(dir.path(), "jpg");
    touch(dir.path(), ".png");
    touch(dir.path(), "noext");
    fs::create_dir_all(dir.path().join("folder.jpg")).unwrap();
    let real = touch(dir.path(), "folder.jpg/inner.JPEG");

    assert_eq!(walk(dir.path()), vec![real]);
}

#[test]
fn test_deep_nesting() {
    let dir = tempdir().unwrap();
    let rel: String = (0..30).map(|i| format!("d{i}/")).collect::<String>() + "deep.png";
    let deep = touch(dir.path(), &rel);

    assert_eq!(walk(dir.path()), vec![deep]);
}

#[cfg(unix)]
#[test]
fn test_broken_symlink_is_ignored() {
    let dir = tempdir().unwrap();
    let real = touch(dir.path(), "real.jpg");
    std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("link.jpg")).unwrap();

    let files = Walker::new(dir.path(), WalkerConfig::default())
        .collect_files()
        .unwrap();
    assert_eq!(files, vec![real]);
}

#[test]
fn test_root_inside_trash_finds_nothing() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("Trash/album");
    touch(&root, "a.jpg");

    // Every path under the root carries the trash component.
    assert!(walk(&root).is_empty());
}
