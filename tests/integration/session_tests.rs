//! End-to-end triage sessions with the built-in extractor and embedder.

use photosift::scanner::{ScanCriterion, ScanKind};
use photosift::session::{SessionError, TriageSession};
use std::fs;
use tempfile::TempDir;

use crate::common::{anti_gradient_png, broken_image, flat_png, gradient_png, sharp_png};

const BLUR: ScanCriterion = ScanCriterion::Blur { threshold: 100.0 };
const DARK: ScanCriterion = ScanCriterion::Brightness { threshold: 40.0 };

#[test]
fn test_scan_trash_and_prune() {
    let dir = TempDir::new().unwrap();
    let sharp = sharp_png(dir.path(), "sharp.png");
    let dark = flat_png(dir.path(), "dark.png", [10, 10, 10], 32, 32);
    let bright = flat_png(dir.path(), "bright.png", [200, 200, 200], 32, 32);

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());

    let blur = session.run_scan(BLUR).unwrap();
    assert_eq!(blur.total_processed, 3);
    assert_eq!(blur.total_flagged, 2);
    assert!(!blur.flagged_paths().contains(&sharp));

    let dark_result = session.run_scan(DARK).unwrap();
    assert_eq!(dark_result.flagged_paths(), vec![dark.clone()]);

    let selection = session.result(ScanKind::Brightness).unwrap().flagged_paths();
    let outcome = session.apply_trash(&selection).unwrap();
    assert_eq!(outcome.moved_count, 1);
    assert!(!dark.exists());
    assert!(dir.path().join("Trash/dark.png").exists());

    // Both cached results forget the moved file.
    let blur = session.result(ScanKind::Blur).unwrap();
    assert_eq!(blur.flagged_paths(), vec![bright.clone()]);
    assert_eq!(blur.total_processed, 2);
    let dark_result = session.result(ScanKind::Brightness).unwrap();
    assert_eq!(dark_result.total_flagged, 0);
    assert_eq!(session.trashed_count(), 1);

    // A rescan does not see the trash directory.
    let rescan = session.run_scan(BLUR).unwrap();
    assert_eq!(rescan.total_found, 2);
}

#[test]
fn test_duplicates_then_trash_then_regroup() {
    let dir = TempDir::new().unwrap();
    let a = gradient_png(dir.path(), "a.png", 64, 0);
    let b = gradient_png(dir.path(), "b.png", 128, 0);
    anti_gradient_png(dir.path(), "c.png", 64);

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());

    let grouping = session.find_duplicates(0.95).unwrap();
    assert_eq!(grouping.groups.len(), 1);
    let duplicates = grouping.duplicate_paths();
    assert_eq!(duplicates, vec![b.clone()]);
    assert_eq!(session.embeddings().len(), 3);

    // Cached regroup at a looser threshold keeps the same pair.
    let looser = session.regroup(0.9).unwrap();
    assert_eq!(looser.groups[0].members, vec![a.clone(), b.clone()]);

    session.apply_trash(&duplicates).unwrap();
    let grouping = session.grouping().unwrap();
    assert!(grouping.groups.is_empty());
    assert!(matches!(session.regroup(0.95), Err(SessionError::NoEmbeddings)));

    // A fresh duplicate scan re-embeds what is left.
    let grouping = session.find_duplicates(0.95).unwrap();
    assert!(grouping.groups.is_empty());
    assert_eq!(session.embeddings().len(), 2);
}

#[test]
fn test_duplicates_in_empty_folder() {
    let dir = TempDir::new().unwrap();
    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());

    let grouping = session.find_duplicates(0.95).unwrap();
    assert!(grouping.groups.is_empty());
    assert_eq!(grouping.duplicate_count(), 0);
    assert!(session.embeddings().is_empty());
    assert!(session.regroup(0.8).unwrap().groups.is_empty());
}

#[test]
fn test_duplicates_when_every_image_is_unreadable() {
    let dir = TempDir::new().unwrap();
    broken_image(dir.path(), "a.jpg");
    broken_image(dir.path(), "b.jpg");

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());

    let grouping = session.find_duplicates(0.95).unwrap();
    assert!(grouping.groups.is_empty());
    assert!(session.embeddings().is_empty());
}

#[test]
fn test_restore_invalidates_and_returns_files() {
    let dir = TempDir::new().unwrap();
    let dark = flat_png(dir.path(), "dark.png", [5, 5, 5], 16, 16);
    sharp_png(dir.path(), "sharp.png");

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());
    let flagged = session.run_scan(DARK).unwrap().flagged_paths();
    session.apply_trash(&flagged).unwrap();
    assert!(!dark.exists());

    let outcome = session.restore(&["dark.png".to_string()]).unwrap();
    assert_eq!(outcome.moved_count, 1);
    assert!(dark.exists());
    assert!(session.result(ScanKind::Brightness).is_none());
    assert_eq!(session.trashed_count(), 0);

    let again = session.run_scan(DARK).unwrap();
    assert_eq!(again.flagged_paths(), vec![dark]);
}

#[test]
fn test_failed_restore_keeps_results() {
    let dir = TempDir::new().unwrap();
    sharp_png(dir.path(), "sharp.png");

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());
    session.run_scan(BLUR).unwrap();

    let outcome = session.restore(&["nothing.png".to_string()]).unwrap();
    assert_eq!(outcome.moved_count, 0);
    assert_eq!(outcome.failed, vec!["nothing.png".to_string()]);
    assert!(session.result(ScanKind::Blur).is_some());
}

#[test]
fn test_scan_replaces_previous_result_of_same_kind() {
    let dir = TempDir::new().unwrap();
    flat_png(dir.path(), "a.png", [100, 100, 100], 16, 16);

    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path());
    assert_eq!(session.run_scan(DARK).unwrap().total_flagged, 0);

    let stricter = ScanCriterion::Brightness { threshold: 150.0 };
    assert_eq!(session.run_scan(stricter).unwrap().total_flagged, 1);
    assert_eq!(session.result(ScanKind::Brightness).unwrap().total_flagged, 1);
    assert!(session.result(ScanKind::Blur).is_none());
}

#[test]
fn test_scan_of_missing_folder() {
    let dir = TempDir::new().unwrap();
    let mut session = TriageSession::with_defaults();
    session.set_folder(dir.path().join("missing"));

    assert!(matches!(session.run_scan(BLUR), Err(SessionError::Scan(_))));
    assert!(matches!(
        session.find_duplicates(0.95),
        Err(SessionError::Scan(_))
    ));
}

#[test]
fn test_trash_without_folder() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.png");
    fs::write(&file, b"x").unwrap();

    let mut session = TriageSession::with_defaults();
    assert!(matches!(
        session.apply_trash(&[file.clone()]),
        Err(SessionError::NoFolder)
    ));
    assert!(file.exists());
}
