//! Duplicate grouping with the built-in thumbnail embedder on real files.

use photosift::duplicates::{
    DuplicateGrouper, EmbeddingBackend, GroupError, GrouperConfig, ModelError, ModelHandle,
    ModelState,
};
use photosift::scanner::WalkerConfig;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::{anti_gradient_png, broken_image, gradient_png, sharp_png};

fn grouper(config: GrouperConfig) -> DuplicateGrouper {
    DuplicateGrouper::new(Arc::new(ModelHandle::thumbnail()), config)
}

#[test]
fn test_resized_copy_groups_with_original() {
    let dir = TempDir::new().unwrap();
    let a = gradient_png(dir.path(), "a.png", 64, 0);
    let b = gradient_png(dir.path(), "b.png", 128, 0);
    anti_gradient_png(dir.path(), "c.png", 64);

    let (store, grouping) = grouper(GrouperConfig::default()).scan(dir.path()).unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(grouping.groups.len(), 1);
    let group = &grouping.groups[0];
    assert_eq!(group.members, vec![a.clone(), b.clone()]);
    assert_eq!(group.original(), Some(a.as_path()));
    assert_eq!(grouping.duplicate_paths(), vec![b.clone()]);
    assert_eq!(grouping.score(&a), Some(1.0));
    assert!(grouping.score(&b).unwrap() >= 0.95);
}

#[test]
fn test_distinct_images_are_not_grouped() {
    let dir = TempDir::new().unwrap();
    gradient_png(dir.path(), "a.png", 64, 0);
    anti_gradient_png(dir.path(), "b.png", 64);
    sharp_png(dir.path(), "c.png");

    let (_, grouping) = grouper(GrouperConfig::default()).scan(dir.path()).unwrap();
    assert!(grouping.groups.is_empty());
    assert_eq!(grouping.duplicate_count(), 0);
}

#[test]
fn test_brightness_shift_is_near_duplicate() {
    let dir = TempDir::new().unwrap();
    gradient_png(dir.path(), "a.png", 64, 0);
    gradient_png(dir.path(), "b.png", 64, 20);

    let (_, grouping) = grouper(GrouperConfig::default().with_threshold(0.9))
        .scan(dir.path())
        .unwrap();
    assert_eq!(grouping.groups.len(), 1);
    assert_eq!(grouping.groups[0].len(), 2);
}

#[test]
fn test_unreadable_image_left_out() {
    let dir = TempDir::new().unwrap();
    gradient_png(dir.path(), "a.png", 64, 0);
    gradient_png(dir.path(), "b.png", 64, 0);
    let broken = broken_image(dir.path(), "broken.png");

    let (store, grouping) = grouper(GrouperConfig::default()).scan(dir.path()).unwrap();
    assert_eq!(store.len(), 2);
    assert!(!store.contains(&broken));
    assert_eq!(grouping.groups.len(), 1);
    assert!(grouping.groups.iter().all(|g| !g.contains(&broken)));
}

#[test]
fn test_regroup_uses_cached_vectors_only() {
    let dir = TempDir::new().unwrap();
    let a = gradient_png(dir.path(), "a.png", 64, 0);
    let b = gradient_png(dir.path(), "b.png", 96, 0);
    let c = anti_gradient_png(dir.path(), "c.png", 64);
    let files = vec![a.clone(), b.clone(), c.clone()];

    let grouper = grouper(GrouperConfig::default());
    let store = grouper.embed_batch(&files).unwrap();

    // Regrouping must not touch the files.
    for f in &files {
        fs::remove_file(f).unwrap();
    }

    let strict = grouper.group(0.95, &store, &files);
    assert_eq!(strict.groups.len(), 1);
    assert_eq!(strict.groups[0].members, vec![a.clone(), b.clone()]);
    assert!((strict.threshold - 0.95).abs() < f32::EPSILON);

    let again = grouper.group(0.95, &store, &files);
    assert_eq!(again.groups, strict.groups);
}

#[test]
fn test_group_skips_paths_without_vectors() {
    let dir = TempDir::new().unwrap();
    let a = gradient_png(dir.path(), "a.png", 64, 0);
    let b = gradient_png(dir.path(), "b.png", 64, 0);
    let grouper = grouper(GrouperConfig::default());
    let store = grouper.embed_batch(&[a.clone()]).unwrap();

    let grouping = grouper.group(0.95, &store, &[a, b]);
    assert!(grouping.groups.is_empty());
}

#[test]
fn test_small_batches_give_same_groups() {
    let dir = TempDir::new().unwrap();
    for (i, size) in [48u32, 64, 80, 96, 112].iter().enumerate() {
        gradient_png(dir.path(), &format!("g{i}.png"), *size, 0);
    }
    anti_gradient_png(dir.path(), "z.png", 64);

    let (_, one) = grouper(GrouperConfig::default().with_batch_size(1).with_max_workers(3))
        .scan(dir.path())
        .unwrap();
    let (_, many) = grouper(GrouperConfig::default().with_batch_size(64))
        .scan(dir.path())
        .unwrap();

    assert_eq!(one.groups, many.groups);
    assert_eq!(one.groups.len(), 1);
    assert_eq!(one.groups[0].len(), 5);
}

#[test]
fn test_extension_override_limits_candidates() {
    let dir = TempDir::new().unwrap();
    gradient_png(dir.path(), "a.png", 64, 0);
    gradient_png(dir.path(), "b.png", 64, 0);

    let walker = WalkerConfig::default().with_extensions(["jpg"]);
    let (store, grouping) = grouper(GrouperConfig::default().with_walker_config(walker))
        .scan(dir.path())
        .unwrap();
    assert!(store.is_empty());
    assert!(grouping.groups.is_empty());
}

#[test]
fn test_model_failure_is_sticky() {
    let dir = TempDir::new().unwrap();
    gradient_png(dir.path(), "a.png", 64, 0);

    let model = Arc::new(ModelHandle::new(|| {
        Err(ModelError::LoadFailed("weights missing".to_string()))
    }));
    let grouper = DuplicateGrouper::new(Arc::clone(&model), GrouperConfig::default());

    let first = grouper.scan(dir.path());
    assert!(matches!(first, Err(GroupError::Model(ModelError::LoadFailed(_)))));
    assert_eq!(model.state(), ModelState::Failed);

    let second = grouper.scan(dir.path());
    assert!(matches!(second, Err(GroupError::Model(_))));
}

#[test]
fn test_missing_folder_is_scan_error() {
    let dir = TempDir::new().unwrap();
    let result = grouper(GrouperConfig::default()).scan(&dir.path().join("nope"));
    assert!(matches!(result, Err(GroupError::Scan(_))));
}

#[test]
fn test_thumbnail_dimension() {
    let model = ModelHandle::thumbnail();
    let backend = model.get().unwrap();
    assert_eq!(backend.dimension(), 16 * 16 + 1);
}
