//! End-to-end tests for the crop-generation pipeline against a filesystem
//! store: full stage sets, the storage naming contract, the reference
//! geometry scenario, and the all-or-nothing failure policy.

mod common;

use garage_crops::config::GenerateConfig;
use garage_crops::pipeline::generate_crops;
use garage_crops::storage::{FsStore, ObjectStore};

use common::{puzzle, stage_dimensions, write_test_image};

#[tokio::test]
async fn generates_all_six_stages_under_the_key_contract() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let image_ref = write_test_image(src_dir.path(), "car.png", 1600, 1200);

    let set = generate_crops(
        &puzzle("2026-08-30", image_ref, "center center", 5.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap();

    assert_eq!(set.stages.len(), 6);
    for (n, stage) in set.stages.iter().enumerate() {
        assert_eq!(stage.stage.index() as usize, n);
        assert_eq!(stage.key, format!("2026-08-30/stage_{n}.jpg"));
        assert!(stage.bytes > 0);
        assert!(out_dir.path().join(&stage.key).is_file());
    }
}

#[tokio::test]
async fn reference_scenario_dimensions() {
    // 1600x1200 source, zoom 5, centered origin: base is 1600x1067, stage 0
    // ships native at 320x213, the reveal always ships at 900x600.
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let image_ref = write_test_image(src_dir.path(), "car.png", 1600, 1200);

    let set = generate_crops(
        &puzzle("ref", image_ref, "center center", 5.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap();

    assert_eq!((set.source.w, set.source.h), (1600, 1200));
    assert_eq!((set.base.w, set.base.h), (1600, 1067));

    assert_eq!(stage_dimensions(out_dir.path(), "ref", 0), (320, 213));
    assert_eq!(stage_dimensions(out_dir.path(), "ref", 5), (900, 600));
}

#[tokio::test]
async fn stages_grow_monotonically_wider() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let image_ref = write_test_image(src_dir.path(), "car.png", 2400, 1600);

    let set = generate_crops(
        &puzzle("mono", image_ref, "30% 70%", 8.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap();

    // Each successive pre-reveal stage reveals at least as much of the base.
    let widths: Vec<u32> = set.stages[..5].iter().map(|s| s.size.w).collect();
    for pair in widths.windows(2) {
        assert!(pair[1] >= pair[0], "stage widths regressed: {widths:?}");
    }
}

#[tokio::test]
async fn small_source_never_upscales() {
    // A 600x400 source: every stage crop is well under 900 wide, so every
    // pre-reveal stage must ship native; only the reveal resizes (up to the
    // delivery target is allowed for stage 5 by contract).
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let image_ref = write_test_image(src_dir.path(), "car.png", 600, 400);

    let set = generate_crops(
        &puzzle("small", image_ref, "center", 4.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap();

    for stage in &set.stages[..5] {
        assert!(
            stage.size.w < 900,
            "pre-reveal stage {} unexpectedly hit delivery width",
            stage.stage
        );
        let on_disk = stage_dimensions(out_dir.path(), "small", stage.stage.index());
        assert_eq!(on_disk, (stage.size.w, stage.size.h));
    }
    assert_eq!(stage_dimensions(out_dir.path(), "small", 5), (900, 600));
}

#[tokio::test]
async fn undecodable_source_fails_without_writing_stages() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let bogus = src_dir.path().join("car.jpg");
    std::fs::write(&bogus, b"this is not an image").unwrap();

    let err = generate_crops(
        &puzzle("broken", bogus.to_str().unwrap().to_string(), "center", 5.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap_err();

    assert_eq!(err.category(), "decode");
    assert!(err.is_fatal_for_puzzle());
    // Nothing may have been persisted for the puzzle.
    assert!(!out_dir.path().join("broken").exists());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_any_work() {
    let out_dir = tempfile::tempdir().unwrap();

    let err = generate_crops(
        &puzzle("badzoom", "/nonexistent.png".to_string(), "center", 0.2),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.category(), "config");

    let err = generate_crops(
        &puzzle("a/b", "/nonexistent.png".to_string(), "center", 5.0),
        &GenerateConfig::default(),
        &FsStore::new(out_dir.path()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.category(), "config");
}

#[tokio::test]
async fn regeneration_overwrites_in_place() {
    let src_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(out_dir.path());

    // Seed stale bytes under a stage key, then regenerate over them.
    store
        .put("redo/stage_0.jpg", b"stale", "image/jpeg")
        .await
        .unwrap();

    let image_ref = write_test_image(src_dir.path(), "car.png", 1600, 1200);
    generate_crops(
        &puzzle("redo", image_ref, "top left", 6.0),
        &GenerateConfig::default(),
        &store,
    )
    .await
    .unwrap();

    let fresh = std::fs::read(out_dir.path().join("redo/stage_0.jpg")).unwrap();
    assert_ne!(fresh, b"stale");
    image::load_from_memory(&fresh).expect("overwritten stage decodes");
}
