use memescanner::actions::{relocate_duplicates, RelocationMode, RelocationOptions, SystemTrash};
use memescanner::duplicates::{DuplicateFinder, KeepPolicy};
use memescanner::manifest::{undo, Manifest, ManifestError, ManifestLog, RelocationOp, LATEST};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn move_first_keep(src: &Path, dest: &Path, log: &ManifestLog, preserve_dirs: bool) {
    let outcome = DuplicateFinder::with_defaults().find_duplicates(src).unwrap();
    let options = RelocationOptions {
        mode: RelocationMode::MoveTo {
            dest_root: dest.to_path_buf(),
            preserve_dirs,
        },
        policy: KeepPolicy::First,
        dry_run: false,
    };
    let report = relocate_duplicates(&outcome.groups, &options, &SystemTrash, log, None).unwrap();
    assert!(report.all_succeeded());
}

#[test]
fn test_undo_latest_restores_everything() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.jpg", b"one");
    write(src.path(), "deep/er/b.jpg", b"one");
    write(src.path(), "c.png", b"two");
    write(src.path(), "d.png", b"two");

    let log = ManifestLog::new(logs.path());
    move_first_keep(src.path(), dest.path(), &log, true);
    assert!(!src.path().join("deep/er/b.jpg").exists());
    assert!(!src.path().join("d.png").exists());

    let manifest = log.resolve(LATEST).unwrap();
    let report = undo(&manifest).unwrap();

    assert_eq!(report.undone, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(fs::read(src.path().join("deep/er/b.jpg")).unwrap(), b"one");
    assert_eq!(fs::read(src.path().join("d.png")).unwrap(), b"two");
    assert!(!dest.path().join("deep/er/b.jpg").exists());
}

#[test]
fn test_second_undo_is_a_no_op() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.webm", b"clip");
    write(src.path(), "b.webm", b"clip");

    let log = ManifestLog::new(logs.path());
    move_first_keep(src.path(), dest.path(), &log, false);
    let manifest = log.resolve(LATEST).unwrap();

    assert_eq!(undo(&manifest).unwrap().undone, 1);
    let again = undo(&manifest).unwrap();

    assert_eq!(again.undone, 0);
    assert_eq!(again.errors, 0);
    assert!(src.path().join("b.webm").exists());
}

#[test]
fn test_undo_never_overwrites_a_recreated_source() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.jpg", b"orig");
    write(src.path(), "b.jpg", b"orig");

    let log = ManifestLog::new(logs.path());
    move_first_keep(src.path(), dest.path(), &log, false);
    write(src.path(), "b.jpg", b"new content");

    let report = undo(&log.resolve(LATEST).unwrap()).unwrap();

    assert_eq!(report.undone, 0);
    assert_eq!(fs::read(src.path().join("b.jpg")).unwrap(), b"new content");
    assert!(dest.path().join("b.jpg").exists());
}

#[test]
fn test_undo_by_explicit_path_picks_that_run() {
    let logs = tempdir().unwrap();
    let work = tempdir().unwrap();
    write(work.path(), "moved/x.gif", b"x");

    let log = ManifestLog::new(logs.path());
    let older = log
        .write(&[RelocationOp::moved(
            work.path().join("x.gif"),
            work.path().join("moved/x.gif"),
        )])
        .unwrap();
    log.write(&[]).unwrap();

    let resolved = log.resolve(older.to_str().unwrap()).unwrap();
    let report = undo(&resolved).unwrap();

    assert_eq!(report.undone, 1);
    assert!(work.path().join("x.gif").exists());
}

#[test]
fn test_undo_without_manifests_is_a_usage_error() {
    let logs = tempdir().unwrap();
    let err = ManifestLog::new(logs.path().join("missing"))
        .resolve(LATEST)
        .unwrap_err();

    assert!(matches!(err, ManifestError::NoManifests(_)));
    assert!(err.is_usage_error());
}

#[test]
fn test_undo_corrupt_manifest_is_a_parse_error() {
    let logs = tempdir().unwrap();
    let path = logs.path().join("manifest-broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = undo(&path).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(!err.is_usage_error());
}

#[test]
fn test_undo_accepts_manifest_without_ops() {
    let logs = tempdir().unwrap();
    let path = logs.path().join("manifest-empty.json");
    fs::write(&path, r#"{"createdAt":"2024-01-01T00:00:00.000Z"}"#).unwrap();

    let parsed: Manifest = ManifestLog::read(&path).unwrap();
    assert!(parsed.ops.is_empty());
    assert_eq!(undo(&path).unwrap().undone, 0);
}
