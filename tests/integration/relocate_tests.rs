use memescanner::actions::{
    relocate_duplicates, RelocateError, RelocationMode, RelocationOptions, TrashFacility,
    SAMPLE_SIZE,
};
use memescanner::duplicates::{DuplicateFinder, KeepPolicy, ScanOutcome};
use memescanner::manifest::{ManifestLog, OpMode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

/// Removes files instead of sending them to the desktop trash.
#[derive(Default)]
struct FakeTrash {
    received: Mutex<Vec<PathBuf>>,
}

impl TrashFacility for FakeTrash {
    fn delete_all(&self, paths: &[PathBuf]) -> io::Result<()> {
        for path in paths {
            fs::remove_file(path)?;
        }
        self.received.lock().unwrap().extend_from_slice(paths);
        Ok(())
    }
}

fn write(root: &Path, rel: &str, content: &[u8], age_secs: u64) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(mtime)).unwrap();
}

fn scan(root: &Path) -> ScanOutcome {
    DuplicateFinder::with_defaults().find_duplicates(root).unwrap()
}

fn move_options(dest: &Path, preserve_dirs: bool, dry_run: bool) -> RelocationOptions {
    RelocationOptions {
        mode: RelocationMode::MoveTo {
            dest_root: dest.to_path_buf(),
            preserve_dirs,
        },
        policy: KeepPolicy::Newest,
        dry_run,
    }
}

#[test]
fn test_move_flat_keeps_newest() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "old.jpg", b"meme", 300);
    write(src.path(), "new.jpg", b"meme", 10);
    write(src.path(), "sub/older.jpg", b"meme", 600);

    let outcome = scan(src.path());
    let report = relocate_duplicates(
        &outcome.groups,
        &move_options(dest.path(), false, false),
        &FakeTrash::default(),
        &ManifestLog::new(logs.path()),
        None,
    )
    .unwrap();

    assert_eq!(report.planned, 2);
    assert_eq!(report.succeeded, 2);
    assert!(report.all_succeeded());
    assert!(src.path().join("new.jpg").exists());
    assert!(!src.path().join("old.jpg").exists());
    assert!(!src.path().join("sub/older.jpg").exists());
    assert!(dest.path().join("old.jpg").exists());
    assert!(dest.path().join("older.jpg").exists());
    assert!(report.manifest.unwrap().starts_with(logs.path()));
}

#[test]
fn test_move_preserving_directories() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "keep.png", b"pic", 1);
    write(src.path(), "albums/2020/copy.png", b"pic", 100);

    let outcome = scan(src.path());
    relocate_duplicates(
        &outcome.groups,
        &move_options(dest.path(), true, false),
        &FakeTrash::default(),
        &ManifestLog::new(logs.path()),
        None,
    )
    .unwrap();

    assert!(dest.path().join("albums/2020/copy.png").exists());
    assert!(src.path().join("keep.png").exists());
}

#[test]
fn test_same_name_duplicates_are_disambiguated() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a/cat.gif", b"meow", 1);
    write(src.path(), "b/cat.gif", b"meow", 50);
    write(src.path(), "c/cat.gif", b"meow", 100);

    let outcome = scan(src.path());
    let report = relocate_duplicates(
        &outcome.groups,
        &move_options(dest.path(), false, false),
        &FakeTrash::default(),
        &ManifestLog::new(logs.path()),
        None,
    )
    .unwrap();

    assert_eq!(report.succeeded, 2);
    assert!(dest.path().join("cat.gif").exists());
    assert!(dest.path().join("cat (dup1).gif").exists());
}

#[test]
fn test_trash_mode_records_trash_ops() {
    let src = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.mp4", b"video", 100);
    write(src.path(), "b.mp4", b"video", 1);

    let outcome = scan(src.path());
    let trash = FakeTrash::default();
    let options = RelocationOptions {
        mode: RelocationMode::Trash,
        policy: KeepPolicy::Newest,
        dry_run: false,
    };
    let report = relocate_duplicates(
        &outcome.groups,
        &options,
        &trash,
        &ManifestLog::new(logs.path()),
        None,
    )
    .unwrap();

    assert_eq!(report.succeeded, 1);
    assert_eq!(
        trash.received.lock().unwrap().as_slice(),
        &[src.path().join("a.mp4")]
    );
    assert!(report.ops.iter().all(|op| op.mode == OpMode::Trash && op.to.is_none()));

    let manifest = ManifestLog::read(&report.manifest.unwrap()).unwrap();
    assert_eq!(manifest.ops.len(), 1);
}

#[test]
fn test_failed_op_is_counted_and_kept_in_manifest() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.jpg", b"same", 100);
    write(src.path(), "b.jpg", b"same", 200);
    write(src.path(), "c.jpg", b"same", 1);

    let outcome = scan(src.path());
    fs::remove_file(src.path().join("a.jpg")).unwrap();

    let report = relocate_duplicates(
        &outcome.groups,
        &move_options(dest.path(), false, false),
        &FakeTrash::default(),
        &ManifestLog::new(logs.path()),
        None,
    )
    .unwrap();

    assert_eq!(report.planned, 2);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].op.from, src.path().join("a.jpg"));

    let manifest = ManifestLog::read(&report.manifest.unwrap()).unwrap();
    assert_eq!(manifest.ops.len(), 2);
}

#[test]
fn test_dry_run_sample_is_capped() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let logs = tempdir().unwrap();
    for i in 0..15 {
        write(src.path(), &format!("copy{i:02}.png"), b"same picture", 100 + i);
    }

    let outcome = scan(src.path());
    let report = relocate_duplicates(
        &outcome.groups,
        &move_options(&dest.path().join("never"), false, true),
        &FakeTrash::default(),
        &ManifestLog::new(logs.path().join("logs")),
        None,
    )
    .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.planned, 14);
    assert_eq!(report.sample.len(), SAMPLE_SIZE);
    assert_eq!(report.succeeded, 0);
    assert!(report.manifest.is_none());
    assert!(!dest.path().join("never").exists());
    assert!(!logs.path().join("logs").exists());
}

#[test]
fn test_unwritable_log_dir_leaves_everything_in_place() {
    let src = tempdir().unwrap();
    let logs = tempdir().unwrap();
    write(src.path(), "a.jpg", b"meme", 300);
    write(src.path(), "b.jpg", b"meme", 10);
    let blocker = logs.path().join("manifests");
    fs::write(&blocker, b"plain file").unwrap();

    let trash = FakeTrash::default();
    let options = RelocationOptions {
        mode: RelocationMode::Trash,
        policy: KeepPolicy::Newest,
        dry_run: false,
    };
    let result = relocate_duplicates(
        &scan(src.path()).groups,
        &options,
        &trash,
        &ManifestLog::new(&blocker),
        None,
    );

    assert!(matches!(result, Err(RelocateError::LogDir { .. })));
    assert!(trash.received.lock().unwrap().is_empty());
    assert!(src.path().join("a.jpg").exists());
    assert!(src.path().join("b.jpg").exists());
}
