use memescanner::manifest::{ManifestLog, RelocationOp, LATEST};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_manifest_json_layout() {
    let logs = tempdir().unwrap();
    let log = ManifestLog::new(logs.path());
    let ops = vec![
        RelocationOp::moved(PathBuf::from("/m/a.jpg"), PathBuf::from("/d/a.jpg")),
        RelocationOp::trashed(PathBuf::from("/m/b.jpg")),
    ];

    let path = log.write(&ops).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
    assert_eq!(json["ops"][0]["from"], "/m/a.jpg");
    assert_eq!(json["ops"][0]["to"], "/d/a.jpg");
    assert_eq!(json["ops"][0]["mode"], "move");
    assert_eq!(json["ops"][1]["mode"], "trash");
    assert!(json["ops"][1].get("to").is_none());
}

#[test]
fn test_manifest_name_has_no_colons() {
    let logs = tempdir().unwrap();
    let path = ManifestLog::new(logs.path()).write(&[]).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();

    assert!(name.starts_with("manifest-"));
    assert!(name.ends_with(".json"));
    assert!(!name.contains(':'));
    assert_eq!(name.matches('.').count(), 1);
}

#[test]
fn test_rapid_writes_never_overwrite() {
    let logs = tempdir().unwrap();
    let log = ManifestLog::new(logs.path());

    let paths: Vec<PathBuf> = (0..5).map(|_| log.write(&[]).unwrap()).collect();
    let mut unique = paths.clone();
    unique.sort();
    unique.dedup();

    assert_eq!(unique.len(), 5);
    assert_eq!(log.list().len(), 5);
}

#[test]
fn test_latest_is_the_most_recent_write() {
    let logs = tempdir().unwrap();
    let log = ManifestLog::new(logs.path());

    log.write(&[]).unwrap();
    log.write(&[]).unwrap();
    let last = log.write(&[]).unwrap();

    assert_eq!(log.resolve(LATEST).unwrap(), last);
    assert_eq!(log.list()[0], last);
}

#[test]
fn test_foreign_files_are_not_listed() {
    let logs = tempdir().unwrap();
    fs::write(logs.path().join("notes.json"), "{}").unwrap();
    fs::write(logs.path().join("manifest-old.txt"), "").unwrap();
    fs::write(logs.path().join("MANIFEST-2020.JSON"), "{}").unwrap();

    let listed = ManifestLog::new(logs.path()).list();

    assert_eq!(listed, vec![logs.path().join("MANIFEST-2020.JSON")]);
}

#[test]
fn test_log_dir_is_created_on_write() {
    let logs = tempdir().unwrap();
    let nested = logs.path().join("a/b/logs");
    let log = ManifestLog::new(&nested);

    assert!(log.list().is_empty());
    log.write(&[]).unwrap();

    assert!(nested.is_dir());
    assert_eq!(log.list().len(), 1);
}
