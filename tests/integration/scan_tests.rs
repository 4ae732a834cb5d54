use memescanner::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use memescanner::scanner::{full_signature, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn finder_with(config: WalkerConfig) -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_walker_config(config))
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(outcome.groups.is_empty());
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.total_files, 0);
    assert_eq!(outcome.summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.jpg", b"content a");
    write(dir.path(), "b.jpg", b"content b");
    write(dir.path(), "c.jpg", b"content c");

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(outcome.groups.is_empty());
    assert_eq!(outcome.summary.total_files, 3);
}

#[test]
fn test_scan_duplicate_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.jpg", b"duplicate");
    write(dir.path(), "nested/b.jpg", b"duplicate");
    write(dir.path(), "c.jpg", b"different");

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(outcome.groups.len(), 1);
    let group = &outcome.groups[0];
    assert_eq!(group.files.len(), 2);
    assert_eq!(group.size, 9);
    assert_eq!(
        group.hash,
        full_signature(&dir.path().join("a.jpg")).unwrap()
    );
    assert_eq!(outcome.summary.duplicate_files, 1);
    assert_eq!(outcome.summary.reclaimable_space, 9);
}

#[test]
fn test_non_media_files_are_ignored() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same bytes");
    write(dir.path(), "b.txt", b"same bytes");
    write(dir.path(), "c.JPG", b"same bytes");

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(outcome.groups.is_empty());
}

#[test]
fn test_custom_extensions() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"same bytes");
    write(dir.path(), "b.txt", b"same bytes");

    let config = WalkerConfig {
        extensions: vec![".txt".to_string()],
        ..Default::default()
    };
    let outcome = finder_with(config).find_duplicates(dir.path()).unwrap();

    assert_eq!(outcome.groups.len(), 1);
}

#[test]
fn test_groups_sorted_by_total_size() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1.png", &[1u8; 100]);
    write(dir.path(), "small2.png", &[1u8; 100]);
    write(dir.path(), "big1.png", &[2u8; 5000]);
    write(dir.path(), "big2.png", &[2u8; 5000]);
    write(dir.path(), "mid1.png", &[3u8; 1000]);
    write(dir.path(), "mid2.png", &[3u8; 1000]);
    write(dir.path(), "mid3.png", &[3u8; 1000]);

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let totals: Vec<u64> = outcome.groups.iter().map(|g| g.total_size()).collect();
    assert_eq!(totals, vec![10_000, 3_000, 200]);
}

#[test]
fn test_group_members_follow_traversal_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "z.gif", b"gif bytes");
    write(dir.path(), "a.gif", b"gif bytes");
    write(dir.path(), "m/b.gif", b"gif bytes");

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let names: Vec<String> = outcome.groups[0]
        .files
        .iter()
        .map(|f| f.rel_path.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.gif", "m/b.gif", "z.gif"]);
}

#[test]
fn test_ignored_directories_are_pruned() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.mp4", b"video");
    write(dir.path(), "node_modules/b.mp4", b"video");
    write(dir.path(), ".git/c.mp4", b"video");

    let config = WalkerConfig {
        include_hidden: true,
        ..Default::default()
    };
    let outcome = finder_with(config).find_duplicates(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 1);
    assert!(outcome.groups.is_empty());
}

#[test]
fn test_hidden_files_opt_in() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.webp", b"pixels");
    write(dir.path(), ".hidden/b.webp", b"pixels");

    let default = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert!(default.groups.is_empty());

    let config = WalkerConfig {
        include_hidden: true,
        ..Default::default()
    };
    let with_hidden = finder_with(config).find_duplicates(dir.path()).unwrap();
    assert_eq!(with_hidden.groups.len(), 1);
}

#[test]
fn test_max_files_caps_the_scan() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        write(dir.path(), &format!("f{i}.png"), b"identical");
    }

    let config = WalkerConfig {
        max_files: Some(4),
        ..Default::default()
    };
    let outcome = finder_with(config).find_duplicates(dir.path()).unwrap();

    assert_eq!(outcome.summary.total_files, 4);
    assert_eq!(outcome.groups[0].files.len(), 4);
}

#[test]
fn test_records_carry_signatures() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.jpg", b"dup");
    write(dir.path(), "b.jpg", b"dup");
    write(dir.path(), "c.jpg", b"solo!");

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(outcome.records.iter().all(|r| r.partial.is_some()));
    let hashed: Vec<_> = outcome.records.iter().filter(|r| r.full.is_some()).collect();
    assert_eq!(hashed.len(), 2);
    assert_eq!(outcome.summary.full.input_files, 2);
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("nope"));

    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_file_root_is_an_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.jpg", b"x");
    let result = DuplicateFinder::with_defaults().find_duplicates(&dir.path().join("a.jpg"));

    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}
