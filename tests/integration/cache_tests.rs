use memescanner::cache::{CacheKey, HashCache, SignatureCache, SignatureRecord};
use memescanner::duplicates::{DuplicateFinder, FinderConfig};
use memescanner::scanner::{partial_signature, FileRecord};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    fs::write(root.join(rel), content).unwrap();
}

fn finder(cache: Arc<dyn SignatureCache>, require_full: bool) -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default()
            .with_cache(cache)
            .with_require_full_in_cache(require_full),
    )
}

#[test]
fn test_second_scan_is_served_from_disk_cache() {
    let media = tempdir().unwrap();
    let state = tempdir().unwrap();
    write(media.path(), "a.jpg", b"duplicate body");
    write(media.path(), "b.jpg", b"duplicate body");
    write(media.path(), "c.jpg", b"unique body!!");
    let db = state.path().join("signatures.db");

    let first = finder(Arc::new(HashCache::new(&db).unwrap()), false)
        .find_duplicates(media.path())
        .unwrap();
    assert_eq!(first.summary.partial.computed, 3);
    assert_eq!(first.summary.full.computed, 2);

    let second = finder(Arc::new(HashCache::new(&db).unwrap()), false)
        .find_duplicates(media.path())
        .unwrap();

    assert_eq!(second.summary.partial.cache_hits, 3);
    assert_eq!(second.summary.partial.computed, 0);
    assert_eq!(second.summary.full.cache_hits, 2);
    assert_eq!(second.summary.full.computed, 0);
    assert_eq!(second.groups, first.groups);
}

#[test]
fn test_modified_file_is_rehashed() {
    let media = tempdir().unwrap();
    write(media.path(), "a.png", b"before");
    write(media.path(), "b.png", b"before");
    let cache = Arc::new(HashCache::in_memory().unwrap());

    finder(cache.clone(), false)
        .find_duplicates(media.path())
        .unwrap();

    write(media.path(), "b.png", b"after!");
    let later = SystemTime::now() + Duration::from_secs(5);
    filetime::set_file_mtime(
        media.path().join("b.png"),
        filetime::FileTime::from_system_time(later),
    )
    .unwrap();

    let outcome = finder(cache, false).find_duplicates(media.path()).unwrap();

    assert_eq!(outcome.summary.partial.cache_hits, 1);
    assert_eq!(outcome.summary.partial.computed, 1);
    assert!(outcome.groups.is_empty());
}

#[test]
fn test_require_full_ignores_partial_only_entries() {
    let media = tempdir().unwrap();
    write(media.path(), "solo.mp4", b"only one of these");
    let cache = Arc::new(HashCache::in_memory().unwrap());

    finder(cache.clone(), false)
        .find_duplicates(media.path())
        .unwrap();

    let lenient = finder(cache.clone(), false)
        .find_duplicates(media.path())
        .unwrap();
    assert_eq!(lenient.summary.partial.cache_hits, 1);

    let strict = finder(cache, true).find_duplicates(media.path()).unwrap();
    assert_eq!(strict.summary.partial.cache_hits, 0);
    assert_eq!(strict.summary.partial.computed, 1);
}

#[test]
fn test_stale_cache_entry_cannot_fake_a_duplicate() {
    let media = tempdir().unwrap();
    write(media.path(), "a.gif", b"aaaa");
    write(media.path(), "b.gif", b"bbbb");
    let cache = Arc::new(HashCache::in_memory().unwrap());

    // Same key as the real file but an unrelated digest: partial signatures
    // collide, so the full stage must decide.
    let a = FileRecord::from_path(
        media.path().join("a.gif"),
        4,
        fs::metadata(media.path().join("a.gif")).unwrap().modified().unwrap(),
    );
    let b_partial = partial_signature(&media.path().join("b.gif"), 4).unwrap();
    cache.set(&CacheKey::for_record(&a), SignatureRecord::partial_only(b_partial));

    let outcome = finder(cache, false).find_duplicates(media.path()).unwrap();

    assert_eq!(outcome.summary.full.input_files, 2);
    assert!(outcome.groups.is_empty());
}

#[test]
fn test_unwritable_cache_location_fails_to_open() {
    let state = tempdir().unwrap();
    let blocker = state.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();

    assert!(HashCache::new(&blocker.join("signatures.db")).is_err());
}
