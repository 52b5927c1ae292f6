//! Kept in its own test binary: it changes the process working directory.

use std::env;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use windex_core::{Catalog, ExclusionSet, Indexer, SEARCH_LIMIT};

#[test]
fn relative_roots_are_stored_under_absolute_keys() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    fs::create_dir(a.path().join("docs")).unwrap();
    fs::create_dir(b.path().join("docs")).unwrap();
    fs::write(a.path().join("docs/only_in_a.txt"), "a").unwrap();
    fs::write(b.path().join("docs/only_in_b.txt"), "b").unwrap();

    let original = env::current_dir().unwrap();
    let indexer = Indexer::new(ExclusionSet::empty());
    let mut catalog = Catalog::open_in_memory().unwrap();

    env::set_current_dir(a.path()).unwrap();
    let cwd_a = env::current_dir().unwrap();
    let stats_a = indexer.index(&mut catalog, Path::new("docs")).unwrap();

    env::set_current_dir(b.path()).unwrap();
    let cwd_b = env::current_dir().unwrap();
    let stats_b = indexer.index(&mut catalog, Path::new("docs")).unwrap();

    env::set_current_dir(original).unwrap();

    assert_eq!(stats_a.root, cwd_a.join("docs"));
    assert_eq!(stats_b.root, cwd_b.join("docs"));
    assert_eq!(stats_b.inserted, 1);
    assert_eq!(stats_b.deleted, 0);

    let records = catalog.records();
    let in_a = cwd_a.join("docs").join("only_in_a.txt");
    let in_b = cwd_b.join("docs").join("only_in_b.txt");
    assert!(records.get(in_a.to_str().unwrap()).unwrap().is_some());
    assert!(records.get(in_b.to_str().unwrap()).unwrap().is_some());

    let all = records.search("", SEARCH_LIMIT).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|r| Path::new(&r.path).is_absolute()));
}
