#![cfg(test)]

use std::fs::{self, File};

use tempfile::tempdir;

use crate::utils::fs::{file_name_str, find_files_with_suffix, list_files};

#[tokio::test]
async fn test_list_files_skips_directories_and_sorts() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path();
    File::create(base.join("b.tpk")).unwrap();
    File::create(base.join("a.tpk")).unwrap();
    fs::create_dir(base.join("nested")).unwrap();
    File::create(base.join("nested/c.tpk")).unwrap();

    let files = list_files(base).await.unwrap();
    let names: Vec<&str> = files.iter().filter_map(|p| file_name_str(p)).collect();
    assert_eq!(names, vec!["a.tpk", "b.tpk"]);
}

#[tokio::test]
async fn test_find_files_with_suffix() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path();
    File::create(base.join("routing.tpk")).unwrap();
    File::create(base.join("routing.tpk.new")).unwrap();
    File::create(base.join("notes.txt")).unwrap();

    let staged = find_files_with_suffix(base, ".tpk.new").await.unwrap();
    assert_eq!(staged, vec![base.join("routing.tpk.new")]);

    let artifacts = find_files_with_suffix(base, ".tpk").await.unwrap();
    assert_eq!(artifacts, vec![base.join("routing.tpk")]);
}

#[tokio::test]
async fn test_missing_directory_is_empty() {
    let temp_dir = tempdir().unwrap();
    let missing = temp_dir.path().join("does-not-exist");
    assert!(find_files_with_suffix(&missing, ".tpk").await.unwrap().is_empty());
    assert!(list_files(&missing).await.is_err());
}
