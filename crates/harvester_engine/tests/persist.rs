use std::fs;

use harvester_engine::{ensure_output_dir, HarvestError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("archives").join("hackers");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn existing_dir_is_accepted_and_left_clean() {
    let temp = TempDir::new().unwrap();
    ensure_output_dir(temp.path()).unwrap();
    // The writability probe must not leave files behind.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn file_in_place_of_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let err = ensure_output_dir(&file_path).unwrap_err();
    assert!(matches!(err, HarvestError::Io { .. }));
}
