use super::*;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("coinfolio-storage-{}", Uuid::new_v4()))
}

// =============================================================================
// FileStorage
// =============================================================================

#[test]
fn file_storage_missing_key_is_absent() {
    let storage = FileStorage::new(scratch_dir());
    assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
}

#[test]
fn file_storage_set_then_get() {
    let dir = scratch_dir();
    let storage = FileStorage::new(&dir);
    storage.set(ACCESS_TOKEN_KEY, "tok-1");
    assert_eq!(storage.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok-1"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn file_storage_survives_new_instance() {
    let dir = scratch_dir();
    FileStorage::new(&dir).set(USER_KEY, r#"{"_id":"u1","name":"Ada","email":"a@b.com"}"#);

    let reopened = FileStorage::new(&dir);
    assert!(reopened.get(USER_KEY).unwrap().contains("a@b.com"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn file_storage_overwrite_leaves_no_temp_files() {
    let dir = scratch_dir();
    let storage = FileStorage::new(&dir);
    storage.set(REFRESH_TOKEN_KEY, "r1");
    storage.set(REFRESH_TOKEN_KEY, "r2");
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).as_deref(), Some("r2"));

    let names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![REFRESH_TOKEN_KEY.to_owned()]);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn file_storage_remove_is_idempotent() {
    let dir = scratch_dir();
    let storage = FileStorage::new(&dir);
    storage.set(ACCESS_TOKEN_KEY, "tok");
    storage.remove(ACCESS_TOKEN_KEY);
    storage.remove(ACCESS_TOKEN_KEY);
    assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn file_storage_ignores_unknown_keys() {
    let dir = scratch_dir();
    let storage = FileStorage::new(&dir);
    storage.set("../escape", "nope");
    assert_eq!(storage.get("../escape"), None);
    assert!(!dir.exists());
}

#[test]
fn file_storage_unwritable_dir_degrades_to_absent() {
    // A regular file where the directory should be makes every write fail.
    let blocker = scratch_dir();
    std::fs::write(&blocker, "not a directory").unwrap();
    let storage = FileStorage::new(&blocker);

    storage.set(ACCESS_TOKEN_KEY, "tok");
    assert_eq!(storage.get(ACCESS_TOKEN_KEY), None);
    let _ = std::fs::remove_file(blocker);
}

// =============================================================================
// MemoryStorage
// =============================================================================

#[test]
fn memory_storage_round_trip_and_remove() {
    let storage = MemoryStorage::new();
    assert!(storage.is_empty());
    storage.set(USER_KEY, "{}");
    assert_eq!(storage.len(), 1);
    assert_eq!(storage.get(USER_KEY).as_deref(), Some("{}"));
    storage.remove(USER_KEY);
    assert!(storage.is_empty());
}
