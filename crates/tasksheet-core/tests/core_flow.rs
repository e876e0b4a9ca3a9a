use std::fs;

use tasksheet_core::store::Store;
use tasksheet_core::task::Task;
use tempfile::tempdir;

#[test]
fn add_persists_and_survives_reload() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");

    let tasks = store.load().expect("load");
    assert!(tasks.is_empty());

    let (tasks, task) = store
        .add(tasks, "  Buy milk  ", "pending")
        .expect("add task");
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.status, "pending");
    assert!(!task.created_at.is_empty());
    assert_eq!(tasks.len(), 1);

    // Simulated reload: a fresh store over the same directory.
    let reopened = Store::open(temp.path()).expect("reopen store");
    let loaded = reopened.load().expect("load after reopen");
    assert_eq!(loaded, tasks);
}

#[test]
fn blank_title_is_rejected_without_side_effects() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");

    let err = store.add(Vec::new(), "   ", "pending");
    assert!(err.is_err());

    assert!(store.load().expect("load").is_empty());
    assert!(!temp.path().join("tasks.json").exists());
}

#[test]
fn two_adds_get_distinct_ids() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");

    let (tasks, first) = store.add(Vec::new(), "one", "pending").expect("add one");
    let (tasks, second) = store.add(tasks, "two", "done").expect("add two");

    assert_ne!(first.id, second.id);
    assert_eq!(tasks.len(), 2);

    let loaded = store.load().expect("load");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "one");
    assert_eq!(loaded[1].title, "two");
}

#[test]
fn remove_filters_by_id_and_ignores_unknown() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");

    let (tasks, first) = store.add(Vec::new(), "keep", "pending").expect("add");
    let (tasks, victim) = store.add(tasks, "drop", "pending").expect("add");

    let tasks = store.remove(tasks, victim.id).expect("remove");
    assert_eq!(tasks.len(), 1);
    assert!(store.load().expect("load").iter().all(|t| t.id != victim.id));

    // Unknown id leaves the list unchanged.
    let tasks = store.remove(tasks, victim.id).expect("remove again");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, first.id);
}

#[test]
fn save_then_load_round_trips_all_fields() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");

    let tasks = vec![
        Task {
            id: 1_724_490_000_000,
            title: "Buy milk".to_string(),
            status: "pending".to_string(),
            created_at: "2026-08-24 10:00:00".to_string(),
        },
        Task {
            id: 1_724_490_000_001,
            title: "Walk dog & cat".to_string(),
            status: "in-progress".to_string(),
            created_at: "2026-08-24 10:00:01".to_string(),
        },
    ];

    store.save(&tasks).expect("save");
    assert_eq!(store.load().expect("load"), tasks);

    // The wire name for the timestamp matches the original layout.
    let raw = fs::read_to_string(temp.path().join("tasks.json")).expect("read file");
    assert!(raw.contains("\"createdAt\""));
}

#[test]
fn corrupt_task_file_reads_as_empty() {
    let temp = tempdir().expect("tempdir");
    let store = Store::open(temp.path()).expect("open store");
    let path = temp.path().join("tasks.json");

    fs::write(&path, "definitely not json").expect("write garbage");
    assert!(store.load().expect("load garbage").is_empty());

    fs::write(&path, "{\"id\": 1}").expect("write non-array");
    assert!(store.load().expect("load non-array").is_empty());

    // The next save resets the file to a clean list.
    let (tasks, _) = store.add(Vec::new(), "fresh start", "pending").expect("add");
    assert_eq!(store.load().expect("load after reset"), tasks);
}
