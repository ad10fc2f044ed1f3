#![forbid(unsafe_code)]

use std::process::Command;

use invar::error::InvarError;
use invar::task::model::{Priority, Task};
use invar::task::storage::TaskStore;
use time::macros::datetime;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn open_store(dir: &std::path::Path) -> TaskStore {
    TaskStore::open(dir).expect("open store")
}

#[test]
fn save_and_load_round_trip_preserves_all_fields() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let mut task = Task::new("write the report\nwith an outline");
    task.priority = Priority::High;
    task.deadline = Some(datetime!(2026-09-01 23:59 UTC));
    task.tags = vec!["work".to_owned(), "q3".to_owned()];
    store.save(&task).expect("save");

    let loaded = store.load(&task.id).expect("load");
    assert_eq!(loaded, task);
}

#[test]
fn optional_fields_survive_absent() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let task = Task::new("no deadline, no completion");
    store.save(&task).expect("save");

    let raw = std::fs::read_to_string(tmp.path().join(format!("{}.json", task.id)))
        .expect("read raw record");
    assert!(!raw.contains("deadline"), "absent deadline is not serialized");
    assert!(!raw.contains("completed_at"));

    let loaded = store.load(&task.id).expect("load");
    assert!(loaded.deadline.is_none());
    assert!(loaded.completed_at.is_none());
}

#[test]
fn list_partitions_by_archived_flag() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let active = Task::new("active");
    let mut archived = Task::new("archived");
    archived.archive();
    store.save(&active).expect("save active");
    store.save(&archived).expect("save archived");

    let listed = store.list(false).expect("list active");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, active.id);

    let listed = store.list(true).expect("list archived");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, archived.id);
}

#[test]
fn delete_removes_record_and_missing_ids_are_not_found() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let task = Task::new("to delete");
    store.save(&task).expect("save");
    store.delete(&task.id).expect("delete");

    assert!(matches!(
        store.load(&task.id),
        Err(InvarError::NotFound(_))
    ));
    assert!(matches!(
        store.delete(&task.id),
        Err(InvarError::NotFound(_))
    ));
}

#[test]
fn every_mutation_is_a_commit_with_a_short_id_message() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let mut task = Task::new("audited");
    store.save(&task).expect("save");
    task.complete();
    store.save(&task).expect("save again");
    store.delete(&task.id).expect("delete");

    let log = store.log().expect("log");
    assert_eq!(log.len(), 3);
    // newest first
    assert_eq!(log[0].message, format!("Delete task: {}", task.short_id()));
    assert_eq!(log[1].message, format!("Update task: {}", task.short_id()));
    assert_eq!(log[2].message, format!("Update task: {}", task.short_id()));
}

#[test]
fn saving_identical_state_adds_no_commit() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let task = Task::new("stable");
    store.save(&task).expect("save");
    let before = store.log().expect("log").len();

    store.save(&task).expect("save unchanged");
    let after = store.log().expect("log").len();
    assert_eq!(before, after, "a clean tree must not produce a commit");
}

#[test]
fn corrupt_record_is_skipped_by_list_but_loud_on_load() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());

    let task = Task::new("healthy");
    store.save(&task).expect("save");
    std::fs::write(tmp.path().join("broken.json"), b"{ not json").expect("write corrupt file");

    let listed = store.list(false).expect("list");
    assert_eq!(listed.len(), 1, "corrupt records never hide healthy ones");

    assert!(matches!(
        store.load("broken"),
        Err(InvarError::Decode { .. })
    ));
}

#[test]
fn empty_store_has_empty_log() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let store = open_store(tmp.path());
    assert!(store.log().expect("log").is_empty());
}

#[test]
fn reopening_an_existing_store_keeps_its_data() {
    if !git_available() {
        eprintln!("skipping: git not available");
        return;
    }
    let tmp = tempfile::tempdir().expect("tempdir");
    let task = Task::new("persistent");
    {
        let store = open_store(tmp.path());
        store.save(&task).expect("save");
    }
    let store = open_store(tmp.path());
    let loaded = store.load(&task.id).expect("load after reopen");
    assert_eq!(loaded.content, "persistent");
    assert_eq!(store.log().expect("log").len(), 1);
}
