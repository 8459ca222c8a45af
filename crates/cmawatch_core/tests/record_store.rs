use cmawatch_core::{
    JsonFileRosterRepository, NotificationSchedule, RosterRepository, SeedDataset, StorageError,
};
use serde_json::json;
use std::path::PathBuf;

fn roster_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("pessoas.json")
}

#[test]
fn first_load_seeds_bundled_roster_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let repo = JsonFileRosterRepository::new(&path);

    let seeded = repo.load().unwrap();
    assert_eq!(seeded.len(), 6);
    assert!(path.exists());
    assert!(seeded
        .iter()
        .all(|entry| entry.notifications_enabled && entry.card_visible));
    assert!(seeded.iter().all(|entry| !entry.schedule.is_scheduled()));

    repo.save(&seeded[..2]).unwrap();
    let reloaded = repo.load().unwrap();
    assert_eq!(reloaded.len(), 2, "an existing file must never be reseeded");
}

#[test]
fn seeded_ids_are_stable_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRosterRepository::new(roster_path(&dir));

    let first = repo.load().unwrap();
    let second = repo.load().unwrap();
    let first_ids = first.iter().map(|entry| entry.id).collect::<Vec<_>>();
    let second_ids = second.iter().map(|entry| entry.id).collect::<Vec<_>>();
    assert_eq!(first_ids, second_ids);
}

#[test]
fn unmodified_round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let repo = JsonFileRosterRepository::new(&path);

    let entries = repo.load().unwrap();
    let before = std::fs::read(&path).unwrap();
    repo.save(&entries).unwrap();
    let after = std::fs::read(&path).unwrap();
    assert_eq!(before, after);
}

#[test]
fn legacy_records_get_defaults_and_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let legacy = json!([
        { "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" },
        {
            "nome": "Souza",
            "LPNA": "777",
            "vencimento": "2027-01-01",
            "notificationId": "abc-123",
            "notificationsEnabled": false,
            "cardVisible": false
        }
    ]);
    std::fs::write(&path, legacy.to_string()).unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    let entries = repo.load().unwrap();
    assert_eq!(entries.len(), 2);

    assert!(entries[0].notifications_enabled);
    assert!(entries[0].card_visible);
    assert_eq!(entries[0].schedule, NotificationSchedule::NoSchedule);

    assert!(!entries[1].notifications_enabled);
    assert!(!entries[1].card_visible);
    assert_eq!(
        entries[1].schedule.notification_id().map(|id| id.as_str()),
        Some("abc-123")
    );
    assert_ne!(entries[0].id, entries[1].id);

    repo.save(&entries).unwrap();
    let persisted: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted[0]["id"], json!(entries[0].id.to_string()));
    assert_eq!(persisted[0]["notificationId"], serde_json::Value::Null);
    assert_eq!(persisted[1]["notificationId"], json!("abc-123"));
    assert_eq!(persisted[1]["LPNA"], json!("777"));
}

#[test]
fn ids_generated_for_legacy_records_are_written_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let legacy = json!([
        { "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" },
        { "nome": "Souza", "LPNA": "777", "vencimento": "2027-01-01" }
    ]);
    std::fs::write(&path, legacy.to_string()).unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    let first = repo.load().unwrap();
    let second = JsonFileRosterRepository::new(&path).load().unwrap();
    let first_ids = first.iter().map(|entry| entry.id).collect::<Vec<_>>();
    let second_ids = second.iter().map(|entry| entry.id).collect::<Vec<_>>();
    assert_eq!(first_ids, second_ids);

    let persisted: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(persisted[0]["id"], json!(first[0].id.to_string()));
    assert_eq!(persisted[1]["id"], json!(first[1].id.to_string()));
    assert_eq!(persisted[0]["nome"], json!("Silva"));
}

#[test]
fn scan_never_writes_generated_ids() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let legacy = json!([{ "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" }]);
    std::fs::write(&path, legacy.to_string()).unwrap();
    let before = std::fs::read(&path).unwrap();

    let report = JsonFileRosterRepository::new(&path).scan().unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn strict_load_rejects_malformed_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let records = json!([
        { "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" },
        { "nome": "Broken", "LPNA": "1", "vencimento": "not-a-date" }
    ]);
    std::fs::write(&path, records.to_string()).unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    let err = repo.load().unwrap_err();
    assert!(matches!(err, StorageError::InvalidRecord { index: 1, .. }));
}

#[test]
fn non_array_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    std::fs::write(&path, "{\"nome\": \"Silva\"}").unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    assert!(matches!(repo.load(), Err(StorageError::Parse { .. })));
    assert!(matches!(repo.scan(), Err(StorageError::Parse { .. })));
}

#[test]
fn scan_skips_malformed_records_and_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let records = json!([
        { "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" },
        { "nome": "Missing date", "LPNA": "2" },
        { "nome": "Souza", "LPNA": "777", "vencimento": "2027-01-01" }
    ]);
    std::fs::write(&path, records.to_string()).unwrap();

    let repo = JsonFileRosterRepository::new(&path);
    let report = repo.scan().unwrap();
    let names = report
        .entries
        .iter()
        .map(|entry| entry.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Silva", "Souza"]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 1);
}

#[test]
fn scan_of_missing_file_is_empty_and_does_not_seed() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let repo = JsonFileRosterRepository::new(&path);

    let report = repo.scan().unwrap();
    assert!(report.entries.is_empty());
    assert!(report.rejected.is_empty());
    assert!(!path.exists());
}

#[test]
fn custom_seed_replaces_bundled_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let seed = SeedDataset::from_json(
        json!([{ "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" }]).to_string(),
    );
    let repo = JsonFileRosterRepository::with_seed(roster_path(&dir), seed);

    let entries = repo.load().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Silva");
}

#[test]
fn save_into_unwritable_location_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "file").unwrap();

    let repo = JsonFileRosterRepository::with_seed(blocker.join("pessoas.json"), SeedDataset::empty());
    let err = repo.save(&[]).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
}

#[test]
fn save_leaves_no_temp_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRosterRepository::new(roster_path(&dir));
    let entries = repo.load().unwrap();
    repo.save(&entries).unwrap();

    let names = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|item| item.unwrap().file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["pessoas.json".to_string()]);
}
