mod common;

use common::{days_from_today, fixed_clock, iso, RecordingNotifier};
use cmawatch_core::{
    EntryInput, EntryValidationError, ExpirationRisk, FixedClock, JsonFileRosterRepository,
    NotificationScheduler, RosterRepository, RosterService, RosterServiceError,
    SeedDataset,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

type TestService = RosterService<JsonFileRosterRepository, RecordingNotifier, FixedClock>;

fn open_service(path: &Path, notifier: &RecordingNotifier, clock: FixedClock) -> TestService {
    let repo = JsonFileRosterRepository::with_seed(path, SeedDataset::empty());
    let scheduler = NotificationScheduler::new(notifier.clone(), clock);
    RosterService::open(repo, scheduler).unwrap()
}

fn input(name: &str, license_id: &str, expiration_date: &str) -> EntryInput {
    EntryInput {
        name: name.to_string(),
        license_id: license_id.to_string(),
        expiration_date: expiration_date.to_string(),
    }
}

fn roster_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("data").join("pessoas.json")
}

#[test]
fn open_seeds_bundled_roster_sorted_by_expiration() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRosterRepository::new(roster_path(&dir));
    let scheduler = NotificationScheduler::new(RecordingNotifier::granted(), fixed_clock());
    let service = RosterService::open(repo, scheduler).unwrap();

    assert_eq!(service.count(), 6);
    let dates = service
        .entries()
        .iter()
        .map(|entry| entry.expiration_date)
        .collect::<Vec<_>>();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn add_schedules_reminder_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let expiration = days_from_today(&clock, 10);
    let added = service
        .add_entry(&input("Silva", "12345", &iso(expiration)))
        .unwrap();

    assert!(added.notifications_enabled);
    let live = added.schedule.notification_id().cloned().unwrap();
    assert_eq!(notifier.scheduled()[0].identifier, live);
    assert_eq!(service.get(added.id), Some(&added));

    let on_disk = JsonFileRosterRepository::new(&path).load().unwrap();
    assert_eq!(on_disk, vec![added]);
}

#[test]
fn add_outside_window_persists_without_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let added = service
        .add_entry(&input("Souza", "777", &iso(days_from_today(&clock, 100))))
        .unwrap();
    assert!(!added.schedule.is_scheduled());
    assert!(notifier.calls().is_empty());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw[0]["notificationId"], serde_json::Value::Null);
}

#[test]
fn add_rejects_invalid_input_without_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&roster_path(&dir), &notifier, clock);
    let date = iso(days_from_today(&clock, 10));

    let cases = [
        input("", "12345", &date),
        input("Silva", "", &date),
        input("Silva", "12a45", &date),
        input("Silva", "12345", "26/10/2026"),
    ];
    for case in &cases {
        let err = service.add_entry(case).unwrap_err();
        assert!(matches!(err, RosterServiceError::Validation(_)), "{case:?}");
    }
    assert!(matches!(
        service.add_entry(&cases[2]).unwrap_err(),
        RosterServiceError::Validation(EntryValidationError::NonNumericLicenseId(_))
    ));
    assert_eq!(service.count(), 0);
    assert!(notifier.calls().is_empty());
}

#[test]
fn edit_cancels_old_reminder_and_schedules_new_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let added = service
        .add_entry(&input("Silva", "12345", &iso(days_from_today(&clock, 10))))
        .unwrap();
    let old_id = added.schedule.notification_id().cloned().unwrap();
    notifier.clear();

    let new_date = days_from_today(&clock, 20);
    let edited = service
        .edit_entry(added.id, &input("Silva Jr", "54321", &iso(new_date)))
        .unwrap();

    assert_eq!(edited.id, added.id);
    assert_eq!(edited.name, "Silva Jr");
    assert_eq!(edited.expiration_date, new_date);
    assert_eq!(notifier.cancelled(), vec![old_id.clone()]);
    let new_id = edited.schedule.notification_id().cloned().unwrap();
    assert_ne!(new_id, old_id);
    assert_eq!(
        notifier.scheduled()[0].content.body,
        format!("O CMA de Silva Jr vence em {}", new_date.format("%d/%m/%Y"))
    );
}

#[test]
fn entries_with_same_name_and_license_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&roster_path(&dir), &notifier, clock);
    let date = iso(days_from_today(&clock, 10));

    let first = service.add_entry(&input("Silva", "12345", &date)).unwrap();
    let second = service.add_entry(&input("Silva", "12345", &date)).unwrap();
    service.delete_entry(first.id).unwrap();

    assert_eq!(service.count(), 1);
    assert_eq!(service.entries()[0].id, second.id);
}

#[test]
fn delete_cancels_reminder_and_removes_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let added = service
        .add_entry(&input("Silva", "12345", &iso(days_from_today(&clock, 10))))
        .unwrap();
    let live = added.schedule.notification_id().cloned().unwrap();

    service.delete_entry(added.id).unwrap();
    assert_eq!(notifier.cancelled(), vec![live]);
    assert!(service.get(added.id).is_none());
    assert!(JsonFileRosterRepository::new(&path).load().unwrap().is_empty());
}

#[test]
fn delete_proceeds_when_cancel_fails() {
    let dir = tempfile::tempdir().unwrap();
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&roster_path(&dir), &notifier, clock);

    let added = service
        .add_entry(&input("Silva", "12345", &iso(days_from_today(&clock, 10))))
        .unwrap();
    notifier.set_fail_cancel(true);

    service.delete_entry(added.id).unwrap();
    assert_eq!(service.count(), 0);
}

#[test]
fn unknown_id_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&roster_path(&dir), &notifier, fixed_clock());
    let missing = Uuid::new_v4();

    assert!(matches!(
        service.delete_entry(missing),
        Err(RosterServiceError::EntryNotFound(id)) if id == missing
    ));
    assert!(matches!(
        service.toggle_notifications(missing),
        Err(RosterServiceError::EntryNotFound(_))
    ));
}

#[test]
fn toggle_round_trip_persists_flag_and_cancels_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let added = service
        .add_entry(&input("Silva", "12345", &iso(days_from_today(&clock, 10))))
        .unwrap();
    let live = added.schedule.notification_id().cloned().unwrap();
    notifier.clear();

    let off = service.toggle_notifications(added.id).unwrap();
    assert!(!off.notifications_enabled);
    assert!(!off.schedule.is_scheduled());
    assert_eq!(notifier.cancelled(), vec![live]);

    let on = service.toggle_notifications(added.id).unwrap();
    assert!(on.notifications_enabled);
    assert!(!on.schedule.is_scheduled());
    assert!(notifier.scheduled().is_empty());

    let on_disk = JsonFileRosterRepository::new(&path).load().unwrap();
    assert!(on_disk[0].notifications_enabled);
}

#[test]
fn failed_save_leaves_view_unchanged_and_cancels_new_reminder() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let path = data_dir.join("pessoas.json");
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);
    assert_eq!(service.count(), 0);

    std::fs::remove_dir_all(&data_dir).unwrap();
    std::fs::write(&data_dir, "blocks the roster directory").unwrap();

    let err = service
        .add_entry(&input("Silva", "12345", &iso(days_from_today(&clock, 10))))
        .unwrap_err();
    assert!(matches!(err, RosterServiceError::Storage(_)));
    assert_eq!(service.count(), 0);

    let scheduled = notifier.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(notifier.cancelled(), vec![scheduled[0].identifier.clone()]);
}

#[test]
fn statuses_classify_each_entry() {
    let dir = tempfile::tempdir().unwrap();
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&roster_path(&dir), &notifier, clock);

    service
        .add_entry(&input("Late", "1", &iso(days_from_today(&clock, -1))))
        .unwrap();
    service
        .add_entry(&input("Soon", "2", &iso(days_from_today(&clock, 0))))
        .unwrap();
    service
        .add_entry(&input("Later", "3", &iso(days_from_today(&clock, 51))))
        .unwrap();

    let risks = service
        .statuses()
        .into_iter()
        .map(|status| (status.entry.name, status.days_remaining, status.risk))
        .collect::<Vec<_>>();
    assert_eq!(
        risks,
        vec![
            ("Late".to_string(), -1, ExpirationRisk::Expired),
            ("Soon".to_string(), 0, ExpirationRisk::Warning),
            ("Later".to_string(), 51, ExpirationRisk::Ok),
        ]
    );
}

#[test]
fn refresh_picks_up_external_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();
    let mut service = open_service(&path, &notifier, clock);

    let other = JsonFileRosterRepository::new(&path);
    let mut entries = other.load().unwrap();
    entries.push(cmawatch_core::RosterEntry::new(
        "Souza",
        "777",
        days_from_today(&clock, 30),
    ));
    other.save(&entries).unwrap();

    assert_eq!(service.refresh().unwrap().len(), 1);
    assert_eq!(service.entries()[0].name, "Souza");
    assert!(notifier.calls().is_empty());
}

#[test]
fn legacy_entry_ids_stay_addressable_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = roster_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let legacy = serde_json::json!([
        { "nome": "Silva", "LPNA": "12345", "vencimento": "2026-10-26" }
    ]);
    std::fs::write(&path, legacy.to_string()).unwrap();
    let clock = fixed_clock();
    let notifier = RecordingNotifier::granted();

    let listed_id = open_service(&path, &notifier, clock).entries()[0].id;

    let mut reopened = open_service(&path, &notifier, clock);
    let toggled = reopened.toggle_notifications(listed_id).unwrap();
    assert_eq!(toggled.id, listed_id);
    assert!(!toggled.notifications_enabled);

    let mut third = open_service(&path, &notifier, clock);
    third.delete_entry(listed_id).unwrap();
    assert_eq!(third.count(), 0);
}
