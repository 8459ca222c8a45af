//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Bridge OS notification and background-task calls through the host outbox.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every roster call reopens the roster file; no view is cached here.
//! - Failures come back as envelopes with `ok=false` and a message.

use cmawatch_core::links::sgpo_portal;
use cmawatch_core::model::entry::format_expiration_date;
use cmawatch_core::notify::service::FOREGROUND_PRESENTATION;
use cmawatch_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BackgroundRefreshTask, BackgroundRegistration, CoreConfig, DeliveredNotification,
    DeliveryObserver, EntryId, EntryInput, EntryStatus, HostCommand, HostOutbox,
    JsonFileRosterRepository, LoggingDeliveryObserver, NotificationError, NotificationId,
    NotificationScheduler, NotificationTrigger, PermissionStatus, RosterService,
    RosterServiceError, RosterServiceResult, SystemClock,
};
use log::error;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

const FIRE_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static HOST_OUTBOX: OnceLock<HostOutbox> = OnceLock::new();
static DATA_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

type FfiRosterService =
    RosterService<JsonFileRosterRepository, &'static HostOutbox, SystemClock>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic result envelope for calls without a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Sets the directory holding `pessoas.json`.
///
/// Overrides `CMAWATCH_DATA_DIR`. The path must be absolute.
///
/// # FFI contract
/// - Sync call; creates the directory if missing.
/// - May be called again; the last valid path wins.
/// - Never panics; failures return `ok=false` and keep the previous directory.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_data_dir(path: String) -> ActionResponse {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return ActionResponse::failure("configure_data_dir failed: path cannot be empty");
    }
    let dir = PathBuf::from(trimmed);
    if !dir.is_absolute() {
        return ActionResponse::failure(format!(
            "configure_data_dir failed: path must be absolute, got `{trimmed}`"
        ));
    }
    if let Err(err) = std::fs::create_dir_all(&dir) {
        return ActionResponse::failure(format!("configure_data_dir failed: {err}"));
    }

    *DATA_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(dir);
    ActionResponse::success("Data directory configured.")
}

/// One roster card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntryView {
    pub entry_id: String,
    pub name: String,
    pub license_id: String,
    /// `YYYY-MM-DD`.
    pub expiration_date: String,
    pub days_remaining: i64,
    /// `ok|warning|expired`.
    pub risk: String,
    /// Card badge text, if the card should be highlighted.
    pub badge: Option<String>,
    pub notifications_enabled: bool,
    /// Live reminder handle, if one is registered.
    pub notification_id: Option<String>,
    pub card_visible: bool,
}

/// Roster listing envelope, sorted by expiration date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterListResponse {
    pub ok: bool,
    pub items: Vec<RosterEntryView>,
    pub message: String,
}

/// Result envelope for add/edit/toggle/delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterActionResponse {
    pub ok: bool,
    /// Entry after the mutation; `None` on failure and after delete.
    pub entry: Option<RosterEntryView>,
    pub message: String,
}

impl RosterActionResponse {
    fn success(message: impl Into<String>, entry: Option<RosterEntryView>) -> Self {
        Self {
            ok: true,
            entry,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry: None,
            message: message.into(),
        }
    }
}

/// Lists the roster with days remaining and risk as of now.
///
/// Seeds the bundled roster on first use.
///
/// # FFI contract
/// - Sync call, file-backed execution.
/// - Never panics; storage failures return `ok=false` with empty `items`.
/// - `entry_id` values stay valid across calls and restarts.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_list() -> RosterListResponse {
    match open_roster_service() {
        Ok(service) => {
            let items = service
                .statuses()
                .into_iter()
                .map(to_entry_view)
                .collect::<Vec<_>>();
            RosterListResponse {
                ok: true,
                message: format!("{} entr(ies).", items.len()),
                items,
            }
        }
        Err(err) => {
            error!("event=ffi_roster_list module=ffi status=error error={}", err);
            RosterListResponse {
                ok: false,
                items: Vec::new(),
                message: format!("roster_list failed: {err}"),
            }
        }
    }
}

/// Number of roster entries, `0` when the roster cannot be read.
///
/// # FFI contract
/// - Sync call, file-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_count() -> u32 {
    open_roster_service()
        .map(|service| u32::try_from(service.count()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Adds an entry and schedules its reminder.
///
/// # FFI contract
/// - Sync call, file-backed execution; queues host commands.
/// - Never panics.
/// - Returns the stored entry on success; validation and storage failures
///   return `ok=false` and leave the roster unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_add(name: String, license_id: String, expiration_date: String) -> RosterActionResponse {
    let input = EntryInput {
        name,
        license_id,
        expiration_date,
    };
    let result = open_roster_service().and_then(|mut service| {
        let entry = service.add_entry(&input)?;
        Ok(status_view(&service, entry.id))
    });
    match result {
        Ok(view) => RosterActionResponse::success("Entry added.", view),
        Err(err) => action_failure("roster_add", err),
    }
}

/// Replaces name, license id and date of one entry and reschedules.
///
/// # FFI contract
/// - Sync call, file-backed execution; queues host commands.
/// - Never panics.
/// - Unknown or malformed `entry_id` returns `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_edit(
    entry_id: String,
    name: String,
    license_id: String,
    expiration_date: String,
) -> RosterActionResponse {
    let id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(message) => return RosterActionResponse::failure(message),
    };
    let input = EntryInput {
        name,
        license_id,
        expiration_date,
    };
    let result = open_roster_service().and_then(|mut service| {
        service.edit_entry(id, &input)?;
        Ok(status_view(&service, id))
    });
    match result {
        Ok(view) => RosterActionResponse::success("Entry updated.", view),
        Err(err) => action_failure("roster_edit", err),
    }
}

/// Deletes one entry and cancels its reminder.
///
/// # FFI contract
/// - Sync call, file-backed execution; queues host commands.
/// - Never panics.
/// - Returns `entry=None` on success.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_delete(entry_id: String) -> RosterActionResponse {
    let id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(message) => return RosterActionResponse::failure(message),
    };
    match open_roster_service().and_then(|mut service| service.delete_entry(id)) {
        Ok(()) => RosterActionResponse::success("Entry deleted.", None),
        Err(err) => action_failure("roster_delete", err),
    }
}

/// Flips the reminder switch of one entry.
///
/// # FFI contract
/// - Sync call, file-backed execution; queues host commands.
/// - Never panics.
/// - Turning reminders on does not schedule one.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_toggle_notifications(entry_id: String) -> RosterActionResponse {
    let id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(message) => return RosterActionResponse::failure(message),
    };
    let result = open_roster_service().and_then(|mut service| {
        service.toggle_notifications(id)?;
        Ok(status_view(&service, id))
    });
    match result {
        Ok(view) => RosterActionResponse::success("Notifications toggled.", view),
        Err(err) => action_failure("roster_toggle_notifications", err),
    }
}

/// Permission flow envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionResponse {
    pub ok: bool,
    /// `granted|denied|undetermined`.
    pub permission: String,
    pub message: String,
}

/// Runs the notification registration flow.
///
/// `ok=false` with a permission value means the user refused; the UI shows
/// its one-time alert.
///
/// # FFI contract
/// - Sync call, non-blocking; queues host commands.
/// - Never panics.
/// - Answers from the last status reported through `host_set_permission`.
#[flutter_rust_bridge::frb(sync)]
pub fn notifications_register() -> PermissionResponse {
    let scheduler = NotificationScheduler::new(host(), SystemClock);
    match scheduler.register_for_notifications() {
        Ok(status) => PermissionResponse {
            ok: true,
            permission: status.as_str().to_string(),
            message: "Notifications enabled.".to_string(),
        },
        Err(NotificationError::PermissionDenied(status)) => PermissionResponse {
            ok: false,
            permission: status.as_str().to_string(),
            message: "Notification permission not granted.".to_string(),
        },
        Err(err) => PermissionResponse {
            ok: false,
            permission: PermissionStatus::Undetermined.as_str().to_string(),
            message: format!("notifications_register failed: {err}"),
        },
    }
}

/// Records the OS permission state observed by the shell.
///
/// Unknown values are stored as `undetermined`.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics; returns the stored status label.
#[flutter_rust_bridge::frb(sync)]
pub fn host_set_permission(status: String) -> String {
    let status = PermissionStatus::parse(&status);
    host().set_permission_status(status);
    status.as_str().to_string()
}

/// Records whether the OS already holds a registration for `task_id`.
///
/// The shell calls this at startup with the OS answer, before
/// `background_register`, so a registration left by a previous process is
/// replaced instead of duplicated.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics; blank task ids are ignored and return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn host_set_task_registered(task_id: String, registered: bool) -> ActionResponse {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return ActionResponse::failure("host_set_task_registered failed: task_id cannot be empty");
    }
    host().mark_task_registered(task_id, registered);
    ActionResponse::success(format!("Task `{task_id}` registered={registered}."))
}

/// One OS action for the shell to perform, flattened for Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommandView {
    /// `request_permission|ensure_channel|schedule_notification|cancel_notification|register_task|unregister_task`.
    pub kind: String,
    pub notification_id: Option<String>,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Local wall-clock time `YYYY-MM-DDTHH:MM:SS`; `None` means present now.
    pub fire_at_local: Option<String>,
    pub repeats: bool,
    pub channel_id: Option<String>,
    pub task_id: Option<String>,
    pub minimum_interval_secs: Option<u64>,
    pub keep_alive_on_app_termination: bool,
    pub run_on_boot: bool,
}

/// Takes every pending OS action, oldest first.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics; each command is returned exactly once.
#[flutter_rust_bridge::frb(sync)]
pub fn host_drain_commands() -> Vec<HostCommandView> {
    host().drain().into_iter().map(to_command_view).collect()
}

/// Reports a notification the OS presented while the app was running.
///
/// # FFI contract
/// - Sync call, non-blocking; only logs.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn host_notification_delivered(identifier: Option<String>, title: String, body: String) {
    let notification = DeliveredNotification {
        identifier: identifier
            .filter(|value| !value.trim().is_empty())
            .map(NotificationId::new),
        title,
        body,
    };
    LoggingDeliveryObserver.on_delivered(&notification);
}

/// Registers the daily background re-check, replacing any previous one.
///
/// # FFI contract
/// - Sync call, non-blocking; queues host commands.
/// - Never panics; failures return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn background_register() -> ActionResponse {
    match BackgroundRegistration::new(host()).ensure_registered() {
        Ok(()) => ActionResponse::success("Background task registered."),
        Err(err) => ActionResponse::failure(format!("background_register failed: {err}")),
    }
}

/// Removes the daily background re-check registration.
///
/// # FFI contract
/// - Sync call, non-blocking; queues host commands only when registered.
/// - Never panics; failures return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn background_teardown() -> ActionResponse {
    match BackgroundRegistration::new(host()).teardown() {
        Ok(()) => ActionResponse::success("Background task removed."),
        Err(err) => ActionResponse::failure(format!("background_teardown failed: {err}")),
    }
}

/// Outcome of one background re-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundRunResponse {
    /// `new_data|no_data|failed`, reported to the OS as-is.
    pub result: String,
    pub scanned: u32,
    pub delivered: u32,
    pub rejected_records: u32,
    pub load_failed: bool,
}

/// Entry point for the OS background task.
///
/// # FFI contract
/// - Never seeds or writes the roster.
/// - Always returns `new_data`.
#[flutter_rust_bridge::frb(sync)]
pub fn background_refresh_run() -> BackgroundRunResponse {
    let config = resolve_config();
    let task = BackgroundRefreshTask::new(
        JsonFileRosterRepository::new(config.roster_path()),
        NotificationScheduler::new(host(), SystemClock),
    );
    let (result, report) = task.run_with_report();
    BackgroundRunResponse {
        result: result.as_str().to_string(),
        scanned: count_u32(report.scanned),
        delivered: count_u32(report.delivered),
        rejected_records: count_u32(report.rejected_records),
        load_failed: report.load_failed,
    }
}

/// How the shell presents a notification while the app is in foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationView {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

/// Foreground presentation settings for the shell's notification handler.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics; always returns the same settings.
#[flutter_rust_bridge::frb(sync)]
pub fn notification_presentation() -> PresentationView {
    let options = FOREGROUND_PRESENTATION;
    PresentationView {
        show_alert: options.show_alert,
        play_sound: options.play_sound,
        set_badge: options.set_badge,
    }
}

/// SGPO portal link opened from the home screen.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never panics; returns an empty string if the link cannot be parsed.
#[flutter_rust_bridge::frb(sync)]
pub fn portal_url() -> String {
    match sgpo_portal() {
        Ok(url) => url.to_string(),
        Err(err) => {
            error!("event=ffi_portal_url module=ffi status=error error={}", err);
            String::new()
        }
    }
}

fn host() -> &'static HostOutbox {
    HOST_OUTBOX.get_or_init(HostOutbox::new)
}

fn resolve_config() -> CoreConfig {
    let configured = DATA_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone();
    match configured {
        Some(dir) => CoreConfig::new(dir),
        None => CoreConfig::from_env(),
    }
}

fn open_roster_service() -> RosterServiceResult<FfiRosterService> {
    let config = resolve_config();
    RosterService::open(
        JsonFileRosterRepository::new(config.roster_path()),
        NotificationScheduler::new(host(), SystemClock),
    )
}

fn parse_entry_id(raw: &str) -> Result<EntryId, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid entry_id `{raw}`: {err}"))
}

fn status_view(service: &FfiRosterService, id: EntryId) -> Option<RosterEntryView> {
    service
        .statuses()
        .into_iter()
        .find(|status| status.entry.id == id)
        .map(to_entry_view)
}

fn action_failure(operation: &str, err: RosterServiceError) -> RosterActionResponse {
    error!(
        "event=ffi_{} module=ffi status=error error={}",
        operation, err
    );
    RosterActionResponse::failure(format!("{operation} failed: {err}"))
}

fn to_entry_view(status: EntryStatus) -> RosterEntryView {
    let EntryStatus {
        entry,
        days_remaining,
        risk,
    } = status;
    RosterEntryView {
        entry_id: entry.id.to_string(),
        expiration_date: format_expiration_date(entry.expiration_date),
        days_remaining,
        risk: risk.as_str().to_string(),
        badge: risk.badge().map(str::to_string),
        notifications_enabled: entry.notifications_enabled,
        notification_id: entry
            .schedule
            .notification_id()
            .map(|id| id.as_str().to_string()),
        card_visible: entry.card_visible,
        name: entry.name,
        license_id: entry.license_id,
    }
}

fn to_command_view(command: HostCommand) -> HostCommandView {
    let mut view = HostCommandView {
        kind: command.kind().to_string(),
        notification_id: None,
        title: None,
        body: None,
        fire_at_local: None,
        repeats: false,
        channel_id: None,
        task_id: None,
        minimum_interval_secs: None,
        keep_alive_on_app_termination: false,
        run_on_boot: false,
    };
    match command {
        HostCommand::RequestPermission => {}
        HostCommand::EnsureChannel(channel) => view.channel_id = Some(channel.id),
        HostCommand::ScheduleNotification(request) => {
            view.notification_id = Some(request.identifier.as_str().to_string());
            view.title = Some(request.content.title);
            view.body = Some(request.content.body);
            if let NotificationTrigger::At { fire_at, repeats } = request.trigger {
                view.fire_at_local = Some(fire_at.format(FIRE_AT_FORMAT).to_string());
                view.repeats = repeats;
            }
        }
        HostCommand::CancelNotification(id) => {
            view.notification_id = Some(id.as_str().to_string());
        }
        HostCommand::RegisterTask { task_id, options } => {
            view.task_id = Some(task_id);
            view.minimum_interval_secs = Some(options.minimum_interval_secs);
            view.keep_alive_on_app_termination = options.keep_alive_on_app_termination;
            view.run_on_boot = options.run_on_boot;
        }
        HostCommand::UnregisterTask { task_id } => view.task_id = Some(task_id),
    }
    view
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
