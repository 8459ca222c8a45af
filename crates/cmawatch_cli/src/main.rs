//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cmawatch_core` linkage.
//! - Print a read-only risk report for the configured roster file.

use cmawatch_core::{
    classify, days_remaining, Clock, CoreConfig, JsonFileRosterRepository, RosterRepository,
    SystemClock,
};

fn main() {
    println!("cmawatch_core ping={}", cmawatch_core::ping());
    println!("cmawatch_core version={}", cmawatch_core::core_version());

    let config = CoreConfig::from_env();
    let repo = JsonFileRosterRepository::new(config.roster_path());
    let scan = match repo.scan() {
        Ok(scan) => scan,
        Err(err) => {
            eprintln!("roster unreadable: {err}");
            std::process::exit(1);
        }
    };

    println!(
        "roster path={} entries={} rejected={}",
        repo.path().display(),
        scan.entries.len(),
        scan.rejected.len()
    );

    let now = SystemClock.now();
    let mut entries = scan.entries;
    entries.sort_by_key(|entry| entry.expiration_date);
    for entry in &entries {
        let days = days_remaining(entry.expiration_date, &now);
        println!(
            "{:<8} {:>5}d {} {} ({})",
            classify(days).as_str(),
            days,
            entry.expiration_date,
            entry.name,
            entry.license_id
        );
    }
}
