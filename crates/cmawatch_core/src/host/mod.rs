//! Host runtime bridge.
//!
//! The core decides which OS actions are needed; the mobile shell executes
//! them. `HostOutbox` implements the notification and background-task
//! collaborators by queueing commands the shell drains after each call.

pub mod outbox;
