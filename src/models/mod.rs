//! Domain models for TaskPulse.
//!
//! # Core Concepts
//!
//! - [`User`]: An account in the tracker. Roles form a hierarchy; workers
//!   interact through the Telegram bot only and cannot sign in to a client.
//! - [`Task`]: A unit of work with a lifecycle status, optional due date, and
//!   the poll responses collected by the reminder scheduler.
//! - [`PollResponse`]: A timestamped record of an assignee's reply (or
//!   non-reply) to an automated reminder. Immutable once recorded.
//! - [`Workgroup`]: A named group of users that tasks can be scoped to.
//!
//! Status and role enums are exhaustive with total `label()` mappings, so a
//! new variant cannot silently fall through to a default display string.

mod task;
mod user;
mod workgroup;

pub use task::*;
pub use user::*;
pub use workgroup::*;
