//! Client library for the TaskPulse task tracker.
//!
//! The interesting parts live in [`session`] (race-safe token lifecycle over
//! a durable credential store) and [`timeline`] (deterministic layout of poll
//! responses onto a fixed-geometry progress bar). [`client`] is the HTTP
//! surface, [`models`] the wire types.

pub mod client;
pub mod models;
pub mod session;
pub mod timeline;
