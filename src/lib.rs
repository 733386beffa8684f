//! Swipe-style movie matching client.
//!
//! The [`engine`] module holds the session core (prefetching, decision
//! dispatch, retries and the session state machine); [`backend`] speaks the
//! server's HTTP API; [`pairing`] covers partner connections and matches.

pub mod backend;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod pairing;
pub mod ui;
