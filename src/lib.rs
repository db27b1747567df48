//! helpline - community emergency help requests
//!
//! A user posts a request for help at a location, volunteers announce they
//! are on the way, and the author marks the request completed, which credits
//! every volunteer who responded.
//!
//! # Core Concepts
//!
//! - **Help posts**: open until their author completes them
//! - **Responses**: one per (post, volunteer), `on_the_way` then `completed`
//! - **Stats**: a completed-help counter per volunteer, ranked on a leaderboard
//! - **Notifications**: per-user inbox fed by new posts, responses and completions
//! - **Stations**: a static directory of emergency stations by category
//!
//! # Module Organization
//!
//! - `desk`: [`HelpDesk`], the operation surface
//! - `lifecycle`: post state machine and guards
//! - `notify`: notification emitter
//! - `stats`: counters and leaderboard
//! - `query`: read projections and search
//! - `users`: user directory
//! - `stations`: station directory
//! - `model`: persisted entities and validation
//! - `db`: in-memory tables and constraints
//! - `storage`: home directory and unit of work
//! - `lock`: file locking and atomic writes
//! - `config`: configuration loading from `helpline.toml`
//! - `actor`: acting-user resolution
//! - `events`: JSONL event stream
//! - `output`: CLI output envelopes
//! - `cli`: command-line interface using clap

pub mod actor;
pub mod cli;
pub mod config;
pub mod db;
pub mod desk;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod lock;
pub mod model;
pub mod notify;
pub mod output;
pub mod query;
pub mod stations;
pub mod stats;
pub mod storage;
pub mod users;

pub use desk::HelpDesk;
pub use error::{Error, Result};
