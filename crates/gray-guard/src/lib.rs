//! Gray Guard
//!
//! Metric gate for staged (gray) traffic ramps. Fetches the configured
//! metric thresholds and a live dashboard snapshot from the admin ops API
//! and decides whether the ramp may continue.
//!
//! # Exit status contract
//! - 0: metrics pass
//! - 1: the gate could not be evaluated (transport, HTTP, envelope or payload failure)
//! - 2: at least one observed metric breached its limit
//!
//! # Design Principles
//! - Fail open on missing telemetry: an unknown reading never breaches
//! - Fail closed on observed breaches
//! - Deterministic: identical inputs give identical violation lists
//!
//! ## Example
//!
//! ```rust,no_run
//! use gray_guard::runner::{GuardOptions, GuardRunner};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = GuardOptions::new("http://127.0.0.1:5231").with_group_id("A");
//!     let outcome = GuardRunner::new().run(&options).await;
//!     print!("{}", outcome.stdout);
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

pub mod cli;
pub mod client;
pub mod engine;
pub mod error;
pub mod runner;
pub mod telemetry;

// Contracts module - located at ../contracts relative to src/
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use cli::{GuardCli, OutputFormat};
pub use client::{OpsClient, SnapshotQuery};
pub use contracts::{
    GuardDecision, GuardStatus, Metric, MetricsSnapshot, Reading, ThresholdSet, Violation,
};
pub use engine::evaluate;
pub use error::GuardError;
pub use runner::{GuardOptions, GuardOutcome, GuardRunner};
pub use telemetry::GuardMetrics;
