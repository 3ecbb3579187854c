//! Gray Drill
//!
//! End-to-end rehearsal of the gray-release metric guard. Serves canned
//! ops data from an in-process stub host, runs the guard for every ramp
//! stage and for an injected fault, and renders an audit report.
//!
//! The drill passes only when every ramp stage exits 0 and the rollback
//! stage exits 2.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gray_drill::{render_markdown, DrillHarness, StagePlan, DEFAULT_EXCERPT_LINES};
//!
//! #[tokio::main]
//! async fn main() {
//!     let report = DrillHarness::new(StagePlan::builtin()).run().await.unwrap();
//!     println!("{}", render_markdown(&report, DEFAULT_EXCERPT_LINES));
//! }
//! ```

pub mod drill;
pub mod error;
pub mod plan;
pub mod report;
pub mod stub;

pub use drill::{DrillConfig, DrillHarness, DrillPhase, DrillReport, StageResult};
pub use error::DrillError;
pub use plan::{RampStage, RollbackStage, StagePlan, StageSnapshot, ThresholdLimits};
pub use report::{render_markdown, write_report, DEFAULT_EXCERPT_LINES};
pub use stub::StubHost;
