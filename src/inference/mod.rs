//! Inference jobs submitted through `POST /run`.
//!
//! # Data Flow
//! ```text
//! {"type": "file", "input": dir, "output": dir}
//!     → job.rs (validate)
//!     → files.rs (input files → base64 instances)
//!     → ModelBackend::predict
//!     → files.rs (predictions → output/results.json)
//! ```

pub mod files;
pub mod job;

pub use job::{JobError, JobOutcome, JobType, RunJob, RESULTS_FILE};
