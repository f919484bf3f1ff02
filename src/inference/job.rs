//! `/run` job description and execution.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{BackendError, ModelBackend, PredictRequest};
use crate::inference::files;

/// Name of the file written into the job's output directory.
pub const RESULTS_FILE: &str = "results.json";

/// Errors raised while running a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The job description is unusable.
    #[error("invalid job: {0}")]
    Invalid(String),

    /// Reading inputs or writing results failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The model server call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl JobError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        JobError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Kind of job. Only file jobs are supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    File,
    #[serde(other)]
    Unsupported,
}

/// Body of `POST /run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunJob {
    #[serde(rename = "type")]
    pub job_type: JobType,
    /// Directory holding the input files.
    pub input: PathBuf,
    /// Directory receiving `results.json`.
    pub output: PathBuf,
}

/// What a finished job produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub inputs: usize,
    pub predictions: usize,
    pub results_path: PathBuf,
}

impl RunJob {
    /// Reject jobs that cannot run before touching the filesystem.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.job_type != JobType::File {
            return Err(JobError::Invalid("only 'file' jobs are supported".into()));
        }
        if self.input.as_os_str().is_empty() {
            return Err(JobError::Invalid("'input' must not be empty".into()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(JobError::Invalid("'output' must not be empty".into()));
        }
        Ok(())
    }

    /// Read the inputs, run the prediction and write the results.
    pub async fn execute(&self, backend: &dyn ModelBackend) -> Result<JobOutcome, JobError> {
        self.validate()?;

        let instances = files::read_inputs(&self.input).await?;
        let inputs = instances.len();

        let response = backend.predict(PredictRequest { instances }).await?;
        let predictions = response.predictions.len();

        let results_path = self.output.join(RESULTS_FILE);
        files::write_results(&self.output, &results_path, response.predictions).await?;

        Ok(JobOutcome {
            inputs,
            predictions,
            results_path,
        })
    }
}
