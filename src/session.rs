//! The current job, kept between CLI invocations as a JSON file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::state_machine::AssignmentJob;

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The saved job, or a fresh one in `Input` when no session exists yet.
    ///
    /// The cap from the current configuration always wins over the saved one.
    pub fn load_or_new(&self, max_revisions: u32) -> Result<AssignmentJob> {
        if !self.path.exists() {
            return Ok(AssignmentJob::new(max_revisions));
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session {}", self.path.display()))?;
        let mut job: AssignmentJob = serde_json::from_str(&content)
            .with_context(|| format!("corrupt session file {}", self.path.display()))?;
        job.max_revisions = max_revisions.max(1);

        debug!(job = %job.id, stage = %job.stage, "session loaded");
        Ok(job)
    }

    pub fn save(&self, job: &AssignmentJob) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(job)?;
        // Write beside the target, then swap, so a crash never leaves half a session.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .with_context(|| format!("failed to write session {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace session {}", self.path.display()))?;

        debug!(job = %job.id, path = %self.path.display(), "session saved");
        Ok(())
    }
}
