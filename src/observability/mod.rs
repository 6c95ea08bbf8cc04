// Observability module
// Append-only JSONL log of every answered query


use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::Result;

/// One logged query/response/context triple. Records are append-only and
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionRecord {
    /// ISO-8601 timestamp with timezone.
    pub timestamp: DateTime<Utc>,
    pub user_query: String,
    /// Retrieved passage texts, in retrieval order.
    pub retrieved_context: Vec<String>,
    pub agent_response: String,
}

/// Appends interaction records to a newline-delimited JSON file.
///
/// The file is opened in append mode for each write, so concurrent readers
/// never hold the log hostage. No rotation and no size bound; growth is
/// unbounded by design.
pub struct InteractionLogger {
    log_path: PathBuf,
}

impl InteractionLogger {
    /// Create a logger, ensuring the log's parent directory exists.
    #[inline]
    pub fn new<P: Into<PathBuf>>(log_path: P) -> Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        Ok(Self { log_path })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Append one record for a successfully answered query.
    #[inline]
    pub fn log(
        &self,
        user_query: &str,
        retrieved_context: &[String],
        agent_response: &str,
    ) -> Result<()> {
        let record = InteractionRecord {
            timestamp: Utc::now(),
            user_query: user_query.to_string(),
            retrieved_context: retrieved_context.to_vec(),
            agent_response: agent_response.to_string(),
        };
        self.append(&record)
    }

    #[inline]
    pub fn append(&self, record: &InteractionRecord) -> Result<()> {
        let line =
            serde_json::to_string(record).context("Failed to serialize interaction record")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open log file: {}", self.log_path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to log file: {}", self.log_path.display()))?;

        debug!("Logged interaction to {}", self.log_path.display());
        Ok(())
    }
}
