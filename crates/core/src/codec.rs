//! Validating decoders for the two client-held tokens.
//!
//! Both tokens arrive from an untrusted client on every request. Decoding never
//! fails: anything absent, unparseable or of the wrong shape is repaired to a
//! known-good value and logged.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::model::{LogEntry, PersistentRecord, QuestionId, QuizSession};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

//
// ─── PERSISTENT RECORD ─────────────────────────────────────────────────────────
//

/// Encodes and repairs the durable `{wrong_list, logs}` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordCodec {
    log_cap: usize,
}

impl RecordCodec {
    #[must_use]
    pub fn new(log_cap: usize) -> Self {
        Self { log_cap }
    }

    #[must_use]
    pub fn log_cap(&self) -> usize {
        self.log_cap
    }

    /// Compact JSON form of `record`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Json` if serialization fails.
    pub fn encode(&self, record: &PersistentRecord) -> Result<String, CodecError> {
        Ok(serde_json::to_string(record)?)
    }

    /// Decodes a token, repairing each part independently.
    ///
    /// A token that is not a JSON object yields the empty record. Inside an
    /// object, a `wrong_list` or `logs` key that is missing or not an array is
    /// reset to empty, non-string IDs and malformed log entries are dropped,
    /// and the log is cut to the newest `log_cap` entries.
    #[must_use]
    pub fn decode(&self, token: Option<&str>) -> PersistentRecord {
        let Some(raw) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return PersistentRecord::default();
        };

        let map = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("record token is not an object; resetting");
                return PersistentRecord::default();
            }
            Err(err) => {
                warn!(error = %err, "record token is not valid JSON; resetting");
                return PersistentRecord::default();
            }
        };

        let wrong_ids: Vec<QuestionId> = match map.get("wrong_list") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(QuestionId::new)
                .collect(),
            other => {
                if other.is_some() {
                    warn!("record wrong_list has the wrong shape; resetting it");
                }
                Vec::new()
            }
        };

        let logs: Vec<LogEntry> = match map.get("logs") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            other => {
                if other.is_some() {
                    warn!("record logs have the wrong shape; resetting them");
                }
                Vec::new()
            }
        };

        PersistentRecord::new(wrong_ids, logs, self.log_cap)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Encodes and repairs the session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCodec;

impl SessionCodec {
    /// Compact JSON form of `session`.
    ///
    /// # Errors
    ///
    /// Returns `CodecError::Json` if serialization fails.
    pub fn encode(&self, session: &QuizSession) -> Result<String, CodecError> {
        Ok(serde_json::to_string(session)?)
    }

    /// Decodes a token; anything unusable becomes the empty session.
    #[must_use]
    pub fn decode(&self, token: Option<&str>) -> QuizSession {
        let Some(raw) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return QuizSession::default();
        };
        match serde_json::from_str::<QuizSession>(raw) {
            Ok(session) if session.is_consistent() => session,
            Ok(_) => {
                warn!("session token is inconsistent; discarding");
                QuizSession::default()
            }
            Err(err) => {
                warn!(error = %err, "session token is unreadable; discarding");
                QuizSession::default()
            }
        }
    }
}
