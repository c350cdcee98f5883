use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

//
// ─── LOG ENTRY ─────────────────────────────────────────────────────────────────
//

/// One judged answer in the activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// `MM/DD` in the study time zone.
    pub date: String,
    #[serde(rename = "cat")]
    pub category: String,
    pub correct: bool,
}

impl LogEntry {
    #[must_use]
    pub fn new(date: impl Into<String>, category: impl Into<String>, correct: bool) -> Self {
        Self {
            date: date.into(),
            category: category.into(),
            correct,
        }
    }
}

//
// ─── PERSISTENT RECORD ─────────────────────────────────────────────────────────
//

/// Client-held durable record: the wrong-answer set and a bounded activity log.
///
/// `wrong_ids` keeps insertion order for a stable wire form but has set
/// semantics: an ID appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PersistentRecord {
    #[serde(rename = "wrong_list")]
    wrong_ids: Vec<QuestionId>,
    logs: Vec<LogEntry>,
}

impl PersistentRecord {
    /// Builds a record, dropping duplicate IDs and keeping the newest `log_cap` entries.
    #[must_use]
    pub fn new(
        wrong_ids: impl IntoIterator<Item = QuestionId>,
        logs: Vec<LogEntry>,
        log_cap: usize,
    ) -> Self {
        let mut record = Self::default();
        for id in wrong_ids {
            record.mark_wrong(&id);
        }
        record.logs = logs;
        record.truncate_logs(log_cap);
        record
    }

    #[must_use]
    pub fn wrong_ids(&self) -> &[QuestionId] {
        &self.wrong_ids
    }

    #[must_use]
    pub fn wrong_count(&self) -> usize {
        self.wrong_ids.len()
    }

    #[must_use]
    pub fn is_wrong(&self, id: &QuestionId) -> bool {
        self.wrong_ids.contains(id)
    }

    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Adds `id` to the wrong set. Returns false if it was already present.
    pub fn mark_wrong(&mut self, id: &QuestionId) -> bool {
        if self.is_wrong(id) {
            return false;
        }
        self.wrong_ids.push(id.clone());
        true
    }

    /// Removes `id` from the wrong set. Removing an absent ID is a no-op.
    pub fn clear_wrong(&mut self, id: &QuestionId) -> bool {
        let before = self.wrong_ids.len();
        self.wrong_ids.retain(|existing| existing != id);
        before != self.wrong_ids.len()
    }

    /// Appends an entry, evicting the oldest so that at most `log_cap` remain.
    pub fn append_log(&mut self, entry: LogEntry, log_cap: usize) {
        self.logs.push(entry);
        self.truncate_logs(log_cap);
    }

    fn truncate_logs(&mut self, log_cap: usize) {
        if self.logs.len() > log_cap {
            let excess = self.logs.len() - log_cap;
            self.logs.drain(..excess);
        }
    }
}
