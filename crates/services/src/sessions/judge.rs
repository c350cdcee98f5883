use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use quiz_core::model::{FeedbackResult, LogEntry, PersistentRecord, QuizSession, QuizSettings};
use quiz_core::time::{day_label, local_date};

use crate::error::SessionError;

/// Everything a judged answer changes.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeOutcome {
    pub feedback: FeedbackResult,
    pub record: PersistentRecord,
    pub session: QuizSession,
}

/// Judges the session head and folds the verdict into the durable record.
#[derive(Debug, Clone, Copy)]
pub struct AnswerJudge {
    log_cap: usize,
    offset: FixedOffset,
}

impl AnswerJudge {
    #[must_use]
    pub fn new(settings: &QuizSettings) -> Self {
        Self {
            log_cap: settings.log_cap(),
            offset: settings.utc_offset(),
        }
    }

    /// Judge `submitted` against the head of `session`.
    ///
    /// On success the wrong-answer set and log in the returned record are
    /// already updated; the caller must persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Desync` when there is no head to judge or
    /// feedback is still pending.
    pub fn judge(
        &self,
        mut session: QuizSession,
        submitted: &str,
        mut record: PersistentRecord,
        now: DateTime<Utc>,
    ) -> Result<JudgeOutcome, SessionError> {
        if session.pending_feedback().is_some() {
            return Err(SessionError::Desync);
        }
        let head = session.head().ok_or(SessionError::Desync)?;
        let correct = head.is_correct(submitted);
        let id = head.id().clone();
        let category = head.category().to_string();

        if correct {
            record.clear_wrong(&id);
        } else {
            record.mark_wrong(&id);
        }
        let date = day_label(local_date(now, self.offset));
        record.append_log(LogEntry::new(date, category, correct), self.log_cap);

        let feedback = session
            .complete_head(correct)
            .cloned()
            .ok_or(SessionError::Desync)?;
        debug!(%id, correct, index = feedback.index, "answer judged");

        Ok(JudgeOutcome {
            feedback,
            record,
            session,
        })
    }
}
