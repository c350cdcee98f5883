use tracing::debug;

use quiz_core::model::{CategorySelector, PersistentRecord, Question, QuizMode, QuizSession};
use storage::repository::QuestionBank;

use super::plan::SessionBuilder;
use crate::error::SessionError;

/// Parameters of a start-session request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub mode: QuizMode,
    pub category: CategorySelector,
    /// `None` uses the configured default.
    pub count: Option<usize>,
    /// Review mode ignores `mode` and `category`.
    pub review: bool,
}

impl Default for StartRequest {
    fn default() -> Self {
        Self {
            mode: QuizMode::Fill,
            category: CategorySelector::All,
            count: None,
            review: false,
        }
    }
}

impl StartRequest {
    /// Build a request from raw form-like inputs.
    ///
    /// Unknown modes fall back to fill, blank categories to all, and counts
    /// that are missing, unparseable or zero to the configured default.
    #[must_use]
    pub fn from_raw(
        mode: Option<&str>,
        category: Option<&str>,
        count: Option<&str>,
        review: bool,
    ) -> Self {
        Self {
            mode: mode.and_then(|m| m.parse().ok()).unwrap_or(QuizMode::Fill),
            category: CategorySelector::parse(category.unwrap_or_default()),
            count: count
                .and_then(|c| c.trim().parse::<usize>().ok())
                .filter(|c| *c > 0),
            review,
        }
    }
}

/// Storage-backed pool building and session creation.
pub(crate) struct SessionQueries;

impl SessionQueries {
    /// Candidate pool for a request, before sampling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the bank is unusable.
    pub async fn candidate_pool(
        bank: &dyn QuestionBank,
        request: &StartRequest,
        record: &PersistentRecord,
    ) -> Result<Vec<Question>, SessionError> {
        if request.review {
            let mut pool = Vec::new();
            for mode in QuizMode::ALL {
                let loaded = bank.load(mode, None).await?;
                pool.extend(loaded.into_iter().filter(|q| record.is_wrong(q.id())));
            }
            return Ok(pool);
        }

        let resolution = request.category.resolve();
        let loaded = bank.load(request.mode, resolution.partition()).await?;
        Ok(loaded
            .into_iter()
            .filter(|q| resolution.admits(q.category()))
            .collect())
    }

    /// Build a fresh session for `request`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptySelection` when no question matches, or
    /// `SessionError::Storage` when the bank is unusable.
    pub async fn start_from_bank(
        bank: &dyn QuestionBank,
        request: &StartRequest,
        record: &PersistentRecord,
        default_count: usize,
        shuffle: bool,
    ) -> Result<QuizSession, SessionError> {
        let pool = Self::candidate_pool(bank, request, record).await?;
        let plan = SessionBuilder::new(request.count.unwrap_or(default_count))
            .with_shuffle(shuffle)
            .build(pool);
        debug!(
            pool = plan.pool_size,
            selected = plan.total(),
            review = request.review,
            "session plan built"
        );
        QuizSession::start(plan.questions).ok_or(SessionError::EmptySelection)
    }
}
