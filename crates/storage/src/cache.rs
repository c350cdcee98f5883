use async_trait::async_trait;
use quiz_core::model::{Partition, Question, QuizMode};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::repository::{QuestionBank, StorageError};

type CacheKey = (QuizMode, Option<Partition>);

/// Load-once wrapper: each `(mode, partition)` scan hits the inner bank a single time.
///
/// Sources are treated as static for the lifetime of the process.
pub struct CachedQuestionBank<B> {
    inner: B,
    cache: Mutex<HashMap<CacheKey, Vec<Question>>>,
}

impl<B: QuestionBank> CachedQuestionBank<B> {
    #[must_use]
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn cached(&self, key: CacheKey) -> Result<Option<Vec<Question>>, StorageError> {
        let guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&key).cloned())
    }

    fn store(&self, key: CacheKey, questions: Vec<Question>) -> Result<(), StorageError> {
        let mut guard = self
            .cache
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key, questions);
        Ok(())
    }
}

#[async_trait]
impl<B: QuestionBank> QuestionBank for CachedQuestionBank<B> {
    async fn load(
        &self,
        mode: QuizMode,
        partition: Option<Partition>,
    ) -> Result<Vec<Question>, StorageError> {
        let key = (mode, partition);
        if let Some(hit) = self.cached(key)? {
            return Ok(hit);
        }
        let loaded = self.inner.load(mode, partition).await?;
        debug!(%mode, ?partition, count = loaded.len(), "question bank loaded");
        self.store(key, loaded.clone())?;
        Ok(loaded)
    }
}
