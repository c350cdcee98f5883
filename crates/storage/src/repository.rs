use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{Partition, Question, QuizMode};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::cache::CachedQuestionBank;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// Source of normalized questions.
///
/// `partition` only narrows the scan; callers still filter by category label.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Load every question of `mode`, optionally restricted to one partition.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend as a whole is unusable;
    /// individual bad sources are skipped.
    async fn load(
        &self,
        mode: QuizMode,
        partition: Option<Partition>,
    ) -> Result<Vec<Question>, StorageError>;
}

/// In-memory question bank for tests and prototyping.
///
/// A question's mode comes from its ID prefix and its partition from its
/// category, mirroring the directory layout of the CSV bank.
#[derive(Clone, Default)]
pub struct InMemoryQuestionBank {
    questions: Arc<Mutex<Vec<Question>>>,
    loads: Arc<AtomicUsize>,
}

impl InMemoryQuestionBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: Arc::new(Mutex::new(questions.into_iter().collect())),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn insert(&self, question: Question) -> Result<(), StorageError> {
        self.questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .push(question);
        Ok(())
    }

    /// Number of `load` calls served so far.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionBank for InMemoryQuestionBank {
    async fn load(
        &self,
        mode: QuizMode,
        partition: Option<Partition>,
    ) -> Result<Vec<Question>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|q| q.mode() == Some(mode))
            .filter(|q| partition.is_none_or(|p| Partition::of_category(q.category()) == Some(p)))
            .cloned()
            .collect())
    }
}

//
// ─── COOKIE JAR ────────────────────────────────────────────────────────────────
//

/// A client-held token as the client stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: String,
    /// `None` keeps the cookie until it is removed.
    pub max_age: Option<Duration>,
}

impl Cookie {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
        }
    }

    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.max_age.and_then(|age| now.checked_add_signed(age))
    }
}

/// Client-side store for the opaque tokens the quiz hands out.
#[async_trait]
pub trait CookieJar: Send + Sync {
    /// Value of an unexpired cookie.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the jar cannot be read.
    async fn get(&self, name: &str, now: DateTime<Utc>) -> Result<Option<String>, StorageError>;

    /// Store or replace a cookie.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the jar cannot be written.
    async fn set(&self, cookie: &Cookie, now: DateTime<Utc>) -> Result<(), StorageError>;

    /// Drop a cookie. Removing an absent cookie is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the jar cannot be written.
    async fn remove(&self, name: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

/// In-memory cookie jar for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryCookieJar {
    cookies: Arc<Mutex<HashMap<String, StoredCookie>>>,
}

impl InMemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CookieJar for InMemoryCookieJar {
    async fn get(&self, name: &str, now: DateTime<Utc>) -> Result<Option<String>, StorageError> {
        let mut guard = self
            .cookies
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let expired = guard
            .get(name)
            .is_some_and(|c| c.expires_at.is_some_and(|at| at <= now));
        if expired {
            guard.remove(name);
            return Ok(None);
        }
        Ok(guard.get(name).map(|c| c.value.clone()))
    }

    async fn set(&self, cookie: &Cookie, now: DateTime<Utc>) -> Result<(), StorageError> {
        let mut guard = self
            .cookies
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            cookie.name.clone(),
            StoredCookie {
                value: cookie.value.clone(),
                expires_at: cookie.expires_at(now),
            },
        );
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let mut guard = self
            .cookies
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(name);
        Ok(())
    }
}

//
// ─── STORAGE ───────────────────────────────────────────────────────────────────
//

/// Aggregates the question bank and cookie jar behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionBank>,
    pub cookies: Arc<dyn CookieJar>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(bank: InMemoryQuestionBank) -> Self {
        let questions: Arc<dyn QuestionBank> = Arc::new(CachedQuestionBank::new(bank));
        let cookies: Arc<dyn CookieJar> = Arc::new(InMemoryCookieJar::new());
        Self { questions, cookies }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use quiz_core::time::fixed_now;

    fn question(id: &str, category: &str) -> Question {
        Question::new(QuestionId::new(id), category, "Q", "A", None, Vec::new())
    }

    #[tokio::test]
    async fn in_memory_bank_filters_by_mode_and_partition() {
        let bank = InMemoryQuestionBank::with_questions([
            question("f_a_0", "理論"),
            question("f_a_1", "直流機"),
            question("o_a_0", "理論"),
            question("f_b_0", "電力"),
        ]);

        let all_fill = bank.load(QuizMode::Fill, None).await.unwrap();
        assert_eq!(all_fill.len(), 3);

        let theory = bank.load(QuizMode::Fill, Some(Partition::Theory)).await.unwrap();
        assert_eq!(theory.len(), 1);
        assert_eq!(theory[0].id().as_str(), "f_a_0");

        let ox = bank.load(QuizMode::Ox, None).await.unwrap();
        assert_eq!(ox.len(), 1);
        assert_eq!(bank.load_count(), 3);
    }

    #[tokio::test]
    async fn cookie_expires_after_max_age() {
        let jar = InMemoryCookieJar::new();
        let now = fixed_now();
        let cookie = Cookie::new("quiz_storage", "{}").with_max_age(Duration::days(1));
        jar.set(&cookie, now).await.unwrap();

        assert_eq!(jar.get("quiz_storage", now).await.unwrap().as_deref(), Some("{}"));
        let later = now + Duration::days(2);
        assert_eq!(jar.get("quiz_storage", later).await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_cookie_persists_until_removed() {
        let jar = InMemoryCookieJar::new();
        let now = fixed_now();
        jar.set(&Cookie::new("quiz_session", "s"), now).await.unwrap();
        let far = now + Duration::days(3650);
        assert_eq!(jar.get("quiz_session", far).await.unwrap().as_deref(), Some("s"));

        jar.remove("quiz_session").await.unwrap();
        jar.remove("quiz_session").await.unwrap();
        assert_eq!(jar.get("quiz_session", now).await.unwrap(), None);
    }
}
