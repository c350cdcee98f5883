//! Client-held state threaded through every quiz operation.
//!
//! The quiz keeps no server-side session. Each call receives the two tokens
//! the client presented and answers with a [`Response`] naming the next screen
//! and the cookie writes the client must apply.

use chrono::{DateTime, Duration, Utc};
use storage::repository::{Cookie, CookieJar, StorageError};

/// Durable record cookie: wrong-answer set plus activity log.
pub const RECORD_COOKIE: &str = "quiz_storage";

/// Per-quiz session cookie.
pub const SESSION_COOKIE: &str = "quiz_session";

pub const RECORD_MAX_AGE_DAYS: i64 = 365;

/// Tokens presented by the client on one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub record_token: Option<String>,
    pub session_token: Option<String>,
}

impl ClientContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(mut self, token: impl Into<String>) -> Self {
        self.record_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Read both tokens from a cookie jar.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the jar cannot be read.
    pub async fn from_jar(jar: &dyn CookieJar, now: DateTime<Utc>) -> Result<Self, StorageError> {
        Ok(Self {
            record_token: jar.get(RECORD_COOKIE, now).await?,
            session_token: jar.get(SESSION_COOKIE, now).await?,
        })
    }

    /// Apply cookie writes the way a client would before its next request.
    pub fn absorb(&mut self, updates: &[CookieUpdate]) {
        for update in updates {
            let value = match update {
                CookieUpdate::Set(cookie) => Some(cookie.value.clone()),
                CookieUpdate::Remove(_) => None,
            };
            match update.name() {
                RECORD_COOKIE => self.record_token = value,
                SESSION_COOKIE => self.session_token = value,
                _ => {}
            }
        }
    }
}

//
// ─── RESPONSE ──────────────────────────────────────────────────────────────────
//

/// Screen the client should show next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Study,
    Result,
}

/// Soft outcome worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The selection matched no questions; no session was started.
    NoQuestions,
    /// The request referred to a session that no longer exists.
    StaleRequest,
}

/// A cookie write the client must apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieUpdate {
    Set(Cookie),
    Remove(String),
}

impl CookieUpdate {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CookieUpdate::Set(cookie) => &cookie.name,
            CookieUpdate::Remove(name) => name,
        }
    }

    #[must_use]
    pub fn record(value: impl Into<String>) -> Self {
        Self::Set(
            Cookie::new(RECORD_COOKIE, value).with_max_age(Duration::days(RECORD_MAX_AGE_DAYS)),
        )
    }

    #[must_use]
    pub fn session(value: impl Into<String>) -> Self {
        Self::Set(Cookie::new(SESSION_COOKIE, value))
    }

    #[must_use]
    pub fn clear_session() -> Self {
        Self::Remove(SESSION_COOKIE.to_string())
    }
}

/// Outcome of one control-surface call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub route: Route,
    pub cookies: Vec<CookieUpdate>,
    pub notice: Option<Notice>,
}

impl Response {
    #[must_use]
    pub fn redirect(route: Route) -> Self {
        Self {
            route,
            cookies: Vec::new(),
            notice: None,
        }
    }

    #[must_use]
    pub fn with_cookie(mut self, update: CookieUpdate) -> Self {
        self.cookies.push(update);
        self
    }

    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Write the cookie updates into a jar.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the jar cannot be written.
    pub async fn apply(&self, jar: &dyn CookieJar, now: DateTime<Utc>) -> Result<(), StorageError> {
        for update in &self.cookies {
            match update {
                CookieUpdate::Set(cookie) => jar.set(cookie, now).await?,
                CookieUpdate::Remove(name) => jar.remove(name).await?,
            }
        }
        Ok(())
    }
}
