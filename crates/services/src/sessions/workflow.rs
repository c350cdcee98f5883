use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::model::{PersistentRecord, QuizSession, QuizSettings, SessionState};
use quiz_core::{RecordCodec, SessionCodec};
use storage::repository::QuestionBank;

use super::judge::AnswerJudge;
use super::queries::{SessionQueries, StartRequest};
use super::view::{FeedbackView, QuestionView, ResultView};
use crate::Clock;
use crate::context::{ClientContext, CookieUpdate, Notice, Response, Route};
use crate::error::SessionError;

/// What the study screen shows for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyScreen {
    Question(QuestionView),
    Feedback(FeedbackView),
    /// Nothing to show here; go elsewhere.
    Redirect(Route),
}

/// The quiz control surface: start, study, submit, advance, result, home.
///
/// Every call decodes the client's tokens afresh and returns the cookie
/// writes that carry the new state back.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    bank: Arc<dyn QuestionBank>,
    shuffle: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, settings: QuizSettings, bank: Arc<dyn QuestionBank>) -> Self {
        Self {
            clock,
            settings,
            bank,
            shuffle: true,
        }
    }

    /// Enable or disable shuffling of selections and choices.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    fn record_codec(&self) -> RecordCodec {
        RecordCodec::new(self.settings.log_cap())
    }

    fn record(&self, ctx: &ClientContext) -> PersistentRecord {
        self.record_codec().decode(ctx.record_token.as_deref())
    }

    fn session(ctx: &ClientContext) -> QuizSession {
        SessionCodec.decode(ctx.session_token.as_deref())
    }

    /// Start a new session, discarding any previous one.
    ///
    /// An empty selection is not an error: the client is sent home with
    /// [`Notice::NoQuestions`] and no session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or encoding failures.
    pub async fn start_session(
        &self,
        ctx: &ClientContext,
        request: &StartRequest,
    ) -> Result<Response, SessionError> {
        let record = self.record(ctx);
        let started = SessionQueries::start_from_bank(
            self.bank.as_ref(),
            request,
            &record,
            self.settings.default_question_count(),
            self.shuffle,
        )
        .await;

        match started {
            Ok(session) => {
                info!(
                    mode = %request.mode,
                    category = %request.category,
                    review = request.review,
                    total = session.total(),
                    "session started"
                );
                Ok(Response::redirect(Route::Study)
                    .with_cookie(CookieUpdate::session(SessionCodec.encode(&session)?)))
            }
            Err(SessionError::EmptySelection) => {
                info!(category = %request.category, review = request.review, "no questions for selection");
                Ok(Response::redirect(Route::Home)
                    .with_cookie(CookieUpdate::clear_session())
                    .with_notice(Notice::NoQuestions))
            }
            Err(err) => Err(err),
        }
    }

    /// The current study screen. Reloading it never changes state.
    #[must_use]
    pub fn study(&self, ctx: &ClientContext) -> StudyScreen {
        let session = Self::session(ctx);
        match session.state() {
            SessionState::Feedback(feedback) => {
                StudyScreen::Feedback(FeedbackView::present(feedback, session.total()))
            }
            SessionState::Presenting(question) => {
                StudyScreen::Question(QuestionView::present(&session, question, self.shuffle))
            }
            SessionState::Finished => StudyScreen::Redirect(Route::Result),
            SessionState::Empty => StudyScreen::Redirect(Route::Home),
        }
    }

    /// Judge an answer for `question_id` and persist the updated record.
    ///
    /// A replay while feedback is pending, or an answer for a question that
    /// is not the current head, redirects to the study screen without
    /// judging. With no active queue the client is sent home.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for encoding failures.
    pub fn submit_answer(
        &self,
        ctx: &ClientContext,
        question_id: &str,
        answer: &str,
    ) -> Result<Response, SessionError> {
        let session = Self::session(ctx);
        if session.pending_feedback().is_some() {
            debug!(question_id, "answer replayed while feedback is pending");
            return Ok(Response::redirect(Route::Study));
        }
        match session.head() {
            None => {
                warn!(question_id, "answer submitted without an active session");
                return Ok(Response::redirect(Route::Home).with_notice(Notice::StaleRequest));
            }
            Some(head) if head.id().as_str() != question_id => {
                warn!(question_id, head = %head.id(), "answer for a question that is not current");
                return Ok(Response::redirect(Route::Study));
            }
            Some(_) => {}
        }

        let record = self.record(ctx);
        let outcome = match AnswerJudge::new(&self.settings).judge(
            session,
            answer,
            record,
            self.clock.now(),
        ) {
            Ok(outcome) => outcome,
            Err(SessionError::Desync) => {
                return Ok(Response::redirect(Route::Home).with_notice(Notice::StaleRequest));
            }
            Err(err) => return Err(err),
        };

        Ok(Response::redirect(Route::Study)
            .with_cookie(CookieUpdate::record(self.record_codec().encode(&outcome.record)?))
            .with_cookie(CookieUpdate::session(SessionCodec.encode(&outcome.session)?)))
    }

    /// Close the feedback screen and move on.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for encoding failures.
    pub fn advance(&self, ctx: &ClientContext) -> Result<Response, SessionError> {
        let mut session = Self::session(ctx);
        if !session.advance() {
            return Ok(Response::redirect(Route::Study));
        }
        debug!(remaining = session.remaining(), "advanced past feedback");
        Ok(Response::redirect(Route::Study)
            .with_cookie(CookieUpdate::session(SessionCodec.encode(&session)?)))
    }

    /// Score of the current session; zero when there is none.
    #[must_use]
    pub fn show_result(&self, ctx: &ClientContext) -> ResultView {
        ResultView::present(&Self::session(ctx))
    }

    /// Drop the session unconditionally.
    #[must_use]
    pub fn return_home(&self, _ctx: &ClientContext) -> Response {
        Response::redirect(Route::Home).with_cookie(CookieUpdate::clear_session())
    }
}
