#![forbid(unsafe_code)]

pub mod context;
pub mod dashboard;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use context::{
    ClientContext, CookieUpdate, Notice, RECORD_COOKIE, Response, Route, SESSION_COOKIE,
};
pub use dashboard::{DashboardService, HomeView};
pub use error::SessionError;

pub use sessions::{
    AnswerJudge, FeedbackView, JudgeOutcome, QuestionView, QuizLoopService, ResultView,
    SessionBuilder, SessionPlan, StartRequest, StudyScreen,
};
