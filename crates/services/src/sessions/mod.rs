mod judge;
mod plan;
mod queries;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use judge::{AnswerJudge, JudgeOutcome};
pub use plan::{SessionBuilder, SessionPlan};
pub use queries::StartRequest;
pub use view::{FeedbackView, QuestionView, ResultView};
pub use workflow::{QuizLoopService, StudyScreen};
