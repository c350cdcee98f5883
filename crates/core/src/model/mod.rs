pub mod category;
mod ids;
pub mod question;
mod record;
mod session;
mod settings;

pub use category::{CategorySelector, Partition, Resolution, selectable_categories};
pub use ids::{ParseModeError, QuestionId, QuizMode};
pub use question::{Question, QuestionError, clean_text};
pub use record::{LogEntry, PersistentRecord};
pub use session::{FeedbackResult, QuizSession, SessionState, progress_percent};
pub use settings::{QuizSettings, QuizSettingsDraft, SettingsError, default_exam_date};
