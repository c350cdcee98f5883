use rand::rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use quiz_core::model::{FeedbackResult, Question, QuestionId, QuizMode, QuizSession};

/// A question as shown before it is answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub mode: QuizMode,
    pub category: String,
    /// Cloze prompt for fill questions, the raw prompt for true/false.
    pub prompt: String,
    /// Shuffled choices for fill questions; empty for true/false.
    pub choices: Vec<String>,
    pub index: usize,
    pub total: usize,
    pub progress: u8,
}

impl QuestionView {
    #[must_use]
    pub fn present(session: &QuizSession, question: &Question, shuffle: bool) -> Self {
        let mode = question.mode().unwrap_or(QuizMode::Ox);
        let (prompt, choices) = match mode {
            QuizMode::Fill => {
                let mut choices = question.choice_set();
                if shuffle {
                    choices.as_mut_slice().shuffle(&mut rng());
                }
                (question.cloze_prompt(), choices)
            }
            QuizMode::Ox => (question.front().to_string(), Vec::new()),
        };
        Self {
            id: question.id().clone(),
            mode,
            category: question.category().to_string(),
            prompt,
            choices,
            index: session.current_index(),
            total: session.total(),
            progress: session.presenting_progress(),
        }
    }
}

/// The verdict screen shown after judging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub id: QuestionId,
    pub mode: QuizMode,
    pub category: String,
    pub prompt: String,
    pub correct: bool,
    pub canonical_answer: String,
    pub note: String,
    pub index: usize,
    pub total: usize,
    pub progress: u8,
}

impl FeedbackView {
    #[must_use]
    pub fn present(feedback: &FeedbackResult, total: usize) -> Self {
        let question = &feedback.question;
        Self {
            id: question.id().clone(),
            mode: question.mode().unwrap_or(QuizMode::Ox),
            category: question.category().to_string(),
            prompt: question.front().to_string(),
            correct: feedback.correct,
            canonical_answer: feedback.canonical_answer.clone(),
            note: question.note().to_string(),
            index: feedback.index,
            total,
            progress: feedback.progress,
        }
    }
}

/// Final score screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub score: u8,
    pub total: usize,
    pub correct: usize,
}

impl ResultView {
    #[must_use]
    pub fn present(session: &QuizSession) -> Self {
        Self {
            score: session.score(),
            total: session.total(),
            correct: session.correct_count(),
        }
    }
}
