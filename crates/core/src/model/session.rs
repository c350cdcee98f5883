use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::question::Question;

/// Percentage of `done` out of `total`, floored. Zero when `total` is zero.
#[must_use]
pub fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    u8::try_from(done.min(total) * 100 / total).unwrap_or(100)
}

//
// ─── FEEDBACK ──────────────────────────────────────────────────────────────────
//

/// Result of judging the question that was at the head of the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub question: Question,
    pub correct: bool,
    pub canonical_answer: String,
    /// 1-based position of the judged question.
    pub index: usize,
    pub progress: u8,
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Which screen the session is on. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    Empty,
    Presenting(&'a Question),
    Feedback(&'a FeedbackResult),
    Finished,
}

/// Quiz progress carried across requests in the session token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuizSession {
    queue: VecDeque<Question>,
    total: usize,
    correct_count: usize,
    pending_feedback: Option<FeedbackResult>,
}

impl QuizSession {
    /// Starts a session over `questions`, or `None` when there is nothing to ask.
    #[must_use]
    pub fn start(questions: Vec<Question>) -> Option<Self> {
        if questions.is_empty() {
            return None;
        }
        Some(Self {
            total: questions.len(),
            queue: questions.into(),
            correct_count: 0,
            pending_feedback: None,
        })
    }

    #[must_use]
    pub fn state(&self) -> SessionState<'_> {
        if let Some(feedback) = &self.pending_feedback {
            return SessionState::Feedback(feedback);
        }
        match self.queue.front() {
            Some(head) => SessionState::Presenting(head),
            None if self.total > 0 => SessionState::Finished,
            None => SessionState::Empty,
        }
    }

    #[must_use]
    pub fn head(&self) -> Option<&Question> {
        self.queue.front()
    }

    #[must_use]
    pub fn queue(&self) -> &VecDeque<Question> {
        &self.queue
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct_count
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn pending_feedback(&self) -> Option<&FeedbackResult> {
        self.pending_feedback.as_ref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.state(), SessionState::Empty)
    }

    /// 1-based index of the question currently presented.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.answered() + 1
    }

    /// Progress shown while presenting the head, before it is judged.
    #[must_use]
    pub fn presenting_progress(&self) -> u8 {
        progress_percent(self.answered(), self.total)
    }

    /// Final score, floored to a whole percent.
    #[must_use]
    pub fn score(&self) -> u8 {
        progress_percent(self.correct_count, self.total)
    }

    fn answered(&self) -> usize {
        self.total.saturating_sub(self.queue.len())
    }

    /// Pops the head and records its verdict as pending feedback.
    ///
    /// Returns `None` without changing anything when feedback is already
    /// pending or the queue is empty, so a replayed submit never re-judges.
    pub fn complete_head(&mut self, correct: bool) -> Option<&FeedbackResult> {
        if self.pending_feedback.is_some() {
            return None;
        }
        let question = self.queue.pop_front()?;
        if correct {
            self.correct_count += 1;
        }
        let index = self.answered();
        self.pending_feedback = Some(FeedbackResult {
            canonical_answer: question.canonical_answer(),
            question,
            correct,
            index,
            progress: progress_percent(index, self.total),
        });
        self.pending_feedback.as_ref()
    }

    /// Clears pending feedback. Returns false if none was pending.
    pub fn advance(&mut self) -> bool {
        self.pending_feedback.take().is_some()
    }

    /// Structural sanity of a session rebuilt from an untrusted token.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let answered = self.answered();
        self.queue.len() <= self.total
            && self.correct_count <= answered
            && (self.total > 0 || self.pending_feedback.is_none())
            && self
                .pending_feedback
                .as_ref()
                .is_none_or(|f| f.index == answered && f.index >= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::QuestionId;

    fn question(n: usize) -> Question {
        Question::new(
            QuestionId::new(format!("f_theory_{n}")),
            "理論",
            format!("prompt {n}"),
            format!("answer {n}"),
            None,
            Vec::new(),
        )
    }

    fn session(n: usize) -> QuizSession {
        QuizSession::start((0..n).map(question).collect()).unwrap()
    }

    #[test]
    fn empty_pool_starts_nothing() {
        assert!(QuizSession::start(Vec::new()).is_none());
        assert!(QuizSession::default().is_empty());
    }

    #[test]
    fn walks_question_feedback_next_to_finished() {
        let mut s = session(2);
        assert!(matches!(s.state(), SessionState::Presenting(q) if q.id().as_str() == "f_theory_0"));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.presenting_progress(), 0);

        let feedback = s.complete_head(true).unwrap().clone();
        assert_eq!(feedback.index, 1);
        assert_eq!(feedback.progress, 50);
        assert!(matches!(s.state(), SessionState::Feedback(_)));

        assert!(s.advance());
        assert!(matches!(s.state(), SessionState::Presenting(q) if q.id().as_str() == "f_theory_1"));
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.presenting_progress(), 50);

        s.complete_head(false).unwrap();
        assert!(s.advance());
        assert_eq!(s.state(), SessionState::Finished);
        assert_eq!(s.total(), 2);
        assert_eq!(s.correct_count(), 1);
        assert_eq!(s.score(), 50);
    }

    #[test]
    fn pending_feedback_blocks_second_judgement() {
        let mut s = session(3);
        s.complete_head(true).unwrap();
        assert!(s.complete_head(true).is_none());
        assert_eq!(s.remaining(), 2);
        assert_eq!(s.correct_count(), 1);
    }

    #[test]
    fn advance_without_feedback_is_noop() {
        let mut s = session(1);
        assert!(!s.advance());
        assert_eq!(s.remaining(), 1);
    }

    #[test]
    fn progress_floors() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(3, 3), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn consistency_rejects_impossible_counts() {
        let mut s = session(2);
        assert!(s.is_consistent());
        s.correct_count = 1;
        assert!(!s.is_consistent());
        s.correct_count = 0;
        s.total = 1;
        assert!(!s.is_consistent());
    }
}
