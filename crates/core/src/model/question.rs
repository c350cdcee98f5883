use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizMode};

/// Explanation shown when a source row carries none.
pub const DEFAULT_NOTE: &str = "解説はありません。";

/// Replaces the answer span in a cloze prompt.
pub const CLOZE_MARKER: &str = " 【 ？ 】 ";

/// Labels used to pad a choice set that has too few distractors.
pub const FILLER_CHOICES: [&str; 4] = ["選択肢A", "選択肢B", "選択肢C", "選択肢D"];

/// Minimum number of choices offered for a multiple-choice question.
pub const MIN_CHOICES: usize = 4;

/// Minimum raw fields per source row: category, prompt, answer.
pub const MIN_FIELDS: usize = 3;

const NOTE_FIELD: usize = 3;
const FIRST_DISTRACTOR_FIELD: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("row has {found} fields, at least 3 required")]
    TooFewFields { found: usize },
}

//
// ─── TEXT NORMALIZATION ────────────────────────────────────────────────────────
//

/// Trims surrounding whitespace and drops embedded CR/LF characters.
///
/// Applied to every raw cell on load and to both sides of an answer comparison.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    raw.trim().replace(['\r', '\n'], "")
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A normalized question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    category: String,
    front: String,
    back: String,
    note: String,
    #[serde(default)]
    distractors: Vec<String>,
}

impl Question {
    /// Builds a question from already normalized parts.
    #[must_use]
    pub fn new(
        id: QuestionId,
        category: impl Into<String>,
        front: impl Into<String>,
        back: impl Into<String>,
        note: Option<String>,
        distractors: Vec<String>,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            front: front.into(),
            back: back.into(),
            note: note.unwrap_or_else(|| DEFAULT_NOTE.to_string()),
            distractors,
        }
    }

    /// Normalizes one raw source row.
    ///
    /// Layout: `[category, prompt, answer, note?, distractor...]`. Distractors are
    /// only kept for [`QuizMode::Fill`]; empty cells and cells equal to the
    /// answer are discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooFewFields` for rows with fewer than three fields.
    pub fn from_row<S: AsRef<str>>(
        mode: QuizMode,
        source_stem: &str,
        row_index: usize,
        cells: &[S],
    ) -> Result<Self, QuestionError> {
        if cells.len() < MIN_FIELDS {
            return Err(QuestionError::TooFewFields { found: cells.len() });
        }
        let cleaned: Vec<String> = cells.iter().map(|c| clean_text(c.as_ref())).collect();
        let back = cleaned[2].clone();

        let note = cleaned
            .get(NOTE_FIELD)
            .filter(|note| !note.is_empty())
            .cloned();

        let distractors = match mode {
            QuizMode::Fill => cleaned
                .iter()
                .skip(FIRST_DISTRACTOR_FIELD)
                .filter(|cell| !cell.is_empty() && **cell != back)
                .cloned()
                .collect(),
            QuizMode::Ox => Vec::new(),
        };

        Ok(Self::new(
            QuestionId::from_source(mode, source_stem, row_index),
            cleaned[0].clone(),
            cleaned[1].clone(),
            back,
            note,
            distractors,
        ))
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    #[must_use]
    pub fn distractors(&self) -> &[String] {
        &self.distractors
    }

    /// Mode encoded in the question ID.
    #[must_use]
    pub fn mode(&self) -> Option<QuizMode> {
        self.id.mode()
    }

    /// Canonical answer as compared against submissions.
    #[must_use]
    pub fn canonical_answer(&self) -> String {
        clean_text(&self.back)
    }

    /// Exact comparison after trimming and CR/LF removal. No case or width folding.
    #[must_use]
    pub fn is_correct(&self, submitted: &str) -> bool {
        clean_text(submitted) == self.canonical_answer()
    }

    /// Prompt with the first verbatim occurrence of the answer blanked out.
    #[must_use]
    pub fn cloze_prompt(&self) -> String {
        if !self.back.is_empty() && self.front.contains(&self.back) {
            self.front.replacen(&self.back, CLOZE_MARKER, 1)
        } else {
            self.front.clone()
        }
    }

    /// Unshuffled choice set: answer first, deduplicated, padded to [`MIN_CHOICES`].
    #[must_use]
    pub fn choice_set(&self) -> Vec<String> {
        let answer = self.canonical_answer();
        let mut choices = vec![answer.clone()];
        for candidate in self.distractors.iter().map(|d| clean_text(d)) {
            if !candidate.is_empty() && candidate != answer && !choices.contains(&candidate) {
                choices.push(candidate);
            }
        }
        for filler in FILLER_CHOICES {
            if choices.len() >= MIN_CHOICES {
                break;
            }
            if !choices.iter().any(|c| c == filler) {
                choices.push(filler.to_string());
            }
        }
        choices
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(cells: &[&str]) -> Question {
        Question::from_row(QuizMode::Fill, "taku4_theory", 0, cells).unwrap()
    }

    #[test]
    fn rejects_short_rows() {
        let err = Question::from_row(QuizMode::Fill, "a", 0, &["理論", "prompt"]).unwrap_err();
        assert_eq!(err, QuestionError::TooFewFields { found: 2 });
    }

    #[test]
    fn cells_are_trimmed_and_flattened() {
        let q = fill(&[" 理論 ", "line one\r\nline two", " 42\n"]);
        assert_eq!(q.category(), "理論");
        assert_eq!(q.front(), "line oneline two");
        assert_eq!(q.back(), "42");
        assert_eq!(q.note(), DEFAULT_NOTE);
    }

    #[test]
    fn blank_note_cell_reads_as_missing() {
        let q = fill(&["理論", "p", "A", "  \n", "B"]);
        assert_eq!(q.note(), DEFAULT_NOTE);
        assert_eq!(q.distractors(), ["B"]);
    }

    #[test]
    fn distractors_skip_blank_and_answer() {
        let q = fill(&["理論", "p", "A", "note", "B", "", "A", "C", "D"]);
        assert_eq!(q.note(), "note");
        assert_eq!(q.distractors(), ["B", "C", "D"]);
    }

    #[test]
    fn ox_rows_have_no_distractors() {
        let q = Question::from_row(QuizMode::Ox, "ox_theory", 3, &["理論", "p", "○", "n", "×"])
            .unwrap();
        assert!(q.distractors().is_empty());
        assert_eq!(q.id().as_str(), "o_theory_3");
    }

    #[test]
    fn judging_is_exact_after_trim() {
        let q = fill(&["理論", "p", "オームの法則"]);
        assert!(q.is_correct(" オームの法則\n"));
        assert!(!q.is_correct("オーム の法則"));
        let q = fill(&["理論", "p", "abc"]);
        assert!(!q.is_correct("ABC"));
    }

    #[test]
    fn cloze_replaces_first_occurrence_only() {
        let q = fill(&["理論", "V = IR and V = IR", "IR"]);
        assert_eq!(q.cloze_prompt(), format!("V = {CLOZE_MARKER} and V = IR"));
    }

    #[test]
    fn cloze_leaves_prompt_without_answer() {
        let q = fill(&["理論", "What is resistance?", "ohm"]);
        assert_eq!(q.cloze_prompt(), "What is resistance?");
    }

    #[test]
    fn choice_set_pads_to_minimum() {
        let q = fill(&["理論", "p", "A"]);
        assert_eq!(q.choice_set(), ["A", "選択肢A", "選択肢B", "選択肢C"]);
    }

    #[test]
    fn choice_set_dedups_and_avoids_filler_collision() {
        let q = Question::new(
            QuestionId::new("f_x_0"),
            "理論",
            "p",
            "選択肢A",
            None,
            vec!["B".into(), "B".into()],
        );
        assert_eq!(q.choice_set(), ["選択肢A", "B", "選択肢B", "選択肢C"]);
    }

    #[test]
    fn choice_set_keeps_all_distractors() {
        let q = fill(&["理論", "p", "A", "", "B", "C", "D", "E"]);
        assert_eq!(q.choice_set(), ["A", "B", "C", "D", "E"]);
    }
}
