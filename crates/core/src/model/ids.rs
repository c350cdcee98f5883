use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File-name markers that only encode the naming convention of a source and
/// must not leak into question IDs.
const SOURCE_NAME_MARKERS: [&str; 2] = ["ox_", "normal_"];

/// Question style, which also selects the source subtree and the ID prefix space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    /// Multiple choice over a cloze prompt.
    Fill,
    /// Binary true/false.
    Ox,
}

impl QuizMode {
    pub const ALL: [QuizMode; 2] = [QuizMode::Fill, QuizMode::Ox];

    /// Prefix that starts every question ID of this mode.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            QuizMode::Fill => "f",
            QuizMode::Ox => "o",
        }
    }

    /// Directory under the data root holding this mode's sources.
    #[must_use]
    pub fn source_dir(self) -> &'static str {
        match self {
            QuizMode::Fill => "taku4",
            QuizMode::Ox => "normal",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Fill => "fill",
            QuizMode::Ox => "ox",
        }
    }

    #[must_use]
    pub fn from_id_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.id_prefix() == prefix)
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a quiz mode from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError {
    raw: String,
}

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quiz mode: {}", self.raw)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for QuizMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fill" => Ok(QuizMode::Fill),
            "ox" => Ok(QuizMode::Ox),
            other => Err(ParseModeError {
                raw: other.to_string(),
            }),
        }
    }
}

/// Stable identifier joining queue entries to the wrong-answer set.
///
/// IDs read back from a client token are arbitrary strings, so the type does
/// not enforce the `{prefix}_{source}_{row}` shape; only [`QuestionId::from_source`]
/// produces it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derives the ID of row `row` from the source file stem `source_stem`.
    #[must_use]
    pub fn from_source(mode: QuizMode, source_stem: &str, row: usize) -> Self {
        let stem = SOURCE_NAME_MARKERS
            .iter()
            .fold(source_stem.to_string(), |acc, marker| acc.replace(marker, ""));
        Self(format!("{}_{stem}_{row}", mode.id_prefix()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mode encoded in the ID prefix, if any.
    #[must_use]
    pub fn mode(&self) -> Option<QuizMode> {
        self.0
            .split_once('_')
            .and_then(|(prefix, _)| QuizMode::from_id_prefix(prefix))
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_strips_naming_markers() {
        let id = QuestionId::from_source(QuizMode::Ox, "ox_dc_machines", 4);
        assert_eq!(id.as_str(), "o_dc_machines_4");

        let id = QuestionId::from_source(QuizMode::Fill, "normal_dc_machines", 4);
        assert_eq!(id.as_str(), "f_dc_machines_4");
    }

    #[test]
    fn renamed_source_keeps_id() {
        let before = QuestionId::from_source(QuizMode::Ox, "ox_theory", 2);
        let after = QuestionId::from_source(QuizMode::Ox, "theory", 2);
        assert_eq!(before, after);
    }

    #[test]
    fn modes_never_collide_for_same_source() {
        let fill = QuestionId::from_source(QuizMode::Fill, "theory", 0);
        let ox = QuestionId::from_source(QuizMode::Ox, "theory", 0);
        assert_ne!(fill, ox);
        assert_eq!(fill.mode(), Some(QuizMode::Fill));
        assert_eq!(ox.mode(), Some(QuizMode::Ox));
    }

    #[test]
    fn foreign_id_has_no_mode() {
        assert_eq!(QuestionId::new("garbage").mode(), None);
        assert_eq!(QuestionId::new("x_theory_1").mode(), None);
    }

    #[test]
    fn mode_parses_from_form_value() {
        assert_eq!("fill".parse::<QuizMode>().unwrap(), QuizMode::Fill);
        assert_eq!(" ox ".parse::<QuizMode>().unwrap(), QuizMode::Ox);
        assert!("essay".parse::<QuizMode>().is_err());
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let id = QuestionId::new("f_a_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"f_a_1\"");
    }
}
