use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::model::Question;

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    pub pool_size: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Samples up to `count` questions from a candidate pool without replacement.
pub struct SessionBuilder {
    count: usize,
    shuffle: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self {
            count,
            shuffle: true,
        }
    }

    /// Disable shuffling to keep pool order, for deterministic tests.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan of `min(count, pool size)` questions.
    pub fn build(self, pool: impl IntoIterator<Item = Question>) -> SessionPlan {
        let mut candidates: Vec<Question> = pool.into_iter().collect();
        let pool_size = candidates.len();
        if self.shuffle {
            let mut rng = rng();
            candidates.as_mut_slice().shuffle(&mut rng);
        }
        candidates.truncate(self.count.min(pool_size));
        SessionPlan {
            questions: candidates,
            pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;
    use std::collections::HashSet;

    fn pool(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("f_pool_{i}")),
                    "理論",
                    format!("Q{i}"),
                    format!("A{i}"),
                    None,
                    Vec::new(),
                )
            })
            .collect()
    }

    #[test]
    fn under_fills_when_pool_is_small() {
        let plan = SessionBuilder::new(30).build(pool(12));
        assert_eq!(plan.total(), 12);
        assert_eq!(plan.pool_size, 12);
    }

    #[test]
    fn samples_without_replacement() {
        let plan = SessionBuilder::new(5).build(pool(20));
        assert_eq!(plan.total(), 5);
        let ids: HashSet<_> = plan.questions.iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn unshuffled_build_keeps_pool_order() {
        let plan = SessionBuilder::new(2).with_shuffle(false).build(pool(4));
        let ids: Vec<&str> = plan.questions.iter().map(|q| q.id().as_str()).collect();
        assert_eq!(ids, ["f_pool_0", "f_pool_1"]);
    }

    #[test]
    fn empty_pool_gives_empty_plan() {
        let plan = SessionBuilder::new(10).build(Vec::new());
        assert!(plan.is_empty());
    }
}
