use std::collections::BTreeSet;
use std::fmt;

/// Selector token meaning "every category".
pub const ALL_TOKEN: &str = "すべて";

/// The single theory leaf.
pub const THEORY: &str = "理論";

/// Aggregate selector covering every machine-related leaf.
pub const MACHINE_ROOT: &str = "機械";

/// Leaves under [`MACHINE_ROOT`].
pub const MACHINE_LEAVES: [&str; 14] = [
    "直流機",
    "誘導機",
    "同期機",
    "変圧器",
    "四機総合問題",
    "電動機応用",
    "電気機器",
    "パワーエレクトロニクス",
    "自動制御",
    "照明",
    "電熱",
    "電気化学",
    "メカトロニクス",
    "情報伝送及び処理",
];

//
// ─── PARTITION ─────────────────────────────────────────────────────────────────
//

/// Physical source subtree. A load hint only; category filtering still applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    Theory,
    Machine,
}

impl Partition {
    /// Directory name of this partition under a mode's source root.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Partition::Theory => THEORY,
            Partition::Machine => MACHINE_ROOT,
        }
    }

    /// Partition a leaf category is stored under, if it belongs to the taxonomy.
    #[must_use]
    pub fn of_category(category: &str) -> Option<Self> {
        if category == THEORY {
            Some(Partition::Theory)
        } else if MACHINE_LEAVES.contains(&category) {
            Some(Partition::Machine)
        } else {
            None
        }
    }
}

//
// ─── SELECTOR ──────────────────────────────────────────────────────────────────
//

/// A user's category choice, as used for both question filtering and analytics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategorySelector {
    All,
    Theory,
    MachineRoot,
    MachineLeaf(String),
    /// Any label outside the taxonomy; matched exactly with a full scan.
    Other(String),
}

impl CategorySelector {
    /// Parses a selector token. Blank input selects everything.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() || token == ALL_TOKEN || token.eq_ignore_ascii_case("all") {
            Self::All
        } else if token == THEORY {
            Self::Theory
        } else if token == MACHINE_ROOT {
            Self::MachineRoot
        } else if MACHINE_LEAVES.contains(&token) {
            Self::MachineLeaf(token.to_string())
        } else {
            Self::Other(token.to_string())
        }
    }

    /// Display token for this selector.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::All => ALL_TOKEN,
            Self::Theory => THEORY,
            Self::MachineRoot => MACHINE_ROOT,
            Self::MachineLeaf(label) | Self::Other(label) => label.as_str(),
        }
    }

    /// Leaf labels admitted by this selector; `None` admits everything.
    #[must_use]
    pub fn filter_labels(&self) -> Option<BTreeSet<String>> {
        match self {
            Self::All => None,
            Self::Theory => Some(BTreeSet::from([THEORY.to_string()])),
            Self::MachineRoot => Some(MACHINE_LEAVES.iter().map(|l| (*l).to_string()).collect()),
            Self::MachineLeaf(label) | Self::Other(label) => Some(BTreeSet::from([label.clone()])),
        }
    }

    /// Physical subtree worth restricting a load to, if any.
    #[must_use]
    pub fn partition(&self) -> Option<Partition> {
        match self {
            Self::All | Self::Other(_) => None,
            Self::Theory => Some(Partition::Theory),
            Self::MachineRoot | Self::MachineLeaf(_) => Some(Partition::Machine),
        }
    }

    /// Resolves filter and partition together.
    #[must_use]
    pub fn resolve(&self) -> Resolution {
        Resolution {
            filter: self.filter_labels(),
            partition: self.partition(),
        }
    }
}

impl fmt::Display for CategorySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Categories offered on the selection screen, in display order.
#[must_use]
pub fn selectable_categories() -> Vec<&'static str> {
    let mut out = vec![ALL_TOKEN, THEORY, MACHINE_ROOT];
    out.extend(MACHINE_LEAVES);
    out
}

//
// ─── RESOLUTION ────────────────────────────────────────────────────────────────
//

/// Outcome of resolving a selector: the admitted leaf set plus a load hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    filter: Option<BTreeSet<String>>,
    partition: Option<Partition>,
}

impl Resolution {
    #[must_use]
    pub fn filter(&self) -> Option<&BTreeSet<String>> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn partition(&self) -> Option<Partition> {
        self.partition
    }

    /// Whether a question or log entry with `category` is selected.
    #[must_use]
    pub fn admits(&self, category: &str) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|labels| labels.contains(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selector_is_unrestricted() {
        let r = CategorySelector::parse(ALL_TOKEN).resolve();
        assert!(r.filter().is_none());
        assert!(r.partition().is_none());
        assert!(r.admits("anything"));
        assert_eq!(CategorySelector::parse(""), CategorySelector::All);
    }

    #[test]
    fn theory_resolves_to_theory_partition() {
        let r = CategorySelector::parse(THEORY).resolve();
        assert_eq!(r.partition(), Some(Partition::Theory));
        assert!(r.admits(THEORY));
        assert!(!r.admits("直流機"));
    }

    #[test]
    fn machine_leaf_loads_whole_subtree_but_filters_exactly() {
        let r = CategorySelector::parse("変圧器").resolve();
        assert_eq!(r.partition(), Some(Partition::Machine));
        assert!(r.admits("変圧器"));
        assert!(!r.admits("同期機"));
    }

    #[test]
    fn machine_root_expands_to_all_leaves() {
        let r = CategorySelector::parse(MACHINE_ROOT).resolve();
        assert_eq!(r.partition(), Some(Partition::Machine));
        assert_eq!(r.filter().map(BTreeSet::len), Some(14));
        for leaf in MACHINE_LEAVES {
            assert!(r.admits(leaf));
        }
        assert!(!r.admits(THEORY));
        assert!(!r.admits(MACHINE_ROOT));
    }

    #[test]
    fn unknown_label_filters_without_partition() {
        let r = CategorySelector::parse("電力").resolve();
        assert!(r.partition().is_none());
        assert!(r.admits("電力"));
        assert!(!r.admits(THEORY));
    }

    #[test]
    fn partition_of_category_matches_selector_partition() {
        assert_eq!(Partition::of_category(THEORY), Some(Partition::Theory));
        assert_eq!(Partition::of_category("照明"), Some(Partition::Machine));
        assert_eq!(Partition::of_category("電力"), None);
    }

    #[test]
    fn selectable_list_covers_taxonomy() {
        let list = selectable_categories();
        assert_eq!(list.len(), 17);
        assert_eq!(list[0], ALL_TOKEN);
    }
}
