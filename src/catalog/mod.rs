//! Static catalog of quiz examples and the random picker used to start a round.
//!
//! The catalog is loaded once at startup (see [`loader`]) and never mutated
//! afterwards, so it is shared behind an [`std::sync::Arc`] by the application
//! state.

mod loader;

use std::{collections::HashSet, fmt};

use indexmap::IndexSet;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use loader::{builtin, load_dir};

/// Identifier of a catalog example (e.g. `creational-04`).
pub type ExampleId = String;

/// Design-pattern family an example belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Object creation patterns.
    Creational,
    /// Object composition patterns.
    Structural,
    /// Object interaction patterns.
    Behavioral,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 3] = [
        Category::Creational,
        Category::Structural,
        Category::Behavioral,
    ];

    /// Lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Creational => "creational",
            Category::Structural => "structural",
            Category::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category selection made by the moderator, including the `all` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFilter {
    /// Any category.
    All,
    /// Only creational examples.
    Creational,
    /// Only structural examples.
    Structural,
    /// Only behavioral examples.
    Behavioral,
}

impl CategoryFilter {
    /// Whether an example of `category` passes this filter.
    pub fn matches(&self, category: Category) -> bool {
        match self.category() {
            Some(expected) => expected == category,
            None => true,
        }
    }

    /// The restricted category, or `None` for the wildcard.
    pub fn category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Creational => Some(Category::Creational),
            CategoryFilter::Structural => Some(Category::Structural),
            CategoryFilter::Behavioral => Some(Category::Behavioral),
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        match value {
            Category::Creational => CategoryFilter::Creational,
            Category::Structural => CategoryFilter::Structural,
            Category::Behavioral => CategoryFilter::Behavioral,
        }
    }
}

/// Error returned when a pattern count outside `1..=3` is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pattern count must be between {min} and {max} (got {0})", min = PatternCount::MIN, max = PatternCount::MAX)]
pub struct InvalidPatternCount(pub u8);

/// Exact number of patterns an example's solution must list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "u8", into = "u8")]
#[schema(value_type = u8)]
pub struct PatternCount(u8);

impl PatternCount {
    /// Smallest selectable pattern count.
    pub const MIN: u8 = 1;
    /// Largest selectable pattern count.
    pub const MAX: u8 = 3;

    /// Build a pattern count, rejecting values outside `1..=3`.
    pub fn new(value: u8) -> Result<Self, InvalidPatternCount> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidPatternCount(value))
        }
    }

    /// Every selectable pattern count in ascending order.
    pub fn all() -> impl Iterator<Item = PatternCount> {
        (Self::MIN..=Self::MAX).map(PatternCount)
    }

    /// Raw numeric value.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PatternCount {
    type Error = InvalidPatternCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PatternCount> for u8 {
    fn from(value: PatternCount) -> Self {
        value.0
    }
}

/// Immutable quiz item pairing a code snippet with its pattern solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatternExample {
    /// Unique identifier across the whole catalog.
    pub id: ExampleId,
    /// Short title shown above the snippet.
    pub title: String,
    /// Family the example is filed under.
    pub category: Category,
    /// Source code shown to the teams.
    pub code: String,
    /// Pattern names that make up the expected answer.
    pub solution_patterns: Vec<String>,
    /// Explanation displayed once the solution is revealed.
    pub solution_explanation: String,
}

impl PatternExample {
    /// Number of patterns listed in the solution.
    pub fn pattern_count(&self) -> usize {
        self.solution_patterns.len()
    }
}

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog file or directory could not be read.
    #[error("failed to read catalog source `{path}`")]
    Read {
        /// File or directory that failed.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A catalog file is not a JSON array of examples.
    #[error("failed to parse catalog source `{path}`")]
    Parse {
        /// File that failed to parse.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Two examples share the same identifier.
    #[error("duplicate example id `{0}`")]
    DuplicateId(ExampleId),
    /// An example's solution cannot be selected by any pattern count.
    #[error("example `{id}` lists {count} solution patterns (expected 1 to 3)")]
    InvalidSolution {
        /// Offending example.
        id: ExampleId,
        /// Number of patterns its solution lists.
        count: usize,
    },
    /// No example was found at all.
    #[error("catalog `{0}` contains no examples")]
    Empty(String),
}

/// Number of examples of one category, split by solution size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStats {
    /// Category counted.
    pub category: Category,
    /// Index `n` holds the examples listing `n + 1` patterns.
    pub by_pattern_count: [usize; PatternCount::MAX as usize],
}

impl CategoryStats {
    /// Examples of this category regardless of solution size.
    pub fn total(&self) -> usize {
        self.by_pattern_count.iter().sum()
    }
}

/// Read-only collection of every example known to the quiz.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    examples: Vec<PatternExample>,
}

impl Catalog {
    /// Build a catalog after checking identifiers and solution sizes.
    pub fn new(examples: Vec<PatternExample>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(examples.len());
        for example in &examples {
            if !seen.insert(example.id.as_str()) {
                return Err(CatalogError::DuplicateId(example.id.clone()));
            }

            let count = example.pattern_count();
            if count == 0 || count > usize::from(PatternCount::MAX) {
                return Err(CatalogError::InvalidSolution {
                    id: example.id.clone(),
                    count,
                });
            }
        }

        Ok(Self { examples })
    }

    /// Number of examples in the catalog.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the catalog holds no example.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Look an example up by identifier.
    pub fn get(&self, id: &str) -> Option<&PatternExample> {
        self.examples.iter().find(|example| example.id == id)
    }

    /// Iterate over every example in load order.
    pub fn iter(&self) -> impl Iterator<Item = &PatternExample> {
        self.examples.iter()
    }

    /// Pick a random example whose solution lists exactly `pattern_count`
    /// patterns, restricted to `filter` and skipping `exclude`.
    ///
    /// Returns `None` once every matching example has been used.
    pub fn select_example<R>(
        &self,
        pattern_count: PatternCount,
        filter: Option<CategoryFilter>,
        exclude: &IndexSet<ExampleId>,
        rng: &mut R,
    ) -> Option<PatternExample>
    where
        R: Rng + ?Sized,
    {
        let candidates = self
            .candidates(pattern_count, filter, exclude)
            .collect::<Vec<_>>();
        candidates.choose(rng).map(|example| (*example).clone())
    }

    /// Count the examples still available for a filter.
    pub fn remaining(
        &self,
        pattern_count: PatternCount,
        filter: Option<CategoryFilter>,
        exclude: &IndexSet<ExampleId>,
    ) -> usize {
        self.candidates(pattern_count, filter, exclude).count()
    }

    /// Example counts per category and per pattern count.
    pub fn stats(&self) -> Vec<CategoryStats> {
        Category::ALL
            .iter()
            .map(|&category| {
                let mut by_pattern_count = [0; PatternCount::MAX as usize];
                for example in self.examples.iter().filter(|e| e.category == category) {
                    if let Some(slot) = by_pattern_count.get_mut(example.pattern_count() - 1) {
                        *slot += 1;
                    }
                }
                CategoryStats {
                    category,
                    by_pattern_count,
                }
            })
            .collect()
    }

    fn candidates<'a>(
        &'a self,
        pattern_count: PatternCount,
        filter: Option<CategoryFilter>,
        exclude: &'a IndexSet<ExampleId>,
    ) -> impl Iterator<Item = &'a PatternExample> + 'a {
        self.examples.iter().filter(move |example| {
            filter.is_none_or(|filter| filter.matches(example.category))
                && example.pattern_count() == usize::from(pattern_count.get())
                && !exclude.contains(&example.id)
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn example(id: &str, category: Category, patterns: &[&str]) -> PatternExample {
        PatternExample {
            id: id.into(),
            title: format!("title {id}"),
            category,
            code: "class Foo {}".into(),
            solution_patterns: patterns.iter().map(|p| p.to_string()).collect(),
            solution_explanation: "because".into(),
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            example("c1", Category::Creational, &["Singleton"]),
            example("c2", Category::Creational, &["Builder", "Factory Method"]),
            example("s1", Category::Structural, &["Adapter"]),
            example("s2", Category::Structural, &["Proxy", "Flyweight"]),
            example("b1", Category::Behavioral, &["Observer", "Mediator", "Iterator"]),
        ])
        .unwrap()
    }

    fn count(value: u8) -> PatternCount {
        PatternCount::new(value).unwrap()
    }

    #[test]
    fn picks_the_only_matching_example() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(7);

        let picked = catalog
            .select_example(
                count(2),
                Some(CategoryFilter::Creational),
                &IndexSet::new(),
                &mut rng,
            )
            .unwrap();

        assert_eq!(picked.id, "c2");
    }

    #[test]
    fn wildcard_and_missing_filter_match_every_category() {
        let catalog = sample_catalog();
        let none = IndexSet::new();

        assert_eq!(catalog.remaining(count(2), None, &none), 2);
        assert_eq!(
            catalog.remaining(count(2), Some(CategoryFilter::All), &none),
            2
        );
        assert_eq!(catalog.remaining(count(3), None, &none), 1);
    }

    #[test]
    fn excluded_ids_are_never_selected() {
        let catalog = sample_catalog();
        let exclude = IndexSet::from(["c1".to_string()]);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..32 {
            let picked = catalog
                .select_example(count(1), None, &exclude, &mut rng)
                .unwrap();
            assert_eq!(picked.id, "s1");
        }
    }

    #[test]
    fn exhausted_filter_returns_none() {
        let catalog = sample_catalog();
        let exclude = IndexSet::from(["c2".to_string(), "s2".to_string()]);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(
            catalog
                .select_example(count(2), None, &exclude, &mut rng)
                .is_none()
        );
        assert!(
            catalog
                .select_example(
                    count(3),
                    Some(CategoryFilter::Structural),
                    &IndexSet::new(),
                    &mut rng
                )
                .is_none()
        );
    }

    #[test]
    fn selection_covers_every_candidate() {
        let catalog = sample_catalog();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let picked = catalog
                .select_example(count(1), None, &IndexSet::new(), &mut rng)
                .unwrap();
            seen.insert(picked.id);
        }

        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn stats_split_by_category_and_count() {
        let stats = sample_catalog().stats();

        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].category, Category::Creational);
        assert_eq!(stats[0].by_pattern_count, [1, 1, 0]);
        assert_eq!(stats[2].by_pattern_count, [0, 0, 1]);
        assert_eq!(stats.iter().map(CategoryStats::total).sum::<usize>(), 5);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![
            example("x", Category::Creational, &["Singleton"]),
            example("x", Category::Structural, &["Adapter"]),
        ])
        .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "x"));
    }

    #[test]
    fn rejects_unselectable_solutions() {
        let err = Catalog::new(vec![example("empty", Category::Behavioral, &[])]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSolution { count: 0, .. }));

        let err = Catalog::new(vec![example(
            "big",
            Category::Behavioral,
            &["A", "B", "C", "D"],
        )])
        .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSolution { count: 4, .. }));
    }

    #[test]
    fn pattern_count_bounds() {
        assert!(PatternCount::new(0).is_err());
        assert!(PatternCount::new(4).is_err());
        assert_eq!(PatternCount::all().map(PatternCount::get).collect::<Vec<_>>(), [1, 2, 3]);
        assert!(serde_json::from_str::<PatternCount>("5").is_err());
        assert_eq!(serde_json::from_str::<PatternCount>("2").unwrap(), count(2));
    }

    #[test]
    fn category_filter_wire_names() {
        assert_eq!(
            serde_json::to_string(&CategoryFilter::All).unwrap(),
            "\"all\""
        );
        assert_eq!(
            serde_json::from_str::<CategoryFilter>("\"behavioral\"").unwrap(),
            CategoryFilter::Behavioral
        );
        assert!(CategoryFilter::All.matches(Category::Structural));
        assert!(!CategoryFilter::Creational.matches(Category::Structural));
    }
}
