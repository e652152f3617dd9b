use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::{Catalog, Category, CategoryStats};

/// Number of examples for one pattern count.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatternCountOverview {
    pub pattern_count: u8,
    pub examples: usize,
}

/// Examples available in one category.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryOverview {
    pub category: Category,
    pub examples: usize,
    pub by_pattern_count: Vec<PatternCountOverview>,
}

impl From<CategoryStats> for CategoryOverview {
    fn from(stats: CategoryStats) -> Self {
        Self {
            category: stats.category,
            examples: stats.total(),
            by_pattern_count: (1u8..)
                .zip(stats.by_pattern_count)
                .map(|(pattern_count, examples)| PatternCountOverview {
                    pattern_count,
                    examples,
                })
                .collect(),
        }
    }
}

/// Catalog contents backing the moderator's filter buttons.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogOverview {
    pub examples: usize,
    pub categories: Vec<CategoryOverview>,
}

impl From<&Catalog> for CatalogOverview {
    fn from(catalog: &Catalog) -> Self {
        Self {
            examples: catalog.len(),
            categories: catalog.stats().into_iter().map(Into::into).collect(),
        }
    }
}
