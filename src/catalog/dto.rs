use serde::Deserialize;

use super::repo_types::Product;

/// Query string for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Normalized product filter. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(q: ProductQuery) -> Self {
        Self {
            search: q.search.filter(|s| !s.is_empty()),
            category: q.category.filter(|c| !c.is_empty()),
        }
    }
}

impl ProductFilter {
    /// Case-insensitive substring on name, exact match on category, ANDed.
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self
            .search
            .as_deref()
            .map_or(true, |s| product.name.to_lowercase().contains(&s.to_lowercase()));
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| product.category == c);
        name_ok && category_ok
    }
}
