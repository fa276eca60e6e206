// src/products/filter.rs
//! Marketplace search: published items, one category, free-text over title and brand

use super::models::{Category, Product, ProductListQuery, ProductStatus};

pub const NO_RESULTS_MESSAGE: &str = "No products match your search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Category),
    /// A category name the catalogue does not know; matches nothing
    Unknown(String),
}

impl CategoryFilter {
    /// `All`, blank or missing select every category
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("All") => CategoryFilter::All,
            Some(name) => match name.parse::<Category>() {
                Ok(category) => CategoryFilter::Only(category),
                Err(_) => CategoryFilter::Unknown(name.to_string()),
            },
        }
    }

    pub fn accepts(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
            CategoryFilter::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketplaceFilter {
    pub query: Option<String>,
    pub category: CategoryFilter,
}

impl Default for MarketplaceFilter {
    fn default() -> Self {
        Self {
            query: None,
            category: CategoryFilter::All,
        }
    }
}

impl MarketplaceFilter {
    pub fn new(query: Option<&str>, category: CategoryFilter) -> Self {
        let query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        Self { query, category }
    }

    pub fn from_query(params: &ProductListQuery) -> Self {
        Self::new(
            params.q.as_deref(),
            CategoryFilter::parse(params.category.as_deref()),
        )
    }

    pub fn matches(&self, product: &Product) -> bool {
        if product.status != ProductStatus::Published || !self.category.accepts(product.category)
        {
            return false;
        }
        match &self.query {
            None => true,
            Some(needle) => {
                product.title.to_lowercase().contains(needle.as_str())
                    || product.brand.to_lowercase().contains(needle.as_str())
            }
        }
    }

    /// Matching products in input order
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}
