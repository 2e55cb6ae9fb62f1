//! Storefront catalog filtering.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::ids::CategoryId;
use crate::money::Money;

/// Sort options for the collections page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// API order.
    #[default]
    Default,
    /// Sort by price, low to high.
    PriceAsc,
    /// Sort by price, high to low.
    PriceDesc,
}

impl SortOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::Default => "default",
            SortOption::PriceAsc => "price-asc",
            SortOption::PriceDesc => "price-desc",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SortOption::Default => "Pertinence",
            SortOption::PriceAsc => "Prix croissant",
            SortOption::PriceDesc => "Prix décroissant",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "default" | "" => Some(SortOption::Default),
            "price-asc" => Some(SortOption::PriceAsc),
            "price-desc" => Some(SortOption::PriceDesc),
            _ => None,
        }
    }
}

/// Filters applied to a listed catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogQuery {
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
    /// Keep only these categories; empty keeps all.
    pub categories: Vec<CategoryId>,
    /// Inclusive price bounds.
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub sort: SortOption,
    /// Keep only products with stock.
    pub in_stock_only: bool,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn category(mut self, id: impl Into<CategoryId>) -> Self {
        self.categories.push(id.into());
        self
    }

    pub fn price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    fn matches(&self, product: &Product) -> bool {
        if !product.visible {
            return false;
        }
        if self.in_stock_only && !product.is_in_stock() {
            return false;
        }
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        if !self.categories.is_empty()
            && !product
                .category_id
                .as_ref()
                .is_some_and(|c| self.categories.contains(c))
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price.amount_cents < min.amount_cents) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price.amount_cents > max.amount_cents) {
            return false;
        }
        true
    }

    /// Filter and sort `products`. Ties keep API order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let mut selected: Vec<&Product> = products.iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortOption::Default => {}
            SortOption::PriceAsc => selected.sort_by_key(|p| p.price.amount_cents),
            SortOption::PriceDesc => {
                selected.sort_by_key(|p| std::cmp::Reverse(p.price.amount_cents))
            }
        }
        selected
    }
}
