use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{CategorySummary, Product};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
}

/// Filters accepted by `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Comma-separated category names.
    pub category: Option<String>,
    #[serde(default)]
    pub sort: SortOption,
}

/// Static product list, loaded once at start and never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn builtin() -> Result<Self, AppError> {
        Self::parse(BUILTIN_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AppError::CatalogRead {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::parse(&raw)?;
        info!("Loaded {} products from {}", catalog.products.len(), path.display());
        Ok(catalog)
    }

    fn parse(raw: &str) -> Result<Self, AppError> {
        let products: Vec<Product> = serde_json::from_str(raw).map_err(AppError::CatalogParse)?;
        Ok(Self::new(products))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Distinct categories in first-seen order, with product counts.
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut summaries: Vec<CategorySummary> = Vec::new();
        for product in &self.products {
            match summaries.iter_mut().find(|c| c.name == product.category) {
                Some(summary) => summary.count += 1,
                None => summaries.push(CategorySummary::new(product.category.clone(), 1)),
            }
        }
        summaries
    }

    pub fn browse(&self, query: &ProductQuery) -> Vec<Product> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let categories: Vec<String> = query
            .category
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_lowercase)
                    .collect()
            })
            .unwrap_or_default();

        let mut found: Vec<Product> = self
            .products
            .iter()
            .filter(|p| match &search {
                Some(s) => {
                    p.name.to_lowercase().contains(s.as_str())
                        || p.description.to_lowercase().contains(s.as_str())
                }
                None => true,
            })
            .filter(|p| query.min_price.map_or(true, |min| p.price >= min))
            .filter(|p| query.max_price.map_or(true, |max| p.price <= max))
            .filter(|p| categories.is_empty() || categories.contains(&p.category.to_lowercase()))
            .cloned()
            .collect();

        match query.sort {
            SortOption::Featured => {}
            SortOption::PriceLow => found.sort_by(|a, b| a.price.total_cmp(&b.price)),
            SortOption::PriceHigh => found.sort_by(|a, b| b.price.total_cmp(&a.price)),
            SortOption::Rating => found.sort_by(|a, b| {
                b.rating.unwrap_or(0.0).total_cmp(&a.rating.unwrap_or(0.0))
            }),
            SortOption::Newest => found.sort_by(|a, b| b.date.cmp(&a.date)),
        }
        found
    }
}
