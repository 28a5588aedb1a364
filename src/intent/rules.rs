use std::sync::LazyLock;

use regex::Regex;

use super::IntentRule;
use crate::models::{CategorySummary, Product, StructuredResult};

/// Category words and synonyms, scanned in this order.
const CATEGORY_VOCABULARY: [&str; 18] = [
    "electronics",
    "clothing",
    "home",
    "kitchen",
    "beauty",
    "sports",
    "toys",
    "gift",
    "gifts",
    "jewelry",
    "spa",
    "decor",
    "gaming",
    "audio",
    "wearables",
    "cameras",
    "laptops",
    "smartphones",
];

static PRICE_CEILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)under\s*\$?(\d+)").expect("price pattern is valid"));

static COMPARISON_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"compare|difference|which is better|vs|versus").expect("comparison pattern is valid")
});

/// Catalog products whose lowercased name appears in `text`, in catalog order.
fn mentioned_products(text: &str, catalog: &[Product]) -> Vec<Product> {
    catalog
        .iter()
        .filter(|p| !p.name.is_empty() && text.contains(&p.name.to_lowercase()))
        .cloned()
        .collect()
}

fn bullet(product: &Product) -> String {
    format!("- **{}** (${}): {}", product.name, product.price, product.description)
}

pub struct ProductMentionRule;

impl IntentRule for ProductMentionRule {
    fn name(&self) -> &'static str {
        "product_mention"
    }

    fn apply(&self, text: &str, catalog: &[Product]) -> Option<StructuredResult> {
        let products = mentioned_products(text, catalog);
        if products.is_empty() {
            return None;
        }
        let plural = if products.len() > 1 { "s" } else { "" };
        let lines: Vec<String> = products.iter().map(bullet).collect();
        Some(StructuredResult::Products {
            content: format!(
                "Here are the details for the product{plural} you mentioned:\n\n{}",
                lines.join("\n")
            ),
            products,
        })
    }
}

pub struct CategoryRule;

impl IntentRule for CategoryRule {
    fn name(&self) -> &'static str {
        "category"
    }

    fn apply(&self, text: &str, catalog: &[Product]) -> Option<StructuredResult> {
        let token = CATEGORY_VOCABULARY.iter().find(|word| text.contains(*word))?;
        let category = if *token == "kitchen" { "home" } else { *token };
        let products: Vec<Product> = catalog
            .iter()
            .filter(|p| p.category.to_lowercase() == category)
            .cloned()
            .collect();
        if products.is_empty() {
            return None;
        }
        Some(StructuredResult::Products {
            content: format!("Here are some products in the '{token}' category:"),
            products,
        })
    }
}

pub struct PriceCeilingRule;

impl IntentRule for PriceCeilingRule {
    fn name(&self) -> &'static str {
        "price_ceiling"
    }

    fn apply(&self, text: &str, catalog: &[Product]) -> Option<StructuredResult> {
        let captures = PRICE_CEILING.captures(text)?;
        let ceiling: f64 = captures.get(1)?.as_str().parse().ok()?;
        // "under $0" and digit runs too long for f64 are not usable ceilings
        if ceiling <= 0.0 || !ceiling.is_finite() {
            return None;
        }
        let products: Vec<Product> = catalog.iter().filter(|p| p.price <= ceiling).cloned().collect();
        if products.is_empty() {
            return None;
        }
        Some(StructuredResult::Products {
            content: format!("Here are some products under ${ceiling}:"),
            products,
        })
    }
}

/// Fixed suggestions, independent of the catalog.
pub struct GiftRule;

impl IntentRule for GiftRule {
    fn name(&self) -> &'static str {
        "gift"
    }

    fn apply(&self, text: &str, _catalog: &[Product]) -> Option<StructuredResult> {
        if !text.contains("gift") {
            return None;
        }
        Some(StructuredResult::Categories {
            content: "Here are some popular gift categories that are often appreciated:".to_string(),
            categories: vec![
                CategorySummary::new("Jewelry", 87),
                CategorySummary::new("Spa & Beauty", 64),
                CategorySummary::new("Home Decor", 112),
                CategorySummary::new("Kitchen Gadgets", 78),
            ],
        })
    }
}

pub struct ComparisonRule;

impl IntentRule for ComparisonRule {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn apply(&self, text: &str, catalog: &[Product]) -> Option<StructuredResult> {
        if !COMPARISON_TRIGGER.is_match(text) {
            return None;
        }
        let products = mentioned_products(text, catalog);
        if products.len() < 2 {
            return None;
        }
        let mut content = String::from("Product Comparison:\n");
        for product in &products {
            content.push('\n');
            content.push_str(&bullet(product));
        }
        Some(StructuredResult::Comparison { content, products })
    }
}
