pub mod rules;

use tracing::debug;

use crate::models::{Product, StructuredResult};
use rules::{CategoryRule, ComparisonRule, GiftRule, PriceCeilingRule, ProductMentionRule};

/// A single local intent: a predicate plus the reply it builds.
///
/// `text` is the user utterance, already lowercased by the resolver.
/// Returning `None` lets the next rule run.
pub trait IntentRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, text: &str, catalog: &[Product]) -> Option<StructuredResult>;
}

/// Ordered first-match-wins chain of [`IntentRule`]s.
pub struct IntentResolver {
    rules: Vec<Box<dyn IntentRule>>,
}

impl IntentResolver {
    pub fn new(rules: Vec<Box<dyn IntentRule>>) -> Self {
        Self { rules }
    }

    /// Product mention, category, price ceiling, gift, comparison.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ProductMentionRule),
            Box::new(CategoryRule),
            Box::new(PriceCeilingRule),
            Box::new(GiftRule),
            Box::new(ComparisonRule),
        ])
    }

    /// Answers `utterance` from the catalog, or `None` when the remote model
    /// has to take over.
    pub fn resolve(&self, utterance: &str, catalog: &[Product]) -> Option<StructuredResult> {
        let text = utterance.to_lowercase();
        self.rules.iter().find_map(|rule| {
            let result = rule.apply(&text, catalog);
            if result.is_some() {
                debug!(rule = rule.name(), "Intent resolved locally");
            }
            result
        })
    }
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::standard()
    }
}
