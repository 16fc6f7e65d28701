//! Category resolution: MIME type → category name and short code

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single (pattern, category) pair from the category table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Matched as a substring of the MIME type
    pub pattern: String,
    pub category: String,
}

impl CategoryRule {
    pub fn new(pattern: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            category: category.into(),
        }
    }
}

/// Ordered category table plus the short-code mapping.
///
/// Resolution is first-match in declared order, not most-specific match.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    short_codes: HashMap<String, String>,
    fallback: String,
}

impl CategoryTable {
    pub fn new(
        rules: Vec<CategoryRule>,
        short_codes: HashMap<String, String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            rules,
            short_codes,
            fallback: fallback.into(),
        }
    }

    /// Category of the first rule whose pattern is contained in `mime_type`.
    pub fn resolve(&self, mime_type: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| mime_type.contains(rule.pattern.as_str()))
            .map(|rule| rule.category.as_str())
            .unwrap_or(&self.fallback)
    }

    pub fn short_code(&self, category: &str) -> Option<&str> {
        self.short_codes.get(category).map(String::as_str)
    }

    /// Resolve both category and short code in one step.
    pub fn classify(&self, mime_type: &str) -> (String, String) {
        let category = self.resolve(mime_type);
        let short = self.short_code(category).unwrap_or_default();
        (category.to_string(), short.to_string())
    }

    /// Distinct category names in declared order, fallback last.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self
            .rules
            .iter()
            .map(|rule| rule.category.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
        {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MediaConfig;

    fn table() -> CategoryTable {
        MediaConfig::default().category_table()
    }

    #[test]
    fn specific_pattern_declared_first_wins() {
        let t = table();
        assert_eq!(t.resolve("image/icon"), "Icon");
        assert_eq!(t.resolve("text/css"), "Css");
        assert_eq!(t.resolve("application/pdf"), "Document");
    }

    #[test]
    fn family_prefix_catches_remaining_types() {
        let t = table();
        assert_eq!(t.resolve("image/jpeg"), "Image");
        assert_eq!(t.resolve("audio/mpeg"), "Audio");
        assert_eq!(t.resolve("text/html"), "Generic");
        assert_eq!(t.resolve("application/zip"), "Generic");
    }

    // === Scenario: later, more specific pattern never beats an earlier one ===
    #[test]
    fn first_match_not_most_specific() {
        let t = CategoryTable::new(
            vec![
                CategoryRule::new("image/", "Image"),
                CategoryRule::new("image/png", "Png"),
            ],
            HashMap::from([
                ("Image".to_string(), "img".to_string()),
                ("Png".to_string(), "png".to_string()),
            ]),
            "Generic",
        );
        assert_eq!(t.resolve("image/png"), "Image");
    }

    #[test]
    fn no_match_yields_fallback() {
        let t = CategoryTable::new(Vec::new(), HashMap::new(), "Generic");
        assert_eq!(t.resolve("application/zip"), "Generic");
        assert_eq!(t.short_code("Generic"), None);
    }

    #[test]
    fn classify_pairs_category_with_short_code() {
        let t = table();
        assert_eq!(t.classify("image/png"), ("Image".to_string(), "img".to_string()));
        assert_eq!(t.classify("text/javascript"), ("Js".to_string(), "js".to_string()));
    }

    #[test]
    fn categories_are_distinct_and_ordered() {
        let t = table();
        let names = t.categories();
        assert_eq!(names[0], "Icon");
        assert_eq!(names.iter().filter(|n| **n == "Document").count(), 1);
        assert_eq!(names.iter().filter(|n| **n == "Generic").count(), 1);
    }
}
