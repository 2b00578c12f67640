//! Product URL classification
//!
//! A [`ProductClassifier`] holds an ordered list of [`ProductRule`]s and
//! decides whether a normalized URL points at a product-detail page. The rules
//! are OR-combined, so their order only affects how quickly a match is found.
//!
//! Classification is a heuristic: a category page living under `/p/` is a false
//! positive, a product page at `/shoes/red` is a false negative. Both are
//! accepted limitations.

mod rules;

pub use rules::{ProductRule, DEFAULT_NUMERIC_ID_MIN_DIGITS, DEFAULT_PATH_TOKENS};

use crate::config::ClassifierConfig;
use crate::url::{CandidateUrl, QueryPolicy};
use crate::ConfigError;
use regex::Regex;

/// File extensions of static assets that are never product pages
const STATIC_ASSET_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".ico", ".css", ".js", ".pdf", ".doc",
    ".docx", ".xls", ".xlsx", ".zip", ".mp4",
];

/// Stateless, thread-safe product URL classifier
#[derive(Debug, Clone)]
pub struct ProductClassifier {
    rules: Vec<ProductRule>,
}

impl Default for ProductClassifier {
    fn default() -> Self {
        let mut rules: Vec<ProductRule> = DEFAULT_PATH_TOKENS
            .iter()
            .map(|token| ProductRule::path_token(token))
            .collect();
        rules.push(ProductRule::NumericIdSuffix {
            min_digits: DEFAULT_NUMERIC_ID_MIN_DIGITS,
        });
        Self { rules }
    }
}

impl ProductClassifier {
    /// Creates a classifier from an explicit rule list
    pub fn new(rules: Vec<ProductRule>) -> Self {
        Self { rules }
    }

    /// Builds a classifier from the `[classifier]` configuration table
    ///
    /// # Returns
    ///
    /// * `Ok(ProductClassifier)` - All rules compiled
    /// * `Err(ConfigError::InvalidPattern)` - A regex failed to compile or a token is empty
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ConfigError> {
        let mut rules = Vec::new();

        for token in &config.path_tokens {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidPattern(
                    "path token cannot be empty".to_string(),
                ));
            }
            rules.push(ProductRule::path_token(token.trim()));
        }

        if config.numeric_id_min_digits > 0 {
            rules.push(ProductRule::NumericIdSuffix {
                min_digits: config.numeric_id_min_digits,
            });
        }

        for name in &config.query_params {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidPattern(
                    "query parameter name cannot be empty".to_string(),
                ));
            }
            rules.push(ProductRule::QueryParam(name.trim().to_string()));
        }

        for pattern in &config.patterns {
            let regex = Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;
            rules.push(ProductRule::Pattern(regex));
        }

        if rules.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "classifier must have at least one rule".to_string(),
            ));
        }

        Ok(Self { rules })
    }

    /// The configured rules, in evaluation order
    pub fn rules(&self) -> &[ProductRule] {
        &self.rules
    }

    /// Returns true if the URL matches any rule
    ///
    /// # Examples
    ///
    /// ```
    /// use product_scout::classifier::ProductClassifier;
    /// use product_scout::url::{normalize_url, QueryPolicy};
    ///
    /// let classifier = ProductClassifier::default();
    /// let url = normalize_url("https://shop.example.com/product/123", QueryPolicy::Strip).unwrap();
    /// assert!(classifier.classify(&url));
    /// ```
    pub fn classify(&self, url: &CandidateUrl) -> bool {
        let path = url.path();
        let query = url.query();
        self.rules.iter().any(|rule| rule.matches(path, query))
    }

    /// How URLs must be normalized so that every rule sees what it needs
    pub fn query_policy(&self) -> QueryPolicy {
        if self.rules.iter().any(ProductRule::uses_query) {
            QueryPolicy::Keep
        } else {
            QueryPolicy::Strip
        }
    }
}

/// Returns true if the URL points at an image, stylesheet, script or document
pub fn is_static_asset(url: &CandidateUrl) -> bool {
    let path = url.path().to_ascii_lowercase();
    STATIC_ASSET_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(extension))
}
