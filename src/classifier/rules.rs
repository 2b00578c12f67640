use regex::Regex;

/// Path tokens that mark a product-detail page on most storefronts
pub const DEFAULT_PATH_TOKENS: &[&str] = &[
    "/p/",
    "/product/",
    "/products/",
    "/dp/",
    "/item/",
    "/pd/",
    "/t/",
];

/// Minimum number of trailing digits for the numeric-ID rule
pub const DEFAULT_NUMERIC_ID_MIN_DIGITS: usize = 6;

/// A single product-URL heuristic
///
/// Rules are pure data: matching has no side effects and depends only on the
/// URL being classified.
#[derive(Debug, Clone)]
pub enum ProductRule {
    /// The lowercased path contains this token (e.g. `/product/`)
    PathToken(String),

    /// The last path segment ends in a numeric product ID
    ///
    /// Matches `/12345678`, `/blue-shoe-123456`, `/shoe_123456.html`.
    NumericIdSuffix { min_digits: usize },

    /// The query string carries this parameter (e.g. `pid`)
    QueryParam(String),

    /// A custom regex matched against `path`, then `path?query`
    Pattern(Regex),
}

impl ProductRule {
    /// Builds a path-token rule, lowercasing the token
    pub fn path_token(token: &str) -> Self {
        Self::PathToken(token.to_lowercase())
    }

    /// Returns true if the rule matches the given path and query
    pub fn matches(&self, path: &str, query: Option<&str>) -> bool {
        match self {
            Self::PathToken(token) => path.to_lowercase().contains(token.as_str()),
            Self::NumericIdSuffix { min_digits } => has_numeric_id_suffix(path, *min_digits),
            Self::QueryParam(name) => query
                .map(|q| {
                    url::form_urlencoded::parse(q.as_bytes())
                        .any(|(key, _)| key.eq_ignore_ascii_case(name))
                })
                .unwrap_or(false),
            Self::Pattern(regex) => {
                regex.is_match(path)
                    || query.is_some_and(|q| regex.is_match(&format!("{}?{}", path, q)))
            }
        }
    }

    /// Returns true if the rule needs the query string to survive normalization
    pub fn uses_query(&self) -> bool {
        match self {
            // A pattern may look at the query without naming `?`
            Self::QueryParam(_) | Self::Pattern(_) => true,
            _ => false,
        }
    }
}

fn has_numeric_id_suffix(path: &str, min_digits: usize) -> bool {
    if min_digits == 0 {
        return false;
    }

    let segment = path.rsplit('/').next().unwrap_or_default();
    let lowered = segment.to_ascii_lowercase();
    let stem = lowered
        .strip_suffix(".html")
        .or_else(|| lowered.strip_suffix(".htm"))
        .unwrap_or(&lowered);

    let digits = stem.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if digits < min_digits {
        return false;
    }

    let prefix = &stem[..stem.len() - digits];
    prefix.is_empty() || prefix.ends_with('-') || prefix.ends_with('_')
}
