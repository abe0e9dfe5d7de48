//! Pagination parameters from a request query string.

use serde::Serialize;

/// Decoded query-string pairs in request order.
///
/// A key that appears more than once is array-valued and never counts as a
/// single string, so `?cursor=a&cursor=b` carries no cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQuery {
    pairs: Vec<(String, String)>,
}

impl RequestQuery {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Build from borrowed pairs, mainly for tests.
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The value of `key` when it appears exactly once.
    pub fn single(&self, key: &str) -> Option<&str> {
        let mut values = self.pairs.iter().filter(|(k, _)| k == key);
        let (_, first) = values.next()?;
        match values.next() {
            Some(_) => None,
            None => Some(first.as_str()),
        }
    }

    /// Every value given for `key`, in order.
    pub fn all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

impl From<Vec<(String, String)>> for RequestQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// `asc` (any case) selects ascending; anything else is descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Comparison that moves past the cursor in this direction.
    pub fn comparison(self) -> &'static str {
        match self {
            Self::Asc => ">",
            Self::Desc => "<",
        }
    }
}

/// Page size bounds for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationRequest {
    pub limit: u32,
    pub cursor: Option<String>,
    pub sort_dir: SortDirection,
}

/// Read `limit`, `sort_dir` and `cursor` from the query.
///
/// `limit` parses as a decimal number; missing, empty, non-numeric and
/// non-finite values fall back to the default, anything else is floored and
/// clamped to `[1, max_limit]`.
pub fn parse_pagination(query: &RequestQuery, limits: PageLimits) -> PaginationRequest {
    let limit = query
        .single("limit")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .map(|n| n.floor().clamp(1.0, f64::from(limits.max_limit.max(1))) as u32)
        .unwrap_or(limits.default_limit);

    PaginationRequest {
        limit,
        cursor: query.single("cursor").map(str::to_string),
        sort_dir: SortDirection::parse(query.single("sort_dir")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(pairs: &[(&str, &str)]) -> PaginationRequest {
        parse_pagination(&RequestQuery::from_pairs(pairs.iter().copied()), PageLimits::default())
    }

    #[rstest]
    fn test_bounds_limit_and_reads_fields() {
        let parsed = parse(&[("limit", "999"), ("sort_dir", "asc"), ("cursor", "abc")]);
        assert_eq!(parsed.limit, 100);
        assert_eq!(parsed.sort_dir, SortDirection::Asc);
        assert_eq!(parsed.cursor.as_deref(), Some("abc"));
    }

    #[rstest]
    fn test_defaults() {
        let parsed = parse(&[]);
        assert_eq!(parsed.limit, 20);
        assert_eq!(parsed.sort_dir, SortDirection::Desc);
        assert_eq!(parsed.cursor, None);
    }

    #[rstest]
    #[case("0", 1)]
    #[case("-5", 1)]
    #[case("7.9", 7)]
    #[case(" 15 ", 15)]
    #[case("1e1", 10)]
    #[case("100", 100)]
    #[case("", 20)]
    #[case("abc", 20)]
    #[case("NaN", 20)]
    #[case("inf", 20)]
    fn test_limit_parsing(#[case] raw: &str, #[case] expected: u32) {
        assert_eq!(parse(&[("limit", raw)]).limit, expected);
    }

    #[rstest]
    #[case("ASC", SortDirection::Asc)]
    #[case("Asc", SortDirection::Asc)]
    #[case("desc", SortDirection::Desc)]
    #[case("sideways", SortDirection::Desc)]
    fn test_sort_dir(#[case] raw: &str, #[case] expected: SortDirection) {
        assert_eq!(parse(&[("sort_dir", raw)]).sort_dir, expected);
    }

    #[rstest]
    fn test_repeated_cursor_is_ignored() {
        let parsed = parse(&[("cursor", "a"), ("cursor", "b")]);
        assert_eq!(parsed.cursor, None);
    }

    #[rstest]
    fn test_repeated_limit_uses_default() {
        let parsed = parse(&[("limit", "5"), ("limit", "6")]);
        assert_eq!(parsed.limit, 20);
    }

    #[rstest]
    fn test_custom_limits() {
        let limits = PageLimits {
            default_limit: 50,
            max_limit: 200,
        };
        let query = RequestQuery::from_pairs([("limit", "150")]);
        assert_eq!(parse_pagination(&query, limits).limit, 150);
        assert_eq!(parse_pagination(&RequestQuery::default(), limits).limit, 50);
    }

    #[rstest]
    fn test_query_accessors() {
        let query = RequestQuery::from_pairs([("platform", "google"), ("platform", "tripadvisor"), ("q", "pool")]);
        assert_eq!(query.single("platform"), None);
        assert_eq!(query.all("platform"), vec!["google", "tripadvisor"]);
        assert_eq!(query.single("q"), Some("pool"));
        assert!(query.contains("q"));
        assert!(!query.contains("status"));
        assert!(query.all("status").is_empty());
    }
}
