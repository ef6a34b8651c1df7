//! Query parameter objects shared by the repositories, services and both
//! presentation layers. Nothing here is persisted.

/// Largest page size a caller may ask for.
pub const MAX_LIMIT: u64 = 1000;

/// Largest page whose offset still fits a signed 64-bit SQL parameter.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_LIMIT;

/// Offset based page selection. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Clamps page to `1..=MAX_PAGE` and limit to `1..=MAX_LIMIT`.
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Lenient parsing of `page`/`limit` query values: anything missing,
    /// unparsable or non-positive falls back to page 1 / `default_limit`.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(default_limit as i64);
        Self::new(page as u64, limit as u64)
    }

    /// Only the first row.
    pub fn first() -> Self {
        Self::new(1, 1)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Number of pages needed to show `total` rows, at least 1.
    pub fn page_count(&self, total: u64) -> u64 {
        ((total + self.limit - 1) / self.limit).max(1)
    }
}

/// A tri-state query value that was neither `true`, `false` nor absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBool {
    pub param: &'static str,
    pub value: String,
}

impl std::fmt::Display for InvalidBool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} value {:?}, expected \"true\" or \"false\"",
            self.param, self.value
        )
    }
}

impl std::error::Error for InvalidBool {}

/// Decodes an optional boolean filter: absent or empty is unset.
pub fn parse_tri_state(
    param: &'static str,
    value: Option<&str>,
) -> Result<Option<bool>, InvalidBool> {
    match value {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(other) => Err(InvalidBool {
            param,
            value: other.to_string(),
        }),
    }
}

/// HTML checkboxes only submit when ticked; a ticked box restricts the
/// filter to `true`, an unticked one leaves it unset.
pub fn checkbox_filter(value: Option<&str>) -> Option<bool> {
    match value {
        Some("on") | Some("true") => Some(true),
        _ => None,
    }
}

/// Empty strings mean "no filter".
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Filters for the feature flag listing. `None` means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlagFilters {
    pub id: Option<i32>,
    /// Exact name match.
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub is_global: Option<bool>,
    /// Creator.
    pub person_id: Option<i32>,
}

impl FeatureFlagFilters {
    pub fn by_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_owned()),
            ..Default::default()
        }
    }
}

/// Filters for people resolved against one feature flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilters {
    pub feature_flag_id: i32,
    /// Case-sensitive substring of the person's name.
    pub name: Option<String>,
    /// `Some(true)` keeps only explicit assignments on non-global flags.
    pub is_assigned: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_zero_based() {
        assert_eq!(Pagination::new(1, 10).offset(), 0);
        assert_eq!(Pagination::new(2, 1).offset(), 1);
        assert_eq!(Pagination::new(3, 25).offset(), 50);
    }

    #[test]
    fn test_new_clamps_to_one() {
        assert_eq!(Pagination::new(0, 0), Pagination { page: 1, limit: 1 });
    }

    #[test]
    fn test_from_query_defaults() {
        assert_eq!(
            Pagination::from_query(None, None, 10),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            Pagination::from_query(Some("-3"), Some("abc"), 10),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            Pagination::from_query(Some("0"), Some("0"), 10),
            Pagination { page: 1, limit: 10 }
        );
        assert_eq!(
            Pagination::from_query(Some("4"), Some("5"), 10),
            Pagination { page: 4, limit: 5 }
        );
    }

    #[test]
    fn test_huge_query_values_are_capped() {
        let p = Pagination::from_query(Some("9223372036854775807"), Some("10"), 10);
        assert_eq!(p, Pagination { page: MAX_PAGE, limit: 10 });
        assert!(p.offset() <= i64::MAX as u64);

        let p = Pagination::from_query(
            Some("9223372036854775807"),
            Some("9223372036854775807"),
            10,
        );
        assert_eq!(p.limit, MAX_LIMIT);
        assert!(p.offset() <= i64::MAX as u64);
    }

    #[test]
    fn test_page_count() {
        let p = Pagination::new(1, 10);
        assert_eq!(p.page_count(0), 1);
        assert_eq!(p.page_count(10), 1);
        assert_eq!(p.page_count(11), 2);
    }

    #[test]
    fn test_tri_state() {
        assert_eq!(parse_tri_state("isActive", None), Ok(None));
        assert_eq!(parse_tri_state("isActive", Some("")), Ok(None));
        assert_eq!(parse_tri_state("isActive", Some("true")), Ok(Some(true)));
        assert_eq!(parse_tri_state("isActive", Some("false")), Ok(Some(false)));

        let err = parse_tri_state("isGlobal", Some("yes")).unwrap_err();
        assert_eq!(err.param, "isGlobal");
        assert!(err.to_string().contains("isGlobal"));
    }

    #[test]
    fn test_checkbox_filter() {
        assert_eq!(checkbox_filter(Some("on")), Some(true));
        assert_eq!(checkbox_filter(None), None);
        assert_eq!(checkbox_filter(Some("off")), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" Ana ")), Some("Ana".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
