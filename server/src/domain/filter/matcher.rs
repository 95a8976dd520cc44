//! Line matching against `@@@` filters
//!
//! A filter is a single string of alternating column indexes and regex
//! patterns joined by [`FILTER_SEPARATOR`]:
//!
//! ```text
//! 12@@@^open$@@@13@@@^/cvmfs/software\.eessi\.io
//! ```
//!
//! A record matches a filter when every pattern finds a match (regex search,
//! not full match) in the whitespace-split token at its column. A record
//! matches a [`FilterSet`] when it matches any of its filters. Matching
//! records are the ones to remove.

use regex::Regex;

use super::error::{FilterError, RecordError};

/// Separator between filter tokens (wire format, must not change)
pub const FILTER_SEPARATOR: &str = "@@@";

#[derive(Debug, Clone)]
struct ColumnPattern {
    column: usize,
    pattern: Regex,
}

/// Conjunction of (column, pattern) constraints
#[derive(Debug, Clone)]
pub struct Filter {
    raw: String,
    pairs: Vec<ColumnPattern>,
    /// Trailing column token with no pattern; evaluating the filter fails
    unpaired_column: Option<String>,
}

impl Filter {
    /// Parse a filter from its wire form.
    ///
    /// The empty string is the zero-pair filter, which matches every record.
    /// An odd token count is accepted here and reported when the filter is
    /// evaluated, since the dangling column cannot be checked.
    pub fn parse(raw: &str) -> Result<Self, FilterError> {
        if raw.is_empty() {
            return Ok(Self {
                raw: String::new(),
                pairs: Vec::new(),
                unpaired_column: None,
            });
        }

        let tokens: Vec<&str> = raw.split(FILTER_SEPARATOR).collect();
        let mut pairs = Vec::with_capacity(tokens.len() / 2);
        let mut unpaired_column = None;

        for chunk in tokens.chunks(2) {
            match chunk.get(1) {
                Some(pattern) => {
                    let column = parse_column(raw, chunk[0])?;
                    let pattern =
                        Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
                            filter: raw.to_string(),
                            pattern: pattern.to_string(),
                            source,
                        })?;
                    pairs.push(ColumnPattern { column, pattern });
                }
                None => unpaired_column = Some(chunk[0].to_string()),
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            pairs,
            unpaired_column,
        })
    }

    /// The filter in wire form
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of (column, pattern) pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Evaluate against the tokens of one record.
    ///
    /// Every pair is inspected, so a too-short record is reported even if an
    /// earlier pair already failed to match.
    pub fn matches_tokens(&self, tokens: &[&str]) -> Result<bool, RecordError> {
        if let Some(column) = &self.unpaired_column {
            return Err(RecordError::UnpairedColumn {
                filter: self.raw.clone(),
                column: column.clone(),
            });
        }

        let mut hits = 0;
        for pair in &self.pairs {
            let token = tokens
                .get(pair.column)
                .ok_or(RecordError::ColumnOutOfRange {
                    column: pair.column,
                    available: tokens.len(),
                })?;
            if pair.pattern.is_match(token) {
                hits += 1;
            }
        }
        Ok(hits == self.pairs.len())
    }
}

fn parse_column(filter: &str, token: &str) -> Result<usize, FilterError> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| FilterError::InvalidColumn {
            filter: filter.to_string(),
            token: token.to_string(),
        })
}

/// Disjunction of filters
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Parse every filter string; fails on the first invalid one
    pub fn parse<I, S>(raw: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filters = raw
            .into_iter()
            .map(|f| Filter::parse(f.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { filters })
    }

    /// Parse a JSON array of filter strings
    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let raw: Vec<String> = serde_json::from_str(json)
            .map_err(|e| FilterError::InvalidFilterSet(e.to_string()))?;
        Self::parse(raw)
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Whether the record matches any filter, evaluated in order.
    ///
    /// A blank record is a single empty column 0.
    pub fn matches(&self, record: &str) -> Result<bool, RecordError> {
        let mut tokens: Vec<&str> = record.split_whitespace().collect();
        if tokens.is_empty() {
            tokens.push("");
        }
        for filter in &self.filters {
            if filter.matches_tokens(&tokens)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Whether `record` should be removed under `filters`
pub fn matches(record: &str, filters: &FilterSet) -> Result<bool, RecordError> {
    filters.matches(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> String {
        // 0..=15, call at 12, path at 13
        let mut cols: Vec<String> = (0..16).map(|i| format!("c{}", i)).collect();
        cols[8] = "python3".to_string();
        cols[12] = "open".to_string();
        cols[13] = "/cvmfs/software.eessi.io/lib/libz.so".to_string();
        cols[14] = "O_RDONLY|O_CLOEXEC".to_string();
        cols.join("  ")
    }

    fn set(filters: &[&str]) -> FilterSet {
        FilterSet::parse(filters).unwrap()
    }

    #[test]
    fn test_single_pair_match() {
        assert!(matches(&record(), &set(&["12@@@^open$"])).unwrap());
        assert!(!matches(&record(), &set(&["12@@@^openat$"])).unwrap());
    }

    #[test]
    fn test_all_pairs_must_match() {
        let f = r"12@@@^open$@@@13@@@^/cvmfs/software\.eessi\.io";
        assert!(matches(&record(), &set(&[f])).unwrap());

        let f = r"12@@@^open$@@@13@@@^/usr/lib";
        assert!(!matches(&record(), &set(&[f])).unwrap());
    }

    #[test]
    fn test_any_filter_matches() {
        let filters = set(&[r"12@@@^openat$", r"8@@@python"]);
        assert!(matches(&record(), &filters).unwrap());
    }

    #[test]
    fn test_search_not_full_match() {
        assert!(matches(&record(), &set(&["13@@@eessi"])).unwrap());
        assert!(!matches(&record(), &set(&["13@@@^eessi$"])).unwrap());
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        assert!(!matches(&record(), &FilterSet::default()).unwrap());
    }

    #[test]
    fn test_zero_pair_filter_matches_everything() {
        let filters = set(&[""]);
        assert!(filters.filters()[0].is_empty());
        assert!(matches(&record(), &filters).unwrap());
        assert!(matches("a b c", &filters).unwrap());
    }

    #[test]
    fn test_column_out_of_range_is_error() {
        let err = matches("a b c", &set(&["12@@@open"])).unwrap_err();
        assert_eq!(
            err,
            RecordError::ColumnOutOfRange {
                column: 12,
                available: 3
            }
        );
    }

    #[test]
    fn test_out_of_range_reported_even_after_mismatch() {
        // Column 0 does not match, column 9 does not exist
        let err = matches("a b c", &set(&["0@@@zzz@@@9@@@x"])).unwrap_err();
        assert!(matches!(err, RecordError::ColumnOutOfRange { column: 9, .. }));
    }

    #[test]
    fn test_earlier_match_short_circuits_later_errors() {
        let filters = set(&["0@@@^a$", "99@@@x"]);
        assert!(matches("a b c", &filters).unwrap());
    }

    #[test]
    fn test_unpaired_column_fails_on_evaluation() {
        let filters = set(&["12@@@^open$@@@13"]);
        let err = matches(&record(), &filters).unwrap_err();
        assert!(matches!(err, RecordError::UnpairedColumn { ref column, .. } if column == "13"));
    }

    #[test]
    fn test_blank_record_matches_zero_pair_filter() {
        assert!(matches("   \n", &set(&[""])).unwrap());
        assert!(matches("", &set(&[""])).unwrap());
        assert!(!matches("\n", &FilterSet::default()).unwrap());
    }

    #[test]
    fn test_blank_record_has_one_empty_column() {
        assert!(matches("\n", &set(&["0@@@^$"])).unwrap());
        assert!(!matches("\n", &set(&["0@@@open"])).unwrap());

        let err = matches("\n", &set(&["12@@@open"])).unwrap_err();
        assert_eq!(
            err,
            RecordError::ColumnOutOfRange {
                column: 12,
                available: 1
            }
        );
    }

    #[test]
    fn test_trailing_separator_is_unpaired_column() {
        let filters = set(&["12@@@^open$@@@"]);
        assert_eq!(filters.filters()[0].len(), 1);

        let err = matches(&record(), &filters).unwrap_err();
        assert!(matches!(err, RecordError::UnpairedColumn { ref column, .. } if column.is_empty()));
    }

    #[test]
    fn test_invalid_column_rejected() {
        let err = FilterSet::parse(["x@@@open"]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { ref token, .. } if token == "x"));

        let err = FilterSet::parse(["-1@@@open"]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn { .. }));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = FilterSet::parse(["12@@@(open"]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_json() {
        let json = r#"["12@@@^open$@@@13@@@^/cvmfs", "12@@@^openat$@@@14@@@^/cvmfs"]"#;
        let filters = FilterSet::from_json(json).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters.filters()[0].len(), 2);
        assert_eq!(filters.filters()[1].as_str(), "12@@@^openat$@@@14@@@^/cvmfs");

        assert!(matches!(
            FilterSet::from_json("{\"a\": 1}"),
            Err(FilterError::InvalidFilterSet(_))
        ));
    }

    #[test]
    fn test_single_filter_equals_conjunction() {
        let rec = record();
        let tokens: Vec<&str> = rec.split_whitespace().collect();
        let pairs = [("8", "py"), ("12", "^open$"), ("14", "O_WRONLY")];

        let raw = pairs
            .iter()
            .flat_map(|(c, p)| [*c, *p])
            .collect::<Vec<_>>()
            .join(FILTER_SEPARATOR);
        let expected = pairs.iter().all(|(c, p)| {
            Regex::new(p)
                .unwrap()
                .is_match(tokens[c.parse::<usize>().unwrap()])
        });

        assert!(!expected);
        assert_eq!(matches(&rec, &set(&[raw.as_str()])).unwrap(), expected);
    }
}
