//! SQL query normalization for duplicate detection

use crate::capture::RecordedQuery;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Number of repetitions of one normalized statement that counts as N+1.
pub const N_PLUS_ONE_THRESHOLD: usize = 3;

/// Normalize SQL query for duplicate detection
///
/// This function normalizes SQL queries by:
/// - Converting to uppercase
/// - Replacing numeric literals with `?`
/// - Replacing string literals with `?`
/// - Replacing numbered placeholders (`$1`) with `?`
/// - Normalizing whitespace
/// - Removing comments
///
/// # Examples
///
/// ```
/// use reinhardt_debug_toolbar::utils::sql_normalization::normalize_sql;
///
/// let sql1 = "SELECT * FROM users WHERE id = 123";
/// let sql2 = "SELECT * FROM users WHERE id = 456";
/// assert_eq!(normalize_sql(sql1), normalize_sql(sql2));
/// ```
pub fn normalize_sql(sql: &str) -> String {
	static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").unwrap());
	static STRING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"'([^'\\]|\\.)*'"#).unwrap());
	static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)--.*$").unwrap());
	static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
	static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\d+").unwrap());

	let sql = COMMENT_RE.replace_all(sql, "");
	let sql = STRING_RE.replace_all(&sql, "?");
	let sql = PLACEHOLDER_RE.replace_all(&sql, "?");
	let sql = NUMERIC_RE.replace_all(&sql, "?");
	let sql = WHITESPACE_RE.replace_all(&sql, " ");

	sql.to_uppercase().trim().to_string()
}

/// Count how often each normalized statement was executed.
pub fn normalized_counts(queries: &[RecordedQuery]) -> HashMap<String, usize> {
	let mut counts = HashMap::new();
	for query in queries {
		*counts.entry(normalize_sql(&query.sql)).or_insert(0) += 1;
	}
	counts
}

/// Detect N+1 query patterns
///
/// A normalized statement executed more than [`N_PLUS_ONE_THRESHOLD`] times
/// within one request is reported once, in first-seen order.
pub fn detect_n_plus_one(queries: &[RecordedQuery]) -> Vec<String> {
	let mut counts: HashMap<String, usize> = HashMap::new();
	let mut patterns = Vec::new();

	for query in queries {
		let normalized = normalize_sql(&query.sql);
		let count = counts.entry(normalized.clone()).or_insert(0);
		*count += 1;

		if *count > N_PLUS_ONE_THRESHOLD && !patterns.contains(&normalized) {
			patterns.push(normalized);
		}
	}

	patterns
}
