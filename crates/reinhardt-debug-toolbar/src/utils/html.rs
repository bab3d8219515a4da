//! HTML helpers

/// Simple HTML escape
pub fn html_escape(s: &str) -> String {
	s.replace('&', "&amp;")
		.replace('<', "&lt;")
		.replace('>', "&gt;")
		.replace('"', "&quot;")
		.replace('\'', "&#x27;")
}

/// Pluralize a count the way the toolbar subtitles read ("1 query", "2 queries").
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
	if count == 1 {
		format!("{} {}", count, singular)
	} else {
		format!("{} {}", count, plural)
	}
}
