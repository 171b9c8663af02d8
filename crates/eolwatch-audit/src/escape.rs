//! Markup escaping for the HTML report.
//!
//! Everything placed in a report cell (CSV values, catalog metadata,
//! error messages) passes through here first.

/// Replace the five markup-significant characters with entities.
/// Safe inside element text and quoted attribute values.
///
/// ```
/// use eolwatch_audit::escape::escape_html;
///
/// assert_eq!(
///     escape_html("<img src=x onerror='alert(1)'>"),
///     "&lt;img src=x onerror=&#x27;alert(1)&#x27;&gt;"
/// );
/// assert_eq!(escape_html("mysql 5.7"), "mysql 5.7");
/// ```
pub fn escape_html(s: &str) -> String {
    s.chars().fold(String::with_capacity(s.len()), |mut out, c| {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
        out
    })
}

/// Optional cell value; `None` renders as `-`.
pub fn escape_html_opt(s: Option<&str>) -> String {
    s.map(escape_html).unwrap_or_else(|| "-".to_string())
}
