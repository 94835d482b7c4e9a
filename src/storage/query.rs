//! FTS5 query building
//!
//! User input never reaches `MATCH` verbatim: every term and phrase is
//! re-quoted so punctuation such as `-`, `:` or `*` cannot be read as FTS5
//! operators.

/// Quotes a term or phrase as an FTS5 string literal
pub fn escape_fts5_term(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// Builds an FTS5 expression from free-form user input
///
/// Double-quoted sections become phrases; everything else is split on
/// whitespace into terms. All phrases and terms must match. When `columns`
/// is non-empty the whole expression is restricted to those columns.
///
/// Returns `None` when the input holds nothing searchable.
///
/// # Examples
///
/// ```
/// use flare_kb::storage::build_fts5_query;
///
/// assert_eq!(
///     build_fts5_query(r#"state "data connector""#, &[]).as_deref(),
///     Some(r#""state" "data connector""#)
/// );
/// assert_eq!(
///     build_fts5_query("ftso", &["title", "content"]).as_deref(),
///     Some(r#"{title content} : ("ftso")"#)
/// );
/// assert_eq!(build_fts5_query("  ", &[]), None);
/// ```
pub fn build_fts5_query(input: &str, columns: &[&str]) -> Option<String> {
    let mut parts = Vec::new();

    // Odd segments sit between quotes; an unbalanced trailing quote still
    // yields a phrase.
    for (i, segment) in input.split('"').enumerate() {
        if i % 2 == 1 {
            let phrase = segment.split_whitespace().collect::<Vec<_>>().join(" ");
            if is_searchable(&phrase) {
                parts.push(escape_fts5_term(&phrase));
            }
        } else {
            parts.extend(
                segment
                    .split_whitespace()
                    .filter(|term| is_searchable(term))
                    .map(escape_fts5_term),
            );
        }
    }

    if parts.is_empty() {
        return None;
    }

    let expr = parts.join(" ");
    if columns.is_empty() {
        Some(expr)
    } else {
        Some(format!("{{{}}} : ({})", columns.join(" "), expr))
    }
}

/// A term is searchable if the tokenizer will keep at least one token
fn is_searchable(term: &str) -> bool {
    term.chars().any(char::is_alphanumeric)
}
