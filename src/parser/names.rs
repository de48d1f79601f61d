use sqlparser::ast::Function;

/// Return the identifier without one layer of surrounding double quotes or backticks.
pub fn unquote_identifier(ident: &str) -> &str {
    ident
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| ident.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(ident)
}

/// Normalize an identifier for case-insensitive matching.
///
/// Trims whitespace, removes surrounding quotes on a single identifier,
/// and lowercases the result.
pub fn normalize_identifier(ident: &str) -> String {
    unquote_identifier(ident.trim()).to_lowercase()
}

/// Terminal component of a possibly qualified name: `db.fn` -> `fn`.
pub fn terminal_name(name: &str) -> &str {
    let mut in_quotes = None;
    let mut start = 0usize;
    for (idx, ch) in name.char_indices() {
        match (ch, in_quotes) {
            ('"' | '`', None) => in_quotes = Some(ch),
            (c, Some(open)) if c == open => in_quotes = None,
            ('.', None) => start = idx + 1,
            _ => {}
        }
    }
    name[start..].trim()
}

/// Lower-cased, unqualified name of a function call.
pub fn normalized_function_name(func: &Function) -> String {
    normalize_identifier(terminal_name(&func.name.to_string()))
}
