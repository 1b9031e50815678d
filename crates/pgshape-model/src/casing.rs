//! Identifier casing for generated code.

/// Words that are spelled fully upper-case when they appear as a whole
/// segment of a snake_case name (`film_id` -> `FilmID`).
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// Convert a snake_case name to CamelCase, upper-casing known initialisms.
///
/// Empty segments (leading, trailing or doubled underscores) are dropped.
pub fn snake_to_camel(s: &str) -> String {
    let mut result = String::with_capacity(s.len());

    for word in s.split('_').filter(|w| !w.is_empty()) {
        let upper = word.to_ascii_uppercase();
        if INITIALISMS.contains(&upper.as_str()) {
            result.push_str(&upper);
            continue;
        }

        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
            result.extend(chars);
        }
    }

    result
}

/// CamelCase type name for a catalog identifier, always a valid Rust
/// identifier (`film-list` -> `FilmList`, `2024_sales` -> `T2024Sales`).
pub fn type_ident(name: &str) -> String {
    let snake: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let mut ident = snake_to_camel(&snake);

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, 'T');
    }
    if ident == "Self" {
        ident.push('_');
    }
    ident
}

/// Convert a CamelCase or mixed name to snake_case.
///
/// Runs of capitals are kept together (`FilmID` -> `film_id`).
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let prev_lower = prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            let prev_upper = prev.is_some_and(|p| p.is_ascii_uppercase());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev_lower || (prev_upper && next_lower) {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "yield", "abstract", "become", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual",
];

/// Turn a column name into a valid Rust field identifier.
///
/// Lower-cases, replaces anything that is not alphanumeric with `_`,
/// prefixes names starting with a digit, and escapes keywords as raw
/// identifiers.
pub fn rust_ident(name: &str) -> String {
    let mut ident: String = to_snake_case(name)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }

    match ident.as_str() {
        // These cannot be raw identifiers
        "self" | "super" | "crate" | "Self" => format!("{}_", ident),
        kw if RUST_KEYWORDS.contains(&kw) => format!("r#{}", ident),
        _ => ident,
    }
}
