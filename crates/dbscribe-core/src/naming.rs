//! Identifier case conversion for generated code.
//!
//! These functions work on ASCII letters only; every other character is
//! copied through unchanged. Conversions are not acronym-aware, so
//! `underline("HTTPServer")` is `h_t_t_p_server` and converting that back with
//! [`pascal`] does not restore the original spelling.

/// Convert `user_name` to `UserName`.
///
/// Splits on `_` and uppercases the first letter of each segment. Other
/// characters keep their case, so `myID` becomes `MyID`.
pub fn pascal(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let mut upper_next = true;
    for ch in ident.chars() {
        if ch == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

/// Convert `user_name` to `userName`.
pub fn camel(ident: &str) -> String {
    let pascal = pascal(ident);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert `UserName` to `user_name`.
///
/// Inserts `_` before every uppercase letter except a leading one. Existing
/// underscores are kept as they are.
pub fn underline(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (idx, ch) in ident.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
