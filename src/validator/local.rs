/// Strict rules: ASCII atext dot-atom, no leading/trailing '.', no "..".
pub(crate) fn is_local_strict(s: &str) -> bool {
    is_dot_atom(s, |c| c.is_ascii_alphanumeric() || is_atext_symbol(c))
}

/// Relaxed rules: a well-formed quoted-string, or a dot-atom that may also
/// carry non-ASCII letters and digits (internationalized local parts).
pub(crate) fn is_local_relaxed(s: &str) -> bool {
    if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
        is_quoted_content(&s[1..s.len() - 1])
    } else {
        is_dot_atom(s, |c| {
            c.is_ascii_alphanumeric() || is_atext_symbol(c) || (!c.is_ascii() && c.is_alphanumeric())
        })
    }
}

/// `true` when `s` is a quoted-string local part (relaxed mode only).
pub(crate) fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

fn is_dot_atom(s: &str, allowed: impl Fn(char) -> bool) -> bool {
    if s.is_empty() || s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return false;
    }
    s.chars().all(|c| c == '.' || allowed(c))
}

fn is_atext_symbol(c: char) -> bool {
    matches!(
        c,
        '!' | '#'
            | '$'
            | '%'
            | '&'
            | '\''
            | '*'
            | '+'
            | '-'
            | '/'
            | '='
            | '?'
            | '^'
            | '_'
            | '`'
            | '{'
            | '|'
            | '}'
            | '~'
    )
}

// qtext or quoted-pair; bare '"' and '\' must be escaped
fn is_quoted_content(inner: &str) -> bool {
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if escaped == ' ' || escaped == '\t' || !escaped.is_control() => {}
                _ => return false,
            },
            '"' => return false,
            c if c == ' ' || c == '\t' || !c.is_control() => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn strict_dots() {
        assert!(!is_local_strict(".abc"));
        assert!(!is_local_strict("abc."));
        assert!(!is_local_strict("a..b"));
        assert!(is_local_strict("a.b"));
    }

    #[test]
    fn strict_rejects_unicode_and_spaces() {
        assert!(!is_local_strict("josé"));
        assert!(!is_local_strict("a b"));
        assert!(is_local_strict("first.last+tag"));
    }

    #[test]
    fn relaxed_quoted() {
        assert!(is_local_relaxed("\"a b\""));
        assert!(is_local_relaxed("\"a\\\"b\""));
        assert!(!is_local_relaxed("\"a\"b\""));
    }

    #[test]
    fn relaxed_allows_internationalized() {
        assert!(is_local_relaxed("josé"));
        assert!(!is_local_relaxed("jo sé"));
    }
}
