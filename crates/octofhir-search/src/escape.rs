//! Separator handling for search values.
//!
//! `\,`, `\$`, `\|` and `\\` are literal characters; only unescaped
//! separators split a value. Escapes survive splitting and are removed by
//! [`unescape`] once a value is atomic.

/// Split `value` on every unescaped `separator`.
pub fn split_unescaped(value: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (index, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&value[start..index]);
            start = index + c.len_utf8();
        }
    }
    parts.push(&value[start..]);
    parts
}

/// Split `value` at the first unescaped `separator`.
pub fn split_once_unescaped(value: &str, separator: char) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (index, c) in value.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            return Some((&value[..index], &value[index + c.len_utf8()..]));
        }
    }
    None
}

/// Remove escape backslashes. A trailing lone backslash is kept as is.
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_unescaped() {
        assert_eq!(split_unescaped("a,b,c", ','), vec!["a", "b", "c"]);
        assert_eq!(split_unescaped(r"a\,b,c", ','), vec![r"a\,b", "c"]);
        assert_eq!(split_unescaped(r"a\\,b", ','), vec![r"a\\", "b"]);
        assert_eq!(split_unescaped("abc", ','), vec!["abc"]);
        assert_eq!(split_unescaped("a,", ','), vec!["a", ""]);
    }

    #[test]
    fn test_split_once_unescaped() {
        assert_eq!(split_once_unescaped("a$b$c", '$'), Some(("a", "b$c")));
        assert_eq!(split_once_unescaped(r"a\$b$c", '$'), Some((r"a\$b", "c")));
        assert_eq!(split_once_unescaped(r"a\$b", '$'), None);
        assert_eq!(split_once_unescaped("|code", '|'), Some(("", "code")));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\,b"), "a,b");
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape(r"x\|y\$z"), "x|y$z");
        assert_eq!(unescape(r"end\"), r"end\");
        assert_eq!(unescape("plain"), "plain");
    }
}
