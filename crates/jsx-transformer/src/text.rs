//! JSX text handling: whitespace, entities and string quoting.

/// Returns true if `name` can be written as a bare JS identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Formats `name` as an object literal key.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Quotes `value` as a double-quoted JS string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Collapses whitespace in a JSX text child.
///
/// Every whitespace run becomes a single space. `trim_start` and `trim_end`
/// strip the run at the respective edge instead (used for the first and last
/// child). Returns `None` when nothing is left.
pub fn collapse_whitespace(raw: &str, trim_start: bool, trim_end: bool) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = false;
    for c in raw.chars() {
        if is_jsx_whitespace(c) {
            in_space = true;
            continue;
        }
        if in_space && !(trim_start && out.is_empty()) {
            out.push(' ');
        }
        in_space = false;
        out.push(c);
    }
    if in_space && !trim_end && !(trim_start && out.is_empty()) {
        out.push(' ');
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn is_jsx_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000B}' | '\u{000C}')
}

/// Decodes HTML character references in JSX text and attribute strings.
///
/// Unknown references are left untouched.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|semi| *semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = name.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "middot" => '\u{00B7}',
        "bull" => '\u{2022}',
        "times" => '\u{00D7}',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identifier() {
        assert!(is_identifier("onClick"));
        assert!(is_identifier("$el"));
        assert!(!is_identifier("aria-label"));
        assert!(!is_identifier("is:visible"));
        assert!(!is_identifier("1st"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_property_key() {
        assert_eq!(property_key("id"), "id");
        assert_eq!(property_key("data-id"), "\"data-id\"");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
        assert_eq!(quote("\u{0}"), r#""\u0000""#);
    }

    #[test]
    fn test_collapse_interior_runs() {
        assert_eq!(
            collapse_whitespace("  hello \n\t world  ", false, false).as_deref(),
            Some(" hello world ")
        );
    }

    #[test]
    fn test_collapse_trims_edges() {
        assert_eq!(
            collapse_whitespace("\n    text\n  ", true, true).as_deref(),
            Some("text")
        );
        assert_eq!(
            collapse_whitespace("\n  a  ", true, false).as_deref(),
            Some("a ")
        );
    }

    #[test]
    fn test_whitespace_only_child() {
        assert_eq!(collapse_whitespace("\t", false, false).as_deref(), Some(" "));
        assert_eq!(collapse_whitespace("\n   ", true, false), None);
        assert_eq!(collapse_whitespace("\n   ", false, true), None);
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("&nbsp;"), "\u{00A0}");
        assert_eq!(decode_entities("&unknown; & x"), "&unknown; & x");
    }
}
