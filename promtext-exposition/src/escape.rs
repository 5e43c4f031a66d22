use std::borrow::Cow;

/// True when `value` holds a backslash, double quote or newline.
#[inline]
pub fn label_value_needs_escape(value: &str) -> bool {
    value.bytes().any(|b| matches!(b, b'\\' | b'"' | b'\n'))
}

/// Escape a label value for use between double quotes.
///
/// Backslash, double quote and newline become `\\`, `\"` and `\n`. Everything
/// else passes through. Values that need no escaping are returned borrowed.
///
/// Not idempotent: escape each value exactly once per render.
pub fn escape_label_value(value: &str) -> Cow<'_, str> {
    if !label_value_needs_escape(value) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Absent values pass through as `None`.
pub fn escape_optional_label_value(value: Option<&str>) -> Option<Cow<'_, str>> {
    value.map(escape_label_value)
}
