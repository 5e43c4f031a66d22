use promtext_core::MetricType;
use std::borrow::Cow;

/// Canonical text of a sample value.
///
/// Finite values use the shortest decimal that round-trips, always with a
/// fractional part or exponent (`1.0`, `0.25`, `1e21`). Non-finite values use
/// the `+Inf`, `-Inf` and `NaN` tokens.
pub fn format_value(value: f64) -> Cow<'static, str> {
    match special_value(value) {
        Some(token) => Cow::Borrowed(token),
        None => Cow::Owned(format!("{value:?}")),
    }
}

/// Token for non-finite values, `None` for finite ones.
#[inline]
pub(crate) fn special_value(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("+Inf")
    } else if value == f64::NEG_INFINITY {
        Some("-Inf")
    } else {
        None
    }
}

/// `(name suffix, type keyword)` for the `# TYPE` line.
pub fn type_line_parts(kind: MetricType) -> (&'static str, &'static str) {
    (kind.name_suffix(), kind.type_keyword())
}
