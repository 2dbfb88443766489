//! Number rendering shared by the CSV table and the SLA narrative.

/// Formats a double the way the LoadRunner Cloud plugin always printed it:
/// shortest round-trip digits, at least one fractional digit, and `E`
/// notation outside `[1e-3, 1e7)`.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let plain = value.to_string();
        return if plain.contains('.') {
            plain
        } else {
            format!("{plain}.0")
        };
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    if mantissa.contains('.') {
        format!("{mantissa}E{exponent}")
    } else {
        format!("{mantissa}.0E{exponent}")
    }
}

/// Like [`format_double`], with `null` for an absent value.
pub fn format_optional_double(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), format_double)
}
