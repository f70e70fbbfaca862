/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lenient numeric cell parse.
///
/// `""` and the `"-"` sentinel read as `0.0`, a `"lo-hi"` range reads as its
/// midpoint, and anything else falls back to the longest numeric prefix
/// (`"45 cm"` → `45.0`). Cells with no leading number read as `0.0`.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return 0.0;
    }
    if let Ok(v) = s.parse::<f64>() {
        return v;
    }
    if let Some((lo, hi)) = s.split_once('-') {
        if let (Ok(lo), Ok(hi)) = (lo.trim().parse::<f64>(), hi.trim().parse::<f64>()) {
            return (lo + hi) / 2.0;
        }
    }
    leading_number(s).unwrap_or(0.0)
}

/// Parse the longest prefix of `s` that reads as a float.
pub fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse::<f64>().ok()
}
