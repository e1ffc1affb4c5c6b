
// ── Parsers ───────────────────────────────────────────────────────────────────

/// Parse a currency-formatted amount.
/// "(1,234.50)" → -1234.5 | "$500" → 500.0 | "-$12.00" → -12.0 | "55.5%" → 55.5
pub fn parse_amount(s: &str) -> Option<f64> {
    let mut s = s.trim();
    if s.is_empty() || s == "N/A" || s == "-" || s == "—" {
        return None;
    }

    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    }
    s = s.strip_prefix('$').unwrap_or(s);
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest;
    }
    s = s.strip_suffix('%').unwrap_or(s);

    let cleaned = s.replace(',', "");
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// The value token that follows `label` on a summary line.
///
/// "Total P/L: $1,335.90" → "$1,335.90". Returns None when the label is
/// absent or nothing follows it.
pub fn value_after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let idx = line.rfind(label)?;
    line[idx + label.len()..]
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .split_whitespace()
        .next()
}

/// Numeric value of a summary line for `label`: the token right after the
/// label, or else the line's last token when the label carries a qualifier
/// such as "Total P/L (USD) $1,335.90".
pub fn summary_value(line: &str, label: &str) -> Option<f64> {
    value_after_label(line, label)
        .and_then(parse_amount)
        .or_else(|| line.split_whitespace().last().and_then(parse_amount))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
