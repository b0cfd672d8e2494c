//! Unit tag normalization.
//!
//! Schedules and selection exports write the same unit tag in different
//! conventions (`V-1-1`, `V_1_1`, `v-1-01`). Both sources are normalized
//! with the same function before any join, so formatting alone never
//! produces a "Not Found".

/// Canonicalize a raw unit tag.
///
/// Case-folds, trims, collapses runs of whitespace, underscores and
/// hyphens to a single `-`, and zero-pads the trailing numeric segment
/// to two digits (`V-1-1` → `v-1-01`). Total: tags without a numeric
/// tail come back lower-cased and collapsed, otherwise unchanged.
/// Idempotent by construction.
pub fn normalize_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len() + 1);
    let mut pending_sep = false;

    for ch in trimmed.chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_sep = true;
            continue;
        }
        if pending_sep {
            if !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
    }

    // Pad a single-digit numeric tail: v-1-1 → v-1-01, v-1-12 unchanged.
    let tail_digits = out.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if tail_digits == 1 {
        out.insert(out.len() - 1, '0');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_single_digit_tail() {
        assert_eq!(normalize_tag("V-1-1"), "v-1-01");
        assert_eq!(normalize_tag("V-2-9"), "v-2-09");
    }

    #[test]
    fn leaves_two_digit_tail_alone() {
        assert_eq!(normalize_tag("V-1-12"), "v-1-12");
        assert_eq!(normalize_tag("v-1-01"), "v-1-01");
    }

    #[test]
    fn case_and_whitespace_equivalence() {
        assert_eq!(normalize_tag("v-1-1"), normalize_tag("V-1-01"));
        assert_eq!(normalize_tag("  V-1-1  "), normalize_tag("v-1-01"));
        assert_eq!(normalize_tag("V 1 1"), normalize_tag("V-1-01"));
        assert_eq!(normalize_tag("V_1_1"), normalize_tag("v-1-1"));
    }

    #[test]
    fn separator_runs_collapse() {
        assert_eq!(normalize_tag("V - 1 - 1"), "v-1-01");
        assert_eq!(normalize_tag("V__1--1"), "v-1-01");
    }

    #[test]
    fn unparseable_tags_pass_through() {
        assert_eq!(normalize_tag("  RTU-A  "), "rtu-a");
        assert_eq!(normalize_tag(""), "");
        assert_eq!(normalize_tag("???"), "???");
    }

    #[test]
    fn idempotent() {
        for raw in ["V-1-1", "v-1-01", "RTU A", "7", "", "Unit_12", "V - 3 - 4"] {
            let once = normalize_tag(raw);
            assert_eq!(normalize_tag(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn bare_number_is_padded() {
        assert_eq!(normalize_tag("7"), "07");
        assert_eq!(normalize_tag("07"), "07");
    }
}
