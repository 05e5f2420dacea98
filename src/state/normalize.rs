/// Collapse whitespace and lowercase. Returns `None` for blank text.
pub fn normalize_text(raw: &str) -> Option<String> {
    let normalized = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Text that changes while the screen stays the same: clocks, dates,
/// counters, percentages, long free text.
pub fn is_volatile(text: &str) -> bool {
    let text = text.trim();

    if text.len() > 200 {
        return true;
    }

    if looks_like_time(text) || looks_like_date(text) {
        return true;
    }

    // Counters and percentages ("42", "3 new", "87%")
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let non_alpha_ratio = text
            .chars()
            .filter(|c| !c.is_alphabetic() && !c.is_whitespace())
            .count() as f32
            / text.chars().count().max(1) as f32;

        if non_alpha_ratio > 0.6 || text.ends_with('%') {
            return true;
        }
    }

    false
}

/// Normalized text safe to hash into a structural fingerprint.
pub fn stable_text(raw: &str) -> Option<String> {
    if is_volatile(raw) {
        return None;
    }
    normalize_text(raw)
}

/// `9:41`, `12:05 PM`, `23:59:10`
fn looks_like_time(text: &str) -> bool {
    let lower = text.to_lowercase();
    let core = lower
        .trim_end_matches("am")
        .trim_end_matches("pm")
        .trim_end_matches("a.m.")
        .trim_end_matches("p.m.")
        .trim();

    let parts: Vec<&str> = core.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return false;
    }
    parts
        .iter()
        .all(|p| !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_digit()))
}

/// `2024-01-31`, `31/01/2024`, `1.2.24`
fn looks_like_date(text: &str) -> bool {
    for sep in ['-', '/', '.'] {
        let parts: Vec<&str> = text.split(sep).collect();
        if parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.len() <= 4 && p.chars().all(|c| c.is_ascii_digit()))
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clocks_and_dates_are_volatile() {
        assert!(is_volatile("9:41"));
        assert!(is_volatile("12:05 PM"));
        assert!(is_volatile("23:59:10"));
        assert!(is_volatile("2024-01-31"));
        assert!(is_volatile("31/01/2024"));
        assert!(is_volatile("87%"));
        assert!(is_volatile("1,204"));
    }

    #[test]
    fn labels_are_stable() {
        assert!(!is_volatile("Settings"));
        assert!(!is_volatile("Wi-Fi"));
        assert!(!is_volatile("Step 2 of 3"));
        assert!(!is_volatile("Note: meeting at the office"));
    }

    #[test]
    fn stable_text_normalizes() {
        assert_eq!(stable_text("  Account   Settings "), Some("account settings".into()));
        assert_eq!(stable_text("   "), None);
        assert_eq!(stable_text("10:30"), None);
    }
}
