use unicode_normalization::UnicodeNormalization;

const NO_BREAK_SPACES: [char; 2] = ['\u{00A0}', '\u{202F}'];

/// Zero-width characters OCR leaves between digits and punctuation
const ZERO_WIDTH: [char; 5] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// Canonicalize one recognized line.
///
/// `None` becomes an empty string. The text is NFKC-normalized, no-break
/// spaces become ordinary spaces and zero-width characters are deleted.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_line(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let normalized: String = raw.nfkc().collect();

    let mut changed = false;
    let stripped: String = normalized
        .chars()
        .filter_map(|c| {
            if NO_BREAK_SPACES.contains(&c) {
                changed = true;
                Some(' ')
            } else if ZERO_WIDTH.contains(&c) {
                changed = true;
                None
            } else {
                Some(c)
            }
        })
        .collect();

    // Deleting a character can bring a base and a combining mark together
    if changed {
        stripped.nfkc().collect()
    } else {
        stripped
    }
}

pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines.iter().map(|l| normalize_line(Some(l.as_ref()))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_becomes_empty() {
        assert_eq!(normalize_line(None), "");
        assert_eq!(normalize_line(Some("")), "");
    }

    #[test]
    fn test_no_break_space_before_digits() {
        assert_eq!(normalize_line(Some("IP:\u{00A0}192.168.1.10")), "IP: 192.168.1.10");
    }

    #[test]
    fn test_zero_width_space_is_deleted() {
        assert_eq!(normalize_line(Some("10.0.\u{200B}0.1")), "10.0.0.1");
        assert_eq!(normalize_line(Some("\u{FEFF}Router-A")), "Router-A");
    }

    #[test]
    fn test_compatibility_forms_fold() {
        // Fullwidth digits and full stop
        assert_eq!(normalize_line(Some("１０．０．０．１")), "10.0.0.1");
        assert_eq!(normalize_line(Some("ﬁrewall")), "firewall");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Router-A",
            "e\u{200B}\u{0301}",
            "Gerät\u{00A0}\u{200D}１",
            "  spaced  ",
        ];
        for s in samples {
            let once = normalize_line(Some(s));
            assert_eq!(normalize_line(Some(&once)), once, "sample {:?}", s);
        }
    }

    #[test]
    fn test_normalize_lines_keeps_order() {
        let lines = normalize_lines(&["b\u{00A0}1", "a"]);
        assert_eq!(lines, vec!["b 1".to_string(), "a".to_string()]);
    }
}
