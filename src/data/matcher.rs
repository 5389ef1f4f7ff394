//! Byte-level matcher for quoted date keys that open an array.
//!
//! Recognises `"20YY-MM-DD"` followed by optional JSON whitespace, `:`,
//! optional JSON whitespace and `[`. Whitespace runs are capped so a match
//! never exceeds [`DateKeyMatcher::max_width`] bytes, which is what lets the
//! scanner carry a fixed-size lookback window between chunks.

use crate::models::config::ScannerConfig;

const QUOTE: u8 = b'"';
/// Length of `20YY-MM-DD`.
const KEY_LEN: usize = 10;

/// A date key located in a haystack. `start..end` spans the whole match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub key: &'a [u8],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateKeyMatcher {
    max_whitespace: usize,
}

impl DateKeyMatcher {
    pub fn new(max_whitespace: usize) -> Self {
        DateKeyMatcher { max_whitespace }
    }

    pub fn max_width(&self) -> usize {
        ScannerConfig::match_width(self.max_whitespace)
    }

    /// Non-overlapping matches, left to right.
    pub fn find_iter<'m, 'h>(&'m self, haystack: &'h [u8]) -> Matches<'m, 'h> {
        Matches {
            matcher: self,
            haystack,
            pos: 0,
        }
    }

    /// Try to match at `start`, which must hold the opening quote.
    /// Returns the end offset of the match.
    fn match_at(&self, haystack: &[u8], start: usize) -> Option<usize> {
        let key = haystack.get(start + 1..start + 1 + KEY_LEN)?;
        if !is_date_shape(key) {
            return None;
        }
        let mut pos = start + 1 + KEY_LEN;
        if *haystack.get(pos)? != QUOTE {
            return None;
        }
        pos += 1;
        pos = self.skip_whitespace(haystack, pos)?;
        if *haystack.get(pos)? != b':' {
            return None;
        }
        pos += 1;
        pos = self.skip_whitespace(haystack, pos)?;
        if *haystack.get(pos)? != b'[' {
            return None;
        }
        Some(pos + 1)
    }

    fn skip_whitespace(&self, haystack: &[u8], mut pos: usize) -> Option<usize> {
        let limit = pos + self.max_whitespace;
        while pos < limit && is_json_whitespace(*haystack.get(pos)?) {
            pos += 1;
        }
        Some(pos)
    }
}

impl Default for DateKeyMatcher {
    fn default() -> Self {
        DateKeyMatcher::new(ScannerConfig::default().max_whitespace())
    }
}

pub struct Matches<'m, 'h> {
    matcher: &'m DateKeyMatcher,
    haystack: &'h [u8],
    pos: usize,
}

impl<'m, 'h> Iterator for Matches<'m, 'h> {
    type Item = DateMatch<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        let haystack = self.haystack;
        while self.pos < haystack.len() {
            let offset = haystack[self.pos..].iter().position(|&b| b == QUOTE)?;
            let start = self.pos + offset;
            match self.matcher.match_at(haystack, start) {
                Some(end) => {
                    self.pos = end;
                    return Some(DateMatch {
                        start,
                        end,
                        key: &haystack[start + 1..start + 1 + KEY_LEN],
                    });
                }
                None => self.pos = start + 1,
            }
        }
        None
    }
}

/// `20` + two digits, `-`, two digits, `-`, two digits. ASCII only.
fn is_date_shape(key: &[u8]) -> bool {
    key.len() == KEY_LEN
        && key[0] == b'2'
        && key[1] == b'0'
        && key[2..4].iter().all(u8::is_ascii_digit)
        && key[4] == b'-'
        && key[5..7].iter().all(u8::is_ascii_digit)
        && key[7] == b'-'
        && key[8..10].iter().all(u8::is_ascii_digit)
}

/// Space, tab, LF and CR. Vertical tab and form feed are not JSON whitespace.
fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(m: &DateKeyMatcher, input: &str) -> Vec<String> {
        m.find_iter(input.as_bytes())
            .map(|d| String::from_utf8(d.key.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_matches_compact_and_spaced_keys() {
        let m = DateKeyMatcher::default();
        let input = r#"{"days":{"2023-01-03":[{}],"2023-01-04" :
  [ ],"2024-12-31"	:	[]}}"#;
        assert_eq!(keys(&m, input), vec!["2023-01-03", "2023-01-04", "2024-12-31"]);
    }

    #[test]
    fn test_rejects_non_array_values_and_other_shapes() {
        let m = DateKeyMatcher::default();
        let input = r#"{"2023-01-03":{},"2023-01-04":"x","1999-01-01":[],"2023-1-04":[],"x2023-01-05":[]}"#;
        assert!(keys(&m, input).is_empty());
    }

    #[test]
    fn test_date_as_value_then_key() {
        let m = DateKeyMatcher::default();
        // a quoted date in value position must not swallow the key after it
        let input = r#"{"d":"2023-01-02","2023-01-03":[]}"#;
        assert_eq!(keys(&m, input), vec!["2023-01-03"]);
    }

    #[test]
    fn test_whitespace_cap() {
        let m = DateKeyMatcher::new(2);
        assert_eq!(keys(&m, "\"2023-01-03\"  :  ["), vec!["2023-01-03"]);
        assert!(keys(&m, "\"2023-01-03\"   :[").is_empty());
        assert_eq!(m.max_width(), 18);
    }

    #[test]
    fn test_only_json_whitespace_around_colon() {
        let m = DateKeyMatcher::default();
        assert_eq!(keys(&m, "\"2023-01-03\"\r\n\t :\n["), vec!["2023-01-03"]);
        assert!(keys(&m, "\"2023-01-03\"\x0b:[").is_empty());
        assert!(keys(&m, "\"2023-01-03\":\x0c[").is_empty());
    }

    #[test]
    fn test_truncated_match_is_not_reported() {
        let m = DateKeyMatcher::default();
        assert!(keys(&m, "\"2023-01-03\" :").is_empty());
        assert!(keys(&m, "\"2023-01").is_empty());
    }

    #[test]
    fn test_match_offsets() {
        let m = DateKeyMatcher::default();
        let input = b"xx\"2023-01-03\":[1]";
        let found: Vec<_> = m.find_iter(input).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 2);
        assert_eq!(found[0].end, 16);
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        let m = DateKeyMatcher::default();
        let input = "\"20２3-01-03\":[]";
        assert!(keys(&m, input).is_empty());
    }
}
