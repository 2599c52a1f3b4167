//! MARC subfield text parser
//!
//! Splits raw field text of the form `$a VALUE1 $b VALUE2 ...` into a
//! mapping from subfield code to the ordered values that carried it.
//! Stateless and pure: the same input always yields the same output.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Subfield markers: `$` followed by a single alphanumeric code
static SUBFIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([0-9A-Za-z])").unwrap());

/// ISSN shape: four digits, optional separator, three digits plus a
/// final digit or check character X
static ISSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})[-\s]?(\d{3}[\dXx])").unwrap());

/// Characters stripped from the ends of a subfield value after the
/// surrounding whitespace (ISBD punctuation)
const VALUE_TRIM: &[char] = &[' ', ',', ';', ':', '/'];

/// Parse raw MARC field text into subfield values.
///
/// Each value spans from just after its `$x` marker to the start of the
/// next marker (or end of string). Values are trimmed of whitespace and
/// ISBD punctuation; empty values are discarded. Codes are lowercased
/// and the map preserves first-appearance order.
pub fn parse_marc_subfields(raw: &str) -> IndexMap<String, Vec<String>> {
    let mut results: IndexMap<String, Vec<String>> = IndexMap::new();
    if raw.is_empty() {
        return results;
    }

    // (code, marker start, marker end) for every `$x` occurrence
    let markers: Vec<(String, usize, usize)> = SUBFIELD_RE
        .captures_iter(raw)
        .map(|c| {
            let m = c.get(0).unwrap();
            (c[1].to_lowercase(), m.start(), m.end())
        })
        .collect();

    for (i, (code, _, value_start)) in markers.iter().enumerate() {
        let value_end = markers
            .get(i + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(raw.len());
        let value = &raw[*value_start..value_end];

        let cleaned = value.trim().trim_matches(|c: char| VALUE_TRIM.contains(&c));
        if !cleaned.is_empty() {
            results
                .entry(code.clone())
                .or_default()
                .push(cleaned.to_string());
        }
    }

    results
}

/// First value of a given subfield code, if present
pub fn first_subfield(raw: &str, code: &str) -> Option<String> {
    let map = parse_marc_subfields(raw);
    map.get(&code.to_lowercase())
        .and_then(|vals| vals.first())
        .cloned()
}

/// Split a multi-value spreadsheet cell on commas, semicolons or newlines
pub fn split_multi(val: &str) -> Vec<String> {
    val.split(|c| c == ',' || c == ';' || c == '\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize an ISBN: take the first whitespace/paren-delimited token and
/// keep only digits and the check character `X`/`x`.
pub fn clean_isbn(isbn: &str) -> Option<String> {
    let head = isbn
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .next()
        .unwrap_or("");
    let cleaned: String = head
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize an ISSN to the canonical `NNNN-NNN[NX]` form
pub fn clean_issn(issn: &str) -> Option<String> {
    ISSN_RE
        .captures(issn)
        .map(|c| format!("{}-{}", &c[1], c[2].to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(map: &IndexMap<String, Vec<String>>, code: &str) -> Vec<String> {
        map.get(code).cloned().unwrap_or_default()
    }

    #[test]
    fn test_parse_basic_subfields() {
        let map = parse_marc_subfields("$a Title $d Author $b Pub");
        assert_eq!(values(&map, "a"), vec!["Title"]);
        assert_eq!(values(&map, "d"), vec!["Author"]);
        assert_eq!(values(&map, "b"), vec!["Pub"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_marc_subfields("").is_empty());
    }

    #[test]
    fn test_parse_no_markers() {
        assert!(parse_marc_subfields("plain text without markers").is_empty());
    }

    #[test]
    fn test_parse_strips_isbd_punctuation() {
        let map = parse_marc_subfields("$a Introduction to cataloging / $d Kim, J. ;");
        assert_eq!(values(&map, "a"), vec!["Introduction to cataloging"]);
        assert_eq!(values(&map, "d"), vec!["Kim, J."]);
    }

    #[test]
    fn test_parse_repeated_codes_keep_order() {
        let map = parse_marc_subfields("$a first $a second $a third");
        assert_eq!(values(&map, "a"), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_parse_uppercase_code_lowercased() {
        let map = parse_marc_subfields("$A Value");
        assert_eq!(values(&map, "a"), vec!["Value"]);
    }

    #[test]
    fn test_parse_discards_empty_values() {
        let map = parse_marc_subfields("$a , $b Publisher");
        assert!(map.get("a").is_none());
        assert_eq!(values(&map, "b"), vec!["Publisher"]);
    }

    #[test]
    fn test_first_subfield() {
        assert_eq!(
            first_subfield("$a 9788912345678 (pbk.)", "a").as_deref(),
            Some("9788912345678 (pbk.)")
        );
        assert_eq!(first_subfield("$a x", "b"), None);
    }

    #[test]
    fn test_split_multi() {
        assert_eq!(
            split_multi("adults, teens;children\nresearchers"),
            vec!["adults", "teens", "children", "researchers"]
        );
        assert!(split_multi("").is_empty());
    }

    #[test]
    fn test_clean_isbn() {
        assert_eq!(clean_isbn("978-89-123-4567-8").as_deref(), Some("9788912345678"));
        assert_eq!(clean_isbn("896017121X (v.1)").as_deref(), Some("896017121X"));
        assert_eq!(clean_isbn("(pbk.)"), None);
    }

    #[test]
    fn test_clean_issn() {
        assert_eq!(clean_issn("1229-2435").as_deref(), Some("1229-2435"));
        assert_eq!(clean_issn("1229 243x").as_deref(), Some("1229-243X"));
        assert_eq!(clean_issn("12292435").as_deref(), Some("1229-2435"));
        assert_eq!(clean_issn("not an issn"), None);
    }
}
