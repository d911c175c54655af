//! Deterministic cleanup of model responses and extracted field values.
//!
//! Model output is close to right and wrong in predictable ways: fenced JSON
//! despite instructions, stray `?` characters where the OCR-ish transcription
//! hit an unknown glyph, invisible Unicode, newlines inside address values
//! that would break the CSV. Each rule here is a pure function, applied in a
//! fixed order, individually testable without a model.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Response-level cleanup ───────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

/// Strip a ```` ```json … ``` ```` wrapper the model added despite the
/// prompt; non-fenced input passes through unchanged.
pub fn strip_code_fences(input: &str) -> String {
    let trimmed = input.trim();
    if let Some(caps) = RE_OUTER_FENCES.captures(trimmed) {
        caps[1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Field-level cleanup ──────────────────────────────────────────────────

/// Invisible characters that leak out of PDF text layers and OCR output.
const INVISIBLE: &[char] = &[
    '\u{FEFF}', '\u{200B}', '\u{00A0}', '\u{2000}', '\u{2001}', '\u{2002}', '\u{2003}',
    '\u{2004}', '\u{2005}', '\u{2006}', '\u{2007}', '\u{2008}', '\u{2009}', '\u{200A}',
    '\u{202F}', '\u{205F}', '\u{3000}',
];

static RE_ID_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\-_.]").unwrap());

/// Whether a field holds a subscriber/member identifier, which gets the
/// stricter character whitelist.
pub fn is_id_field(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    lower.contains("subsc id") || lower.contains("subscription id")
}

/// Clean one extracted value.
///
/// Steps, in order: trim; drop leading `?` runs; strip invisible Unicode;
/// drop remaining `?` (encoding casualties, never real data on these forms);
/// fold newlines into `"; "` so multi-line addresses survive CSV; collapse
/// duplicate separators; trim trailing separators. ID fields are additionally
/// reduced to `[A-Za-z0-9._-]`.
pub fn clean_field_value(value: &str, field_name: Option<&str>) -> String {
    let mut cleaned = value.trim().to_string();

    while let Some(rest) = cleaned.strip_prefix('?') {
        cleaned = rest.trim_start().to_string();
    }

    cleaned.retain(|c| !INVISIBLE.contains(&c));
    cleaned = cleaned.trim().replace('?', "");

    cleaned = cleaned.replace('\n', "; ").replace('\r', "; ");
    while cleaned.contains("; ; ") {
        cleaned = cleaned.replace("; ; ", "; ");
    }
    cleaned = cleaned.trim_end_matches("; ").trim_end_matches(';').to_string();

    if field_name.map(is_id_field).unwrap_or(false) {
        cleaned = RE_ID_CHARS.replace_all(&cleaned, "").to_string();
    }

    cleaned.trim().to_string()
}

static RE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\((\d{3})\)(\d{3})-?(\d{4})$").unwrap());

/// Normalise `(712)3016622` / `(712)301-6622` to `(712) 301-6622`.
///
/// Values that do not look like a parenthesised US number pass through
/// unchanged — better an odd-looking phone number than a mangled one.
pub fn format_phone_number(value: &str) -> String {
    let compact: String = value.trim().chars().filter(|c| *c != ' ').collect();
    match RE_PHONE.captures(&compact) {
        Some(caps) => format!("({}) {}-{}", &caps[1], &caps[2], &caps[3]),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let fenced = "```json\n{\"Patient Name\": \"DOE, JOHN A\"}\n```";
        assert_eq!(strip_code_fences(fenced), "{\"Patient Name\": \"DOE, JOHN A\"}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_input_passes_through() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn leading_question_marks_removed() {
        assert_eq!(clean_field_value("??DOE, JOHN", None), "DOE, JOHN");
    }

    #[test]
    fn invisible_unicode_removed() {
        assert_eq!(clean_field_value("\u{FEFF}\u{200B}123 Main\u{00A0}St", None), "123 MainSt");
    }

    #[test]
    fn newlines_fold_to_semicolons() {
        assert_eq!(
            clean_field_value("123 Main St\nApt 4\n", None),
            "123 Main St; Apt 4"
        );
    }

    #[test]
    fn duplicate_separators_collapse() {
        assert_eq!(clean_field_value("a\n\nb", None), "a; b");
    }

    #[test]
    fn id_fields_keep_only_id_characters() {
        assert_eq!(
            clean_field_value("ABC123!@#$%^&*()", Some("Primary Subsc ID")),
            "ABC123"
        );
        assert_eq!(
            clean_field_value("ABC-123_456.789", Some("Secondary Subsc ID")),
            "ABC-123_456.789"
        );
        assert_eq!(
            clean_field_value("XYZ 789", Some("Secondary Subsc ID")),
            "XYZ789"
        );
    }

    #[test]
    fn non_id_fields_keep_punctuation() {
        assert_eq!(
            clean_field_value("John Doe!", Some("Patient Name")),
            "John Doe!"
        );
    }

    #[test]
    fn phone_without_space_gets_one() {
        assert_eq!(format_phone_number("(712)301-6622"), "(712) 301-6622");
        assert_eq!(format_phone_number("(712)3016622"), "(712) 301-6622");
    }

    #[test]
    fn phone_with_existing_space_is_normalised() {
        assert_eq!(format_phone_number("(712) 301-6622"), "(712) 301-6622");
    }

    #[test]
    fn non_phone_values_pass_through() {
        assert_eq!(format_phone_number("712-301-6622"), "712-301-6622");
        assert_eq!(format_phone_number(""), "");
    }
}
