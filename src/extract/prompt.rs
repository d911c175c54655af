//! Extraction prompt assembly.
//!
//! Centralising the prompt here serves two purposes: changing the model's
//! instructions touches exactly one place, and unit tests can inspect the
//! generated prompt without a live model. Callers can override the whole
//! prompt via [`crate::config::ExtractConfig::prompt`]; the constants here
//! are used only when no override is provided.

use crate::extract::fields::FieldDef;

/// Opening instructions sent before the per-field list.
pub const PROMPT_HEADER: &str = "\
You are an expert at extracting structured data from scanned medical documents. \
The images are the pages of one patient record. Extract the fields listed below.
If a field is not present or cannot be determined, output null for that field.

Be very careful not to confuse the digit 0 and the letter O, or the digit 1 and \
the letter l; double-check any value where they could be swapped.

Extraction instructions per field:";

/// Closing rules sent after the per-field list.
pub const PROMPT_FOOTER: &str = "

Rules:
- Never drop leading zeros from any number or identifier; write values exactly as printed.
- All name fields use the format \"LAST, FIRST M\" with only the capitalised middle initial.
- City and ZIP values must not include a trailing comma.
- Phone numbers use the format (712) 301-6622. If only one phone number is printed, put it under Cell Phone; a second number goes under Home Phone unless explicitly marked otherwise.
- For the patient address, when both a street address and a PO box are printed, extract the PO box only.
- Guarantor Relation and the coverage relation fields allow only \"Self\", \"Child\", or \"Other\". Compare names ignoring suffixes like SR, JR, III; roughly matching names with the same date of birth mean \"Self\", and a relation printed as \"parent\" means \"Child\".
- Ignore any ID-like numbers whose colour or font differs from the rest of the form; they are annotations, not data.
- Do not add characters (question marks, symbols, commentary) before or after any value.

Your entire response must be a single JSON object for the one patient record in \
these pages. Do not include any other text.";

/// Build the full extraction prompt from a field set.
///
/// One line per field: `Name: description | Location: … | Format: …`, with
/// empty hints omitted. Field order is preserved so the prompt reads in the
/// same order as the output CSV.
pub fn build_extraction_prompt(fields: &[FieldDef]) -> String {
    let mut lines = Vec::with_capacity(fields.len());
    for field in fields {
        let mut parts = Vec::new();
        if !field.description.is_empty() {
            parts.push(field.description.clone());
        }
        if !field.location.is_empty() {
            parts.push(format!("Location: {}", field.location));
        }
        if !field.output_format.is_empty() {
            parts.push(format!("Format: {}", field.output_format));
        }
        let instruction = if parts.is_empty() {
            "Extract if available".to_string()
        } else {
            parts.join(" | ")
        };
        lines.push(format!("{}: {}", field.name, instruction));
    }

    format!("{PROMPT_HEADER}\n{}\n{PROMPT_FOOTER}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fields::default_fields;

    #[test]
    fn prompt_contains_every_field_name() {
        let fields = default_fields();
        let prompt = build_extraction_prompt(&fields);
        for field in &fields {
            assert!(
                prompt.contains(&field.name),
                "prompt missing field '{}'",
                field.name
            );
        }
    }

    #[test]
    fn prompt_orders_fields_as_supplied() {
        let fields = vec![
            FieldDef {
                name: "Alpha".into(),
                description: "first".into(),
                location: String::new(),
                output_format: String::new(),
            },
            FieldDef {
                name: "Beta".into(),
                description: "second".into(),
                location: String::new(),
                output_format: String::new(),
            },
        ];
        let prompt = build_extraction_prompt(&fields);
        let a = prompt.find("Alpha: first").unwrap();
        let b = prompt.find("Beta: second").unwrap();
        assert!(a < b);
    }

    #[test]
    fn empty_hints_fall_back_to_generic_instruction() {
        let fields = vec![FieldDef {
            name: "Mystery".into(),
            description: String::new(),
            location: String::new(),
            output_format: String::new(),
        }];
        let prompt = build_extraction_prompt(&fields);
        assert!(prompt.contains("Mystery: Extract if available"));
    }

    #[test]
    fn prompt_demands_single_json_object() {
        let prompt = build_extraction_prompt(&default_fields());
        assert!(prompt.contains("single JSON object"));
    }
}
