//! Field definitions: what the model is asked to extract from each section.
//!
//! A field definition carries the name plus three optional hints — a
//! description, where on the form the value usually appears, and the output
//! format. The built-in set covers the common patient-demographics sheet;
//! site-specific sets load from a JSON file, one array of objects with the
//! same shape. Field order is significant: it defines the CSV column order.

use crate::error::ChartsplitError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One field the model must extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name; also the JSON key the model must emit and the CSV header.
    pub name: String,
    /// What the value is, in prompt-ready prose.
    #[serde(default)]
    pub description: String,
    /// Where on the form the value usually appears.
    #[serde(default)]
    pub location: String,
    /// Expected output format, e.g. `"MM/DD/YYYY"`.
    #[serde(default)]
    pub output_format: String,
}

impl FieldDef {
    fn new(name: &str, description: &str, location: &str, output_format: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            location: location.into(),
            output_format: output_format.into(),
        }
    }
}

/// The built-in patient-demographics/billing field set.
pub fn default_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new(
            "Patient Name",
            "Full patient name with the middle name reduced to its initial",
            "Top of the demographics sheet",
            "LAST, FIRST M",
        ),
        FieldDef::new("Date of Birth", "Patient date of birth", "Demographics block", "MM/DD/YYYY"),
        FieldDef::new("Gender", "Patient gender as printed", "Demographics block", "Single letter or word"),
        FieldDef::new("Address 1", "Street address or PO box", "Patient address block", "String"),
        FieldDef::new("Address 2", "Apartment, suite, or second address line", "Patient address block", "String"),
        FieldDef::new("City", "Patient city", "Patient address block", "String"),
        FieldDef::new("State", "Patient state", "Patient address block", "Two-letter code"),
        FieldDef::new("Zip", "Patient ZIP code", "Patient address block", "String, keep leading zeros"),
        FieldDef::new("Home Phone", "Home phone number", "Contact block", "(AAA) PPP-NNNN"),
        FieldDef::new("Cell Phone", "Cell phone number", "Contact block", "(AAA) PPP-NNNN"),
        FieldDef::new("MRN", "Medical record number", "Header or demographics block", "String, keep leading zeros"),
        FieldDef::new("CSN", "Contact serial number for the visit", "Header", "String, keep leading zeros"),
        FieldDef::new("Date of Service", "Date of service, or admission date when no service date is printed", "Header or visit block", "MM/DD/YYYY"),
        FieldDef::new("Guarantor Name", "Name of the guarantor", "Guarantor block", "LAST, FIRST M"),
        FieldDef::new("Guarantor Relation", "Relation of the guarantor to the patient", "Guarantor block", "Self, Child, or Other"),
        FieldDef::new("Primary Insurance", "Primary insurance company name", "First coverage section", "String"),
        FieldDef::new("Primary Subsc ID", "Primary subscriber/member ID", "First coverage section", "String, keep leading zeros"),
        FieldDef::new("Primary Cvg Mem Rel to Sub", "Patient's relation to the primary subscriber", "First coverage section", "Self or Other"),
        FieldDef::new("Secondary Insurance", "Secondary insurance company name", "Second coverage section", "String"),
        FieldDef::new("Secondary Subsc ID", "Secondary subscriber/member ID", "Second coverage section", "String, keep leading zeros"),
        FieldDef::new("Secondary Cvg Mem Rel to Sub", "Patient's relation to the secondary subscriber", "Second coverage section", "Self or Other"),
    ]
}

/// Load a field set from a JSON file: an array of [`FieldDef`] objects.
pub fn load_fields(path: &Path) -> Result<Vec<FieldDef>, ChartsplitError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ChartsplitError::FieldDefinitionsInvalid {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let fields: Vec<FieldDef> =
        serde_json::from_str(&raw).map_err(|e| ChartsplitError::FieldDefinitionsInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let usable: Vec<FieldDef> = fields
        .into_iter()
        .filter(|f| !f.name.trim().is_empty())
        .collect();
    if usable.is_empty() {
        return Err(ChartsplitError::FieldDefinitionsInvalid {
            path: path.to_path_buf(),
            detail: "no fields with a non-empty name".into(),
        });
    }
    Ok(usable)
}
