//! Minimal FHIR datatypes shared across the server.
//!
//! Only the pieces the terminology and Condition surfaces actually exchange
//! are modeled here: `Coding`, `CodeableConcept`, and the well-known code
//! system URIs. Everything else stays as raw `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// Canonical URI of the NAMASTE traditional-medicine code system.
pub const NAMASTE_SYSTEM_URI: &str = "https://ayush.gov.in/fhir/CodeSystem/namaste";

/// Canonical URI of the WHO ICD-11 Mortality and Morbidity Statistics linearization.
pub const ICD11_MMS_URI: &str = "http://id.who.int/icd/release/11/mms";

/// Whether a system URI refers to WHO ICD-11.
///
/// Substring match on the WHO host, so release-specific URIs
/// (`.../release/11/2023-01/mms`) and bare entity URIs all qualify.
pub fn is_icd11_system(uri: &str) -> bool {
    uri.contains("who.int/icd")
}

/// FHIR Coding: a single code from a single system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            code: Some(code.into()),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// FHIR CodeableConcept: one concept, possibly coded in several systems.
///
/// This is the dual-coding carrier: a Condition coded with both a NAMASTE
/// coding and an ICD-11 coding holds two entries in `coding`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodeableConcept {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn new(coding: Vec<Coding>) -> Self {
        Self { coding, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// First coding from the given system, if any.
    pub fn coding_for_system(&self, system: &str) -> Option<&Coding> {
        self.coding
            .iter()
            .find(|c| c.system.as_deref() == Some(system))
    }

    /// Whether the concept carries at least one coding.
    pub fn is_coded(&self) -> bool {
        !self.coding.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_icd11_system() {
        assert!(is_icd11_system(ICD11_MMS_URI));
        assert!(is_icd11_system("http://id.who.int/icd/release/11/2023-01/mms"));
        assert!(is_icd11_system("http://id.who.int/icd/entity/455013390"));
        assert!(!is_icd11_system(NAMASTE_SYSTEM_URI));
        assert!(!is_icd11_system("http://snomed.info/sct"));
    }

    #[test]
    fn test_coding_serialization_skips_missing() {
        let coding = Coding::new(NAMASTE_SYSTEM_URI, "NAM-0042");
        let json = serde_json::to_value(&coding).unwrap();

        assert_eq!(json["system"], NAMASTE_SYSTEM_URI);
        assert_eq!(json["code"], "NAM-0042");
        assert!(json.get("display").is_none());
    }

    #[test]
    fn test_dual_coded_concept() {
        let concept = CodeableConcept::new(vec![
            Coding::new(NAMASTE_SYSTEM_URI, "NAM-0042").with_display("Jvara"),
            Coding::new(ICD11_MMS_URI, "MG26").with_display("Fever, unspecified"),
        ])
        .with_text("Fever");

        assert!(concept.is_coded());
        assert_eq!(
            concept
                .coding_for_system(ICD11_MMS_URI)
                .and_then(|c| c.code.as_deref()),
            Some("MG26")
        );
        assert!(concept.coding_for_system("http://snomed.info/sct").is_none());
    }

    #[test]
    fn test_codeable_concept_deserialization() {
        let value = json!({
            "coding": [
                {"system": NAMASTE_SYSTEM_URI, "code": "NAM-0042", "display": "Jvara"}
            ],
            "text": "Fever"
        });

        let concept: CodeableConcept = serde_json::from_value(value).unwrap();
        assert_eq!(concept.coding.len(), 1);
        assert_eq!(concept.text.as_deref(), Some("Fever"));
    }

    #[test]
    fn test_empty_concept_is_not_coded() {
        let concept: CodeableConcept = serde_json::from_value(json!({"text": "free text"})).unwrap();
        assert!(!concept.is_coded());
    }
}
