//! Builder for FHIR `Parameters` resources.
//!
//! Terminology operations (`$lookup`, `$translate`) respond with Parameters;
//! the builder keeps the handlers free of hand-assembled JSON.

use serde_json::{Value, json};
use setu_core::fhir::Coding;

/// Builds a top-level `Parameters` resource.
#[derive(Debug, Default)]
pub struct ParametersBuilder {
    parameter: Vec<Value>,
}

impl ParametersBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value_string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameter
            .push(json!({"name": name, "valueString": value.into()}));
        self
    }

    #[must_use]
    pub fn value_code(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameter
            .push(json!({"name": name, "valueCode": value.into()}));
        self
    }

    #[must_use]
    pub fn value_boolean(mut self, name: &str, value: bool) -> Self {
        self.parameter
            .push(json!({"name": name, "valueBoolean": value}));
        self
    }

    #[must_use]
    pub fn value_uri(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameter
            .push(json!({"name": name, "valueUri": value.into()}));
        self
    }

    #[must_use]
    pub fn value_coding(mut self, name: &str, coding: &Coding) -> Self {
        self.parameter
            .push(json!({"name": name, "valueCoding": coding}));
        self
    }

    /// Adds a parameter composed of nested parts, e.g. a `$translate` match.
    #[must_use]
    pub fn part(mut self, name: &str, part: PartBuilder) -> Self {
        self.parameter
            .push(json!({"name": name, "part": part.parts}));
        self
    }

    #[must_use]
    pub fn build(self) -> Value {
        json!({
            "resourceType": "Parameters",
            "parameter": self.parameter,
        })
    }
}

/// Builds the `part` array of a composite parameter.
#[derive(Debug, Default)]
pub struct PartBuilder {
    parts: Vec<Value>,
}

impl PartBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value_string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts
            .push(json!({"name": name, "valueString": value.into()}));
        self
    }

    #[must_use]
    pub fn value_code(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts
            .push(json!({"name": name, "valueCode": value.into()}));
        self
    }

    #[must_use]
    pub fn value_coding(mut self, name: &str, coding: &Coding) -> Self {
        self.parts.push(json!({"name": name, "valueCoding": coding}));
        self
    }
}
