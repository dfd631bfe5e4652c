use crate::error::CoreError;
use crate::time::{FhirDateTime, now_utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// FHIR concept-map equivalence between a source and a target concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equivalence {
    #[serde(rename = "relatedto")]
    RelatedTo,
    Equivalent,
    Equal,
    Wider,
    Subsumes,
    Narrower,
    Specializes,
    Inexact,
    Unmatched,
    Disjoint,
}

impl Equivalence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RelatedTo => "relatedto",
            Self::Equivalent => "equivalent",
            Self::Equal => "equal",
            Self::Wider => "wider",
            Self::Subsumes => "subsumes",
            Self::Narrower => "narrower",
            Self::Specializes => "specializes",
            Self::Inexact => "inexact",
            Self::Unmatched => "unmatched",
            Self::Disjoint => "disjoint",
        }
    }

    /// The equivalence seen from the target's side, for reverse translation.
    pub fn reverse(&self) -> Self {
        match self {
            Self::Wider => Self::Narrower,
            Self::Narrower => Self::Wider,
            Self::Subsumes => Self::Specializes,
            Self::Specializes => Self::Subsumes,
            other => *other,
        }
    }
}

impl fmt::Display for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Equivalence {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relatedto" => Ok(Self::RelatedTo),
            "equivalent" => Ok(Self::Equivalent),
            "equal" => Ok(Self::Equal),
            "wider" => Ok(Self::Wider),
            "subsumes" => Ok(Self::Subsumes),
            "narrower" => Ok(Self::Narrower),
            "specializes" => Ok(Self::Specializes),
            "inexact" => Ok(Self::Inexact),
            "unmatched" => Ok(Self::Unmatched),
            "disjoint" => Ok(Self::Disjoint),
            other => Err(CoreError::InvalidEquivalence(other.to_string())),
        }
    }
}

/// One curated concept-map row: source code to target code with equivalence.
///
/// The triple (`source_system`, `source_code`, `target_system`) is the
/// identity; uploads upsert on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptMapping {
    pub source_system: String,
    pub source_code: String,
    pub target_system: String,
    pub target_code: String,
    pub equivalence: Equivalence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    pub version: String,
    pub created_at: FhirDateTime,
    pub updated_at: FhirDateTime,
}

impl ConceptMapping {
    pub fn new(
        source_system: impl Into<String>,
        source_code: impl Into<String>,
        target_system: impl Into<String>,
        target_code: impl Into<String>,
        equivalence: Equivalence,
        version: impl Into<String>,
    ) -> Self {
        let now = now_utc();
        Self {
            source_system: source_system.into(),
            source_code: source_code.into(),
            target_system: target_system.into(),
            target_code: target_code.into(),
            equivalence,
            comment: None,
            provenance: None,
            version: version.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_provenance(mut self, provenance: impl Into<String>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }
}
