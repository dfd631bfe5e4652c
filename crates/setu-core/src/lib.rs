pub mod concept;
pub mod error;
pub mod fhir;
pub mod mapping;
pub mod time;

pub use concept::Concept;
pub use error::{CoreError, ErrorCategory, Result};
pub use fhir::{CodeableConcept, Coding, ICD11_MMS_URI, NAMASTE_SYSTEM_URI, is_icd11_system};
pub use mapping::{ConceptMapping, Equivalence};
pub use time::{FhirDateTime, now_utc};
