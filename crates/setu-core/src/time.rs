use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// RFC3339 instant as used in FHIR `meta.lastUpdated` and record timestamps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FhirDateTime(pub OffsetDateTime);

impl FhirDateTime {
    pub fn new(datetime: OffsetDateTime) -> Self {
        Self(datetime)
    }

    pub fn inner(&self) -> &OffsetDateTime {
        &self.0
    }

    pub fn timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl fmt::Display for FhirDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|_| fmt::Error)?;
        write!(f, "{formatted}")
    }
}

impl FromStr for FhirDateTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let datetime = OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
            .map_err(|e| {
                CoreError::invalid_date_time(format!("Failed to parse FHIR DateTime '{s}': {e}"))
            })?;
        Ok(FhirDateTime(datetime))
    }
}

impl Serialize for FhirDateTime {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = self
            .0
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for FhirDateTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FhirDateTime::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub fn now_utc() -> FhirDateTime {
    FhirDateTime(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_display_is_rfc3339() {
        let dt = FhirDateTime::new(datetime!(2025-03-01 09:15:00 UTC));
        assert_eq!(dt.to_string(), "2025-03-01T09:15:00Z");
    }

    #[test]
    fn test_parse_roundtrip() {
        let dt = FhirDateTime::from_str("2025-03-01T09:15:00Z").unwrap();
        let json = serde_json::to_string(&dt).unwrap();
        assert_eq!(json, "\"2025-03-01T09:15:00Z\"");

        let back: FhirDateTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn test_parse_with_offset_normalizes() {
        let dt = FhirDateTime::from_str("2025-03-01T09:15:00+05:30").unwrap();
        let utc = dt.0.to_offset(time::UtcOffset::UTC);
        assert_eq!(utc, datetime!(2025-03-01 03:45:00 UTC));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(FhirDateTime::from_str("not-a-date").is_err());
        assert!(FhirDateTime::from_str("2025-13-01T00:00:00Z").is_err());
        assert!(FhirDateTime::from_str("").is_err());
    }

    #[test]
    fn test_ordering() {
        let earlier = FhirDateTime::new(datetime!(2025-03-01 09:15:00 UTC));
        let later = FhirDateTime::new(datetime!(2025-03-01 09:15:01 UTC));
        assert!(earlier < later);
    }

    #[test]
    fn test_now_utc_monotonic_enough() {
        let a = now_utc();
        let b = now_utc();
        assert!(b.0 >= a.0);
    }

    #[test]
    fn test_error_message_content() {
        match FhirDateTime::from_str("bad-date") {
            Err(CoreError::InvalidDateTime(msg)) => {
                assert!(msg.contains("bad-date"));
            }
            _ => panic!("Expected InvalidDateTime error"),
        }
    }
}
