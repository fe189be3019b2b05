//! Identity types for creature records.

use crate::{define_id, IdError};

define_id!(CreatureId, "crt");
define_id!(RequestId, "req");

// =============================================================================
// Sequence Number
// =============================================================================

/// Caller-facing numeric identity of a creature (its "number").
///
/// Always strictly positive. Distinct from the store-assigned [`CreatureId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceNumber(i32);

impl SequenceNumber {
    /// Creates a sequence number, rejecting zero and negative values.
    pub fn new(value: i32) -> Result<Self, IdError> {
        if value < 1 {
            return Err(IdError::InvalidSequence(format!(
                "{value} is not a positive integer"
            )));
        }
        Ok(Self(value))
    }

    /// Parses a plain decimal sequence number such as `"25"`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        let value = s
            .parse::<i32>()
            .map_err(|e| IdError::InvalidSequence(format!("'{s}': {e}")))?;
        Self::new(value)
    }

    /// Converts an already-parsed number, accepting only exact integers in
    /// range.
    pub fn from_f64(value: f64) -> Result<Self, IdError> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(IdError::InvalidSequence(format!(
                "{value} is not an integer"
            )));
        }
        if value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
            return Err(IdError::InvalidSequence(format!(
                "{value} is out of range"
            )));
        }
        Self::new(value as i32)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SequenceNumber {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for SequenceNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SequenceNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_creature_id_roundtrip() {
        let id = CreatureId::new();
        let s = id.to_string();
        let parsed: CreatureId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_creature_id_prefix() {
        let id = CreatureId::new();
        assert!(id.to_string().starts_with("crt_"));
        assert_eq!(id.to_string().len(), CreatureId::ENCODED_LEN);
    }

    #[test]
    fn test_creature_id_invalid_prefix() {
        let result: Result<CreatureId, _> = "req_01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(
            result.unwrap_err(),
            IdError::InvalidPrefix { .. }
        ));
    }

    #[test]
    fn test_creature_id_missing_separator() {
        let result: Result<CreatureId, _> = "crt01HV4Z2WQXKJNM8GPQY6VBKC3D".parse();
        assert!(matches!(result.unwrap_err(), IdError::MissingSeparator));
    }

    #[test]
    fn test_creature_id_empty() {
        let result: Result<CreatureId, _> = "".parse();
        assert!(result.unwrap_err().is_empty());
    }

    #[test]
    fn test_creature_id_invalid_ulid() {
        let result: Result<CreatureId, _> = "crt_pikachu".parse();
        assert!(matches!(result.unwrap_err(), IdError::InvalidUlid(_)));
    }

    #[test]
    fn test_is_valid_rejects_names_and_numbers() {
        assert!(!CreatureId::is_valid("pikachu"));
        assert!(!CreatureId::is_valid("25"));
        assert!(!CreatureId::is_valid(" crt_01HV4Z2WQXKJNM8GPQY6VBKC3D"));
        assert!(CreatureId::is_valid("crt_01HV4Z2WQXKJNM8GPQY6VBKC3D"));
    }

    #[test]
    fn test_creature_id_json_roundtrip() {
        let id = CreatureId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: CreatureId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_prefixes_unique() {
        assert_ne!(CreatureId::PREFIX, RequestId::PREFIX);
    }

    #[test]
    fn test_sequence_number_rejects_non_positive() {
        assert!(SequenceNumber::new(0).is_err());
        assert!(SequenceNumber::new(-4).is_err());
        assert_eq!(SequenceNumber::new(25).unwrap().value(), 25);
    }

    #[test]
    fn test_sequence_number_from_f64() {
        assert_eq!(SequenceNumber::from_f64(25.0).unwrap().value(), 25);
        assert!(SequenceNumber::from_f64(2.5).is_err());
        assert!(SequenceNumber::from_f64(f64::NAN).is_err());
        assert!(SequenceNumber::from_f64(1e12).is_err());
    }

    #[test]
    fn test_sequence_number_json() {
        let no: SequenceNumber = serde_json::from_str("151").unwrap();
        assert_eq!(serde_json::to_string(&no).unwrap(), "151");
        assert!(serde_json::from_str::<SequenceNumber>("0").is_err());
    }

    proptest! {
        #[test]
        fn prop_sequence_number_display_parses_back(value in 1i32..=i32::MAX) {
            let no = SequenceNumber::new(value).unwrap();
            prop_assert_eq!(no.to_string().parse::<SequenceNumber>().unwrap(), no);
        }

        #[test]
        fn prop_names_are_never_ids(name in "[a-z ]{1,40}") {
            prop_assert!(!CreatureId::is_valid(&name));
        }
    }
}
