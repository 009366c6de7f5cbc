//! Serialization codec between wire text and in-memory values
//!
//! The wire representation for operation inputs, entity state, and operation
//! results is JSON text. Absent or empty text decodes to "no value", which is
//! distinct from a decoded empty value such as `""` or `{}`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{CodecError, CodecResult};

/// Encode a value to its wire text
pub fn encode<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string(value).map_err(CodecError::Encode)
}

/// Decode wire text into a typed value
///
/// Absent or empty text yields `None`. Malformed text is a decode error the
/// caller must treat as an operation-level failure, not a batch abort.
pub fn decode<T: DeserializeOwned>(text: Option<&str>) -> CodecResult<Option<T>> {
    match text {
        None => Ok(None),
        Some(t) if t.is_empty() => Ok(None),
        Some(t) => serde_json::from_str(t).map(Some).map_err(CodecError::Decode),
    }
}

/// Decode wire text into a dynamic JSON value
///
/// Used by the method-dispatch helper, which cannot name a concrete type for
/// operation arguments or entity state ahead of time.
pub fn decode_value(text: Option<&str>) -> CodecResult<Option<Value>> {
    decode::<Value>(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        counter: i64,
        label: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_round_trip_struct() {
        let v = Sample {
            counter: 42,
            label: "hello".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let text = encode(&v).unwrap();
        let back: Option<Sample> = decode(Some(&text)).unwrap();

        assert_eq!(back, Some(v));
    }

    #[test]
    fn test_absent_and_empty_decode_to_none() {
        assert_eq!(decode::<i64>(None).unwrap(), None);
        assert_eq!(decode::<i64>(Some("")).unwrap(), None);
    }

    #[test]
    fn test_empty_value_is_not_no_value() {
        // A decoded empty string is a value; absent text is not.
        let text = encode("").unwrap();
        let back: Option<String> = decode(Some(&text)).unwrap();
        assert_eq!(back, Some(String::new()));
    }

    #[test]
    fn test_malformed_text_is_decode_error() {
        let err = decode::<i64>(Some("{not json")).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    proptest! {
        #[test]
        fn prop_round_trip_integers(n in any::<i64>()) {
            let text = encode(&n).unwrap();
            let back: Option<i64> = decode(Some(&text)).unwrap();
            prop_assert_eq!(back, Some(n));
        }

        #[test]
        fn prop_round_trip_strings(s in ".*") {
            let text = encode(&s).unwrap();
            let back: Option<String> = decode(Some(&text)).unwrap();
            prop_assert_eq!(back, Some(s));
        }
    }
}
