//! JSON graphics descriptors.
//!
//! A descriptor is the `<name>.json` file that sits next to every asset.
//! It is a flat JSON object; this module only provides typed access to its
//! fields; each item variant decides which fields it reads.

use serde_json::{Map, Value};

use super::error::SpecValidationError;

/// A parsed descriptor object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    fields: Map<String, Value>,
}

impl Descriptor {
    /// Parse descriptor text. The top level value must be an object.
    pub fn parse(text: &str) -> Result<Self, SpecValidationError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| SpecValidationError::new("json", format!("Invalid graphics json: {}", e)))?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(SpecValidationError::new("json", "graphics json must be an object")),
        }
    }

    /// Raw value of a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// First key of `keys` present in the descriptor, with its value.
    pub fn lookup<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &Value)> {
        keys.iter().find_map(|key| self.fields.get(*key).map(|value| (*key, value)))
    }

    /// A string field, if present.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>, SpecValidationError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(SpecValidationError::new(key, "must be a string")),
        }
    }

    /// A non-negative integer field, if present.
    ///
    /// Numeric strings are accepted as well, as long as they hold an integer.
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>, SpecValidationError> {
        let invalid = |value: &Value| {
            SpecValidationError::new(key, format!("must be a non-negative integer, got {}", value))
        };

        match self.fields.get(key) {
            None => Ok(None),
            Some(value @ Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| invalid(value)),
            Some(value @ Value::String(s)) => {
                s.trim().parse::<u32>().map(Some).map_err(|_| invalid(value))
            }
            Some(value) => Err(invalid(value)),
        }
    }

    /// An integer field that must be present.
    pub fn require_u32(&self, key: &str) -> Result<u32, SpecValidationError> {
        self.get_u32(key)?.ok_or_else(|| SpecValidationError::missing(key))
    }

    /// A boolean toggle, if present. `0`/`1` are accepted as `false`/`true`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, SpecValidationError> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(Some(false)),
            Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(Some(true)),
            Some(other) => {
                Err(SpecValidationError::new(key, format!("must be a boolean, got {}", other)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_object() {
        assert!(Descriptor::parse("[1, 2]").is_err());
        assert!(Descriptor::parse("{").is_err());
        assert!(Descriptor::parse("{}").is_ok());
    }

    #[test]
    fn test_lookup_uses_first_present_key() {
        let d = Descriptor::parse(r#"{"b": 2, "c": 3}"#).unwrap();
        let (key, value) = d.lookup(&["a", "b", "c"]).unwrap();
        assert_eq!(key, "b");
        assert_eq!(value, &Value::from(2));
        assert!(d.lookup(&["x", "y"]).is_none());
    }

    #[test]
    fn test_get_u32() {
        let d = Descriptor::parse(r#"{"h": 16, "s": "32", "neg": -1, "f": 1.5, "b": true}"#).unwrap();
        assert_eq!(d.get_u32("h").unwrap(), Some(16));
        assert_eq!(d.get_u32("s").unwrap(), Some(32));
        assert_eq!(d.get_u32("missing").unwrap(), None);
        assert!(d.get_u32("neg").is_err());
        assert!(d.get_u32("f").is_err());
        assert!(d.get_u32("b").is_err());
    }

    #[test]
    fn test_require_u32_missing() {
        let d = Descriptor::parse("{}").unwrap();
        let err = d.require_u32("height").unwrap_err();
        assert_eq!(err.field, "height");
    }

    #[test]
    fn test_get_bool() {
        let d = Descriptor::parse(r#"{"a": false, "b": 1, "c": "yes"}"#).unwrap();
        assert_eq!(d.get_bool("a").unwrap(), Some(false));
        assert_eq!(d.get_bool("b").unwrap(), Some(true));
        assert_eq!(d.get_bool("z").unwrap(), None);
        assert!(d.get_bool("c").is_err());
    }

    #[test]
    fn test_get_str() {
        let d = Descriptor::parse(r#"{"type": "sprite", "n": 4}"#).unwrap();
        assert_eq!(d.get_str("type").unwrap(), Some("sprite"));
        assert!(d.get_str("n").is_err());
    }
}
