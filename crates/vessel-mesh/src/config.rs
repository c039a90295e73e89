//! TOML loading for parameter types.
//!
//! Available with the `config` feature. Parameter structs in the downstream
//! crates derive serde traits and delegate their `from_toml*` helpers here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur when loading or saving parameter files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Parse a value from a TOML string.
pub fn from_toml<T: DeserializeOwned>(toml_str: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(toml_str)?)
}

/// Parse a value from a TOML file.
pub fn from_toml_file<T: DeserializeOwned>(
    path: impl AsRef<std::path::Path>,
) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    from_toml(&contents)
}

/// Serialize a value to a pretty TOML string.
pub fn to_toml<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Sample {
        radius: f64,
        #[serde(default)]
        invert: bool,
    }

    #[test]
    fn test_toml_roundtrip() {
        let s = Sample {
            radius: 2.5,
            invert: true,
        };
        let text = to_toml(&s).unwrap();
        assert_eq!(from_toml::<Sample>(&text).unwrap(), s);
    }

    #[test]
    fn test_missing_file() {
        let err = from_toml_file::<Sample>("/nonexistent/params.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            from_toml::<Sample>("radius = \"wide\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
