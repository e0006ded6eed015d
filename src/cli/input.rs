//! Reading JSON requests.

use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Parses a request from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a valid request.
pub fn parse_request<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(text)?)
}

/// Reads a request from `path`, or from stdin when `path` is `None`.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed.
pub fn read_request<T: DeserializeOwned>(path: Option<&Path>) -> Result<T> {
    let text = match path {
        Some(path) => {
            debug!("Reading request from {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            debug!("Reading request from stdin");
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    parse_request(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::property::PropertyValue;
    use crate::resources::{CreateRequest, DiffRequest};
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_request_from_file() {
        let file = NamedTempFile::new().expect("tempfile");
        std::fs::write(
            file.path(),
            r#"{
                "urn": "urn:pulumi:dev::infra::pulumiservice:index:AccessToken::ci",
                "properties": {
                    "description": "ci",
                    "value": {"4dabf18193072939515e22adb298388d": "1b47061264138c4ac30d75fd1eb44270", "value": "pul-x"}
                }
            }"#,
        )
        .expect("write");

        let request: CreateRequest = read_request(Some(file.path())).expect("read");
        assert_eq!(request.properties.get_str("description"), Some("ci"));
        assert_eq!(request.properties["value"], PropertyValue::secret("pul-x"));
        assert!(request.timeout.abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_request() {
        let err = parse_request::<DiffRequest>("{\"urn\": 3}").expect_err("parse");
        assert!(matches!(err, ProviderError::Json(_)));
    }
}
