//! Data Transfer Objects for the backend API
//!
//! Wire shapes of the endpoints the harness drives. Every response from the
//! backend is wrapped in an [`ApiEnvelope`] whose `data` field carries the
//! actual content.

pub mod auth;
pub mod banner;
pub mod catalog;

use serde::{Deserialize, Serialize};

/// Common `{ data, message, code }` response wrapper
///
/// `data` is required on the wire; a null `data` deserializes only when `T`
/// accepts null (e.g. `Option<_>` or `serde_json::Value`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_envelope_requires_data_field() {
        let env: ApiEnvelope<Option<Value>> =
            serde_json::from_str(r#"{"data": null, "message": "ok"}"#).unwrap();
        assert!(env.data.is_none());
        assert_eq!(env.message.as_deref(), Some("ok"));

        // A missing field is not the same as an explicit null
        assert!(serde_json::from_str::<ApiEnvelope<String>>(r#"{"message": "ok"}"#).is_err());
        assert!(serde_json::from_str::<ApiEnvelope<String>>(r#"{"data": 5}"#).is_err());
    }
}
