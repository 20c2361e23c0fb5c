//! Ad-banner DTOs

use serde::{Deserialize, Serialize};

/// A generated banner suggestion
///
/// The result endpoint returns it as an opaque payload; this is the shape the
/// backend currently produces and is only used for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerSuggestion {
    pub vas_id: i64,
    pub vas_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl BannerSuggestion {
    /// Interprets an opaque result payload, if it has the known shape
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload() {
        let payload = json!({ "vasId": 3, "vasName": "Music", "description": "Try it" });
        let banner = BannerSuggestion::from_payload(&payload).unwrap();
        assert_eq!(banner.vas_id, 3);
        assert_eq!(banner.vas_name, "Music");

        assert!(BannerSuggestion::from_payload(&json!({ "id": 7 })).is_none());
    }
}
