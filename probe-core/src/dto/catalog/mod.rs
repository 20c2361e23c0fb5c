//! Catalog and recommendation DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `data` of `GET /recommend`
///
/// The three product lists are required; their items stay opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub plans: Vec<Value>,
    pub vass: Vec<Value>,
    pub coupons: Vec<Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Recommendation {
    pub fn total_items(&self) -> usize {
        self.plans.len() + self.vass.len() + self.coupons.len()
    }
}
