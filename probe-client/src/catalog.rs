//! Catalog and recommendation endpoints

use crate::BackendClient;
use crate::error::Result;
use probe_core::domain::credential::Credential;
use probe_core::dto::catalog::Recommendation;
use serde_json::Value;

impl BackendClient {
    // =============================================================================
    // Catalog
    // =============================================================================

    /// List all plans
    pub async fn list_plans(&self) -> Result<Vec<Value>> {
        self.get_list("/plans").await
    }

    /// List all value-added services
    pub async fn list_vass(&self) -> Result<Vec<Value>> {
        self.get_list("/vass").await
    }

    /// List all life coupons
    pub async fn list_coupons(&self) -> Result<Vec<Value>> {
        self.get_list("/coupons").await
    }

    /// Fetch personalised recommendations for the credential's user
    ///
    /// The response must carry all of `plans`, `vass` and `coupons`.
    pub async fn recommend(&self, credential: &Credential) -> Result<Recommendation> {
        let url = self.url("/recommend");
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
