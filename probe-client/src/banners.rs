//! Ad-banner job endpoints
//!
//! Submitting a banner request starts an asynchronous job on the backend and
//! returns a [`TaskHandle`]. The result and status endpoints observe the job.

use crate::BackendClient;
use crate::error::{ClientError, Result};
use crate::poller::TaskSource;
use async_trait::async_trait;
use probe_core::domain::credential::Credential;
use probe_core::domain::task::{TaskHandle, TaskStatus};
use serde_json::Value;

impl BackendClient {
    // =============================================================================
    // Banner Jobs
    // =============================================================================

    /// Submit a banner-generation job
    ///
    /// # Returns
    /// The handle of the new job
    pub async fn submit_banner(&self, credential: &Credential) -> Result<TaskHandle> {
        let url = self.url("/ad/ad-banner");
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await?;

        let raw: String = self.handle_response(response).await?;
        TaskHandle::new(raw)
            .map_err(|_| ClientError::Schema("banner submission returned an empty task id".into()))
    }

    /// Fetch the result of a banner job
    ///
    /// # Returns
    /// `Some(payload)` once the job finished, `None` while it is still running.
    /// An unknown handle yields [`ClientError::NotFound`].
    pub async fn banner_result(
        &self,
        credential: &Credential,
        handle: &TaskHandle,
    ) -> Result<Option<Value>> {
        let url = self.url_with_segment("/ad/ad-banner/result", handle.as_str())?;
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.token())
            .send()
            .await?;

        let data: Value = self.handle_response(response).await?;
        Ok(match data {
            Value::Null => None,
            payload => Some(payload),
        })
    }

    /// Fetch the status of a banner job
    pub async fn banner_status(
        &self,
        credential: &Credential,
        handle: &TaskHandle,
    ) -> Result<TaskStatus> {
        let url = self.url_with_segment("/ad/ad-banner/status", handle.as_str())?;
        let response = self
            .client
            .get(url)
            .bearer_auth(credential.token())
            .send()
            .await?;

        self.handle_response(response).await
    }
}

#[async_trait]
impl TaskSource for BackendClient {
    async fn fetch_result(
        &self,
        credential: &Credential,
        handle: &TaskHandle,
    ) -> Result<Option<Value>> {
        self.banner_result(credential, handle).await
    }

    async fn fetch_status(&self, credential: &Credential, handle: &TaskHandle) -> Result<TaskStatus> {
        self.banner_status(credential, handle).await
    }
}
