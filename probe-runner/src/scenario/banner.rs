//! Banner scenario
//!
//! Submits a banner-generation job, checks the submission's status and
//! latency, then follows the job through the result endpoint.

use anyhow::Result;
use async_trait::async_trait;
use probe_client::TaskHandle;
use std::time::Duration;
use tracing::warn;

use super::Scenario;
use crate::context::VuContext;

const SUBMIT_REQUEST: &str = "ad-banner";
const SUBMIT_PATH: &str = "/ad/ad-banner";
const SUBMIT_LATENCY_LIMIT: Duration = Duration::from_millis(1000);

pub const CHECK_ACCEPTED: &str = "banner submission accepted (2xx)";
pub const CHECK_LATENCY: &str = "banner response time < 1000ms";
pub const CHECK_TASK_ID: &str = "banner task id present";
pub const CHECK_COMPLETED: &str = "banner result completed";

pub struct BannerScenario;

#[async_trait]
impl Scenario for BannerScenario {
    fn name(&self) -> &'static str {
        "banner"
    }

    fn requires_login(&self) -> bool {
        true
    }

    async fn iteration(&self, ctx: &VuContext) -> Result<()> {
        let credential = ctx.credential()?;

        let response = ctx.get(SUBMIT_REQUEST, SUBMIT_PATH, Some(credential)).await;

        let accepted = ctx.check(
            CHECK_ACCEPTED,
            response.as_ref().is_some_and(|r| r.status.is_success()),
        );
        ctx.check(
            CHECK_LATENCY,
            response
                .as_ref()
                .is_some_and(|r| r.duration < SUBMIT_LATENCY_LIMIT),
        );

        let Some(response) = response else {
            return Ok(());
        };
        if !accepted {
            return Ok(());
        }

        let handle = match response.data::<TaskHandle>() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("VU {}: banner submission without task id: {}", ctx.vu, e);
                ctx.check(CHECK_TASK_ID, false);
                return Ok(());
            }
        };
        ctx.check(CHECK_TASK_ID, true);

        if !ctx.poll_results {
            return Ok(());
        }

        let result = ctx
            .poller
            .poll_result(&*ctx.client, &handle, credential)
            .await;

        ctx.record_poll(&result);
        ctx.check(
            CHECK_COMPLETED,
            result.as_ref().is_ok_and(|outcome| outcome.is_completed()),
        );

        Ok(())
    }
}
