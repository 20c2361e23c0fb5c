//! Scenarios
//!
//! A scenario is the request mix one virtual user runs per iteration. Each
//! iteration issues its requests, evaluates named checks on the responses
//! and reports into the metrics sink. The pause between iterations is the
//! scheduler's business.

mod banner;
mod catalog;
mod recommend;

pub use banner::BannerScenario;
pub use catalog::CatalogScenario;
pub use recommend::RecommendScenario;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ScenarioKind;
use crate::context::VuContext;

/// One request mix driven by every virtual user
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Name used in logs and the summary
    fn name(&self) -> &'static str;

    /// Whether VUs need a bearer credential
    fn requires_login(&self) -> bool;

    /// Runs one iteration
    ///
    /// Request failures are recorded as failed checks, not returned. An
    /// error means the iteration could not run at all.
    async fn iteration(&self, ctx: &VuContext) -> Result<()>;
}

/// Creates the scenario for a configured kind
pub fn build(kind: ScenarioKind) -> Arc<dyn Scenario> {
    match kind {
        ScenarioKind::Banner => Arc::new(BannerScenario),
        ScenarioKind::Catalog => Arc::new(CatalogScenario),
        ScenarioKind::Recommend => Arc::new(RecommendScenario),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use probe_client::{BackendClient, PollPolicy, TaskPoller};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::context::VuContext;
    use crate::service::InMemoryMetrics;
    use probe_client::Credential;

    /// A VU context against `base_url` with a fast poller
    pub fn context(base_url: &str, metrics: &InMemoryMetrics) -> VuContext {
        VuContext::new(
            0,
            Arc::new(BackendClient::new(base_url)),
            Some(Credential::new("test-token")),
            TaskPoller::new(PollPolicy {
                max_attempts: 3,
                interval: Duration::from_millis(10),
            })
            .unwrap(),
            true,
            Arc::new(metrics.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_kind() {
        assert_eq!(build(ScenarioKind::Banner).name(), "banner");
        assert!(build(ScenarioKind::Banner).requires_login());
        assert_eq!(build(ScenarioKind::Catalog).name(), "catalog");
        assert!(!build(ScenarioKind::Catalog).requires_login());
        assert_eq!(build(ScenarioKind::Recommend).name(), "recommend");
        assert!(build(ScenarioKind::Recommend).requires_login());
    }
}
