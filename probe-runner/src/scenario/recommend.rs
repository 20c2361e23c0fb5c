//! Recommendation scenario
//!
//! Fetches personalised recommendations. The backend does real work here,
//! so the latency limits are wider than for plain catalog reads.

use anyhow::Result;
use async_trait::async_trait;
use probe_core::dto::catalog::Recommendation;
use reqwest::StatusCode;
use std::time::Duration;

use super::Scenario;
use crate::context::VuContext;

const REQUEST: &str = "recommend";
const PATH: &str = "/recommend";

const LATENCY_TARGET: Duration = Duration::from_millis(3000);
const LATENCY_LIMIT: Duration = Duration::from_millis(5000);

pub const CHECK_STATUS: &str = "recommend status is 200";
pub const CHECK_DATA: &str = "recommendation data present";

pub struct RecommendScenario;

#[async_trait]
impl Scenario for RecommendScenario {
    fn name(&self) -> &'static str {
        "recommend"
    }

    fn requires_login(&self) -> bool {
        true
    }

    async fn iteration(&self, ctx: &VuContext) -> Result<()> {
        let credential = ctx.credential()?;
        let response = ctx.get(REQUEST, PATH, Some(credential)).await;

        ctx.check(
            CHECK_STATUS,
            response.as_ref().is_some_and(|r| r.status == StatusCode::OK),
        );
        for limit in [LATENCY_TARGET, LATENCY_LIMIT] {
            ctx.check(
                &format!("recommend response time < {}ms", limit.as_millis()),
                response.as_ref().is_some_and(|r| r.duration < limit),
            );
        }
        ctx.check(
            CHECK_DATA,
            response
                .as_ref()
                .is_some_and(|r| r.data::<Recommendation>().is_ok()),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::testing;
    use crate::service::InMemoryMetrics;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn run_against(body: serde_json::Value) -> probe_core::domain::report::RunSummary {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(PATH))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let metrics = InMemoryMetrics::new();
        let ctx = testing::context(&mock_server.uri(), &metrics);
        RecommendScenario.iteration(&ctx).await.unwrap();
        metrics.summarize("recommend", Utc::now(), Utc::now())
    }

    #[tokio::test]
    async fn test_complete_recommendation_passes() {
        let summary = run_against(json!({
            "data": { "plans": [{ "id": 1 }], "vass": [], "coupons": [] }
        }))
        .await;

        assert_eq!(summary.checks[CHECK_STATUS].passes, 1);
        assert_eq!(summary.checks[CHECK_DATA].passes, 1);
        assert_eq!(summary.checks["recommend response time < 5000ms"].passes, 1);
        assert!(!summary.has_failed_checks());
    }

    #[tokio::test]
    async fn test_incomplete_recommendation_fails_data_check() {
        let summary = run_against(json!({ "data": { "plans": [], "vass": [] } })).await;

        assert_eq!(summary.checks[CHECK_STATUS].passes, 1);
        assert_eq!(summary.checks[CHECK_DATA].fails, 1);
    }
}
