//! Catalog scenario
//!
//! Reads the three public product lists one after another. Each request is
//! tagged by list name and checked against two latency limits.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::Scenario;
use crate::context::VuContext;

/// Tag and path of every list read per iteration
const LISTS: [(&str, &str); 3] = [("plans", "/plans"), ("vass", "/vass"), ("coupons", "/coupons")];

const LATENCY_TARGET: Duration = Duration::from_millis(500);
const LATENCY_LIMIT: Duration = Duration::from_millis(1000);

pub struct CatalogScenario;

#[async_trait]
impl Scenario for CatalogScenario {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn requires_login(&self) -> bool {
        false
    }

    async fn iteration(&self, ctx: &VuContext) -> Result<()> {
        for (name, path) in LISTS {
            let response = ctx.get(name, path, None).await;

            ctx.check(
                &format!("{} status is 200", name),
                response.as_ref().is_some_and(|r| r.status == StatusCode::OK),
            );
            for limit in [LATENCY_TARGET, LATENCY_LIMIT] {
                ctx.check(
                    &format!("{} response time < {}ms", name, limit.as_millis()),
                    response.as_ref().is_some_and(|r| r.duration < limit),
                );
            }
        }

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
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reads_all_lists() {
        let mock_server = MockServer::start().await;

        for list in ["/plans", "/vass"] {
            Mock::given(method("GET"))
                .and(path(list))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
                .expect(1)
                .mount(&mock_server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/coupons"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let metrics = InMemoryMetrics::new();
        let ctx = testing::context(&mock_server.uri(), &metrics);

        CatalogScenario.iteration(&ctx).await.unwrap();

        let summary = metrics.summarize("catalog", Utc::now(), Utc::now());
        assert_eq!(summary.checks["plans status is 200"].passes, 1);
        assert_eq!(summary.checks["vass status is 200"].passes, 1);
        assert_eq!(summary.checks["coupons status is 200"].fails, 1);
        assert!(summary.checks.contains_key("plans response time < 500ms"));
        assert!(summary.checks.contains_key("coupons response time < 1000ms"));
        assert_eq!(summary.checks.len(), 9);
        assert_eq!(summary.requests.len(), 3);
        assert_eq!(summary.failed_requests, 1);
    }
}
