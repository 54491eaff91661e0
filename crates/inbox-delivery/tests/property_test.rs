//! Property-based tests for dispatch aggregation.
//!
//! Generates sets of webhooks with random categories, enabled flags and
//! response codes, dispatches one item, and checks the aggregate status
//! and retry count against the selection and aggregation rules.

#![allow(clippy::unwrap_used)]

use inbox_core::{Category, ContentKind, UploadStatus};
use inbox_delivery::{client::is_success_status, DispatchOutcome};
use inbox_testing::{http::mock_webhook, ContentBuilder, TestEnv, WebhookBuilder};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct HookSpec {
    categories: Vec<Category>,
    enabled: bool,
    status: u16,
}

fn category_strategy() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Photo),
        Just(Category::Gallery),
        Just(Category::Note),
        Just(Category::All),
    ]
}

fn hook_strategy() -> impl Strategy<Value = HookSpec> {
    (
        prop::collection::vec(category_strategy(), 0..3),
        prop::bool::weighted(0.8),
        prop_oneof![Just(200u16), Just(204), Just(301), Just(400), Just(404), Just(500), Just(503)],
    )
        .prop_map(|(categories, enabled, status)| HookSpec { categories, enabled, status })
}

fn kind_strategy() -> impl Strategy<Value = ContentKind> {
    prop_oneof![Just(ContentKind::Photo), Just(ContentKind::Gallery), Just(ContentKind::Note)]
}

fn builder_for(kind: ContentKind) -> ContentBuilder {
    match kind {
        ContentKind::Photo => ContentBuilder::photo(),
        ContentKind::Gallery => ContentBuilder::gallery(),
        ContentKind::Note => ContentBuilder::note("property"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn aggregate_status_follows_matching_webhooks(
        hooks in prop::collection::vec(hook_strategy(), 0..4),
        kind in kind_strategy(),
        prior_failures in 0u32..3,
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let env = TestEnv::new().await.unwrap();
            for (index, hook) in hooks.iter().enumerate() {
                let route = format!("/hook-{index}");
                mock_webhook(&env.http_mock, &route, hook.status, None).await;
                let mut builder = WebhookBuilder::accepting(&hook.categories);
                if !hook.enabled {
                    builder = builder.disabled();
                }
                env.create_webhook(&route, builder).await;
            }
            let id = env.create_item(builder_for(kind).failed(prior_failures)).await;
            let before = env.item(id).await;

            let outcome = env.dispatch(id).await;
            let after = env.item(id).await;

            let targeted: Vec<&HookSpec> = hooks
                .iter()
                .filter(|hook| hook.enabled)
                .filter(|hook| {
                    hook.categories
                        .iter()
                        .any(|c| *c == Category::All || *c == Category::from(kind))
                })
                .collect();
            let successes = targeted.iter().filter(|hook| is_success_status(hook.status)).count();

            assert_eq!(outcome.attempts(), targeted.len());
            if targeted.is_empty() {
                assert_eq!(outcome, DispatchOutcome::NoApplicableWebhooks);
                assert_eq!(after.upload_status, before.upload_status);
                assert_eq!(after.retry_count, before.retry_count);
            } else if successes > 0 {
                assert_eq!(after.upload_status, UploadStatus::Success);
                assert_eq!(after.retry_count, before.retry_count);
            } else {
                assert_eq!(after.upload_status, UploadStatus::Failed);
                assert_eq!(after.retry_count, before.retry_count + 1);
            }
        });
    }
}
