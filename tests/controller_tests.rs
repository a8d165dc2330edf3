mod common;

use std::sync::Arc;

use callcenter_chat::{
    message::ClassificationResponse,
    services::{
        chat_history::{ChatHistory, EntryBody, EntryRole, FAILURE_GUIDANCE},
        controller::{ControllerState, SubmitOutcome, TicketController},
        renderer::ConfidenceSource,
        router_client::HttpRouterClient,
    },
};
use common::{FakeApi, Script, billing, closed_addr};
use std::time::Duration;

fn controller_with(api: Arc<FakeApi>) -> (Arc<TicketController>, ChatHistory) {
    let history = ChatHistory::new();
    let controller = Arc::new(TicketController::new(api, Arc::new(history.clone())));
    (controller, history)
}

#[tokio::test]
async fn successful_submission_appends_user_then_reply_and_clears_input() {
    let api = Arc::new(FakeApi::responding(billing()));
    let (controller, history) = controller_with(api.clone());

    controller.set_input("  I was charged twice  ").await;
    let outcome = controller.submit_input().await;

    let SubmitOutcome::Classified(reply) = outcome else {
        panic!("expected a classification, got {outcome:?}");
    };
    assert_eq!(reply.category, "billing");
    assert_eq!(api.calls(), 1);

    let entries = history.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, EntryRole::User);
    assert_eq!(entries[0].body, EntryBody::Text("I was charged twice".to_string()));
    assert_eq!(entries[1].role, EntryRole::Agent);
    assert!(entries[1].as_reply().is_some());

    assert_eq!(controller.input().await, "");
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test]
async fn whitespace_input_is_rejected_without_a_request() {
    let api = Arc::new(FakeApi::responding(billing()));
    let (controller, history) = controller_with(api.clone());

    assert_eq!(controller.submit("").await, SubmitOutcome::EmptyInput);
    assert_eq!(controller.submit(" \n\t ").await, SubmitOutcome::EmptyInput);

    assert_eq!(api.calls(), 0);
    assert!(history.is_empty().await);
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test]
async fn user_entry_is_visible_before_the_request_resolves() {
    let api = Arc::new(FakeApi::responding(billing()).gated());
    let (controller, history) = controller_with(api.clone());

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("VPN keeps disconnecting").await })
    };

    api.started.notified().await;
    assert_eq!(controller.state(), ControllerState::Submitting);
    let entries = history.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, EntryRole::User);

    api.release.notify_one();
    let outcome = task.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Classified(_)));
    assert_eq!(history.len().await, 2);
}

#[tokio::test]
async fn second_submit_while_in_flight_is_rejected() {
    let api = Arc::new(FakeApi::responding(billing()).gated());
    let (controller, history) = controller_with(api.clone());

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("first ticket").await })
    };
    api.started.notified().await;

    assert_eq!(controller.submit("second ticket").await, SubmitOutcome::Busy);
    assert_eq!(controller.submit("   ").await, SubmitOutcome::Busy);
    assert_eq!(api.calls(), 1);
    assert_eq!(history.count_role(EntryRole::User).await, 1);

    api.release.notify_one();
    first.await.unwrap();

    assert_eq!(controller.state(), ControllerState::Idle);
    let outcome = controller.submit("third ticket").await;
    assert!(matches!(outcome, SubmitOutcome::Classified(_)));
    assert_eq!(api.calls(), 2);
    assert_eq!(history.count_role(EntryRole::User).await, 2);
}

#[tokio::test]
async fn logical_error_is_rendered_as_agent_failure() {
    let api = Arc::new(FakeApi::responding(ClassificationResponse {
        error: Some("Model not loaded".to_string()),
        ..Default::default()
    }));
    let (controller, history) = controller_with(api);

    controller.set_input("printer offline").await;
    let outcome = controller.submit_input().await;

    let SubmitOutcome::Failed(notice) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(notice.message, "Model not loaded");
    assert_eq!(notice.guidance, FAILURE_GUIDANCE);

    let entries = history.entries().await;
    assert_eq!(entries.len(), 2);
    assert!(entries[1].is_failure());
    assert!(history.last_reply().await.is_none());
    // failed submissions keep the text for a retry
    assert_eq!(controller.input().await, "printer offline");
}

#[tokio::test]
async fn non_success_status_is_a_transport_failure() {
    let api = Arc::new(FakeApi::new(Script::FailStatus(500)));
    let (controller, history) = controller_with(api.clone());

    let SubmitOutcome::Failed(notice) = controller.submit("cannot log in").await else {
        panic!("expected failure");
    };
    assert_eq!(notice.guidance, FAILURE_GUIDANCE);
    assert!(notice.message.contains("500"));
    assert_eq!(history.count_role(EntryRole::Agent).await, 1);
    assert!(history.last_reply().await.is_none());

    api.set_script(Script::Respond(billing()));
    assert!(matches!(controller.submit("cannot log in").await, SubmitOutcome::Classified(_)));
}

#[tokio::test]
async fn network_rejection_returns_controller_to_idle() {
    let addr = closed_addr().await;
    let api = Arc::new(HttpRouterClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap());
    let history = ChatHistory::new();
    let controller = TicketController::new(api, Arc::new(history.clone()));

    let outcome = controller.submit("monitor flickers").await;

    assert!(matches!(outcome, SubmitOutcome::Failed(ref n) if n.guidance == FAILURE_GUIDANCE));
    let entries = history.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, EntryRole::User);
    assert!(entries[1].is_failure());
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test]
async fn timeout_is_reported_like_a_transport_failure() {
    let api = Arc::new(FakeApi::new(Script::FailTimeout));
    let (controller, history) = controller_with(api);

    let SubmitOutcome::Failed(notice) = controller.submit("slow ticket").await else {
        panic!("expected failure");
    };
    assert_eq!(notice.guidance, FAILURE_GUIDANCE);
    assert!(history.last().await.unwrap().is_failure());
    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test]
async fn clear_input_leaves_history_alone() {
    let api = Arc::new(FakeApi::responding(billing()));
    let (controller, history) = controller_with(api);

    controller.submit("refund please").await;
    controller.set_input("draft").await;
    controller.clear_input().await;

    assert_eq!(controller.input().await, "");
    assert_eq!(history.len().await, 2);
}

#[tokio::test]
async fn dropped_submission_releases_the_flag() {
    let api = Arc::new(FakeApi::responding(billing()).gated());
    let (controller, _history) = controller_with(api.clone());

    let task = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.submit("abandoned").await })
    };
    api.started.notified().await;
    task.abort();
    let _ = task.await;

    assert_eq!(controller.state(), ControllerState::Idle);
}

#[tokio::test]
async fn fallback_confidence_flows_through_submission() {
    let api = Arc::new(FakeApi::responding(ClassificationResponse {
        prediction: "hardware".to_string(),
        model_used: Some("tfidf".to_string()),
        ..Default::default()
    }));
    let (controller, _history) = controller_with(api);

    let SubmitOutcome::Classified(reply) = controller.submit("keyboard broken").await else {
        panic!("expected classification");
    };
    assert_eq!(reply.confidence.value, 0.85);
    assert_eq!(reply.confidence.source, ConfidenceSource::ModelFallback);
}

#[tokio::test]
async fn server_and_transport_failures_share_one_notice_shape() {
    let server_side = Arc::new(FakeApi::responding(ClassificationResponse {
        error: Some("Model not loaded".to_string()),
        ..Default::default()
    }));
    let (controller, server_history) = controller_with(server_side);
    let SubmitOutcome::Failed(server_notice) = controller.submit("printer offline").await else {
        panic!("expected failure");
    };

    let transport = Arc::new(FakeApi::new(Script::FailStatus(502)));
    let (controller, transport_history) = controller_with(transport);
    let SubmitOutcome::Failed(transport_notice) = controller.submit("printer offline").await else {
        panic!("expected failure");
    };

    assert_eq!(server_notice.guidance, transport_notice.guidance);
    assert_ne!(server_notice.message, transport_notice.message);
    assert_eq!(server_notice.message, "Model not loaded");

    for history in [server_history, transport_history] {
        let entries = history.entries().await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].role, EntryRole::Agent);
        assert!(entries[1].is_failure());
    }
}

#[tokio::test]
async fn success_body_without_prediction_is_a_failure() {
    let api = Arc::new(FakeApi::responding(ClassificationResponse::default()));
    let (controller, history) = controller_with(api);
    controller.set_input("mouse unresponsive").await;

    let outcome = controller.submit_input().await;

    let SubmitOutcome::Failed(notice) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(notice.guidance, FAILURE_GUIDANCE);
    assert!(notice.message.contains("no prediction"));
    assert!(history.last_reply().await.is_none());
    assert_eq!(history.len().await, 2);
    assert_eq!(controller.input().await, "mouse unresponsive");
}
