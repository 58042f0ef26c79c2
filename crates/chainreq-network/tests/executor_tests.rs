//! Request executor integration tests

use chainreq_ledger::{BlockHeightSource, BlockRouter, DEFAULT_RETENTION_WINDOW};
use chainreq_network::{
    Backends, ExtensionBackend, HttpBody, HttpResponse, RequestExecutor,
    SettingsHandle, StrategySelector, TransportError, WriteConfig,
};
use chainreq_test_utils::{
    effective, pin_to_block, view_request, write_request, FakeAgent, FakeHttpBackend, FakeSigner,
    Outcome, TEST_CONTRACT,
};
use chainreq_types::{
    CallKind, ContentType, FailureKind, HttpMethod, RestHeader, RestParam, RestReqBody,
    RestRequest, RestResponse, Settings,
};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const LIVE_URL: &str = "https://rpc.live.example";
const ARCHIVAL_URL: &str = "https://rpc.archival.example";

struct Harness {
    direct: Arc<FakeHttpBackend>,
    proxy: Arc<FakeHttpBackend>,
    agent: Arc<FakeAgent>,
    signer: Arc<FakeSigner>,
    settings: SettingsHandle,
    executor: RequestExecutor,
}

fn harness(settings: Settings, agent_installed: bool) -> Harness {
    let direct = FakeHttpBackend::arc("direct");
    let proxy = FakeHttpBackend::arc("proxy");
    let agent = FakeAgent::arc(agent_installed);
    let signer = FakeSigner::arc();
    let settings = SettingsHandle::new(settings);

    let selector = StrategySelector::new(settings.clone(), agent.clone());
    let backends = Backends {
        direct: direct.clone(),
        proxy: proxy.clone(),
        extension: Arc::new(ExtensionBackend::new(agent.clone())),
    };
    let executor = RequestExecutor::new(
        selector,
        backends,
        signer.clone(),
        WriteConfig {
            gas: 30_000_000_000_000,
            default_receiver: TEST_CONTRACT.to_string(),
        },
    );
    Harness {
        direct,
        proxy,
        agent,
        signer,
        settings,
        executor,
    }
}

fn direct_only() -> Harness {
    harness(
        Settings {
            extensions_enabled: false,
            proxy_enabled: false,
        },
        false,
    )
}

async fn collect(executor: &RequestExecutor, request: &RestRequest) -> Vec<RestResponse> {
    executor.execute(effective(request)).collect().await
}

fn types(responses: &[RestResponse]) -> Vec<&'static str> {
    responses.iter().map(RestResponse::type_name).collect()
}

#[tokio::test]
async fn read_size_comes_from_content_length() {
    let h = direct_only();
    h.direct.set_response(
        HttpResponse::new(200, br#"{"result":[1,2,3]}"#.to_vec()).with_header("content-length", "20"),
    );

    let responses = collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;

    assert_eq!(types(&responses), vec!["loading", "success"]);
    let terminal = &responses[1];
    assert_eq!(terminal.status_code(), Some(200));
    assert_eq!(terminal.meta().and_then(|m| m.response_size), Some(20));
}

#[tokio::test]
async fn read_sends_active_entries_and_envelope() {
    let h = direct_only();
    let mut request = view_request(&format!("  {LIVE_URL}  "), "get_posts", &[("a", "1")]);
    request.params.push(RestParam::new("b", "2").inactive());
    request.params.push(RestParam::new("a", "3"));
    request.headers = vec![
        RestHeader::new("x-trace", "one"),
        RestHeader::new("x-off", "no"),
        RestHeader::new("x-trace", "two"),
    ];
    request.headers[1].active = false;
    request.sync_envelope();

    collect(&h.executor, &request).await;

    let sent = h.direct.requests();
    assert_eq!(sent.len(), 1);
    let sent = &sent[0];
    assert_eq!(sent.method, HttpMethod::Post);
    assert_eq!(sent.url, LIVE_URL);
    assert_eq!(sent.params.get("a").map(String::as_str), Some("3"));
    assert!(!sent.params.contains_key("b"));
    assert_eq!(sent.headers.get("x-trace").map(String::as_str), Some("two"));
    assert!(!sent.headers.contains_key("x-off"));
    assert_eq!(
        sent.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
    let Some(HttpBody::Text(body)) = &sent.body else {
        panic!("expected a text body");
    };
    assert_eq!(Some(body.as_str()), request.body.raw_text());
}

#[tokio::test]
async fn extension_takes_precedence_over_proxy() {
    let h = harness(
        Settings {
            extensions_enabled: true,
            proxy_enabled: true,
        },
        true,
    );
    collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;
    assert_eq!(h.agent.backend().requests().len(), 1);
    assert!(h.proxy.requests().is_empty());
    assert!(h.direct.requests().is_empty());

    h.settings.update(|s| s.extensions_enabled = false);
    collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;
    assert_eq!(h.proxy.requests().len(), 1);

    h.agent.set_installed(false);
    h.settings.update(|s| {
        s.extensions_enabled = true;
        s.proxy_enabled = false;
    });
    collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;
    assert_eq!(h.direct.requests().len(), 1);
}

#[tokio::test]
async fn transport_error_becomes_network_fail() {
    let h = direct_only();
    h.direct
        .set_error(TransportError::Http("connection refused".into()));

    let responses = collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;

    assert_eq!(types(&responses), vec!["loading", "network_fail"]);
    let detail = responses[1].failure().unwrap();
    assert_eq!(detail.kind, FailureKind::Transport);
    assert!(detail.message.contains("connection refused"));
}

#[tokio::test]
async fn write_submits_signed_function_call() {
    let h = direct_only();
    let request = write_request(TEST_CONTRACT, "add_post", Some("1.5"));

    let responses = collect(&h.executor, &request).await;

    assert_eq!(types(&responses), vec!["loading", "success"]);
    assert!(h.direct.requests().is_empty());

    let calls = h.signer.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].receiver_id, TEST_CONTRACT);
    assert_eq!(calls[0].method_name, "add_post");
    assert_eq!(calls[0].args.get("text").map(String::as_str), Some("hello"));
    assert_eq!(calls[0].gas, 30_000_000_000_000);
    assert_eq!(calls[0].deposit, 1_500_000_000_000_000_000_000_000);

    let RestResponse::Success {
        status_code,
        headers,
        meta,
        body,
        ..
    } = &responses[1]
    else {
        panic!("expected success");
    };
    assert_eq!(*status_code, 200);
    assert!(headers.is_empty());
    assert_eq!(meta.response_size, None);
    let outcome: Value = serde_json::from_slice(body).unwrap();
    assert!(outcome.get("status").is_some());
}

#[tokio::test]
async fn write_without_amount_attaches_nothing() {
    let h = direct_only();
    collect(&h.executor, &write_request(TEST_CONTRACT, "add_post", None)).await;
    assert_eq!(h.signer.calls()[0].deposit, 0);
}

#[tokio::test]
async fn write_without_receiver_uses_default() {
    let h = direct_only();
    let mut request = RestRequest {
        endpoint: "add_post".into(),
        call_kind: CallKind::NonPayable,
        ..RestRequest::default()
    };
    request.sync_envelope();

    collect(&h.executor, &request).await;

    assert_eq!(h.signer.calls()[0].receiver_id, TEST_CONTRACT);
}

#[tokio::test]
async fn write_timeout_is_reported_once() {
    let h = direct_only();
    h.signer.set_outcome(Outcome::Timeout);

    let responses = collect(&h.executor, &write_request(TEST_CONTRACT, "add_post", None)).await;

    assert_eq!(types(&responses), vec!["loading", "network_fail"]);
    assert_eq!(responses[1].failure().unwrap().kind, FailureKind::Timeout);
}

#[tokio::test]
async fn bad_amount_fails_before_signing() {
    let h = direct_only();
    let responses = collect(
        &h.executor,
        &write_request(TEST_CONTRACT, "add_post", Some("1.2.3")),
    )
    .await;

    assert_eq!(types(&responses), vec!["loading", "network_fail"]);
    assert_eq!(responses[1].failure().unwrap().kind, FailureKind::Validation);
    assert!(h.signer.calls().is_empty());
}

#[tokio::test]
async fn body_without_envelope_fails() {
    let h = direct_only();
    let request = RestRequest {
        body: RestReqBody::raw(ContentType::TextPlain, "hello"),
        ..RestRequest::default()
    };

    let responses = collect(&h.executor, &request).await;

    assert_eq!(types(&responses), vec!["loading", "network_fail"]);
    assert_eq!(responses[1].failure().unwrap().kind, FailureKind::Validation);
}

#[tokio::test]
async fn cancel_with_nothing_in_flight_is_a_no_op() {
    let h = direct_only();
    h.executor.cancel_running_request();
    h.executor.cancel_running_request();
    assert_eq!(h.direct.cancel_count(), 2);
    assert_eq!(h.proxy.cancel_count(), 2);

    let responses = collect(&h.executor, &view_request(LIVE_URL, "get_posts", &[])).await;
    assert_eq!(types(&responses), vec!["loading", "success"]);
}

#[tokio::test]
async fn cancelled_read_pushes_no_terminal() {
    let h = direct_only();
    h.direct.set_delay(Duration::from_secs(30));

    let stream = h.executor.execute(effective(&view_request(LIVE_URL, "get_posts", &[])));
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.executor.cancel_running_request();

    let responses: Vec<RestResponse> = tokio::time::timeout(Duration::from_secs(5), stream.collect())
        .await
        .unwrap();
    assert_eq!(types(&responses), vec!["loading"]);
}

#[tokio::test]
async fn cancel_goes_to_extension_when_selected() {
    let h = harness(Settings::default(), true);
    h.executor.cancel_running_request();
    assert_eq!(h.agent.backend().cancel_count(), 1);
    assert_eq!(h.direct.cancel_count(), 0);
}

struct FixedHeight(u64);

impl BlockHeightSource for FixedHeight {
    fn last_block_height(&self) -> u64 {
        self.0
    }
}

#[tokio::test]
async fn pinned_read_beyond_retention_goes_archival() {
    let observed = 100 + DEFAULT_RETENTION_WINDOW + 1;
    let h = direct_only();
    let executor = h.executor.clone().with_archival_routing(
        Arc::new(FixedHeight(observed)),
        BlockRouter::default(),
        ARCHIVAL_URL,
    );

    let mut old = view_request(LIVE_URL, "get_posts", &[]);
    pin_to_block(&mut old, 100);
    collect(&executor, &old).await;

    let mut recent = view_request(LIVE_URL, "get_posts", &[]);
    pin_to_block(&mut recent, 101);
    collect(&executor, &recent).await;

    collect(&executor, &view_request(LIVE_URL, "get_posts", &[])).await;

    let urls: Vec<String> = h.direct.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec![ARCHIVAL_URL, LIVE_URL, LIVE_URL]);
}
