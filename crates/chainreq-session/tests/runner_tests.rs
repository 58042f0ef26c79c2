//! Request runner against the session store

use chainreq_network::{
    Backends, ExtensionBackend, HttpResponse, RequestExecutor, SettingsHandle, StrategySelector,
    TransportError, WriteConfig,
};
use chainreq_session::{RequestRunner, Session, SessionAction, SessionProjections, SessionStore};
use chainreq_test_utils::{
    view_request, write_request, FakeAgent, FakeHttpBackend, FakeScriptRunner, FakeSigner, Outcome,
    TEST_CONTRACT,
};
use chainreq_types::{
    CombinedEnv, EnvVar, ExpectResult, ExpectStatus, FailureKind, RestHeader, RestRequest,
    RestResponse, Settings, TestResult,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const LIVE_URL: &str = "https://rpc.live.example";

struct Harness {
    direct: Arc<FakeHttpBackend>,
    signer: Arc<FakeSigner>,
    scripts: Arc<FakeScriptRunner>,
    runner: Arc<RequestRunner>,
}

impl Harness {
    fn store(&self) -> &Arc<SessionStore> {
        self.runner.store()
    }
}

fn harness(request: RestRequest) -> Harness {
    let direct = FakeHttpBackend::arc("direct");
    let agent = FakeAgent::arc(false);
    let signer = FakeSigner::arc();
    let scripts = Arc::new(FakeScriptRunner::new());

    let selector = StrategySelector::new(
        SettingsHandle::new(Settings {
            extensions_enabled: false,
            proxy_enabled: false,
        }),
        agent.clone(),
    );
    let backends = Backends {
        direct: direct.clone(),
        proxy: FakeHttpBackend::arc("proxy"),
        extension: Arc::new(ExtensionBackend::new(agent)),
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
    let store = Arc::new(SessionStore::new(Session {
        request,
        ..Session::default()
    }));
    let runner = Arc::new(RequestRunner::new(store, executor, scripts.clone()));
    Harness {
        direct,
        signer,
        scripts,
        runner,
    }
}

/// Response kinds seen by a store observer, starting with the current one
fn record_responses(store: &SessionStore) -> Arc<Mutex<Vec<Option<&'static str>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |s: &Session| {
        sink.lock()
            .push(s.response.as_ref().map(RestResponse::type_name));
    });
    seen
}

fn passing_result() -> TestResult {
    TestResult {
        description: String::new(),
        expect_results: vec![ExpectResult {
            status: ExpectStatus::Pass,
            message: "status is 200".into(),
        }],
        tests: Vec::new(),
    }
}

#[tokio::test]
async fn read_goes_loading_then_success() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.direct
        .set_response(HttpResponse::new(200, br#"{"result":[]}"#.to_vec()));
    let seen = record_responses(h.store());

    let terminal = h.runner.run(CombinedEnv::default()).await.unwrap();

    assert!(terminal.is_success());
    assert_eq!(
        *seen.lock(),
        vec![None, Some("loading"), Some("success")]
    );
    assert_eq!(h.store().value().response, Some(terminal));
}

#[tokio::test]
async fn write_timeout_fails_exactly_once() {
    let h = harness(write_request(TEST_CONTRACT, "add_post", None));
    h.signer.set_outcome(Outcome::Timeout);
    let seen = record_responses(h.store());

    let terminal = h.runner.run(CombinedEnv::default()).await.unwrap();

    assert_eq!(terminal.failure().unwrap().kind, FailureKind::Timeout);
    assert_eq!(
        *seen.lock(),
        vec![None, Some("loading"), Some("network_fail")]
    );
    assert_eq!(h.scripts.test_runs(), 0);
    assert_eq!(h.store().value().test_results, None);
}

#[tokio::test]
async fn pre_request_failure_sends_nothing() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.scripts.fail_pre_request("ReferenceError: pw is not defined");

    let terminal = h.runner.run(CombinedEnv::default()).await.unwrap();

    assert_eq!(terminal.type_name(), "script_fail");
    let detail = terminal.failure().unwrap();
    assert_eq!(detail.kind, FailureKind::Script);
    assert!(detail.message.contains("pw is not defined"));
    assert!(h.direct.requests().is_empty());
    assert_eq!(h.store().value().response, Some(terminal));
}

#[tokio::test]
async fn test_results_are_stored_after_success() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.scripts.set_test_result(passing_result());
    let views = SessionProjections::attach(h.store());

    h.runner.run(CombinedEnv::default()).await.unwrap();

    assert_eq!(h.scripts.test_runs(), 1);
    assert_eq!(views.test_results.get(), Some(passing_result()));
    assert!(views.completed_response.get().is_some_and(|r| r.is_success()));
}

#[tokio::test]
async fn failing_test_script_replaces_response() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.scripts.fail_test("expect is not a function");

    let terminal = h.runner.run(CombinedEnv::default()).await.unwrap();

    assert_eq!(terminal.type_name(), "script_fail");
    assert_eq!(
        h.store().value().response.map(|r| r.type_name()),
        Some("script_fail")
    );
    assert_eq!(h.store().value().test_results, None);
}

#[tokio::test]
async fn network_failure_skips_test_script() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.direct
        .set_error(TransportError::Http("connection refused".into()));

    let terminal = h.runner.run(CombinedEnv::default()).await.unwrap();

    assert_eq!(terminal.type_name(), "network_fail");
    assert_eq!(h.scripts.test_runs(), 0);
}

#[tokio::test]
async fn environment_renders_params_and_headers() {
    let mut request = view_request(LIVE_URL, "get_posts", &[("limit", "<<limit>>")]);
    request
        .headers
        .push(RestHeader::new("x-token", "<<token>>"));
    let h = harness(request);
    h.scripts.set_env("limit", "10");
    let env = CombinedEnv {
        global: vec![EnvVar::new("token", "global"), EnvVar::new("limit", "1")],
        selected: vec![EnvVar::new("token", "selected")],
    };

    h.runner.run(env).await.unwrap();

    let sent = &h.direct.requests()[0];
    assert_eq!(sent.params.get("limit").map(String::as_str), Some("10"));
    assert_eq!(sent.headers.get("x-token").map(String::as_str), Some("selected"));
}

#[tokio::test]
async fn superseded_run_is_discarded() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.direct.set_delay(Duration::from_millis(100));

    let first = {
        let runner = Arc::clone(&h.runner);
        tokio::spawn(async move { runner.run(CombinedEnv::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = h.runner.run(CombinedEnv::default()).await;

    assert!(second.is_some_and(|r| r.is_success()));
    assert_eq!(first.await.unwrap(), None);
    assert_eq!(h.direct.requests().len(), 2);
}

#[tokio::test]
async fn cancelled_run_leaves_loading() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[]));
    h.direct.set_delay(Duration::from_secs(30));

    let running = {
        let runner = Arc::clone(&h.runner);
        tokio::spawn(async move { runner.run(CombinedEnv::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    h.runner.cancel();

    let terminal = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(terminal, None);
    assert_eq!(
        h.store().value().response.map(|r| r.type_name()),
        Some("loading")
    );
}

#[tokio::test]
async fn editing_during_run_does_not_change_what_was_sent() {
    let h = harness(view_request(LIVE_URL, "get_posts", &[("a", "1")]));
    h.direct.set_delay(Duration::from_millis(50));

    let running = {
        let runner = Arc::clone(&h.runner);
        tokio::spawn(async move { runner.run(CombinedEnv::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.store().dispatch(SessionAction::SetEndpoint("other".into()));

    let terminal = running.await.unwrap().unwrap();
    assert!(terminal.is_success());
    assert_eq!(h.direct.requests()[0].params.get("a").map(String::as_str), Some("1"));
    assert_eq!(h.store().value().request.endpoint, "other");
}
