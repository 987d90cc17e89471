#![allow(clippy::unwrap_used)]
// Integration tests for `Eg4Client` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eg4mon_api::{ApiResponse, Credentials, Eg4Client, Error, Selection};

const LOGIN_PATH: &str = "/WManage/api/login";
const RUNTIME_PATH: &str = "/WManage/api/inverter/getInverterRuntime";
const ENERGY_PATH: &str = "/WManage/api/inverter/getInverterEnergyInfo";
const READ_PATH: &str = "/WManage/web/maintain/remoteRead/read";
const WRITE_PATH: &str = "/WManage/web/maintain/remoteSet/write";

// ── Helpers ─────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> Eg4Client {
    let base_url = Url::parse(&server.uri()).unwrap();
    let credentials = Credentials::new("tester", "hunter2".to_string().into());
    Eg4Client::with_client(reqwest::Client::new(), base_url, credentials)
}

fn login_body() -> serde_json::Value {
    json!({
        "success": true,
        "plants": [{
            "plantId": 8675,
            "name": "Home",
            "inverters": [
                {
                    "serialNum": "43210P0001",
                    "phase": 1,
                    "batteryType": "LITHIUM",
                    "fwVersion": "fAAB-1515",
                    "lost": false
                },
                { "serialNum": "43210P0002" }
            ]
        }]
    })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .mount(server)
        .await;
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn login_populates_device_directory() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = client_for(&server);

    assert!(!client.is_logged_in());
    client.login().await.unwrap();
    assert!(client.is_logged_in());

    let inverters = client.inverters();
    assert_eq!(inverters.len(), 2);
    assert_eq!(inverters[0].serial_num, "43210P0001");
    assert_eq!(inverters[0].plant_id.as_deref(), Some("8675"));
    assert_eq!(inverters[0].plant_name.as_deref(), Some("Home"));
    assert_eq!(inverters[0].fw_version.as_deref(), Some("fAAB-1515"));
    // Unknown fields are captured verbatim.
    assert_eq!(inverters[0].extra.get("lost"), Some(&json!(false)));
}

#[tokio::test]
async fn login_rejected_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.login().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn login_http_error_is_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.login().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn login_with_empty_directory_is_api_error_not_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "plants": [{ "plantId": 1, "name": "Empty", "inverters": [] }]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let result = client.login().await;
    match result {
        Err(Error::Api { ref message }) => {
            assert!(message.contains("no inverters"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Selection ───────────────────────────────────────────────────────

#[tokio::test]
async fn select_by_serial_and_index() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = client_for(&server);
    client.login().await.unwrap();

    let by_serial = client
        .select_inverter(&Selection::Serial("43210P0002".into()))
        .unwrap();
    assert_eq!(by_serial.serial_num, "43210P0002");
    assert_eq!(
        client.selected_inverter().map(|i| i.serial_num),
        Some("43210P0002".into())
    );

    let by_index = client.select_inverter(&Selection::Index(0)).unwrap();
    assert_eq!(by_index.serial_num, "43210P0001");
}

#[tokio::test]
async fn select_unknown_serial_or_index_fails() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = client_for(&server);
    client.login().await.unwrap();

    let result = client.select_inverter(&Selection::Serial("nope".into()));
    assert!(matches!(result, Err(Error::Api { .. })));

    let result = client.select_inverter(&Selection::Index(7));
    assert!(matches!(result, Err(Error::Api { .. })));
}

// ── Telemetry ───────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_uses_selected_serial_in_payload() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .and(body_string_contains("serialNum=43210P0002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "statusText": "Normal",
            "vpv1": 3021.0,
            "pToGrid": 150.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client
        .select_inverter(&Selection::Serial("43210P0002".into()))
        .unwrap();

    let runtime = client.runtime().await.unwrap().into_data().unwrap();
    assert_eq!(runtime.status_text.as_deref(), Some("Normal"));
    assert_eq!(runtime.to_grid_power, Some(150.0));
}

#[tokio::test]
async fn server_side_rejection_is_failure_not_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path(ENERGY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "DEVICE_OFFLINE"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    let energy = client.energy().await.unwrap();
    assert!(!energy.is_success());
    assert_eq!(energy.error_message(), Some("DEVICE_OFFLINE"));
}

#[tokio::test]
async fn fetch_without_selection_fails() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = client_for(&server);
    client.login().await.unwrap();

    let result = client.runtime().await;
    assert!(matches!(result, Err(Error::Api { .. })));
}

// ── Reauthentication ────────────────────────────────────────────────

#[tokio::test]
async fn expired_session_triggers_exactly_one_relogin_and_replay() {
    let server = MockServer::start().await;

    // Initial login plus exactly one implicit re-login.
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(2)
        .mount(&server)
        .await;

    // First runtime request hits an expired session; the replay succeeds.
    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "statusText": "Normal" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    let runtime = client.runtime().await.unwrap();
    assert!(runtime.is_success());
}

#[tokio::test]
async fn second_401_yields_api_error_without_looping() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    let result = client.runtime().await;
    match result {
        Err(Error::Api { ref message }) => {
            assert!(message.contains("401"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ── Parameters ──────────────────────────────────────────────────────

#[tokio::test]
async fn read_settings_accumulates_all_six_windows() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    for start in [0u32, 127, 240, 500, 2000, 5000] {
        let mut body = json!({
            "success": true,
            "inverterSn": "43210P0001",
            "startRegister": start,
            "pointNumber": 127,
        });
        body[format!("HOLD_WINDOW_{start}").as_str()] = json!(start);
        Mock::given(method("POST"))
            .and(path(READ_PATH))
            .and(body_string_contains(format!("startRegister={start}&")))
            .and(body_string_contains("pointNumber=127"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    let ApiResponse::Success(parameters) = client.read_settings().await.unwrap() else {
        panic!("expected settings read to succeed");
    };
    assert_eq!(parameters.len(), 6);
    assert_eq!(parameters.get("HOLD_WINDOW_2000"), Some(&json!(2000)));
    // Framing keys never surface as settings.
    assert_eq!(parameters.get("startRegister"), None);
}

#[tokio::test]
async fn read_settings_aborts_on_first_failed_window() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    for start in [0u32, 127] {
        let mut body = json!({ "success": true });
        body[format!("HOLD_WINDOW_{start}").as_str()] = json!(start);
        Mock::given(method("POST"))
            .and(path(READ_PATH))
            .and(body_string_contains(format!("startRegister={start}&")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(READ_PATH))
        .and(body_string_contains("startRegister=240&"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "error": "READ_TIMEOUT" })),
        )
        .mount(&server)
        .await;
    // Later windows must never be requested after the failure.
    for start in [500u32, 2000, 5000] {
        Mock::given(method("POST"))
            .and(path(READ_PATH))
            .and(body_string_contains(format!("startRegister={start}&")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(0)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    let settings = client.read_settings().await.unwrap();
    assert!(!settings.is_success());
    assert_eq!(settings.error_message(), Some("READ_TIMEOUT"));
}

#[tokio::test]
async fn write_setting_returns_success_flag() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path(WRITE_PATH))
        .and(body_string_contains("inverterSn=43210P0001"))
        .and(body_string_contains("holdParam=HOLD_SOC_LIMIT"))
        .and(body_string_contains("valueText=80"))
        .and(body_string_contains("clientType=WEB"))
        .and(body_string_contains("remoteSetType=NORMAL"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client.select_inverter(&Selection::Index(0)).unwrap();

    assert!(client.write_setting("HOLD_SOC_LIMIT", "80").await.unwrap());
}
