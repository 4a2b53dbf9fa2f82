use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use serde_json::json;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use telegram_log_sink::config::{SinkConfig, TransportOverride};
use telegram_log_sink::emoji::Severity;
use telegram_log_sink::error::DeliveryError;
use telegram_log_sink::layer::NotificationLayer;
use telegram_log_sink::record::LogRecord;
use telegram_log_sink::sink::TelegramSink;

const TOKEN: &str = "123456:TEST-token";
const SEND_PATH: &str = "/bot123456:TEST-token/SendMessage";

fn sink_for(server_uri: &str, timeout: Duration) -> TelegramSink {
    let config = SinkConfig::builder(TOKEN, "@alerts")
        .date_format("%Y-%m-%d")
        .timeout(timeout)
        .transport_override(TransportOverride::ApiBase(server_uri.to_string()))
        .build()
        .unwrap();
    TelegramSink::new(config).unwrap()
}

fn expected_form(text: &str, chat_id: &str) -> Vec<u8> {
    reqwest::Client::new()
        .post("http://localhost/")
        .form(&[("text", text), ("chat_id", chat_id)])
        .build()
        .unwrap()
        .body()
        .unwrap()
        .as_bytes()
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn posts_form_to_send_message_endpoint() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": {} })))
        .expect(1)
        .mount(&server)
        .await;
    let sink = sink_for(&server.uri(), Duration::from_secs(5));

    let mut record = LogRecord::new("app", Severity::Error, "disk full");
    record.datetime = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    record.extra.insert("disk".into(), json!("/dev/sda1"));

    // Act
    let result = sink.write(&record).await;

    // Assert
    assert!(result.is_ok(), "{result:?}");
    let requests = server.received_requests().await.unwrap();
    let text = "2024-05-01 app.ERROR\n🚨 disk full  {\"disk\":\"/dev/sda1\"}";
    assert_eq!(requests[0].body, expected_form(text, "@alerts"));
}

#[tokio::test]
async fn remote_rejection_is_returned_not_panicked() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "ok": false,
            "error_code": 401,
            "description": "Unauthorized"
        })))
        .mount(&server)
        .await;
    let sink = sink_for(&server.uri(), Duration::from_secs(5));

    let err = sink.deliver("hello").await.unwrap_err();

    match err {
        DeliveryError::Rejected { error_code, description } => {
            assert_eq!(error_code, Some(401));
            assert_eq!(description, "Unauthorized");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;
    let sink = sink_for(&server.uri(), Duration::from_secs(5));

    let err = sink.deliver("hello").await.unwrap_err();

    assert!(matches!(err, DeliveryError::MalformedResponse { status: 502, .. }), "{err:?}");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let sink = sink_for(&format!("http://{addr}"), Duration::from_secs(2));

    let err = sink.deliver("hello").await.unwrap_err();

    assert!(matches!(err, DeliveryError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn stalled_endpoint_times_out_at_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let sink = sink_for(&server.uri(), Duration::from_secs(1));

    let started = Instant::now();
    let err = sink.deliver("hello").await.unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn timeout_override_wins_over_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": true }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let config = SinkConfig::builder(TOKEN, "@alerts")
        .timeout(Duration::from_secs(100))
        .transport_override(TransportOverride::ApiBase(server.uri()))
        .transport_override(TransportOverride::Timeout(Duration::from_secs(1)))
        .build()
        .unwrap();
    let sink = TelegramSink::new(config).unwrap();

    let started = Instant::now();
    let err = sink.deliver("hello").await.unwrap_err();

    assert!(err.is_timeout(), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn layer_delivers_events_and_survives_rejections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(2)
        .mount(&server)
        .await;
    let sink = Arc::new(sink_for(&server.uri(), Duration::from_secs(5)));

    let (layer, handle) = NotificationLayer::new(sink, 16);
    let layer = layer.with_channel_name("checkout");
    let stats = layer.stats();
    tracing::subscriber::with_default(Registry::default().with(layer), || {
        tracing::error!(order_id = 9, "payment failed");
        tracing::warn!("below threshold");
        tracing::error!("refund failed");
    });
    handle.await.unwrap();

    assert_eq!(stats.failed(), 2);
    assert_eq!(stats.delivered(), 0);
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.starts_with("text="));
    assert!(body.contains("checkout.ERROR"));
    assert!(body.ends_with("&chat_id=%40alerts"));
}
