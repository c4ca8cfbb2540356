use std::time::Duration;

use spley_lib::{ConnectivityProbe, HttpProbe};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn probe_against(status: u16) -> bool {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HttpProbe::new(format!("{}/ping", server.uri()), Duration::from_secs(2)).unwrap();
    probe.is_online().await
}

#[tokio::test]
async fn success_status_means_online() {
    assert!(probe_against(200).await);
}

#[tokio::test]
async fn server_error_means_offline() {
    assert!(!probe_against(500).await);
}

#[tokio::test]
async fn slow_server_means_offline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let probe = HttpProbe::new(server.uri(), Duration::from_millis(50)).unwrap();
    assert!(!probe.is_online().await);
}

#[tokio::test]
async fn unreachable_host_means_offline() {
    let probe = HttpProbe::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    assert!(!probe.is_online().await);
}
