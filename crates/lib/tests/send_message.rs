//! Integration tests: publish against a mock ORTC server and check the wire request.

use async_trait::async_trait;
use ortc::cluster::ClusterResolver;
use ortc::config::Config;
use ortc::{BlockingMessageClient, MessageClient, OrtcError, SendParams};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EXPECTED_BODY: &str = "AT=token-1&AK=appKey&PK=privKey&C=news&M=breaking+news%21+50%25+off";

fn params(url: &str) -> SendParams {
    SendParams {
        url: url.to_string(),
        is_cluster: false,
        authentication_token: "token-1".to_string(),
        application_key: "appKey".to_string(),
        private_key: "privKey".to_string(),
        channel: "news".to_string(),
        message: "breaking news! 50% off".to_string(),
    }
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Resolver that always answers with a fixed server and records what it was asked.
struct FixedResolver {
    server: String,
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ClusterResolver for FixedResolver {
    async fn resolve(&self, cluster_url: &str, application_key: &str) -> Result<String, OrtcError> {
        self.calls
            .lock()
            .unwrap()
            .push((cluster_url.to_string(), application_key.to_string()));
        Ok(self.server.clone())
    }
}

#[tokio::test]
async fn created_status_means_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string(EXPECTED_BODY))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let client = MessageClient::new(&Config::default()).unwrap();
    let sent = client.send_message(&params(&server.uri())).await.unwrap();
    assert!(sent);
}

#[tokio::test]
async fn other_success_statuses_mean_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = MessageClient::new(&Config::default()).unwrap();
    let sent = client.send_message(&params(&server.uri())).await.unwrap();
    assert!(!sent);
}

#[tokio::test]
async fn error_status_means_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let client = MessageClient::new(&Config::default()).unwrap();
    let sent = client.send_message(&params(&server.uri())).await.unwrap();
    assert!(!sent);
}

#[tokio::test]
async fn trailing_separator_is_not_doubled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/server/2.1/send"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let client = MessageClient::new(&Config::default()).unwrap();
    let base = format!("{}/server/2.1", server.uri());
    assert!(client.send_message(&params(&base)).await.unwrap());
    assert!(client
        .send_message(&params(&format!("{}/", base)))
        .await
        .unwrap());
}

#[tokio::test]
async fn empty_url_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = Arc::new(FixedResolver {
        server: server.uri(),
        calls: Mutex::new(Vec::new()),
    });
    let client = MessageClient::with_resolver(reqwest::Client::new(), resolver.clone());
    let mut p = params("");
    p.is_cluster = true;
    let err = client.send_message(&p).await.unwrap_err();
    assert!(matches!(err, OrtcError::InvalidArguments(_)));
    assert!(resolver.calls.lock().unwrap().is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn cluster_flag_posts_to_resolved_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/node-7/send"))
        .and(body_string(EXPECTED_BODY))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = Arc::new(FixedResolver {
        server: format!("{}/node-7", server.uri()),
        calls: Mutex::new(Vec::new()),
    });
    let client = MessageClient::with_resolver(reqwest::Client::new(), resolver.clone());
    let mut p = params("http://balancer.invalid/server/2.1");
    p.is_cluster = true;
    assert!(client.send_message(&p).await.unwrap());
    assert_eq!(
        *resolver.calls.lock().unwrap(),
        vec![(
            "http://balancer.invalid/server/2.1".to_string(),
            "appKey".to_string()
        )]
    );
}

#[tokio::test]
async fn empty_resolved_server_is_cluster_error() {
    let resolver = Arc::new(FixedResolver {
        server: String::new(),
        calls: Mutex::new(Vec::new()),
    });
    let client = MessageClient::with_resolver(reqwest::Client::new(), resolver);
    let mut p = params("http://balancer.invalid/server/2.1");
    p.is_cluster = true;
    let err = client.send_message(&p).await.unwrap_err();
    assert!(matches!(err, OrtcError::Cluster(_)));
}

#[tokio::test]
async fn transport_fault_propagates() {
    let url = format!("http://127.0.0.1:{}", free_port());
    let client = MessageClient::new(&Config::default()).unwrap();
    let err = client.send_message(&params(&url)).await.unwrap_err();
    assert!(matches!(err, OrtcError::Request(_)));
}

#[test]
fn blocking_client_sends() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let server = rt.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_string(EXPECTED_BODY))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        server
    });

    let client = BlockingMessageClient::new(&Config::default()).unwrap();
    assert!(client.send_message(&params(&server.uri())).unwrap());
    rt.block_on(server.verify());
}
