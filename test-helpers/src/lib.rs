use api::{Config, telemetry};
use payloads::{APIClient, ClientError, RequestIdentifier};
use reqwest::StatusCode;
use tracing_log::LogTracer;
use tracing_subscriber::util::SubscriberInitExt;

pub struct TestApp {
    pub port: u16,
    pub client: APIClient,
}

impl TestApp {
    /// Identifier for `path` under the api root, e.g. `"users"`.
    pub fn identifier(&self, path: &str) -> RequestIdentifier {
        self.client.identifier(path)
    }

    /// Identifier for a response that takes `delay_ms` to arrive.
    pub fn slow_identifier(
        &self,
        resource: &str,
        delay_ms: u64,
    ) -> RequestIdentifier {
        self.identifier(&format!("slow/{resource}?delay_ms={delay_ms}"))
    }

    /// Identifier for an empty response with the given status.
    pub fn status_identifier(&self, code: u16) -> RequestIdentifier {
        self.identifier(&format!("status/{code}"))
    }
}

pub async fn spawn_app_on_port(port: u16) -> TestApp {
    let subscriber = telemetry::get_subscriber("error".into());
    let _ = LogTracer::init();
    let _ = subscriber.try_init();

    let mut config = Config {
        ip: "127.0.0.1".into(),
        port,
        allowed_origins: vec!["*".to_string()],
    };

    let server = api::build(&mut config).unwrap();
    tokio::spawn(server);

    TestApp {
        port: config.port,
        client: APIClient {
            address: format!("http://127.0.0.1:{}", config.port),
            inner_client: reqwest::Client::new(),
        },
    }
}

/// Use OS-assigned port for parallel testing.
pub async fn spawn_app() -> TestApp {
    spawn_app_on_port(0).await
}

/// An address nothing is listening on, for transport failures.
pub fn unreachable_client() -> APIClient {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    APIClient::new(format!("http://127.0.0.1:{port}"))
}

/// Assert that the result of an API action results in a specific status code.
pub fn assert_status_code<T>(
    result: Result<T, ClientError>,
    expected: StatusCode,
) {
    match result {
        Err(ClientError::APIError(code, _)) => {
            assert_eq!(code, expected)
        }
        _ => panic!("Expected APIError"),
    };
}
