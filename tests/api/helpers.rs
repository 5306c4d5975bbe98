use std::{net::SocketAddr, sync::OnceLock};

use anyhow::Result;
use secrecy::SecretString;
use serde_json::{json, Value};
use waitlist::{
    config::{get_or_init_config, AppConfig},
    init_dbg_tracing, App,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_SECRET: &str = "test-captcha-secret";

pub struct TestApp {
    pub addr: SocketAddr,
    pub http_client: reqwest::Client,
    pub email_server: MockServer,
    pub captcha_server: MockServer,
}

/// Logs are only printed when `TEST_LOG` is set, e.g. `TEST_LOG=1 cargo test`.
fn init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        if std::env::var("TEST_LOG").is_ok() {
            init_dbg_tracing();
        }
    });
}

impl TestApp {
    /// Spawns the app with bot mitigation disabled.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(|_| {}).await
    }

    /// Spawns the app with bot mitigation enabled.
    pub async fn spawn_with_captcha() -> Result<Self> {
        Self::spawn_with(|config| config.captcha_config.enabled = true).await
    }

    /// Tries to spawn a separate task serving our app. Both outbound services are replaced by
    /// mock servers, `configure` gets the last word on the configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Result<Self> {
        init_test_subscriber();

        let email_server = MockServer::start().await;
        let captcha_server = MockServer::start().await;

        let mut config = get_or_init_config().clone();
        // Trying to bind port 0 will trigger an OS scan for an available port.
        config.net_config.host = [127, 0, 0, 1];
        config.net_config.app_port = 0;
        config.email_config.url = email_server.uri();
        config.email_config.api_key = Some(SecretString::from("test-api-key".to_string()));
        config.email_config.timeout_millis = 200;
        config.captcha_config.enabled = false;
        config.captcha_config.url = format!("{}/siteverify", captcha_server.uri());
        config.captcha_config.secret = Some(SecretString::from(TEST_SECRET.to_string()));
        config.captcha_config.min_score = 0.5;
        config.captcha_config.expected_action = Some("submit".to_string());
        config.captcha_config.timeout_millis = 200;
        config.signup_config.diagnostics = false;
        configure(&mut config);

        let app = App::build_from_config(config).await?;
        let addr = app.local_addr()?;

        tokio::spawn(waitlist::serve(app));

        Ok(TestApp {
            addr,
            http_client: reqwest::Client::new(),
            email_server,
            captcha_server,
        })
    }

    pub async fn post_subscribe(&self, body: &Value) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(format!("http://{}/api/email/subscribe", self.addr))
            .json(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn post_subscribe_raw(&self, body: &'static str) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .post(format!("http://{}/api/email/subscribe", self.addr))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        Ok(res)
    }

    pub async fn get(&self, route: &str) -> Result<reqwest::Response> {
        let res = self
            .http_client
            .get(format!("http://{}{route}", self.addr))
            .send()
            .await?;
        Ok(res)
    }

    /// Makes the verification service answer every request with `body`.
    pub async fn mock_captcha(&self, body: Value, expected_calls: u64) {
        Mock::given(path("/siteverify"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&self.captcha_server)
            .await;
    }

    /// Makes the email provider answer every request with `status`.
    pub async fn mock_email(&self, status: u16, expected_calls: u64) {
        Mock::given(path("/emails"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "id": "msg_test" })))
            .expect(expected_calls)
            .mount(&self.email_server)
            .await;
    }
}

/// Reads the `{ "error": "..." }` body of a failed request.
pub async fn error_message(res: reqwest::Response) -> Result<String> {
    let body: Value = res.json().await?;
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Ok(message)
}
