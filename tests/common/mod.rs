#![allow(dead_code)]

use chrono::Duration;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

use chatterbox::auth::{CredentialStore, TokenService};
use chatterbox::clock::SystemClock;
use chatterbox::configuration::CorsSettings;
use chatterbox::startup::{run, Repositories};
use chatterbox::store::AccountRepository;

pub const TEST_SECRET: &[u8] = b"integration-test-secret-at-least-32-bytes";
const TEST_BCRYPT_COST: u32 = 4;

pub struct TestApp {
    pub address: String,
    pub accounts: Arc<dyn AccountRepository>,
    pub tokens: TokenService,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let repositories = Repositories::in_memory();
    let credentials = CredentialStore::new(repositories.accounts.clone(), TEST_BCRYPT_COST)
        .expect("Failed to build credential store");
    let tokens = TokenService::new(TEST_SECRET, Duration::hours(24), Arc::new(SystemClock));

    let server = run(
        listener,
        credentials,
        tokens.clone(),
        repositories.messages.clone(),
        CorsSettings::default(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        accounts: repositories.accounts,
        tokens,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_register(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/register", &self.address))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", &self.address))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register then log in, returning the session token.
    pub async fn login_token(&self, username: &str, password: &str) -> String {
        let response = self.post_register(username, password).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.post_login(username, password).await;
        assert_eq!(200, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        body["token"]
            .as_str()
            .expect("No token in response")
            .to_string()
    }
}
