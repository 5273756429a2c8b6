use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use grant_intake::config::{Config, CreatorConfig, DEFAULT_MAX_BODY_SIZE};
use grant_intake::email::Notifier;

/// An email captured instead of being sent.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_templated_email(&self, to: &str, subject: &str, html: &str) -> Result<(), String> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        read(resp).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        read(resp).await
    }

    pub async fn post_form(&self, path: &str, data: &[(&str, &str)]) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .form(data)
            .send()
            .await
            .expect("post form failed");
        read(resp).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("put request failed");
        read(resp).await
    }

    pub async fn delete(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("delete request failed");
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

/// Creator settings pointing every endpoint at `server_url`.
pub fn creator_config(server_url: &str) -> CreatorConfig {
    CreatorConfig {
        token_url: format!("{server_url}/oauth/v2/token"),
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "https://example.org/callback".to_string(),
        refresh_token: "refresh-token".to_string(),
        org_id: "fund".to_string(),
        app_id: "grants".to_string(),
        proposal_form: "GAP_Proposal".to_string(),
        concept_form: "GAP_Concept_Paper".to_string(),
        community_form: "Community_Proposal".to_string(),
        report_name: "All_Gap_Concept_Paper".to_string(),
        api_base: format!("{server_url}/api/v2"),
        data_base: format!("{server_url}/creator/v2.1/data"),
        timeout_secs: 5,
    }
}

pub async fn spawn_app(creator_url: &str) -> TestApp {
    spawn_app_with(creator_url, |_| {}).await
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app_with(creator_url: &str, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!(
        "grant_intake_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let mut config = Config {
        database_url: test_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: DEFAULT_MAX_BODY_SIZE,
        trusted_proxies: vec![],
        cors_origins: vec![],
        submission_rate_limit: 100,
        submission_rate_window_secs: 60,
        log_level: "warn".to_string(),
        organization_name: "Belize Fund".to_string(),
        smtp: None,
        creator: creator_config(creator_url),
    };
    tweak(&mut config);

    let notifier = Arc::new(RecordingNotifier::default());
    let (app, _state) =
        grant_intake::build_app_with(pool.clone(), config, Some(notifier.clone() as Arc<dyn Notifier>))
            .expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
        notifier,
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
