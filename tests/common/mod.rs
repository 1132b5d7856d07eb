//! Common test utilities for E2E tests

pub mod kit_stub;

use std::path::PathBuf;

use howdy::{AppState, config, data};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Session secret used by all test servers.
pub const TEST_SECRET: &str = "test-secret-key-32-bytes-long!!!";

/// A Kit base URL nothing listens on. Any attempted provider call fails
/// with a transport error, so tests asserting "no outbound call" would
/// observe a 500 instead of the expected status if one leaked through.
pub const UNREACHABLE_KIT: &str = "http://127.0.0.1:9";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a test server whose Kit adapter points at nothing.
    pub async fn new() -> Self {
        Self::with_kit_base_url(UNREACHABLE_KIT).await
    }

    /// Create a test server whose Kit adapter points at a stub provider.
    pub async fn with_kit_base_url(kit_base_url: &str) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = test_config(db_path, kit_base_url);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();

        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        // Build router
        let app = howdy::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a test user with its (lazily created) account.
    pub async fn create_test_user(&self, email: &str) -> (data::User, data::Account) {
        let user = self.state.db.upsert_user_by_email(email).await.unwrap();
        let account = self
            .state
            .db
            .ensure_account_for_user(&user.id)
            .await
            .unwrap();
        (user, account)
    }

    /// Set the Kit API key on a user's account.
    pub async fn set_api_key(&self, user: &data::User, api_key: &str) {
        self.state
            .db
            .update_account_settings(&user.id, "Test Account", Some(api_key), "")
            .await
            .unwrap();
    }

    /// Create a session token for a user, usable as a Bearer token.
    pub fn session_token_for(&self, user: &data::User) -> String {
        use howdy::auth::session::{Session, create_session_token};

        let session = Session::new(user.id.clone(), user.email.clone(), 3600);
        create_session_token(&session, &self.state.config.auth.session_secret)
            .expect("Failed to create test token")
    }
}

/// Create a test configuration over a temp database path.
pub fn test_config(db_path: PathBuf, kit_base_url: &str) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "test.example.com".to_string(),
            protocol: "http".to_string(),
        },
        database: config::DatabaseConfig { path: db_path },
        auth: config::AuthConfig {
            session_secret: TEST_SECRET.to_string(),
            session_max_age: 604800,
            login_token_max_age: 900,
        },
        kit: config::KitConfig {
            base_url: kit_base_url.to_string(),
            timeout_seconds: 5,
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}
