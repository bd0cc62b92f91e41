use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth_service::cache::InMemoryCredentialCache;
use auth_service::credential::errors::CredentialError;
use auth_service::credential::models::CredentialRecord;
use auth_service::credential::models::UserId;
use auth_service::credential::models::Username;
use auth_service::credential::ports::CredentialStore;
use auth_service::credential::service::LoginService;
use auth_service::inbound::http::router::create_router;
use parking_lot::Mutex;

pub const PRIVATE_KEY: &str = include_str!("../../../auth/testdata/rsa_private.pem");
pub const PUBLIC_KEY: &str = include_str!("../../../auth/testdata/rsa_public.pem");

/// In-process stand-in for the Postgres store that counts lookups.
#[derive(Default)]
pub struct FakeCredentialStore {
    records: Mutex<HashMap<UserId, CredentialRecord>>,
    username_lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeCredentialStore {
    pub fn insert(&self, record: CredentialRecord) {
        self.records.lock().insert(record.user_id, record);
    }

    pub fn username_lookups(&self) -> usize {
        self.username_lookups.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), CredentialError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CredentialError::DependencyUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn find_credential_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        self.username_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        Ok(self
            .records
            .lock()
            .values()
            .find(|record| record.username == *username)
            .cloned())
    }

    async fn find_credential_by_id(
        &self,
        id: &UserId,
    ) -> Result<Option<CredentialRecord>, CredentialError> {
        self.check_available()?;
        Ok(self.records.lock().get(id).cloned())
    }

    async fn update_stored_digest(
        &self,
        id: &UserId,
        stored_digest: &str,
    ) -> Result<(), CredentialError> {
        self.check_available()?;
        match self.records.lock().get_mut(id) {
            Some(record) => {
                record.stored_digest = stored_digest.to_string();
                Ok(())
            }
            None => Err(CredentialError::NotFound(id.to_string())),
        }
    }
}

/// Test application that spawns the real router on a random port
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub authenticator: Arc<Authenticator>,
    pub store: Arc<FakeCredentialStore>,
    pub cache: Arc<InMemoryCredentialCache>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let authenticator = Arc::new(
            Authenticator::new(
                PRIVATE_KEY.as_bytes(),
                PUBLIC_KEY.as_bytes(),
                chrono::Duration::minutes(60),
            )
            .expect("Failed to create authenticator"),
        );
        let store = Arc::new(FakeCredentialStore::default());
        let cache = Arc::new(InMemoryCredentialCache::new());

        let login_service = Arc::new(LoginService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&authenticator),
            Duration::from_secs(3600),
        ));

        let router = create_router(login_service);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            authenticator,
            store,
            cache,
        }
    }

    /// Register a user directly in the store
    pub fn add_user(
        &self,
        username: &str,
        password: &str,
        name: &str,
        permissions: &[&str],
    ) -> UserId {
        let record = CredentialRecord {
            user_id: UserId::new(),
            username: Username::new(username.to_string()).unwrap(),
            stored_digest: self.authenticator.hash_password(password).unwrap(),
            display_name: name.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        };
        let user_id = record.user_id;
        self.store.insert(record);
        user_id
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Log in and return the token
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&serde_json::json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
