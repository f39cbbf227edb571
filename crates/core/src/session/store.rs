use serde::Deserialize;
use tracing::{info, warn};

use super::{Session, SessionFile, SessionHandle, SessionStatus};
use crate::{
    http::ApiClient,
    models::{id_string, Profile},
    validation::{LoginForm, RegistrationForm, Validate},
    Error, Result,
};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/users/login";
/// Registration endpoint.
pub const REGISTER_PATH: &str = "/api/users/register";

/// Owns the session: logs in, registers, restores and logs out.
///
/// Every change is written to [`SessionFile`] before it becomes visible in
/// memory, so the persisted record and the outbound credentials never
/// disagree between operations.
#[derive(Debug, Clone)]
pub struct SessionStore {
    client: ApiClient,
    storage: SessionFile,
    profile_path: Option<String>,
}

impl SessionStore {
    /// Store persisting to `storage` and authenticating through `client`.
    pub fn new(client: ApiClient, storage: SessionFile) -> Self {
        Self {
            client,
            storage,
            profile_path: None,
        }
    }

    /// Fetch missing profiles from `path` instead of failing.
    pub fn with_profile_path(mut self, path: impl Into<String>) -> Self {
        self.profile_path = Some(path.into());
        self
    }

    /// Read-only view shared with the HTTP client.
    pub fn handle(&self) -> &SessionHandle {
        self.client.session()
    }

    /// Current status.
    pub fn status(&self) -> SessionStatus {
        self.handle().status()
    }

    /// Reinstate the persisted session, if any.
    ///
    /// A token without a cached profile is reported as
    /// [`SessionStatus::ProfileIncomplete`]; no identity is invented.
    /// An unreadable record is discarded and treated as absent.
    pub fn restore(&self) -> Result<SessionStatus> {
        let session = match self.storage.load() {
            Ok(session) => session,
            Err(Error::Serialization(err)) => {
                warn!(path = %self.storage.path().display(), error = %err, "discarding corrupt session record");
                self.storage.clear()?;
                None
            }
            Err(err) => return Err(err),
        };
        let status = session
            .as_ref()
            .map_or(SessionStatus::Anonymous, Session::status);
        self.handle().replace(session);
        info!(?status, "session restored");
        Ok(status)
    }

    /// Authenticate with email and password.
    ///
    /// On success the token and profile are persisted and attached to every
    /// later request. When the server returns only a token, the token is kept
    /// and the profile is fetched from the configured profile endpoint; with
    /// none configured this fails with [`Error::ProfileIncomplete`].
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile> {
        let credentials = LoginForm::new(email, password).validate()?;
        let response: AuthResponse = self
            .client
            .post(LOGIN_PATH, credentials.get())
            .await
            .map_err(|err| match err {
                Error::Validation(errors) => Error::Auth(errors.to_string()),
                Error::NotFound(message) | Error::Server { message, .. } => Error::Auth(message),
                other => other,
            })?;
        let token = response
            .id_token
            .clone()
            .ok_or_else(|| Error::Auth("login response carried no token".to_string()))?;
        info!(email = %credentials.email, "logged in");
        self.adopt(token, response.into_profile()).await
    }

    /// Create an account and end up logged in.
    ///
    /// Adopts the session returned by the server when it carries both a token
    /// and a profile, otherwise logs in with the same credentials.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Profile> {
        let registration = form.validate()?;
        let response: Option<AuthResponse> = self
            .client
            .post_optional(REGISTER_PATH, registration.get())
            .await?;
        info!(email = %registration.email, "account registered");

        if let Some(response) = response {
            if let (Some(token), Some(profile)) = (response.id_token.clone(), response.into_profile()) {
                return self.adopt(token, Some(profile)).await;
            }
        }
        self.login(&registration.email, &registration.password)
            .await
    }

    /// Load the profile for a token-only session from the profile endpoint.
    pub async fn refresh_profile(&self) -> Result<Profile> {
        let session = self
            .handle()
            .current()
            .ok_or_else(|| Error::Auth("not logged in".to_string()))?;
        let path = self
            .profile_path
            .as_deref()
            .ok_or(Error::ProfileIncomplete)?;
        let response: AuthResponse = self.client.get(path).await?;
        let profile = response.into_profile().ok_or(Error::ProfileIncomplete)?;
        self.store(Some(session.with_user(profile.clone())))?;
        Ok(profile)
    }

    /// Forget the session locally. Never touches the network; safe to repeat.
    ///
    /// The persisted record is removed first. If that fails the in-memory
    /// session is kept too, so memory never disagrees with what the next
    /// start would restore.
    pub fn logout(&self) -> Result<()> {
        self.store(None)?;
        info!("logged out");
        Ok(())
    }

    /// Log out when `err` says the credentials were rejected.
    ///
    /// Returns whether a logout happened.
    pub fn expire_on(&self, err: &Error) -> Result<bool> {
        if !err.is_auth() {
            return Ok(false);
        }
        warn!(error = %err, "credentials rejected, ending session");
        self.logout()?;
        Ok(true)
    }

    async fn adopt(&self, token: String, profile: Option<Profile>) -> Result<Profile> {
        match profile {
            Some(profile) => {
                self.store(Some(Session::new(token, Some(profile.clone()))))?;
                Ok(profile)
            }
            None => {
                self.store(Some(Session::new(token, None)))?;
                self.refresh_profile().await
            }
        }
    }

    fn store(&self, session: Option<Session>) -> Result<()> {
        match &session {
            Some(session) => self.storage.persist(session)?,
            None => self.storage.clear()?,
        }
        self.handle().replace(session);
        Ok(())
    }
}

/// Body of login/register/profile responses. Every field is optional on the
/// wire; a profile is only built when all identity fields are present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    #[serde(default, alias = "token")]
    id_token: Option<String>,
    #[serde(default, alias = "_id", deserialize_with = "optional_id")]
    id: Option<String>,
    #[serde(default, alias = "name")]
    firstname: Option<String>,
    #[serde(default)]
    lastname: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    admin: Option<bool>,
    #[serde(default)]
    active: Option<bool>,
}

impl AuthResponse {
    fn into_profile(self) -> Option<Profile> {
        Some(Profile {
            id: self.id?,
            firstname: self.firstname?,
            lastname: self.lastname?,
            email: self.email?,
            admin: self.admin.unwrap_or(false),
            active: self.active.unwrap_or(true),
        })
    }
}

fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    id_string(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn store_for(server: &MockServer, dir: &TempDir) -> SessionStore {
        let config = AppConfig {
            api_url: server.uri(),
            session_file: dir.path().join("session.json"),
            ..AppConfig::default()
        };
        let client = ApiClient::new(&config, SessionHandle::default()).expect("client builds");
        SessionStore::new(client, SessionFile::new(&config.session_file))
    }

    fn full_profile() -> serde_json::Value {
        json!({
            "idToken": "tok123",
            "id": "u1",
            "name": "Ana",
            "lastname": "Gómez",
            "email": "a@b.com",
            "admin": true,
            "active": true
        })
    }

    #[tokio::test]
    async fn login_persists_token_and_profile() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_json(json!({"email": "a@b.com", "password": "secret1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_profile()))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let profile = store.login("a@b.com", "secret1").await?;
        assert_eq!(profile.firstname, "Ana");
        assert!(profile.admin);

        let credentials = store.handle().credentials().expect("token stored");
        assert_eq!(credentials.token(), "tok123");

        let persisted = SessionFile::new(dir.path().join("session.json"))
            .load()?
            .expect("session persisted");
        assert_eq!(persisted.token(), "tok123");
        assert_eq!(persisted.user(), Some(&profile));
        Ok(())
    }

    #[tokio::test]
    async fn token_only_login_keeps_token_but_reports_missing_profile() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"idToken": "tok123"})))
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let err = store
            .login("a@b.com", "secret1")
            .await
            .expect_err("no profile available");
        assert!(matches!(err, Error::ProfileIncomplete));
        assert_eq!(
            store.handle().credentials().map(|c| c.token().to_string()),
            Some("tok123".to_string())
        );
        assert_eq!(store.status(), SessionStatus::ProfileIncomplete);
        Ok(())
    }

    #[tokio::test]
    async fn token_only_login_fetches_profile_when_configured() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"idToken": "tok123"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("authorization", "Bearer tok123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_profile()))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir).with_profile_path("/api/users/me");
        let profile = store.login("a@b.com", "secret1").await?;
        assert_eq!(profile.id, "u1");
        assert_eq!(store.status(), SessionStatus::Authenticated(profile));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_credentials_are_an_auth_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid credentials"})),
            )
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let err = store
            .login("a@b.com", "wrong-pass")
            .await
            .expect_err("credentials rejected");
        assert!(err.is_auth());
        assert_eq!(store.status(), SessionStatus::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_login_form_never_reaches_the_server() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let err = store.login("a@b", "123").await.expect_err("invalid form");
        let errors = err.field_errors().expect("validation error");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "password"]);
        Ok(())
    }

    #[tokio::test]
    async fn register_falls_back_to_login_without_session() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .and(body_json(json!({
                "name": "Ana",
                "lastname": "Gómez",
                "email": "a@b.com",
                "password": "secret1"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "u1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_profile()))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let form = RegistrationForm {
            name: "Ana".to_string(),
            lastname: "Gómez".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        };
        let profile = store.register(&form).await?;
        assert_eq!(profile.email, "a@b.com");
        assert!(store.status().has_token());
        Ok(())
    }

    #[tokio::test]
    async fn register_adopts_returned_session() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(ResponseTemplate::new(201).set_body_json(full_profile()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let form = RegistrationForm {
            name: "Ana".to_string(),
            lastname: "Gómez".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        };
        store.register(&form).await?;
        assert_eq!(
            store.handle().credentials().map(|c| c.token().to_string()),
            Some("tok123".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({"errors": {"email": "Email already registered"}})),
            )
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let form = RegistrationForm {
            name: "Ana".to_string(),
            lastname: "Gómez".to_string(),
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
        };
        let err = store.register(&form).await.expect_err("duplicate email");
        assert_eq!(
            err.field_errors().and_then(|e| e.get("email")),
            Some("Email already registered")
        );
        assert_eq!(store.status(), SessionStatus::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn logout_then_restore_in_fresh_process_is_anonymous() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_profile()))
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        let profile = store.login("a@b.com", "secret1").await?;

        let restarted = store_for(&server, &dir);
        assert_eq!(restarted.restore()?, SessionStatus::Authenticated(profile));
        assert!(restarted.handle().credentials().is_some());

        store.logout()?;
        store.logout()?;
        assert!(store.handle().credentials().is_none());

        let restarted = store_for(&server, &dir);
        assert_eq!(restarted.restore()?, SessionStatus::Anonymous);
        assert!(restarted.handle().credentials().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn failed_logout_keeps_memory_in_step_with_storage() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_profile()))
            .mount(&server)
            .await;

        let store = store_for(&server, &dir);
        store.login("a@b.com", "secret1").await?;

        // A directory in place of the record makes removal fail.
        let record = dir.path().join("session.json");
        std::fs::remove_file(&record)?;
        std::fs::create_dir(&record)?;
        std::fs::write(record.join("keep"), "x")?;

        assert!(matches!(store.logout(), Err(Error::Storage(_))));
        assert!(store.status().has_token());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_record_is_discarded_on_restore() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        std::fs::write(dir.path().join("session.json"), "{not json")?;

        let store = store_for(&server, &dir);
        assert_eq!(store.restore()?, SessionStatus::Anonymous);
        assert!(!dir.path().join("session.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn expire_on_logs_out_only_for_auth_errors() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let dir = tempdir()?;
        let store = store_for(&server, &dir);
        store.store(Some(Session::new("tok", None)))?;

        assert!(!store.expire_on(&Error::NotFound("x".to_string()))?);
        assert!(store.status().has_token());
        assert!(store.expire_on(&Error::Auth("expired".to_string()))?);
        assert_eq!(store.status(), SessionStatus::Anonymous);
        Ok(())
    }
}
