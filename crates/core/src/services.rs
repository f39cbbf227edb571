//! Wiring of the client, session store and resource managers.

use crate::{
    config::AppConfig,
    http::ApiClient,
    resource::{CategoryManager, PartManager},
    session::{SessionFile, SessionHandle, SessionStore},
    Result,
};

/// Everything a front-end needs, sharing one HTTP client and session.
pub struct AppServices {
    /// Authentication and persisted session.
    pub session: SessionStore,
    /// Category CRUD.
    pub categories: CategoryManager,
    /// Part CRUD with category lookup.
    pub parts: PartManager,
}

impl AppServices {
    /// Build the services described by `config`. Does not touch the network.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = ApiClient::new(config, SessionHandle::default())?;
        let mut session = SessionStore::new(client.clone(), SessionFile::new(&config.session_file));
        if let Some(path) = &config.profile_path {
            session = session.with_profile_path(path.clone());
        }
        Ok(Self {
            session,
            categories: CategoryManager::new(client.clone()),
            parts: PartManager::new(client),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionStatus};
    use tempfile::tempdir;

    #[test]
    fn managers_share_the_session_handle() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let session_file = dir.path().join("session.json");
        SessionFile::new(&session_file).persist(&Session::new("tok", None))?;

        let config = AppConfig {
            session_file,
            ..AppConfig::default()
        };
        let services = AppServices::from_config(&config)?;
        assert_eq!(services.session.restore()?, SessionStatus::ProfileIncomplete);
        assert!(services.session.handle().credentials().is_some());
        Ok(())
    }
}
