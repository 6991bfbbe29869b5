//! Data access for the shell.
//!
//! Two providers implement [`DataService`]: the demo [`MockService`] and the
//! [`HostService`] that goes through the `focus-core` plugin. [`Services::detect`]
//! picks one when the app starts; nothing else looks at the environment.

pub mod host;
pub mod mock;
pub mod watchlist;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Manager, Runtime};

pub use self::host::HostService;
pub use self::mock::MockService;
pub use self::watchlist::{MemoryOpener, TauriStoreOpener, WatchlistStore};

use crate::config::Settings;
use crate::error::Result;
use crate::focus_core::FocusCore;
use crate::models::{AgentResponse, Repo, RepoDetails};

#[async_trait]
pub trait DataService: Send + Sync {
    /// Case-insensitive repository search. An empty query yields nothing.
    async fn search_repos(&self, query: &str) -> Result<Vec<Repo>>;

    /// Look up a repository by id; `None` when it cannot be resolved.
    async fn repo(&self, id: u64) -> Option<Repo>;

    async fn fetch_repo_details(&self, repo: &Repo) -> Result<RepoDetails>;

    /// Single-shot: resolves once the agent has produced its plan.
    async fn dispatch_agent(&self, issue_id: u64, instructions: &str) -> Result<AgentResponse>;

    async fn credential_status(&self) -> Result<bool>;

    async fn save_credentials(&self, github: &str, jules: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Hosted,
    Standalone,
}

#[derive(Clone)]
pub struct Services {
    pub backend: Backend,
    pub data: Arc<dyn DataService>,
    pub watchlist: Arc<WatchlistStore>,
}

impl Services {
    /// Demo data with an in-memory watchlist.
    pub fn standalone(settings: &Settings) -> Self {
        Self {
            backend: Backend::Standalone,
            data: Arc::new(MockService::new(settings.mock_latency)),
            watchlist: Arc::new(WatchlistStore::new(Arc::new(MemoryOpener))),
        }
    }

    pub fn hosted<R: Runtime>(app: &AppHandle<R>, core: Arc<FocusCore>) -> Self {
        Self {
            backend: Backend::Hosted,
            data: Arc::new(HostService::new(core)),
            watchlist: Arc::new(WatchlistStore::new(Arc::new(TauriStoreOpener::new(
                app.clone(),
            )))),
        }
    }

    /// Hosted when the `focus-core` plugin is registered, unless the settings
    /// ask for demo data.
    pub fn detect<R: Runtime>(app: &AppHandle<R>, settings: &Settings) -> Self {
        if settings.mock_data {
            log::info!("mock_data enabled, using demo data");
            return Self::standalone(settings);
        }
        match app.try_state::<Arc<FocusCore>>() {
            Some(core) => {
                log::info!("focus-core host detected");
                Self::hosted(app, core.inner().clone())
            }
            None => {
                log::warn!("focus-core host not available, using demo data");
                Self::standalone(settings)
            }
        }
    }
}
