//! Headless application shell.
//!
//! [`FocusHub`] owns navigation, the watchlist and both modals, and mounts one
//! content view at a time. Every public action returns a [`ShellRender`]; the
//! webview only paints it.

pub mod commands;
pub mod dashboard;
pub mod knowledge;
pub mod layout;
pub mod projects;
pub mod settings;
pub mod watchlist_manager;

use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use self::dashboard::{DashboardRender, DashboardView};
use self::knowledge::{KnowledgeRender, KnowledgeView};
use self::layout::LayoutRender;
use self::projects::{ProjectsRender, ProjectsView};
use self::settings::{SettingsModal, SettingsRender};
use self::watchlist_manager::{WatchlistManager, WatchlistManagerRender};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{Repo, RepoDetails, ViewState, Watchlist};
use crate::services::{Backend, Services};

pub const RENDER_EVENT: &str = "focus-hub://render";

/// Monotonic request counter. A result is applied only when the ticket it was
/// issued with is still the latest one.
#[derive(Debug, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn advance(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0 == ticket
    }
}

/// Background work a mount or mutation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Load {
    None,
    Dashboard,
    Projects,
    Knowledge,
}

struct ShellState {
    view: ViewState,
    selected_repo: Option<u64>,
    watchlist: Watchlist,
    repos: HashMap<u64, Repo>,
    keys_configured: bool,
    loading: bool,
    manager: WatchlistManager,
    settings: SettingsModal,
    dashboard: DashboardView,
    projects: ProjectsView,
    knowledge: KnowledgeView,
}

/// The view whose content is on screen for `view`.
fn content_view(view: ViewState) -> ViewState {
    match view {
        ViewState::Settings => ViewState::Dashboard,
        other => other,
    }
}

impl ShellState {
    fn new() -> Self {
        Self {
            view: ViewState::default(),
            selected_repo: None,
            watchlist: Watchlist::default(),
            repos: HashMap::new(),
            keys_configured: false,
            loading: true,
            manager: WatchlistManager::default(),
            settings: SettingsModal::default(),
            dashboard: DashboardView::default(),
            projects: ProjectsView::default(),
            knowledge: KnowledgeView::default(),
        }
    }

    fn ready(&self) -> bool {
        !self.loading && self.keys_configured
    }

    /// The selection context, if it still names a watched repo.
    fn context(&self) -> Option<u64> {
        self.selected_repo.filter(|id| self.watchlist.contains(*id))
    }

    /// Recreate the content view for the current tag.
    fn mount(&mut self) -> Load {
        if !self.ready() {
            return Load::None;
        }
        match content_view(self.view) {
            ViewState::Projects => {
                self.projects = ProjectsView::new(&self.watchlist, self.context());
                Load::Projects
            }
            ViewState::Knowledge => {
                self.knowledge = KnowledgeView::new(&self.watchlist, self.context());
                Load::Knowledge
            }
            ViewState::Agent => Load::None,
            _ => {
                self.dashboard = DashboardView::default();
                Load::Dashboard
            }
        }
    }

    fn content(&self) -> Content {
        if self.loading {
            return Content::Loading;
        }
        if !self.keys_configured {
            return Content::ConfigurationRequired;
        }
        match content_view(self.view) {
            ViewState::Projects => Content::Projects(self.projects.render(&self.watchlist, &self.repos)),
            ViewState::Knowledge => {
                Content::Knowledge(self.knowledge.render(&self.watchlist, &self.repos))
            }
            ViewState::Agent => Content::Agent(AgentPlaceholder::default()),
            _ => Content::Dashboard(self.dashboard.render(&self.watchlist, &self.repos)),
        }
    }

    fn render(&self, backend: Backend) -> ShellRender {
        ShellRender {
            backend,
            loading: self.loading,
            view: self.view,
            selected_repo: self.selected_repo,
            keys_configured: self.keys_configured,
            watched_ids: self.watchlist.ids().to_vec(),
            layout: layout::render(self.view, &self.watchlist),
            content: self.content(),
            watchlist_manager: self
                .manager
                .is_open()
                .then(|| self.manager.render(&self.watchlist)),
            settings: self.settings.is_open().then(|| self.settings.render()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentPlaceholder {
    pub title: &'static str,
    pub message: &'static str,
}

impl Default for AgentPlaceholder {
    fn default() -> Self {
        Self {
            title: "Jules Agent",
            message: "Global agent history and configuration coming soon. Dispatch Jules from the \"Active Projects\" tab to start a task.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Loading,
    ConfigurationRequired,
    Dashboard(DashboardRender),
    Projects(ProjectsRender),
    Knowledge(KnowledgeRender),
    Agent(AgentPlaceholder),
}

/// Everything the webview needs to paint one frame.
#[derive(Debug, Clone, Serialize)]
pub struct ShellRender {
    pub backend: Backend,
    pub loading: bool,
    pub view: ViewState,
    pub selected_repo: Option<u64>,
    pub keys_configured: bool,
    pub watched_ids: Vec<u64>,
    pub layout: LayoutRender,
    pub content: Content,
    pub watchlist_manager: Option<WatchlistManagerRender>,
    pub settings: Option<SettingsRender>,
}

type Listener = Arc<dyn Fn(&ShellRender) + Send + Sync>;

/// Root controller. Clones share the same state.
///
/// The state mutex is never held across an await: async actions take a
/// ticket under the lock, await the service call, then re-lock and apply the
/// result only if the ticket is still current.
#[derive(Clone)]
pub struct FocusHub {
    state: Arc<Mutex<ShellState>>,
    services: Services,
    search_debounce: Duration,
    /// Serializes watchlist mutations with their persistence writes.
    persist: Arc<tokio::sync::Mutex<()>>,
    listener: Option<Listener>,
}

impl FocusHub {
    pub fn new(services: Services, settings: &Settings) -> Self {
        Self {
            state: Arc::new(Mutex::new(ShellState::new())),
            services,
            search_debounce: settings.search_debounce(),
            persist: Arc::new(tokio::sync::Mutex::new(())),
            listener: None,
        }
    }

    /// Called with a fresh render whenever background work changes state.
    pub fn with_listener(mut self, listener: impl Fn(&ShellRender) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, ShellState>> {
        self.state.lock().map_err(|_| Error::Lock)
    }

    pub fn render(&self) -> Result<ShellRender> {
        Ok(self.state()?.render(self.services.backend))
    }

    fn notify(&self) {
        let Some(listener) = &self.listener else {
            return;
        };
        match self.render() {
            Ok(render) => listener(&render),
            Err(e) => log::error!("Failed to render shell: {e}"),
        }
    }

    /// Startup: credential status and the saved watchlist, then the first
    /// mount. Either read failing degrades on its own.
    pub async fn init(&self) -> Result<ShellRender> {
        let (status, saved) = futures::join!(
            self.services.data.credential_status(),
            self.services.watchlist.get()
        );
        let configured = status.unwrap_or_else(|e| {
            log::error!("Failed to read API key status: {e}");
            false
        });
        let ids = saved.unwrap_or_else(|e| {
            log::error!("Failed to load watchlist: {e}");
            Vec::new()
        });
        let watchlist = Watchlist::from_ids(ids);
        let repos = self.resolve_repos(watchlist.ids()).await;
        log::info!(
            "Focus Hub ready: {} watched repos, keys configured: {configured}",
            watchlist.len()
        );

        let load = {
            let mut state = self.state()?;
            state.keys_configured = configured;
            if !configured {
                state.settings.open();
            }
            state.watchlist = watchlist;
            state.repos.extend(repos.into_iter().map(|repo| (repo.id, repo)));
            state.loading = false;
            state.mount()
        };
        self.notify();
        self.run_load(load).await?;
        self.notify();
        self.render()
    }

    /// Switch the active view. A watched repo id becomes the selection
    /// context the next mounted view starts from; any other id is ignored.
    pub async fn navigate_to(&self, view: ViewState, repo_id: Option<u64>) -> Result<ShellRender> {
        let load = {
            let mut state = self.state()?;
            let repo_id = match repo_id {
                Some(id) if !state.watchlist.contains(id) => {
                    log::warn!("Ignoring navigation context {id}: not watched");
                    None
                }
                other => other,
            };
            let previous = content_view(state.view);
            state.view = view;
            if repo_id.is_some() {
                state.selected_repo = repo_id;
            }
            if previous == content_view(view) && repo_id.is_none() {
                Load::None
            } else {
                state.mount()
            }
        };
        self.run_load(load).await?;
        self.render()
    }

    /// Watch or unwatch `id` and persist the new list before returning.
    pub async fn toggle_watch(&self, id: u64) -> Result<ShellRender> {
        let persist = self.persist.lock().await;
        let (ids, watched, known, load) = {
            let mut state = self.state()?;
            let watched = state.watchlist.toggle(id);
            if !watched && state.selected_repo == Some(id) {
                state.selected_repo = None;
            }
            let load = if !state.ready() {
                Load::None
            } else {
                match content_view(state.view) {
                    ViewState::Dashboard => Load::Dashboard,
                    ViewState::Projects if !watched && state.projects.selected() == Some(id) => {
                        state.mount()
                    }
                    ViewState::Knowledge if !watched && state.knowledge.selected() == Some(id) => {
                        state.mount()
                    }
                    _ => Load::None,
                }
            };
            (
                state.watchlist.ids().to_vec(),
                watched,
                state.repos.contains_key(&id),
                load,
            )
        };
        log::info!("{} repo {id}", if watched { "Watching" } else { "Unwatching" });

        if let Err(e) = self.services.watchlist.set(&ids).await {
            log::error!("Failed to persist watchlist: {e}");
        }
        drop(persist);

        if watched && !known && self.repo(id).await.is_none() {
            log::warn!("Watching repo {id}, which could not be resolved");
        }

        self.run_load(load).await?;
        self.render()
    }

    async fn run_load(&self, load: Load) -> Result<()> {
        match load {
            Load::None => Ok(()),
            Load::Dashboard => self.load_dashboard().await,
            Load::Projects => self.load_projects().await,
            Load::Knowledge => self.load_knowledge().await,
        }
    }

    async fn resolve_repos(&self, ids: &[u64]) -> Vec<Repo> {
        let data = &self.services.data;
        join_all(ids.iter().map(|&id| data.repo(id)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Repo by id: the known set first, then the data service.
    async fn repo(&self, id: u64) -> Option<Repo> {
        let cached = self.state().ok().and_then(|s| s.repos.get(&id).cloned());
        if cached.is_some() {
            return cached;
        }
        let repo = self.services.data.repo(id).await?;
        if let Ok(mut state) = self.state() {
            state.repos.insert(id, repo.clone());
        }
        Some(repo)
    }

    /// Details for one watched repo. Failures are logged and read as an
    /// empty bundle.
    pub(crate) async fn fetch_details(&self, id: u64) -> RepoDetails {
        let Some(repo) = self.repo(id).await else {
            log::warn!("No repository {id}, showing empty details");
            return RepoDetails::default();
        };
        match self.services.data.fetch_repo_details(&repo).await {
            Ok(details) => {
                log::debug!(
                    "Loaded {}: {} issues, {} prs, {} files",
                    repo.name,
                    details.issues.len(),
                    details.prs.len(),
                    details.files.len()
                );
                details
            }
            Err(e) => {
                log::error!("Failed to fetch details for {}: {e}", repo.name);
                RepoDetails::default()
            }
        }
    }
}
