//! The `focus-core` host plugin: API tokens, GitHub and the coding agent.
//!
//! The webview can reach it through `plugin:focus-core|<command>`; the shell's
//! hosted data layer calls [`FocusCore`] directly through the managed state.

pub mod agent;
pub mod credentials;
pub mod github;

use std::sync::Arc;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Manager, Runtime, State};

use self::agent::AgentClient;
use self::credentials::{CredentialStore, Token};
use self::github::GitHubClient;
use crate::config::Settings;
use crate::error::Result;
use crate::models::{AgentResponse, Repo, RepoDetails};

pub const PLUGIN_NAME: &str = "focus-core";

pub struct FocusCore {
    credentials: Arc<dyn CredentialStore>,
    github: GitHubClient,
    agent: AgentClient,
}

impl FocusCore {
    pub fn new(credentials: Arc<dyn CredentialStore>, settings: &Settings) -> Self {
        Self {
            credentials,
            github: GitHubClient::new(&settings.github_api_url),
            agent: AgentClient::new(&settings.agent_api_url),
        }
    }

    fn token(&self, token: Token) -> Result<String> {
        match self.credentials.get(token) {
            Ok(Some(value)) if !value.is_empty() => Ok(value),
            Ok(_) => Err(token.missing()),
            Err(e) => {
                log::error!("Failed to read {}: {e}", token.account());
                Err(token.missing())
            }
        }
    }

    pub async fn search_repos(&self, query: &str) -> Result<Vec<Repo>> {
        let token = self.token(Token::GitHub)?;
        self.github.search(query, &token).await
    }

    pub async fn get_repo(&self, id: u64) -> Result<Repo> {
        let token = self.token(Token::GitHub)?;
        self.github.repository(id, &token).await
    }

    pub async fn get_repo_details(&self, owner: &str, repo: &str) -> Result<RepoDetails> {
        let token = self.token(Token::GitHub)?;
        self.github.details(owner, repo, &token).await
    }

    pub async fn dispatch_agent(&self, task_id: &str, prompt: &str) -> Result<AgentResponse> {
        let token = self.token(Token::Agent)?;
        self.agent.start_session(task_id, prompt, &token).await
    }

    pub fn save_api_keys(&self, github: &str, jules: &str) -> Result<()> {
        self.credentials.set(Token::GitHub, github)?;
        self.credentials.set(Token::Agent, jules)?;
        log::info!("API keys saved");
        Ok(())
    }

    /// Both tokens present and readable.
    pub fn api_keys_status(&self) -> bool {
        self.token(Token::GitHub).is_ok() && self.token(Token::Agent).is_ok()
    }
}

#[tauri::command]
async fn search_repos(core: State<'_, Arc<FocusCore>>, query: String) -> Result<Vec<Repo>, String> {
    log::info!("search_repos: query={query}");
    core.search_repos(&query).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_repo(core: State<'_, Arc<FocusCore>>, id: u64) -> Result<Repo, String> {
    log::info!("get_repo: id={id}");
    core.get_repo(id).await.map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_repo_details(
    core: State<'_, Arc<FocusCore>>,
    owner: String,
    repo: String,
) -> Result<RepoDetails, String> {
    log::info!("get_repo_details: {owner}/{repo}");
    core.get_repo_details(&owner, &repo)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn dispatch_agent(
    core: State<'_, Arc<FocusCore>>,
    task_id: String,
    prompt: String,
) -> Result<AgentResponse, String> {
    log::info!("dispatch_agent: task_id={task_id}");
    core.dispatch_agent(&task_id, &prompt)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn save_api_keys(
    core: State<'_, Arc<FocusCore>>,
    github: String,
    jules: String,
) -> Result<(), String> {
    core.save_api_keys(&github, &jules)
        .map_err(|e| e.to_string())
}

#[tauri::command]
async fn get_api_keys_status(core: State<'_, Arc<FocusCore>>) -> Result<bool, String> {
    Ok(core.api_keys_status())
}

pub fn init<R: Runtime>(core: Arc<FocusCore>) -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .invoke_handler(tauri::generate_handler![
            search_repos,
            get_repo,
            get_repo_details,
            dispatch_agent,
            save_api_keys,
            get_api_keys_status,
        ])
        .setup(move |app, _api| {
            app.manage(core);
            Ok(())
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::credentials::MemoryCredentials;
    use super::*;
    use crate::error::Error;

    fn core(credentials: MemoryCredentials) -> FocusCore {
        FocusCore::new(Arc::new(credentials), &Settings::default())
    }

    #[test]
    fn test_status_requires_both_keys() {
        let store = MemoryCredentials::default();
        store.set(Token::GitHub, "ghp").unwrap();
        let core = core(store);
        assert!(!core.api_keys_status());

        core.save_api_keys("ghp", "jules").unwrap();
        assert!(core.api_keys_status());
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let core = core(MemoryCredentials::with_tokens("", "jules"));
        assert!(!core.api_keys_status());
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let core = core(MemoryCredentials::default());
        let err = core.search_repos("auth").await.unwrap_err();
        assert!(matches!(err, Error::MissingGithubToken));
        let err = core.dispatch_agent("1", "go").await.unwrap_err();
        assert!(matches!(err, Error::MissingAgentToken));
    }
}
