use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::DataService;
use crate::error::{Error, Result};
use crate::focus_core::FocusCore;
use crate::models::{AgentResponse, Repo, RepoDetails};

/// Production data layer backed by the `focus-core` plugin.
pub struct HostService {
    core: Arc<FocusCore>,
    /// Repos seen in search results or looked up by id.
    known: RwLock<HashMap<u64, Repo>>,
}

impl HostService {
    pub fn new(core: Arc<FocusCore>) -> Self {
        Self {
            core,
            known: RwLock::new(HashMap::new()),
        }
    }

    fn remember(&self, repos: &[Repo]) {
        if let Ok(mut known) = self.known.write() {
            for repo in repos {
                known.insert(repo.id, repo.clone());
            }
        }
    }

    fn cached(&self, id: u64) -> Option<Repo> {
        self.known.read().ok()?.get(&id).cloned()
    }
}

#[async_trait]
impl DataService for HostService {
    async fn search_repos(&self, query: &str) -> Result<Vec<Repo>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let repos = self.core.search_repos(query).await?;
        self.remember(&repos);
        Ok(repos)
    }

    async fn repo(&self, id: u64) -> Option<Repo> {
        if let Some(repo) = self.cached(id) {
            return Some(repo);
        }
        match self.core.get_repo(id).await {
            Ok(repo) => {
                self.remember(std::slice::from_ref(&repo));
                Some(repo)
            }
            Err(e) => {
                log::error!("Failed to resolve repo {id}: {e}");
                None
            }
        }
    }

    async fn fetch_repo_details(&self, repo: &Repo) -> Result<RepoDetails> {
        let owner = repo.owner.as_deref().ok_or(Error::UnknownRepo(repo.id))?;
        self.core.get_repo_details(owner, &repo.name).await
    }

    async fn dispatch_agent(&self, issue_id: u64, instructions: &str) -> Result<AgentResponse> {
        self.core
            .dispatch_agent(&issue_id.to_string(), instructions)
            .await
    }

    async fn credential_status(&self) -> Result<bool> {
        Ok(self.core.api_keys_status())
    }

    async fn save_credentials(&self, github: &str, jules: &str) -> Result<()> {
        self.core.save_api_keys(github, jules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::focus_core::credentials::MemoryCredentials;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn host(server: &MockServer, credentials: MemoryCredentials) -> HostService {
        let settings = Settings {
            github_api_url: server.uri(),
            agent_api_url: server.uri(),
            ..Settings::default()
        };
        HostService::new(Arc::new(FocusCore::new(Arc::new(credentials), &settings)))
    }

    #[tokio::test]
    async fn test_repo_lookup_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42, "name": "auth-service", "private": true,
                "description": "Auth", "owner": { "login": "acme" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let svc = host(&server, MemoryCredentials::with_tokens("ghp", "jules"));
        let repo = svc.repo(42).await.unwrap();
        assert_eq!(repo.owner.as_deref(), Some("acme"));
        assert_eq!(svc.repo(42).await, Some(repo));
    }

    #[tokio::test]
    async fn test_search_results_become_known() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{ "id": 7, "name": "design-system", "private": false,
                            "description": null, "owner": { "login": "acme" } }]
            })))
            .mount(&server)
            .await;

        let svc = host(&server, MemoryCredentials::with_tokens("ghp", "jules"));
        assert!(svc.search_repos("").await.unwrap().is_empty());
        assert_eq!(svc.search_repos("design").await.unwrap().len(), 1);
        // served from the cache, no /repositories/7 mock mounted
        assert_eq!(svc.repo(7).await.unwrap().name, "design-system");
    }

    #[tokio::test]
    async fn test_unresolvable_repo_is_none() {
        let server = MockServer::start().await;
        let svc = host(&server, MemoryCredentials::default());
        assert_eq!(svc.repo(1).await, None);
    }

    #[tokio::test]
    async fn test_details_need_an_owner() {
        let server = MockServer::start().await;
        let svc = host(&server, MemoryCredentials::with_tokens("ghp", "jules"));
        let repo = crate::services::mock::catalog().remove(0);
        assert!(matches!(
            svc.fetch_repo_details(&repo).await,
            Err(Error::UnknownRepo(101))
        ));
    }

    #[tokio::test]
    async fn test_save_credentials_flips_status() {
        let server = MockServer::start().await;
        let svc = host(&server, MemoryCredentials::default());
        assert!(!svc.credential_status().await.unwrap());
        svc.save_credentials("ghp", "jules").await.unwrap();
        assert!(svc.credential_status().await.unwrap());
    }
}
