use async_trait::async_trait;
use indexmap::IndexMap;
use std::time::{SystemTime, UNIX_EPOCH};

use super::DataService;
use crate::config::MockLatency;
use crate::error::Result;
use crate::focus_core::credentials::{CredentialStore, MemoryCredentials, Token};
use crate::models::{
    AgentResponse, Issue, IssueStatus, PrStatus, PullRequest, Repo, RepoDetails,
};

pub const AGENT_PLAN: [&str; 4] = [
    "Analyze Issue Context",
    "Read Related Files",
    "Generate Implementation Plan",
    "Draft Pull Request",
];

fn repo(id: u64, name: &str, private: bool, description: Option<&str>) -> Repo {
    Repo {
        id,
        name: name.to_string(),
        private,
        description: description.map(str::to_string),
        owner: None,
    }
}

/// The repositories a demo user owns.
pub fn catalog() -> Vec<Repo> {
    vec![
        repo(101, "legacy-project-1", true, None),
        repo(102, "focus-hub", true, Some("Command Center")),
        repo(103, "auth-service", false, None),
        repo(104, "design-system", false, Some("Shared UI Lib")),
        repo(105, "analytics-worker", true, None),
        repo(106, "mobile-ios", true, None),
    ]
}

fn issue(id: u64, title: &str, body: &str) -> Issue {
    Issue {
        id,
        title: title.to_string(),
        status: IssueStatus::Open,
        body: body.to_string(),
    }
}

fn agent_pr(id: u64, title: &str) -> PullRequest {
    PullRequest {
        id,
        title: title.to_string(),
        author: "jules-ai".to_string(),
        status: PrStatus::Open,
    }
}

fn files(entries: &[(&str, &str)]) -> IndexMap<String, String> {
    entries
        .iter()
        .map(|(name, text)| ((*name).to_string(), (*text).to_string()))
        .collect()
}

/// Canned details; the same id always produces the same bundle.
pub fn details_for(repo_id: u64) -> RepoDetails {
    if repo_id == 103 {
        return RepoDetails {
            issues: vec![
                issue(
                    201,
                    "JWT token expiration bug",
                    "Tokens are not refreshing correctly on 401.",
                ),
                issue(202, "Add 2FA endpoints", "Need to implement TOTP verification."),
            ],
            prs: vec![agent_pr(55, "Jules: Refactor Middleware")],
            files: files(&[
                (
                    "README.md",
                    "# Auth Service\n\nHandles user authentication and session management.",
                ),
                ("API.md", "# Endpoints\n\n- POST /login\n- POST /refresh"),
            ]),
        };
    }

    RepoDetails {
        issues: vec![issue(1, "Fix login bug", "Login fails on iOS...")],
        prs: vec![agent_pr(50, "Jules: Refactored Auth")],
        files: files(&[
            (
                "README.md",
                "# Focus Hub\n\nThe ultimate developer dashboard. Only syncs what matters.",
            ),
            (
                "AGENTS.md",
                "# AI Configuration\n\nJules is enabled for this repo.\n\n## Capabilities\n- PR Reviews\n- Code Generation",
            ),
        ]),
    }
}

/// In-memory demo backend with simulated network latency.
#[derive(Debug, Default)]
pub struct MockService {
    latency: MockLatency,
    credentials: MemoryCredentials,
}

impl MockService {
    pub fn new(latency: MockLatency) -> Self {
        Self {
            latency,
            credentials: MemoryCredentials::default(),
        }
    }
}

#[async_trait]
impl DataService for MockService {
    async fn search_repos(&self, query: &str) -> Result<Vec<Repo>> {
        tokio::time::sleep(self.latency.search()).await;
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let needle = query.to_lowercase();
        Ok(catalog()
            .into_iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect())
    }

    async fn repo(&self, id: u64) -> Option<Repo> {
        catalog().into_iter().find(|r| r.id == id)
    }

    async fn fetch_repo_details(&self, repo: &Repo) -> Result<RepoDetails> {
        tokio::time::sleep(self.latency.details()).await;
        Ok(details_for(repo.id))
    }

    async fn dispatch_agent(&self, issue_id: u64, instructions: &str) -> Result<AgentResponse> {
        log::info!(
            "mock dispatch for issue #{issue_id} ({} byte instructions)",
            instructions.len()
        );
        tokio::time::sleep(self.latency.dispatch()).await;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Ok(AgentResponse {
            session_id: format!("sess_{millis}"),
            status: "RUNNING".to_string(),
            plan: AGENT_PLAN.iter().map(|s| (*s).to_string()).collect(),
        })
    }

    async fn credential_status(&self) -> Result<bool> {
        let github = self.credentials.get(Token::GitHub)?;
        let agent = self.credentials.get(Token::Agent)?;
        Ok(github.is_some_and(|v| !v.is_empty()) && agent.is_some_and(|v| !v.is_empty()))
    }

    async fn save_credentials(&self, github: &str, jules: &str) -> Result<()> {
        log::info!("mock: saving API keys");
        self.credentials.set(Token::GitHub, github)?;
        self.credentials.set(Token::Agent, jules)
    }
}
