use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub id: u64,
    pub name: String,
    pub private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Account that owns the repository. Only known for repos that came
    /// from GitHub; the built-in demo list leaves it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub title: String,
    pub status: IssueStatus,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    Open,
    Merged,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub status: PrStatus,
}

/// Everything the detail views show for one repository.
///
/// `files` keeps insertion order: the knowledge view opens the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoDetails {
    pub issues: Vec<Issue>,
    pub prs: Vec<PullRequest>,
    pub files: IndexMap<String, String>,
}

impl RepoDetails {
    pub fn first_file(&self) -> Option<&str> {
        self.files.keys().next().map(String::as_str)
    }

    pub fn issue(&self, id: u64) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub session_id: String,
    pub status: String,
    pub plan: Vec<String>,
}

/// Watched repository ids: insertion ordered, never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist(Vec<u64>);

impl Watchlist {
    pub fn from_ids(ids: impl IntoIterator<Item = u64>) -> Self {
        let mut list = Self::default();
        for id in ids {
            if !list.contains(id) {
                list.0.push(id);
            }
        }
        list
    }

    pub fn ids(&self) -> &[u64] {
        &self.0
    }

    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    pub fn first(&self) -> Option<u64> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove `id` if present, append it otherwise. Returns whether it is
    /// watched afterwards.
    pub fn toggle(&mut self, id: u64) -> bool {
        if let Some(pos) = self.0.iter().position(|&w| w == id) {
            self.0.remove(pos);
            false
        } else {
            self.0.push(id);
            true
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Dashboard,
    Projects,
    Knowledge,
    Agent,
    Settings,
}

impl ViewState {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Dashboard => "dashboard",
            ViewState::Projects => "projects",
            ViewState::Knowledge => "knowledge",
            ViewState::Agent => "agent",
            ViewState::Settings => "settings",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(ViewState::Dashboard),
            "projects" => Ok(ViewState::Projects),
            "knowledge" => Ok(ViewState::Knowledge),
            "agent" => Ok(ViewState::Agent),
            "settings" => Ok(ViewState::Settings),
            other => Err(format!("Unknown view: {other}")),
        }
    }
}
