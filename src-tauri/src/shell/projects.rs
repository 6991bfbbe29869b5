use serde::Serialize;
use std::collections::HashMap;

use super::{FocusHub, Generation, ShellRender};
use crate::error::{Error, Result};
use crate::models::{AgentResponse, Issue, PullRequest, Repo, RepoDetails, Watchlist};

const NO_SELECTION: &str = "Select a repository from your Watchlist.";

/// Lifecycle of one agent dispatch for the active issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum DispatchState {
    #[default]
    Idle,
    Running,
    Done {
        session_id: String,
        plan: Vec<String>,
    },
    Failed {
        message: String,
    },
}

impl DispatchState {
    /// The instruction editor only accepts input before a dispatch or after
    /// a failed one.
    fn editable(&self) -> bool {
        matches!(self, DispatchState::Idle | DispatchState::Failed { .. })
    }
}

/// What the shell needs to actually run a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub ticket: u64,
    pub issue_id: u64,
    pub instructions: String,
}

pub fn seed_instructions(issue: &Issue) -> String {
    format!(
        "Fix issue #{}: {}\n\nContext: {}",
        issue.id, issue.title, issue.body
    )
}

#[derive(Debug, Default)]
pub struct ProjectsView {
    selected: Option<u64>,
    details: Option<RepoDetails>,
    loading: bool,
    active_issue: Option<Issue>,
    instructions: String,
    dispatch: DispatchState,
    details_generation: Generation,
    dispatch_generation: Generation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoTab {
    pub id: u64,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueRow {
    #[serde(flatten)]
    pub issue: Issue,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PullRequestRow {
    #[serde(flatten)]
    pub pr: PullRequest,
    pub by_agent: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchPanel {
    pub issue: Issue,
    pub instructions: String,
    pub dispatch: DispatchState,
    pub editor_enabled: bool,
    pub can_dispatch: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectsRender {
    pub placeholder: Option<&'static str>,
    pub tabs: Vec<RepoTab>,
    pub selected_repo: Option<u64>,
    pub repo_name: Option<String>,
    pub loading: bool,
    pub prs: Vec<PullRequestRow>,
    pub issues: Vec<IssueRow>,
    pub panel: Option<DispatchPanel>,
}

impl ProjectsView {
    pub fn new(watchlist: &Watchlist, initial: Option<u64>) -> Self {
        Self {
            selected: initial.or_else(|| watchlist.first()),
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    #[cfg(test)]
    pub fn dispatch_state(&self) -> &DispatchState {
        &self.dispatch
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    fn reset_dispatch(&mut self) {
        self.dispatch = DispatchState::Idle;
        self.dispatch_generation.advance();
    }

    pub fn select_repo(&mut self, id: u64) {
        self.selected = Some(id);
        self.details = None;
        self.active_issue = None;
        self.reset_dispatch();
    }

    pub fn begin_fetch(&mut self) -> Option<(u64, u64)> {
        let repo_id = self.selected?;
        self.loading = true;
        Some((self.details_generation.advance(), repo_id))
    }

    pub fn apply_details(&mut self, ticket: u64, details: RepoDetails) -> bool {
        if !self.details_generation.is_current(ticket) {
            return false;
        }
        self.details = Some(details);
        self.loading = false;
        true
    }

    /// Make `issue_id` the active issue, reseeding the instructions. Picking
    /// the issue that is already active changes nothing.
    pub fn select_issue(&mut self, issue_id: u64) -> Result<()> {
        if self.active_issue.as_ref().is_some_and(|i| i.id == issue_id) {
            return Ok(());
        }
        let issue = self
            .details
            .as_ref()
            .and_then(|d| d.issue(issue_id))
            .cloned()
            .ok_or(Error::UnknownIssue(issue_id))?;
        self.instructions = seed_instructions(&issue);
        self.active_issue = Some(issue);
        self.reset_dispatch();
        Ok(())
    }

    pub fn close_issue(&mut self) {
        self.active_issue = None;
        self.reset_dispatch();
    }

    pub fn edit_instructions(&mut self, text: &str) -> bool {
        if self.active_issue.is_none() || !self.dispatch.editable() {
            return false;
        }
        self.instructions = text.to_string();
        true
    }

    /// Move to `running` and hand out the request, or `None` when there is
    /// nothing to dispatch right now.
    pub fn begin_dispatch(&mut self) -> Option<DispatchRequest> {
        let issue_id = self.active_issue.as_ref()?.id;
        if !self.dispatch.editable() {
            return None;
        }
        self.dispatch = DispatchState::Running;
        Some(DispatchRequest {
            ticket: self.dispatch_generation.advance(),
            issue_id,
            instructions: self.instructions.clone(),
        })
    }

    pub fn finish_dispatch(&mut self, ticket: u64, outcome: Result<AgentResponse>) -> bool {
        if !self.dispatch_generation.is_current(ticket) {
            return false;
        }
        self.dispatch = match outcome {
            Ok(response) => DispatchState::Done {
                session_id: response.session_id,
                plan: response.plan,
            },
            Err(e) => DispatchState::Failed {
                message: e.to_string(),
            },
        };
        true
    }

    pub fn render(&self, watchlist: &Watchlist, repos: &HashMap<u64, Repo>) -> ProjectsRender {
        let tabs = watchlist
            .ids()
            .iter()
            .filter_map(|id| repos.get(id))
            .map(|repo| RepoTab {
                id: repo.id,
                name: repo.name.clone(),
                active: self.selected == Some(repo.id),
            })
            .collect();

        let active_id = self.active_issue.as_ref().map(|i| i.id);
        let (prs, issues) = match &self.details {
            Some(details) => (
                details
                    .prs
                    .iter()
                    .map(|pr| PullRequestRow {
                        pr: pr.clone(),
                        by_agent: pr.author == "jules-ai",
                    })
                    .collect(),
                details
                    .issues
                    .iter()
                    .map(|issue| IssueRow {
                        issue: issue.clone(),
                        active: active_id == Some(issue.id),
                    })
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let panel = self.active_issue.as_ref().map(|issue| DispatchPanel {
            issue: issue.clone(),
            instructions: self.instructions.clone(),
            dispatch: self.dispatch.clone(),
            editor_enabled: self.dispatch.editable(),
            can_dispatch: self.dispatch.editable(),
        });

        ProjectsRender {
            placeholder: self.selected.is_none().then_some(NO_SELECTION),
            tabs,
            selected_repo: self.selected,
            repo_name: self
                .selected
                .and_then(|id| repos.get(&id))
                .map(|r| r.name.clone()),
            loading: self.loading,
            prs,
            issues,
            panel,
        }
    }
}

impl FocusHub {
    pub(crate) async fn load_projects(&self) -> Result<()> {
        let Some((ticket, repo_id)) = self.state()?.projects.begin_fetch() else {
            return Ok(());
        };
        let details = self.fetch_details(repo_id).await;
        if !self.state()?.projects.apply_details(ticket, details) {
            log::debug!("Discarding stale project details for repo {repo_id}");
        }
        Ok(())
    }

    pub async fn projects_select_repo(&self, id: u64) -> Result<ShellRender> {
        {
            let mut state = self.state()?;
            if !state.watchlist.contains(id) {
                return Err(Error::UnknownRepo(id));
            }
            state.projects.select_repo(id);
        }
        self.load_projects().await?;
        self.render()
    }

    pub fn projects_select_issue(&self, issue_id: u64) -> Result<ShellRender> {
        self.state()?.projects.select_issue(issue_id)?;
        self.render()
    }

    pub fn projects_close_issue(&self) -> Result<ShellRender> {
        self.state()?.projects.close_issue();
        self.render()
    }

    pub fn projects_edit_instructions(&self, text: &str) -> Result<ShellRender> {
        if !self.state()?.projects.edit_instructions(text) {
            log::debug!("Instruction edit ignored while the editor is locked");
        }
        self.render()
    }

    /// Dispatch the agent on the active issue and wait for its plan.
    pub async fn projects_dispatch(&self) -> Result<ShellRender> {
        let request = self.state()?.projects.begin_dispatch();
        let Some(request) = request else {
            return self.render();
        };
        self.notify();

        log::info!("Dispatching agent for issue #{}", request.issue_id);
        let outcome = self
            .services
            .data
            .dispatch_agent(request.issue_id, &request.instructions)
            .await;
        if let Err(e) = &outcome {
            log::error!("Agent dispatch for issue #{} failed: {e}", request.issue_id);
        }

        if !self
            .state()?
            .projects
            .finish_dispatch(request.ticket, outcome)
        {
            log::debug!("Discarding agent response for inactive issue #{}", request.issue_id);
        }
        self.render()
    }
}
