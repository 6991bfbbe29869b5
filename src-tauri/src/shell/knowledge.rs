use serde::Serialize;
use std::collections::HashMap;

use super::{FocusHub, Generation, ShellRender};
use crate::error::{Error, Result};
use crate::models::{Repo, RepoDetails, Watchlist};

const NO_DOCUMENT: &str = "Select a file.";

/// One rendered line of a knowledge document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Block {
    Heading1(String),
    Heading2(String),
    ListItem(String),
    Blank,
    Paragraph(String),
}

/// Line-based formatting for repository docs: `# `, `## `,
/// `- `, blank lines, and everything else as a paragraph.
pub fn format_document(text: &str) -> Vec<Block> {
    text.split('\n')
        .map(|line| {
            if let Some(rest) = line.strip_prefix("# ") {
                Block::Heading1(rest.to_string())
            } else if let Some(rest) = line.strip_prefix("## ") {
                Block::Heading2(rest.to_string())
            } else if let Some(rest) = line.strip_prefix("- ") {
                Block::ListItem(rest.to_string())
            } else if line.trim().is_empty() {
                Block::Blank
            } else {
                Block::Paragraph(line.to_string())
            }
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct KnowledgeView {
    selected: Option<u64>,
    details: Option<RepoDetails>,
    active_file: Option<String>,
    loading: bool,
    generation: Generation,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoFolder {
    pub id: u64,
    pub name: String,
    pub active: bool,
    /// Only filled for the selected repository.
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeRender {
    pub folders: Vec<RepoFolder>,
    pub active_file: Option<String>,
    pub loading: bool,
    pub document: Vec<Block>,
}

impl KnowledgeView {
    pub fn new(watchlist: &Watchlist, initial: Option<u64>) -> Self {
        Self {
            selected: initial.or_else(|| watchlist.first()),
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn active_file(&self) -> Option<&str> {
        self.active_file.as_deref()
    }

    pub fn select_repo(&mut self, id: u64) {
        self.selected = Some(id);
        self.details = None;
        self.active_file = None;
    }

    /// Start a detail fetch for the current selection.
    pub fn begin_fetch(&mut self) -> Option<(u64, u64)> {
        let repo_id = self.selected?;
        self.loading = true;
        Some((self.generation.advance(), repo_id))
    }

    /// Install fetched details and open their first file. Returns false when
    /// the selection moved on in the meantime.
    pub fn apply_details(&mut self, ticket: u64, details: RepoDetails) -> bool {
        if !self.generation.is_current(ticket) {
            return false;
        }
        self.active_file = details.first_file().map(str::to_string);
        self.details = Some(details);
        self.loading = false;
        true
    }

    pub fn select_file(&mut self, name: &str) -> Result<()> {
        let known = self
            .details
            .as_ref()
            .is_some_and(|d| d.files.contains_key(name));
        if !known {
            return Err(Error::UnknownFile(name.to_string()));
        }
        self.active_file = Some(name.to_string());
        Ok(())
    }

    fn active_content(&self) -> &str {
        self.active_file
            .as_deref()
            .and_then(|name| self.details.as_ref()?.files.get(name))
            .map(String::as_str)
            .filter(|text| !text.is_empty())
            .unwrap_or(NO_DOCUMENT)
    }

    pub fn render(&self, watchlist: &Watchlist, repos: &HashMap<u64, Repo>) -> KnowledgeRender {
        let folders = watchlist
            .ids()
            .iter()
            .filter_map(|id| repos.get(id))
            .map(|repo| {
                let active = self.selected == Some(repo.id);
                let files = match (&self.details, active) {
                    (Some(details), true) => details
                        .files
                        .keys()
                        .map(|name| FileEntry {
                            name: name.clone(),
                            active: self.active_file.as_deref() == Some(name.as_str()),
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                RepoFolder {
                    id: repo.id,
                    name: repo.name.clone(),
                    active,
                    files,
                }
            })
            .collect();

        KnowledgeRender {
            folders,
            active_file: self.active_file.clone(),
            loading: self.loading,
            document: format_document(self.active_content()),
        }
    }
}

impl FocusHub {
    pub(crate) async fn load_knowledge(&self) -> Result<()> {
        let Some((ticket, repo_id)) = self.state()?.knowledge.begin_fetch() else {
            return Ok(());
        };
        let details = self.fetch_details(repo_id).await;
        if !self.state()?.knowledge.apply_details(ticket, details) {
            log::debug!("Discarding stale knowledge details for repo {repo_id}");
        }
        Ok(())
    }

    pub async fn knowledge_select_repo(&self, id: u64) -> Result<ShellRender> {
        {
            let mut state = self.state()?;
            if !state.watchlist.contains(id) {
                return Err(Error::UnknownRepo(id));
            }
            state.knowledge.select_repo(id);
        }
        self.load_knowledge().await?;
        self.render()
    }

    pub fn knowledge_select_file(&self, name: &str) -> Result<ShellRender> {
        self.state()?.knowledge.select_file(name)?;
        self.render()
    }
}
