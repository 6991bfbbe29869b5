use serde::Serialize;

use super::{FocusHub, Generation, ShellRender};
use crate::error::Result;
use crate::models::{Repo, Watchlist};

/// Queries this short clear the results instead of searching.
const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Default)]
pub struct WatchlistManager {
    open: bool,
    query: String,
    results: Vec<Repo>,
    loading: bool,
    generation: Generation,
}

/// What to do once the debounce delay for a keystroke has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPlan {
    /// A later keystroke owns the search now.
    Superseded,
    Cleared,
    Search(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub repo: Repo,
    pub watched: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WatchlistManagerRender {
    pub query: String,
    pub loading: bool,
    pub results: Vec<ResultRow>,
    pub empty_message: Option<&'static str>,
    pub watched_count: usize,
}

impl WatchlistManager {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn set_query(&mut self, query: &str) -> u64 {
        self.query = query.to_string();
        self.generation.advance()
    }

    pub fn begin_search(&mut self, ticket: u64) -> SearchPlan {
        if !self.generation.is_current(ticket) {
            return SearchPlan::Superseded;
        }
        if self.query.chars().count() < MIN_QUERY_CHARS {
            self.results.clear();
            self.loading = false;
            return SearchPlan::Cleared;
        }
        self.loading = true;
        SearchPlan::Search(self.query.clone())
    }

    pub fn finish_search(&mut self, ticket: u64, outcome: Result<Vec<Repo>>) -> bool {
        if !self.generation.is_current(ticket) {
            return false;
        }
        self.results = outcome.unwrap_or_else(|e| {
            log::error!("Repository search for {:?} failed: {e}", self.query);
            Vec::new()
        });
        self.loading = false;
        true
    }

    pub fn render(&self, watchlist: &Watchlist) -> WatchlistManagerRender {
        let empty_message = (!self.loading && self.results.is_empty()).then_some(
            if self.query.is_empty() {
                "Type to search your repository index."
            } else {
                "No repositories found matching your query."
            },
        );
        WatchlistManagerRender {
            query: self.query.clone(),
            loading: self.loading,
            results: self
                .results
                .iter()
                .map(|repo| ResultRow {
                    repo: repo.clone(),
                    watched: watchlist.contains(repo.id),
                })
                .collect(),
            empty_message,
            watched_count: watchlist.len(),
        }
    }
}

impl FocusHub {
    pub fn open_watchlist(&self) -> Result<ShellRender> {
        self.state()?.manager.open();
        self.render()
    }

    pub fn close_watchlist(&self) -> Result<ShellRender> {
        self.state()?.manager.close();
        self.render()
    }

    /// Debounced search. Returns `None` when a later keystroke superseded this
    /// one, either during the delay or while the search was in flight.
    pub async fn search_watchlist(&self, query: &str) -> Result<Option<ShellRender>> {
        let ticket = self.state()?.manager.set_query(query);
        tokio::time::sleep(self.search_debounce).await;

        let plan = self.state()?.manager.begin_search(ticket);
        let query = match plan {
            SearchPlan::Superseded => return Ok(None),
            SearchPlan::Cleared => return self.render().map(Some),
            SearchPlan::Search(query) => query,
        };
        self.notify();

        let outcome = self.services.data.search_repos(&query).await;
        let applied = {
            let mut state = self.state()?;
            if let Ok(repos) = &outcome {
                log::debug!("Search {query:?} returned {} repos", repos.len());
                for repo in repos {
                    state.repos.insert(repo.id, repo.clone());
                }
            }
            state.manager.finish_search(ticket, outcome)
        };
        if !applied {
            return Ok(None);
        }
        self.render().map(Some)
    }
}
