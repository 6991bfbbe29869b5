use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;

use super::{FocusHub, Generation};
use crate::error::Result;
use crate::models::{Repo, RepoDetails, Watchlist};

const EMPTY_MESSAGE: &str = "No signals detected. Initialize watchlist to begin monitoring.";

#[derive(Debug, Default)]
pub struct DashboardView {
    details: HashMap<u64, RepoDetails>,
    loading: bool,
    generation: Generation,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoCard {
    pub id: u64,
    pub name: String,
    pub private: bool,
    pub description: Option<String>,
    /// `None` until this repo's details have loaded.
    pub issues: Option<usize>,
    pub prs: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRender {
    pub total_issues: usize,
    pub loading: bool,
    pub cards: Vec<RepoCard>,
    pub empty_message: Option<&'static str>,
}

impl DashboardView {
    /// Start a reload for `ids`. An empty watchlist settles immediately.
    pub fn begin_load(&mut self, ids: &[u64]) -> Option<u64> {
        let ticket = self.generation.advance();
        if ids.is_empty() {
            self.details.clear();
            self.loading = false;
            return None;
        }
        self.loading = true;
        Some(ticket)
    }

    pub fn apply(&mut self, ticket: u64, details: HashMap<u64, RepoDetails>) -> bool {
        if !self.generation.is_current(ticket) {
            return false;
        }
        self.details = details;
        self.loading = false;
        true
    }

    /// Open issues across repos that are still watched.
    pub fn total_issues(&self, watchlist: &Watchlist) -> usize {
        watchlist
            .ids()
            .iter()
            .filter_map(|id| self.details.get(id))
            .map(|d| d.issues.len())
            .sum()
    }

    pub fn render(&self, watchlist: &Watchlist, repos: &HashMap<u64, Repo>) -> DashboardRender {
        let cards = watchlist
            .ids()
            .iter()
            .filter_map(|id| repos.get(id))
            .map(|repo| {
                let loaded = if self.loading {
                    None
                } else {
                    self.details.get(&repo.id)
                };
                RepoCard {
                    id: repo.id,
                    name: repo.name.clone(),
                    private: repo.private,
                    description: repo.description.clone(),
                    issues: loaded.map(|d| d.issues.len()),
                    prs: loaded.map(|d| d.prs.len()),
                }
            })
            .collect();

        DashboardRender {
            total_issues: self.total_issues(watchlist),
            loading: self.loading,
            cards,
            empty_message: watchlist.is_empty().then_some(EMPTY_MESSAGE),
        }
    }
}

impl FocusHub {
    /// Fetch details for every watched repo in parallel.
    pub(crate) async fn load_dashboard(&self) -> Result<()> {
        let (ticket, ids) = {
            let mut state = self.state()?;
            let ids = state.watchlist.ids().to_vec();
            (state.dashboard.begin_load(&ids), ids)
        };
        let Some(ticket) = ticket else {
            return Ok(());
        };

        let fetched = join_all(ids.iter().map(|&id| async move {
            (id, self.fetch_details(id).await)
        }))
        .await;
        let details: HashMap<u64, RepoDetails> = fetched.into_iter().collect();

        if !self.state()?.dashboard.apply(ticket, details) {
            log::debug!("Discarding stale dashboard load");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{catalog, details_for};
    use crate::shell::tests::hub;
    use crate::shell::Content;
    use std::time::Duration;

    fn repos() -> HashMap<u64, Repo> {
        catalog().into_iter().map(|r| (r.id, r)).collect()
    }

    #[test]
    fn test_total_issues_sums_loaded_details() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load(&[102, 103]).unwrap();
        let details = [102, 103].into_iter().map(|id| (id, details_for(id))).collect();
        assert!(view.apply(ticket, details));
        assert_eq!(view.total_issues(&Watchlist::from_ids([102, 103])), 3);

        let render = view.render(&Watchlist::from_ids([102, 103]), &repos());
        assert_eq!(render.cards[1].issues, Some(2));
        assert_eq!(render.cards[1].prs, Some(1));
        assert!(render.empty_message.is_none());
    }

    #[test]
    fn test_empty_watchlist_settles_without_fetching() {
        let mut view = DashboardView::default();
        assert!(view.begin_load(&[]).is_none());
        let render = view.render(&Watchlist::default(), &repos());
        assert!(!render.loading);
        assert_eq!(render.empty_message, Some(EMPTY_MESSAGE));
    }

    #[test]
    fn test_unknown_repos_get_no_card() {
        let view = DashboardView::default();
        let render = view.render(&Watchlist::from_ids([999, 104]), &repos());
        assert_eq!(render.cards.len(), 1);
        assert_eq!(render.cards[0].issues, None);
    }

    #[test]
    fn test_superseded_load_is_dropped() {
        let mut view = DashboardView::default();
        let stale = view.begin_load(&[102]).unwrap();
        let fresh = view.begin_load(&[103]).unwrap();
        assert!(!view.apply(stale, HashMap::from([(102, details_for(102))])));
        assert!(view.apply(fresh, HashMap::from([(103, details_for(103))])));
        assert_eq!(view.total_issues(&Watchlist::from_ids([103])), 2);
    }

    #[test]
    fn test_reload_does_not_count_unwatched_repos() {
        let mut view = DashboardView::default();
        let ticket = view.begin_load(&[102, 103]).unwrap();
        let details = [102, 103].into_iter().map(|id| (id, details_for(id))).collect();
        assert!(view.apply(ticket, details));

        // 103 unwatched, its reload still in flight
        view.begin_load(&[102]).unwrap();
        let render = view.render(&Watchlist::from_ids([102]), &repos());
        assert!(render.loading);
        assert_eq!(render.total_issues, 1);
        assert_eq!(render.cards.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_fetch_takes_one_latency() {
        let hub = hub(&[101, 102, 103]).await;
        let start = tokio::time::Instant::now();
        let render = hub.init().await.unwrap();
        // three fetches of 300ms each, run side by side
        assert!(start.elapsed() < Duration::from_millis(600));

        let Content::Dashboard(dashboard) = render.content else {
            panic!("expected dashboard content");
        };
        assert_eq!(dashboard.total_issues, 4);
        assert!(dashboard.cards.iter().all(|c| c.issues.is_some()));
    }
}
