use serde::Serialize;

use crate::models::{ViewState, Watchlist};

pub const APP_TITLE: &str = "Focus Hub";
pub const STATUS_LINE: &str = "SYSTEM: ONLINE";

/// (view, sidebar label, compact label)
const NAV: [(ViewState, &str, &str); 4] = [
    (ViewState::Dashboard, "Command Center", "Home"),
    (ViewState::Projects, "Projects", "Projects"),
    (ViewState::Knowledge, "Knowledge", "Docs"),
    (ViewState::Agent, "Jules AI", "Agent"),
];

#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub view: ViewState,
    pub label: &'static str,
    pub short_label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutRender {
    pub title: &'static str,
    pub nav: Vec<NavItem>,
    pub watched_count: usize,
    pub status: &'static str,
}

pub fn render(current: ViewState, watchlist: &Watchlist) -> LayoutRender {
    LayoutRender {
        title: APP_TITLE,
        nav: NAV
            .iter()
            .map(|&(view, label, short_label)| NavItem {
                view,
                label,
                short_label,
                active: view == current,
            })
            .collect(),
        watched_count: watchlist.len(),
        status: STATUS_LINE,
    }
}
