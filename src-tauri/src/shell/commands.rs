//! Webview-facing commands. Each forwards to [`FocusHub`] and answers with the
//! next frame to paint.

use tauri::State;

use super::{FocusHub, ShellRender};
use crate::models::ViewState;

type Reply = Result<ShellRender, String>;

fn reply(result: crate::error::Result<ShellRender>) -> Reply {
    result.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn shell_render(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.render())
}

#[tauri::command]
pub async fn navigate_to(
    hub: State<'_, FocusHub>,
    view: ViewState,
    repo_id: Option<u64>,
) -> Reply {
    log::info!("navigate_to {view} (repo {repo_id:?})");
    reply(hub.navigate_to(view, repo_id).await)
}

#[tauri::command]
pub async fn toggle_watch(hub: State<'_, FocusHub>, id: u64) -> Reply {
    reply(hub.toggle_watch(id).await)
}

#[tauri::command]
pub fn open_watchlist(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.open_watchlist())
}

#[tauri::command]
pub fn close_watchlist(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.close_watchlist())
}

/// `null` when a newer keystroke superseded this query.
#[tauri::command]
pub async fn search_watchlist(
    hub: State<'_, FocusHub>,
    query: String,
) -> Result<Option<ShellRender>, String> {
    hub.search_watchlist(&query).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn open_settings(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.open_settings())
}

#[tauri::command]
pub fn close_settings(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.close_settings())
}

#[tauri::command]
pub fn edit_settings(
    hub: State<'_, FocusHub>,
    github: Option<String>,
    jules: Option<String>,
) -> Reply {
    reply(hub.edit_settings(github.as_deref(), jules.as_deref()))
}

#[tauri::command]
pub async fn save_settings(hub: State<'_, FocusHub>) -> Reply {
    log::info!("save_settings");
    reply(hub.save_settings().await)
}

#[tauri::command]
pub async fn projects_select_repo(hub: State<'_, FocusHub>, id: u64) -> Reply {
    reply(hub.projects_select_repo(id).await)
}

#[tauri::command]
pub fn projects_select_issue(hub: State<'_, FocusHub>, issue_id: u64) -> Reply {
    reply(hub.projects_select_issue(issue_id))
}

#[tauri::command]
pub fn projects_close_issue(hub: State<'_, FocusHub>) -> Reply {
    reply(hub.projects_close_issue())
}

#[tauri::command]
pub fn projects_edit_instructions(hub: State<'_, FocusHub>, text: String) -> Reply {
    reply(hub.projects_edit_instructions(&text))
}

#[tauri::command]
pub async fn projects_dispatch(hub: State<'_, FocusHub>) -> Reply {
    log::info!("projects_dispatch");
    reply(hub.projects_dispatch().await)
}

#[tauri::command]
pub async fn knowledge_select_repo(hub: State<'_, FocusHub>, id: u64) -> Reply {
    reply(hub.knowledge_select_repo(id).await)
}

#[tauri::command]
pub fn knowledge_select_file(hub: State<'_, FocusHub>, name: String) -> Reply {
    reply(hub.knowledge_select_file(&name))
}
