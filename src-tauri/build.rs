use tauri_build::{Attributes, DefaultPermissionRule, InlinedPlugin};

fn main() {
    tauri_build::try_build(
        Attributes::new().plugin(
            "focus-core",
            InlinedPlugin::new()
                .commands(&[
                    "save_api_keys",
                    "get_api_keys_status",
                    "search_repos",
                    "get_repo",
                    "get_repo_details",
                    "dispatch_agent",
                ])
                .default_permission(DefaultPermissionRule::AllowAllCommands),
        ),
    )
    .expect("failed to run tauri-build");
}
