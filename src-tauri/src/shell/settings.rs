use serde::Serialize;

use super::{FocusHub, Load, ShellRender};
use crate::error::Result;

const SAVE_FAILED: &str = "Failed to save keys";

/// API key entry. The keys themselves never leave the backend in a render.
#[derive(Debug, Default)]
pub struct SettingsModal {
    open: bool,
    github_key: String,
    jules_key: String,
    saving: bool,
    error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsRender {
    pub github_key_filled: bool,
    pub jules_key_filled: bool,
    pub saving: bool,
    pub can_save: bool,
    pub save_label: &'static str,
    pub error: Option<String>,
}

impl SettingsModal {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn edit(&mut self, github: Option<&str>, jules: Option<&str>) {
        if let Some(value) = github {
            self.github_key = value.to_string();
        }
        if let Some(value) = jules {
            self.jules_key = value.to_string();
        }
    }

    pub fn can_save(&self) -> bool {
        !self.github_key.is_empty() && !self.jules_key.is_empty() && !self.saving
    }

    pub fn begin_save(&mut self) -> Option<(String, String)> {
        if !self.can_save() {
            return None;
        }
        self.saving = true;
        self.error = None;
        Some((self.github_key.clone(), self.jules_key.clone()))
    }

    /// Close on success; on failure keep the modal open with the message.
    pub fn finish_save(&mut self, outcome: Result<()>) -> bool {
        self.saving = false;
        match outcome {
            Ok(()) => {
                self.open = false;
                true
            }
            Err(e) => {
                let message = e.to_string();
                self.error = Some(if message.is_empty() {
                    SAVE_FAILED.to_string()
                } else {
                    message
                });
                false
            }
        }
    }

    pub fn render(&self) -> SettingsRender {
        SettingsRender {
            github_key_filled: !self.github_key.is_empty(),
            jules_key_filled: !self.jules_key.is_empty(),
            saving: self.saving,
            can_save: self.can_save(),
            save_label: if self.saving { "Saving..." } else { "Save Keys" },
            error: self.error.clone(),
        }
    }
}

impl FocusHub {
    pub fn open_settings(&self) -> Result<ShellRender> {
        self.state()?.settings.open();
        self.render()
    }

    pub fn close_settings(&self) -> Result<ShellRender> {
        self.state()?.settings.close();
        self.render()
    }

    pub fn edit_settings(&self, github: Option<&str>, jules: Option<&str>) -> Result<ShellRender> {
        self.state()?.settings.edit(github, jules);
        self.render()
    }

    /// Store both keys. Success marks the app configured and mounts the
    /// current view.
    pub async fn save_settings(&self) -> Result<ShellRender> {
        let keys = self.state()?.settings.begin_save();
        let Some((github, jules)) = keys else {
            return self.render();
        };
        self.notify();

        let outcome = self.services.data.save_credentials(&github, &jules).await;
        if let Err(e) = &outcome {
            log::error!("Failed to save API keys: {e}");
        }
        let load = {
            let mut state = self.state()?;
            if state.settings.finish_save(outcome) {
                log::info!("API keys saved");
                state.keys_configured = true;
                state.mount()
            } else {
                Load::None
            }
        };
        self.run_load(load).await?;
        self.render()
    }
}
