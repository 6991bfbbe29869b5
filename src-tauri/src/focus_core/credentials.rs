use keyring::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// Keychain service name the tokens are filed under.
pub const SERVICE_NAME: &str = "focus-hub-app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    GitHub,
    Agent,
}

impl Token {
    pub fn account(self) -> &'static str {
        match self {
            Token::GitHub => "github_token",
            Token::Agent => "jules_token",
        }
    }

    pub fn missing(self) -> Error {
        match self {
            Token::GitHub => Error::MissingGithubToken,
            Token::Agent => Error::MissingAgentToken,
        }
    }
}

/// Where API tokens live between runs.
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when no token has been saved yet.
    fn get(&self, token: Token) -> Result<Option<String>>;
    fn set(&self, token: Token, value: &str) -> Result<()>;
}

/// OS keychain backed store.
#[derive(Debug, Default)]
pub struct KeyringCredentials;

impl CredentialStore for KeyringCredentials {
    fn get(&self, token: Token) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, token.account())?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: Token, value: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, token.account())?;
        entry.set_password(value)?;
        Ok(())
    }
}

/// Process-local store. Used by the demo backend and by tests.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    values: Mutex<HashMap<Token, String>>,
}

impl MemoryCredentials {
    #[cfg(test)]
    pub fn with_tokens(github: &str, agent: &str) -> Self {
        let store = Self::default();
        if let Ok(mut values) = store.values.lock() {
            values.insert(Token::GitHub, github.to_string());
            values.insert(Token::Agent, agent.to_string());
        }
        store
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self, token: Token) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| Error::Lock)?;
        Ok(values.get(&token).cloned())
    }

    fn set(&self, token: Token, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| Error::Lock)?;
        values.insert(token, value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_credentials_round_trip() {
        let store = MemoryCredentials::default();
        assert_eq!(store.get(Token::GitHub).unwrap(), None);
        store.set(Token::GitHub, "ghp_abc").unwrap();
        assert_eq!(store.get(Token::GitHub).unwrap().as_deref(), Some("ghp_abc"));
        assert_eq!(store.get(Token::Agent).unwrap(), None);
    }

    #[test]
    fn test_account_names() {
        assert_eq!(Token::GitHub.account(), "github_token");
        assert_eq!(Token::Agent.account(), "jules_token");
    }

    #[test]
    fn test_missing_token_messages() {
        assert_eq!(
            Token::GitHub.missing().to_string(),
            "GitHub API Key not found. Please set it in Settings."
        );
        assert_eq!(
            Token::Agent.missing().to_string(),
            "Jules API Key not found. Please set it in Settings."
        );
    }
}
