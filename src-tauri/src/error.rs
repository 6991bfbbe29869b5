use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("GitHub API Key not found. Please set it in Settings.")]
    MissingGithubToken,

    #[error("Jules API Key not found. Please set it in Settings.")]
    MissingAgentToken,

    #[error("GitHub API error: {0}")]
    GitHubStatus(StatusCode),

    #[error("Jules API error: {0}")]
    AgentStatus(StatusCode),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential store error: {0}")]
    Credentials(#[from] keyring::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file {path}: {message}")]
    Config { path: String, message: String },

    #[error("Unknown repository: {0}")]
    UnknownRepo(u64),

    #[error("Unknown issue: #{0}")]
    UnknownIssue(u64),

    #[error("Unknown file: {0}")]
    UnknownFile(String),

    #[error("Lock error: state poisoned")]
    Lock,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
