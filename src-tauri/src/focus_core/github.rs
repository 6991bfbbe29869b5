use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use indexmap::IndexMap;
use reqwest::header::USER_AGENT;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Issue, IssueStatus, PrStatus, PullRequest, Repo, RepoDetails};

const CLIENT_NAME: &str = "focus-hub";

/// Documents shown in the knowledge hub, in display order.
const DOCUMENTS: [(&str, &str); 2] = [("README.md", "readme"), ("AGENTS.md", "contents/AGENTS.md")];

/// Raw shape of a repository in the GitHub REST API.
#[derive(Debug, Deserialize)]
struct GhRepo {
    id: u64,
    name: String,
    private: bool,
    description: Option<String>,
    owner: GhUser,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    body: Option<String>,
    state: String,
    /// Present when the "issue" is actually a pull request.
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GhPull {
    number: u64,
    title: String,
    user: GhUser,
    state: String,
    merged_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhContent {
    content: String,
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct GhSearch {
    items: Vec<GhRepo>,
}

fn to_repo(raw: GhRepo) -> Repo {
    Repo {
        id: raw.id,
        name: raw.name,
        private: raw.private,
        description: raw.description,
        owner: Some(raw.owner.login),
    }
}

fn to_issue(raw: GhIssue) -> Issue {
    Issue {
        id: raw.number,
        title: raw.title,
        status: if raw.state.eq_ignore_ascii_case("closed") {
            IssueStatus::Closed
        } else {
            IssueStatus::Open
        },
        body: raw.body.unwrap_or_default(),
    }
}

fn to_pull_request(raw: GhPull) -> PullRequest {
    let status = if raw.merged_at.is_some() {
        PrStatus::Merged
    } else if raw.state.eq_ignore_ascii_case("closed") {
        PrStatus::Closed
    } else {
        PrStatus::Open
    };
    PullRequest {
        id: raw.number,
        title: raw.title,
        author: raw.user.login,
        status,
    }
}

fn decode_content(raw: &GhContent) -> Option<String> {
    if raw.encoding != "base64" {
        return Some(raw.content.clone());
    }
    // GitHub wraps the payload every 60 columns
    let compact: String = raw.content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, url: impl reqwest::IntoUrl, token: &str) -> RequestBuilder {
        self.http
            .get(url)
            .header(USER_AGENT, CLIENT_NAME)
            .bearer_auth(token)
    }

    pub async fn search(&self, query: &str, token: &str) -> Result<Vec<Repo>> {
        let url = Url::parse_with_params(
            &format!("{}/search/repositories", self.base_url),
            &[("q", query)],
        )
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        log::info!("GET {url}");
        let res = self.get(url, token).send().await?;
        if !res.status().is_success() {
            log::error!("GitHub search failed: {}", res.status());
            return Err(Error::GitHubStatus(res.status()));
        }

        let found: GhSearch = res.json().await?;
        log::debug!("GitHub search {query:?}: {} repos", found.items.len());
        Ok(found.items.into_iter().map(to_repo).collect())
    }

    pub async fn repository(&self, id: u64, token: &str) -> Result<Repo> {
        let url = format!("{}/repositories/{id}", self.base_url);
        log::info!("GET {url}");
        let res = self.get(&url, token).send().await?;
        match res.status() {
            StatusCode::NOT_FOUND => Err(Error::UnknownRepo(id)),
            status if !status.is_success() => Err(Error::GitHubStatus(status)),
            _ => Ok(to_repo(res.json().await?)),
        }
    }

    pub async fn details(&self, owner: &str, repo: &str, token: &str) -> Result<RepoDetails> {
        let base = format!("{}/repos/{owner}/{repo}", self.base_url);
        let issues_url = format!("{base}/issues");
        let pulls_url = format!("{base}/pulls");

        let (issues, pulls, documents) = futures::join!(
            self.list::<GhIssue>(&issues_url, token),
            self.list::<GhPull>(&pulls_url, token),
            futures::future::join_all(
                DOCUMENTS
                    .iter()
                    .map(|(name, endpoint)| self.document(&base, name, endpoint, token)),
            ),
        );

        let issues = issues?
            .into_iter()
            .filter(|raw| raw.pull_request.is_none())
            .map(to_issue)
            .collect();
        let prs = pulls?.into_iter().map(to_pull_request).collect();

        let mut files = IndexMap::new();
        for document in documents {
            if let Some((name, text)) = document? {
                files.insert(name, text);
            }
        }

        Ok(RepoDetails { issues, prs, files })
    }

    /// Fetch a JSON array; an error status from GitHub yields an empty list.
    async fn list<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<Vec<T>> {
        log::info!("GET {url}");
        let res = self.get(url, token).send().await?;
        if !res.status().is_success() {
            log::warn!("GET {url} returned {}, treating as empty", res.status());
            return Ok(Vec::new());
        }
        Ok(res.json().await?)
    }

    async fn document(
        &self,
        base: &str,
        name: &str,
        endpoint: &str,
        token: &str,
    ) -> Result<Option<(String, String)>> {
        let url = format!("{base}/{endpoint}");
        let res = self.get(&url, token).send().await?;
        if !res.status().is_success() {
            log::debug!("{name} not available ({})", res.status());
            return Ok(None);
        }
        let raw: GhContent = res.json().await?;
        match decode_content(&raw) {
            Some(text) => Ok(Some((name.to_string(), text))),
            None => {
                log::warn!("Could not decode {name} from {url}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn encoded(text: &str) -> String {
        // Mimic GitHub's line-wrapped base64
        let b64 = BASE64.encode(text);
        b64.as_bytes()
            .chunks(8)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_search_maps_repos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "auth"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("user-agent", "focus-hub"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "items": [{
                    "id": 42,
                    "name": "auth-service",
                    "private": false,
                    "description": null,
                    "owner": { "login": "acme" }
                }]
            })))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri());
        let repos = client.search("auth", "ghp_test").await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].id, 42);
        assert_eq!(repos[0].owner.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri());
        let err = client.search("auth", "bad").await.unwrap_err();
        assert!(matches!(err, Error::GitHubStatus(StatusCode::UNAUTHORIZED)));
    }

    #[tokio::test]
    async fn test_repository_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/7"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri());
        assert!(matches!(
            client.repository(7, "t").await,
            Err(Error::UnknownRepo(7))
        ));
    }

    #[tokio::test]
    async fn test_details_filters_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/auth-service/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "number": 201, "title": "JWT bug", "body": "Tokens", "state": "open" },
                { "number": 55, "title": "A PR", "body": null, "state": "open",
                  "pull_request": { "url": "x" } },
                { "number": 9, "title": "Old", "body": null, "state": "closed" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/auth-service/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "number": 55, "title": "Refactor", "user": { "login": "jules-ai" },
                  "state": "closed", "merged_at": "2024-01-01T00:00:00Z" },
                { "number": 56, "title": "Draft", "user": { "login": "dev" },
                  "state": "open", "merged_at": null }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/auth-service/readme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "README.md",
                "content": encoded("# Auth Service\n\nHandles sessions."),
                "encoding": "base64"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/auth-service/contents/AGENTS.md"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri());
        let details = client.details("acme", "auth-service", "t").await.unwrap();

        let ids: Vec<u64> = details.issues.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![201, 9]);
        assert_eq!(details.issues[1].status, IssueStatus::Closed);
        assert_eq!(details.issues[1].body, "");

        assert_eq!(details.prs[0].status, PrStatus::Merged);
        assert_eq!(details.prs[0].author, "jules-ai");
        assert_eq!(details.prs[1].status, PrStatus::Open);

        assert_eq!(details.files.len(), 1);
        assert_eq!(details.files["README.md"], "# Auth Service\n\nHandles sessions.");
    }

    #[tokio::test]
    async fn test_details_error_status_degrades_to_empty_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&server.uri());
        let details = client.details("acme", "private", "t").await.unwrap();
        assert_eq!(details, RepoDetails::default());
    }

    #[test]
    fn test_decode_plain_content() {
        let raw = GhContent {
            content: "hello".to_string(),
            encoding: "utf-8".to_string(),
        };
        assert_eq!(decode_content(&raw).as_deref(), Some("hello"));
    }

    #[test]
    fn test_decode_invalid_base64() {
        let raw = GhContent {
            content: "!!!".to_string(),
            encoding: "base64".to_string(),
        };
        assert_eq!(decode_content(&raw), None);
    }
}
