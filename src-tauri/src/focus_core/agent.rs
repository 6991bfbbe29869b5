use reqwest::header::USER_AGENT;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::AgentResponse;

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    task_id: &'a str,
    prompt: &'a str,
}

/// Client for the coding agent's session API.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn start_session(
        &self,
        task_id: &str,
        prompt: &str,
        token: &str,
    ) -> Result<AgentResponse> {
        let url = format!("{}/v1/sessions", self.base_url);
        log::info!("POST {url} (task {task_id}, {} byte prompt)", prompt.len());
        let res = self
            .http
            .post(&url)
            .header(USER_AGENT, "focus-hub")
            .bearer_auth(token)
            .json(&SessionRequest { task_id, prompt })
            .send()
            .await?;

        if !res.status().is_success() {
            log::error!("Agent session request failed: {}", res.status());
            return Err(Error::AgentStatus(res.status()));
        }

        let response: AgentResponse = res.json().await?;
        log::info!(
            "Agent session {} started ({} plan steps)",
            response.session_id,
            response.plan.len()
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_start_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/sessions"))
            .and(header("authorization", "Bearer jules_key"))
            .and(body_json(json!({ "task_id": "201", "prompt": "Fix it" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session_id": "sess_001",
                "status": "RUNNING",
                "plan": ["step 1", "step 2"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AgentClient::new(&server.uri());
        let response = client.start_session("201", "Fix it", "jules_key").await.unwrap();
        assert_eq!(response.session_id, "sess_001");
        assert_eq!(response.plan, vec!["step 1", "step 2"]);
    }

    #[tokio::test]
    async fn test_start_session_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AgentClient::new(&format!("{}/", server.uri()));
        let err = client.start_session("1", "x", "k").await.unwrap_err();
        assert!(matches!(err, Error::AgentStatus(StatusCode::INTERNAL_SERVER_ERROR)));
        assert_eq!(err.to_string(), "Jules API error: 500 Internal Server Error");
    }
}
