//! Client for an OpenAI-compatible assistants API.
//!
//! Each DaininBot carries its own key and assistant id, so a client is built
//! per bot from the shared [`AssistantConfig`] timings.

use std::time::Duration;

use dailink_config::AssistantConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

mod error;
pub mod types;

pub use error::AssistantError;
pub use types::{MessageContent, Reply, Run, RunError, RunStatus, Thread, ThreadMessage};

use types::MessageList;

const BETA_HEADER: &str = "openai-beta";
const BETA_VALUE: &str = "assistants=v2";
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct AssistantClient {
    http: Client,
    base_url: Url,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient")
            .field("base_url", &self.base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .finish()
    }
}

impl AssistantClient {
    pub fn new(config: &AssistantConfig, api_key: &str) -> Result<Self, AssistantError> {
        if api_key.trim().is_empty() {
            return Err(AssistantError::InvalidRequest("api key must not be empty".into()));
        }

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|err| AssistantError::InvalidRequest(format!("base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AssistantError::InvalidRequest(
                "base url cannot carry a path".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| AssistantError::InvalidRequest("api key is not a valid header".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(BETA_HEADER, HeaderValue::from_static(BETA_VALUE));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_attempts: config.max_poll_attempts.max(1),
        })
    }

    pub async fn create_thread(&self) -> Result<Thread, AssistantError> {
        let url = self.endpoint(&["threads"])?;
        self.send(self.http.post(url).json(&json!({}))).await
    }

    pub async fn add_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        if text.trim().is_empty() {
            return Err(AssistantError::InvalidRequest("text must not be empty".into()));
        }
        let url = self.endpoint(&["threads", thread_id, "messages"])?;
        let body = json!({ "role": "user", "content": text });
        let _: ThreadMessage = self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, AssistantError> {
        if assistant_id.trim().is_empty() {
            return Err(AssistantError::InvalidRequest(
                "assistant id must not be empty".into(),
            ));
        }
        let url = self.endpoint(&["threads", thread_id, "runs"])?;
        let body = json!({ "assistant_id": assistant_id.trim() });
        self.send(self.http.post(url).json(&body)).await
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let url = self.endpoint(&["threads", thread_id, "runs", run_id])?;
        self.send(self.http.get(url)).await
    }

    /// Polls until the run leaves its pending states. Only `completed` is a
    /// success; every other terminal state becomes `RunFailed`.
    pub async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        for attempt in 1..=self.max_poll_attempts {
            let run = self.get_run(thread_id, run_id).await?;
            if run.status == RunStatus::Completed {
                debug!(thread_id, run_id, attempt, "assistant run completed");
                return Ok(run);
            }
            if !run.status.is_pending() {
                let message = run
                    .last_error
                    .as_ref()
                    .and_then(|err| err.message.clone())
                    .unwrap_or_else(|| "no error detail".to_string());
                warn!(thread_id, run_id, status = run.status.as_str(), "assistant run failed");
                return Err(AssistantError::RunFailed {
                    run_id: run.id,
                    status: run.status.as_str().to_string(),
                    message,
                });
            }
            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(AssistantError::RunTimedOut {
            run_id: run_id.to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Newest message in the thread if it came from the assistant.
    pub async fn latest_reply(&self, thread_id: &str) -> Result<Option<String>, AssistantError> {
        let url = self.endpoint(&["threads", thread_id, "messages"])?;
        let list: MessageList = self
            .send(self.http.get(url).query(&[("order", "desc"), ("limit", "1")]))
            .await?;
        Ok(list
            .data
            .into_iter()
            .next()
            .filter(|message| message.role == "assistant")
            .map(|message| message.text()))
    }

    /// Posts `text` to `thread_id` (or a fresh thread), runs the assistant and
    /// returns its answer.
    pub async fn ask(
        &self,
        assistant_id: &str,
        thread_id: Option<&str>,
        text: &str,
    ) -> Result<Reply, AssistantError> {
        let thread_id = match thread_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self.create_thread().await?.id,
        };

        self.add_message(&thread_id, text).await?;
        let run = self.create_run(&thread_id, assistant_id).await?;
        let run = self.wait_for_run(&thread_id, &run.id).await?;
        let text = self
            .latest_reply(&thread_id)
            .await?
            .filter(|reply| !reply.trim().is_empty())
            .ok_or(AssistantError::NoReply)?;

        Ok(Reply {
            thread_id,
            run_id: run.id,
            text,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AssistantError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AssistantError::InvalidRequest("base url cannot carry a path".into()))?;
            path.pop_if_empty();
            for segment in segments {
                if segment.trim().is_empty() {
                    return Err(AssistantError::InvalidRequest("empty path segment".into()));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AssistantError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(AssistantError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_rejected() {
        let err = AssistantClient::new(&AssistantConfig::default(), "  ").unwrap_err();
        assert!(matches!(err, AssistantError::InvalidRequest(_)));
    }

    #[test]
    fn endpoint_appends_to_versioned_base() {
        let client = AssistantClient::new(&AssistantConfig::default(), "sk-test").unwrap();
        let url = client.endpoint(&["threads", "thread_1", "runs"]).unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/threads/thread_1/runs");
    }

    #[test]
    fn poll_attempts_never_drop_to_zero() {
        let config = AssistantConfig {
            max_poll_attempts: 0,
            ..AssistantConfig::default()
        };
        let client = AssistantClient::new(&config, "sk-test").unwrap();
        assert_eq!(client.max_poll_attempts, 1);
    }
}
