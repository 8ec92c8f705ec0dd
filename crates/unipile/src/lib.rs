//! Thin typed client for the Unipile REST API.

use std::time::Duration;

use dailink_config::UnipileConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

mod error;
pub mod types;

pub use error::UnipileError;
pub use types::{
    Account, AccountSource, Chat, ChatStarted, ConnectOutcome, InvitationSent, Message,
    MessageSent, Page, Post, Reaction, SearchCategory, SearchItem, SearchPage, SearchQuery,
    UserProfile, LINKEDIN_PROVIDER,
};

use types::ConnectResponse;

const API_KEY_HEADER: &str = "x-api-key";
const MAX_SEARCH_LIMIT: u32 = 100;
const MAX_ERROR_BODY: usize = 512;

#[derive(Clone)]
pub struct UnipileClient {
    http: Client,
    base_url: Url,
}

impl std::fmt::Debug for UnipileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnipileClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl UnipileClient {
    /// Builds a client from configuration; fails with `MissingApiKey` when
    /// neither the config nor `UNIPILE_API_KEY` provides a key.
    pub fn new(config: &UnipileConfig) -> Result<Self, UnipileError> {
        let api_key = config
            .resolved_api_key()
            .ok_or(UnipileError::MissingApiKey)?;
        Self::with_api_key(
            &config.base_url,
            &api_key,
            Duration::from_secs(config.request_timeout_seconds.max(1)),
        )
    }

    pub fn with_api_key(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, UnipileError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|err| UnipileError::InvalidRequest(format!("base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UnipileError::InvalidRequest(
                "base url cannot carry a path".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key.trim())
            .map_err(|_| UnipileError::InvalidRequest("api key is not a valid header".into()))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub async fn list_accounts(&self) -> Result<Page<Account>, UnipileError> {
        let url = self.endpoint(&["accounts"])?;
        self.send(self.http.get(url)).await
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, UnipileError> {
        let url = self.endpoint(&["accounts", account_id])?;
        self.send(self.http.get(url)).await
    }

    pub async fn connect_linkedin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<ConnectOutcome, UnipileError> {
        require("username", username)?;
        require("password", password)?;
        let url = self.endpoint(&["accounts"])?;
        let body = json!({
            "provider": LINKEDIN_PROVIDER,
            "username": username.trim(),
            "password": password,
        });
        let response: ConnectResponse = self.send(self.http.post(url).json(&body)).await?;
        Ok(response.into())
    }

    /// Answers a 2FA, OTP or CAPTCHA checkpoint raised while connecting.
    pub async fn solve_checkpoint(
        &self,
        account_id: &str,
        code: &str,
    ) -> Result<ConnectOutcome, UnipileError> {
        require("account_id", account_id)?;
        require("code", code)?;
        let url = self.endpoint(&["accounts", "checkpoint"])?;
        let body = json!({
            "provider": LINKEDIN_PROVIDER,
            "account_id": account_id,
            "code": code.trim(),
        });
        let response: ConnectResponse = self.send(self.http.post(url).json(&body)).await?;
        Ok(response.into())
    }

    pub async fn delete_account(&self, account_id: &str) -> Result<(), UnipileError> {
        let url = self.endpoint(&["accounts", account_id])?;
        let _: Value = self.send(self.http.delete(url)).await?;
        Ok(())
    }

    pub async fn list_chats(
        &self,
        account_id: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<Chat>, UnipileError> {
        let url = self.endpoint(&["chats"])?;
        let mut query = vec![("account_id", account_id.to_string())];
        push_paging(&mut query, cursor, limit);
        self.send(self.http.get(url).query(&query)).await
    }

    pub async fn list_messages(
        &self,
        chat_id: &str,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Page<Message>, UnipileError> {
        let url = self.endpoint(&["chats", chat_id, "messages"])?;
        let mut query = Vec::new();
        push_paging(&mut query, cursor, limit);
        self.send(self.http.get(url).query(&query)).await
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageSent, UnipileError> {
        require("text", text)?;
        let url = self.endpoint(&["chats", chat_id, "messages"])?;
        let form = Form::new().text("text", text.to_string());
        self.send(self.http.post(url).multipart(form)).await
    }

    pub async fn start_chat(
        &self,
        account_id: &str,
        attendee_ids: &[String],
        text: &str,
    ) -> Result<ChatStarted, UnipileError> {
        require("text", text)?;
        if attendee_ids.iter().all(|id| id.trim().is_empty()) {
            return Err(UnipileError::InvalidRequest(
                "at least one attendee is required".into(),
            ));
        }

        let url = self.endpoint(&["chats"])?;
        let mut form = Form::new()
            .text("account_id", account_id.to_string())
            .text("text", text.to_string());
        for attendee in attendee_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            form = form.text("attendees_ids", attendee.to_string());
        }
        self.send(self.http.post(url).multipart(form)).await
    }

    pub async fn get_profile(
        &self,
        account_id: &str,
        identifier: &str,
    ) -> Result<UserProfile, UnipileError> {
        let url = self.endpoint(&["users", identifier])?;
        self.send(self.http.get(url).query(&[("account_id", account_id)]))
            .await
    }

    pub async fn send_invitation(
        &self,
        account_id: &str,
        provider_id: &str,
        message: Option<&str>,
    ) -> Result<InvitationSent, UnipileError> {
        require("provider_id", provider_id)?;
        let url = self.endpoint(&["users", "invite"])?;
        let mut body = json!({
            "account_id": account_id,
            "provider_id": provider_id,
        });
        if let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) {
            body["message"] = Value::from(message);
        }
        self.send(self.http.post(url).json(&body)).await
    }

    pub async fn list_user_posts(
        &self,
        account_id: &str,
        identifier: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Post>, UnipileError> {
        let url = self.endpoint(&["users", identifier, "posts"])?;
        let mut query = vec![("account_id", account_id.to_string())];
        push_paging(&mut query, cursor, None);
        self.send(self.http.get(url).query(&query)).await
    }

    pub async fn get_post(&self, account_id: &str, post_id: &str) -> Result<Post, UnipileError> {
        let url = self.endpoint(&["posts", post_id])?;
        self.send(self.http.get(url).query(&[("account_id", account_id)]))
            .await
    }

    pub async fn comment_post(
        &self,
        account_id: &str,
        post_id: &str,
        text: &str,
    ) -> Result<(), UnipileError> {
        require("text", text)?;
        let url = self.endpoint(&["posts", post_id, "comments"])?;
        let body = json!({ "account_id": account_id, "text": text });
        let _: Value = self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    pub async fn react_post(
        &self,
        account_id: &str,
        post_id: &str,
        reaction: Reaction,
    ) -> Result<(), UnipileError> {
        let url = self.endpoint(&["posts", "reaction"])?;
        let body = json!({
            "account_id": account_id,
            "post_id": post_id,
            "reaction_type": reaction,
        });
        let _: Value = self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    pub async fn search(
        &self,
        account_id: &str,
        query: &SearchQuery,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<SearchPage, UnipileError> {
        if let SearchQuery::Url(url) = query {
            require("search_url", url)?;
        }
        let url = self.endpoint(&["linkedin", "search"])?;
        let mut params = vec![("account_id", account_id.to_string())];
        push_paging(
            &mut params,
            cursor,
            limit.map(|limit| limit.clamp(1, MAX_SEARCH_LIMIT)),
        );
        self.send(self.http.post(url).query(&params).json(&query.to_body()))
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UnipileError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UnipileError::InvalidRequest("base url cannot carry a path".into()))?;
            path.pop_if_empty();
            for segment in segments {
                if segment.trim().is_empty() {
                    return Err(UnipileError::InvalidRequest("empty path segment".into()));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UnipileError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(path = %url, status = status.as_u16(), "unipile request failed");
            return Err(UnipileError::Api {
                status: status.as_u16(),
                body: truncate(body),
            });
        }

        debug!(path = %url, status = status.as_u16(), "unipile request succeeded");
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }
}

fn require(field: &str, value: &str) -> Result<(), UnipileError> {
    if value.trim().is_empty() {
        return Err(UnipileError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

fn push_paging(query: &mut Vec<(&'static str, String)>, cursor: Option<&str>, limit: Option<u32>) {
    if let Some(cursor) = cursor.filter(|cursor| !cursor.is_empty()) {
        query.push(("cursor", cursor.to_string()));
    }
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UnipileClient {
        UnipileClient::with_api_key(base, "key", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_path_and_escapes_segments() {
        let client = client("https://api1.unipile.com:13111/api/v1/");
        let url = client.endpoint(&["users", "jane doe/x", "posts"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api1.unipile.com:13111/api/v1/users/jane%20doe%2Fx/posts"
        );
    }

    #[test]
    fn endpoint_rejects_empty_segments() {
        let client = client("http://localhost:1");
        assert!(matches!(
            client.endpoint(&["chats", " ", "messages"]),
            Err(UnipileError::InvalidRequest(_))
        ));
    }

    #[test]
    fn missing_api_key_is_reported() {
        let config = UnipileConfig {
            api_key: Some("   ".into()),
            ..UnipileConfig::default()
        };
        if std::env::var("UNIPILE_API_KEY").is_err() {
            assert!(matches!(
                UnipileClient::new(&config),
                Err(UnipileError::MissingApiKey)
            ));
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "é".repeat(400);
        let cut = truncate(body);
        assert!(cut.len() <= MAX_ERROR_BODY);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
