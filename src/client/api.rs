use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use super::ClientError;
use crate::models::{
    CreateIdeaRequest, ErrorResponse, Idea, IdeaListResponse, IdeaResponse, SortMode,
};

/// The three calls a board makes against the server.
#[async_trait]
pub trait IdeaApi: Send + Sync {
    async fn list(&self, sort: SortMode) -> Result<Vec<Idea>, ClientError>;
    async fn create(&self, text: &str) -> Result<Idea, ClientError>;
    async fn upvote(&self, id: &str) -> Result<Idea, ClientError>;
}

/// [`IdeaApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpIdeaApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdeaApi {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    // add http:// if not present, like "localhost:8080"
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = if trimmed.starts_with("http") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ids go in as a single percent-encoded path segment
    fn upvote_url(&self, id: &str) -> Result<Url, ClientError> {
        let invalid = || ClientError::Invalid(format!("Invalid server address {}", self.base_url));

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["ideas", id, "upvote"]);
        Ok(url)
    }
}

// Success bodies decode as `T`; anything else surfaces the server's error message
async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    let body = res.bytes().await?;

    if status.is_success() {
        return Ok(serde_json::from_slice(&body)?);
    }

    let message = serde_json::from_slice::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("Request failed with status {}", status));

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl IdeaApi for HttpIdeaApi {
    async fn list(&self, sort: SortMode) -> Result<Vec<Idea>, ClientError> {
        let res = self
            .client
            .get(format!("{}/ideas?sort={}", self.base_url, sort.as_str()))
            .send()
            .await?;

        let body: IdeaListResponse = decode(res).await?;
        Ok(body.ideas)
    }

    async fn create(&self, text: &str) -> Result<Idea, ClientError> {
        let res = self
            .client
            .post(format!("{}/ideas", self.base_url))
            .json(&CreateIdeaRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        let body: IdeaResponse = decode(res).await?;
        Ok(body.idea)
    }

    async fn upvote(&self, id: &str) -> Result<Idea, ClientError> {
        let res = self
            .client
            .post(self.upvote_url(id)?)
            .send()
            .await?;

        let body: IdeaResponse = decode(res).await?;
        Ok(body.idea)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        assert_eq!(HttpIdeaApi::new("localhost:8080/").base_url(), "http://localhost:8080");
        assert_eq!(
            HttpIdeaApi::new("https://ideas.example.com").base_url(),
            "https://ideas.example.com"
        );
    }

    #[test]
    fn upvote_url_encodes_the_id() {
        let api = HttpIdeaApi::new("localhost:8080");
        assert_eq!(
            api.upvote_url("abc-123").unwrap().as_str(),
            "http://localhost:8080/ideas/abc-123/upvote"
        );
        assert_eq!(
            api.upvote_url("a/b?c#d").unwrap().as_str(),
            "http://localhost:8080/ideas/a%2Fb%3Fc%23d/upvote"
        );
    }

    #[test]
    fn upvote_url_keeps_base_path() {
        let api = HttpIdeaApi::new("http://ideas.example.com/api/");
        assert_eq!(
            api.upvote_url("x").unwrap().as_str(),
            "http://ideas.example.com/api/ideas/x/upvote"
        );
    }

    #[test]
    fn unparsable_base_url_is_invalid() {
        let api = HttpIdeaApi::new("http://");
        assert!(matches!(api.upvote_url("x"), Err(ClientError::Invalid(_))));
    }
}
