use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use uuid::Uuid;

use kaiwa_types::api::{
    ConversationResponse, ConversationSummaryResponse, MarkReadResponse, MessageResponse,
    ParticipantResponse, ResolveConversationRequest, SendMessageRequest,
};
use kaiwa_types::models::{Conversation, ConversationSummary, Message, Participant};

use crate::store::{ConversationStore, StoreError};

/// `ConversationStore` over the REST surface. The principal is whoever the
/// bearer token names; the `principal` arguments exist for the in-process
/// implementations and are ignored here.
pub struct RemoteStore {
    http: Client,
    base_url: String,
    token: String,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Transport failures (refused connection, timeout, TLS) are transient.
fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// Map a non-success status onto the store taxonomy, pulling the server's
/// error message out of the JSON body when there is one.
async fn status_error(resp: Response) -> StoreError {
    let status = resp.status();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized,
        s if s.is_server_error() => StoreError::Unavailable(format!("server error: {s}")),
        s => {
            let detail = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| s.to_string());
            StoreError::Invalid(detail)
        }
    }
}

async fn expect_success(resp: Response) -> Result<Response, StoreError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(status_error(resp).await)
    }
}

#[async_trait]
impl ConversationStore for RemoteStore {
    async fn list_conversations(
        &self,
        _principal: Uuid,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let resp = self
            .http
            .get(format!("{}/conversations", self.base_url))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(transport_error)?;

        let summaries: Vec<ConversationSummaryResponse> = expect_success(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(summaries.into_iter().map(Into::into).collect())
    }

    async fn load_thread(
        &self,
        _principal: Uuid,
        other: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let resp = self
            .http
            .get(format!("{}/threads/{}/messages", self.base_url, other))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(transport_error)?;

        let messages: Vec<MessageResponse> = expect_success(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn send_message(
        &self,
        _principal: Uuid,
        recipient: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        let resp = self
            .http
            .post(format!("{}/threads/{}/messages", self.base_url, recipient))
            .header("Authorization", self.auth())
            .json(&SendMessageRequest {
                content: content.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;

        let resp = expect_success(resp).await?;
        // The server answers 204 when it dropped the content as blank. The
        // controller filters blank input first, so reaching this is a caller
        // bug rather than a transport problem.
        if resp.status() == StatusCode::NO_CONTENT {
            return Err(StoreError::Invalid("content was empty".into()));
        }

        let message: MessageResponse = resp.json().await.map_err(transport_error)?;
        Ok(message.into())
    }

    async fn resolve_conversation(
        &self,
        _principal: Uuid,
        target: Uuid,
    ) -> Result<Conversation, StoreError> {
        let resp = self
            .http
            .post(format!("{}/conversations", self.base_url))
            .header("Authorization", self.auth())
            .json(&ResolveConversationRequest {
                participant_id: target,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let conversation: ConversationResponse = expect_success(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(conversation.into())
    }

    async fn search_participants(
        &self,
        _principal: Uuid,
        query: &str,
    ) -> Result<Vec<Participant>, StoreError> {
        let resp = self
            .http
            .get(format!("{}/participants", self.base_url))
            .query(&[("q", query)])
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(transport_error)?;

        let participants: Vec<ParticipantResponse> = expect_success(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(participants.into_iter().map(Into::into).collect())
    }

    async fn mark_thread_read(&self, _principal: Uuid, other: Uuid) -> Result<u64, StoreError> {
        let resp = self
            .http
            .post(format!("{}/threads/{}/read", self.base_url, other))
            .header("Authorization", self.auth())
            .send()
            .await
            .map_err(transport_error)?;

        let marked: MarkReadResponse = expect_success(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;

        Ok(marked.marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let store = RemoteStore::new("http://localhost:8080/", "tok");
        assert_eq!(store.base_url, "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_server_maps_to_transient() {
        // Port 9 (discard) is never serving HTTP here.
        let store = RemoteStore::new("http://127.0.0.1:9", "tok");
        let err = store
            .list_conversations(Uuid::new_v4())
            .await
            .expect_err("expected a transport failure");
        assert!(err.is_transient(), "got non-transient error: {err:?}");
    }
}
