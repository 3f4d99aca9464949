use crate::decode::Utf8StreamDecoder;
use anyhow::{Result, anyhow};
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::mpsc;

/// Hosted agent endpoint. Fixed in this version; there is no runtime
/// configuration surface.
const AGENT_URL: &str =
    "https://brief-thousands-sunset-9fcb1c78-485f-4967-ac042759a8fa1462.mastra.cloud/api/agents/weatherAgent/stream";

const AGENT_ID: &str = "weatherAgent";
const ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8,fr;q=0.7";

/// Events emitted while a reply streams in.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The endpoint accepted the request; a reply is on its way.
    Opened,
    /// A piece of decoded reply text.
    Chunk(String),
    /// The body was fully consumed.
    Done,
    /// Any transport, status, or decode failure. The cause is for the log
    /// only; the user sees one fixed apology regardless.
    Failed(String),
}

/// Outbound message in the agent's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub role: String,
    pub content: String,
}

/// Request body for the agent's stream endpoint. Only the newly submitted
/// message is sent; the remote side keeps conversation context per threadId.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<OutboundMessage>,
    pub run_id: String,
    pub max_retries: u32,
    pub max_steps: u32,
    pub temperature: f64,
    pub top_p: f64,
    pub runtime_context: serde_json::Map<String, serde_json::Value>,
    pub thread_id: String,
    pub resource_id: String,
}

impl ChatRequest {
    pub fn new(content: String, thread_id: String) -> Self {
        Self {
            messages: vec![OutboundMessage {
                role: "user".to_string(),
                content,
            }],
            run_id: AGENT_ID.to_string(),
            // Forwarded to the remote agent; no retries happen on this side.
            max_retries: 2,
            max_steps: 5,
            temperature: 0.5,
            top_p: 1.0,
            runtime_context: serde_json::Map::new(),
            thread_id,
            resource_id: AGENT_ID.to_string(),
        }
    }
}

/// Client for the hosted agent's streaming chat endpoint.
#[derive(Clone)]
pub struct AgentClient {
    client: reqwest::Client,
    thread_id: String,
}

impl AgentClient {
    /// The session identifier groups every request of this process into one
    /// remote conversation. No timeout is set: a streamed read is allowed to
    /// suspend indefinitely between chunks.
    pub fn new(thread_id: String) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, thread_id })
    }

    /// Send one user message and stream the reply back as events. The spawned
    /// task owns the network call; every failure inside it surfaces as a
    /// single `Failed` event, never a panic.
    pub fn send(&self, content: String) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let request = ChatRequest::new(content, self.thread_id.clone());

        tokio::spawn(async move {
            if let Err(e) = Self::stream_reply(client, request, &tx).await {
                tracing::warn!(error = %e, "agent request failed");
                let _ = tx.send(StreamEvent::Failed(e.to_string()));
            }
        });

        rx
    }

    async fn stream_reply(
        client: reqwest::Client,
        request: ChatRequest,
        tx: &mpsc::UnboundedSender<StreamEvent>,
    ) -> Result<()> {
        let response = client
            .post(AGENT_URL)
            .header("Accept", "*/*")
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Connection", "keep-alive")
            .header("Content-Type", "application/json")
            .header("x-mastra-dev-playground", "true")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("agent endpoint returned {}", status));
        }

        let _ = tx.send(StreamEvent::Opened);

        // The body is treated as an opaque text stream: no SSE or frame
        // parsing, decoded bytes are surfaced verbatim.
        let mut stream = response.bytes_stream();
        let mut decoder = Utf8StreamDecoder::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            let text = decoder.decode(&chunk)?;
            if !text.is_empty() {
                let _ = tx.send(StreamEvent::Chunk(text));
            }
        }

        decoder.finish()?;
        let _ = tx.send(StreamEvent::Done);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_matches_wire_format() {
        let request = ChatRequest::new("hello".to_string(), "thread-1".to_string());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "messages": [{"role": "user", "content": "hello"}],
                "runId": "weatherAgent",
                "maxRetries": 2,
                "maxSteps": 5,
                "temperature": 0.5,
                "topP": 1.0,
                "runtimeContext": {},
                "threadId": "thread-1",
                "resourceId": "weatherAgent",
            })
        );
    }

    #[test]
    fn only_the_new_message_is_sent() {
        let request = ChatRequest::new("what's the weather".to_string(), "t".to_string());
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "what's the weather");
    }
}
