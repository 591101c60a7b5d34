use crate::core::advice::{ChatMessage, LoanAdvisor, SummaryInputs, build_messages};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Streams chat completions from an OpenAI-compatible endpoint.
pub struct OpenAiAdvisor {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Debug, Default)]
struct Delta {
    content: Option<String>,
}

/// Splits a server-sent event byte stream into `data:` payloads.
#[derive(Default)]
struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(data) = line.trim().strip_prefix("data:") {
                payloads.push(data.trim().to_string());
            }
        }
        payloads
    }
}

enum Event {
    Text(String),
    Done,
    Skip,
}

fn parse_payload(payload: &str) -> Event {
    if payload == "[DONE]" {
        return Event::Done;
    }
    match serde_json::from_str::<ChatChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
            .map_or(Event::Skip, Event::Text),
        Err(e) => {
            warn!(error = %e, payload = %payload, "Skipping unparseable stream chunk");
            Event::Skip
        }
    }
}

impl OpenAiAdvisor {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        OpenAiAdvisor {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LoanAdvisor for OpenAiAdvisor {
    #[instrument(name = "LoanSummaryStream", skip_all, fields(model = %self.model))]
    async fn stream_summary(
        &self,
        inputs: &SummaryInputs,
        products: &[String],
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String> {
        let messages = build_messages(inputs, products);
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            stream: true,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting loan summary from {}", url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Loan summary request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Loan summary request failed with status {status}: {body}"));
        }

        let mut stream = response.bytes_stream();
        let mut buffer = SseBuffer::default();
        let mut text = String::new();
        'outer: while let Some(bytes) = stream.next().await {
            let bytes = bytes.context("Loan summary stream interrupted")?;
            for payload in buffer.push(&bytes) {
                match parse_payload(&payload) {
                    Event::Text(chunk) => {
                        on_chunk(&chunk);
                        text.push_str(&chunk);
                    }
                    Event::Done => break 'outer,
                    Event::Skip => {}
                }
            }
        }

        debug!(chars = text.len(), "Loan summary stream finished");
        Ok(text)
    }
}
