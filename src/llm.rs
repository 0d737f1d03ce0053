//! Local language-model client
//!
//! Talks to an Ollama-compatible `/api/generate` endpoint. The response is a
//! stream of JSON lines, each carrying a `response` fragment and a `done`
//! flag; fragments are concatenated until `done`.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::config::LlmConfig;
use crate::{Error, Result};

/// Text generation backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    max_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Client for a local Ollama server
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    stream_timeout: Duration,
}

impl OllamaClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            stream_timeout: config.stream_timeout,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            options: GenerateOptions {
                max_tokens: self.max_tokens,
            },
        };

        tracing::debug!(url = %url, model = %self.model, "querying language model");

        let response = timeout(self.stream_timeout, self.client.post(&url).json(&request).send())
            .await
            .map_err(|_| Error::Llm(format!("no response after {:?}", self.stream_timeout)))??;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "language model returned error status");
            return Err(Error::Llm(format!("server returned {status}")));
        }

        let mut stream = response.bytes_stream();
        let mut collector = StreamCollector::default();

        loop {
            let chunk = match timeout(self.stream_timeout, stream.next()).await {
                Ok(Some(chunk)) => chunk?,
                Ok(None) => break,
                Err(_) => {
                    return Err(Error::Llm(format!(
                        "stream stalled for {:?}",
                        self.stream_timeout
                    )));
                }
            };

            if collector.push(&chunk) {
                break;
            }
        }

        let text = collector.finish();
        tracing::debug!(chars = text.len(), "language model reply complete");
        Ok(text)
    }
}

/// Reassembles newline-delimited JSON chunks into the reply text
#[derive(Debug, Default)]
pub struct StreamCollector {
    pending: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamCollector {
    /// Feed raw bytes; returns true once a chunk with `done` was seen
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if self.done {
            return true;
        }

        self.pending.extend_from_slice(bytes);

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if self.accept_line(&line) {
                return true;
            }
        }

        false
    }

    /// Concatenated reply, including a trailing line without newline
    #[must_use]
    pub fn finish(mut self) -> String {
        if !self.done && !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.accept_line(&line);
        }
        self.text.trim().to_string()
    }

    fn accept_line(&mut self, line: &[u8]) -> bool {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        match serde_json::from_str::<GenerateChunk>(line) {
            Ok(chunk) => {
                self.text.push_str(&chunk.response);
                self.done = chunk.done;
            }
            Err(e) => tracing::trace!(error = %e, "skipping malformed stream line"),
        }

        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_until_done() {
        let mut collector = StreamCollector::default();
        assert!(!collector.push(b"{\"response\":\"Hel\",\"done\":false}\n{\"resp"));
        assert!(!collector.push(b"onse\":\"lo\",\"done\":false}\n"));
        assert!(collector.push(b"{\"response\":\"!\",\"done\":true}\n{\"response\":\"ignored\"}\n"));
        assert_eq!(collector.finish(), "Hello!");
    }

    #[test]
    fn test_skips_malformed_lines() {
        let mut collector = StreamCollector::default();
        collector.push(b"not json\n\n{\"response\":\" ok \"}\n");
        assert_eq!(collector.finish(), "ok");
    }

    #[test]
    fn test_trailing_line_without_newline() {
        let mut collector = StreamCollector::default();
        collector.push(b"{\"response\":\"tail\",\"done\":true}");
        assert_eq!(collector.finish(), "tail");
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            model: "tinyllama",
            prompt: "hi",
            options: GenerateOptions { max_tokens: 100 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "tinyllama", "prompt": "hi", "options": {"max_tokens": 100}})
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let client = OllamaClient::new(&LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            stream_timeout: Duration::from_secs(2),
            ..LlmConfig::default()
        });
        assert!(client.generate("hello").await.is_err());
    }
}
