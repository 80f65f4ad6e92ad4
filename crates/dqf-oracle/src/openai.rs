//! Oracle backed by an OpenAI-compatible chat completions endpoint.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use dqf_model::HeaderProposal;

use crate::Oracle;
use crate::config::OracleConfig;
use crate::error::OracleError;
use crate::parse::{parse_proposal, parse_resolution, parse_suggestion};

const SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Blocking HTTP oracle with bounded timeout and retries.
pub struct OpenAiOracle {
    client: Client,
    config: OracleConfig,
    /// Value suggestions keyed by column and raw value.
    suggestions: Mutex<HashMap<(String, String), Option<String>>>,
}

impl OpenAiOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        if !config.has_credentials() {
            return Err(OracleError::MissingCredentials);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(OracleError::Client)?;
        Ok(Self {
            client,
            config,
            suggestions: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn complete(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let attempts = self.config.max_retries + 1;
        let mut attempt = 1;
        loop {
            match self.complete_once(system, prompt) {
                Ok(content) => return Ok(content),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(attempt, attempts, error = %err, "oracle call failed, retrying");
                    thread::sleep(self.config.retry_delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn complete_once(&self, system: &str, prompt: &str) -> Result<String, OracleError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(OracleError::MissingCredentials)?;
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(OracleError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(OracleError::Status { status, message });
        }

        let body: ChatResponse = response.json().map_err(OracleError::Request)?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)
    }

    fn try_resolve_header(&self, header: &str, keys: &[&str]) -> Result<Option<String>, OracleError> {
        let prompt = format!(
            "Map the unknown header to exactly one canonical key, or to an empty string if none fits.\n\
             Respond as {{\"canonical\": \"<key or empty>\"}}.\n\n\
             Canonical keys: {keys:?}\nUnknown header: {header:?}"
        );
        let content = self.complete("You are a strict schema mapper. Output JSON only.", &prompt)?;
        Ok(parse_resolution(&content))
    }

    fn try_propose(&self, header: &str, samples: &[String]) -> Result<HeaderProposal, OracleError> {
        let samples = &samples[..samples.len().min(SAMPLE_LIMIT)];
        let prompt = format!(
            "Propose a canonical schema entry for the unknown header.\n\
             Return one JSON object with keys: canonical (concise snake_case), description (short phrase), \
             example (realistic value, ideally from the samples), synonyms (5 to 12 header variants), \
             header_regex (case-insensitive pattern for typical spellings).\n\n\
             Unknown header: {header:?}\nSample values: {samples:?}"
        );
        let content = self.complete("You are a data schema assistant. Output JSON only.", &prompt)?;
        parse_proposal(&content)
    }

    fn try_suggest(&self, column: &str, raw: &str, description: &str) -> Result<Option<String>, OracleError> {
        let prompt = format!(
            "A value failed validation. Suggest a conservative cleaned value of the same kind, \
             or an empty answer if unsure. Output only the value.\n\n\
             Column: {column}\nDescription: {description}\nValue: {raw}"
        );
        let content = self.complete("Return only the cleaned value, or nothing if unsure.", &prompt)?;
        Ok(parse_suggestion(&content))
    }
}

impl Oracle for OpenAiOracle {
    fn is_available(&self) -> bool {
        self.config.has_credentials()
    }

    fn resolve_header(&self, header: &str, keys: &[&str]) -> Option<String> {
        match self.try_resolve_header(header, keys) {
            Ok(answer) => {
                debug!(header, answer = ?answer, "oracle resolved header");
                answer
            }
            Err(err) => {
                warn!(header, error = %err, "oracle header resolution failed");
                None
            }
        }
    }

    fn propose_new_header(&self, header: &str, samples: &[String]) -> Option<HeaderProposal> {
        match self.try_propose(header, samples) {
            Ok(proposal) => {
                debug!(header, key = %proposal.key, "oracle proposed schema entry");
                Some(proposal)
            }
            Err(err) => {
                warn!(header, error = %err, "oracle schema proposal failed");
                None
            }
        }
    }

    fn suggest_value(&self, column: &str, raw: &str, description: &str) -> Option<String> {
        if raw.trim().is_empty() {
            return None;
        }
        let cache_key = (column.to_string(), raw.to_string());
        if let Ok(cache) = self.suggestions.lock()
            && let Some(cached) = cache.get(&cache_key)
        {
            return cached.clone();
        }
        let answer = match self.try_suggest(column, raw, description) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(column, error = %err, "oracle value suggestion failed");
                None
            }
        };
        if let Ok(mut cache) = self.suggestions.lock() {
            cache.insert(cache_key, answer.clone());
        }
        answer
    }
}
