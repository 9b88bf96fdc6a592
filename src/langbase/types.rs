use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::extract_json_from_completion;
use crate::analysis::validation::{PrecedentData, PrecedentMatch};
use crate::error::{LangbaseError, LangbaseResult};

/// Message in a Langbase conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

/// Message role
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Request to run a Langbase pipe
#[derive(Debug, Clone, Serialize)]
pub struct PipeRequest {
    /// Pipe name (required by Langbase API)
    pub name: String,
    pub messages: Vec<Message>,
    /// Disable streaming (default: false for non-streaming response)
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<HashMap<String, String>>,
}

/// Response from a Langbase pipe
#[derive(Debug, Clone, Deserialize)]
pub struct PipeResponse {
    pub success: bool,
    pub completion: String,
    #[serde(rename = "threadId")]
    pub thread_id: Option<String>,
    pub raw: Option<RawResponse>,
}

/// Raw model response details
#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

impl PipeRequest {
    /// Create a new pipe request with name and messages
    pub fn new(name: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            name: name.into(),
            messages,
            stream: false,
            variables: None,
        }
    }

    /// Add a single variable
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Request to create (or upsert) a Langbase pipe
#[derive(Debug, Clone, Serialize)]
pub struct CreatePipeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

/// Response from creating a pipe
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePipeResponse {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub url: String,
}

impl CreatePipeRequest {
    /// Create a new pipe request with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            model: None,
            upsert: None,
            json: None,
            temperature: None,
            messages: None,
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set model (e.g., "openai:gpt-4o-mini")
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Enable upsert (update if exists)
    pub fn with_upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    /// Enable JSON output mode
    pub fn with_json_output(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set system/user messages
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }
}

// ============================================================================
// Collaborator response payloads
// ============================================================================

/// A single contradiction as returned by the contradiction pipe.
///
/// `pattern` stays a string here; mapping onto the closed set of
/// contradiction categories happens in the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedContradiction {
    pub statement: String,
    pub pattern: String,
    /// Challenge question put back to the author.
    pub flag: String,
}

/// Response body of the contradiction pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionDetectionResponse {
    #[serde(default)]
    pub contradictions: Vec<DetectedContradiction>,
}

impl ContradictionDetectionResponse {
    /// Parse a pipe completion, accepting raw or code-fenced JSON.
    pub fn parse_completion(completion: &str) -> LangbaseResult<Self> {
        parse_json_completion(completion)
    }
}

/// Response body of the precedent pipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecedentLookupResponse {
    #[serde(default)]
    pub historical_precedents: Vec<PrecedentMatch>,
    #[serde(default)]
    pub pattern_matches: Vec<String>,
    #[serde(default)]
    pub precedent_accuracy: Option<f64>,
    #[serde(default)]
    pub outlier_factors: Vec<String>,
}

impl PrecedentLookupResponse {
    /// Parse a pipe completion, accepting raw or code-fenced JSON.
    pub fn parse_completion(completion: &str) -> LangbaseResult<Self> {
        parse_json_completion(completion)
    }
}

impl From<PrecedentLookupResponse> for PrecedentData {
    fn from(response: PrecedentLookupResponse) -> Self {
        Self {
            historical_precedents: response.historical_precedents,
            pattern_matches: response.pattern_matches,
            precedent_accuracy: response.precedent_accuracy,
            outlier_factors: response.outlier_factors,
        }
    }
}

fn parse_json_completion<T: serde::de::DeserializeOwned>(completion: &str) -> LangbaseResult<T> {
    let json = extract_json_from_completion(completion)
        .map_err(|message| LangbaseError::InvalidResponse { message })?;
    serde_json::from_str(json).map_err(|e| LangbaseError::InvalidResponse {
        message: format!("Failed to parse completion JSON: {}", e),
    })
}
