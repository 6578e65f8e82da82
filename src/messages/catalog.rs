//! Message Catalog
//!
//! JSON-backed [`MessageService`]. The built-in catalog is compiled into the
//! binary; deployments may point `MESSAGES_PATH` at a replacement file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::{codes, ApiMessage, MessageService, MessageType};

const BUILTIN_CATALOG: &str = include_str!("../../resources/messages.json");

// == Message Error ==
/// Errors raised while loading a message catalog.
#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Failed to read message catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid message catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate message code in catalog: {0}")]
    Duplicate(String),

    #[error("Message catalog is missing required code: {0}")]
    MissingCode(&'static str),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    messages: Vec<MessageDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageDefinition {
    code: String,
    number: String,
    #[serde(rename = "type")]
    message_type: MessageType,
    text: String,
}

// == Catalog Message Service ==
/// Message service backed by an in-memory catalog keyed by message code.
#[derive(Debug, Clone)]
pub struct CatalogMessageService {
    messages: HashMap<String, MessageDefinition>,
}

impl CatalogMessageService {
    /// Loads the catalog shipped with the service.
    pub fn builtin() -> Result<Self, MessageError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Loads a catalog from a JSON file on disk.
    pub fn from_path(path: &Path) -> Result<Self, MessageError> {
        let raw = std::fs::read_to_string(path).map_err(|source| MessageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses a catalog from its JSON representation.
    ///
    /// The catalog must define `common.invalidMessageKey`, which is used to
    /// render unknown codes.
    pub fn from_json(raw: &str) -> Result<Self, MessageError> {
        let file: CatalogFile = serde_json::from_str(raw)?;

        let mut messages = HashMap::with_capacity(file.messages.len());
        for definition in file.messages {
            if messages.contains_key(&definition.code) {
                return Err(MessageError::Duplicate(definition.code));
            }
            messages.insert(definition.code.clone(), definition);
        }

        if !messages.contains_key(codes::INVALID_MESSAGE_KEY) {
            return Err(MessageError::MissingCode(codes::INVALID_MESSAGE_KEY));
        }

        Ok(Self { messages })
    }

    /// Returns the number of message definitions in the catalog.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn build(definition: &MessageDefinition, args: &[String]) -> ApiMessage {
        ApiMessage {
            code: definition.code.clone(),
            number: definition.number.clone(),
            message_type: definition.message_type,
            text: format_template(&definition.text, args),
        }
    }
}

impl MessageService for CatalogMessageService {
    fn render(&self, code: &str, args: &[String]) -> ApiMessage {
        if let Some(definition) = self.messages.get(code) {
            return Self::build(definition, args);
        }

        warn!("Unknown message code requested: {}", code);
        // Presence checked in from_json
        let fallback = &self.messages[codes::INVALID_MESSAGE_KEY];
        Self::build(fallback, &[code.to_string()])
    }
}

/// Stands in for a placeholder the caller supplied no argument for.
const MISSING_ARGUMENT: &str = "n/a";

/// Fills `{}` placeholders with `args` in order.
///
/// Surplus arguments are ignored; placeholders without an argument render
/// as [`MISSING_ARGUMENT`].
fn format_template(template: &str, args: &[String]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut pieces = template.split("{}");

    if let Some(first) = pieces.next() {
        rendered.push_str(first);
    }
    for piece in pieces {
        rendered.push_str(args.next().map_or(MISSING_ARGUMENT, String::as_str));
        rendered.push_str(piece);
    }

    rendered
}
