//! File attachments carried inline as base64 data URLs.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::Result;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Attachment as stored on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub data_url: String,
}

impl Attachment {
    /// Decode the payload of the data URL, if it is base64-encoded.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let (header, payload) = self.data_url.split_once(',')?;
        if !header.ends_with(";base64") {
            return None;
        }
        STANDARD.decode(payload).ok()
    }
}

/// A file picked by the sender, not yet encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl OutgoingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk.
    pub async fn read(path: impl AsRef<Path>, mime_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn to_data_url(&self) -> String {
        let mime = if self.mime_type.is_empty() {
            FALLBACK_MIME
        } else {
            self.mime_type.as_str()
        };
        format!("data:{mime};base64,{}", STANDARD.encode(&self.bytes))
    }

    pub fn into_attachment(self) -> Attachment {
        Attachment {
            data_url: self.to_data_url(),
            size: self.size(),
            name: self.name,
            mime_type: self.mime_type,
        }
    }
}
