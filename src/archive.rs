//! Response archive decoding.
//!
//! The service answers with a ZIP archive holding one JSON payload and, for
//! documents with pictures, the extracted image files.
//!
//! Known limitation: if an archive ever holds several `.json` members, only
//! the first one in the archive's own enumeration order is used.

use crate::error::{Error, Result};
use log::debug;
use serde_json::Value;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Extension that marks the payload member.
const PAYLOAD_EXTENSION: &str = ".json";

/// A validated response archive.
///
/// Holds the raw bytes so the response can be saved and members re-read
/// without keeping an open reader around.
#[derive(Clone)]
pub struct ResponseArchive {
    bytes: Vec<u8>,
    members: Vec<String>,
}

impl std::fmt::Debug for ResponseArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseArchive")
            .field("len", &self.bytes.len())
            .field("members", &self.members)
            .finish()
    }
}

impl ResponseArchive {
    /// Open a response archive and list its members.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArchiveFormat`] if the bytes are not a readable ZIP
    /// container.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let members = {
            let mut archive =
                ZipArchive::new(Cursor::new(bytes.as_slice())).map_err(|e| Error::ArchiveFormat {
                    reason: e.to_string(),
                    members: Vec::new(),
                })?;

            let mut members = Vec::with_capacity(archive.len());
            for i in 0..archive.len() {
                let entry = archive.by_index(i).map_err(|e| Error::ArchiveFormat {
                    reason: format!("entry {}: {}", i, e),
                    members: members.clone(),
                })?;
                if !entry.is_dir() {
                    members.push(entry.name().to_string());
                }
            }
            members
        };

        debug!(
            "opened response archive: {} bytes, members {:?}",
            bytes.len(),
            members
        );
        Ok(Self { bytes, members })
    }

    /// File member names in the archive's enumeration order.
    pub fn member_names(&self) -> &[String] {
        &self.members
    }

    /// Name of the payload member, if the archive has one.
    pub fn payload_name(&self) -> Option<&str> {
        self.members
            .iter()
            .find(|name| is_payload(name))
            .map(String::as_str)
    }

    /// Members that are not the JSON payload (rendered images and the like).
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .filter(|name| !is_payload(name))
            .map(String::as_str)
    }

    /// Read and parse the JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPayload`] if no member has a `.json` name and
    /// [`Error::PayloadParse`] if the selected member is not valid JSON.
    pub fn payload(&self) -> Result<Value> {
        let name = self.payload_name().ok_or_else(|| Error::MissingPayload {
            members: self.members.clone(),
        })?;

        let data = self.read_member(name)?;
        serde_json::from_slice(&data).map_err(|e| Error::PayloadParse {
            member: name.to_string(),
            reason: e.to_string(),
            members: self.members.clone(),
        })
    }

    /// Read the bytes of one member.
    pub fn read_member(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice())).map_err(|e| {
            Error::ArchiveFormat {
                reason: e.to_string(),
                members: self.members.clone(),
            }
        })?;

        let mut entry = archive.by_name(name).map_err(|e| Error::ArchiveFormat {
            reason: format!("member '{}': {}", name, e),
            members: self.members.clone(),
        })?;

        let mut data = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::ArchiveFormat {
                reason: format!("member '{}': {}", name, e),
                members: self.members.clone(),
            })?;
        Ok(data)
    }

    /// Raw archive bytes as received.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the archive and return the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Decode a response body into its JSON payload tree.
///
/// # Example
///
/// ```no_run
/// let body = std::fs::read("response.zip")?;
/// let tree = datainsight::archive::decode(&body)?;
/// println!("{}", tree["docName"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode(bytes: &[u8]) -> Result<Value> {
    ResponseArchive::from_bytes(bytes.to_vec())?.payload()
}

fn is_payload(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(PAYLOAD_EXTENSION)
}
