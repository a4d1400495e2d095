//! Coupling point to the chat subsystem.
//!
//! The reader only ever appends content to the pending outgoing message:
//! plain text from a selection, or the identifier of an image the host
//! already uploaded. Everything else about chat lives outside this crate.

use anyhow::Result;

/// One piece of content appended to the pending outgoing message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingPart {
    Text(String),
    Image { attachment_id: String },
}

pub trait ChatComposer {
    fn append(&mut self, part: OutgoingPart) -> Result<()>;
}

/// Test double that records everything appended.
#[derive(Debug, Default)]
pub struct RecordingComposer {
    pub parts: Vec<OutgoingPart>,
}

impl ChatComposer for RecordingComposer {
    fn append(&mut self, part: OutgoingPart) -> Result<()> {
        self.parts.push(part);
        Ok(())
    }
}
