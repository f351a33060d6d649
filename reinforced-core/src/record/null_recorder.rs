use super::{Record, Recorder, SourceKind};
use anyhow::Result;

/// A recorder that ignores any record. This struct is used just for debugging.
#[derive(Default)]
pub struct NullRecorder {}

impl NullRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self {}
    }
}

impl Recorder for NullRecorder {
    fn name(&self) -> &str {
        "NullRecorder"
    }

    /// Discard the given record.
    fn write(&mut self, _kind: SourceKind, _record: &Record) -> Result<()> {
        Ok(())
    }
}
