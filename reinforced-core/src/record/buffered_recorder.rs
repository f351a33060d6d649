use super::{Record, Recorder, SourceKind};
use anyhow::Result;
use std::sync::{Arc, Mutex};

/// Records written to a [`BufferedRecorder`].
///
/// The handle stays readable after the recorder has been moved into a
/// [`RecordObserver`](super::RecordObserver).
#[derive(Clone, Default)]
pub struct RecordBuffer(Arc<Mutex<Vec<(SourceKind, Record)>>>);

impl RecordBuffer {
    /// Returns a copy of the records written so far.
    pub fn records(&self) -> Vec<(SourceKind, Record)> {
        match self.0.lock() {
            Ok(buf) => buf.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns the records of the given kind.
    pub fn records_of(&self, kind: SourceKind) -> Vec<Record> {
        self.records()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r)
            .collect()
    }

    fn push(&self, kind: SourceKind, record: Record) {
        match self.0.lock() {
            Ok(mut buf) => buf.push((kind, record)),
            Err(poisoned) => poisoned.into_inner().push((kind, record)),
        }
    }
}

/// Buffered recorder.
///
/// Keeps every record in memory and accepts values of every type.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: RecordBuffer,
    finished: bool,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the buffered records.
    pub fn buffer(&self) -> RecordBuffer {
        self.buf.clone()
    }

    /// Returns `true` after [`Recorder::finish`] has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Recorder for BufferedRecorder {
    fn name(&self) -> &str {
        "BufferedRecorder"
    }

    fn write(&mut self, kind: SourceKind, record: &Record) -> Result<()> {
        self.buf.push(kind, record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
