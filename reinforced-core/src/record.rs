//! Records of observations, agent states and metrics, and the sinks they are written to.
//!
//! Producers build a [`Record`], a map from names to [`RecordValue`]s. A
//! [`RecordObserver`] routes the entries of each record to the [`Recorder`]s
//! subscribed to them. Subscriptions are declared with [`Source`]s: a source
//! names an entry and, optionally, the [`SourceKind`] it must come from.
//!
//! ```rust
//! use reinforced_core::record::{
//!     BufferedRecorder, Record, RecordObserver, RecordValue, Source, SourceKind,
//! };
//!
//! let recorder = BufferedRecorder::new();
//! let buffer = recorder.buffer();
//!
//! let mut observer = RecordObserver::new();
//! observer
//!     .add(Box::new(recorder), vec![Source::of_kind("loss", SourceKind::Metric)])
//!     .unwrap();
//! observer.init().unwrap();
//!
//! let mut record = Record::from_scalar("loss", 0.5);
//! record.insert("n_grad_steps", RecordValue::Scalar(5.0));
//! observer.update_metrics(&record).unwrap();
//!
//! let records = buffer.records();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].1.get_scalar("loss").unwrap(), 0.5);
//! assert!(records[0].1.get("n_grad_steps").is_none());
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod observer;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::{BufferedRecorder, RecordBuffer};
pub use null_recorder::NullRecorder;
pub use observer::RecordObserver;
pub use recorder::{Recorder, Source, SourceKind};
