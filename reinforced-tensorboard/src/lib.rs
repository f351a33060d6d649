//! TensorBoard sink for the records of [`reinforced_core`].
mod histogram;
use anyhow::Result;
use histogram::Histogram;
use log::info;
use reinforced_core::{
    error::RlError,
    record::{Record, RecordValue, Recorder, SourceKind},
};
use std::{collections::HashMap, path::Path};
use tensorboard_rs::summary_writer::SummaryWriter;

const N_BUCKETS: usize = 30;

/// Write records to TFRecord.
///
/// An entry `name` of a record of kind `kind` is written under the tag
/// `name-kind` (e.g. `loss-metric`). Every tag has its own step counter,
/// incremented by each write.
///
/// | value                      | summary                                  |
/// |----------------------------|------------------------------------------|
/// | [`RecordValue::Scalar`]    | scalar                                   |
/// | [`RecordValue::Array1`]    | histogram                                |
/// | [`RecordValue::Dict`]      | scalars grouped under the tag            |
/// | [`RecordValue::Array2`]    | gray-scale image, min-max normalized     |
/// | [`RecordValue::DateTime`]  | discarded                                |
/// | [`RecordValue::String`]    | [`RlError::UnsupportedLogType`]          |
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    steps: HashMap<String, usize>,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        info!("Write TensorBoard summaries into {:?}", logdir.as_ref());
        Self {
            writer: SummaryWriter::new(logdir),
            steps: HashMap::new(),
        }
    }

    /// Number of writes so far under `tag`.
    pub fn step(&self, tag: &str) -> usize {
        self.steps.get(tag).copied().unwrap_or(0)
    }

    fn next_step(&mut self, tag: &str) -> usize {
        let step = self.steps.entry(tag.to_string()).or_insert(0);
        let current = *step;
        *step += 1;
        current
    }

    fn write_value(&mut self, tag: &str, value: &RecordValue) -> Result<()> {
        match value {
            RecordValue::DateTime(_) => {}
            RecordValue::Scalar(v) => {
                let step = self.next_step(tag);
                self.writer.add_scalar(tag, *v, step);
            }
            RecordValue::Array1(xs) => {
                let h = Histogram::new(xs, N_BUCKETS);
                let step = self.next_step(tag);
                self.writer.add_histogram_raw(
                    tag,
                    h.min,
                    h.max,
                    h.num,
                    h.sum,
                    h.sum_squares,
                    &h.bucket_limits,
                    &h.bucket_counts,
                    step,
                );
            }
            RecordValue::Dict(d) => {
                let scalars = d
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect::<HashMap<String, f32>>();
                let step = self.next_step(tag);
                self.writer.add_scalars(tag, &scalars, step);
            }
            RecordValue::Array2(data, shape) => {
                let shape = [3, shape[0], shape[1]];
                let min = data.iter().fold(f32::MAX, |m, v| v.min(m));
                let scale = data.iter().fold(-f32::MAX, |m, v| v.max(m)) - min;
                let scale = if scale > 0.0 { scale } else { 1.0 };
                let mut data = data
                    .iter()
                    .map(|&e| ((e - min) / scale * 255f32) as u8)
                    .collect::<Vec<_>>();
                let data_ = data.clone();
                data.extend(data_.iter());
                data.extend(data_.iter());
                let step = self.next_step(tag);
                self.writer.add_image(tag, data.as_slice(), &shape, step);
            }
            RecordValue::String(_) => {
                return Err(RlError::UnsupportedLogType {
                    sink: self.name().to_string(),
                    value_type: value.type_name().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl Recorder for TensorboardRecorder {
    fn name(&self) -> &str {
        "TensorboardRecorder"
    }

    /// Write a given [`Record`] into a TFRecord.
    ///
    /// Entries are written in the order of their keys. An unsupported entry
    /// aborts the write; the entries before it are kept.
    fn write(&mut self, kind: SourceKind, record: &Record) -> Result<()> {
        let mut entries = record.iter().collect::<Vec<_>>();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in entries {
            self.write_value(&format!("{}-{}", k, kind), v)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::BTreeMap;
    use tempdir::TempDir;

    #[test]
    fn test_step_counters() -> Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());

        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(0.5)),
            ("positions", RecordValue::Array1(vec![1.0, 2.0, 2.5, 4.0])),
        ]);
        recorder.write(SourceKind::Metric, &record)?;
        recorder.write(SourceKind::Metric, &Record::from_scalar("loss", 0.25))?;
        recorder.write(SourceKind::AgentState, &Record::from_scalar("loss", 0.1))?;

        let mut dict = BTreeMap::new();
        dict.insert("a".to_string(), 1.0);
        recorder.write(SourceKind::Metric, &Record::from_slice(&[("d", RecordValue::Dict(dict))]))?;
        recorder.write(
            SourceKind::Metric,
            &Record::from_slice(&[("img", RecordValue::Array2(vec![0.0; 4], [2, 2]))]),
        )?;
        recorder.finish()?;

        assert_eq!(recorder.step("loss-metric"), 2);
        assert_eq!(recorder.step("loss-agent_state"), 1);
        assert_eq!(recorder.step("positions-metric"), 1);
        assert_eq!(recorder.step("d-metric"), 1);
        assert_eq!(recorder.step("img-metric"), 1);
        assert_eq!(recorder.step("unknown"), 0);
        Ok(())
    }

    #[test]
    fn test_unsupported_value() -> Result<()> {
        let dir = TempDir::new("tensorboard")?;
        let mut recorder = TensorboardRecorder::new(dir.path());
        let record = Record::from_slice(&[("note", RecordValue::String("hello".to_string()))]);

        let err = recorder.write(SourceKind::Observation, &record).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RlError>(),
            Some(&RlError::UnsupportedLogType {
                sink: "TensorboardRecorder".to_string(),
                value_type: "String".to_string(),
            })
        );
        assert_eq!(recorder.step("note-observation"), 0);
        Ok(())
    }
}
