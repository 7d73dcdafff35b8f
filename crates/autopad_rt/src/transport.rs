use std::io::{self, Write};

use autopad_core::frame::OutputFrame;
use thiserror::Error;
use tracing::trace;

use crate::report::{encode_report, HidReport};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to write report {report}: {source}")]
    Write {
        report: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to flush transport: {0}")]
    Flush(#[source] io::Error),
}

pub trait FrameSink {
    fn submit(&mut self, frame: &OutputFrame) -> Result<(), TransportError>;

    fn sink_name(&self) -> &'static str;
}

#[derive(Default)]
pub struct NoopFrameSink {
    submitted: usize,
}

impl FrameSink for NoopFrameSink {
    fn submit(&mut self, _frame: &OutputFrame) -> Result<(), TransportError> {
        self.submitted = self.submitted.saturating_add(1);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "noop"
    }
}

impl NoopFrameSink {
    pub fn submitted(&self) -> usize {
        self.submitted
    }
}

#[derive(Default)]
pub struct BufferedFrameSink {
    frames: Vec<OutputFrame>,
}

impl FrameSink for BufferedFrameSink {
    fn submit(&mut self, frame: &OutputFrame) -> Result<(), TransportError> {
        self.frames.push(*frame);
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "buffered"
    }
}

impl BufferedFrameSink {
    pub fn frames(&self) -> &[OutputFrame] {
        &self.frames
    }

    pub fn submitted(&self) -> usize {
        self.frames.len()
    }

    pub fn transitions(&self) -> usize {
        self.frames
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count()
    }

    pub fn take_all(&mut self) -> Vec<OutputFrame> {
        std::mem::take(&mut self.frames)
    }
}

pub struct HidWriterSink<W: Write> {
    writer: W,
    reports_written: u64,
}

impl<W: Write> HidWriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            reports_written: 0,
        }
    }

    pub fn reports_written(&self) -> u64 {
        self.reports_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_report(&mut self, report: &HidReport) -> Result<(), TransportError> {
        self.writer
            .write_all(report.as_bytes())
            .map_err(|source| TransportError::Write {
                report: report.to_hex(),
                source,
            })?;
        self.writer.flush().map_err(TransportError::Flush)
    }
}

impl<W: Write> FrameSink for HidWriterSink<W> {
    fn submit(&mut self, frame: &OutputFrame) -> Result<(), TransportError> {
        let report = encode_report(frame);
        self.write_report(&report)?;
        self.reports_written = self.reports_written.saturating_add(1);
        trace!(report = %report.to_hex(), "hid report written");
        Ok(())
    }

    fn sink_name(&self) -> &'static str {
        "hid-writer"
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use super::{BufferedFrameSink, FrameSink, HidWriterSink, NoopFrameSink, TransportError};
    use autopad_core::frame::{compose, OutputFrame};
    use autopad_core::model::Action;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "host gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn noop_sink_counts_submissions() {
        let mut sink = NoopFrameSink::default();
        sink.submit(&OutputFrame::neutral()).unwrap();
        sink.submit(&compose(Action::A)).unwrap();
        assert_eq!(sink.submitted(), 2);
        assert_eq!(sink.sink_name(), "noop");
    }

    #[test]
    fn buffered_sink_records_frames_and_transitions() {
        let mut sink = BufferedFrameSink::default();
        for action in [Action::A, Action::A, Action::Nothing, Action::Up] {
            sink.submit(&compose(action)).unwrap();
        }

        assert_eq!(sink.submitted(), 4);
        assert_eq!(sink.transitions(), 2);

        let frames = sink.take_all();
        assert_eq!(frames.len(), 4);
        assert_eq!(sink.submitted(), 0);
    }

    #[test]
    fn hid_writer_emits_eight_bytes_per_frame() {
        let mut sink = HidWriterSink::new(Vec::new());
        sink.submit(&OutputFrame::neutral()).unwrap();
        sink.submit(&compose(Action::B)).unwrap();

        assert_eq!(sink.reports_written(), 2);
        let bytes = sink.into_inner();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[8], 0x02);
    }

    #[test]
    fn hid_writer_surfaces_io_errors() {
        let mut sink = HidWriterSink::new(BrokenPipe);
        let error = sink.submit(&compose(Action::Home)).unwrap_err();

        match error {
            TransportError::Write { report, source } => {
                assert_eq!(report, "00 10 08 80 80 80 80 00");
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.reports_written(), 0);
    }
}
