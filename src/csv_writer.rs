use crate::traits::CSVWrite;
use anyhow::{Result, anyhow};
use csv::{Writer, WriterBuilder};
use serde::Serialize;
use std::io::{self, Stdout};

pub struct CSVSink<W: io::Write> {
    writer: Writer<W>,
}

impl<W: io::Write> CSVSink<W> {
    pub fn new(inner: W) -> Self {
        CSVSink {
            writer: WriterBuilder::new().from_writer(inner),
        }
    }

    /// Flushes pending rows and hands back the underlying sink.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| anyhow!("cannot flush csv writer: {}", err.error()))
    }
}

impl CSVSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: io::Write> CSVWrite for CSVSink<W> {
    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        Ok(self.writer.serialize(record)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.writer.flush()?)
    }
}
