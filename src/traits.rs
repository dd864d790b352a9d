use anyhow::Result;
use serde::Serialize;

/// Destination for report output: aggregate rows or canonical records,
/// one CSV line each.
pub trait CSVWrite {
    /// Serializes `record` as the next CSV line. The header line is derived
    /// from the first record written.
    fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()>;

    /// Flushes buffered rows to the underlying sink.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Something that can lay itself out as rows for a [`CSVWrite`] destination.
pub trait CSVExport {
    /// Writes every row of `self` to `writer`, in display order.
    fn export(&self, writer: &mut impl CSVWrite) -> Result<()>;
}
