//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over replay commands from an event CSV.
//! Supports batch reading for the concurrent replay strategy.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of BookingCommands
//!                  ↓
//!           csv_format module
//!           (EventCsvRecord, convert_event_record)
//! ```

use crate::io::csv_format::{convert_event_record, EventCsvRecord};
use crate::types::BookingCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous event CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read a batch of commands
    ///
    /// Reads up to `batch_size` rows. Rows that cannot be converted are
    /// logged with their line number and skipped, so a batch may be shorter
    /// than `batch_size` before the end of input.
    ///
    /// # Returns
    ///
    /// Successfully converted commands in file order; empty at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<BookingCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<EventCsvRecord>();
        let mut consumed = 0;

        while consumed < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            consumed += 1;
            self.line_num += 1;

            match row.map_err(|e| e.to_string()).and_then(convert_event_record) {
                Ok(command) => batch.push(command),
                Err(message) => warn!(line = self.line_num, "Skipping event row: {}", message),
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    const HEADER: &str = "type,machinery,booking,renter,start,end\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let mut async_reader = reader(
            "create,1,1,20,2025-03-01,2025-03-03\n\
             create,2,2,20,2025-03-01,2025-03-03\n\
             approve,1,1\n\
             approve,2,2\n\
             start,1,1\n",
        );

        let batch1 = async_reader.read_batch(2).await;
        assert_eq!(batch1.len(), 2);
        assert_eq!(batch1[0].booking, 1);
        assert_eq!(batch1[1].booking, 2);

        let batch2 = async_reader.read_batch(2).await;
        assert_eq!(batch2.len(), 2);
        assert_eq!(batch2[0].kind(), "approve");

        let batch3 = async_reader.read_batch(2).await;
        assert_eq!(batch3.len(), 1);
        assert_eq!(batch3[0].kind(), "start");

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");
        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let mut async_reader = reader(
            "refund,1,1\n\
             create,1,2\n\
             approve,1,3\n",
        );

        // the create has no renter; only the approve survives
        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].booking, 3);
    }

    #[tokio::test]
    async fn test_async_reader_counts_skipped_rows_against_batch() {
        let mut async_reader = reader("refund,1,1\napprove,1,2\n");

        assert!(async_reader.read_batch(1).await.is_empty());
        let batch = async_reader.read_batch(1).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].booking, 2);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let mut async_reader = reader("  Approve  ,  3  ,  9  \n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].machinery, 3);
        assert_eq!(batch[0].booking, 9);
    }
}
