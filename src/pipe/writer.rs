use bytes::Bytes;

use crate::queue::{ClosedFlag, Item, QueueSender};
use crate::stream::{BaseStream, Lifecycle, WritableStream};
use crate::{Result, StreamError};

/// Async end of a pipe whose consumer runs on a blocking thread.
///
/// Each write waits for the previous chunk to be taken, so at most one
/// chunk is in flight.
pub struct AsyncQueueWriter {
    lifecycle: Lifecycle,
    tx: QueueSender,
    reader_closed: ClosedFlag,
    sent_eos: bool,
}

impl AsyncQueueWriter {
    pub(crate) fn new(tx: QueueSender, reader_closed: ClosedFlag) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            tx,
            reader_closed,
            sent_eos: false,
        }
    }

    async fn send_eos(&mut self) {
        if self.sent_eos {
            return;
        }
        // Only marked once the put has finished, so a cancelled push is
        // retried by the next write or by teardown.
        let sent = self.tx.put(Item::End).await;
        self.sent_eos = true;
        // A receiver that is already gone needs no end marker.
        if sent.is_err() {
            log::debug!("pipe reader dropped before end of stream");
        } else {
            log::debug!("pipe writer sent end of stream");
        }
    }

    /// Like [`WritableStream::write`], without copying `chunk`.
    pub async fn write_chunk(&mut self, chunk: Bytes) -> Result<usize> {
        if self.reader_closed.is_set() {
            self.send_eos().await;
            return Err(StreamError::ReaderClosed);
        }
        let n = chunk.len();
        if n > 0 {
            log::trace!("pipe writer queueing {} bytes", n);
            self.tx.put(Item::Chunk(chunk)).await?;
        }
        Ok(n)
    }
}

impl BaseStream for AsyncQueueWriter {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    async fn teardown(&mut self) -> Result<()> {
        self.send_eos().await;
        Ok(())
    }
}

impl WritableStream for AsyncQueueWriter {
    fn writable(&self) -> bool {
        !self.sent_eos && !self.reader_closed.is_set()
    }

    async fn write(&mut self, b: &[u8]) -> Result<usize> {
        self.write_chunk(Bytes::copy_from_slice(b)).await
    }
}
