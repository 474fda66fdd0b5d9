use std::io;

use bytes::{Bytes, BytesMut};

use crate::queue::{ClosedFlag, Item, QueueReceiver, QueueSender};
use crate::stream::{BaseStream, Lifecycle, ReadableStream};
use crate::{Result, StreamError};

/// Blocking end of a pipe read by an async task.
pub struct BlockingQueueWriter {
    tx: QueueSender,
    reader_closed: ClosedFlag,
    closed: bool,
    sent_eos: bool,
}

impl BlockingQueueWriter {
    pub(crate) fn new(tx: QueueSender, reader_closed: ClosedFlag) -> Self {
        Self {
            tx,
            reader_closed,
            closed: false,
            sent_eos: false,
        }
    }

    fn send_eos(&mut self) {
        if self.sent_eos {
            return;
        }
        let sent = self.tx.put_blocking(Item::End);
        self.sent_eos = true;
        if sent.is_err() {
            log::debug!("async reader dropped before end of stream");
        }
    }

    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Block until the async reader has taken the previous chunk, then
    /// queue `b`. Empty writes queue nothing.
    pub fn write_bytes(&mut self, b: &[u8]) -> Result<usize> {
        if self.reader_closed.is_set() {
            self.send_eos();
            return Err(StreamError::ReaderClosed);
        }
        if self.closed {
            return Err(StreamError::Closed("write"));
        }
        if !b.is_empty() {
            log::trace!("blocking writer queueing {} bytes", b.len());
            self.tx.put_blocking(Item::Chunk(Bytes::copy_from_slice(b)))?;
        }
        Ok(b.len())
    }

    /// Signal end of stream. Idempotent.
    pub fn close(&mut self) {
        self.closed = true;
        self.send_eos();
    }
}

impl io::Write for BlockingQueueWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Async end of a pipe fed by a blocking thread.
pub struct AsyncQueueReader {
    lifecycle: Lifecycle,
    rx: QueueReceiver,
    closed: ClosedFlag,
    saw_eos: bool,
    unread: Bytes,
}

impl AsyncQueueReader {
    pub(crate) fn new(rx: QueueReceiver) -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            rx,
            closed: ClosedFlag::default(),
            saw_eos: false,
            unread: Bytes::new(),
        }
    }

    pub(crate) fn closed_flag(&self) -> ClosedFlag {
        self.closed.clone()
    }

    /// Next non-empty chunk, or `None` at end of stream.
    async fn next_chunk(&mut self) -> Option<Bytes> {
        if !self.unread.is_empty() {
            return Some(std::mem::take(&mut self.unread));
        }
        if self.saw_eos {
            return None;
        }
        match self.rx.get().await {
            Item::Chunk(chunk) => Some(chunk),
            Item::End => {
                self.saw_eos = true;
                None
            }
        }
    }
}

impl BaseStream for AsyncQueueReader {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    /// Flag the writer and drain until it sends end of stream.
    async fn teardown(&mut self) -> Result<()> {
        self.closed.set();
        self.unread = Bytes::new();
        while !self.saw_eos {
            if let Item::End = self.rx.get().await {
                self.saw_eos = true;
            }
        }
        log::debug!("async pipe reader closed");
        Ok(())
    }
}

impl ReadableStream for AsyncQueueReader {
    /// Unlike the blocking reader, short reads are allowed here: at most
    /// one chunk is consumed per sized read.
    async fn read(&mut self, n: Option<usize>) -> Result<Bytes> {
        if self.lifecycle.is_torn_down() {
            return Err(StreamError::Closed("read"));
        }
        match n {
            Some(0) => Ok(Bytes::new()),
            Some(n) => match self.next_chunk().await {
                None => Ok(Bytes::new()),
                Some(mut chunk) => {
                    let head = chunk.split_to(n.min(chunk.len()));
                    self.unread = chunk;
                    Ok(head)
                }
            },
            None => {
                let mut all = BytesMut::new();
                while let Some(chunk) = self.next_chunk().await {
                    all.extend_from_slice(&chunk);
                }
                Ok(all.freeze())
            }
        }
    }
}
