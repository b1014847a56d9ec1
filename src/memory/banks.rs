//! Ready-made [`MemoryBank`] implementations for hosts and tests

use std::sync::Arc;

use parking_lot::Mutex;

use super::MemoryBank;

/// A byte buffer shared between the host and the engine
///
/// Cloning yields another handle to the same buffer, so a host can keep
/// poking emulated RAM while the registry owns a boxed clone.
#[derive(Clone, Default)]
pub struct SharedMemory {
    data: Arc<Mutex<Vec<u8>>>,
}

impl SharedMemory {
    /// Zero-filled memory of the given size
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Read a byte, zero when out of range
    pub fn peek(&self, offset: usize) -> u8 {
        self.data.lock().get(offset).copied().unwrap_or(0)
    }

    /// Write a byte, ignored when out of range
    pub fn poke(&self, offset: usize, value: u8) {
        if let Some(slot) = self.data.lock().get_mut(offset) {
            *slot = value;
        }
    }

    /// Copy a run of bytes starting at `offset`
    pub fn write_slice(&self, offset: usize, bytes: &[u8]) {
        let mut data = self.data.lock();
        for (i, byte) in bytes.iter().enumerate() {
            if let Some(slot) = data.get_mut(offset + i) {
                *slot = *byte;
            }
        }
    }

    pub fn fill(&self, value: u8) {
        self.data.lock().iter_mut().for_each(|b| *b = value);
    }

    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

impl MemoryBank for SharedMemory {
    fn size(&self) -> usize {
        self.len()
    }

    fn read_byte(&self, offset: usize) -> u8 {
        self.peek(offset)
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.poke(offset, value);
    }
}

type ReadFn = Box<dyn Fn(usize) -> u8 + Send>;
type WriteFn = Box<dyn FnMut(usize, u8) + Send>;

/// A bank backed by host-provided reader and writer callbacks
pub struct CallbackBank {
    size: usize,
    reader: ReadFn,
    writer: Option<WriteFn>,
}

impl CallbackBank {
    /// Read-only bank; writes are discarded
    pub fn new<R>(size: usize, reader: R) -> Self
    where
        R: Fn(usize) -> u8 + Send + 'static,
    {
        Self {
            size,
            reader: Box::new(reader),
            writer: None,
        }
    }

    pub fn with_writer<W>(mut self, writer: W) -> Self
    where
        W: FnMut(usize, u8) + Send + 'static,
    {
        self.writer = Some(Box::new(writer));
        self
    }
}

impl MemoryBank for CallbackBank {
    fn size(&self) -> usize {
        self.size
    }

    fn read_byte(&self, offset: usize) -> u8 {
        (self.reader)(offset)
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        if let Some(writer) = self.writer.as_mut() {
            writer(offset, value);
        }
    }
}
