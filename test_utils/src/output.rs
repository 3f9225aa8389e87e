//! In-memory writers for capturing reports and log records.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable byte sink; every clone appends to the same buffer.
///
/// Loggers take ownership of their sink, so tests keep one clone and hand
/// another to the logger.
///
/// # Examples
/// ```
/// use std::io::Write;
/// use test_utils::SharedBuffer;
/// let buffer = SharedBuffer::default();
/// let mut writer = buffer.clone();
/// writer.write_all(b"hello").unwrap();
/// assert_eq!(buffer.contents(), "hello");
/// ```
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Discards everything written so far.
    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
