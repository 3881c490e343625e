//! QR capture
//!
//! The capture device is handed in as a `QrSource` rather than reached for
//! globally. `ScanSession` opens it on creation and closes it when dropped,
//! whichever way the scan ends.

use std::io::BufRead;

use tracing::{debug, warn};

use crate::goto::extract_goto;

pub trait QrSource {
    /// Acquire the underlying capture handle
    fn open(&mut self) -> std::io::Result<()>;

    /// Next decoded payload, `None` once the user closes the scanner
    fn next_payload(&mut self) -> std::io::Result<Option<String>>;

    /// Release the capture handle
    fn close(&mut self);
}

/// An open source; closed again on drop.
pub struct ScanSession<'a> {
    source: &'a mut dyn QrSource,
}

impl<'a> ScanSession<'a> {
    pub fn acquire(source: &'a mut dyn QrSource) -> std::io::Result<Self> {
        source.open()?;
        debug!("Scanner opened");
        Ok(Self { source })
    }

    pub fn next_payload(&mut self) -> std::io::Result<Option<String>> {
        self.source.next_payload()
    }
}

impl Drop for ScanSession<'_> {
    fn drop(&mut self) {
        self.source.close();
        debug!("Scanner closed");
    }
}

/// Read payloads until one carries a goto. Payloads without one are skipped;
/// `None` means the scanner was closed before anything usable was seen.
pub fn scan_goto(source: &mut dyn QrSource) -> std::io::Result<Option<String>> {
    let mut session = ScanSession::acquire(source)?;
    while let Some(payload) = session.next_payload()? {
        match extract_goto(&payload) {
            Some(goto) => return Ok(Some(goto)),
            None => warn!("Scanned code has no goto parameter, still scanning"),
        }
    }
    Ok(None)
}

/// One payload per line, as produced by hand-held scanners in keyboard mode
/// or by pasting. A blank line closes the scanner.
pub struct LineQrSource<R> {
    reader: R,
    open: bool,
}

impl<R: BufRead> LineQrSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            open: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<R: BufRead> QrSource for LineQrSource<R> {
    fn open(&mut self) -> std::io::Result<()> {
        self.open = true;
        Ok(())
    }

    fn next_payload(&mut self) -> std::io::Result<Option<String>> {
        if !self.open {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "scanner is not open",
            ));
        }
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line.to_string()))
        }
    }

    fn close(&mut self) {
        self.open = false;
    }
}
