//! Byte Streams
//!
//! [`ByteStream`] is the narrow capability the rest of the firmware codes
//! against. Printing and formatting are free functions over it, so any
//! stream gets them without a base type.
//!
//! The serial port also implements the `embedded-io` traits. Their `read`
//! and `write` take slices and share names with the inherent byte methods,
//! so call them with fully qualified syntax.

use core::fmt;

use crate::coprocessor::Coprocessor;
use crate::error::Error;
use crate::serial::SoftwareSerial;

/// Duplex byte stream
pub trait ByteStream {
    /// Error reported by the stream
    type Error;

    /// Bytes that can be read without waiting
    fn available(&self) -> Result<usize, Self::Error>;

    /// Next byte without consuming it
    fn peek(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Take the next byte, `None` if nothing is waiting
    fn read(&mut self) -> Result<Option<u8>, Self::Error>;

    /// Send one byte, returning how many were accepted
    fn write(&mut self, byte: u8) -> Result<usize, Self::Error>;

    /// Push out anything buffered
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<C: Coprocessor> ByteStream for SoftwareSerial<C> {
    type Error = Error;

    fn available(&self) -> Result<usize, Error> {
        SoftwareSerial::available(self)
    }

    fn peek(&mut self) -> Result<Option<u8>, Error> {
        SoftwareSerial::peek(self)
    }

    fn read(&mut self) -> Result<Option<u8>, Error> {
        SoftwareSerial::read(self)
    }

    fn write(&mut self, byte: u8) -> Result<usize, Error> {
        SoftwareSerial::write(self, byte)
    }

    fn flush(&mut self) -> Result<(), Error> {
        SoftwareSerial::flush(self)
    }
}

/// Write every byte of `bytes`
pub fn write_all<S: ByteStream>(stream: &mut S, bytes: &[u8]) -> Result<usize, S::Error> {
    let mut written = 0;
    for &byte in bytes {
        written += stream.write(byte)?;
    }
    Ok(written)
}

/// Write a string
pub fn print<S: ByteStream>(stream: &mut S, text: &str) -> Result<usize, S::Error> {
    write_all(stream, text.as_bytes())
}

/// Write a string followed by CR LF
pub fn println<S: ByteStream>(stream: &mut S, text: &str) -> Result<usize, S::Error> {
    let written = print(stream, text)?;
    Ok(written + write_all(stream, b"\r\n")?)
}

/// Write `value` in `radix` (2-36, anything else prints decimal)
pub fn print_radix<S: ByteStream>(stream: &mut S, value: u32, radix: u32) -> Result<usize, S::Error> {
    let radix = if (2..=36).contains(&radix) { radix } else { 10 };

    // 32 binary digits is the longest rendering
    let mut digits = [0u8; 32];
    let mut len = 0;
    let mut rest = value;
    loop {
        let digit = (rest % radix) as u8;
        digits[len] = if digit < 10 { b'0' + digit } else { b'A' + digit - 10 };
        len += 1;
        rest /= radix;
        if rest == 0 {
            break;
        }
    }
    digits[..len].reverse();
    write_all(stream, &digits[..len])
}

/// Write a signed decimal number
pub fn print_signed<S: ByteStream>(stream: &mut S, value: i32) -> Result<usize, S::Error> {
    if value < 0 {
        let sign = stream.write(b'-')?;
        Ok(sign + print_radix(stream, value.unsigned_abs(), 10)?)
    } else {
        print_radix(stream, value.unsigned_abs(), 10)
    }
}

/// Write formatted text
///
/// ```ignore
/// print_fmt(&mut serial, format_args!("rssi {} dBm\r\n", rssi))?;
/// ```
pub fn print_fmt<S: ByteStream>(stream: &mut S, args: fmt::Arguments<'_>) -> Result<usize, S::Error> {
    let mut writer = StreamWriter::new(stream);
    let outcome = fmt::write(&mut writer, args);
    match (outcome, writer.error.take()) {
        (Err(_), Some(err)) => Err(err),
        _ => Ok(writer.written),
    }
}

/// Drain waiting bytes into `buf` without blocking
pub fn read_bytes<S: ByteStream>(stream: &mut S, buf: &mut [u8]) -> Result<usize, S::Error> {
    let mut count = 0;
    for slot in buf.iter_mut() {
        match stream.read()? {
            Some(byte) => {
                *slot = byte;
                count += 1;
            }
            None => break,
        }
    }
    Ok(count)
}

/// `core::fmt::Write` adapter that keeps the stream's own error
pub struct StreamWriter<'a, S: ByteStream> {
    stream: &'a mut S,
    error: Option<S::Error>,
    written: usize,
}

impl<'a, S: ByteStream> StreamWriter<'a, S> {
    /// Wrap a stream
    pub fn new(stream: &'a mut S) -> Self {
        Self {
            stream,
            error: None,
            written: 0,
        }
    }

    /// Bytes written so far
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Error that stopped the last write, if any
    pub fn take_error(&mut self) -> Option<S::Error> {
        self.error.take()
    }
}

impl<S: ByteStream> fmt::Write for StreamWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        match write_all(self.stream, s.as_bytes()) {
            Ok(n) => {
                self.written += n;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err);
                Err(fmt::Error)
            }
        }
    }
}

impl<C: Coprocessor> embedded_io::ErrorType for SoftwareSerial<C> {
    type Error = Error;
}

impl<C: Coprocessor> embedded_io::Read for SoftwareSerial<C> {
    /// Waits for the first byte, then takes whatever else is queued
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = loop {
            if let Some(byte) = SoftwareSerial::read(self)? {
                break byte;
            }
            core::hint::spin_loop();
        };
        Ok(1 + read_bytes(self, rest)?)
    }
}

impl<C: Coprocessor> embedded_io::ReadReady for SoftwareSerial<C> {
    fn read_ready(&mut self) -> Result<bool, Error> {
        Ok(SoftwareSerial::peek(self)?.is_some())
    }
}

impl<C: Coprocessor> embedded_io::Write for SoftwareSerial<C> {
    /// Waits for room for the first byte, then queues as many as fit
    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        let Some((&first, rest)) = buf.split_first() else {
            return Ok(0);
        };
        let mut written = SoftwareSerial::write(self, first)?;
        for &byte in rest {
            if !SoftwareSerial::write_ready(self)? {
                break;
            }
            written += SoftwareSerial::write(self, byte)?;
        }
        Ok(written)
    }

    fn flush(&mut self) -> Result<(), Error> {
        SoftwareSerial::flush(self)
    }
}

impl<C: Coprocessor> embedded_io::WriteReady for SoftwareSerial<C> {
    fn write_ready(&mut self) -> Result<bool, Error> {
        SoftwareSerial::write_ready(self)
    }
}
