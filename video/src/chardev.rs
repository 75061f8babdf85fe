//! Character-device surface over a [`Display`]
//!
//! Reading yields the pixel geometry as `"W H\n"`; a read at end of message
//! returns 0 and rewinds, so the next read reports the (possibly changed)
//! geometry again. Each write carries one textual command.

use alloc::format;
use alloc::string::String;

use embedded_io::{ErrorType, Read, Write};

use crate::command::{Command, ParseError};
use crate::device::RegisterWindow;
use crate::display::Display;
use crate::error::VideoError;
use crate::swap::{SpinWait, VsyncWait};

/// Longest command accepted per write, in bytes
pub const MAX_COMMAND: usize = 255;

pub struct VideoDevice<C, B, V = SpinWait> {
    display: Display<C, B, V>,
    message: String,
    read_pos: usize,
}

impl<C: RegisterWindow, B: RegisterWindow, V: VsyncWait> VideoDevice<C, B, V> {
    pub fn new(display: Display<C, B, V>) -> Self {
        Self {
            display,
            message: String::new(),
            read_pos: 0,
        }
    }

    pub fn display(&self) -> &Display<C, B, V> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display<C, B, V> {
        &mut self.display
    }

    pub fn into_inner(self) -> Display<C, B, V> {
        self.display
    }
}

impl<C, B, V> ErrorType for VideoDevice<C, B, V> {
    type Error = VideoError;
}

impl<C: RegisterWindow, B: RegisterWindow, V: VsyncWait> Read for VideoDevice<C, B, V> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.read_pos == 0 {
            self.message = format!("{}\n", self.display.geometry()?);
        }
        let remaining = &self.message.as_bytes()[self.read_pos..];
        if remaining.is_empty() {
            self.read_pos = 0;
            return Ok(0);
        }
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl<C: RegisterWindow, B: RegisterWindow, V: VsyncWait> Write for VideoDevice<C, B, V> {
    /// Execute the command in `buf`, truncated to [`MAX_COMMAND`] bytes
    ///
    /// Returns the number of bytes consumed.
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        let (line, len) = match truncate_utf8(buf, MAX_COMMAND) {
            Some(line) => (line, line.len()),
            None => {
                let e = VideoError::Parse(ParseError::Invalid("utf-8"));
                log::warn!("video: rejected write: {}", e);
                return Err(e);
            }
        };
        let result = Command::parse(line)
            .map_err(VideoError::from)
            .and_then(|command| self.display.execute(&command));

        match result {
            Ok(()) => Ok(len),
            Err(e) => {
                log::warn!("video: rejected write: {}", e);
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Decode at most `max` bytes of `buf`, backing off to a character boundary
/// when the cut splits a multi-byte sequence
fn truncate_utf8(buf: &[u8], max: usize) -> Option<&str> {
    let len = buf.len().min(max);
    match core::str::from_utf8(&buf[..len]) {
        Ok(line) => Some(line),
        Err(e) if len < buf.len() && e.error_len().is_none() => {
            core::str::from_utf8(&buf[..e.valid_up_to()]).ok()
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoundsMode, DisplayConfig};
    use crate::device::sim::{SimControl, SimMapper};
    use crate::device::{MemWindow, RegisterWindow};
    use crate::swap::BufferId;
    use alloc::vec::Vec;
    use embedded_io::ErrorKind;
    use embedded_io::Error as _;

    fn device() -> VideoDevice<SimControl, MemWindow> {
        device_with(DisplayConfig::default())
    }

    fn device_with(config: DisplayConfig) -> VideoDevice<SimControl, MemWindow> {
        let mut mapper = SimMapper::de1_soc();
        VideoDevice::new(Display::open(&mut mapper, config).unwrap())
    }

    fn read_all(dev: &mut VideoDevice<SimControl, MemWindow>, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            let n = dev.read(&mut buf[..chunk]).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_read_reports_geometry() {
        let mut dev = device();
        assert_eq!(read_all(&mut dev, 16), b"320 240\n");
        // Rewound after end of message
        assert_eq!(read_all(&mut dev, 3), b"320 240\n");
    }

    #[test]
    fn test_write_executes_command() {
        let mut dev = device();
        assert_eq!(dev.write(b"pixel 1,1 f800\n").unwrap(), 15);
        assert_eq!(dev.write(b"text 0,0 HI").unwrap(), 11);
        let display = dev.display();
        assert_eq!(display.pixel(BufferId::Secondary, 1, 1).unwrap(), 0xF800);
        assert_eq!(display.cell(1, 0).unwrap(), b'I');

        dev.write(b"sync").unwrap();
        assert_eq!(dev.display().visible_buffer().unwrap(), BufferId::Secondary);
    }

    #[test]
    fn test_write_errors_map_to_kinds() {
        let mut dev = device();
        let err = dev.write(b"explode 1,2").unwrap_err();
        assert_eq!(err, VideoError::Parse(ParseError::UnknownCommand));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = dev.write(b"pixel 320,0 ffff").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = dev.write(&[b't', b'e', 0xFF]).unwrap_err();
        assert_eq!(err, VideoError::Parse(ParseError::Invalid("utf-8")));
    }

    #[test]
    fn test_long_write_is_truncated() {
        let mut dev = device_with(DisplayConfig::default().with_bounds(BoundsMode::Unchecked));
        let mut line = String::from("text 0,0 ");
        while line.len() < 300 {
            line.push('x');
        }
        assert_eq!(dev.write(line.as_bytes()).unwrap(), MAX_COMMAND);
        // 246 characters made it through, running into the next row
        let regions = dev.into_inner().close();
        assert_eq!(regions.chars.read_u8(245).unwrap(), b'x');
        assert_eq!(regions.chars.read_u8(246).unwrap(), 0);

        let mut dev = device();
        let mut line = String::from("clear");
        while line.len() < 300 {
            line.push(' ');
        }
        assert_eq!(dev.write(line.as_bytes()).unwrap(), MAX_COMMAND);

        // Checked mode refuses a run past the end of the row
        let mut line = String::from("text 0,0 ");
        line.extend(core::iter::repeat('x').take(81));
        assert_eq!(dev.write(line.as_bytes()), Err(VideoError::OutOfBounds { x: 80, y: 0 }));
    }

    #[test]
    fn test_truncation_keeps_whole_characters() {
        let mut dev = device_with(DisplayConfig::default().with_bounds(BoundsMode::Unchecked));
        // 10 + 2 * 122 = 254 bytes; byte 255 would split the next 'é'
        let mut line = String::from("text 0,0 x");
        line.extend(core::iter::repeat('é').take(130));
        assert_eq!(dev.write(line.as_bytes()).unwrap(), 254);

        let regions = dev.into_inner().close();
        assert_eq!(regions.chars.read_u8(0).unwrap(), b'x');
        assert_eq!(regions.chars.read_u8(243).unwrap(), 0xC3);
        assert_eq!(regions.chars.read_u8(244).unwrap(), 0xA9);
        assert_eq!(regions.chars.read_u8(245).unwrap(), 0);
    }

    #[test]
    fn test_invalid_utf8_inside_limit_is_rejected() {
        assert_eq!(truncate_utf8(b"text 0,0 ok", MAX_COMMAND), Some("text 0,0 ok"));
        assert_eq!(truncate_utf8(&[b'a', 0xC3], 2), None);
        assert_eq!(truncate_utf8(&[b'a', 0xC3, 0xA9], 2), Some("a"));
    }

    #[test]
    fn test_empty_write_consumes_nothing() {
        let mut dev = device();
        assert_eq!(dev.write(b"").unwrap(), 0);
    }
}
