//! Textual command protocol
//!
//! One command per line, as written to the video character device:
//!
//! ```text
//! clear                       clear the pixel back buffer
//! erase                       blank the character overlay
//! sync                        swap buffers at the next vertical blank
//! pixel X,Y COLOR             plot one pixel
//! line X0,Y0 X1,Y1 COLOR      Bresenham line
//! box X0,Y0 X1,Y1 COLOR       corner markers at both points
//! text X,Y STRING             place STRING in the overlay
//! ```
//!
//! Coordinates are signed decimal, colors hexadecimal (`0x` optional).

use alloc::string::{String, ToString};
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    Erase,
    Sync,
    Pixel { x: i32, y: i32, color: u16 },
    Line { x0: i32, y0: i32, x1: i32, y1: i32, color: u16 },
    Box { x0: i32, y0: i32, x1: i32, y1: i32, color: u16 },
    Text { x: i32, y: i32, text: String },
}

/// Command parse error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line
    Empty,
    /// First word is not a known command
    UnknownCommand,
    /// Expected argument not present
    Missing(&'static str),
    /// Argument present but malformed
    Invalid(&'static str),
    /// Unexpected text after the last argument
    TrailingInput,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::UnknownCommand => write!(f, "unknown command"),
            ParseError::Missing(what) => write!(f, "missing {}", what),
            ParseError::Invalid(what) => write!(f, "invalid {}", what),
            ParseError::TrailingInput => write!(f, "unexpected trailing input"),
        }
    }
}

/// Minimal scanner over one command line
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn word(&mut self) -> Option<&'a str> {
        self.skip_ws();
        if self.rest.is_empty() {
            return None;
        }
        let end = self.rest.find(char::is_whitespace).unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(word)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self.rest.find(|c: char| !pred(c)).unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn int(&mut self, what: &'static str) -> Result<i32, ParseError> {
        self.skip_ws();
        let sign = if self.rest.starts_with(&['-', '+'][..]) { 1 } else { 0 };
        let digits = self.rest[sign..].find(|c: char| !c.is_ascii_digit()).unwrap_or(self.rest.len() - sign);
        if digits == 0 {
            return Err(if self.rest.is_empty() {
                ParseError::Missing(what)
            } else {
                ParseError::Invalid(what)
            });
        }
        let (number, rest) = self.rest.split_at(sign + digits);
        self.rest = rest;
        number.parse().map_err(|_| ParseError::Invalid(what))
    }

    fn comma(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        match self.rest.strip_prefix(',') {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(ParseError::Missing("','")),
        }
    }

    fn point(&mut self) -> Result<(i32, i32), ParseError> {
        let x = self.int("x coordinate")?;
        self.comma()?;
        let y = self.int("y coordinate")?;
        Ok((x, y))
    }

    fn color(&mut self) -> Result<u16, ParseError> {
        self.skip_ws();
        if self.rest.is_empty() {
            return Err(ParseError::Missing("color"));
        }
        let body = self
            .rest
            .strip_prefix("0x")
            .or_else(|| self.rest.strip_prefix("0X"))
            .unwrap_or(self.rest);
        self.rest = body;
        let digits = self.take_while(|c| c.is_ascii_hexdigit());
        if digits.is_empty() {
            return Err(ParseError::Invalid("color"));
        }
        u16::from_str_radix(digits, 16).map_err(|_| ParseError::Invalid("color"))
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(ParseError::TrailingInput)
        }
    }
}

impl Command {
    /// Parse one command line (surrounding whitespace ignored)
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut cur = Cursor::new(line);
        let name = cur.word().ok_or(ParseError::Empty)?;

        let command = match name {
            "clear" => Command::Clear,
            "erase" => Command::Erase,
            "sync" => Command::Sync,
            "pixel" => {
                let (x, y) = cur.point()?;
                let color = cur.color()?;
                Command::Pixel { x, y, color }
            }
            "line" | "box" => {
                let (x0, y0) = cur.point()?;
                let (x1, y1) = cur.point()?;
                let color = cur.color()?;
                if name == "line" {
                    Command::Line { x0, y0, x1, y1, color }
                } else {
                    Command::Box { x0, y0, x1, y1, color }
                }
            }
            "text" => {
                let (x, y) = cur.point()?;
                let text = cur.rest.trim();
                if text.is_empty() {
                    return Err(ParseError::Missing("text"));
                }
                return Ok(Command::Text { x, y, text: text.to_string() });
            }
            _ => return Err(ParseError::UnknownCommand),
        };
        cur.finish()?;
        Ok(command)
    }

    /// Keyword as written in the protocol
    pub fn name(&self) -> &'static str {
        match self {
            Command::Clear => "clear",
            Command::Erase => "erase",
            Command::Sync => "sync",
            Command::Pixel { .. } => "pixel",
            Command::Line { .. } => "line",
            Command::Box { .. } => "box",
            Command::Text { .. } => "text",
        }
    }
}
