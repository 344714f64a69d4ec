//! Incremental framing for concatenated JSON objects
//!
//! The daemon writes responses back to back with no length prefix or
//! delimiter, and the socket hands them over in chunks that have nothing to do
//! with message boundaries. `FrameAssembler` recovers the boundaries by
//! counting braces across chunks.
//!
//! # Scanning
//!
//! - `{` raises the nesting depth, `}` lowers it.
//! - When the depth returns to zero, everything from the start of the object
//!   up to and including that `}` is one frame.
//! - Bytes seen at depth zero that do not open an object (the daemon's
//!   `\n\n` separators, stray `}`) are discarded.
//! - Whatever is left over is kept, together with the depth, for the next
//!   call to [`FrameAssembler::feed`].
//!
//! Splitting the input differently never changes the frames produced: state
//! only moves forward one byte at a time, so feeding `a` then `b` is the same
//! as feeding `a ++ b`.
//!
//! # Scan modes
//!
//! [`ScanMode::StringAware`] (the default) ignores braces inside JSON string
//! literals and honours `\` escapes there. [`ScanMode::EscapeLookback`]
//! reproduces the older heuristic: a byte directly preceded by `\` is not
//! counted, wherever it appears. The heuristic miscounts strings such as
//! `"{"`, so only use it against peers that depend on it.
//!
//! # Buffer cap
//!
//! A peer that never closes an object would grow the pending buffer forever.
//! [`FrameAssembler::check_limit`] reports `Error::FrameTooLarge` once the
//! buffered partial frame passes `max_frame_size`; the caller is expected to
//! drop the stream and start over with [`FrameAssembler::reset`].
//!
//! # Example
//!
//! ```rust
//! use lnrpc_core::framing::FrameAssembler;
//!
//! let mut assembler = FrameAssembler::new();
//!
//! assert!(assembler.feed(br#"{"id":1,"result":{"a""#).is_empty());
//! let frames = assembler.feed(br#":1}}{"id":2,"err"#);
//! assert_eq!(&frames[0][..], br#"{"id":1,"result":{"a":1}}"#);
//!
//! let frames = assembler.feed(br#"or":"x"}"#);
//! assert_eq!(&frames[0][..], br#"{"id":2,"error":"x"}"#);
//! ```

use crate::error::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};

/// Default cap on a single buffered frame (64 MiB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Escape byte used by both scan modes
const ESCAPE: u8 = b'\\';

/// How braces inside string content are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Track JSON string literals and skip everything inside them
    #[default]
    StringAware,
    /// Skip any byte immediately preceded by a backslash
    EscapeLookback,
}

/// Lexer position within the current object
#[derive(Debug, Clone, Copy, Default)]
struct Lexer {
    /// Inside a string literal (string-aware mode)
    in_string: bool,
    /// Previous byte was an escape
    escaped: bool,
}

/// Outcome of scanning one byte
enum Step {
    /// Byte belongs to the current object
    Continue,
    /// Byte completed an object
    Complete,
    /// Byte sits between objects and is thrown away
    Discard,
}

/// Stateful splitter for a stream of concatenated JSON objects
#[derive(Debug)]
pub struct FrameAssembler {
    /// Bytes of the object currently being assembled
    buffer: BytesMut,
    /// How far into `buffer` scanning has progressed
    cursor: usize,
    /// Current nesting depth
    depth: usize,
    lexer: Lexer,
    mode: ScanMode,
    max_frame_size: usize,
}

impl FrameAssembler {
    /// Create an assembler with the default mode and frame cap
    pub fn new() -> Self {
        Self::with_mode(ScanMode::default())
    }

    /// Create an assembler with a specific scan mode
    pub fn with_mode(mode: ScanMode) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            cursor: 0,
            depth: 0,
            lexer: Lexer::default(),
            mode,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    /// Set the maximum size of a buffered partial frame
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    /// The configured scan mode
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of bytes held for an incomplete frame
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Consume a chunk and return every frame it completes
    ///
    /// Returns an empty vector when the chunk only extends a partial frame.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while self.cursor < self.buffer.len() {
            let byte = self.buffer[self.cursor];
            match self.step(byte) {
                Step::Continue => self.cursor += 1,
                Step::Complete => {
                    let frame = self.buffer.split_to(self.cursor + 1).freeze();
                    self.cursor = 0;
                    frames.push(frame);
                }
                Step::Discard => {
                    debug_assert_eq!(self.cursor, 0);
                    self.buffer.advance(1);
                }
            }
        }

        frames
    }

    /// Fail if the pending partial frame is over the cap
    pub fn check_limit(&self) -> Result<()> {
        if self.buffer.len() > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                limit: self.max_frame_size,
                buffered: self.buffer.len(),
            });
        }
        Ok(())
    }

    /// Drop all buffered bytes and scanning state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.depth = 0;
        self.lexer = Lexer::default();
    }

    fn step(&mut self, byte: u8) -> Step {
        if self.depth == 0 {
            if byte != b'{' {
                return Step::Discard;
            }
            self.depth = 1;
            self.lexer = Lexer::default();
            return Step::Continue;
        }

        match self.mode {
            ScanMode::StringAware => {
                if self.lexer.in_string {
                    if self.lexer.escaped {
                        self.lexer.escaped = false;
                    } else if byte == ESCAPE {
                        self.lexer.escaped = true;
                    } else if byte == b'"' {
                        self.lexer.in_string = false;
                    }
                    return Step::Continue;
                }
                if byte == b'"' {
                    self.lexer.in_string = true;
                    return Step::Continue;
                }
            }
            ScanMode::EscapeLookback => {
                let after_escape = std::mem::replace(&mut self.lexer.escaped, byte == ESCAPE);
                if after_escape {
                    return Step::Continue;
                }
            }
        }

        match byte {
            b'{' => {
                self.depth += 1;
                Step::Continue
            }
            b'}' => {
                self.depth -= 1;
                if self.depth == 0 {
                    Step::Complete
                } else {
                    Step::Continue
                }
            }
            _ => Step::Continue,
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
