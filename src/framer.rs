//! Incremental line framing for streamed response bodies.
//!
//! The transport feeds raw byte chunks in whatever sizes the network
//! delivers them; frames are newline-delimited. This framer splits exactly
//! once per delimiter and holds back the trailing partial line (and any
//! partial UTF-8 sequence, since chunk boundaries can land mid-codepoint)
//! until more bytes arrive.

/// Splits an incremental byte stream into complete lines.
///
/// Newlines never occur inside a multi-byte UTF-8 sequence, so splitting at
/// the byte level is safe; each complete line is decoded on emission.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    /// Creates an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line completed by it, in order.
    ///
    /// The final fragment after the last newline stays buffered for the
    /// next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        for (idx, byte) in self.buf.iter().enumerate() {
            if *byte == b'\n' {
                lines.push(decode_line(&self.buf[start..idx]));
                start = idx + 1;
            }
        }
        self.buf.drain(..start);
        lines
    }

    /// Drains the buffered remainder at end-of-stream, if any.
    pub fn flush(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = decode_line(&self.buf);
        self.buf.clear();
        Some(line)
    }

    /// Returns true if a partial line is buffered.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    // Tolerate invalid sequences; downstream treats unparseable frames as
    // skippable, not fatal.
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    if line.ends_with('\r') {
        line.pop();
    }
    line
}
