//! Incremental decoder for the analyze event stream.
//!
//! The wire format is line-delimited text blocks separated by a blank line,
//! each carrying an `event: <kind>` line and a `data: <json>` line. Bytes
//! arrive in arbitrary chunks, so the decoder owns a buffer that holds any
//! trailing partial block between reads. One decoder instance is scoped to
//! one request's stream and never shared.
//!
//! Invariant: for a given byte sequence, the emitted block order is the same
//! no matter where the chunk boundaries fall.

use kc_core::StreamEvent;

/// One reassembled SSE block: the last `event:` name seen plus the joined
/// `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event: Option<String>,
    pub data: String,
}

impl RawEvent {
    /// Parse into a typed [`StreamEvent`].
    ///
    /// Blocks with no event name, unknown names, or malformed JSON yield
    /// `None`; tolerating them keeps one bad block from killing the stream.
    pub fn parse(&self) -> Option<StreamEvent> {
        let name = self.event.as_deref()?;
        match StreamEvent::from_wire(name, &self.data) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::debug!("skipping malformed {name} payload: {err}");
                None
            }
        }
    }
}

/// Stateful line-buffer decoder for one stream.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes; returns every block completed by it, in
    /// arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut blocks = Vec::new();
        while let Some((end, delimiter_len)) = find_block_end(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + delimiter_len).collect();
            if let Some(raw) = parse_block(&block[..end]) {
                blocks.push(raw);
            }
        }
        blocks
    }
}

/// Find the first blank-line delimiter (`\n\n` or `\r\n\r\n`).
fn find_block_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let mut i = 0;
    while i + 1 < buffer.len() {
        if buffer[i] == b'\n' && buffer[i + 1] == b'\n' {
            return Some((i, 2));
        }
        if i + 3 < buffer.len()
            && buffer[i..i + 4] == *b"\r\n\r\n"
        {
            return Some((i, 4));
        }
        i += 1;
    }
    None
}

fn parse_block(block: &[u8]) -> Option<RawEvent> {
    if block.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(block);
    let mut event = None;
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in text.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        // Lines starting with ':' are keep-alive comments.
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim_start().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        }
    }
    if event.is_none() && data_lines.is_empty() {
        return None;
    }
    Some(RawEvent {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use kc_core::{StatusPhase, StreamEvent};

    const SESSION: &[u8] = b"event: status\n\
data: {\"message\":\"Connecting to MedGemma...\",\"phase\":\"connecting\"}\n\
\n\
event: status\n\
data: {\"message\":\"waking\",\"phase\":\"waking\",\"attempt\":1,\"maxAttempts\":11,\"retrySec\":5}\n\
\n\
event: result\n\
data: {\"result\":\"Creatinine is fine.\"}\n\
\n";

    fn decode_all(chunks: &[&[u8]]) -> Vec<RawEvent> {
        let mut decoder = EventStreamDecoder::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(decoder.push(chunk));
        }
        out
    }

    #[test]
    fn test_single_chunk_decodes_all_blocks() {
        let blocks = decode_all(&[SESSION]);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].event.as_deref(), Some("status"));
        assert_eq!(blocks[2].event.as_deref(), Some("result"));
    }

    #[test]
    fn test_chunk_boundaries_do_not_change_the_sequence() {
        let whole = decode_all(&[SESSION]);

        // Split at every possible boundary, including mid-line.
        for split in 1..SESSION.len() {
            let halves = decode_all(&[&SESSION[..split], &SESSION[split..]]);
            assert_eq!(halves, whole, "split at byte {split} diverged");
        }

        // Byte-at-a-time delivery.
        let dribble: Vec<&[u8]> = SESSION.chunks(1).collect();
        assert_eq!(decode_all(&dribble), whole);
    }

    #[test]
    fn test_crlf_delimiters() {
        let bytes = b"event: result\r\ndata: {\"result\":\"ok\"}\r\n\r\n";
        let blocks = decode_all(&[bytes]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].data, "{\"result\":\"ok\"}");
    }

    #[test]
    fn test_keepalive_comments_are_ignored() {
        let bytes = b": ping\n\nevent: result\ndata: {\"result\":\"ok\"}\n\n";
        let blocks = decode_all(&[bytes]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].event.as_deref(), Some("result"));
    }

    #[test]
    fn test_trailing_partial_block_is_held_back() {
        let mut decoder = EventStreamDecoder::new();
        assert!(decoder.push(b"event: status\ndata: {\"message\"").is_empty());
        let blocks = decoder.push(b":\"hi\",\"phase\":\"connecting\"}\n\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(
            blocks[0].data,
            "{\"message\":\"hi\",\"phase\":\"connecting\"}"
        );
    }

    #[test]
    fn test_typed_parse_and_malformed_tolerance() {
        let blocks = decode_all(&[SESSION]);
        let events: Vec<StreamEvent> = blocks.iter().filter_map(RawEvent::parse).collect();
        assert_eq!(events.len(), 3);
        let StreamEvent::Status(first) = &events[0] else {
            panic!("expected status");
        };
        assert_eq!(first.phase, StatusPhase::Connecting);

        let bad = RawEvent {
            event: Some("status".into()),
            data: "{not json".into(),
        };
        assert_eq!(bad.parse(), None);

        let unknown = RawEvent {
            event: Some("ping".into()),
            data: "{}".into(),
        };
        assert_eq!(unknown.parse(), None);
    }
}
