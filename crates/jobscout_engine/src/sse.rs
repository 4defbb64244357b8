//! Incremental decoder for `text/event-stream` bodies.
//!
//! Bytes arrive in arbitrary chunks; complete lines are parsed as they become
//! available and a frame is emitted at each blank line. Lines may end in
//! `\n`, `\r\n` or a lone `\r`.

use crate::ChannelFault;

const DEFAULT_EVENT: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

#[derive(Debug)]
pub struct SseDecoder {
    max_frame_bytes: usize,
    buffer: Vec<u8>,
    /// Set when the previous chunk ended on `\r`, so a leading `\n` is part of that line break.
    pending_cr: bool,
    event: Option<String>,
    data: Vec<String>,
    frame_bytes: usize,
}

impl SseDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            buffer: Vec::new(),
            pending_cr: false,
            event: None,
            data: Vec::new(),
            frame_bytes: 0,
        }
    }

    /// Feeds a chunk and returns every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, ChannelFault> {
        let mut frames = Vec::new();
        let mut rest = chunk;
        if self.pending_cr {
            self.pending_cr = false;
            if let Some(stripped) = rest.strip_prefix(b"\n") {
                rest = stripped;
            }
        }

        while let Some(pos) = rest.iter().position(|b| *b == b'\n' || *b == b'\r') {
            self.buffer.extend_from_slice(&rest[..pos]);
            let terminator = rest[pos];
            rest = &rest[pos + 1..];
            if terminator == b'\r' {
                match rest.first() {
                    Some(b'\n') => rest = &rest[1..],
                    None => self.pending_cr = true,
                    Some(_) => {}
                }
            }
            let line = std::mem::take(&mut self.buffer);
            if let Some(frame) = self.process_line(&line)? {
                frames.push(frame);
            }
        }

        self.buffer.extend_from_slice(rest);
        if self.buffer.len() + self.frame_bytes > self.max_frame_bytes {
            return Err(ChannelFault::FrameTooLarge {
                limit: self.max_frame_bytes,
            });
        }
        Ok(frames)
    }

    fn process_line(&mut self, line: &[u8]) -> Result<Option<SseFrame>, ChannelFault> {
        if line.is_empty() {
            return Ok(self.dispatch());
        }
        if line[0] == b':' {
            return Ok(None);
        }

        self.frame_bytes += line.len();
        if self.frame_bytes > self.max_frame_bytes {
            return Err(ChannelFault::FrameTooLarge {
                limit: self.max_frame_bytes,
            });
        }

        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // `id` and `retry` only matter for automatic reconnection, which the
            // controller decides on its own.
            _ => {}
        }
        Ok(None)
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        self.frame_bytes = 0;
        if data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: data.join("\n"),
        })
    }
}
