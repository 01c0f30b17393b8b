//! Minimal STOMP 1.2 frame codec.
//!
//! Covers what a chat client needs: `CONNECT`, `SUBSCRIBE`, `SEND` and
//! `DISCONNECT` out; `CONNECTED`, `MESSAGE`, `RECEIPT` and `ERROR` in.
//! Header values are escaped (`\\`, `\n`, `\r`, `\c`) except on
//! `CONNECT`/`CONNECTED`, bodies are NUL-terminated, `content-length` is
//! honoured when present and bare EOLs between frames (heart-beats) are
//! skipped.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StompError {
    #[error("unknown STOMP command '{0}'")]
    UnknownCommand(String),

    #[error("malformed STOMP header '{0}'")]
    MalformedHeader(String),

    #[error("STOMP frame is missing its header terminator")]
    MissingHeaderEnd,

    #[error("STOMP frame is missing its NUL terminator")]
    MissingNul,

    #[error("invalid content-length '{0}'")]
    BadContentLength(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Send,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    fn escapes_headers(self) -> bool {
        !matches!(self, Command::Connect | Command::Connected)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Send => "SEND",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        };
        f.write_str(s)
    }
}

impl FromStr for Command {
    type Err = StompError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" | "STOMP" => Ok(Command::Connect),
            "CONNECTED" => Ok(Command::Connected),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "SEND" => Ok(Command::Send),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            "DISCONNECT" => Ok(Command::Disconnect),
            other => Err(StompError::UnknownCommand(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of header `name`; repeated headers keep the first.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// `CONNECT` with heart-beating disabled.
    pub fn connect(host: &str) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", "1.2,1.1")
            .header("host", host)
            .header("heart-beat", "0,0")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn send(destination: &str, json_body: &str) -> Self {
        Frame::new(Command::Send)
            .header("destination", destination)
            .header("content-type", "application/json")
            .with_body(json_body)
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    /// Human-readable reason carried by an `ERROR` frame.
    pub fn error_message(&self) -> String {
        match self.get("message") {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => self.body.trim().to_string(),
        }
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());
        out.push_str(&self.command.to_string());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() && self.get("content-length").is_none() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }
}

/// Decode every frame in `input`. Heart-beat EOLs yield no frames.
pub fn decode(input: &str) -> Result<Vec<Frame>, StompError> {
    let mut frames = Vec::new();
    let mut rest = input;
    loop {
        rest = rest.trim_start_matches(['\r', '\n']);
        if rest.is_empty() {
            break;
        }
        let (frame, remaining) = decode_one(rest)?;
        frames.push(frame);
        rest = remaining;
    }
    Ok(frames)
}

fn decode_one(input: &str) -> Result<(Frame, &str), StompError> {
    let mut offset = 0;
    let mut header_lines = Vec::new();
    let mut terminated = false;
    for line in input.split_inclusive('\n') {
        offset += line.len();
        let line = line.trim_end_matches('\n').trim_end_matches('\r');
        if line.is_empty() {
            terminated = true;
            break;
        }
        header_lines.push(line);
    }
    if !terminated {
        return Err(StompError::MissingHeaderEnd);
    }

    let mut lines = header_lines.into_iter();
    let command: Command = lines.next().unwrap_or_default().parse()?;
    let escaped = command.escapes_headers();
    let mut frame = Frame::new(command);
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
        if escaped {
            frame.headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            frame.headers.push((name.to_string(), value.to_string()));
        }
    }

    let body_region = &input[offset..];
    let (body, rest) = match frame.get("content-length") {
        Some(raw) => {
            let len: usize = raw
                .trim()
                .parse()
                .map_err(|_| StompError::BadContentLength(raw.to_string()))?;
            let body = body_region
                .get(..len)
                .ok_or_else(|| StompError::BadContentLength(raw.to_string()))?;
            let rest = body_region[len..]
                .strip_prefix('\0')
                .ok_or(StompError::MissingNul)?;
            (body, rest)
        }
        None => {
            let nul = body_region.find('\0').ok_or(StompError::MissingNul)?;
            (&body_region[..nul], &body_region[nul + 1..])
        }
    };
    frame.body = body.to_string();
    Ok((frame, rest))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::MalformedHeader(raw.to_string())),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_connect_leaves_headers_unescaped() {
        let encoded = Frame::connect("localhost").encode();
        assert_eq!(
            encoded,
            "CONNECT\naccept-version:1.2,1.1\nhost:localhost\nheart-beat:0,0\n\n\0"
        );
    }

    #[test]
    fn encode_send_adds_content_length() {
        let encoded = Frame::send("/app/chat/room/1", r#"{"content":"안녕"}"#).encode();
        let body = r#"{"content":"안녕"}"#;
        assert!(encoded.starts_with("SEND\ndestination:/app/chat/room/1\n"));
        assert!(encoded.contains(&format!("content-length:{}\n", body.len())));
        assert!(encoded.ends_with(&format!("\n\n{body}\0")));
    }

    #[test]
    fn encode_escapes_header_values() {
        let encoded = Frame::new(Command::Send)
            .header("note", "a:b\nc\\d")
            .encode();
        assert!(encoded.contains("note:a\\cb\\nc\\\\d\n"));
    }

    #[test]
    fn decode_message_frame() {
        let raw = "MESSAGE\ndestination:/topic/chat/room/1\nmessage-id:7\nsubscription:sub-0\n\n{\"content\":\"hi\"}\0";
        let frames = decode(raw).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Message);
        assert_eq!(frames[0].get("destination"), Some("/topic/chat/room/1"));
        assert_eq!(frames[0].body, "{\"content\":\"hi\"}");
    }

    #[test]
    fn decode_connected_with_crlf() {
        let frames = decode("CONNECTED\r\nversion:1.2\r\nheart-beat:0,0\r\n\r\n\0").unwrap();
        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].get("version"), Some("1.2"));
    }

    #[test]
    fn decode_honours_content_length_with_embedded_nul() {
        let raw = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let frames = decode(raw).unwrap();
        assert_eq!(frames[0].body, "a\0b");
    }

    #[test]
    fn decode_skips_heartbeats_and_splits_frames() {
        let raw = "\n\nMESSAGE\n\none\0\nMESSAGE\n\ntwo\0\n";
        let frames = decode(raw).unwrap();
        let bodies: Vec<_> = frames.iter().map(|f| f.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two"]);
        assert!(decode("\n").unwrap().is_empty());
    }

    #[test]
    fn decode_unescapes_headers_and_keeps_first_repeat() {
        let raw = "MESSAGE\nnote:a\\cb\nnote:second\n\n\0";
        let frames = decode(raw).unwrap();
        assert_eq!(frames[0].get("note"), Some("a:b"));
    }

    #[test]
    fn decode_error_frame_message() {
        let raw = "ERROR\nmessage:Access denied\n\ndetails\0";
        let frame = decode(raw).unwrap().remove(0);
        assert_eq!(frame.command, Command::Error);
        assert_eq!(frame.error_message(), "Access denied");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(decode("HELLO\n\n\0"), Err(StompError::UnknownCommand(_))));
        assert!(matches!(decode("MESSAGE\n\nno terminator"), Err(StompError::MissingNul)));
        assert!(matches!(decode("MESSAGE\nbroken"), Err(StompError::MissingHeaderEnd)));
        assert!(matches!(decode("MESSAGE\nbad\n\n\0"), Err(StompError::MalformedHeader(_))));
    }
}
