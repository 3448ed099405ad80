//! Document abstractions consumed by the analysis core

use std::path::{Path, PathBuf};

use super::position::{Position, Range};
use super::symbol::Symbol;

/// Full text of one source file plus offset/position conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub uri: String,
    pub text: String,
}

impl TextDocument {
    pub fn new(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
        }
    }

    pub fn from_path(path: &Path, text: impl Into<String>) -> Self {
        Self::new(path_to_uri(path), text)
    }

    pub fn path(&self) -> PathBuf {
        uri_to_path(&self.uri)
    }

    /// Lines without their terminators (`\n` or `\r\n`)
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }

    pub fn line(&self, index: u32) -> Option<&str> {
        self.text.lines().nth(index as usize)
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// Byte offset of a position; clamps past the end of a line or document
    pub fn offset_at(&self, pos: Position) -> usize {
        let mut offset = 0;
        for (index, raw) in self.text.split_inclusive('\n').enumerate() {
            if index == pos.line as usize {
                let content = raw.trim_end_matches(['\n', '\r']);
                let within = content
                    .char_indices()
                    .nth(pos.character as usize)
                    .map(|(byte, _)| byte)
                    .unwrap_or(content.len());
                return offset + within;
            }
            offset += raw.len();
        }
        self.text.len()
    }

    /// Position of a byte offset; offsets inside a UTF-8 sequence snap back
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let mut line = 0u32;
        let mut line_start = 0usize;
        for (byte, ch) in self.text.char_indices() {
            if byte >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                line_start = byte + 1;
            }
        }
        let character = self.text[line_start..]
            .char_indices()
            .take_while(|(byte, _)| line_start + byte < offset)
            .count() as u32;
        Position::new(line, character)
    }

    /// Identifier under the cursor and its range
    pub fn word_at(&self, pos: Position) -> Option<(String, Range)> {
        let line = self.line(pos.line)?;
        let chars: Vec<char> = line.chars().collect();
        let is_word = |c: char| c.is_alphanumeric() || c == '_';

        let mut cursor = (pos.character as usize).min(chars.len());
        if cursor == chars.len() || !is_word(chars[cursor]) {
            // Cursor right after a word still selects it
            if cursor > 0 && is_word(chars[cursor - 1]) {
                cursor -= 1;
            } else {
                return None;
            }
        }

        let mut start = cursor;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = cursor;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }

        let word: String = chars[start..end].iter().collect();
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return None;
        }
        Some((word, Range::on_line(pos.line, start as u32, end as u32)))
    }
}

/// Symbol tree of another open document, supplied to cross-file checks
#[derive(Debug, Clone)]
pub struct SiblingTree {
    pub uri: String,
    pub symbols: Vec<Symbol>,
}

impl SiblingTree {
    pub fn new(uri: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        Self {
            uri: uri.into(),
            symbols,
        }
    }
}

/// Convert file path to a percent-encoded file:// URI
pub fn path_to_uri(path: &Path) -> String {
    let abs_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut uri = String::from("file://");
    for c in abs_path.to_string_lossy().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | '~') {
            uri.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                uri.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    uri
}

/// Convert file:// URI back to a path; non-file URIs are taken verbatim
pub fn uri_to_path(uri: &str) -> PathBuf {
    let Some(path) = uri.strip_prefix("file://") else {
        tracing::warn!("Not a file URI: {}", uri);
        return PathBuf::from(uri);
    };

    #[cfg(windows)]
    let path = path.strip_prefix('/').unwrap_or(path);

    PathBuf::from(percent_decode(path))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && let (Some(h), Some(l)) = (
                bytes.get(i + 1).copied().and_then(hex_value),
                bytes.get(i + 2).copied().and_then(hex_value),
            )
        {
            result.push((h << 4) | l);
            i += 3;
            continue;
        }
        result.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&result).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_position_roundtrip_on_crlf() {
        let doc = TextDocument::new("file:///a.vb", "Sub A()\r\n  Dim x\r\nEnd Sub");
        let pos = Position::new(1, 6);
        let offset = doc.offset_at(pos);
        assert_eq!(&doc.text[offset..offset + 1], "x");
        assert_eq!(doc.position_at(offset), pos);
    }

    #[test]
    fn test_offset_at_clamps() {
        let doc = TextDocument::new("file:///a.vb", "ab\ncd");
        assert_eq!(doc.offset_at(Position::new(0, 99)), 2);
        assert_eq!(doc.offset_at(Position::new(7, 0)), 5);
        assert_eq!(doc.position_at(999), Position::new(1, 2));
    }

    #[test]
    fn test_position_counts_chars() {
        let doc = TextDocument::new("file:///a.vb", "s = \"héllo\" : y");
        let offset = doc.text.find('y').unwrap();
        assert_eq!(doc.position_at(offset), Position::new(0, 14));
    }

    #[test]
    fn test_word_at() {
        let doc = TextDocument::new("file:///a.vb", "    total = Add(first, 2)");
        let (word, range) = doc.word_at(Position::new(0, 13)).unwrap();
        assert_eq!(word, "Add");
        assert_eq!(range, Range::on_line(0, 12, 15));

        let (word, _) = doc.word_at(Position::new(0, 9)).unwrap();
        assert_eq!(word, "total");

        assert!(doc.word_at(Position::new(0, 1)).is_none());
        assert!(doc.word_at(Position::new(0, 23)).is_none());
    }

    #[test]
    fn test_uri_roundtrip() {
        let path = Path::new("/work/my project/Form1.vb");
        let uri = path_to_uri(path);
        assert_eq!(uri, "file:///work/my%20project/Form1.vb");
        assert_eq!(uri_to_path(&uri), path);
    }
}
