//! Text encodings for file contents.
//!
//! Reads decode bytes into text and writes encode text into bytes. Neither
//! direction is lossy: content that does not fit the encoding is rejected.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use super::error::{FsError, FsResult};

/// A supported file content encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 text.
    #[default]
    Utf8,
    /// 7-bit ASCII text.
    Ascii,
    /// ISO-8859-1: one byte per code point up to U+00FF.
    Latin1,
    /// Raw bytes carried as standard base64 text.
    Base64,
}

impl Encoding {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin1",
            Self::Base64 => "base64",
        }
    }

    /// Names accepted in tool schemas.
    #[must_use]
    pub const fn schema_names() -> &'static [&'static str] {
        &["utf8", "utf-8", "ascii", "latin1", "binary", "base64"]
    }

    /// Decodes file bytes into text.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidContent`] if the bytes are not valid for
    /// this encoding.
    pub fn decode(self, bytes: &[u8]) -> FsResult<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| FsError::invalid_content(self, e.to_string())),
            Self::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(FsError::invalid_content(
                    self,
                    format!("non-ASCII byte at offset {offset}"),
                )),
                // All bytes are ASCII, so this cannot fail
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Self::Latin1 => Ok(encoding_rs::mem::decode_latin1(bytes).into_owned()),
            Self::Base64 => Ok(BASE64_STANDARD.encode(bytes)),
        }
    }

    /// Encodes text into file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FsError::InvalidContent`] if the text cannot be represented
    /// in this encoding, or is not valid base64 for [`Encoding::Base64`].
    pub fn encode(self, text: &str) -> FsResult<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii => match text.char_indices().find(|(_, c)| !c.is_ascii()) {
                Some((offset, c)) => Err(FsError::invalid_content(
                    self,
                    format!("character {c:?} at offset {offset} is outside ASCII"),
                )),
                None => Ok(text.as_bytes().to_vec()),
            },
            Self::Latin1 => {
                if !encoding_rs::mem::is_str_latin1(text) {
                    let offset = encoding_rs::mem::str_latin1_up_to(text);
                    return Err(FsError::invalid_content(
                        self,
                        format!("character at offset {offset} is above U+00FF"),
                    ));
                }
                Ok(encoding_rs::mem::encode_latin1_lossy(text).into_owned())
            }
            Self::Base64 => BASE64_STANDARD
                .decode(text.trim())
                .map_err(|e| FsError::invalid_content(self, e.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "ascii" | "us-ascii" => Ok(Self::Ascii),
            "latin1" | "latin-1" | "binary" | "iso-8859-1" => Ok(Self::Latin1),
            "base64" => Ok(Self::Base64),
            _ => Err(FsError::UnsupportedEncoding {
                name: s.to_string(),
            }),
        }
    }
}
