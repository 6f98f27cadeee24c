use crate::{Error, Result};

/// A size or address as it appears in board configuration or linker scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLiteral<'a> {
    Bytes(u32),
    Text(&'a str),
}

impl From<u32> for SizeLiteral<'_> {
    fn from(value: u32) -> Self {
        SizeLiteral::Bytes(value)
    }
}

impl<'a> From<&'a str> for SizeLiteral<'a> {
    fn from(value: &'a str) -> Self {
        SizeLiteral::Text(value)
    }
}

pub struct Utils;
impl Utils {
    /// Convert a size literal into a byte count.
    ///
    /// Accepted forms are a plain integer, a decimal string (`"4096"`), a hex
    /// string (`"0x1000"`) and a decimal string with a binary `K`/`M` suffix
    /// (`"64K"`, `"4m"`). Anything else is rejected with [`Error::InvalidSize`].
    pub fn parse_size<'a>(value: impl Into<SizeLiteral<'a>>) -> Result<u32> {
        let s = match value.into() {
            SizeLiteral::Bytes(n) => return Ok(n),
            SizeLiteral::Text(s) => s.trim(),
        };
        let invalid = || Error::InvalidSize(s.to_string());

        if Self::is_decimal(s) {
            return s.parse().map_err(|_| invalid());
        }

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            return u32::from_str_radix(hex, 16).map_err(|_| invalid());
        }

        let (digits, multiplier) = match s.chars().last() {
            Some('k') | Some('K') => (&s[..s.len() - 1], 1024u32),
            Some('m') | Some('M') => (&s[..s.len() - 1], 1024 * 1024),
            _ => return Err(invalid()),
        };
        if !Self::is_decimal(digits) {
            return Err(invalid());
        }
        let base: u32 = digits.parse().map_err(|_| invalid())?;
        base.checked_mul(multiplier).ok_or_else(invalid)
    }

    /// Lower-case `0x` formatting, as esptool and the image file names expect.
    pub fn hex(value: u32) -> String {
        format!("{:#x}", value)
    }

    fn is_decimal(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
}
