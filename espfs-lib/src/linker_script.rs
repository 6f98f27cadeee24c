//! ESP8266 linker script scanning.
//!
//! The ESP8266 has no partition table; the filesystem bounds are baked into
//! the board's linker script as `PROVIDE` assignments:
//!
//! ```text
//! PROVIDE ( _FS_start = 0x40300000 );
//! PROVIDE ( _FS_end = 0x411FA000 );
//! PROVIDE ( _FS_page = 0x100 );
//! PROVIDE ( _FS_block = 0x2000 );
//! ```

use crate::utils::Utils;
use crate::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Symbol suffixes that must all be present to locate the filesystem.
pub const REQUIRED_SUFFIXES: [&str; 4] = ["start", "end", "page", "block"];

/// Build framework the linker script was generated for. It decides the
/// symbol family the filesystem bounds are published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[strum(serialize_all = "lowercase")]
pub enum Framework {
    /// Arduino core: `_FS_<suffix>`
    Arduino,
    /// Espressif SDKs: `_SPIFFS_<suffix>`
    Sdk,
}

impl Framework {
    pub fn symbol_prefix(&self) -> &'static str {
        match self {
            Framework::Arduino => "FS",
            Framework::Sdk => "SPIFFS",
        }
    }
}

/// Everything a linker script says about the filesystem and the app size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkerSymbolSet {
    /// Raw values keyed by lower-cased suffix, e.g. `start` for `_FS_start`.
    pub symbols: BTreeMap<String, u32>,
    pub app_size: Option<u32>,
    /// Advisory, from the `.flash.<size>` part of the script's file name.
    pub flash_size: Option<u32>,
}

/// Raw (untranslated) filesystem bounds, all four present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsSymbols {
    pub start: u32,
    pub end: u32,
    pub page: u32,
    pub block: u32,
}

impl LinkerSymbolSet {
    pub fn get(&self, suffix: &str) -> Option<u32> {
        self.symbols.get(suffix).copied()
    }

    /// Fail with every missing required suffix named.
    pub fn require(&self) -> Result<FsSymbols> {
        let missing: Vec<String> = REQUIRED_SUFFIXES
            .iter()
            .filter(|suffix| !self.symbols.contains_key(**suffix))
            .map(|suffix| suffix.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingLinkerSymbol { missing });
        }

        let value = |suffix: &str| self.symbols.get(suffix).copied().unwrap_or_default();
        Ok(FsSymbols {
            start: value("start"),
            end: value("end"),
            page: value("page"),
            block: value("block"),
        })
    }
}

pub struct LinkerScriptParser {
    app_size: Regex,
    filesystem: Regex,
    flash_size: Regex,
}

impl LinkerScriptParser {
    pub fn new(framework: Framework) -> Result<Self> {
        let app_size = Regex::new(r"(?i)irom0_0_seg\s*:.+len\s*=\s*(?P<len>0x[\da-f]+)")?;
        let filesystem = Regex::new(&format!(
            r"(?i)PROVIDE\s*\(\s*_{}_(?P<suffix>\w+)\s*=\s*(?P<value>0x[\da-f]+)\s*\)",
            framework.symbol_prefix()
        ))?;
        let flash_size = Regex::new(r"\.flash\.(?P<size>\d+[mk]).*\.ld")?;

        Ok(Self {
            app_size,
            filesystem,
            flash_size,
        })
    }

    /// Scan `text`, the contents of the linker script at `path`.
    ///
    /// Every line is looked at independently, so statement order does not
    /// matter. Repeated declarations keep the last value.
    pub fn parse(&self, path: &str, text: &str) -> Result<LinkerSymbolSet> {
        let mut result = LinkerSymbolSet {
            flash_size: self.flash_size_hint(path),
            ..Default::default()
        };

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("/*") {
                continue;
            }

            if let Some(caps) = self.app_size.captures(line) {
                result.app_size = Some(Utils::parse_size(&caps["len"])?);
                continue;
            }

            if let Some(caps) = self.filesystem.captures(line) {
                let suffix = caps["suffix"].to_ascii_lowercase();
                let value = Utils::parse_size(&caps["value"])?;
                tracing::debug!("Linker symbol {} = 0x{:x}", suffix, value);
                result.symbols.insert(suffix, value);
            }
        }

        Ok(result)
    }

    fn flash_size_hint(&self, path: &str) -> Option<u32> {
        let caps = self.flash_size.captures(path)?;
        match Utils::parse_size(&caps["size"]) {
            Ok(size) => Some(size),
            Err(e) => {
                tracing::warn!("Ignoring flash size in linker script name '{}': {}", path, e);
                None
            }
        }
    }
}
