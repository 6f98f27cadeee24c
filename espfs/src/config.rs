use espfs_lib::{ChipFamily, Framework, PartitionTableSource};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default values shared by the config file and the command line
pub struct Defaults;

impl Defaults {
    pub const BAUD: u32 = 115200;
    pub const FRAMEWORK: &'static str = "arduino";
    pub const FILESYSTEM: &'static str = "littlefs";
    pub const BUILD_DIR: &'static str = "build";
    pub const UNPACK_DIR: &'static str = "unpacked_fs";
    pub const ESPTOOL: &'static str = "esptool.py";
    pub const EXTRACT_TOOL: &'static str = "littlefs-python";
}

/// Hex string such as "0x8000"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexString(pub String);

impl HexString {
    pub fn to_u32(&self) -> Result<u32, String> {
        let Some(hex_part) = self.0.strip_prefix("0x") else {
            return Err(format!("Invalid hex string format: {}", self.0));
        };

        u32::from_str_radix(hex_part, 16)
            .map_err(|e| format!("Failed to parse hex string '{}': {}", self.0, e))
    }
}

/// Location of the partition table on ESP32 chips
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionTableConfig {
    pub address: HexString,
    pub size: HexString,
}

impl PartitionTableConfig {
    pub fn to_source(&self) -> Result<PartitionTableSource, String> {
        Ok(PartitionTableSource {
            address: self
                .address
                .to_u32()
                .map_err(|e| format!("Invalid partition_table address: {}", e))?,
            size: self
                .size
                .to_u32()
                .map_err(|e| format!("Invalid partition_table size: {}", e))?,
        })
    }
}

/// Root of the JSON configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EspFsConfig {
    pub chip: String,
    /// esptool `--chip` value, defaults to the chip family
    pub mcu: Option<String>,
    pub port: Option<String>,
    #[serde(default = "default_baud")]
    pub baud: u32,
    #[serde(default = "default_framework")]
    pub framework: String,
    #[serde(default = "default_filesystem")]
    pub filesystem: String,
    pub ldscript: Option<String>,
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    #[serde(default = "default_unpack_dir")]
    pub unpack_dir: String,
    #[serde(default = "default_esptool")]
    pub esptool: String,
    #[serde(default = "default_extract_tool")]
    pub extract_tool: String,
    pub partition_table: Option<PartitionTableConfig>,
    #[serde(default)]
    pub quiet: bool,
}

fn default_baud() -> u32 {
    Defaults::BAUD
}
fn default_framework() -> String {
    Defaults::FRAMEWORK.to_string()
}
fn default_filesystem() -> String {
    Defaults::FILESYSTEM.to_string()
}
fn default_build_dir() -> String {
    Defaults::BUILD_DIR.to_string()
}
fn default_unpack_dir() -> String {
    Defaults::UNPACK_DIR.to_string()
}
fn default_esptool() -> String {
    Defaults::ESPTOOL.to_string()
}
fn default_extract_tool() -> String {
    Defaults::EXTRACT_TOOL.to_string()
}

impl EspFsConfig {
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        let config: EspFsConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Configuration with every default applied; `chip` still has to be given
    pub fn with_defaults() -> Self {
        Self {
            chip: String::new(),
            mcu: None,
            port: None,
            baud: Defaults::BAUD,
            framework: Defaults::FRAMEWORK.to_string(),
            filesystem: Defaults::FILESYSTEM.to_string(),
            ldscript: None,
            build_dir: Defaults::BUILD_DIR.to_string(),
            unpack_dir: Defaults::UNPACK_DIR.to_string(),
            esptool: Defaults::ESPTOOL.to_string(),
            extract_tool: Defaults::EXTRACT_TOOL.to_string(),
            partition_table: None,
            quiet: false,
        }
    }

    pub fn parse_chip(&self) -> Result<ChipFamily, String> {
        ChipFamily::from_str(&self.chip.to_lowercase())
            .map_err(|_| format!("Invalid chip family: '{}'", self.chip))
    }

    pub fn parse_framework(&self) -> Result<Framework, String> {
        Framework::from_str(&self.framework.to_lowercase())
            .map_err(|_| format!("Invalid framework: '{}'", self.framework))
    }

    pub fn partition_table_source(&self) -> Result<PartitionTableSource, String> {
        match &self.partition_table {
            Some(table) => table.to_source(),
            None => Ok(PartitionTableSource::default()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.parse_chip()?;
        self.parse_framework()?;
        self.partition_table_source()?;

        if self.baud == 0 {
            return Err("baud must be greater than 0".to_string());
        }

        Ok(())
    }
}
