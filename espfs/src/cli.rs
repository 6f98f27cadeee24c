use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use espfs_lib::{
    ChipFamily, EsptoolReader, Framework, LinkerScriptSource, LittlefsPythonExtractor,
    PartitionTableSource, RegionSource,
};
use std::path::PathBuf;

use crate::config::EspFsConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download and unpack the LittleFS partition of an ESP32/ESP8266", long_about = None)]
pub struct Cli {
    /// JSON configuration file path
    #[arg(long = "config", short = 'f')]
    pub config: Option<String>,

    /// Target chip family
    #[arg(short = 'c', long = "chip", value_enum)]
    pub chip: Option<ChipFamily>,

    /// esptool `--chip` value, e.g. esp32s3 (default: the chip family)
    #[arg(long = "mcu")]
    pub mcu: Option<String>,

    /// Serial port device (default: first available port)
    #[arg(short = 'p', long = "port")]
    pub port: Option<String>,

    /// Serial port baud rate used when reading (default: 115200)
    #[arg(short = 'b', long = "baud")]
    pub baud: Option<u32>,

    /// Framework the ESP8266 linker script was generated for (default: arduino)
    #[arg(long = "framework", value_enum)]
    pub framework: Option<Framework>,

    /// Filesystem the board declares (default: littlefs)
    #[arg(long = "filesystem")]
    pub filesystem: Option<String>,

    /// ESP8266 linker script holding the filesystem symbols
    #[arg(long = "ldscript")]
    pub ldscript: Option<String>,

    /// Directory for the downloaded image (default: build)
    #[arg(long = "build-dir")]
    pub build_dir: Option<String>,

    /// Directory the filesystem is unpacked into, replaced on each run (default: unpacked_fs)
    #[arg(long = "unpack-dir")]
    pub unpack_dir: Option<String>,

    /// esptool executable (default: esptool.py)
    #[arg(long = "esptool")]
    pub esptool: Option<String>,

    /// littlefs-python executable (default: littlefs-python)
    #[arg(long = "extract-tool")]
    pub extract_tool: Option<String>,

    /// Suppress progress output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the filesystem region without downloading it
    #[command(name = "resolve")]
    Resolve,

    /// Download the filesystem image and unpack it
    #[command(name = "download")]
    Download,
}

/// Command line and config file merged, command line first
#[derive(Debug, Clone)]
pub struct Settings {
    pub chip: ChipFamily,
    pub mcu: String,
    pub port: Option<String>,
    pub baud: u32,
    pub framework: Framework,
    pub filesystem: String,
    pub ldscript: Option<PathBuf>,
    pub build_dir: PathBuf,
    pub unpack_dir: PathBuf,
    pub esptool: PathBuf,
    pub extract_tool: PathBuf,
    pub partition_table: PartitionTableSource,
    pub quiet: bool,
}

impl Settings {
    /// Reading from the device is needed to download, and on ESP32 also to resolve
    pub fn needs_device(&self, command: &Commands) -> bool {
        *command == Commands::Download || self.chip == ChipFamily::Esp32
    }

    pub fn region_source(&self) -> Result<RegionSource> {
        match self.chip {
            ChipFamily::Esp32 => Ok(RegionSource::PartitionTable(self.partition_table)),
            ChipFamily::Esp8266 => {
                let Some(ldscript) = &self.ldscript else {
                    bail!("ESP8266 needs a linker script, pass --ldscript or set `ldscript` in the config file");
                };
                let source = LinkerScriptSource::load(ldscript, self.framework, &self.filesystem)
                    .map_err(|e| anyhow!("Failed to read linker script '{}': {}", ldscript.display(), e))?;
                Ok(RegionSource::LinkerScript(source))
            }
        }
    }

    pub fn esptool_reader(&self, port: String) -> EsptoolReader {
        EsptoolReader {
            program: self.esptool.clone(),
            chip: self.mcu.clone(),
            port,
            baud: self.baud,
        }
    }

    pub fn extractor(&self) -> LittlefsPythonExtractor {
        LittlefsPythonExtractor {
            program: self.extract_tool.clone(),
        }
    }
}

/// Merge CLI arguments with configuration file, CLI args take precedence
pub fn merge_config(args: &Cli, config: Option<EspFsConfig>) -> Result<Settings> {
    let base_config = config.unwrap_or_else(EspFsConfig::with_defaults);

    let chip = match args.chip {
        Some(chip) => chip,
        None if base_config.chip.is_empty() => {
            bail!("Chip family must be specified either via --chip or in config file")
        }
        None => base_config
            .parse_chip()
            .map_err(|e| anyhow!("Invalid chip in config: {}", e))?,
    };

    let framework = match args.framework {
        Some(framework) => framework,
        None => base_config
            .parse_framework()
            .map_err(|e| anyhow!("Invalid framework in config: {}", e))?,
    };

    let partition_table = base_config
        .partition_table_source()
        .map_err(|e| anyhow!("Invalid partition table in config: {}", e))?;

    let mcu = args
        .mcu
        .clone()
        .or_else(|| base_config.mcu.clone())
        .unwrap_or_else(|| chip.to_string())
        .to_lowercase();

    let baud = args.baud.unwrap_or(base_config.baud);
    if baud == 0 {
        bail!("Baud rate must be greater than 0");
    }

    Ok(Settings {
        chip,
        mcu,
        port: args.port.clone().or_else(|| base_config.port.clone()),
        baud,
        framework,
        filesystem: args
            .filesystem
            .clone()
            .unwrap_or_else(|| base_config.filesystem.clone()),
        ldscript: args
            .ldscript
            .clone()
            .or_else(|| base_config.ldscript.clone())
            .map(PathBuf::from),
        build_dir: PathBuf::from(
            args.build_dir
                .clone()
                .unwrap_or_else(|| base_config.build_dir.clone()),
        ),
        unpack_dir: PathBuf::from(
            args.unpack_dir
                .clone()
                .unwrap_or_else(|| base_config.unpack_dir.clone()),
        ),
        esptool: PathBuf::from(
            args.esptool
                .clone()
                .unwrap_or_else(|| base_config.esptool.clone()),
        ),
        extract_tool: PathBuf::from(
            args.extract_tool
                .clone()
                .unwrap_or_else(|| base_config.extract_tool.clone()),
        ),
        partition_table,
        quiet: args.quiet || base_config.quiet,
    })
}
