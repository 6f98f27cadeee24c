//! Reading flash contents back from the device.

use crate::utils::Utils;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Anything that can copy a flash range from the device into a local file.
pub trait FlashReader {
    /// Read `size` bytes starting at flash offset `address` into `output`.
    fn read_to_file(&mut self, address: u32, size: u32, output: &Path) -> Result<()>;
}

impl<T: FlashReader + ?Sized> FlashReader for &mut T {
    fn read_to_file(&mut self, address: u32, size: u32, output: &Path) -> Result<()> {
        (**self).read_to_file(address, size, output)
    }
}

/// [`FlashReader`] backed by esptool's `read_flash` command.
#[derive(Debug, Clone)]
pub struct EsptoolReader {
    pub program: PathBuf,
    /// Value for `--chip`, e.g. `esp32s3` or `esp8266`.
    pub chip: String,
    pub port: String,
    pub baud: u32,
}

impl EsptoolReader {
    pub fn args(&self, address: u32, size: u32, output: &Path) -> Vec<String> {
        vec![
            "--chip".to_string(),
            self.chip.clone(),
            "--port".to_string(),
            self.port.clone(),
            "--baud".to_string(),
            self.baud.to_string(),
            "--before".to_string(),
            "default_reset".to_string(),
            "--after".to_string(),
            "hard_reset".to_string(),
            "read_flash".to_string(),
            Utils::hex(address),
            Utils::hex(size),
            output.to_string_lossy().into_owned(),
        ]
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl FlashReader for EsptoolReader {
    fn read_to_file(&mut self, address: u32, size: u32, output: &Path) -> Result<()> {
        let args = self.args(address, size, output);
        tracing::info!("Running {} {}", self.tool_name(), args.join(" "));

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| Error::read_failure(self.tool_name(), format!("failed to start: {}", e)))?;

        if !status.success() {
            return Err(Error::read_failure(
                self.tool_name(),
                format!("exited with {}", status),
            ));
        }
        if !output.is_file() {
            return Err(Error::read_failure(
                self.tool_name(),
                format!(
                    "{} was not written, the baud rate may be too high",
                    output.display()
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esptool_arguments() {
        let reader = EsptoolReader {
            program: PathBuf::from("esptool.py"),
            chip: "esp32s3".to_string(),
            port: "/dev/ttyUSB0".to_string(),
            baud: 115200,
        };
        let args = reader.args(0x290000, 0x160000, Path::new("fs.bin"));
        assert_eq!(
            args,
            [
                "--chip",
                "esp32s3",
                "--port",
                "/dev/ttyUSB0",
                "--baud",
                "115200",
                "--before",
                "default_reset",
                "--after",
                "hard_reset",
                "read_flash",
                "0x290000",
                "0x160000",
                "fs.bin",
            ]
        );
    }
}
