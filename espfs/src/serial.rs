use anyhow::{Result, anyhow, bail};

/// Convert macOS /dev/tty.* ports to /dev/cu.* ports
///
/// On macOS, /dev/tty.* ports block on open until carrier detect, esptool
/// wants the /dev/cu.* callout device instead.
fn normalize_mac_port_name(port_name: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        if port_name.starts_with("/dev/tty.") {
            return port_name.replace("/dev/tty.", "/dev/cu.");
        }
    }
    port_name.to_string()
}

pub fn normalize_port_name(port_name: &str) -> String {
    normalize_mac_port_name(port_name)
}

fn available_port_names() -> Result<Vec<String>> {
    let ports = serialport::available_ports()
        .map_err(|e| anyhow!("Failed to get available ports list: {}", e))?;

    // On macOS, only use /dev/cu.* ports, not /dev/tty.* ports
    #[cfg(target_os = "macos")]
    let ports: Vec<_> = ports
        .into_iter()
        .filter(|port| !port.port_name.starts_with("/dev/tty."))
        .collect();

    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Check that `port_name` is one of the available serial ports
pub fn check_port_available(port_name: &str) -> Result<()> {
    let available_ports = available_port_names()?;
    if available_ports.iter().any(|p| p == port_name) {
        return Ok(());
    }

    bail!(
        "The specified port '{}' does not exist. Available ports: {}",
        port_name,
        if available_ports.is_empty() {
            "No available ports".to_string()
        } else {
            available_ports.join(", ")
        }
    )
}

/// Use the given port, or the first available one when none is given
pub fn resolve_port(port: Option<&str>) -> Result<String> {
    if let Some(port) = port {
        let port = normalize_port_name(port);
        check_port_available(&port)?;
        return Ok(port);
    }

    let available_ports = available_port_names()?;
    match available_ports.into_iter().next() {
        Some(port) => {
            tracing::info!("Auto-detected serial port {}", port);
            Ok(port)
        }
        None => bail!("No serial port found, connect the board or pass --port"),
    }
}
