//! List audio input devices.

use anyhow::Result;

pub fn run() -> Result<()> {
    let devices = hum_core::list_input_devices()?;
    for device in devices {
        if device.is_default {
            println!("* {} (default)", device.name);
        } else {
            println!("  {}", device.name);
        }
    }
    Ok(())
}
