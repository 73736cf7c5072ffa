//! Button state command

use super::{open_for, CmdResult};
use crate::config::Config;
use crate::signal;
use flipperpi_core::ButtonState;
use std::time::Duration;

/// Button sampling period in watch mode
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn describe(button: &ButtonState) -> String {
    format!(
        "GPIO{}: {}",
        button.pin,
        if button.pressed { "pressed" } else { "released" }
    )
}

/// Print the buttons once, or every change until interrupted
///
/// While watching, the status LED is lit whenever a button is held.
pub fn cmd_buttons(config: &Config, watch: bool) -> CmdResult {
    let mut device = open_for(config, &[])?;

    let mut last = device.read_buttons()?;
    for button in &last {
        println!("{}", describe(button));
    }
    if !watch {
        return Ok(());
    }

    println!("Watching buttons, press Ctrl-C to stop");
    while !signal::sleep(POLL_INTERVAL) {
        let now = device.read_buttons()?;
        for button in now.iter().filter(|b| !last.contains(b)) {
            println!("{}", describe(button));
        }
        device.set_led(now.iter().any(|b| b.pressed))?;
        last = now;
    }

    device.cleanup();
    Ok(())
}
