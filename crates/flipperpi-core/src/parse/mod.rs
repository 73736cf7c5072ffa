//! Parsers for Linux tool output
//!
//! The scanners shell out to the standard wireless and BlueZ utilities and
//! hand their standard output to these functions. Keeping the parsers here
//! lets them be tested against captured output without any radio.

mod hcitool;
mod iwlist;
mod sdptool;

pub use hcitool::{is_bdaddr, parse_hcitool_scan};
pub use iwlist::parse_iwlist;
pub use sdptool::parse_sdptool_browse;
