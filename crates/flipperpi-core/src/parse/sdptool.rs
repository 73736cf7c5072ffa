//! `sdptool browse <addr>` output parsing

use crate::types::BluetoothService;

/// Parse the output of `sdptool browse <addr>`
///
/// Records are separated by blank lines. Within a record, `Service Name:`
/// gives the name, the last quoted entry under `Protocol Descriptor List:`
/// gives the protocol and a `Channel:` line gives the RFCOMM channel.
pub fn parse_sdptool_browse(output: &str) -> Vec<BluetoothService> {
    let mut services = Vec::new();
    let mut current: Option<BluetoothService> = None;
    let mut in_protocols = false;

    for raw in output.lines() {
        let indented = raw.starts_with(char::is_whitespace);
        let line = raw.trim();

        if line.is_empty() {
            services.extend(current.take());
            in_protocols = false;
            continue;
        }

        if !indented {
            in_protocols = line.starts_with("Protocol Descriptor List");
        }

        if let Some(name) = line.strip_prefix("Service Name:") {
            current.get_or_insert_with(BluetoothService::default).name =
                Some(name.trim().to_string());
        } else if line.starts_with("Service RecHandle:") {
            current.get_or_insert_with(BluetoothService::default);
        } else if let Some(channel) = line.strip_prefix("Channel:") {
            if let Some(svc) = current.as_mut() {
                svc.channel = channel.trim().parse().ok();
            }
        } else if in_protocols && indented && line.starts_with('"') {
            if let (Some(svc), Some(proto)) = (current.as_mut(), line.split('"').nth(1)) {
                svc.protocol = Some(proto.to_string());
            }
        }
    }
    services.extend(current);

    services
}
