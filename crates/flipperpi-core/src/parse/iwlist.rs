//! `iwlist <iface> scan` output parsing

use crate::types::WifiNetwork;

/// Parse the output of `iwlist <iface> scan`
///
/// Every `Cell NN - Address:` line starts a new network. A network is only
/// reported once its `ESSID` line has been seen, so cells without one are
/// dropped. `ESSID` lines without a quoted value are skipped rather than
/// failing the whole scan.
pub fn parse_iwlist(output: &str) -> Vec<WifiNetwork> {
    let mut networks = Vec::new();
    let mut current: Option<WifiNetwork> = None;
    let mut has_essid = false;

    for line in output.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("Cell ") {
            if let Some(net) = current.take() {
                if has_essid {
                    networks.push(net);
                }
            }
            has_essid = false;
            current = Some(WifiNetwork {
                bssid: rest
                    .split_once("Address:")
                    .map(|(_, addr)| addr.trim().to_string()),
                ..Default::default()
            });
            continue;
        }

        if line.contains("ESSID") {
            let Some(ssid) = line.split('"').nth(1) else {
                log::debug!("iwlist: ignoring unquoted ESSID line: {}", line);
                continue;
            };
            // A second ESSID without a new cell header is a separate network
            if has_essid {
                if let Some(net) = current.take() {
                    networks.push(net);
                }
            }
            current.get_or_insert_with(WifiNetwork::default).ssid = ssid.to_string();
            has_essid = true;
            continue;
        }

        let Some(net) = current.as_mut() else {
            continue;
        };

        if let Some(channel) = line.strip_prefix("Channel:") {
            net.channel = channel.trim().parse().ok();
        } else if line.starts_with("Quality") || line.contains("Signal level") {
            parse_quality_line(line, net);
        } else if let Some(state) = line.strip_prefix("Encryption key:") {
            net.encrypted = match state.trim() {
                "on" => Some(true),
                "off" => Some(false),
                _ => None,
            };
        }
    }

    if let Some(net) = current {
        if has_essid {
            networks.push(net);
        }
    }

    networks
}

/// Handle `Quality=70/70  Signal level=-40 dBm`
fn parse_quality_line(line: &str, net: &mut WifiNetwork) {
    if let Some(q) = value_after(line, &["Quality=", "Quality:"]) {
        let token = q.split_whitespace().next().unwrap_or_default();
        if let Some((value, max)) = token.split_once('/') {
            if let (Ok(value), Ok(max)) = (value.parse(), max.parse()) {
                net.quality = Some((value, max));
            }
        }
    }
    if let Some(level) = value_after(line, &["Signal level=", "Signal level:"]) {
        if let Some((dbm, _)) = level.split_once("dBm") {
            net.signal_dbm = dbm.trim().parse().ok();
        }
    }
}

fn value_after<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| line.find(key).map(|i| &line[i + key.len()..]))
}
