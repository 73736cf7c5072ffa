//! `hcitool scan` output parsing

use crate::types::BluetoothDevice;

/// Check that `s` looks like `AA:BB:CC:DD:EE:FF`
pub fn is_bdaddr(s: &str) -> bool {
    let octets: Vec<&str> = s.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse the output of `hcitool scan`
///
/// ```text
/// Scanning ...
///         AA:BB:CC:DD:EE:FF       Living Room Speaker
///         11:22:33:44:55:66       n/a
/// ```
///
/// Lines that do not start with a device address are ignored. A name of
/// `n/a` means the name lookup failed.
pub fn parse_hcitool_scan(output: &str) -> Vec<BluetoothDevice> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (addr, name) = match line.split_once(char::is_whitespace) {
                Some((addr, name)) => (addr, name.trim()),
                None => (line, ""),
            };
            if !is_bdaddr(addr) {
                return None;
            }
            let name = match name {
                "" | "n/a" => None,
                name => Some(name),
            };
            Some(BluetoothDevice::new(addr.to_uppercase(), name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_bdaddr() {
        assert!(is_bdaddr("AA:BB:CC:DD:EE:FF"));
        assert!(is_bdaddr("0a:1b:2c:3d:4e:5f"));
        assert!(!is_bdaddr("AA:BB:CC:DD:EE"));
        assert!(!is_bdaddr("AA:BB:CC:DD:EE:GG"));
        assert!(!is_bdaddr("Scanning"));
    }

    #[test]
    fn test_parse_scan() {
        let out = "Scanning ...\n\
                   \tAA:BB:CC:DD:EE:FF\tLiving Room Speaker\n\
                   \t11:22:33:44:55:66\tn/a\n\
                   \tde:ad:be:ef:00:01\n";
        let devices = parse_hcitool_scan(out);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(devices[0].name.as_deref(), Some("Living Room Speaker"));
        assert_eq!(devices[1].name, None);
        assert_eq!(devices[2].address, "DE:AD:BE:EF:00:01");
        assert_eq!(devices[2].name, None);
        assert!(devices.iter().all(|d| d.services.is_empty()));
    }

    #[test]
    fn test_parse_nothing_found() {
        assert!(parse_hcitool_scan("Scanning ...\n").is_empty());
    }
}
