//! PN532 host protocol constants and frame codec
//!
//! Based on the PN532 User Manual (UM0701-02), section 6.2.
//!
//! ```text
//! normal information frame:
//!   00 00 FF  LEN  LCS  TFI  PD0 .. PDn  DCS  00
//!             LEN + LCS             == 0 (mod 256)
//!             TFI + PD0 + .. + DCS  == 0 (mod 256)
//! ```

use crate::error::{Pn532Error, Result};

/// Start of packet code
pub const PREAMBLE: [u8; 3] = [0x00, 0x00, 0xFF];
/// Trailing byte of every frame
pub const POSTAMBLE: u8 = 0x00;

/// Frame identifier, host to PN532
pub const TFI_HOST: u8 = 0xD4;
/// Frame identifier, PN532 to host
pub const TFI_PN532: u8 = 0xD5;

/// ACK frame
pub const ACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];
/// NACK frame
pub const NACK_FRAME: [u8; 6] = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00];

/// Error code carried by an application level error frame
pub const ERROR_FRAME_CODE: u8 = 0x7F;

/// HSU wake-up: 0x55 0x55 followed by a long run of zeros
pub const HSU_WAKEUP: [u8; 16] = [
    0x55, 0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00,
];

// Command codes
/// Read IC type and firmware revision
pub const CMD_GET_FIRMWARE_VERSION: u8 = 0x02;
/// Configure the Security Access Module (normal mode)
pub const CMD_SAM_CONFIGURATION: u8 = 0x14;
/// RF settings
pub const CMD_RF_CONFIGURATION: u8 = 0x32;
/// Poll for targets in passive mode
pub const CMD_IN_LIST_PASSIVE_TARGET: u8 = 0x4A;
/// Act as a target (card emulation)
pub const CMD_TG_INIT_AS_TARGET: u8 = 0x8C;

/// RFConfiguration item: retry counts
pub const RF_CFG_MAX_RETRIES: u8 = 0x05;

/// InListPassiveTarget baud rate: 106 kbps type A (ISO/IEC14443 Type A)
pub const BRTY_106K_TYPE_A: u8 = 0x00;

/// TgInitAsTarget mode: only accept ISO/IEC14443-4 PICC activation
pub const TG_MODE_PICC_ONLY: u8 = 0x04;

/// Response code for a command code
pub const fn response_code(command: u8) -> u8 {
    command + 1
}

/// Decoded frame from the PN532
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Acknowledgement of the last command
    Ack,
    /// Request to resend the last frame
    Nack,
    /// Normal information frame (TFI and payload, checksums stripped)
    Data(Vec<u8>),
}

/// Build a host-to-PN532 information frame for `command` with `params`
pub fn encode_command(command: u8, params: &[u8]) -> Result<Vec<u8>> {
    let len = params.len() + 2; // TFI + command code
    if len > 0xFF {
        return Err(Pn532Error::InvalidParameter(format!(
            "command payload too long ({} bytes)",
            len
        )));
    }
    let len = len as u8;

    let mut frame = Vec::with_capacity(params.len() + 9);
    frame.extend_from_slice(&PREAMBLE);
    frame.push(len);
    frame.push(len.wrapping_neg());

    let body_start = frame.len();
    frame.push(TFI_HOST);
    frame.push(command);
    frame.extend_from_slice(params);
    let sum = frame[body_start..]
        .iter()
        .fold(0u8, |acc, &b| acc.wrapping_add(b));
    frame.push(sum.wrapping_neg());
    frame.push(POSTAMBLE);
    Ok(frame)
}

/// Decode one complete frame starting at its preamble
///
/// The postamble is not checked, some modules omit it.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < 5 || bytes[..3] != PREAMBLE {
        return Err(Pn532Error::MalformedFrame("missing preamble".to_string()));
    }

    let (len, lcs) = (bytes[3], bytes[4]);
    match (len, lcs) {
        (0x00, 0xFF) => return Ok(Frame::Ack),
        (0xFF, 0x00) => return Ok(Frame::Nack),
        _ => {}
    }
    if len.wrapping_add(lcs) != 0 {
        return Err(Pn532Error::BadChecksum("length"));
    }

    let len = len as usize;
    let body = bytes
        .get(5..5 + len)
        .ok_or_else(|| Pn532Error::MalformedFrame("truncated frame".to_string()))?;
    let dcs = *bytes
        .get(5 + len)
        .ok_or_else(|| Pn532Error::MalformedFrame("missing data checksum".to_string()))?;
    let sum = body.iter().fold(dcs, |acc, &b| acc.wrapping_add(b));
    if sum != 0 {
        return Err(Pn532Error::BadChecksum("data"));
    }

    if body == [ERROR_FRAME_CODE] {
        return Err(Pn532Error::ErrorFrame);
    }

    Ok(Frame::Data(body.to_vec()))
}

/// Strip TFI and response code from a data frame payload
pub fn response_payload(command: u8, body: &[u8]) -> Result<&[u8]> {
    match body {
        [TFI_PN532, code, rest @ ..] if *code == response_code(command) => Ok(rest),
        [TFI_PN532, code, ..] => Err(Pn532Error::UnexpectedResponse {
            expected: response_code(command),
            got: *code,
        }),
        [tfi, ..] => Err(Pn532Error::MalformedFrame(format!(
            "unexpected frame identifier 0x{:02X}",
            tfi
        ))),
        [] => Err(Pn532Error::MalformedFrame("empty frame".to_string())),
    }
}

/// Firmware information returned by GetFirmwareVersion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    /// IC type (0x32 for PN532)
    pub ic: u8,
    /// Firmware version
    pub version: u8,
    /// Firmware revision
    pub revision: u8,
    /// Supported protocols bitmap
    pub support: u8,
}

impl FirmwareVersion {
    /// Parse the GetFirmwareVersion response payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        match payload {
            [ic, version, revision, support, ..] => Ok(Self {
                ic: *ic,
                version: *version,
                revision: *revision,
                support: *support,
            }),
            _ => Err(Pn532Error::MalformedFrame(
                "short firmware version response".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_get_firmware_version() {
        // Example from the user manual
        let frame = encode_command(CMD_GET_FIRMWARE_VERSION, &[]).unwrap();
        assert_eq!(frame, [0x00, 0x00, 0xFF, 0x02, 0xFE, 0xD4, 0x02, 0x2A, 0x00]);
    }

    #[test]
    fn test_encode_sam_configuration() {
        let frame = encode_command(CMD_SAM_CONFIGURATION, &[0x01, 0x14, 0x01]).unwrap();
        assert_eq!(
            frame,
            [0x00, 0x00, 0xFF, 0x05, 0xFB, 0xD4, 0x14, 0x01, 0x14, 0x01, 0x02, 0x00]
        );
    }

    #[test]
    fn test_decode_ack_nack() {
        assert_eq!(decode_frame(&ACK_FRAME).unwrap(), Frame::Ack);
        assert_eq!(decode_frame(&NACK_FRAME).unwrap(), Frame::Nack);
    }

    #[test]
    fn test_decode_firmware_response() {
        let bytes = [
            0x00, 0x00, 0xFF, 0x06, 0xFA, 0xD5, 0x03, 0x32, 0x01, 0x06, 0x07, 0xE8, 0x00,
        ];
        let Frame::Data(body) = decode_frame(&bytes).unwrap() else {
            panic!("expected data frame");
        };
        let payload = response_payload(CMD_GET_FIRMWARE_VERSION, &body).unwrap();
        let fw = FirmwareVersion::parse(payload).unwrap();
        assert_eq!(fw.ic, 0x32);
        assert_eq!((fw.version, fw.revision), (1, 6));
    }

    #[test]
    fn test_decode_rejects_bad_checksums() {
        let mut bytes = encode_command(CMD_GET_FIRMWARE_VERSION, &[]).unwrap();
        bytes[4] ^= 0x01;
        assert!(matches!(
            decode_frame(&bytes),
            Err(Pn532Error::BadChecksum("length"))
        ));

        let mut bytes = encode_command(CMD_GET_FIRMWARE_VERSION, &[]).unwrap();
        bytes[7] ^= 0x01;
        assert!(matches!(
            decode_frame(&bytes),
            Err(Pn532Error::BadChecksum("data"))
        ));
    }

    #[test]
    fn test_decode_error_frame() {
        let bytes = [0x00, 0x00, 0xFF, 0x01, 0xFF, 0x7F, 0x81, 0x00];
        assert!(matches!(decode_frame(&bytes), Err(Pn532Error::ErrorFrame)));
    }

    #[test]
    fn test_response_payload_checks_code() {
        assert_eq!(
            response_payload(CMD_IN_LIST_PASSIVE_TARGET, &[0xD5, 0x4B, 0x00]).unwrap(),
            &[0x00]
        );
        assert!(matches!(
            response_payload(CMD_IN_LIST_PASSIVE_TARGET, &[0xD5, 0x03, 0x00]),
            Err(Pn532Error::UnexpectedResponse {
                expected: 0x4B,
                got: 0x03
            })
        ));
        assert!(response_payload(CMD_IN_LIST_PASSIVE_TARGET, &[0xD4, 0x4B]).is_err());
    }
}
