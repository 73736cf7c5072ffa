//! PN532 device implementation
//!
//! This module provides the `Pn532` struct that implements the PN532 host
//! protocol and the `NfcReader` and `RfidEmulator` traits.

use crate::error::{Pn532Error, Result};
use crate::protocol::*;
use crate::transport::serial::SerialTransport;
use crate::transport::Transport;

use flipperpi_core::error::Result as CoreResult;
use flipperpi_core::{EmulationOutcome, NfcRead, NfcReader, NfcTag, RfidEmulator, RfidTag};

use std::time::Duration;

/// Time allowed for the ACK after a command
const ACK_TIMEOUT: Duration = Duration::from_millis(100);
/// Time allowed between bytes of one frame
const BYTE_TIMEOUT: Duration = Duration::from_millis(50);
/// Time allowed for ordinary command responses
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);
/// Time allowed for a polling cycle
const LIST_TIMEOUT: Duration = Duration::from_secs(1);
/// Garbage bytes tolerated before a preamble
const MAX_SYNC_BYTES: usize = 64;

/// Default time to wait for a reader during emulation
pub const DEFAULT_EMULATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for opening a PN532 on a serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pn532Config {
    /// Serial device (e.g., "/dev/ttyS0")
    pub device: String,
    /// Baud rate (None for 115200)
    pub baud: Option<u32>,
    /// How long emulation waits for a reader
    pub emulate_timeout: Duration,
}

/// PN532 NFC controller
pub struct Pn532<T: Transport> {
    transport: T,
    firmware: FirmwareVersion,
    emulate_timeout: Duration,
}

impl Pn532<SerialTransport> {
    /// Open a PN532 on a serial port and initialise it
    pub fn open(config: &Pn532Config) -> Result<Self> {
        let transport = SerialTransport::open(&config.device, config.baud)?;
        let mut pn532 = Self::new(transport)?;
        pn532.emulate_timeout = config.emulate_timeout;
        Ok(pn532)
    }
}

impl<T: Transport> Pn532<T> {
    /// Create a new PN532 instance with the given transport
    ///
    /// This performs initialization:
    /// 1. Wake the chip from power down (HSU preamble)
    /// 2. Put the SAM in normal mode
    /// 3. Limit passive activation retries so polls return promptly
    /// 4. Query the firmware version
    pub fn new(transport: T) -> Result<Self> {
        let mut pn532 = Self {
            transport,
            firmware: FirmwareVersion {
                ic: 0,
                version: 0,
                revision: 0,
                support: 0,
            },
            emulate_timeout: DEFAULT_EMULATE_TIMEOUT,
        };

        pn532.transport.write(&HSU_WAKEUP)?;

        // Normal mode, virtual card timeout 50ms * 0x14, use IRQ
        pn532.command(CMD_SAM_CONFIGURATION, &[0x01, 0x14, 0x01], RESPONSE_TIMEOUT)?;
        log::debug!("pn532: SAM configured");

        // MxRtyATR, MxRtyPSL, MxRtyPassiveActivation
        pn532.command(
            CMD_RF_CONFIGURATION,
            &[RF_CFG_MAX_RETRIES, 0xFF, 0x01, 0x02],
            RESPONSE_TIMEOUT,
        )?;

        let payload = pn532.command(CMD_GET_FIRMWARE_VERSION, &[], RESPONSE_TIMEOUT)?;
        pn532.firmware = FirmwareVersion::parse(&payload)?;
        if pn532.firmware.ic != 0x32 {
            log::warn!(
                "pn532: Unexpected IC type 0x{:02X}, continuing anyway",
                pn532.firmware.ic
            );
        }
        log::info!(
            "pn532: Firmware {}.{} (support 0x{:02X})",
            pn532.firmware.version,
            pn532.firmware.revision,
            pn532.firmware.support
        );

        Ok(pn532)
    }

    /// Set how long emulation waits for a reader
    pub fn with_emulate_timeout(mut self, timeout: Duration) -> Self {
        self.emulate_timeout = timeout;
        self
    }

    /// Firmware information read at initialization
    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    /// Poll once for an ISO14443A tag
    pub fn read_passive_target(&mut self) -> Result<NfcRead> {
        match self.command(
            CMD_IN_LIST_PASSIVE_TARGET,
            &[0x01, BRTY_106K_TYPE_A],
            LIST_TIMEOUT,
        ) {
            Ok(payload) => parse_passive_target(&payload),
            Err(Pn532Error::Timeout) => {
                log::debug!("pn532: Poll timed out, aborting");
                self.abort()?;
                Ok(NfcRead::NoTag)
            }
            Err(e) => Err(e),
        }
    }

    /// Act as an ISO14443A PICC until a reader activates us or the timeout
    /// expires
    pub fn init_as_target(&mut self, uid: &[u8]) -> Result<EmulationOutcome> {
        let params = tg_init_as_target_params(uid)?;
        match self.command(CMD_TG_INIT_AS_TARGET, &params, self.emulate_timeout) {
            Ok(payload) => {
                log::info!(
                    "pn532: Activated by reader (mode 0x{:02X})",
                    payload.first().copied().unwrap_or_default()
                );
                Ok(EmulationOutcome::Activated)
            }
            Err(Pn532Error::Timeout) => {
                self.abort()?;
                Ok(EmulationOutcome::NoReader)
            }
            Err(e) => Err(e),
        }
    }

    /// Send a command and return the response payload (after the response code)
    pub fn command(&mut self, command: u8, params: &[u8], timeout: Duration) -> Result<Vec<u8>> {
        let frame = encode_command(command, params)?;
        self.transport.clear_input()?;
        self.transport.write(&frame)?;

        match self.read_frame(ACK_TIMEOUT) {
            Ok(Frame::Ack) => {}
            Ok(Frame::Nack) => return Err(Pn532Error::Nack),
            Ok(Frame::Data(_)) | Err(Pn532Error::Timeout) => {
                return Err(Pn532Error::NoAck(command))
            }
            Err(e) => return Err(e),
        }

        match self.read_frame(timeout)? {
            Frame::Data(body) => Ok(response_payload(command, &body)?.to_vec()),
            Frame::Nack => Err(Pn532Error::Nack),
            Frame::Ack => Err(Pn532Error::MalformedFrame(
                "ACK where a response was expected".to_string(),
            )),
        }
    }

    /// Abort the running command (an ACK from the host cancels it)
    fn abort(&mut self) -> Result<()> {
        self.transport.write(&ACK_FRAME)
    }

    /// Read one frame, skipping anything before the preamble
    fn read_frame(&mut self, timeout: Duration) -> Result<Frame> {
        let mut byte = [0u8; 1];
        let mut prev = 0xFFu8;
        let mut wait = timeout;
        let mut skipped = 0;

        loop {
            self.transport.read(&mut byte, wait)?;
            wait = BYTE_TIMEOUT;
            if prev == 0x00 && byte[0] == 0xFF {
                break;
            }
            prev = byte[0];
            skipped += 1;
            if skipped > MAX_SYNC_BYTES {
                return Err(Pn532Error::MalformedFrame("no preamble".to_string()));
            }
        }

        let mut header = [0u8; 2];
        self.transport.read(&mut header, BYTE_TIMEOUT)?;

        let mut frame = PREAMBLE.to_vec();
        frame.extend_from_slice(&header);

        let remaining = match header {
            [0x00, 0xFF] | [0xFF, 0x00] => 0,
            [len, _] => len as usize + 1,
        };
        if remaining > 0 {
            let mut rest = vec![0u8; remaining];
            self.transport.read(&mut rest, BYTE_TIMEOUT)?;
            frame.extend_from_slice(&rest);
        }

        // Postamble
        if let Err(e) = self.transport.read(&mut byte, BYTE_TIMEOUT) {
            log::trace!("pn532: No postamble: {}", e);
        }

        decode_frame(&frame)
    }
}

/// Parse the InListPassiveTarget payload for 106 kbps type A
pub fn parse_passive_target(payload: &[u8]) -> Result<NfcRead> {
    match payload {
        [0, ..] => Ok(NfcRead::NoTag),
        [_nb_tg, _tg, sens_hi, sens_lo, sel_res, uid_len, rest @ ..]
            if rest.len() >= *uid_len as usize =>
        {
            Ok(NfcRead::Tag(NfcTag {
                uid: rest[..*uid_len as usize].to_vec(),
                sens_res: u16::from_be_bytes([*sens_hi, *sens_lo]),
                sel_res: *sel_res,
            }))
        }
        _ => Err(Pn532Error::MalformedFrame(
            "short passive target response".to_string(),
        )),
    }
}

/// Build TgInitAsTarget parameters presenting `uid`
///
/// The PN532 only lets the host choose three bytes of the UID; the first
/// byte is always 0x08 (random UID). Bytes 1..4 of `uid` are used.
pub fn tg_init_as_target_params(uid: &[u8]) -> Result<Vec<u8>> {
    if uid.len() < 4 {
        return Err(Pn532Error::InvalidParameter(format!(
            "UID too short for emulation ({} bytes)",
            uid.len()
        )));
    }
    if uid.len() != 4 || uid[0] != 0x08 {
        log::warn!(
            "pn532: Only a 4-byte UID starting with 0x08 can be emulated, presenting 08:{:02X}:{:02X}:{:02X}",
            uid[1],
            uid[2],
            uid[3]
        );
    }

    let mut params = Vec::with_capacity(37);
    params.push(TG_MODE_PICC_ONLY);
    // MifareParams: SENS_RES, NFCID1t, SEL_RES
    params.extend_from_slice(&[0x04, 0x00]);
    params.extend_from_slice(&uid[1..4]);
    params.push(0x20);
    // FeliCaParams (unused)
    params.extend_from_slice(&[0u8; 18]);
    // NFCID3t (unused)
    params.extend_from_slice(&[0u8; 10]);
    // No general bytes, no historical bytes
    params.push(0x00);
    params.push(0x00);
    Ok(params)
}

impl<T: Transport> NfcReader for Pn532<T> {
    fn read(&mut self) -> CoreResult<NfcRead> {
        Ok(self.read_passive_target()?)
    }
}

impl<T: Transport> RfidEmulator for Pn532<T> {
    fn emulate(&mut self, tag: &RfidTag) -> CoreResult<EmulationOutcome> {
        Ok(self.init_as_target(tag.uid())?)
    }
}

/// Parse `pn532` backend options
///
/// Supported options:
/// - `dev=/dev/ttyS0` - serial device (required)
/// - `baud=115200` - baud rate
/// - `emulate_timeout_ms=5000` - how long emulation waits for a reader
pub fn parse_options(options: &[(&str, &str)]) -> Result<Pn532Config> {
    let mut device = None;
    let mut baud = None;
    let mut emulate_timeout = DEFAULT_EMULATE_TIMEOUT;

    for &(key, value) in options {
        match key {
            "dev" => device = Some(value.to_string()),
            "baud" => {
                baud = Some(value.parse().map_err(|_| {
                    Pn532Error::InvalidParameter(format!("Invalid baud value: {}", value))
                })?);
            }
            "emulate_timeout_ms" => {
                let ms: u64 = value.parse().map_err(|_| {
                    Pn532Error::InvalidParameter(format!(
                        "Invalid emulate_timeout_ms value: {}",
                        value
                    ))
                })?;
                emulate_timeout = Duration::from_millis(ms);
            }
            _ => {
                log::warn!("pn532: Unknown option: {}={}", key, value);
            }
        }
    }

    let device = device.ok_or_else(|| {
        Pn532Error::InvalidParameter(
            "pn532 requires a serial device, e.g. pn532:dev=/dev/ttyS0".to_string(),
        )
    })?;

    Ok(Pn532Config {
        device,
        baud,
        emulate_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Transport that plays back scripted bytes and records writes
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        rx: Arc<Mutex<VecDeque<u8>>>,
        tx: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl ScriptedTransport {
        fn queue(&self, bytes: &[u8]) {
            self.rx.lock().unwrap().extend(bytes);
        }

        fn queue_response(&self, command: u8, payload: &[u8]) {
            self.queue(&ACK_FRAME);
            let mut body = vec![TFI_PN532, response_code(command)];
            body.extend_from_slice(payload);
            let len = body.len() as u8;
            let dcs = body.iter().fold(0u8, |a, &b| a.wrapping_add(b)).wrapping_neg();
            let mut frame = vec![0x00, 0x00, 0xFF, len, len.wrapping_neg()];
            frame.extend_from_slice(&body);
            frame.push(dcs);
            frame.push(0x00);
            self.queue(&frame);
        }

        fn writes(&self) -> Vec<Vec<u8>> {
            self.tx.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.tx.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<()> {
            let mut rx = self.rx.lock().unwrap();
            if rx.len() < buf.len() {
                return Err(Pn532Error::Timeout);
            }
            for b in buf.iter_mut() {
                *b = rx.pop_front().unwrap();
            }
            Ok(())
        }

        fn clear_input(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn initialised() -> (Pn532<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::default();
        transport.queue_response(CMD_SAM_CONFIGURATION, &[]);
        transport.queue_response(CMD_RF_CONFIGURATION, &[]);
        transport.queue_response(CMD_GET_FIRMWARE_VERSION, &[0x32, 0x01, 0x06, 0x07]);
        let pn532 = Pn532::new(transport.clone()).unwrap();
        (pn532, transport)
    }

    #[test]
    fn test_init_sequence() {
        let (pn532, transport) = initialised();
        let writes = transport.writes();
        assert_eq!(writes[0], HSU_WAKEUP.to_vec());
        assert_eq!(writes[1][6], CMD_SAM_CONFIGURATION);
        assert_eq!(writes[2][6], CMD_RF_CONFIGURATION);
        assert_eq!(writes[3][6], CMD_GET_FIRMWARE_VERSION);
        assert_eq!(pn532.firmware().version, 1);
        assert_eq!(pn532.firmware().revision, 6);
    }

    #[test]
    fn test_read_tag() {
        let (mut pn532, transport) = initialised();
        transport.queue_response(
            CMD_IN_LIST_PASSIVE_TARGET,
            &[0x01, 0x01, 0x00, 0x04, 0x08, 0x04, 0xDE, 0xAD, 0xBE, 0xEF],
        );
        let read = NfcReader::read(&mut pn532).unwrap();
        assert_eq!(
            read,
            NfcRead::Tag(NfcTag {
                uid: vec![0xDE, 0xAD, 0xBE, 0xEF],
                sens_res: 0x0004,
                sel_res: 0x08,
            })
        );
    }

    #[test]
    fn test_read_no_tag() {
        let (mut pn532, transport) = initialised();
        transport.queue_response(CMD_IN_LIST_PASSIVE_TARGET, &[0x00]);
        assert_eq!(pn532.read_passive_target().unwrap(), NfcRead::NoTag);
    }

    #[test]
    fn test_read_skips_leading_noise() {
        let (mut pn532, transport) = initialised();
        transport.queue(&[0x55, 0x12]);
        transport.queue_response(CMD_IN_LIST_PASSIVE_TARGET, &[0x00]);
        assert_eq!(pn532.read_passive_target().unwrap(), NfcRead::NoTag);
    }

    #[test]
    fn test_missing_ack() {
        let (mut pn532, _transport) = initialised();
        assert!(matches!(
            pn532.command(CMD_GET_FIRMWARE_VERSION, &[], RESPONSE_TIMEOUT),
            Err(Pn532Error::NoAck(CMD_GET_FIRMWARE_VERSION))
        ));
    }

    #[test]
    fn test_emulate_no_reader_aborts() {
        let (mut pn532, transport) = initialised();
        transport.queue(&ACK_FRAME);
        let tag = RfidTag::parse("08:11:22:33").unwrap();
        assert_eq!(
            pn532.emulate(&tag).unwrap(),
            EmulationOutcome::NoReader
        );
        assert_eq!(transport.writes().last().unwrap(), &ACK_FRAME.to_vec());
    }

    #[test]
    fn test_emulate_activated() {
        let (mut pn532, transport) = initialised();
        transport.queue_response(CMD_TG_INIT_AS_TARGET, &[0x04, 0xE0, 0x80]);
        let tag = RfidTag::parse("08:11:22:33").unwrap();
        assert_eq!(
            pn532.emulate(&tag).unwrap(),
            EmulationOutcome::Activated
        );

        let sent = transport.writes().last().unwrap().clone();
        assert_eq!(sent[6], CMD_TG_INIT_AS_TARGET);
        // Mode, SENS_RES, NFCID1t, SEL_RES
        assert_eq!(&sent[7..14], &[0x04, 0x04, 0x00, 0x11, 0x22, 0x33, 0x20]);
    }

    #[test]
    fn test_tg_init_params_layout() {
        let params = tg_init_as_target_params(&[0x04, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]).unwrap();
        assert_eq!(params.len(), 37);
        assert_eq!(&params[3..6], &[0xAA, 0xBB, 0xCC]);
        assert!(tg_init_as_target_params(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_parse_passive_target_short() {
        assert!(parse_passive_target(&[0x01, 0x01, 0x00]).is_err());
        assert!(parse_passive_target(&[0x01, 0x01, 0x00, 0x44, 0x00, 0x07, 0x04]).is_err());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[("dev", "/dev/ttyS0"), ("emulate_timeout_ms", "250")]).unwrap();
        assert_eq!(config.device, "/dev/ttyS0");
        assert_eq!(config.baud, None);
        assert_eq!(config.emulate_timeout, Duration::from_millis(250));

        assert!(parse_options(&[]).is_err());
        assert!(parse_options(&[("dev", "/dev/ttyS0"), ("baud", "fast")]).is_err());
    }
}
