//! Uplink framing and acknowledgement parsing.
//!
//! A pass starts with [`Codec::prepare`], which snapshots the store's
//! priority order. Each [`Codec::encode`] then packs items from the front of
//! that snapshot into one frame:
//!
//! ```text
//! {"v":1,"n":"<device id>","i":<frame index>,"r":[{"tmp":{"t":1700000000,"c":2150}},...]}
//! ```
//!
//! Items that need no acknowledgement are freed as soon as they are packed;
//! the others stay in the store, remembered with the index of the frame that
//! carried them, until [`Codec::ack_data`] or [`Codec::ack_frame`].

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::io;
use std::sync::Arc;

use harvest_spec::{Measurement, MAX_NAME_LENGTH, PROTOCOL_VERSION};
use tracing::{debug, trace};

use crate::error::{DecodeError, EncodeError};
use crate::handle::DataId;
use crate::store::{DataItem, DataStore};

/// Smallest buffer [`Codec::encode`] is guaranteed to fit one item into,
/// whatever the item and with a device id of [`MAX_NAME_LENGTH`] bytes.
pub const ENCODE_BUFFER_MIN_SIZE: usize = 512;

/// Largest frame index an acknowledgement may carry.
pub const ACK_INDEX_MAX: u32 = i32::MAX as u32;

const FRAME_TRAILER: &str = "]}";

/// Condition bits reported alongside an encoded frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EncodeFlags(u8);

impl EncodeFlags {
    /// The frame header alone does not fit the buffer.
    pub const HEADER_TOO_LARGE: EncodeFlags = EncodeFlags(0x01);
    /// The header fits but the next item does not.
    pub const NO_ITEM_FIT: EncodeFlags = EncodeFlags(0x02);
    /// The frame carries at least one item awaiting acknowledgement.
    pub const NEEDS_ACK: EncodeFlags = EncodeFlags(0x04);

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set.
    pub fn contains(self, other: EncodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    fn insert(&mut self, other: EncodeFlags) {
        self.0 |= other.0;
    }
}

/// Result of one [`Codec::encode`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Encoded {
    size: usize,
    flags: EncodeFlags,
}

impl Encoded {
    /// Bytes written; zero when no frame was produced.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Condition bits.
    pub fn flags(&self) -> EncodeFlags {
        self.flags
    }

    /// See [`EncodeFlags::HEADER_TOO_LARGE`].
    pub fn header_too_large(&self) -> bool {
        self.flags.contains(EncodeFlags::HEADER_TOO_LARGE)
    }

    /// See [`EncodeFlags::NO_ITEM_FIT`].
    pub fn no_item_fit(&self) -> bool {
        self.flags.contains(EncodeFlags::NO_ITEM_FIT)
    }

    /// See [`EncodeFlags::NEEDS_ACK`].
    pub fn needs_ack(&self) -> bool {
        self.flags.contains(EncodeFlags::NEEDS_ACK)
    }
}

/// Writes into a fixed slice, failing instead of growing.
struct FrameWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    limit: usize,
}

impl<'a> FrameWriter<'a> {
    fn new(buf: &'a mut [u8], reserve: usize) -> Self {
        let limit = buf.len().saturating_sub(reserve);
        Self { buf, pos: 0, limit }
    }

    fn unreserve(&mut self) {
        self.limit = self.buf.len();
    }
}

impl fmt::Write for FrameWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.pos + s.len();
        if end > self.limit {
            return Err(fmt::Error);
        }
        self.buf[self.pos..end].copy_from_slice(s.as_bytes());
        self.pos = end;
        Ok(())
    }
}

impl io::Write for FrameWriter<'_> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let end = self.pos + bytes.len();
        if end > self.limit {
            return Err(io::ErrorKind::WriteZero.into());
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn valid_device_id(id: &str) -> bool {
    id.len() <= MAX_NAME_LENGTH && !id.chars().any(|c| c == '"' || c == '\\' || c.is_control())
}

fn write_item(w: &mut FrameWriter<'_>, item: &DataItem) -> fmt::Result {
    write!(w, "{{\"{}\":{{\"t\":{}", item.kind.tag(), item.time_utc)?;
    match &item.measurement {
        Measurement::WakeUp(m) => write!(w, ",\"r\":{}", m.reason.code())?,
        Measurement::EnergySource(m) => write!(w, ",\"s\":{}", m.source)?,
        Measurement::Statistics(m) => write!(
            w,
            ",\"slp\":{},\"wks\":{},\"act\":{},\"nrg\":{},\"cnx\":{},\"tx\":{},\"rx\":{}",
            m.sleep_time_seconds,
            m.wake_ups,
            m.actions_run,
            m.energy_nwh,
            m.cellular_connects,
            m.cellular_bytes_tx,
            m.cellular_bytes_rx
        )?,
        Measurement::Log(m) => {
            w.write_str(",\"e\":[")?;
            for (n, e) in m.entries.iter().enumerate() {
                if n > 0 {
                    w.write_char(',')?;
                }
                write!(w, "[{},{},{}]", e.timestamp, e.event, e.parameter)?;
            }
            w.write_char(']')?;
        }
        Measurement::Cellular(m) => write!(
            w,
            ",\"rsrp\":{},\"rssi\":{},\"rsrq\":{},\"snr\":{},\"ecl\":{},\"pci\":{},\"txp\":{},\"ch\":{}",
            m.rsrp_dbm,
            m.rssi_dbm,
            m.rsrq_db,
            m.snr_db,
            m.ecl,
            m.physical_cell_id,
            m.transmit_power_dbm,
            m.earfcn
        )?,
        Measurement::Humidity(m) => write!(w, ",\"pc\":{}", m.percentage)?,
        Measurement::AtmosphericPressure(m) => write!(w, ",\"pa\":{}", m.pascal_x100)?,
        Measurement::Temperature(m) => write!(w, ",\"c\":{}", m.c_x100)?,
        Measurement::Light(m) => write!(w, ",\"lux\":{},\"uv\":{}", m.lux, m.uv_index_x1000)?,
        Measurement::Acceleration(m) => write!(
            w,
            ",\"x\":{},\"y\":{},\"z\":{}",
            m.x_g_x1000, m.y_g_x1000, m.z_g_x1000
        )?,
        Measurement::Position(m) => write!(
            w,
            ",\"lat\":{},\"lon\":{},\"rad\":{},\"alt\":{},\"spd\":{}",
            m.latitude_x10e7, m.longitude_x10e7, m.radius_metres, m.altitude_metres, m.speed_mps
        )?,
        Measurement::Magnetic(m) => write!(w, ",\"tsl\":{}", m.tesla_x1000)?,
        Measurement::Ble(m) => {
            w.write_str(",\"n\":")?;
            serde_json::to_writer(&mut *w, &m.name).map_err(|_| fmt::Error)?;
            write!(
                w,
                ",\"x\":{},\"y\":{},\"z\":{},\"bat\":{}",
                m.x_g_x1000, m.y_g_x1000, m.z_g_x1000, m.battery_percentage
            )?;
        }
    }
    if item.flags.requires_ack() {
        w.write_str(",\"a\":1")?;
    }
    w.write_str("}}")
}

/// Per-pass framing state over one store.
#[derive(Debug)]
pub struct Codec {
    store: Arc<DataStore>,
    queue: VecDeque<DataId>,
    in_flight: Vec<(DataId, u32)>,
    frame_index: u32,
}

impl Codec {
    /// Codec draining `store`. Call [`prepare`](Self::prepare) before encoding.
    pub fn new(store: Arc<DataStore>) -> Self {
        Self {
            store,
            queue: VecDeque::new(),
            in_flight: Vec::new(),
            frame_index: 0,
        }
    }

    /// Start a pass: snapshot the store's priority order and forget what the
    /// previous pass left awaiting acknowledgement. The store is not touched.
    pub fn prepare(&mut self) {
        self.queue = self.store.prioritised().into();
        self.in_flight.clear();
        self.frame_index = 0;
        debug!(queued = self.queue.len(), "codec pass prepared");
    }

    /// Pack the next items of the pass into one frame in `buf`.
    ///
    /// Items are taken strictly in priority order; the first one that does
    /// not fit ends the frame and leads the next. A size of zero with no
    /// flags means the pass is drained.
    pub fn encode(&mut self, device_id: &str, buf: &mut [u8]) -> Result<Encoded, EncodeError> {
        if !valid_device_id(device_id) {
            return Err(EncodeError::DeviceId(device_id.to_owned()));
        }
        let Some(mut next) = self.front() else {
            return Ok(Encoded::default());
        };

        let mut flags = EncodeFlags::default();
        let mut w = FrameWriter::new(buf, FRAME_TRAILER.len());
        let header = write!(
            w,
            "{{\"v\":{},\"n\":\"{}\",\"i\":{},\"r\":[",
            PROTOCOL_VERSION, device_id, self.frame_index
        );
        if header.is_err() {
            flags.insert(EncodeFlags::HEADER_TOO_LARGE);
            return Ok(Encoded { size: 0, flags });
        }

        let mut packed = 0usize;
        loop {
            let mark = w.pos;
            let fits = (packed == 0 || w.write_char(',').is_ok())
                && write_item(&mut w, &next).is_ok();
            if !fits {
                w.pos = mark;
                break;
            }
            self.queue.pop_front();
            packed += 1;
            if next.flags.requires_ack() {
                self.in_flight.push((next.id, self.frame_index));
                flags.insert(EncodeFlags::NEEDS_ACK);
            } else {
                self.store.free(&mut Some(next.id));
            }
            trace!(id = %next.id, kind = %next.kind, frame = self.frame_index, "item packed");
            match self.front() {
                Some(item) => next = item,
                None => break,
            }
        }

        if packed == 0 {
            flags.insert(EncodeFlags::NO_ITEM_FIT);
            return Ok(Encoded { size: 0, flags });
        }
        w.unreserve();
        if w.write_str(FRAME_TRAILER).is_err() {
            // reserved above, cannot fail
            flags.insert(EncodeFlags::HEADER_TOO_LARGE);
            return Ok(Encoded { size: 0, flags });
        }
        debug!(
            frame = self.frame_index,
            items = packed,
            bytes = w.pos,
            needs_ack = flags.contains(EncodeFlags::NEEDS_ACK),
            "frame encoded"
        );
        self.frame_index = self.frame_index.wrapping_add(1);
        Ok(Encoded {
            size: w.pos,
            flags,
        })
    }

    // Front of the queue, dropping entries freed since `prepare()`.
    fn front(&mut self) -> Option<DataItem> {
        while let Some(&id) = self.queue.front() {
            match self.store.get(id) {
                Some(item) => return Some(item),
                None => {
                    self.queue.pop_front();
                }
            }
        }
        None
    }

    /// Free every item of this pass still awaiting acknowledgement.
    /// Returns how many were freed.
    pub fn ack_data(&mut self) -> usize {
        let freed = self
            .in_flight
            .drain(..)
            .filter(|(id, _)| self.store.free(&mut Some(*id)))
            .count();
        debug!(freed, "pass acknowledged");
        freed
    }

    /// Free the items carried by one frame of this pass.
    pub fn ack_frame(&mut self, index: u32) -> usize {
        let store = &self.store;
        let mut freed = 0;
        self.in_flight.retain(|(id, frame)| {
            if *frame != index {
                return true;
            }
            if store.free(&mut Some(*id)) {
                freed += 1;
            }
            false
        });
        debug!(frame = index, freed, "frame acknowledged");
        freed
    }

    /// Items of this pass awaiting acknowledgement.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Frames encoded so far in this pass.
    pub fn frames_encoded(&self) -> u32 {
        self.frame_index
    }
}

struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.buf.get(self.pos), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), DecodeError> {
        self.skip_ws();
        if self.buf.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(DecodeError::NotAckMsg)
        }
    }

    fn key(&mut self, name: u8) -> Result<(), DecodeError> {
        self.expect(b'"')?;
        if self.buf.get(self.pos) != Some(&name) {
            return Err(DecodeError::NotAckMsg);
        }
        self.pos += 1;
        if self.buf.get(self.pos) != Some(&b'"') {
            return Err(DecodeError::NotAckMsg);
        }
        self.pos += 1;
        self.expect(b':')
    }

    fn string(&mut self) -> Result<&'a [u8], DecodeError> {
        self.expect(b'"')?;
        let start = self.pos;
        let len = self.buf[start..]
            .iter()
            .take(MAX_NAME_LENGTH + 1)
            .position(|&b| b == b'"')
            .ok_or(DecodeError::NotAckMsg)?;
        self.pos = start + len + 1;
        Ok(&self.buf[start..start + len])
    }

    fn number(&mut self) -> Result<u32, DecodeError> {
        self.skip_ws();
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(digit) = self.buf.get(self.pos).filter(|b| b.is_ascii_digit()) {
            value = value * 10 + u64::from(digit - b'0');
            if value > u64::from(ACK_INDEX_MAX) {
                return Err(DecodeError::NotAckMsg);
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(DecodeError::NotAckMsg);
        }
        Ok(value as u32)
    }
}

/// Parse an acknowledgement `{"n":"<device id>","i":<index>}` addressed to
/// `expected`, returning the index.
///
/// Whitespace may surround every punctuation mark, `n` must come before `i`,
/// and anything after the closing brace is ignored. Never allocates.
pub fn decode_ack(buf: &[u8], expected: &str) -> Result<u32, DecodeError> {
    if expected.len() > MAX_NAME_LENGTH {
        return Err(DecodeError::BadParameter);
    }
    let mut s = Scanner { buf, pos: 0 };
    s.expect(b'{')?;
    s.key(b'n')?;
    let name = s.string()?;
    s.expect(b',')?;
    s.key(b'i')?;
    let index = s.number()?;
    s.expect(b'}')?;
    if name != expected.as_bytes() {
        return Err(DecodeError::NoNameMatch);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_spec::{
        Ble, DataFlags, Humidity, Log, LogEntry, ManualClock, Statistics, Temperature,
        BLE_NAME_MAX_LENGTH, LOG_MAX_ENTRIES,
    };

    const NAME: &str = "357520071700641";

    fn setup() -> (Arc<DataStore>, Codec) {
        let store = Arc::new(DataStore::with_buffer(
            vec![0; 8192],
            Arc::new(ManualClock::new(1_700_000_000)),
        ));
        let codec = Codec::new(store.clone());
        (store, codec)
    }

    fn temperature(c_x100: i32) -> Measurement {
        Measurement::Temperature(Temperature { c_x100 })
    }

    #[test]
    fn frame_text_is_well_formed_json() {
        let (store, mut codec) = setup();
        store
            .allocate_at(None, DataFlags::NONE, &temperature(2150), 1_700_000_000)
            .unwrap();
        store
            .allocate_at(None, DataFlags::REQUIRES_ACK, &temperature(-40), 1_700_000_001)
            .unwrap();
        codec.prepare();
        let mut buf = [0u8; ENCODE_BUFFER_MIN_SIZE];
        let out = codec.encode(NAME, &mut buf).unwrap();
        assert!(out.needs_ack());
        let text = std::str::from_utf8(&buf[..out.size()]).unwrap();
        assert_eq!(
            text,
            "{\"v\":1,\"n\":\"357520071700641\",\"i\":0,\"r\":[\
             {\"tmp\":{\"t\":1700000001,\"c\":-40,\"a\":1}},\
             {\"tmp\":{\"t\":1700000000,\"c\":2150}}]}"
        );
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["r"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn empty_store_encodes_nothing() {
        let (_, mut codec) = setup();
        codec.prepare();
        let mut buf = [0u8; 64];
        assert_eq!(codec.encode(NAME, &mut buf).unwrap(), Encoded::default());
    }

    #[test]
    fn tiny_buffers_report_what_failed() {
        let (store, mut codec) = setup();
        store
            .allocate(None, DataFlags::NONE, &temperature(1))
            .unwrap();
        codec.prepare();
        let mut buf = [0u8; 10];
        let out = codec.encode(NAME, &mut buf).unwrap();
        assert!(out.header_too_large());
        assert_eq!(out.flags().bits(), EncodeFlags::HEADER_TOO_LARGE.bits());
        assert_eq!(out.size(), 0);
        let mut buf = [0u8; 48];
        let out = codec.encode(NAME, &mut buf).unwrap();
        assert!(out.no_item_fit());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn bad_device_ids_are_rejected() {
        let (_, mut codec) = setup();
        let mut buf = [0u8; ENCODE_BUFFER_MIN_SIZE];
        assert!(codec.encode("a\"b", &mut buf).is_err());
        assert!(codec.encode(&"x".repeat(MAX_NAME_LENGTH + 1), &mut buf).is_err());
    }

    #[test]
    fn ack_items_survive_until_acknowledged() {
        let (store, mut codec) = setup();
        for n in 0..20 {
            let flags = if n % 3 == 0 {
                DataFlags::REQUIRES_ACK
            } else {
                DataFlags::NONE
            };
            store
                .allocate(None, flags, &Measurement::Humidity(Humidity { percentage: n }))
                .unwrap();
        }
        let mut buf = [0u8; 160];
        codec.prepare();
        let mut frames = 0;
        loop {
            let out = codec.encode(NAME, &mut buf).unwrap();
            if out.size() == 0 {
                assert_eq!(out.flags(), EncodeFlags::default());
                break;
            }
            frames += 1;
        }
        assert!(frames > 1);
        assert_eq!(codec.frames_encoded(), frames);
        assert_eq!(store.count(), 7);
        assert_eq!(codec.in_flight(), 7);

        codec.prepare();
        assert_eq!(codec.in_flight(), 0);
        let out = codec.encode(NAME, &mut buf).unwrap();
        assert!(out.needs_ack());
        while codec.encode(NAME, &mut buf).unwrap().size() > 0 {}
        assert_eq!(codec.ack_data(), 7);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn ack_frame_frees_only_that_frame() {
        let (store, mut codec) = setup();
        for n in 0..6 {
            store
                .allocate_at(None, DataFlags::REQUIRES_ACK, &temperature(n), i64::from(n))
                .unwrap();
        }
        let mut buf = [0u8; 120];
        codec.prepare();
        let first = codec.encode(NAME, &mut buf).unwrap();
        assert!(first.size() > 0);
        let in_first = codec.in_flight();
        while codec.encode(NAME, &mut buf).unwrap().size() > 0 {}
        assert_eq!(codec.ack_frame(0), in_first);
        assert_eq!(store.count(), 6 - in_first);
        assert_eq!(codec.in_flight(), 6 - in_first);
    }

    #[test]
    fn minimum_buffer_fits_the_largest_items() {
        let (store, mut codec) = setup();
        let log = Measurement::Log(Log {
            entries: vec![
                LogEntry {
                    timestamp: u32::MAX,
                    event: u32::MAX,
                    parameter: u32::MAX,
                };
                LOG_MAX_ENTRIES
            ],
        });
        let ble = Measurement::Ble(Ble {
            name: "\u{1}".repeat(BLE_NAME_MAX_LENGTH),
            x_g_x1000: i32::MIN,
            y_g_x1000: i32::MIN,
            z_g_x1000: i32::MIN,
            battery_percentage: 100,
        });
        let stats = Measurement::Statistics(Statistics {
            sleep_time_seconds: u32::MAX,
            wake_ups: u32::MAX,
            actions_run: u32::MAX,
            energy_nwh: u64::MAX,
            cellular_connects: u32::MAX,
            cellular_bytes_tx: u32::MAX,
            cellular_bytes_rx: u32::MAX,
        });
        let name = "0".repeat(MAX_NAME_LENGTH);
        for m in [log, ble, stats] {
            store
                .allocate_at(None, DataFlags::REQUIRES_ACK, &m, i64::MIN)
                .unwrap()
                .unwrap();
            codec.prepare();
            let mut buf = [0u8; ENCODE_BUFFER_MIN_SIZE];
            let out = codec.encode(&name, &mut buf).unwrap();
            assert!(out.size() > 0, "{:?} did not fit", m.kind());
            assert!(!out.no_item_fit());
            serde_json::from_slice::<serde_json::Value>(&buf[..out.size()]).unwrap();
            codec.ack_data();
        }
    }

    #[test]
    fn ble_names_are_escaped_and_roll_back_cleanly() {
        let (store, mut codec) = setup();
        let name = "q\"b\\c\u{7}\u{1f}é";
        store
            .allocate_at(
                None,
                DataFlags::NONE,
                &Measurement::Ble(Ble {
                    name: name.into(),
                    battery_percentage: 9,
                    ..Ble::default()
                }),
                7,
            )
            .unwrap()
            .unwrap();
        codec.prepare();

        // header fits, the escaped name does not
        let mut small = [0u8; 72];
        let out = codec.encode(NAME, &mut small).unwrap();
        assert!(out.no_item_fit());
        assert_eq!(store.count(), 1);

        let mut buf = [0u8; ENCODE_BUFFER_MIN_SIZE];
        let out = codec.encode(NAME, &mut buf).unwrap();
        let text = std::str::from_utf8(&buf[..out.size()]).unwrap();
        assert!(text.contains(r#""n":"q\"b\\c\u0007\u001fé""#), "{text}");
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["r"][0]["ble"]["n"], name);
        assert_eq!(parsed["r"][0]["ble"]["bat"], 9);
    }

    #[test]
    fn ack_vectors() {
        let msg = br#"{"n":"357520071700641","i":4}garbage"#;
        assert_eq!(decode_ack(msg, NAME), Ok(4));
        assert_eq!(
            decode_ack(msg, "357520071700640"),
            Err(DecodeError::NoNameMatch)
        );
        assert_eq!(
            decode_ack(msg, "35752007170064"),
            Err(DecodeError::NoNameMatch)
        );
        assert_eq!(
            decode_ack(msg, "3575200717006411"),
            Err(DecodeError::NoNameMatch)
        );
        let max = "01234567890123456789012345678901";
        let spaced = format!(" {{ \"n\" : \"{max}\" , \"i\" : 2147483647 }}");
        assert_eq!(decode_ack(spaced.as_bytes(), max), Ok(2_147_483_647));
        assert_eq!(
            decode_ack(br#"{"n":"x","i":1}"#, &format!("{max}2")),
            Err(DecodeError::BadParameter)
        );
    }

    #[test]
    fn malformed_acks_are_not_ack_messages() {
        let max = "01234567890123456789012345678901";
        for bad in [
            "{'n':'01234567890123456789012345678901','i':2147483647}",
            "{\"n\"\"01234567890123456789012345678901\",\"i\":2147483647}",
            "{\"n\":01234567890123456789012345678901,\"i\":2147483647}",
            "\"n\":\"01234567890123456789012345678901\",\"i\":2147483647}",
            "{\"n\":\"01234567890123456789012345678901\",\"i\":2147483647",
            "(\"n\":\"01234567890123456789012345678901\",\"i\":2147483647)",
            "[\"n\":\"01234567890123456789012345678901\",\"i\":2147483647]",
            "{\"n\":\"01234567890123456789012345678901\"i\":2147483647}",
            "{\"n\":\"01234567890123456789012345678901,\"d\":2147483647}",
            "{\"i\":\"01234567890123456789012345678901,\"n\":2147483647}",
            "{\"i\":4,\"n\":\"01234567890123456789012345678901\"}",
            "{\"n\":\"01234567890123456789012345678901\",\"i\":2147483648}",
            "{\"n\":\"01234567890123456789012345678901\",\"i\":}",
            "{\"n\":\"012345678901234567890123456789012\",\"i\":1}",
            "",
        ] {
            assert_eq!(
                decode_ack(bad.as_bytes(), max),
                Err(DecodeError::NotAckMsg),
                "{bad}"
            );
        }
    }
}
