//! Temporal type codecs: `timestamp`, `date`, `time` and `duration`.
//!
//! - `timestamp`: [long] milliseconds since 1970-01-01T00:00:00Z
//! - `date`: unsigned 32-bit day count with the epoch at 2^31
//! - `time`: [long] nanoseconds since midnight
//! - `duration`: three zig-zag encoded variable-length integers
//!   (months, days, nanoseconds)

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};

use crate::error::{Error, Result};
use crate::protocol::buffer::FrameWriter;
use crate::protocol::constants::{CQL_DATE_EPOCH_OFFSET, CQL_NANOS_PER_DAY};
use crate::protocol::types::{ColumnTypeCode, CqlDuration};

use super::primitive::fixed;

/// Days from 0001-01-01 (day 1 of the common era) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Decode a `timestamp`.
pub(super) fn decode_timestamp(bytes: &[u8]) -> Result<DateTime<Utc>> {
    let millis = i64::from_be_bytes(fixed(bytes, ColumnTypeCode::Timestamp)?);
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::protocol(format!("timestamp out of range: {} ms", millis)))
}

/// Decode a `date`.
pub(super) fn decode_date(bytes: &[u8]) -> Result<NaiveDate> {
    let raw = u32::from_be_bytes(fixed(bytes, ColumnTypeCode::Date)?);
    let days = raw as i64 - CQL_DATE_EPOCH_OFFSET + UNIX_EPOCH_DAYS_FROM_CE;
    i32::try_from(days)
        .ok()
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| Error::protocol(format!("date out of range: {}", raw)))
}

/// Encode a `date` as its unsigned day count.
pub(super) fn encode_date(date: NaiveDate) -> u32 {
    // chrono dates span far less than 2^31 days either side of the epoch.
    (date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE + CQL_DATE_EPOCH_OFFSET) as u32
}

/// Decode a `time`.
pub(super) fn decode_time(bytes: &[u8]) -> Result<NaiveTime> {
    let nanos = i64::from_be_bytes(fixed(bytes, ColumnTypeCode::Time)?);
    if !(0..CQL_NANOS_PER_DAY).contains(&nanos) {
        return Err(Error::protocol(format!(
            "time out of range: {} ns since midnight",
            nanos
        )));
    }
    let secs = (nanos / 1_000_000_000) as u32;
    let frac = (nanos % 1_000_000_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, frac)
        .ok_or_else(|| Error::protocol(format!("time out of range: {} ns", nanos)))
}

/// Encode a `time` as nanoseconds since midnight.
pub(super) fn encode_time(time: NaiveTime) -> Result<i64> {
    let nanos =
        time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64;
    if nanos >= CQL_NANOS_PER_DAY {
        // Leap-second representation.
        return Err(Error::invalid_argument("time", format!("{} (leap second)", time)));
    }
    Ok(nanos)
}

/// Decode a `duration`.
pub(super) fn decode_duration(bytes: &[u8]) -> Result<CqlDuration> {
    let mut rest = bytes;
    let months = decode_vint(&mut rest)?;
    let days = decode_vint(&mut rest)?;
    let nanoseconds = decode_vint(&mut rest)?;
    if !rest.is_empty() {
        return Err(Error::protocol(format!(
            "duration has {} trailing bytes",
            rest.len()
        )));
    }

    let narrow = |v: i64, part: &str| {
        i32::try_from(v)
            .map_err(|_| Error::protocol(format!("duration {} out of range: {}", part, v)))
    };
    Ok(CqlDuration::new(
        narrow(months, "months")?,
        narrow(days, "days")?,
        nanoseconds,
    ))
}

/// Encode a `duration`.
pub(super) fn encode_duration(out: &mut FrameWriter, duration: &CqlDuration) {
    encode_vint(out, duration.months as i64);
    encode_vint(out, duration.days as i64);
    encode_vint(out, duration.nanoseconds);
}

/// Write a signed variable-length integer (zig-zag, then unsigned vint).
///
/// The number of leading one bits in the first byte is the number of extra
/// bytes that follow; nine-byte values start with `0xFF`.
pub fn encode_vint(out: &mut FrameWriter, value: i64) {
    let zigzag = ((value << 1) ^ (value >> 63)) as u64;
    let magnitude = (zigzag | 1).leading_zeros() as usize;
    let size = (639 - magnitude * 9) >> 6;

    let be = zigzag.to_be_bytes();
    if size == 1 {
        out.write_u8(be[7]);
    } else if size == 9 {
        out.write_u8(0xFF);
        out.write_raw(&be);
    } else {
        let mut encoded = [0u8; 8];
        encoded[..size].copy_from_slice(&be[8 - size..]);
        encoded[0] |= !(0xFFu8 >> (size - 1));
        out.write_raw(&encoded[..size]);
    }
}

/// Read a signed variable-length integer, advancing `input`.
pub fn decode_vint(input: &mut &[u8]) -> Result<i64> {
    let bytes: &[u8] = input;
    let (&first, rest) = bytes
        .split_first()
        .ok_or_else(|| Error::protocol("truncated vint"))?;
    let extra = first.leading_ones() as usize;
    if rest.len() < extra {
        return Err(Error::protocol(format!(
            "truncated vint: need {} more bytes, have {}",
            extra,
            rest.len()
        )));
    }

    let mut value = if extra >= 8 {
        0
    } else {
        (first & (0xFF >> extra)) as u64
    };
    for &b in &rest[..extra] {
        value = (value << 8) | b as u64;
    }
    *input = &rest[extra..];

    Ok(((value >> 1) as i64) ^ -((value & 1) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vint_bytes(v: i64) -> Vec<u8> {
        let mut out = FrameWriter::new();
        encode_vint(&mut out, v);
        out.as_bytes().to_vec()
    }

    #[test]
    fn test_vint_known_encodings() {
        assert_eq!(vint_bytes(0), vec![0x00]);
        assert_eq!(vint_bytes(-1), vec![0x01]);
        assert_eq!(vint_bytes(1), vec![0x02]);
        assert_eq!(vint_bytes(63), vec![0x7E]);
        assert_eq!(vint_bytes(64), vec![0x80, 0x80]);
        assert_eq!(vint_bytes(i64::MIN)[0], 0xFF);
        assert_eq!(vint_bytes(i64::MIN).len(), 9);
    }

    #[test]
    fn test_vint_boundaries() {
        for v in [0, 1, -1, 63, -64, 64, 8191, 8192, i32::MAX as i64, i64::MAX, i64::MIN] {
            let bytes = vint_bytes(v);
            let mut input = bytes.as_slice();
            assert_eq!(decode_vint(&mut input).unwrap(), v, "value {}", v);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn test_vint_truncated() {
        let mut input: &[u8] = &[0xC0, 0x01];
        assert!(decode_vint(&mut input).is_err());
        let mut empty: &[u8] = &[];
        assert!(decode_vint(&mut empty).is_err());
    }

    #[test]
    fn test_date_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(encode_date(epoch), 1u32 << 31);
        assert_eq!(decode_date(&(1u32 << 31).to_be_bytes()).unwrap(), epoch);
        assert_eq!(
            decode_date(&((1u32 << 31) - 1).to_be_bytes()).unwrap(),
            NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_time_range() {
        let t = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap();
        let nanos = encode_time(t).unwrap();
        assert_eq!(nanos, CQL_NANOS_PER_DAY - 1);
        assert_eq!(decode_time(&nanos.to_be_bytes()).unwrap(), t);
        assert!(decode_time(&CQL_NANOS_PER_DAY.to_be_bytes()).is_err());
        assert!(decode_time(&(-1i64).to_be_bytes()).is_err());
    }

    #[test]
    fn test_timestamp_zero_is_epoch() {
        let dt = decode_timestamp(&0i64.to_be_bytes()).unwrap();
        assert_eq!(dt, DateTime::from_timestamp(0, 0).unwrap());
    }

    #[test]
    fn test_duration_rejects_trailing_bytes() {
        let mut out = FrameWriter::new();
        encode_duration(&mut out, &CqlDuration::new(1, 2, 3));
        out.write_u8(0);
        assert!(decode_duration(out.as_bytes()).is_err());
    }
}
