//! Fixed-width and scalar type codecs.

use std::net::SocketAddr;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::buffer::{ip_from_slice, FrameWriter};
use crate::protocol::types::{ColumnTypeCode, CqlDecimal, CqlVarint, TimeUuid};

/// Interpret `bytes` as exactly `N` bytes of a fixed-width type.
pub(super) fn fixed<const N: usize>(bytes: &[u8], code: ColumnTypeCode) -> Result<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        Error::protocol(format!(
            "Invalid {} value: expected {} bytes, got {}",
            code.cql_name(),
            N,
            bytes.len()
        ))
    })
}

/// Decode UTF-8 `text`/`varchar`.
pub(super) fn decode_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::protocol(format!("Invalid UTF-8 in text value: {}", e)))
}

/// Decode `ascii`, rejecting bytes outside the 7-bit range.
pub(super) fn decode_ascii(bytes: &[u8]) -> Result<String> {
    if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
        return Err(Error::protocol(format!(
            "Invalid ascii value: byte {:#04x} at offset {}",
            bytes[pos], pos
        )));
    }
    decode_text(bytes)
}

/// Decode a `timeuuid`, which must be a version 1 UUID.
pub(super) fn decode_timeuuid(bytes: &[u8]) -> Result<TimeUuid> {
    let uuid = Uuid::from_bytes(fixed(bytes, ColumnTypeCode::Timeuuid)?);
    TimeUuid::new(uuid).map_err(|_| {
        Error::protocol(format!(
            "timeuuid column holds version {} uuid {}",
            uuid.get_version_num(),
            uuid
        ))
    })
}

/// Decode a `decimal`: [int] scale, then varint unscaled value.
pub(super) fn decode_decimal(bytes: &[u8]) -> Result<CqlDecimal> {
    if bytes.len() < 4 {
        return Err(Error::protocol(format!(
            "Invalid decimal value: expected at least 4 bytes, got {}",
            bytes.len()
        )));
    }
    let (scale, unscaled) = bytes.split_at(4);
    let scale = i32::from_be_bytes(fixed(scale, ColumnTypeCode::Decimal)?);
    Ok(CqlDecimal::new(
        CqlVarint::from_signed_bytes_be(unscaled),
        scale,
    ))
}

pub(super) fn encode_decimal(out: &mut FrameWriter, decimal: &CqlDecimal) {
    out.write_i32(decimal.scale);
    out.write_raw(&decimal.unscaled.to_signed_bytes_be());
}

/// Decode an `inet` value.
///
/// A bare 4 or 16 byte value is an address with port 0; anything else must be
/// the length-prefixed address followed by an [int] port.
pub(super) fn decode_inet(bytes: &[u8]) -> Result<SocketAddr> {
    match bytes.len() {
        4 | 16 => Ok(SocketAddr::new(ip_from_slice(bytes)?, 0)),
        0 => Err(Error::protocol("Invalid inet value: empty")),
        n => {
            let addr_len = bytes[0] as usize;
            if n != 1 + addr_len + 4 {
                return Err(Error::protocol(format!(
                    "Invalid inet value: {} bytes for address length {}",
                    n, addr_len
                )));
            }
            let ip = ip_from_slice(&bytes[1..1 + addr_len])?;
            let port = i32::from_be_bytes(fixed(&bytes[1 + addr_len..], ColumnTypeCode::Inet)?);
            let port = u16::try_from(port)
                .map_err(|_| Error::protocol(format!("Invalid inet port: {}", port)))?;
            Ok(SocketAddr::new(ip, port))
        }
    }
}

pub(super) fn encode_inet(out: &mut FrameWriter, addr: &SocketAddr) {
    if addr.port() == 0 {
        match addr.ip() {
            std::net::IpAddr::V4(v4) => out.write_raw(&v4.octets()),
            std::net::IpAddr::V6(v6) => out.write_raw(&v6.octets()),
        }
    } else {
        out.write_inet(addr);
    }
}
