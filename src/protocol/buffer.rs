//! Buffer utilities for reading and writing CQL native protocol data.
//!
//! All multi-byte integers are big-endian. The notation used below follows the
//! protocol description:
//!
//! ```text
//! [short]        2-byte unsigned
//! [int]          4-byte signed
//! [long]         8-byte signed
//! [string]       [short] n, then n bytes of UTF-8
//! [bytes]        [int] n, then n bytes; n < 0 means null
//! [short bytes]  [short] n, then n bytes
//! [inet]         1-byte n (4 or 16), n address bytes, [int] port
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::error::{Error, Result};
use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// A cursor for reading CQL protocol data.
pub struct FrameReader {
    data: Bytes,
    pos: usize,
}

impl FrameReader {
    /// Create a new reader from bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Get the current position in the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Get the remaining bytes in the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if the buffer has at least `n` bytes remaining.
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Get a slice of the remaining data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    #[track_caller]
    fn ensure(&self, n: usize) -> Result<()> {
        if !self.has_remaining(n) {
            return Err(Error::BufferTooSmall {
                needed: n,
                available: self.remaining(),
                location: std::panic::Location::caller(),
            });
        }
        Ok(())
    }

    /// Skip `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Read a single byte.
    #[track_caller]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let val = self.data[self.pos];
        self.pos += 1;
        Ok(val)
    }

    /// Read a [short].
    #[track_caller]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let val = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(val)
    }

    /// Read a signed 2-byte integer.
    #[track_caller]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read an [int].
    #[track_caller]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(i32::from_be_bytes(bytes))
    }

    /// Read a [long].
    #[track_caller]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.data[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(i64::from_be_bytes(bytes))
    }

    /// Read raw bytes.
    #[track_caller]
    pub fn read_raw(&mut self, n: usize) -> Result<Bytes> {
        self.ensure(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read a [string].
    #[track_caller]
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let raw = self.read_raw(len)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| Error::protocol(format!("Invalid UTF-8 in [string]: {}", e)))
    }

    /// Read a [string list].
    #[track_caller]
    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let n = self.read_u16()?;
        (0..n).map(|_| self.read_string()).collect()
    }

    /// Read [bytes]. A negative length yields `None`.
    #[track_caller]
    pub fn read_bytes(&mut self) -> Result<Option<Bytes>> {
        let len = self.read_i32()?;
        if len < 0 {
            return Ok(None);
        }
        Ok(Some(self.read_raw(len as usize)?))
    }

    /// Read [short bytes].
    #[track_caller]
    pub fn read_short_bytes(&mut self) -> Result<Bytes> {
        let len = self.read_u16()? as usize;
        self.read_raw(len)
    }

    /// Read a 16-byte [uuid].
    #[track_caller]
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let raw = self.read_raw(16)?;
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&raw);
        Ok(Uuid::from_bytes(bytes))
    }

    /// Read an [inet] (address length byte, address, port).
    #[track_caller]
    pub fn read_inet(&mut self) -> Result<SocketAddr> {
        let len = self.read_u8()? as usize;
        let raw = self.read_raw(len)?;
        let ip = ip_from_slice(&raw)?;
        let port = self.read_i32()?;
        let port = u16::try_from(port)
            .map_err(|_| Error::protocol(format!("Invalid inet port: {}", port)))?;
        Ok(SocketAddr::new(ip, port))
    }
}

/// Build an IP address from a 4- or 16-byte slice.
pub(crate) fn ip_from_slice(raw: &[u8]) -> Result<IpAddr> {
    match raw.len() {
        4 => {
            let mut octets = [0u8; 4];
            octets.copy_from_slice(raw);
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(raw);
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        n => Err(Error::protocol(format!(
            "Invalid inet address length: {}",
            n
        ))),
    }
}

/// A buffer for writing CQL protocol data.
pub struct FrameWriter {
    data: BytesMut,
}

impl FrameWriter {
    /// Create a new writer with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new writer with specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    /// Get the current length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the buffer contents as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into immutable bytes.
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, val: u8) {
        self.data.put_u8(val);
    }

    /// Write a [short].
    pub fn write_u16(&mut self, val: u16) {
        self.data.put_u16(val);
    }

    /// Write a signed 2-byte integer.
    pub fn write_i16(&mut self, val: i16) {
        self.data.put_i16(val);
    }

    /// Write an [int].
    pub fn write_i32(&mut self, val: i32) {
        self.data.put_i32(val);
    }

    /// Write a [long].
    pub fn write_i64(&mut self, val: i64) {
        self.data.put_i64(val);
    }

    /// Write raw bytes.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a [string].
    pub fn write_string(&mut self, s: &str) {
        self.write_u16(s.len() as u16);
        self.write_raw(s.as_bytes());
    }

    /// Write a [string list].
    pub fn write_string_list(&mut self, list: &[&str]) {
        self.write_u16(list.len() as u16);
        for s in list {
            self.write_string(s);
        }
    }

    /// Write [bytes]; `None` is written as length -1.
    pub fn write_bytes(&mut self, bytes: Option<&[u8]>) {
        match bytes {
            Some(b) => {
                self.write_i32(b.len() as i32);
                self.write_raw(b);
            }
            None => self.write_i32(-1),
        }
    }

    /// Write [short bytes].
    pub fn write_short_bytes(&mut self, bytes: &[u8]) {
        self.write_u16(bytes.len() as u16);
        self.write_raw(bytes);
    }

    /// Write a 16-byte [uuid].
    pub fn write_uuid(&mut self, uuid: &Uuid) {
        self.write_raw(uuid.as_bytes());
    }

    /// Write an [inet].
    pub fn write_inet(&mut self, addr: &SocketAddr) {
        match addr.ip() {
            IpAddr::V4(v4) => {
                self.write_u8(4);
                self.write_raw(&v4.octets());
            }
            IpAddr::V6(v6) => {
                self.write_u8(16);
                self.write_raw(&v6.octets());
            }
        }
        self.write_i32(addr.port() as i32);
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
