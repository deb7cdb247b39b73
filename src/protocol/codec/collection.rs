//! Composite type codecs: `list`, `set`, `map`, UDT and tuple.
//!
//! Collections are a count followed by length-prefixed elements. Protocol
//! versions 1 and 2 use [short] counts and lengths; later versions use [int].
//! UDT fields and tuple elements always use [bytes] framing, where a negative
//! length is NULL and missing trailing values are NULL.

use std::collections::HashSet;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::protocol::buffer::{FrameReader, FrameWriter};
use crate::protocol::types::{CqlValue, TypeSpec, UdtValue};

use super::TypeCodec;

impl TypeCodec {
    fn read_count(&self, reader: &mut FrameReader) -> Result<usize> {
        if self.version.uses_short_collection_lengths() {
            return Ok(reader.read_u16()? as usize);
        }
        let count = reader.read_i32()?;
        usize::try_from(count)
            .map_err(|_| Error::protocol(format!("Negative collection size: {}", count)))
    }

    fn read_element(&self, reader: &mut FrameReader) -> Result<Option<Bytes>> {
        if self.version.uses_short_collection_lengths() {
            let len = reader.read_u16()? as usize;
            return Ok(Some(reader.read_raw(len)?));
        }
        reader.read_bytes()
    }

    fn write_count(&self, out: &mut FrameWriter, count: usize, ty: &TypeSpec) -> Result<()> {
        if self.version.uses_short_collection_lengths() {
            let count = u16::try_from(count).map_err(|_| {
                Error::invalid_argument(
                    format!("{} with at most {} elements", ty, u16::MAX),
                    format!("{} elements", count),
                )
            })?;
            out.write_u16(count);
        } else {
            out.write_i32(count as i32);
        }
        Ok(())
    }

    fn write_element(&self, out: &mut FrameWriter, element: &[u8], ty: &TypeSpec) -> Result<()> {
        if self.version.uses_short_collection_lengths() {
            let len = u16::try_from(element.len()).map_err(|_| {
                Error::invalid_argument(
                    format!("{} element of at most {} bytes", ty, u16::MAX),
                    format!("{} bytes", element.len()),
                )
            })?;
            out.write_u16(len);
            out.write_raw(element);
        } else {
            out.write_bytes(Some(element));
        }
        Ok(())
    }

    fn decode_element(&self, raw: Option<Bytes>, ty: &TypeSpec) -> Result<CqlValue> {
        self.decode_nullable(raw.as_deref(), ty)
    }

    fn encode_element(&self, value: &CqlValue, ty: &TypeSpec) -> Result<Bytes> {
        if value.is_null() {
            return Err(Error::invalid_argument(
                format!("non-null {} collection element", ty),
                "null",
            ));
        }
        self.encode(value, ty)
    }

    /// Decode the elements of a `list`.
    pub(super) fn decode_list(&self, bytes: &[u8], element: &TypeSpec) -> Result<Vec<CqlValue>> {
        let mut reader = FrameReader::new(Bytes::copy_from_slice(bytes));
        let count = self.read_count(&mut reader)?;
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let raw = self.read_element(&mut reader)?;
            items.push(self.decode_element(raw, element)?);
        }
        expect_consumed(&reader, "list")?;
        Ok(items)
    }

    /// Decode the elements of a `set`, dropping repeated elements.
    ///
    /// Elements are compared by their wire bytes; the first occurrence is kept
    /// and wire order is preserved.
    pub(super) fn decode_set(&self, bytes: &[u8], element: &TypeSpec) -> Result<Vec<CqlValue>> {
        let mut reader = FrameReader::new(Bytes::copy_from_slice(bytes));
        let count = self.read_count(&mut reader)?;
        let mut seen: HashSet<Option<Bytes>> = HashSet::with_capacity(count.min(reader.remaining()));
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let raw = self.read_element(&mut reader)?;
            if !seen.insert(raw.clone()) {
                continue;
            }
            items.push(self.decode_element(raw, element)?);
        }
        expect_consumed(&reader, "set")?;
        Ok(items)
    }

    /// Decode the entries of a `map` in wire order.
    pub(super) fn decode_map(
        &self,
        bytes: &[u8],
        key: &TypeSpec,
        value: &TypeSpec,
    ) -> Result<Vec<(CqlValue, CqlValue)>> {
        let mut reader = FrameReader::new(Bytes::copy_from_slice(bytes));
        let count = self.read_count(&mut reader)?;
        let mut entries = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let k = self.read_element(&mut reader)?;
            let v = self.read_element(&mut reader)?;
            entries.push((self.decode_element(k, key)?, self.decode_element(v, value)?));
        }
        expect_consumed(&reader, "map")?;
        Ok(entries)
    }

    /// Decode a UDT value; fields not present on the wire are NULL.
    pub(super) fn decode_udt(&self, bytes: &[u8], ty: &TypeSpec) -> Result<UdtValue> {
        let (keyspace, name, fields) = ty.udt_fields()?;
        let mut reader = FrameReader::new(Bytes::copy_from_slice(bytes));
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value = if reader.remaining() > 0 {
                let raw = reader.read_bytes()?;
                self.decode_nullable(raw.as_deref(), &field.data_type)?
            } else {
                CqlValue::Null
            };
            values.push((field.name.clone(), value));
        }
        Ok(UdtValue::new(keyspace, name, values))
    }

    /// Decode a tuple; elements not present on the wire are NULL.
    pub(super) fn decode_tuple(&self, bytes: &[u8], elements: &[TypeSpec]) -> Result<Vec<CqlValue>> {
        let mut reader = FrameReader::new(Bytes::copy_from_slice(bytes));
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            let value = if reader.remaining() > 0 {
                let raw = reader.read_bytes()?;
                self.decode_nullable(raw.as_deref(), element)?
            } else {
                CqlValue::Null
            };
            values.push(value);
        }
        expect_consumed(&reader, "tuple")?;
        Ok(values)
    }

    /// Encode the elements of a `list` or `set`.
    pub(super) fn encode_seq(
        &self,
        out: &mut FrameWriter,
        items: &[CqlValue],
        element: &TypeSpec,
        ty: &TypeSpec,
    ) -> Result<()> {
        self.write_count(out, items.len(), ty)?;
        for item in items {
            let encoded = self.encode_element(item, element)?;
            self.write_element(out, &encoded, ty)?;
        }
        Ok(())
    }

    pub(super) fn encode_map(
        &self,
        out: &mut FrameWriter,
        entries: &[(CqlValue, CqlValue)],
        ty: &TypeSpec,
    ) -> Result<()> {
        let (key_type, value_type) = ty.map_types()?;
        self.write_count(out, entries.len(), ty)?;
        for (k, v) in entries {
            let key = self.encode_element(k, key_type)?;
            self.write_element(out, &key, ty)?;
            let value = self.encode_element(v, value_type)?;
            self.write_element(out, &value, ty)?;
        }
        Ok(())
    }

    /// Encode a UDT value in declared field order; absent fields are NULL.
    pub(super) fn encode_udt(
        &self,
        out: &mut FrameWriter,
        udt: &UdtValue,
        ty: &TypeSpec,
    ) -> Result<()> {
        let (_, _, fields) = ty.udt_fields()?;
        if let Some((unknown, _)) = udt
            .fields
            .iter()
            .find(|(name, _)| !fields.iter().any(|f| &f.name == name))
        {
            return Err(Error::invalid_argument(
                format!("field of {}", ty),
                format!("unknown field '{}'", unknown),
            ));
        }

        for field in fields {
            let value = udt.field(&field.name).unwrap_or(&CqlValue::Null);
            let encoded = self.encode_nullable(value, &field.data_type)?;
            out.write_bytes(encoded.as_deref());
        }
        Ok(())
    }

    pub(super) fn encode_tuple(
        &self,
        out: &mut FrameWriter,
        items: &[CqlValue],
        ty: &TypeSpec,
    ) -> Result<()> {
        let elements = ty.tuple_elements()?;
        if items.len() > elements.len() {
            return Err(Error::invalid_argument(
                ty.to_string(),
                format!("tuple of {} elements", items.len()),
            ));
        }
        for (i, element) in elements.iter().enumerate() {
            let value = items.get(i).unwrap_or(&CqlValue::Null);
            let encoded = self.encode_nullable(value, element)?;
            out.write_bytes(encoded.as_deref());
        }
        Ok(())
    }
}

fn expect_consumed(reader: &FrameReader, what: &str) -> Result<()> {
    if reader.remaining() > 0 {
        return Err(Error::protocol(format!(
            "{} value has {} trailing bytes",
            what,
            reader.remaining()
        )));
    }
    Ok(())
}
