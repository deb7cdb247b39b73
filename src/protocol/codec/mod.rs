//! Type codec for CQL column values.
//!
//! Converts between wire bytes and [`CqlValue`] for every [`ColumnTypeCode`].
//! Dispatch is a `match` on the type code; composite types recurse through
//! the same codec using the nested [`TypeSpec`].
//!
//! | CQL type | Module |
//! |----------|--------|
//! | integers, floats, boolean, blob, uuid | this module |
//! | text, ascii, timeuuid, decimal, inet | `primitive` |
//! | timestamp, date, time, duration | `temporal` |
//! | list, set, map, udt, tuple | `collection` |

mod collection;
mod native;
mod primitive;
mod temporal;

pub use native::NativeType;
pub use temporal::{decode_vint, encode_vint};

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::options::ProtocolVersion;
use crate::protocol::buffer::FrameWriter;
use crate::protocol::types::{
    short_type_name, ColumnTypeCode, CqlValue, CqlVarint, FromCqlValue, TimeUuid, TypeSpec,
};

use primitive::fixed;

/// Encoder/decoder for CQL values under one protocol version.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCodec {
    version: ProtocolVersion,
}

impl TypeCodec {
    /// Create a codec for the given protocol version.
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version }
    }

    /// Protocol version used for collection framing.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.version
    }

    /// Decode a non-null value.
    ///
    /// # Example
    ///
    /// ```
    /// use cql_thin_rs::{ColumnTypeCode, CqlValue, ProtocolVersion, TypeCodec, TypeSpec};
    ///
    /// let codec = TypeCodec::new(ProtocolVersion::V4);
    /// let value = codec
    ///     .decode(&[0, 0, 0, 42], &TypeSpec::simple(ColumnTypeCode::Int))
    ///     .unwrap();
    /// assert_eq!(value, CqlValue::Int(42));
    /// ```
    pub fn decode(&self, bytes: &[u8], ty: &TypeSpec) -> Result<CqlValue> {
        use ColumnTypeCode as T;

        let value = match ty.code {
            T::Ascii => CqlValue::Ascii(primitive::decode_ascii(bytes)?),
            T::Text | T::Varchar => CqlValue::Text(primitive::decode_text(bytes)?),
            T::Bigint => CqlValue::BigInt(i64::from_be_bytes(fixed(bytes, ty.code)?)),
            T::Counter => CqlValue::Counter(i64::from_be_bytes(fixed(bytes, ty.code)?)),
            T::Int => CqlValue::Int(i32::from_be_bytes(fixed(bytes, ty.code)?)),
            T::SmallInt => CqlValue::SmallInt(i16::from_be_bytes(fixed(bytes, ty.code)?)),
            T::TinyInt => CqlValue::TinyInt(i8::from_be_bytes(fixed(bytes, ty.code)?)),
            T::Boolean => CqlValue::Boolean(fixed::<1>(bytes, ty.code)?[0] == 0x01),
            T::Double => CqlValue::Double(f64::from_be_bytes(fixed(bytes, ty.code)?)),
            T::Float => CqlValue::Float(f32::from_be_bytes(fixed(bytes, ty.code)?)),
            T::Blob => CqlValue::Blob(Bytes::copy_from_slice(bytes)),
            T::Custom => CqlValue::Custom(Bytes::copy_from_slice(bytes)),
            T::Uuid => CqlValue::Uuid(Uuid::from_bytes(fixed(bytes, ty.code)?)),
            T::Timeuuid => CqlValue::TimeUuid(primitive::decode_timeuuid(bytes)?),
            T::Varint => CqlValue::Varint(CqlVarint::from_signed_bytes_be(bytes)),
            T::Decimal => CqlValue::Decimal(primitive::decode_decimal(bytes)?),
            T::Inet => CqlValue::Inet(primitive::decode_inet(bytes)?),
            T::Timestamp => CqlValue::Timestamp(temporal::decode_timestamp(bytes)?),
            T::Date => CqlValue::Date(temporal::decode_date(bytes)?),
            T::Time => CqlValue::Time(temporal::decode_time(bytes)?),
            T::Duration => CqlValue::Duration(temporal::decode_duration(bytes)?),
            T::List => CqlValue::List(self.decode_list(bytes, ty.list_element()?)?),
            T::Set => CqlValue::Set(self.decode_set(bytes, ty.set_element()?)?),
            T::Map => {
                let (key, value) = ty.map_types()?;
                CqlValue::Map(self.decode_map(bytes, key, value)?)
            }
            T::Udt => CqlValue::Udt(self.decode_udt(bytes, ty)?),
            T::Tuple => CqlValue::Tuple(self.decode_tuple(bytes, ty.tuple_elements()?)?),
        };
        Ok(value)
    }

    /// Decode a value that may be NULL (`None`).
    pub fn decode_nullable(&self, bytes: Option<&[u8]>, ty: &TypeSpec) -> Result<CqlValue> {
        match bytes {
            Some(bytes) => self.decode(bytes, ty),
            None => Ok(CqlValue::Null),
        }
    }

    /// Decode a value directly into the requested Rust type.
    ///
    /// NULL is accepted only by types that can represent it, such as `Option<T>`.
    pub fn decode_as<T: FromCqlValue>(&self, bytes: Option<&[u8]>, ty: &TypeSpec) -> Result<T> {
        let value = self.decode_nullable(bytes, ty)?;
        if value.is_null() {
            return T::from_null()
                .ok_or_else(|| Error::type_mismatch(short_type_name::<T>(), "null"));
        }
        T::from_cql(&value)
    }

    /// Encode a non-null value for the given type.
    ///
    /// Fails with [`Error::InvalidArgument`] when the value's kind does not
    /// fit the type.
    pub fn encode(&self, value: &CqlValue, ty: &TypeSpec) -> Result<Bytes> {
        let mut out = FrameWriter::new();
        self.encode_into(&mut out, value, ty)?;
        Ok(out.freeze())
    }

    /// Encode a value that may be NULL; NULL encodes to `None`.
    pub fn encode_nullable(&self, value: &CqlValue, ty: &TypeSpec) -> Result<Option<Bytes>> {
        if value.is_null() {
            return Ok(None);
        }
        self.encode(value, ty).map(Some)
    }

    fn encode_into(&self, out: &mut FrameWriter, value: &CqlValue, ty: &TypeSpec) -> Result<()> {
        use ColumnTypeCode as T;

        match (ty.code, value) {
            (T::Ascii, CqlValue::Ascii(s) | CqlValue::Text(s)) => {
                if !s.is_ascii() {
                    return Err(Error::invalid_argument("ascii", "non-ASCII text"));
                }
                out.write_raw(s.as_bytes());
            }
            (T::Text | T::Varchar, CqlValue::Ascii(s) | CqlValue::Text(s)) => {
                out.write_raw(s.as_bytes())
            }
            (T::Bigint | T::Counter, CqlValue::BigInt(v) | CqlValue::Counter(v)) => {
                out.write_i64(*v)
            }
            (T::Int, CqlValue::Int(v)) => out.write_i32(*v),
            (T::SmallInt, CqlValue::SmallInt(v)) => out.write_i16(*v),
            (T::TinyInt, CqlValue::TinyInt(v)) => out.write_raw(&v.to_be_bytes()),
            (T::Boolean, CqlValue::Boolean(v)) => out.write_u8(u8::from(*v)),
            (T::Double, CqlValue::Double(v)) => out.write_raw(&v.to_be_bytes()),
            (T::Float, CqlValue::Float(v)) => out.write_raw(&v.to_be_bytes()),
            (T::Blob | T::Custom, CqlValue::Blob(b) | CqlValue::Custom(b)) => out.write_raw(b),
            (T::Uuid, CqlValue::Uuid(u)) => out.write_uuid(u),
            (T::Uuid | T::Timeuuid, CqlValue::TimeUuid(u)) => out.write_uuid(u.as_uuid()),
            (T::Timeuuid, CqlValue::Uuid(u)) => {
                let time_uuid = TimeUuid::new(*u).map_err(|_| {
                    Error::invalid_argument("timeuuid (version 1 uuid)", format!("uuid {}", u))
                })?;
                out.write_uuid(time_uuid.as_uuid());
            }
            (T::Varint, CqlValue::Varint(v)) => out.write_raw(&v.to_signed_bytes_be()),
            (T::Decimal, CqlValue::Decimal(d)) => primitive::encode_decimal(out, d),
            (T::Inet, CqlValue::Inet(addr)) => primitive::encode_inet(out, addr),
            (T::Timestamp, CqlValue::Timestamp(dt)) => out.write_i64(dt.timestamp_millis()),
            (T::Date, CqlValue::Date(d)) => out.write_raw(&temporal::encode_date(*d).to_be_bytes()),
            (T::Time, CqlValue::Time(t)) => out.write_i64(temporal::encode_time(*t)?),
            (T::Duration, CqlValue::Duration(d)) => temporal::encode_duration(out, d),
            (T::List, CqlValue::List(items) | CqlValue::Set(items)) => {
                self.encode_seq(out, items, ty.list_element()?, ty)?
            }
            (T::Set, CqlValue::Set(items) | CqlValue::List(items)) => {
                self.encode_seq(out, items, ty.set_element()?, ty)?
            }
            (T::Map, CqlValue::Map(entries)) => self.encode_map(out, entries, ty)?,
            (T::Udt, CqlValue::Udt(udt)) => self.encode_udt(out, udt, ty)?,
            (T::Tuple, CqlValue::Tuple(items)) => self.encode_tuple(out, items, ty)?,
            _ => return Err(Error::invalid_argument(ty.to_string(), value.type_name())),
        }
        Ok(())
    }

    /// Rust type a value of `ty` converts to by default.
    pub fn infer_native_type(&self, ty: &TypeSpec) -> Result<NativeType> {
        use ColumnTypeCode as T;

        let native = match ty.code {
            T::Ascii | T::Text | T::Varchar => NativeType::String,
            T::Bigint | T::Counter => NativeType::I64,
            T::Int => NativeType::I32,
            T::SmallInt => NativeType::I16,
            T::TinyInt => NativeType::I8,
            T::Boolean => NativeType::Bool,
            T::Double => NativeType::F64,
            T::Float => NativeType::F32,
            T::Blob | T::Custom => NativeType::Bytes,
            T::Uuid => NativeType::Uuid,
            T::Timeuuid => NativeType::TimeUuid,
            T::Varint => NativeType::Varint,
            T::Decimal => NativeType::Decimal,
            T::Inet => NativeType::Inet,
            T::Timestamp => NativeType::Timestamp,
            T::Date => NativeType::Date,
            T::Time => NativeType::Time,
            T::Duration => NativeType::Duration,
            T::List => NativeType::List(Box::new(self.infer_native_type(ty.list_element()?)?)),
            T::Set => NativeType::Set(Box::new(self.infer_native_type(ty.set_element()?)?)),
            T::Map => {
                let (key, value) = ty.map_types()?;
                NativeType::Map(
                    Box::new(self.infer_native_type(key)?),
                    Box::new(self.infer_native_type(value)?),
                )
            }
            T::Udt => {
                ty.udt_fields()?;
                NativeType::Udt
            }
            T::Tuple => NativeType::Tuple(
                ty.tuple_elements()?
                    .iter()
                    .map(|e| self.infer_native_type(e))
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::types::{CqlDuration, UdtValue};
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use std::collections::{BTreeMap, HashSet};

    fn simple(code: ColumnTypeCode) -> TypeSpec {
        TypeSpec::simple(code)
    }

    fn roundtrip(codec: &TypeCodec, value: CqlValue, ty: &TypeSpec) {
        let bytes = codec.encode(&value, ty).unwrap();
        assert_eq!(codec.decode(&bytes, ty).unwrap(), value, "type {}", ty);
    }

    #[test]
    fn test_integer_byte_layout() {
        let codec = TypeCodec::default();
        let int = simple(ColumnTypeCode::Int);
        assert_eq!(
            codec.encode(&CqlValue::Int(-2), &int).unwrap().as_ref(),
            &[0xFF, 0xFF, 0xFF, 0xFE]
        );
        let bigint = simple(ColumnTypeCode::Bigint);
        assert_eq!(
            codec.decode(&[0, 0, 0, 0, 0, 0, 1, 0], &bigint).unwrap(),
            CqlValue::BigInt(256)
        );
    }

    #[test]
    fn test_boolean_any_non_one_is_false() {
        let codec = TypeCodec::default();
        let ty = simple(ColumnTypeCode::Boolean);
        assert_eq!(codec.decode(&[0x01], &ty).unwrap(), CqlValue::Boolean(true));
        assert_eq!(codec.decode(&[0x00], &ty).unwrap(), CqlValue::Boolean(false));
        assert_eq!(codec.decode(&[0x02], &ty).unwrap(), CqlValue::Boolean(false));
        assert_eq!(codec.encode(&CqlValue::Boolean(true), &ty).unwrap().as_ref(), &[0x01]);
    }

    #[test]
    fn test_float_big_endian() {
        let codec = TypeCodec::default();
        let bytes = codec
            .encode(&CqlValue::Double(1.0), &simple(ColumnTypeCode::Double))
            .unwrap();
        assert_eq!(bytes.as_ref(), &[0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_timestamp_floor_and_epoch() {
        let codec = TypeCodec::default();
        let ty = simple(ColumnTypeCode::Timestamp);
        let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        assert_eq!(codec.decode(&[0; 8], &ty).unwrap(), CqlValue::Timestamp(epoch));

        let before_epoch = DateTime::<Utc>::from_timestamp(-1, 999_500_000).unwrap();
        let bytes = codec.encode(&CqlValue::Timestamp(before_epoch), &ty).unwrap();
        assert_eq!(i64::from_be_bytes(bytes.as_ref().try_into().unwrap()), -1);
    }

    #[test]
    fn test_list_v2_framing() {
        let codec = TypeCodec::new(ProtocolVersion::V2);
        let ty = TypeSpec::list(simple(ColumnTypeCode::Int));
        let wire = [0, 3, 0, 4, 0, 0, 0, 1, 0, 4, 0, 0, 0, 2, 0, 4, 0, 0, 0, 3];
        let value = codec.decode(&wire, &ty).unwrap();
        assert_eq!(
            value,
            CqlValue::List(vec![CqlValue::Int(1), CqlValue::Int(2), CqlValue::Int(3)])
        );
        assert_eq!(codec.encode(&value, &ty).unwrap().as_ref(), &wire);
    }

    #[test]
    fn test_list_v4_framing() {
        let codec = TypeCodec::new(ProtocolVersion::V4);
        let ty = TypeSpec::list(simple(ColumnTypeCode::Int));
        let value = CqlValue::List(vec![CqlValue::Int(7)]);
        let bytes = codec.encode(&value, &ty).unwrap();
        assert_eq!(bytes.as_ref(), &[0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 7]);
        assert_eq!(codec.decode(&bytes, &ty).unwrap(), value);
    }

    #[test]
    fn test_map_keeps_pairs() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::map(simple(ColumnTypeCode::Text), simple(ColumnTypeCode::Int));
        let value = CqlValue::Map(vec![
            (CqlValue::from("b"), CqlValue::Int(2)),
            (CqlValue::from("a"), CqlValue::Int(1)),
        ]);
        let bytes = codec.encode(&value, &ty).unwrap();
        let decoded: BTreeMap<String, i32> = codec.decode_as(Some(bytes.as_ref()), &ty).unwrap();
        assert_eq!(decoded.get("a"), Some(&1));
        assert_eq!(decoded.get("b"), Some(&2));
        assert_eq!(codec.decode(&bytes, &ty).unwrap(), value);
    }

    #[test]
    fn test_set_deduplicates_by_wire_bytes() {
        let codec = TypeCodec::default();
        let list_ty = TypeSpec::list(simple(ColumnTypeCode::Int));
        let set_ty = TypeSpec::set(simple(ColumnTypeCode::Int));
        let raw = codec
            .encode(
                &CqlValue::List(vec![CqlValue::Int(3), CqlValue::Int(1), CqlValue::Int(3)]),
                &list_ty,
            )
            .unwrap();
        assert_eq!(
            codec.decode(&raw, &set_ty).unwrap(),
            CqlValue::Set(vec![CqlValue::Int(3), CqlValue::Int(1)])
        );
        let as_set: HashSet<i32> = codec.decode_as(Some(raw.as_ref()), &set_ty).unwrap();
        assert_eq!(as_set.len(), 2);
    }

    #[test]
    fn test_collection_trailing_bytes_rejected() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::list(simple(ColumnTypeCode::Int));
        let err = codec.decode(&[0, 0, 0xAB], &ty).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_udt_absent_trailing_fields_are_null() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::udt(
            "ks",
            "address",
            vec![
                ("street".to_string(), simple(ColumnTypeCode::Text)),
                ("zip".to_string(), simple(ColumnTypeCode::Int)),
            ],
        );
        // Only the first field is present on the wire.
        let wire = [0, 0, 0, 4, b'M', b'a', b'i', b'n'];
        match codec.decode(&wire, &ty).unwrap() {
            CqlValue::Udt(udt) => {
                assert_eq!(udt.name, "address");
                assert_eq!(udt.field("street"), Some(&CqlValue::from("Main")));
                assert_eq!(udt.field("zip"), Some(&CqlValue::Null));
            }
            other => panic!("Expected Udt, got {:?}", other),
        }

        let partial = UdtValue::new("ks", "address", vec![("zip".to_string(), CqlValue::Int(5))]);
        let bytes = codec.encode(&CqlValue::Udt(partial), &ty).unwrap();
        assert_eq!(&bytes[..4], &[0xFF, 0xFF, 0xFF, 0xFF]);

        let unknown = UdtValue::new("ks", "address", vec![("city".to_string(), CqlValue::Null)]);
        assert!(matches!(
            codec.encode(&CqlValue::Udt(unknown), &ty),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_tuple_roundtrip_with_null() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::tuple(vec![simple(ColumnTypeCode::Int), simple(ColumnTypeCode::Text)]);
        roundtrip(&codec, CqlValue::Tuple(vec![CqlValue::Int(1), CqlValue::Null]), &ty);
        let (a, b): (i32, Option<String>) = codec
            .decode_as(Some(&[0, 0, 0, 4, 0, 0, 0, 9][..]), &ty)
            .unwrap();
        assert_eq!((a, b), (9, None));
    }

    #[test]
    fn test_temporal_roundtrips() {
        let codec = TypeCodec::default();
        roundtrip(
            &codec,
            CqlValue::Date(NaiveDate::from_ymd_opt(1, 1, 1).unwrap()),
            &simple(ColumnTypeCode::Date),
        );
        roundtrip(
            &codec,
            CqlValue::Time(NaiveTime::from_hms_nano_opt(12, 30, 1, 5).unwrap()),
            &simple(ColumnTypeCode::Time),
        );
        roundtrip(
            &codec,
            CqlValue::Duration(CqlDuration::new(-1, 400, 1_000_000_007)),
            &simple(ColumnTypeCode::Duration),
        );
    }

    #[test]
    fn test_encode_wrong_kind_is_invalid_argument() {
        let codec = TypeCodec::default();
        match codec.encode(&CqlValue::from("x"), &simple(ColumnTypeCode::Int)) {
            Err(Error::InvalidArgument { expected, actual }) => {
                assert_eq!(expected, "int");
                assert_eq!(actual, "text");
            }
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
        assert!(codec
            .encode(&CqlValue::from("é"), &simple(ColumnTypeCode::Ascii))
            .is_err());
        assert!(codec
            .encode(&CqlValue::Null, &simple(ColumnTypeCode::Int))
            .is_err());
        assert_eq!(
            codec
                .encode_nullable(&CqlValue::Null, &simple(ColumnTypeCode::Int))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_null_collection_element_rejected() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::list(simple(ColumnTypeCode::Int));
        assert!(matches!(
            codec.encode(&CqlValue::List(vec![CqlValue::Null]), &ty),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_missing_type_info_is_invalid_column_info() {
        let codec = TypeCodec::default();
        let bare_list = simple(ColumnTypeCode::List);
        assert!(matches!(
            codec.decode(&[0, 0], &bare_list),
            Err(Error::InvalidColumnInfo { .. })
        ));
        assert!(codec.infer_native_type(&bare_list).is_err());
    }

    #[test]
    fn test_infer_native_type() {
        let codec = TypeCodec::default();
        let ty = TypeSpec::map(
            simple(ColumnTypeCode::Text),
            TypeSpec::list(simple(ColumnTypeCode::Int)),
        );
        assert_eq!(
            codec.infer_native_type(&ty).unwrap().to_string(),
            "BTreeMap<String, Vec<i32>>"
        );
        let tuple = TypeSpec::tuple(vec![
            simple(ColumnTypeCode::Timestamp),
            TypeSpec::set(simple(ColumnTypeCode::Uuid)),
        ]);
        assert_eq!(
            codec.infer_native_type(&tuple).unwrap().to_string(),
            "(DateTime<Utc>, BTreeSet<Uuid>)"
        );
    }

    #[test]
    fn test_decode_as_null() {
        let codec = TypeCodec::default();
        let ty = simple(ColumnTypeCode::Int);
        assert_eq!(codec.decode_as::<Option<i32>>(None, &ty).unwrap(), None);
        assert!(matches!(
            codec.decode_as::<i32>(None, &ty),
            Err(Error::TypeMismatch { .. })
        ));
        assert_eq!(codec.decode_as::<i64>(Some(&[0, 0, 0, 5][..]), &ty).unwrap(), 5);
    }
}
