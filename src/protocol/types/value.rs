//! CQL value types for query results and bound values.

use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::{BigInt, Sign};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::constants::UUID_V1_EPOCH_OFFSET;

/// A single decoded CQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// NULL value.
    Null,
    /// ASCII-only text.
    Ascii(String),
    /// 64-bit signed integer.
    BigInt(i64),
    /// Opaque bytes.
    Blob(Bytes),
    /// Boolean.
    Boolean(bool),
    /// Counter column value.
    Counter(i64),
    /// Arbitrary-precision decimal.
    Decimal(CqlDecimal),
    /// 64-bit IEEE-754 float.
    Double(f64),
    /// 32-bit IEEE-754 float.
    Float(f32),
    /// 32-bit signed integer.
    Int(i32),
    /// UTF-8 text (`text` and `varchar`).
    Text(String),
    /// Instant with millisecond precision.
    Timestamp(DateTime<Utc>),
    /// UUID of any version.
    Uuid(Uuid),
    /// Arbitrary-precision integer.
    Varint(CqlVarint),
    /// Version 1 (time-based) UUID.
    TimeUuid(TimeUuid),
    /// IP address; port is 0 unless the value came in the address+port form.
    Inet(SocketAddr),
    /// Date without time zone.
    Date(NaiveDate),
    /// Time of day with nanosecond precision.
    Time(NaiveTime),
    /// 16-bit signed integer.
    SmallInt(i16),
    /// 8-bit signed integer.
    TinyInt(i8),
    /// Months, days and nanoseconds.
    Duration(CqlDuration),
    /// Ordered list.
    List(Vec<CqlValue>),
    /// Set in wire order, without duplicates.
    Set(Vec<CqlValue>),
    /// Map entries in wire order.
    Map(Vec<(CqlValue, CqlValue)>),
    /// User-defined type value.
    Udt(UdtValue),
    /// Tuple elements (missing elements are `Null`).
    Tuple(Vec<CqlValue>),
    /// Raw bytes of a custom type.
    Custom(Bytes),
}

impl CqlValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// CQL name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Ascii(_) => "ascii",
            CqlValue::BigInt(_) => "bigint",
            CqlValue::Blob(_) => "blob",
            CqlValue::Boolean(_) => "boolean",
            CqlValue::Counter(_) => "counter",
            CqlValue::Decimal(_) => "decimal",
            CqlValue::Double(_) => "double",
            CqlValue::Float(_) => "float",
            CqlValue::Int(_) => "int",
            CqlValue::Text(_) => "text",
            CqlValue::Timestamp(_) => "timestamp",
            CqlValue::Uuid(_) => "uuid",
            CqlValue::Varint(_) => "varint",
            CqlValue::TimeUuid(_) => "timeuuid",
            CqlValue::Inet(_) => "inet",
            CqlValue::Date(_) => "date",
            CqlValue::Time(_) => "time",
            CqlValue::SmallInt(_) => "smallint",
            CqlValue::TinyInt(_) => "tinyint",
            CqlValue::Duration(_) => "duration",
            CqlValue::List(_) => "list",
            CqlValue::Set(_) => "set",
            CqlValue::Map(_) => "map",
            CqlValue::Udt(_) => "udt",
            CqlValue::Tuple(_) => "tuple",
            CqlValue::Custom(_) => "custom",
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CqlValue::Ascii(s) | CqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64 (any integer kind that fits).
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            CqlValue::BigInt(v) | CqlValue::Counter(v) => Some(*v),
            CqlValue::Int(v) => Some(*v as i64),
            CqlValue::SmallInt(v) => Some(*v as i64),
            CqlValue::TinyInt(v) => Some(*v as i64),
            CqlValue::Varint(v) => v.to_i64(),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            CqlValue::Blob(b) | CqlValue::Custom(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the elements of a list, set or tuple.
    pub fn as_seq(&self) -> Option<&[CqlValue]> {
        match self {
            CqlValue::List(v) | CqlValue::Set(v) | CqlValue::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get the entries of a map.
    pub fn as_map(&self) -> Option<&[(CqlValue, CqlValue)]> {
        match self {
            CqlValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for CqlValue {
                fn from(v: $ty) -> Self {
                    CqlValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Boolean,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Bytes => Blob,
    Uuid => Uuid,
    TimeUuid => TimeUuid,
    DateTime<Utc> => Timestamp,
    NaiveDate => Date,
    NaiveTime => Time,
    SocketAddr => Inet,
    CqlVarint => Varint,
    CqlDecimal => Decimal,
    CqlDuration => Duration,
    UdtValue => Udt,
}

impl From<&str> for CqlValue {
    fn from(v: &str) -> Self {
        CqlValue::Text(v.to_string())
    }
}

/// Timestamps without a zone are taken to be UTC.
impl From<NaiveDateTime> for CqlValue {
    fn from(v: NaiveDateTime) -> Self {
        CqlValue::Timestamp(v.and_utc())
    }
}

impl From<IpAddr> for CqlValue {
    fn from(v: IpAddr) -> Self {
        CqlValue::Inet(SocketAddr::new(v, 0))
    }
}

impl<T: Into<CqlValue>> From<Vec<T>> for CqlValue {
    fn from(v: Vec<T>) -> Self {
        CqlValue::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CqlValue>> From<Option<T>> for CqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CqlValue::Null)
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_seq(f: &mut fmt::Formatter<'_>, items: &[CqlValue], open: &str, close: &str) -> fmt::Result {
            write!(f, "{}", open)?;
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", v)?;
            }
            write!(f, "{}", close)
        }

        match self {
            CqlValue::Null => write!(f, "NULL"),
            CqlValue::Ascii(s) | CqlValue::Text(s) => write!(f, "{}", s),
            CqlValue::BigInt(v) | CqlValue::Counter(v) => write!(f, "{}", v),
            CqlValue::Blob(b) | CqlValue::Custom(b) => {
                write!(f, "0x")?;
                for byte in b.iter() {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            CqlValue::Boolean(v) => write!(f, "{}", v),
            CqlValue::Decimal(v) => write!(f, "{}", v),
            CqlValue::Double(v) => write!(f, "{}", v),
            CqlValue::Float(v) => write!(f, "{}", v),
            CqlValue::Int(v) => write!(f, "{}", v),
            CqlValue::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3fZ")),
            CqlValue::Uuid(u) => write!(f, "{}", u),
            CqlValue::Varint(v) => write!(f, "{}", v),
            CqlValue::TimeUuid(u) => write!(f, "{}", u),
            CqlValue::Inet(addr) if addr.port() == 0 => write!(f, "{}", addr.ip()),
            CqlValue::Inet(addr) => write!(f, "{}", addr),
            CqlValue::Date(d) => write!(f, "{}", d),
            CqlValue::Time(t) => write!(f, "{}", t),
            CqlValue::SmallInt(v) => write!(f, "{}", v),
            CqlValue::TinyInt(v) => write!(f, "{}", v),
            CqlValue::Duration(d) => write!(f, "{}", d),
            CqlValue::List(items) => write_seq(f, items, "[", "]"),
            CqlValue::Set(items) => write_seq(f, items, "{", "}"),
            CqlValue::Tuple(items) => write_seq(f, items, "(", ")"),
            CqlValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            CqlValue::Udt(udt) => {
                write!(f, "{{")?;
                for (i, (name, v)) in udt.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Arbitrary-precision integer (`varint`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CqlVarint(BigInt);

impl CqlVarint {
    /// Create from big-endian two's complement bytes. Empty input is zero.
    pub fn from_signed_bytes_be(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self(BigInt::default());
        }
        Self(BigInt::from_signed_bytes_be(bytes))
    }

    /// Big-endian two's complement bytes in minimal form.
    pub fn to_signed_bytes_be(&self) -> Vec<u8> {
        self.0.to_signed_bytes_be()
    }

    /// The underlying integer.
    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    /// Whether the value is negative.
    pub fn is_negative(&self) -> bool {
        self.0.sign() == Sign::Minus
    }

    /// Convert to i64 if the value fits.
    pub fn to_i64(&self) -> Option<i64> {
        i64::try_from(&self.0).ok()
    }

    /// Convert to i128 if the value fits.
    pub fn to_i128(&self) -> Option<i128> {
        i128::try_from(&self.0).ok()
    }
}

impl From<BigInt> for CqlVarint {
    fn from(v: BigInt) -> Self {
        Self(v)
    }
}

impl From<CqlVarint> for BigInt {
    fn from(v: CqlVarint) -> Self {
        v.0
    }
}

impl From<i64> for CqlVarint {
    fn from(v: i64) -> Self {
        Self(BigInt::from(v))
    }
}

impl From<i128> for CqlVarint {
    fn from(v: i128) -> Self {
        Self(BigInt::from(v))
    }
}

impl fmt::Display for CqlVarint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Longest run of padding zeros written before switching to exponent form.
const DECIMAL_MAX_PLAIN_ZEROS: i64 = 32;

/// Arbitrary-precision decimal: `unscaled * 10^-scale`.
///
/// Kept as the exact wire pair so equal wire values compare equal; use
/// [`to_big_decimal`](Self::to_big_decimal) for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CqlDecimal {
    /// Unscaled integer value.
    pub unscaled: CqlVarint,
    /// Number of digits after the decimal point (may be negative).
    pub scale: i32,
}

impl CqlDecimal {
    /// Create a decimal from its unscaled value and scale.
    pub fn new(unscaled: CqlVarint, scale: i32) -> Self {
        Self { unscaled, scale }
    }

    /// Convert to a [`BigDecimal`].
    pub fn to_big_decimal(&self) -> BigDecimal {
        BigDecimal::new(self.unscaled.0.clone(), i64::from(self.scale))
    }
}

impl TryFrom<BigDecimal> for CqlDecimal {
    type Error = Error;

    fn try_from(value: BigDecimal) -> Result<Self> {
        let (unscaled, scale) = value.as_bigint_and_exponent();
        let scale = i32::try_from(scale).map_err(|_| {
            Error::invalid_argument("decimal with a 32-bit scale", format!("scale {}", scale))
        })?;
        Ok(Self::new(CqlVarint(unscaled), scale))
    }
}

impl fmt::Display for CqlDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.0.magnitude().to_string();
        if self.unscaled.is_negative() {
            write!(f, "-")?;
        }
        let scale = i64::from(self.scale);
        let len = digits.len() as i64;

        if scale <= 0 {
            if digits == "0" || -scale <= DECIMAL_MAX_PLAIN_ZEROS {
                write!(f, "{}", digits)?;
                if digits != "0" {
                    write!(f, "{}", "0".repeat(-scale as usize))?;
                }
                return Ok(());
            }
        } else if len > scale {
            let (int_part, frac_part) = digits.split_at((len - scale) as usize);
            return write!(f, "{}.{}", int_part, frac_part);
        } else if scale - len <= DECIMAL_MAX_PLAIN_ZEROS {
            return write!(f, "0.{}{}", "0".repeat((scale - len) as usize), digits);
        }

        // Scientific form: one digit before the point.
        let exponent = len - 1 - scale;
        let (first, rest) = digits.split_at(1);
        write!(f, "{}", first)?;
        if !rest.is_empty() {
            write!(f, ".{}", rest)?;
        }
        write!(f, "E{}{}", if exponent >= 0 { "+" } else { "" }, exponent)
    }
}

/// CQL `duration`: months, days and nanoseconds kept separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CqlDuration {
    pub months: i32,
    pub days: i32,
    pub nanoseconds: i64,
}

impl CqlDuration {
    /// Create a duration.
    pub fn new(months: i32, days: i32, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            nanoseconds,
        }
    }
}

impl fmt::Display for CqlDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mo{}d{}ns", self.months, self.days, self.nanoseconds)
    }
}

/// A version 1 UUID, ordered by its embedded timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeUuid(Uuid);

impl TimeUuid {
    /// Wrap a UUID, checking that it is time-based.
    pub fn new(uuid: Uuid) -> Result<Self> {
        if uuid.get_version_num() != 1 {
            return Err(Error::type_mismatch(
                "timeuuid (version 1)",
                format!("uuid version {}", uuid.get_version_num()),
            ));
        }
        Ok(Self(uuid))
    }

    /// The wrapped UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Raw 60-bit timestamp: 100ns intervals since 1582-10-15.
    pub fn raw_timestamp(&self) -> u64 {
        let b = self.0.as_bytes();
        let time_low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
        let time_mid = u16::from_be_bytes([b[4], b[5]]) as u64;
        let time_hi = (u16::from_be_bytes([b[6], b[7]]) & 0x0FFF) as u64;
        (time_hi << 48) | (time_mid << 32) | time_low
    }

    /// Instant embedded in the UUID.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let since_unix = self.raw_timestamp() as i128 - UUID_V1_EPOCH_OFFSET as i128;
        let secs = since_unix.div_euclid(10_000_000) as i64;
        let nanos = (since_unix.rem_euclid(10_000_000) * 100) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

impl From<TimeUuid> for Uuid {
    fn from(v: TimeUuid) -> Self {
        v.0
    }
}

impl Ord for TimeUuid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw_timestamp()
            .cmp(&other.raw_timestamp())
            .then_with(|| self.0.as_bytes().cmp(other.0.as_bytes()))
    }
}

impl PartialOrd for TimeUuid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined type value.
#[derive(Debug, Clone, PartialEq)]
pub struct UdtValue {
    /// Keyspace where the type is defined.
    pub keyspace: String,
    /// Type name.
    pub name: String,
    /// Fields in declaration order; absent fields are `Null`.
    pub fields: Vec<(String, CqlValue)>,
}

impl UdtValue {
    /// Create a UDT value.
    pub fn new(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<(String, CqlValue)>,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            name: name.into(),
            fields,
        }
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&CqlValue> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, v)| v)
    }
}

/// Convert between RFC 4122 byte order and the mixed-endian GUID layout
/// (first three fields little-endian). Applying it twice is the identity.
pub fn guid_byte_order(bytes: [u8; 16]) -> [u8; 16] {
    Uuid::from_bytes(bytes).to_bytes_le()
}
