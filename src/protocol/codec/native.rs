//! Default Rust representation of each CQL type.

use std::fmt;

/// The Rust type a column converts to by default.
///
/// Displayed as the Rust type name, e.g. `Vec<i32>` or
/// `BTreeMap<String, i32>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Uuid,
    TimeUuid,
    Timestamp,
    Date,
    Time,
    Inet,
    Varint,
    Decimal,
    Duration,
    /// Ordered growable sequence (`list`).
    List(Box<NativeType>),
    /// Ordered unique set (`set`).
    Set(Box<NativeType>),
    /// Key-ordered mapping (`map`).
    Map(Box<NativeType>, Box<NativeType>),
    Udt,
    Tuple(Vec<NativeType>),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Bool => write!(f, "bool"),
            NativeType::I8 => write!(f, "i8"),
            NativeType::I16 => write!(f, "i16"),
            NativeType::I32 => write!(f, "i32"),
            NativeType::I64 => write!(f, "i64"),
            NativeType::F32 => write!(f, "f32"),
            NativeType::F64 => write!(f, "f64"),
            NativeType::String => write!(f, "String"),
            NativeType::Bytes => write!(f, "Bytes"),
            NativeType::Uuid => write!(f, "Uuid"),
            NativeType::TimeUuid => write!(f, "TimeUuid"),
            NativeType::Timestamp => write!(f, "DateTime<Utc>"),
            NativeType::Date => write!(f, "NaiveDate"),
            NativeType::Time => write!(f, "NaiveTime"),
            NativeType::Inet => write!(f, "SocketAddr"),
            NativeType::Varint => write!(f, "CqlVarint"),
            NativeType::Decimal => write!(f, "CqlDecimal"),
            NativeType::Duration => write!(f, "CqlDuration"),
            NativeType::List(element) => write!(f, "Vec<{}>", element),
            NativeType::Set(element) => write!(f, "BTreeSet<{}>", element),
            NativeType::Map(key, value) => write!(f, "BTreeMap<{}, {}>", key, value),
            NativeType::Udt => write!(f, "UdtValue"),
            NativeType::Tuple(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}
