//! Conversion of decoded values into caller-requested Rust types.
//!
//! Decoding produces a `CqlValue` once; `FromCqlValue` turns it into the type a
//! caller asks for. Collections are materialized into the requested container
//! only here, converting each element recursively.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::net::{IpAddr, SocketAddr};

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::error::{Error, Result};

use super::value::{CqlDecimal, CqlDuration, CqlValue, CqlVarint, TimeUuid, UdtValue};

/// Types that can be produced from a decoded CQL value.
pub trait FromCqlValue: Sized {
    /// Convert a non-null value.
    fn from_cql(value: &CqlValue) -> Result<Self>;

    /// Value to use for NULL; `None` means the type cannot represent NULL.
    fn from_null() -> Option<Self> {
        None
    }
}

/// `std::any::type_name` without module paths, e.g. `Vec<String>`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    fn last_segment(path: &str) -> &str {
        path.rsplit("::").next().unwrap_or(path)
    }

    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn mismatch<T>(value: &CqlValue) -> Error {
    Error::type_mismatch(short_type_name::<T>(), value.type_name())
}

/// Convert a nested element, mapping NULL through `from_null`.
fn element<T: FromCqlValue>(value: &CqlValue) -> Result<T> {
    if value.is_null() {
        return T::from_null().ok_or_else(|| mismatch::<T>(value));
    }
    T::from_cql(value)
}

/// Re-report an element failure against the whole container.
fn container_mismatch<C>(container: &CqlValue, failed: &CqlValue) -> Error {
    Error::type_mismatch(
        short_type_name::<C>(),
        format!("{}<{}>", container.type_name(), failed.type_name()),
    )
}

impl<T: FromCqlValue> FromCqlValue for Option<T> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_cql(value).map(Some)
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }
}

impl FromCqlValue for CqlValue {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        Ok(value.clone())
    }

    fn from_null() -> Option<Self> {
        Some(CqlValue::Null)
    }
}

macro_rules! impl_from_cql {
    ($ty:ty { $($pat:pat => $conv:expr),+ $(,)? }) => {
        impl FromCqlValue for $ty {
            fn from_cql(value: &CqlValue) -> Result<Self> {
                match value {
                    $($pat => Ok($conv),)+
                    other => Err(mismatch::<$ty>(other)),
                }
            }
        }
    };
}

impl_from_cql!(bool { CqlValue::Boolean(v) => *v });
impl_from_cql!(i8 { CqlValue::TinyInt(v) => *v });
impl_from_cql!(i16 {
    CqlValue::SmallInt(v) => *v,
    CqlValue::TinyInt(v) => *v as i16,
});
impl_from_cql!(i32 {
    CqlValue::Int(v) => *v,
    CqlValue::SmallInt(v) => *v as i32,
    CqlValue::TinyInt(v) => *v as i32,
});
impl_from_cql!(i64 {
    CqlValue::BigInt(v) | CqlValue::Counter(v) => *v,
    CqlValue::Int(v) => *v as i64,
    CqlValue::SmallInt(v) => *v as i64,
    CqlValue::TinyInt(v) => *v as i64,
});
impl_from_cql!(f32 { CqlValue::Float(v) => *v });
impl_from_cql!(f64 {
    CqlValue::Double(v) => *v,
    CqlValue::Float(v) => *v as f64,
});
impl_from_cql!(String { CqlValue::Ascii(s) | CqlValue::Text(s) => s.clone() });
impl_from_cql!(Bytes { CqlValue::Blob(b) | CqlValue::Custom(b) => b.clone() });
impl_from_cql!(Uuid {
    CqlValue::Uuid(u) => *u,
    CqlValue::TimeUuid(u) => *u.as_uuid(),
});
impl_from_cql!(DateTime<Utc> { CqlValue::Timestamp(dt) => *dt });
impl_from_cql!(NaiveDateTime { CqlValue::Timestamp(dt) => dt.naive_utc() });
impl_from_cql!(DateTime<FixedOffset> { CqlValue::Timestamp(dt) => dt.fixed_offset() });
impl_from_cql!(NaiveDate { CqlValue::Date(d) => *d });
impl_from_cql!(NaiveTime { CqlValue::Time(t) => *t });
impl_from_cql!(IpAddr { CqlValue::Inet(addr) => addr.ip() });
impl_from_cql!(SocketAddr { CqlValue::Inet(addr) => *addr });
impl_from_cql!(CqlVarint { CqlValue::Varint(v) => v.clone() });
impl_from_cql!(CqlDecimal { CqlValue::Decimal(v) => v.clone() });
impl_from_cql!(BigInt {
    CqlValue::Varint(v) => v.as_bigint().clone(),
    CqlValue::BigInt(v) | CqlValue::Counter(v) => BigInt::from(*v),
    CqlValue::Int(v) => BigInt::from(*v),
    CqlValue::SmallInt(v) => BigInt::from(*v),
    CqlValue::TinyInt(v) => BigInt::from(*v),
});
impl_from_cql!(BigDecimal {
    CqlValue::Decimal(v) => v.to_big_decimal(),
    CqlValue::Varint(v) => BigDecimal::from(v.as_bigint().clone()),
});
impl_from_cql!(CqlDuration { CqlValue::Duration(v) => *v });
impl_from_cql!(UdtValue { CqlValue::Udt(v) => v.clone() });

impl FromCqlValue for TimeUuid {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        match value {
            CqlValue::TimeUuid(u) => Ok(*u),
            CqlValue::Uuid(u) => TimeUuid::new(*u),
            other => Err(mismatch::<TimeUuid>(other)),
        }
    }
}

/// Elements of a list or set, converted one by one into any collection.
fn collect_elements<C, T>(value: &CqlValue) -> Result<C>
where
    C: FromIterator<T>,
    T: FromCqlValue,
{
    match value {
        CqlValue::List(items) | CqlValue::Set(items) => items
            .iter()
            .map(|item| element::<T>(item).map_err(|_| container_mismatch::<C>(value, item)))
            .collect(),
        other => Err(mismatch::<C>(other)),
    }
}

fn collect_entries<C, K, V>(value: &CqlValue) -> Result<C>
where
    C: FromIterator<(K, V)>,
    K: FromCqlValue,
    V: FromCqlValue,
{
    match value {
        CqlValue::Map(entries) => entries
            .iter()
            .map(|(k, v)| {
                let key = element::<K>(k).map_err(|_| container_mismatch::<C>(value, k))?;
                let val = element::<V>(v).map_err(|_| container_mismatch::<C>(value, v))?;
                Ok((key, val))
            })
            .collect(),
        other => Err(mismatch::<C>(other)),
    }
}

impl<T: FromCqlValue> FromCqlValue for Vec<T> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        collect_elements::<Self, T>(value)
    }
}

impl<T: FromCqlValue + Eq + Hash> FromCqlValue for HashSet<T> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        collect_elements::<Self, T>(value)
    }
}

impl<T: FromCqlValue + Ord> FromCqlValue for BTreeSet<T> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        collect_elements::<Self, T>(value)
    }
}

impl<K: FromCqlValue + Eq + Hash, V: FromCqlValue> FromCqlValue for HashMap<K, V> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        collect_entries::<Self, K, V>(value)
    }
}

impl<K: FromCqlValue + Ord, V: FromCqlValue> FromCqlValue for BTreeMap<K, V> {
    fn from_cql(value: &CqlValue) -> Result<Self> {
        collect_entries::<Self, K, V>(value)
    }
}

macro_rules! impl_from_cql_tuple {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromCqlValue),+> FromCqlValue for ($($name,)+) {
            fn from_cql(value: &CqlValue) -> Result<Self> {
                match value {
                    CqlValue::Tuple(items) if items.len() <= $len => {
                        let get = |i: usize| items.get(i).unwrap_or(&CqlValue::Null);
                        Ok(($(
                            element::<$name>(get($idx))
                                .map_err(|_| container_mismatch::<Self>(value, get($idx)))?,
                        )+))
                    }
                    other => Err(mismatch::<Self>(other)),
                }
            }
        }
    };
}

impl_from_cql_tuple!(2; A: 0, B: 1);
impl_from_cql_tuple!(3; A: 0, B: 1, C: 2);
impl_from_cql_tuple!(4; A: 0, B: 1, C: 2, D: 3);
