//! CQL column type codes.
//!
//! This enum is the closed set of wire type identifiers. Composite codes
//! (`List`, `Set`, `Map`, `Udt`, `Tuple`) and `Custom` carry additional
//! parameters in a `ColumnInfo`.

use crate::error::{Error, Result};
use crate::protocol::constants::*;

/// CQL wire type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnTypeCode {
    Custom,
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Text,
    Timestamp,
    Uuid,
    Varchar,
    Varint,
    Timeuuid,
    Inet,
    Date,
    Time,
    SmallInt,
    TinyInt,
    Duration,
    List,
    Map,
    Set,
    Udt,
    Tuple,
}

impl ColumnTypeCode {
    /// Create from the raw [option] id.
    ///
    /// Returns `Err(Error::InvalidTypeCode)` for ids outside the protocol.
    pub fn from_raw(code: u16) -> Result<Self> {
        let code = match code {
            CQL_TYPE_CUSTOM => ColumnTypeCode::Custom,
            CQL_TYPE_ASCII => ColumnTypeCode::Ascii,
            CQL_TYPE_BIGINT => ColumnTypeCode::Bigint,
            CQL_TYPE_BLOB => ColumnTypeCode::Blob,
            CQL_TYPE_BOOLEAN => ColumnTypeCode::Boolean,
            CQL_TYPE_COUNTER => ColumnTypeCode::Counter,
            CQL_TYPE_DECIMAL => ColumnTypeCode::Decimal,
            CQL_TYPE_DOUBLE => ColumnTypeCode::Double,
            CQL_TYPE_FLOAT => ColumnTypeCode::Float,
            CQL_TYPE_INT => ColumnTypeCode::Int,
            CQL_TYPE_TEXT => ColumnTypeCode::Text,
            CQL_TYPE_TIMESTAMP => ColumnTypeCode::Timestamp,
            CQL_TYPE_UUID => ColumnTypeCode::Uuid,
            CQL_TYPE_VARCHAR => ColumnTypeCode::Varchar,
            CQL_TYPE_VARINT => ColumnTypeCode::Varint,
            CQL_TYPE_TIMEUUID => ColumnTypeCode::Timeuuid,
            CQL_TYPE_INET => ColumnTypeCode::Inet,
            CQL_TYPE_DATE => ColumnTypeCode::Date,
            CQL_TYPE_TIME => ColumnTypeCode::Time,
            CQL_TYPE_SMALLINT => ColumnTypeCode::SmallInt,
            CQL_TYPE_TINYINT => ColumnTypeCode::TinyInt,
            CQL_TYPE_DURATION => ColumnTypeCode::Duration,
            CQL_TYPE_LIST => ColumnTypeCode::List,
            CQL_TYPE_MAP => ColumnTypeCode::Map,
            CQL_TYPE_SET => ColumnTypeCode::Set,
            CQL_TYPE_UDT => ColumnTypeCode::Udt,
            CQL_TYPE_TUPLE => ColumnTypeCode::Tuple,
            _ => return Err(Error::InvalidTypeCode { code }),
        };
        Ok(code)
    }

    /// Get the raw [option] id.
    pub fn raw(&self) -> u16 {
        match self {
            ColumnTypeCode::Custom => CQL_TYPE_CUSTOM,
            ColumnTypeCode::Ascii => CQL_TYPE_ASCII,
            ColumnTypeCode::Bigint => CQL_TYPE_BIGINT,
            ColumnTypeCode::Blob => CQL_TYPE_BLOB,
            ColumnTypeCode::Boolean => CQL_TYPE_BOOLEAN,
            ColumnTypeCode::Counter => CQL_TYPE_COUNTER,
            ColumnTypeCode::Decimal => CQL_TYPE_DECIMAL,
            ColumnTypeCode::Double => CQL_TYPE_DOUBLE,
            ColumnTypeCode::Float => CQL_TYPE_FLOAT,
            ColumnTypeCode::Int => CQL_TYPE_INT,
            ColumnTypeCode::Text => CQL_TYPE_TEXT,
            ColumnTypeCode::Timestamp => CQL_TYPE_TIMESTAMP,
            ColumnTypeCode::Uuid => CQL_TYPE_UUID,
            ColumnTypeCode::Varchar => CQL_TYPE_VARCHAR,
            ColumnTypeCode::Varint => CQL_TYPE_VARINT,
            ColumnTypeCode::Timeuuid => CQL_TYPE_TIMEUUID,
            ColumnTypeCode::Inet => CQL_TYPE_INET,
            ColumnTypeCode::Date => CQL_TYPE_DATE,
            ColumnTypeCode::Time => CQL_TYPE_TIME,
            ColumnTypeCode::SmallInt => CQL_TYPE_SMALLINT,
            ColumnTypeCode::TinyInt => CQL_TYPE_TINYINT,
            ColumnTypeCode::Duration => CQL_TYPE_DURATION,
            ColumnTypeCode::List => CQL_TYPE_LIST,
            ColumnTypeCode::Map => CQL_TYPE_MAP,
            ColumnTypeCode::Set => CQL_TYPE_SET,
            ColumnTypeCode::Udt => CQL_TYPE_UDT,
            ColumnTypeCode::Tuple => CQL_TYPE_TUPLE,
        }
    }

    /// Whether values of this type need a `ColumnInfo` to be decoded.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            ColumnTypeCode::List
                | ColumnTypeCode::Map
                | ColumnTypeCode::Set
                | ColumnTypeCode::Udt
                | ColumnTypeCode::Tuple
                | ColumnTypeCode::Custom
        )
    }

    /// CQL name of the type, as written in schema statements.
    pub fn cql_name(&self) -> &'static str {
        match self {
            ColumnTypeCode::Custom => "custom",
            ColumnTypeCode::Ascii => "ascii",
            ColumnTypeCode::Bigint => "bigint",
            ColumnTypeCode::Blob => "blob",
            ColumnTypeCode::Boolean => "boolean",
            ColumnTypeCode::Counter => "counter",
            ColumnTypeCode::Decimal => "decimal",
            ColumnTypeCode::Double => "double",
            ColumnTypeCode::Float => "float",
            ColumnTypeCode::Int => "int",
            ColumnTypeCode::Text => "text",
            ColumnTypeCode::Timestamp => "timestamp",
            ColumnTypeCode::Uuid => "uuid",
            ColumnTypeCode::Varchar => "varchar",
            ColumnTypeCode::Varint => "varint",
            ColumnTypeCode::Timeuuid => "timeuuid",
            ColumnTypeCode::Inet => "inet",
            ColumnTypeCode::Date => "date",
            ColumnTypeCode::Time => "time",
            ColumnTypeCode::SmallInt => "smallint",
            ColumnTypeCode::TinyInt => "tinyint",
            ColumnTypeCode::Duration => "duration",
            ColumnTypeCode::List => "list",
            ColumnTypeCode::Map => "map",
            ColumnTypeCode::Set => "set",
            ColumnTypeCode::Udt => "udt",
            ColumnTypeCode::Tuple => "tuple",
        }
    }
}

impl std::fmt::Display for ColumnTypeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cql_name())
    }
}
