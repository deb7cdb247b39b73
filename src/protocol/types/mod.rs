//! CQL data types for query results.

mod column;
mod column_type;
mod convert;
mod metadata;
mod row;
mod value;

pub use column::{ColumnDescription, ColumnInfo, TypeSpec};
pub use column_type::ColumnTypeCode;
pub use convert::FromCqlValue;
pub(crate) use convert::short_type_name;
pub use metadata::RowSetMetadata;
pub use row::Row;
pub use value::{
    guid_byte_order, CqlDecimal, CqlDuration, CqlValue, CqlVarint, TimeUuid, UdtValue,
};
