//! CQL native protocol: frame buffers, type codec and result parsing.

pub mod buffer;
pub mod codec;
pub mod constants;
pub mod response;
pub mod types;

pub use buffer::{FrameReader, FrameWriter};
pub use codec::{NativeType, TypeCodec};
pub use response::{
    parse_error, parse_result, parse_rows, parse_rows_metadata, parse_type_option,
    read_frame_extras, FrameExtras, PreparedResult, ResultResponse, RowsMetadata, SchemaChange,
};
pub use types::{
    ColumnDescription, ColumnInfo, ColumnTypeCode, CqlValue, FromCqlValue, Row, RowSetMetadata,
    TypeSpec,
};
