//! CQL result decoding for Rust
//!
//! Typed encoding and decoding of CQL native protocol column values and a
//! paged result set that fetches following pages while it is read. The
//! network transport and query execution are left to the caller: it hands in
//! RESULT message bodies and a continuation that fetches a page by paging
//! state.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use cql_thin_rs::{parse_result, FrameReader, ResultOptions, ResultResponse, TypeCodec};
//!
//! async fn first_names(body: Bytes) -> cql_thin_rs::Result<Vec<String>> {
//!     let options = ResultOptions::default();
//!     let codec = TypeCodec::new(options.protocol_version);
//!     let mut reader = FrameReader::new(body);
//!
//!     let mut names = Vec::new();
//!     if let ResultResponse::Rows(rows) = parse_result(&mut reader, &codec, &options, None)? {
//!         while let Some(row) = rows.next_row().await? {
//!             names.push(row.get_by_name::<String>("first_name")?);
//!         }
//!     }
//!     Ok(names)
//! }
//! ```

pub mod error;
pub mod options;
pub mod protocol;
pub mod rowset;

// Re-export main types
pub use error::{Error, Result};
pub use options::{ProtocolVersion, ResultOptions};
pub use protocol::buffer::{FrameReader, FrameWriter};
pub use protocol::codec::{NativeType, TypeCodec};
pub use protocol::response::{
    parse_result, parse_rows_metadata, read_frame_extras, ResultResponse, RowsMetadata,
};
pub use protocol::types::{
    guid_byte_order, ColumnDescription, ColumnInfo, ColumnTypeCode, CqlDecimal, CqlDuration,
    CqlValue, CqlVarint, FromCqlValue, Row, RowSetMetadata, TimeUuid, TypeSpec, UdtValue,
};
pub use rowset::{BlockingRows, ExecutionInfo, PageFetcher, RowSet};
