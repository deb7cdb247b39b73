//! Response parsing for RESULT and ERROR messages.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::options::{ProtocolVersion, ResultOptions};
use crate::protocol::buffer::FrameReader;
use crate::protocol::codec::TypeCodec;
use crate::protocol::constants::*;
use crate::protocol::types::{
    ColumnDescription, ColumnTypeCode, Row, RowSetMetadata, TypeSpec,
};
use crate::rowset::{ExecutionInfo, RowSet};

/// Metadata section of a Rows result or a prepared statement.
#[derive(Debug, Clone)]
pub struct RowsMetadata {
    /// Raw metadata flags.
    pub flags: i32,
    /// Number of columns in each row.
    pub column_count: usize,
    /// Token for the next page, when the server has more rows.
    pub paging_state: Option<Bytes>,
    /// Column descriptions; `None` when the server skipped them.
    pub metadata: Option<RowSetMetadata>,
}

/// Parsed RESULT message.
#[derive(Debug)]
pub enum ResultResponse {
    /// Result without rows (e.g. an INSERT).
    Void(RowSet),
    /// First page of rows.
    Rows(RowSet),
    /// Result of a USE statement.
    SetKeyspace(String),
    /// Result of a PREPARE request.
    Prepared(PreparedResult),
    /// Result of a schema-altering statement.
    SchemaChange(SchemaChange),
}

/// A prepared statement.
#[derive(Debug, Clone)]
pub struct PreparedResult {
    /// Statement id used to execute it.
    pub id: Bytes,
    /// Bind variables, with partition-key indices where the protocol has them.
    pub bind_metadata: RowsMetadata,
    /// Columns of the rows the statement returns.
    pub result_metadata: RowsMetadata,
}

/// Description of a schema change.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaChange {
    /// CREATED, UPDATED or DROPPED.
    pub change_type: String,
    /// KEYSPACE, TABLE, TYPE, FUNCTION or AGGREGATE.
    pub target: String,
    /// Affected keyspace.
    pub keyspace: String,
    /// Affected object within the keyspace, if any.
    pub name: Option<String>,
    /// Argument types of a changed function or aggregate.
    pub argument_types: Vec<String>,
}

/// Data carried in the frame body before the message itself.
#[derive(Debug, Clone, Default)]
pub struct FrameExtras {
    /// Tracing session id.
    pub tracing_id: Option<Uuid>,
    /// Server warnings.
    pub warnings: Vec<String>,
    /// Custom payload entries.
    pub custom_payload: HashMap<String, Option<Bytes>>,
}

impl FrameExtras {
    /// Build execution information for a response from `queried_host`.
    pub fn into_execution_info(self, queried_host: Option<SocketAddr>) -> ExecutionInfo {
        ExecutionInfo {
            queried_host,
            tried_hosts: queried_host.into_iter().collect(),
            tracing_id: self.tracing_id,
            warnings: self.warnings,
        }
    }
}

/// Read the tracing id, warnings and custom payload announced by frame `flags`.
pub fn read_frame_extras(reader: &mut FrameReader, flags: u8) -> Result<FrameExtras> {
    let mut extras = FrameExtras::default();
    if flags & CQL_FRAME_FLAG_TRACING != 0 {
        extras.tracing_id = Some(reader.read_uuid()?);
    }
    if flags & CQL_FRAME_FLAG_WARNING != 0 {
        extras.warnings = reader.read_string_list()?;
    }
    if flags & CQL_FRAME_FLAG_CUSTOM_PAYLOAD != 0 {
        let count = reader.read_u16()?;
        for _ in 0..count {
            let key = reader.read_string()?;
            let value = reader.read_bytes()?;
            extras.custom_payload.insert(key, value);
        }
    }
    Ok(extras)
}

/// Parse an ERROR message body into [`Error::Server`].
pub fn parse_error(reader: &mut FrameReader) -> Result<Error> {
    let code = reader.read_i32()?;
    let message = reader.read_string()?;
    Ok(Error::Server { code, message })
}

/// Parse a type [option]: the type code followed by its parameters.
pub fn parse_type_option(reader: &mut FrameReader) -> Result<TypeSpec> {
    let code = ColumnTypeCode::from_raw(reader.read_u16()?)?;
    let ty = match code {
        ColumnTypeCode::Custom => TypeSpec::custom(reader.read_string()?),
        ColumnTypeCode::List => TypeSpec::list(parse_type_option(reader)?),
        ColumnTypeCode::Set => TypeSpec::set(parse_type_option(reader)?),
        ColumnTypeCode::Map => {
            let key = parse_type_option(reader)?;
            let value = parse_type_option(reader)?;
            TypeSpec::map(key, value)
        }
        ColumnTypeCode::Udt => {
            let keyspace = reader.read_string()?;
            let name = reader.read_string()?;
            let count = reader.read_u16()?;
            let mut fields = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let field_name = reader.read_string()?;
                fields.push((field_name, parse_type_option(reader)?));
            }
            TypeSpec::udt(keyspace, name, fields)
        }
        ColumnTypeCode::Tuple => {
            let count = reader.read_u16()?;
            let mut elements = Vec::with_capacity(count as usize);
            for _ in 0..count {
                elements.push(parse_type_option(reader)?);
            }
            TypeSpec::tuple(elements)
        }
        simple => TypeSpec::simple(simple),
    };
    Ok(ty)
}

/// Parse the metadata section of a Rows result or prepared statement.
///
/// Partition-key indices are read only when `with_partition_keys` is set
/// (prepared statement bind metadata, protocol v4 and later).
pub fn parse_rows_metadata(
    reader: &mut FrameReader,
    with_partition_keys: bool,
) -> Result<RowsMetadata> {
    let flags = reader.read_i32()?;
    let column_count = reader.read_i32()?;
    let column_count = usize::try_from(column_count)
        .map_err(|_| Error::protocol(format!("Negative column count: {}", column_count)))?;

    let mut partition_key_indices = Vec::new();
    if with_partition_keys {
        let pk_count = reader.read_i32()?;
        for _ in 0..pk_count.max(0) {
            partition_key_indices.push(reader.read_u16()?);
        }
    }

    let paging_state = if flags & CQL_ROWS_FLAG_HAS_MORE_PAGES != 0 {
        reader.read_bytes()?
    } else {
        None
    };

    if flags & CQL_ROWS_FLAG_NO_METADATA != 0 {
        return Ok(RowsMetadata {
            flags,
            column_count,
            paging_state,
            metadata: None,
        });
    }

    let global = if flags & CQL_ROWS_FLAG_GLOBAL_TABLES_SPEC != 0 {
        Some((reader.read_string()?, reader.read_string()?))
    } else {
        None
    };

    let mut columns = Vec::with_capacity(column_count.min(reader.remaining()));
    for _ in 0..column_count {
        let (keyspace, table) = match &global {
            Some((keyspace, table)) => (keyspace.clone(), table.clone()),
            None => (reader.read_string()?, reader.read_string()?),
        };
        let name = reader.read_string()?;
        let data_type = parse_type_option(reader)?;
        columns.push(ColumnDescription::new(keyspace, table, name, data_type));
    }

    Ok(RowsMetadata {
        flags,
        column_count,
        paging_state,
        metadata: Some(RowSetMetadata::with_partition_keys(
            columns,
            partition_key_indices,
        )),
    })
}

/// Parse a RESULT message body.
///
/// Rows results become the first page of a [`RowSet`]. When the server
/// omitted column metadata (the request asked it to), `known_metadata` is
/// used instead.
pub fn parse_result(
    reader: &mut FrameReader,
    codec: &TypeCodec,
    options: &ResultOptions,
    known_metadata: Option<&Arc<RowSetMetadata>>,
) -> Result<ResultResponse> {
    let kind = reader.read_i32()?;
    let response = match kind {
        CQL_RESULT_KIND_VOID => ResultResponse::Void(RowSet::void()),
        CQL_RESULT_KIND_ROWS => {
            ResultResponse::Rows(parse_rows(reader, codec, options, known_metadata)?)
        }
        CQL_RESULT_KIND_SET_KEYSPACE => ResultResponse::SetKeyspace(reader.read_string()?),
        CQL_RESULT_KIND_PREPARED => {
            ResultResponse::Prepared(parse_prepared(reader, codec.protocol_version())?)
        }
        CQL_RESULT_KIND_SCHEMA_CHANGE => {
            ResultResponse::SchemaChange(parse_schema_change(reader, codec.protocol_version())?)
        }
        other => {
            return Err(Error::protocol(format!("Unknown result kind: {:#06x}", other)));
        }
    };
    debug!(kind, "parsed result");
    Ok(response)
}

/// Parse a Rows result body (after the kind) into a page.
pub fn parse_rows(
    reader: &mut FrameReader,
    codec: &TypeCodec,
    options: &ResultOptions,
    known_metadata: Option<&Arc<RowSetMetadata>>,
) -> Result<RowSet> {
    let rows_metadata = parse_rows_metadata(reader, false)?;
    let metadata = match (rows_metadata.metadata, known_metadata) {
        (Some(parsed), _) => Arc::new(parsed),
        (None, Some(known)) => Arc::clone(known),
        (None, None) => {
            return Err(Error::protocol(
                "Rows result has no column metadata and none was supplied",
            ));
        }
    };
    if metadata.len() != rows_metadata.column_count {
        return Err(Error::protocol(format!(
            "Rows result has {} columns but metadata describes {}",
            rows_metadata.column_count,
            metadata.len()
        )));
    }

    let row_count = reader.read_i32()?;
    let rows = RowSet::new(Arc::clone(&metadata), options);
    for _ in 0..row_count.max(0) {
        let mut values = Vec::with_capacity(metadata.len());
        for column in metadata.columns() {
            let raw = reader.read_bytes()?;
            values.push(codec.decode_nullable(raw.as_deref(), &column.data_type)?);
        }
        rows.add_row(Row::new(values, Arc::clone(&metadata))?)?;
    }
    rows.set_paging_state(rows_metadata.paging_state);

    trace!(
        rows = row_count,
        columns = metadata.len(),
        more_pages = rows.paging_state().is_some(),
        "decoded rows page"
    );
    Ok(rows)
}

fn parse_prepared(reader: &mut FrameReader, version: ProtocolVersion) -> Result<PreparedResult> {
    let id = reader.read_short_bytes()?;
    if version >= ProtocolVersion::V5 {
        // Result metadata id.
        reader.read_short_bytes()?;
    }
    let bind_metadata = parse_rows_metadata(reader, version >= ProtocolVersion::V4)?;
    let result_metadata = parse_rows_metadata(reader, false)?;
    Ok(PreparedResult {
        id,
        bind_metadata,
        result_metadata,
    })
}

fn parse_schema_change(reader: &mut FrameReader, version: ProtocolVersion) -> Result<SchemaChange> {
    let change_type = reader.read_string()?;

    if version < ProtocolVersion::V3 {
        let keyspace = reader.read_string()?;
        let table = reader.read_string()?;
        let (target, name) = if table.is_empty() {
            ("KEYSPACE".to_string(), None)
        } else {
            ("TABLE".to_string(), Some(table))
        };
        return Ok(SchemaChange {
            change_type,
            target,
            keyspace,
            name,
            argument_types: Vec::new(),
        });
    }

    let target = reader.read_string()?;
    let keyspace = reader.read_string()?;
    let (name, argument_types) = match target.as_str() {
        "KEYSPACE" => (None, Vec::new()),
        "FUNCTION" | "AGGREGATE" => (Some(reader.read_string()?), reader.read_string_list()?),
        _ => (Some(reader.read_string()?), Vec::new()),
    };
    Ok(SchemaChange {
        change_type,
        target,
        keyspace,
        name,
        argument_types,
    })
}
