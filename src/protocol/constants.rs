//! CQL native protocol constants.

// Column type codes ([option] ids)
pub const CQL_TYPE_CUSTOM: u16 = 0x0000;
pub const CQL_TYPE_ASCII: u16 = 0x0001;
pub const CQL_TYPE_BIGINT: u16 = 0x0002;
pub const CQL_TYPE_BLOB: u16 = 0x0003;
pub const CQL_TYPE_BOOLEAN: u16 = 0x0004;
pub const CQL_TYPE_COUNTER: u16 = 0x0005;
pub const CQL_TYPE_DECIMAL: u16 = 0x0006;
pub const CQL_TYPE_DOUBLE: u16 = 0x0007;
pub const CQL_TYPE_FLOAT: u16 = 0x0008;
pub const CQL_TYPE_INT: u16 = 0x0009;
pub const CQL_TYPE_TEXT: u16 = 0x000A;
pub const CQL_TYPE_TIMESTAMP: u16 = 0x000B;
pub const CQL_TYPE_UUID: u16 = 0x000C;
pub const CQL_TYPE_VARCHAR: u16 = 0x000D;
pub const CQL_TYPE_VARINT: u16 = 0x000E;
pub const CQL_TYPE_TIMEUUID: u16 = 0x000F;
pub const CQL_TYPE_INET: u16 = 0x0010;
pub const CQL_TYPE_DATE: u16 = 0x0011;
pub const CQL_TYPE_TIME: u16 = 0x0012;
pub const CQL_TYPE_SMALLINT: u16 = 0x0013;
pub const CQL_TYPE_TINYINT: u16 = 0x0014;
pub const CQL_TYPE_DURATION: u16 = 0x0015;
pub const CQL_TYPE_LIST: u16 = 0x0020;
pub const CQL_TYPE_MAP: u16 = 0x0021;
pub const CQL_TYPE_SET: u16 = 0x0022;
pub const CQL_TYPE_UDT: u16 = 0x0030;
pub const CQL_TYPE_TUPLE: u16 = 0x0031;

// RESULT kinds
pub const CQL_RESULT_KIND_VOID: i32 = 0x0001;
pub const CQL_RESULT_KIND_ROWS: i32 = 0x0002;
pub const CQL_RESULT_KIND_SET_KEYSPACE: i32 = 0x0003;
pub const CQL_RESULT_KIND_PREPARED: i32 = 0x0004;
pub const CQL_RESULT_KIND_SCHEMA_CHANGE: i32 = 0x0005;

// Rows metadata flags
pub const CQL_ROWS_FLAG_GLOBAL_TABLES_SPEC: i32 = 0x0001;
pub const CQL_ROWS_FLAG_HAS_MORE_PAGES: i32 = 0x0002;
pub const CQL_ROWS_FLAG_NO_METADATA: i32 = 0x0004;

// Frame header flags
pub const CQL_FRAME_FLAG_COMPRESSION: u8 = 0x01;
pub const CQL_FRAME_FLAG_TRACING: u8 = 0x02;
pub const CQL_FRAME_FLAG_CUSTOM_PAYLOAD: u8 = 0x04;
pub const CQL_FRAME_FLAG_WARNING: u8 = 0x08;

/// Offset added to the day count of a `date` value so that the epoch is 2^31.
pub const CQL_DATE_EPOCH_OFFSET: i64 = 1 << 31;

/// Nanoseconds in a day; `time` values must be strictly below this.
pub const CQL_NANOS_PER_DAY: i64 = 86_400_000_000_000;

/// 100ns intervals between 1582-10-15 (UUID v1 epoch) and 1970-01-01.
pub const UUID_V1_EPOCH_OFFSET: u64 = 0x01B2_1DD2_1381_4000;
