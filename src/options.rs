//! Options controlling how results are decoded and paged.

use std::fmt;
use std::time::Duration;

/// Native protocol version negotiated with the server.
///
/// Only affects how collections are framed: versions 1 and 2 use 2-byte
/// element counts and lengths, later versions use 4-byte ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(u8);

impl ProtocolVersion {
    pub const V1: ProtocolVersion = ProtocolVersion(1);
    pub const V2: ProtocolVersion = ProtocolVersion(2);
    pub const V3: ProtocolVersion = ProtocolVersion(3);
    pub const V4: ProtocolVersion = ProtocolVersion(4);
    pub const V5: ProtocolVersion = ProtocolVersion(5);

    /// Create from the raw version number.
    pub fn new(version: u8) -> Self {
        Self(version)
    }

    /// Raw version number.
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Whether collection counts and lengths are 2-byte shorts.
    pub fn uses_short_collection_lengths(&self) -> bool {
        self.0 < 3
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::V2
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Result decoding and paging options.
#[derive(Debug, Clone)]
pub struct ResultOptions {
    /// Protocol version used to frame collection values.
    pub protocol_version: ProtocolVersion,
    /// Fetch following pages automatically while iterating (default: true).
    pub auto_page: bool,
    /// How long a consumer waits for a page fetch (default: 20 seconds).
    pub fetch_timeout: Duration,
}

impl ResultOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self {
            protocol_version: ProtocolVersion::default(),
            auto_page: true,
            fetch_timeout: Duration::from_secs(20),
        }
    }

    /// Set the protocol version.
    pub fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Enable or disable automatic paging.
    ///
    /// With automatic paging disabled a result is considered fully fetched
    /// even if the server reported more pages; call
    /// [`RowSet::fetch_more_results`](crate::RowSet::fetch_more_results) to
    /// page manually.
    pub fn with_auto_page(mut self, auto_page: bool) -> Self {
        self.auto_page = auto_page;
        self
    }

    /// Set the page fetch timeout.
    ///
    /// # Example
    ///
    /// ```
    /// use cql_thin_rs::ResultOptions;
    /// use std::time::Duration;
    ///
    /// let options = ResultOptions::new().with_fetch_timeout(Duration::from_secs(5));
    /// assert_eq!(options.fetch_timeout, Duration::from_secs(5));
    /// ```
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self::new()
    }
}
