//! Column descriptions and composite type information.
//!
//! A column's type is a `TypeSpec`: the wire type code plus, for composite
//! types, a `ColumnInfo` describing element, key/value or field types. The
//! structure is recursive and mirrors the [option] grammar of the protocol.

use std::fmt;

use crate::error::{Error, Result};

use super::column_type::ColumnTypeCode;

/// Full description of a CQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    /// Wire type code.
    pub code: ColumnTypeCode,
    /// Extra parameters for composite and custom types.
    pub info: Option<ColumnInfo>,
}

/// Type parameters for composite and custom column types.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnInfo {
    /// `list<element>`.
    List { element: Box<TypeSpec> },
    /// `set<element>`.
    Set { element: Box<TypeSpec> },
    /// `map<key, value>`.
    Map {
        key: Box<TypeSpec>,
        value: Box<TypeSpec>,
    },
    /// User-defined type with ordered, named fields.
    Udt {
        keyspace: String,
        name: String,
        fields: Vec<ColumnDescription>,
    },
    /// Tuple with ordered, unnamed elements.
    Tuple { elements: Vec<TypeSpec> },
    /// Server-side custom type identified by its class name.
    Custom { class_name: String },
}

impl TypeSpec {
    /// A non-composite type.
    pub fn simple(code: ColumnTypeCode) -> Self {
        Self { code, info: None }
    }

    /// `list<element>`.
    pub fn list(element: TypeSpec) -> Self {
        Self {
            code: ColumnTypeCode::List,
            info: Some(ColumnInfo::List {
                element: Box::new(element),
            }),
        }
    }

    /// `set<element>`.
    pub fn set(element: TypeSpec) -> Self {
        Self {
            code: ColumnTypeCode::Set,
            info: Some(ColumnInfo::Set {
                element: Box::new(element),
            }),
        }
    }

    /// `map<key, value>`.
    pub fn map(key: TypeSpec, value: TypeSpec) -> Self {
        Self {
            code: ColumnTypeCode::Map,
            info: Some(ColumnInfo::Map {
                key: Box::new(key),
                value: Box::new(value),
            }),
        }
    }

    /// A user-defined type; `fields` are (name, type) in declaration order.
    pub fn udt(
        keyspace: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<(String, TypeSpec)>,
    ) -> Self {
        let keyspace = keyspace.into();
        let fields = fields
            .into_iter()
            .map(|(field_name, data_type)| {
                ColumnDescription::new(keyspace.clone(), String::new(), field_name, data_type)
            })
            .collect();
        Self {
            code: ColumnTypeCode::Udt,
            info: Some(ColumnInfo::Udt {
                keyspace,
                name: name.into(),
                fields,
            }),
        }
    }

    /// `tuple<...>`.
    pub fn tuple(elements: Vec<TypeSpec>) -> Self {
        Self {
            code: ColumnTypeCode::Tuple,
            info: Some(ColumnInfo::Tuple { elements }),
        }
    }

    /// A custom type.
    pub fn custom(class_name: impl Into<String>) -> Self {
        Self {
            code: ColumnTypeCode::Custom,
            info: Some(ColumnInfo::Custom {
                class_name: class_name.into(),
            }),
        }
    }

    /// Element type of a `list`.
    pub fn list_element(&self) -> Result<&TypeSpec> {
        match &self.info {
            Some(ColumnInfo::List { element }) if self.code == ColumnTypeCode::List => {
                Ok(element)
            }
            _ => Err(self.shape_error("expected list element info")),
        }
    }

    /// Element type of a `set`.
    pub fn set_element(&self) -> Result<&TypeSpec> {
        match &self.info {
            Some(ColumnInfo::Set { element }) if self.code == ColumnTypeCode::Set => Ok(element),
            _ => Err(self.shape_error("expected set element info")),
        }
    }

    /// Key and value types of a `map`.
    pub fn map_types(&self) -> Result<(&TypeSpec, &TypeSpec)> {
        match &self.info {
            Some(ColumnInfo::Map { key, value }) if self.code == ColumnTypeCode::Map => {
                Ok((key, value))
            }
            _ => Err(self.shape_error("expected map key/value info")),
        }
    }

    /// Keyspace, name and fields of a UDT.
    pub fn udt_fields(&self) -> Result<(&str, &str, &[ColumnDescription])> {
        match &self.info {
            Some(ColumnInfo::Udt {
                keyspace,
                name,
                fields,
            }) if self.code == ColumnTypeCode::Udt => Ok((keyspace, name, fields)),
            _ => Err(self.shape_error("expected udt field info")),
        }
    }

    /// Element types of a tuple.
    pub fn tuple_elements(&self) -> Result<&[TypeSpec]> {
        match &self.info {
            Some(ColumnInfo::Tuple { elements }) if self.code == ColumnTypeCode::Tuple => {
                Ok(elements)
            }
            _ => Err(self.shape_error("expected tuple element info")),
        }
    }

    fn shape_error(&self, message: &str) -> Error {
        Error::invalid_column_info(self.code.cql_name(), message)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(ColumnInfo::List { element }) => write!(f, "list<{}>", element),
            Some(ColumnInfo::Set { element }) => write!(f, "set<{}>", element),
            Some(ColumnInfo::Map { key, value }) => write!(f, "map<{}, {}>", key, value),
            Some(ColumnInfo::Udt { keyspace, name, .. }) => write!(f, "{}.{}", keyspace, name),
            Some(ColumnInfo::Tuple { elements }) => {
                write!(f, "tuple<")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ">")
            }
            Some(ColumnInfo::Custom { class_name }) => write!(f, "'{}'", class_name),
            None => write!(f, "{}", self.code),
        }
    }
}

/// A column in a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    /// Keyspace owning the table.
    pub keyspace: String,
    /// Table name.
    pub table: String,
    /// Column name.
    pub name: String,
    /// Column data type.
    pub data_type: TypeSpec,
    /// Static column.
    pub is_static: bool,
    /// Clustering column with descending order.
    pub is_reversed: bool,
    /// Frozen collection or UDT.
    pub is_frozen: bool,
}

impl ColumnDescription {
    /// Create a column description with default schema flags.
    pub fn new(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: TypeSpec,
    ) -> Self {
        Self {
            keyspace: keyspace.into(),
            table: table.into(),
            name: name.into(),
            data_type,
            is_static: false,
            is_reversed: false,
            is_frozen: false,
        }
    }

    /// Wire type code of the column.
    pub fn type_code(&self) -> ColumnTypeCode {
        self.data_type.code
    }

    /// Composite type information, if any.
    pub fn type_info(&self) -> Option<&ColumnInfo> {
        self.data_type.info.as_ref()
    }
}
