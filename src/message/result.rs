//! `RESULT` (opcode 0x08): the five result kinds, and the
//! `RowsMetadata`/`VariablesMetadata`/`ColumnSpec` shapes they share.

use bytes::{Buf, BufMut};

use crate::datatype::DataType;
use crate::error::{Error, Result};
use crate::primitives::{
    decode_bytes, decode_int, decode_short, decode_short_bytes, decode_string,
    decode_string_list, encode_bytes, encode_int, encode_short, encode_short_bytes, encode_string,
    encode_string_list, length_int, length_short, length_short_bytes, length_string,
    length_string_list, Bytes,
};
use crate::version::ProtocolVersion;

const GLOBAL_TABLES_SPEC: u32 = 0x0001;
const HAS_MORE_PAGES: u32 = 0x0002;
const NO_METADATA: u32 = 0x0004;
const METADATA_CHANGED: u32 = 0x0008;
const DSE_CONTINUOUS_PAGING: u32 = 0x4000_0000;
const DSE_LAST_CONTINUOUS_PAGE: u32 = 0x8000_0000;

const KIND_VOID: i32 = 1;
const KIND_ROWS: i32 = 2;
const KIND_SET_KEYSPACE: i32 = 3;
const KIND_PREPARED: i32 = 4;
const KIND_SCHEMA_CHANGE: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub keyspace: String,
    pub table: String,
    pub name: String,
    pub data_type: DataType,
}

/// `true` iff every column spec shares the same (keyspace, table) pair; only
/// set for a non-empty, homogeneous list.
fn is_global_tables_spec(specs: &[ColumnSpec]) -> bool {
    match specs.split_first() {
        None => false,
        Some((first, rest)) => rest
            .iter()
            .all(|s| s.keyspace == first.keyspace && s.table == first.table),
    }
}

fn encode_column_specs(
    specs: &[ColumnSpec],
    global: bool,
    sink: &mut impl BufMut,
    version: ProtocolVersion,
) -> Result<()> {
    if global {
        let first = &specs[0];
        encode_string(&first.keyspace, sink)?;
        encode_string(&first.table, sink)?;
    }
    for spec in specs {
        if !global {
            encode_string(&spec.keyspace, sink)?;
            encode_string(&spec.table, sink)?;
        }
        encode_string(&spec.name, sink)?;
        spec.data_type.encode(sink, version)?;
    }
    Ok(())
}

fn decode_column_specs(
    count: usize,
    global: bool,
    source: &mut impl Buf,
    version: ProtocolVersion,
) -> Result<Vec<ColumnSpec>> {
    let global_pair = if global {
        let keyspace = decode_string(source)?;
        let table = decode_string(source)?;
        Some((keyspace, table))
    } else {
        None
    };
    let mut specs = Vec::with_capacity(count);
    for _ in 0..count {
        let (keyspace, table) = match &global_pair {
            Some((ks, table)) => (ks.clone(), table.clone()),
            None => (decode_string(source)?, decode_string(source)?),
        };
        let name = decode_string(source)?;
        let data_type = DataType::decode(source, version)?;
        specs.push(ColumnSpec {
            keyspace,
            table,
            name,
            data_type,
        });
    }
    Ok(specs)
}

fn length_column_specs(specs: &[ColumnSpec], global: bool, version: ProtocolVersion) -> usize {
    let mut len = 0;
    if global {
        len += length_string(&specs[0].keyspace) + length_string(&specs[0].table);
    }
    for spec in specs {
        if !global {
            len += length_string(&spec.keyspace) + length_string(&spec.table);
        }
        len += length_string(&spec.name) + spec.data_type.length(version);
    }
    len
}

/// Metadata describing a RESULT Rows payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsMetadata {
    pub column_specs: Option<Vec<ColumnSpec>>,
    /// Authoritative only when `column_specs` is `None` (NO_METADATA); when
    /// specs are present the wire count is always derived from them.
    pub column_count: i32,
    pub paging_state: Option<Vec<u8>>,
    pub new_result_metadata_id: Option<Vec<u8>>,
    pub continuous_page_number: Option<i32>,
    pub last_continuous_page: bool,
}

impl RowsMetadata {
    pub fn with_specs(specs: Vec<ColumnSpec>) -> Self {
        Self {
            column_count: specs.len() as i32,
            column_specs: Some(specs),
            paging_state: None,
            new_result_metadata_id: None,
            continuous_page_number: None,
            last_continuous_page: false,
        }
    }

    pub fn no_metadata(column_count: i32) -> Self {
        Self {
            column_specs: None,
            column_count,
            paging_state: None,
            new_result_metadata_id: None,
            continuous_page_number: None,
            last_continuous_page: false,
        }
    }

    fn flags(&self, version: ProtocolVersion) -> Result<u32> {
        let mut flags = 0u32;
        let global = self
            .column_specs
            .as_deref()
            .map(is_global_tables_spec)
            .unwrap_or(false);
        if global {
            flags |= GLOBAL_TABLES_SPEC;
        }
        if self.paging_state.is_some() {
            flags |= HAS_MORE_PAGES;
        }
        if self.column_specs.is_none() {
            flags |= NO_METADATA;
        }
        if self.new_result_metadata_id.is_some() {
            flags |= METADATA_CHANGED;
        }
        if self.continuous_page_number.is_some() {
            if !version.supports_continuous_paging() {
                return Err(Error::unsupported_version(
                    "DSE continuous paging",
                    ProtocolVersion::DseV1,
                    version,
                ));
            }
            flags |= DSE_CONTINUOUS_PAGING;
            if self.last_continuous_page {
                flags |= DSE_LAST_CONTINUOUS_PAGE;
            }
        }
        Ok(flags)
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        let flags = self.flags(version)?;
        encode_int(flags as i32, sink);
        let count = match &self.column_specs {
            Some(specs) => specs.len() as i32,
            None => self.column_count,
        };
        encode_int(count, sink);

        if flags & HAS_MORE_PAGES != 0 {
            let paging_state = self.paging_state.as_ref().expect("checked above");
            encode_bytes(&Bytes::Value(paging_state.clone()), sink, false)?;
        }
        if flags & METADATA_CHANGED != 0 {
            let id = self.new_result_metadata_id.as_ref().expect("checked above");
            encode_short_bytes(id, sink)?;
        }
        if flags & DSE_CONTINUOUS_PAGING != 0 {
            let page = self.continuous_page_number.expect("checked above");
            encode_int(page, sink);
        }
        if flags & NO_METADATA == 0 {
            let specs = self.column_specs.as_deref().unwrap_or(&[]);
            encode_column_specs(specs, flags & GLOBAL_TABLES_SPEC != 0, sink, version)?;
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let flags = decode_int(source)? as u32;
        let count = decode_int(source)?;

        let paging_state = if flags & HAS_MORE_PAGES != 0 {
            match decode_bytes(source, false)? {
                Bytes::Value(bytes) => Some(bytes),
                Bytes::Null => None,
                Bytes::Unset => unreachable!("allow_unset was false"),
            }
        } else {
            None
        };
        let new_result_metadata_id = if flags & METADATA_CHANGED != 0 {
            Some(decode_short_bytes(source)?)
        } else {
            None
        };
        let continuous_page_number = if flags & DSE_CONTINUOUS_PAGING != 0 {
            if !version.supports_continuous_paging() {
                return Err(Error::unsupported_version(
                    "DSE continuous paging",
                    ProtocolVersion::DseV1,
                    version,
                ));
            }
            Some(decode_int(source)?)
        } else {
            None
        };
        let last_continuous_page = flags & DSE_LAST_CONTINUOUS_PAGE != 0;

        let column_specs = if flags & NO_METADATA == 0 {
            if count < 0 {
                return Err(Error::invalid_encoding("negative column count"));
            }
            Some(decode_column_specs(
                count as usize,
                flags & GLOBAL_TABLES_SPEC != 0,
                source,
                version,
            )?)
        } else {
            None
        };

        Ok(RowsMetadata {
            column_specs,
            column_count: count,
            paging_state,
            new_result_metadata_id,
            continuous_page_number,
            last_continuous_page,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> Result<usize> {
        let flags = self.flags(version)?;
        let mut len = length_int() + length_int();
        if flags & HAS_MORE_PAGES != 0 {
            let paging_state = self.paging_state.as_ref().expect("checked above");
            len += length_int() + paging_state.len();
        }
        if flags & METADATA_CHANGED != 0 {
            let id = self.new_result_metadata_id.as_ref().expect("checked above");
            len += length_short_bytes(id);
        }
        if flags & DSE_CONTINUOUS_PAGING != 0 {
            len += length_int();
        }
        if flags & NO_METADATA == 0 {
            let specs = self.column_specs.as_deref().unwrap_or(&[]);
            len += length_column_specs(specs, flags & GLOBAL_TABLES_SPEC != 0, version);
        }
        Ok(len)
    }
}

/// Metadata describing a prepared statement's bind markers; mirrors the
/// column-specs portion of `RowsMetadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesMetadata {
    pub pk_indices: Vec<u16>,
    pub column_specs: Vec<ColumnSpec>,
}

impl VariablesMetadata {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        let global = is_global_tables_spec(&self.column_specs);
        let mut flags = 0u32;
        if global {
            flags |= GLOBAL_TABLES_SPEC;
        }
        encode_int(flags as i32, sink);
        encode_int(self.column_specs.len() as i32, sink);
        if version.supports_pk_indices() {
            if self.pk_indices.len() > i32::MAX as usize {
                return Err(Error::invalid_argument("too many primary key indices"));
            }
            encode_int(self.pk_indices.len() as i32, sink);
            for index in &self.pk_indices {
                encode_short(*index, sink);
            }
        }
        encode_column_specs(&self.column_specs, global, sink, version)
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let flags = decode_int(source)? as u32;
        let count = decode_int(source)?;
        if count < 0 {
            return Err(Error::invalid_encoding("negative column count"));
        }
        let pk_indices = if version.supports_pk_indices() {
            let pk_count = decode_int(source)?;
            if pk_count < 0 {
                return Err(Error::invalid_encoding("negative pk index count"));
            }
            let mut indices = Vec::with_capacity(pk_count as usize);
            for _ in 0..pk_count {
                indices.push(decode_short(source)?);
            }
            indices
        } else {
            Vec::new()
        };
        let column_specs =
            decode_column_specs(count as usize, flags & GLOBAL_TABLES_SPEC != 0, source, version)?;
        Ok(VariablesMetadata {
            pk_indices,
            column_specs,
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> usize {
        let global = is_global_tables_spec(&self.column_specs);
        let mut len = length_int() + length_int();
        if version.supports_pk_indices() {
            len += length_int() + self.pk_indices.len() * length_short();
        }
        len + length_column_specs(&self.column_specs, global, version)
    }
}

/// A single RESULT Rows cell: a `bytes` value, `None` for SQL NULL. A row is
/// `column_count` cells, and the payload is `row_count` rows back to back.
pub type Cell = Option<Vec<u8>>;

fn encode_row(row: &[Cell], sink: &mut impl BufMut) -> Result<()> {
    for cell in row {
        match cell {
            Some(bytes) => encode_bytes(&Bytes::Value(bytes.clone()), sink, false)?,
            None => encode_bytes(&Bytes::Null, sink, false)?,
        }
    }
    Ok(())
}

fn decode_row(column_count: usize, source: &mut impl Buf) -> Result<Vec<Cell>> {
    let mut row = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let cell = match decode_bytes(source, false)? {
            Bytes::Value(bytes) => Some(bytes),
            Bytes::Null => None,
            Bytes::Unset => unreachable!("allow_unset was false"),
        };
        row.push(cell);
    }
    Ok(row)
}

fn row_length(row: &[Cell]) -> usize {
    row.iter()
        .map(|cell| length_int() + cell.as_ref().map(|b| b.len()).unwrap_or(0))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rows {
    pub metadata: RowsMetadata,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeType {
    Created,
    Updated,
    Dropped,
}

impl SchemaChangeType {
    fn as_str(self) -> &'static str {
        match self {
            SchemaChangeType::Created => "CREATED",
            SchemaChangeType::Updated => "UPDATED",
            SchemaChangeType::Dropped => "DROPPED",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "CREATED" => SchemaChangeType::Created,
            "UPDATED" => SchemaChangeType::Updated,
            "DROPPED" => SchemaChangeType::Dropped,
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown schema change type {other}"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChangeTarget {
    Keyspace,
    Table(String),
    Type(String),
    Function { name: String, arg_types: Vec<String> },
    Aggregate { name: String, arg_types: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChange {
    pub change_type: SchemaChangeType,
    pub keyspace: String,
    pub target: SchemaChangeTarget,
}

impl SchemaChange {
    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        if matches!(
            self.target,
            SchemaChangeTarget::Function { .. } | SchemaChangeTarget::Aggregate { .. }
        ) && !version.supports_function_schema_change()
        {
            return Err(Error::unsupported_version(
                "FUNCTION/AGGREGATE schema change",
                ProtocolVersion::V4,
                version,
            ));
        }

        encode_string(self.change_type.as_str(), sink)?;
        let target_name = match &self.target {
            SchemaChangeTarget::Keyspace => "KEYSPACE",
            SchemaChangeTarget::Table(_) => "TABLE",
            SchemaChangeTarget::Type(_) => "TYPE",
            SchemaChangeTarget::Function { .. } => "FUNCTION",
            SchemaChangeTarget::Aggregate { .. } => "AGGREGATE",
        };
        encode_string(target_name, sink)?;
        encode_string(&self.keyspace, sink)?;
        match &self.target {
            SchemaChangeTarget::Keyspace => {}
            SchemaChangeTarget::Table(name) | SchemaChangeTarget::Type(name) => {
                encode_string(name, sink)?;
            }
            SchemaChangeTarget::Function { name, arg_types }
            | SchemaChangeTarget::Aggregate { name, arg_types } => {
                encode_string(name, sink)?;
                encode_string_list(arg_types, sink)?;
            }
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let change_type = SchemaChangeType::parse(&decode_string(source)?)?;
        let target_name = decode_string(source)?;
        let keyspace = decode_string(source)?;
        let target = match target_name.as_str() {
            "KEYSPACE" => SchemaChangeTarget::Keyspace,
            "TABLE" => SchemaChangeTarget::Table(decode_string(source)?),
            "TYPE" => SchemaChangeTarget::Type(decode_string(source)?),
            "FUNCTION" => {
                if !version.supports_function_schema_change() {
                    return Err(Error::unsupported_version(
                        "FUNCTION/AGGREGATE schema change",
                        ProtocolVersion::V4,
                        version,
                    ));
                }
                let name = decode_string(source)?;
                let arg_types = decode_string_list(source)?;
                SchemaChangeTarget::Function { name, arg_types }
            }
            "AGGREGATE" => {
                if !version.supports_function_schema_change() {
                    return Err(Error::unsupported_version(
                        "FUNCTION/AGGREGATE schema change",
                        ProtocolVersion::V4,
                        version,
                    ));
                }
                let name = decode_string(source)?;
                let arg_types = decode_string_list(source)?;
                SchemaChangeTarget::Aggregate { name, arg_types }
            }
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown schema change target {other}"
                )))
            }
        };
        Ok(SchemaChange {
            change_type,
            keyspace,
            target,
        })
    }

    pub fn length(&self) -> usize {
        let target_name = match &self.target {
            SchemaChangeTarget::Keyspace => "KEYSPACE",
            SchemaChangeTarget::Table(_) => "TABLE",
            SchemaChangeTarget::Type(_) => "TYPE",
            SchemaChangeTarget::Function { .. } => "FUNCTION",
            SchemaChangeTarget::Aggregate { .. } => "AGGREGATE",
        };
        let mut len = length_string(self.change_type.as_str())
            + length_string(target_name)
            + length_string(&self.keyspace);
        len += match &self.target {
            SchemaChangeTarget::Keyspace => 0,
            SchemaChangeTarget::Table(name) | SchemaChangeTarget::Type(name) => {
                length_string(name)
            }
            SchemaChangeTarget::Function { name, arg_types }
            | SchemaChangeTarget::Aggregate { name, arg_types } => {
                length_string(name) + length_string_list(arg_types)
            }
        };
        len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    pub prepared_id: Vec<u8>,
    pub result_metadata_id: Option<Vec<u8>>,
    pub variables_metadata: VariablesMetadata,
    pub result_metadata: RowsMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultMessage {
    Void,
    Rows(Rows),
    SetKeyspace(String),
    Prepared(Prepared),
    SchemaChange(SchemaChange),
}

impl ResultMessage {
    fn kind(&self) -> i32 {
        match self {
            ResultMessage::Void => KIND_VOID,
            ResultMessage::Rows(_) => KIND_ROWS,
            ResultMessage::SetKeyspace(_) => KIND_SET_KEYSPACE,
            ResultMessage::Prepared(_) => KIND_PREPARED,
            ResultMessage::SchemaChange(_) => KIND_SCHEMA_CHANGE,
        }
    }

    pub fn encode(&self, sink: &mut impl BufMut, version: ProtocolVersion) -> Result<()> {
        encode_int(self.kind(), sink);
        match self {
            ResultMessage::Void => {}
            ResultMessage::Rows(rows) => {
                rows.metadata.encode(sink, version)?;
                if rows.rows.len() > i32::MAX as usize {
                    return Err(Error::invalid_argument("too many rows"));
                }
                encode_int(rows.rows.len() as i32, sink);
                for row in &rows.rows {
                    encode_row(row, sink)?;
                }
            }
            ResultMessage::SetKeyspace(keyspace) => encode_string(keyspace, sink)?,
            ResultMessage::Prepared(prepared) => {
                encode_short_bytes(&prepared.prepared_id, sink)?;
                if version.supports_result_metadata_id() {
                    let id = prepared.result_metadata_id.as_deref().ok_or_else(|| {
                        Error::invalid_argument(
                            "result_metadata_id is required from protocol v5 onward",
                        )
                    })?;
                    encode_short_bytes(id, sink)?;
                }
                prepared.variables_metadata.encode(sink, version)?;
                prepared.result_metadata.encode(sink, version)?;
            }
            ResultMessage::SchemaChange(change) => change.encode(sink, version)?,
        }
        Ok(())
    }

    pub fn decode(source: &mut impl Buf, version: ProtocolVersion) -> Result<Self> {
        let kind = decode_int(source)?;
        Ok(match kind {
            KIND_VOID => ResultMessage::Void,
            KIND_ROWS => {
                let metadata = RowsMetadata::decode(source, version)?;
                let row_count = decode_int(source)?;
                if row_count < 0 {
                    return Err(Error::invalid_encoding("negative row count"));
                }
                let column_count = metadata.column_count.max(0) as usize;
                let mut rows = Vec::with_capacity(row_count as usize);
                for _ in 0..row_count {
                    rows.push(decode_row(column_count, source)?);
                }
                ResultMessage::Rows(Rows { metadata, rows })
            }
            KIND_SET_KEYSPACE => ResultMessage::SetKeyspace(decode_string(source)?),
            KIND_PREPARED => {
                let prepared_id = decode_short_bytes(source)?;
                let result_metadata_id = if version.supports_result_metadata_id() {
                    Some(decode_short_bytes(source)?)
                } else {
                    None
                };
                let variables_metadata = VariablesMetadata::decode(source, version)?;
                let result_metadata = RowsMetadata::decode(source, version)?;
                ResultMessage::Prepared(Prepared {
                    prepared_id,
                    result_metadata_id,
                    variables_metadata,
                    result_metadata,
                })
            }
            KIND_SCHEMA_CHANGE => ResultMessage::SchemaChange(SchemaChange::decode(source, version)?),
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown RESULT kind {other}"
                )))
            }
        })
    }

    pub fn length(&self, version: ProtocolVersion) -> Result<usize> {
        let mut len = length_int();
        len += match self {
            ResultMessage::Void => 0,
            ResultMessage::Rows(rows) => {
                rows.metadata.length(version)?
                    + length_int()
                    + rows.rows.iter().map(|r| row_length(r)).sum::<usize>()
            }
            ResultMessage::SetKeyspace(keyspace) => length_string(keyspace),
            ResultMessage::Prepared(prepared) => {
                let mut n = length_short_bytes(&prepared.prepared_id);
                if version.supports_result_metadata_id() {
                    let id = prepared.result_metadata_id.as_deref().ok_or_else(|| {
                        Error::invalid_argument(
                            "result_metadata_id is required from protocol v5 onward",
                        )
                    })?;
                    n += length_short_bytes(id);
                }
                n += prepared.variables_metadata.length(version);
                n += prepared.result_metadata.length(version)?;
                n
            }
            ResultMessage::SchemaChange(change) => change.length(),
        };
        Ok(len)
    }
}
