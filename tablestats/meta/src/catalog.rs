// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The catalog boundary: [`TableSource`] is the read-only handle through
//! which freshness metadata resolves a table's identity, schema and index
//! set. Catalog implementations live outside this crate.

use std::fmt::{self, Display, Formatter};

use arrow_schema::{DataType, SchemaRef};
use tablestats_common::Result;

/// Identity of the database (and owning catalog) a table belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseReference {
    pub catalog_id: i64,
    pub catalog_name: String,
    pub db_id: i64,
    pub db_name: String,
}

/// Storage kind of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Internally managed storage; row counts reported by analysis jobs are
    /// authoritative for these tables
    Managed,
    /// Externally managed storage (foreign catalogs, lake formats)
    External,
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TableKind::Managed => write!(f, "MANAGED"),
            TableKind::External => write!(f, "EXTERNAL"),
        }
    }
}

/// A read-only handle to a live table in the catalog.
///
/// Resolution methods are fallible: in a distributed catalog the owning
/// database, schema or index set may require a remote lookup that can fail.
/// Such failures propagate unmodified to the caller, see
/// [`TableStatsMeta::update`].
///
/// [`TableStatsMeta::update`]: crate::TableStatsMeta::update
pub trait TableSource: Send + Sync {
    /// Resolve the owning database and catalog identity
    fn database(&self) -> Result<DatabaseReference>;

    fn table_id(&self) -> i64;

    fn table_name(&self) -> &str;

    fn kind(&self) -> TableKind;

    /// Current row count as known to the catalog
    fn row_count(&self) -> i64;

    /// Ids of the table's current materialized indexes
    fn index_ids(&self) -> Result<Vec<i64>>;

    /// The table's base schema, in column order
    fn base_schema(&self) -> Result<SchemaRef>;
}

/// Returns true if columns of this type can carry collected statistics.
///
/// Nested and union types have no single comparable value domain, so no
/// fundamental statistics are collected for them and they do not count
/// towards analysis coverage.
pub fn is_stats_supported(data_type: &DataType) -> bool {
    !matches!(
        data_type,
        DataType::Null
            | DataType::List(_)
            | DataType::LargeList(_)
            | DataType::FixedSizeList(_, _)
            | DataType::Struct(_)
            | DataType::Map(_, _)
            | DataType::Union(_, _)
    )
}
