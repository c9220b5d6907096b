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

// Make cheap clones clear
#![deny(clippy::clone_on_ref_ptr)]

//! Statistics-freshness tracking for a distributed SQL query optimizer.
//!
//! A [`TableStatsMeta`] records when a table, each of its columns
//! ([`ColStatsMeta`]) and its materialized indexes were last analyzed, how
//! many rows changed since, and whether newly loaded partitions are not yet
//! covered. The cost model reads this record to judge staleness; the
//! statistics scheduler reconciles completed [`AnalysisJob`]s into it via
//! [`TableStatsMeta::update`].
//!
//! Catalog access goes through the [`TableSource`] boundary trait; records
//! persist through [`Serializeable`].

pub mod analysis_job;
pub mod catalog;
pub mod col_meta;
pub mod persist;
pub mod table_meta;

pub use analysis_job::{
    parse_column_spec, AnalysisJob, AnalysisMethod, AnalysisType, JobType,
};
pub use catalog::{
    is_stats_supported, DatabaseReference, TableKind, TableSource,
};
pub use col_meta::ColStatsMeta;
pub use persist::Serializeable;
pub use table_meta::TableStatsMeta;
