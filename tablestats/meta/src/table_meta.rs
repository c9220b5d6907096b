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

//! [`TableStatsMeta`]: per-table statistics-freshness record and the
//! reconcile algorithm that folds completed analysis jobs into it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tablestats_common::Result;

use crate::analysis_job::{AnalysisJob, JobType};
use crate::catalog::{is_stats_supported, TableKind, TableSource};
use crate::col_meta::ColStatsMeta;

/// Statistics-freshness record for a single table.
///
/// One instance exists per physical table, created at the table's first
/// successful analysis and mutated in place for the table's entire life. The
/// record is shared by reference between analysis-job completion callbacks
/// and optimizer threads: every operation takes `&self` and all mutable
/// state lives behind atomics or concurrent maps, so readers never block and
/// concurrent writers degrade to last-writer-wins per key rather than
/// corrupting the record. The external scheduler is still expected to
/// serialize analysis jobs per table.
///
/// The serde field tags are the persisted wire contract: tags are stable
/// identifiers that must never be renamed, only added. Fields introduced
/// after the first format version default on load (`#[serde(default)]`), so
/// payloads written by older versions deserialize with empty maps and unset
/// flags instead of failing.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableStatsMeta {
    #[serde(rename = "ctlId")]
    pub catalog_id: i64,

    #[serde(rename = "ctlName")]
    pub catalog_name: String,

    #[serde(rename = "dbId")]
    pub db_id: i64,

    #[serde(rename = "dbName")]
    pub db_name: String,

    #[serde(rename = "tblId")]
    pub table_id: i64,

    #[serde(rename = "tblName")]
    pub table_name: String,

    /// Index the record is specific to, -1 when it describes the table
    #[serde(rename = "idxId")]
    pub index_id: i64,

    /// Last known row count. Authoritative only for [`TableKind::Managed`]
    /// tables.
    #[serde(rename = "rowCount", default)]
    row_count: AtomicI64,

    /// Time of the most recent reconciliation, epoch millis
    #[serde(rename = "updateTime", default)]
    updated_time: AtomicI64,

    /// Rows changed since the last complete analysis
    #[serde(rename = "updatedRows", default)]
    updated_rows: AtomicI64,

    // Tables queried frequently deserve a higher analyze priority in the
    // future.
    #[serde(rename = "queriedTimes", default)]
    queried_times: AtomicI64,

    /// Trigger kind of the most recent reconciliation
    #[serde(rename = "trigger", default)]
    job_type: RwLock<JobType>,

    /// True once newly loaded partitions are not yet covered by a full
    /// reconciliation
    #[serde(rename = "newPartitionLoaded", default)]
    new_partition_loaded: AtomicBool,

    /// True when the current statistics values were supplied manually
    #[serde(rename = "userInjected", default)]
    user_injected: AtomicBool,

    #[serde(rename = "cols", default)]
    col_stats: DashMap<String, ColStatsMeta>,

    #[serde(rename = "irc", default)]
    index_row_counts: DashMap<i64, i64>,
}

impl TableStatsMeta {
    /// Creates the freshness record for `table` from its first completed
    /// analysis job.
    ///
    /// Captures the table's identity from the catalog, stores `row_count`
    /// and reconciles `job` into the fresh record. Fails if the catalog
    /// cannot resolve the owning database, in which case no record exists.
    pub fn try_new(
        row_count: i64,
        job: &AnalysisJob,
        table: &dyn TableSource,
    ) -> Result<Self> {
        let database = table.database()?;
        let meta = Self {
            catalog_id: database.catalog_id,
            catalog_name: database.catalog_name,
            db_id: database.db_id,
            db_name: database.db_name,
            table_id: table.table_id(),
            table_name: table.table_name().to_string(),
            index_id: -1,
            row_count: AtomicI64::new(row_count),
            updated_time: AtomicI64::new(0),
            updated_rows: AtomicI64::new(0),
            queried_times: AtomicI64::new(0),
            job_type: RwLock::new(job.job_type),
            new_partition_loaded: AtomicBool::new(false),
            user_injected: AtomicBool::new(false),
            col_stats: DashMap::new(),
            index_row_counts: DashMap::new(),
        };
        meta.update(job, Some(table))?;
        Ok(meta)
    }

    /// Reconciles a completed (or partially completed) analysis job into
    /// this record.
    ///
    /// Column-level merging happens first and does not depend on the
    /// catalog: every column in the job's list gets its entry created or
    /// refreshed with the job's timestamp, method, type and trigger kind;
    /// columns the job did not touch are left alone.
    ///
    /// When `table` is supplied the table-level state is reconciled as well:
    /// managed tables adopt the job's row count and index row counts (stale
    /// entries for dropped indexes are purged against the live index set),
    /// a job covering every statistics-supported column resets the
    /// stale-delta counters, and a manual non-injected analysis clears the
    /// injected flag. All fallible catalog reads happen before the first
    /// table-level store, so a catalog failure propagates with the
    /// table-level state untouched.
    pub fn update(
        &self,
        job: &AnalysisJob,
        table: Option<&dyn TableSource>,
    ) -> Result<()> {
        let updated_time = job.tbl_update_time;
        self.updated_time.store(updated_time, Ordering::Relaxed);
        if job.user_inject {
            self.user_injected.store(true, Ordering::Relaxed);
        }
        for col in &job.columns {
            match self.col_stats.entry(col.clone()) {
                Entry::Occupied(mut entry) => {
                    let meta = entry.get_mut();
                    meta.updated_time = updated_time;
                    meta.analysis_method = job.analysis_method;
                    meta.analysis_type = job.analysis_type;
                    meta.job_type = job.job_type;
                }
                Entry::Vacant(entry) => {
                    entry.insert(ColStatsMeta::new(
                        updated_time,
                        job.analysis_method,
                        job.analysis_type,
                        job.job_type,
                        0,
                    ));
                }
            }
        }
        *self.job_type.write() = job.job_type;

        let Some(table) = table else {
            return Ok(());
        };
        // Resolve everything the catalog can fail on before mutating
        // table-level state.
        let live_index_ids = table.index_ids()?;
        let schema = table.base_schema()?;

        if table.kind() == TableKind::Managed {
            self.row_count.store(job.row_count, Ordering::Relaxed);
            for (index_id, rows) in &job.index_row_counts {
                self.index_row_counts.insert(*index_id, *rows);
            }
            self.purge_stale_index_row_counts(&live_index_ids);
        }

        let full_coverage = schema
            .fields()
            .iter()
            .filter(|field| is_stats_supported(field.data_type()))
            .all(|field| job.col_to_partitions.contains_key(field.name()));
        if full_coverage {
            self.updated_rows.store(0, Ordering::Relaxed);
            self.new_partition_loaded.store(false, Ordering::Relaxed);
        }

        // A manual analyze that computed real values supersedes previously
        // injected statistics.
        if self.job_type() == JobType::Manual && !job.user_inject {
            self.user_injected.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Time the named column was last analyzed, or 0 if it never was
    pub fn find_column_last_update_time(&self, col_name: &str) -> i64 {
        self.col_stats
            .get(col_name)
            .map(|entry| entry.updated_time)
            .unwrap_or(0)
    }

    pub fn find_column_stats_meta(&self, col_name: &str) -> Option<ColStatsMeta> {
        self.col_stats.get(col_name).map(|entry| entry.value().clone())
    }

    /// Forgets the named column, used when it is dropped from the schema
    pub fn remove_column(&self, col_name: &str) {
        self.col_stats.remove(col_name);
    }

    pub fn remove_all_columns(&self) {
        self.col_stats.clear();
    }

    /// Snapshot of the currently tracked column names
    pub fn analyzed_columns(&self) -> HashSet<String> {
        self.col_stats
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Row count of the given materialized index, or -1 if unknown
    pub fn index_row_count(&self, index_id: i64) -> i64 {
        self.index_row_counts
            .get(&index_id)
            .map(|rows| *rows)
            .unwrap_or(-1)
    }

    pub fn clear_index_row_counts(&self) {
        self.index_row_counts.clear();
    }

    /// Zeroes the reconciliation timestamp and every column's stale-delta.
    /// Column entries are kept.
    pub fn reset(&self) {
        self.updated_time.store(0, Ordering::Relaxed);
        for mut entry in self.col_stats.iter_mut() {
            entry.value_mut().clear();
        }
    }

    pub fn row_count(&self) -> i64 {
        self.row_count.load(Ordering::Relaxed)
    }

    pub fn updated_time(&self) -> i64 {
        self.updated_time.load(Ordering::Relaxed)
    }

    pub fn updated_rows(&self) -> i64 {
        self.updated_rows.load(Ordering::Relaxed)
    }

    pub fn queried_times(&self) -> i64 {
        self.queried_times.load(Ordering::Relaxed)
    }

    pub fn job_type(&self) -> JobType {
        *self.job_type.read()
    }

    pub fn new_partition_loaded(&self) -> bool {
        self.new_partition_loaded.load(Ordering::Relaxed)
    }

    pub fn user_injected(&self) -> bool {
        self.user_injected.load(Ordering::Relaxed)
    }

    /// Records one query against this table. Advisory only: queried tables
    /// are candidates for higher analyze priority.
    pub fn incr_queried_times(&self) -> i64 {
        self.queried_times.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Accumulates rows changed by a load or mutation since the last
    /// complete analysis
    pub fn add_updated_rows(&self, delta: i64) -> i64 {
        self.updated_rows.fetch_add(delta, Ordering::Relaxed) + delta
    }

    /// Flags that a newly loaded partition is not yet covered by statistics
    pub fn mark_new_partition_loaded(&self) {
        self.new_partition_loaded.store(true, Ordering::Relaxed);
    }

    fn purge_stale_index_row_counts(&self, live_index_ids: &[i64]) {
        let before = self.index_row_counts.len();
        self.index_row_counts
            .retain(|index_id, _| live_index_ids.contains(index_id));
        let purged = before - self.index_row_counts.len();
        if purged > 0 {
            debug!(
                "purged {purged} stale index row counts for table {}",
                self.table_name
            );
        }
    }
}
