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

//! End to end tests for freshness reconciliation against a mock catalog

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema, SchemaRef};
use tablestats_common::{catalog_err, Result};
use tablestats_meta::{
    AnalysisJob, AnalysisMethod, AnalysisType, DatabaseReference, JobType,
    Serializeable, TableKind, TableSource, TableStatsMeta,
};

/// Catalog stand-in with scriptable failures
struct TestTable {
    kind: TableKind,
    index_ids: Vec<i64>,
    schema: SchemaRef,
    fail_database: bool,
    fail_index_ids: bool,
}

impl TestTable {
    fn managed(index_ids: Vec<i64>, schema: SchemaRef) -> Self {
        Self {
            kind: TableKind::Managed,
            index_ids,
            schema,
            fail_database: false,
            fail_index_ids: false,
        }
    }
}

impl TableSource for TestTable {
    fn database(&self) -> Result<DatabaseReference> {
        if self.fail_database {
            return catalog_err!("database for table t1 has been dropped");
        }
        Ok(DatabaseReference {
            catalog_id: 1,
            catalog_name: "internal".to_string(),
            db_id: 2,
            db_name: "db1".to_string(),
        })
    }

    fn table_id(&self) -> i64 {
        3
    }

    fn table_name(&self) -> &str {
        "t1"
    }

    fn kind(&self) -> TableKind {
        self.kind
    }

    fn row_count(&self) -> i64 {
        0
    }

    fn index_ids(&self) -> Result<Vec<i64>> {
        if self.fail_index_ids {
            return catalog_err!("index list for table t1 is unavailable");
        }
        Ok(self.index_ids.clone())
    }

    fn base_schema(&self) -> Result<SchemaRef> {
        Ok(Arc::clone(&self.schema))
    }
}

fn schema_of(fields: &[(&str, DataType)]) -> SchemaRef {
    Arc::new(Schema::new(
        fields
            .iter()
            .map(|(name, data_type)| Field::new(*name, data_type.clone(), true))
            .collect::<Vec<_>>(),
    ))
}

/// col -> {p1} coverage map for the given columns
fn covering(columns: &[&str]) -> HashMap<String, HashSet<String>> {
    columns
        .iter()
        .map(|col| {
            (
                col.to_string(),
                ["p1".to_string()].into_iter().collect::<HashSet<_>>(),
            )
        })
        .collect()
}

fn system_job(column_spec: &str, time: i64) -> AnalysisJob {
    AnalysisJob::new(JobType::System)
        .with_update_time(time)
        .with_column_spec(column_spec)
        .with_method(AnalysisMethod::Full)
        .with_analysis_type(AnalysisType::Fundamentals)
}

#[test]
fn first_analysis_creates_the_record() {
    let table = TestTable::managed(
        vec![1],
        schema_of(&[("a", DataType::Int64), ("b", DataType::Utf8)]),
    );
    let job = system_job("[a, b]", 100).with_row_count(1000);

    let meta = TableStatsMeta::try_new(1000, &job, &table).unwrap();

    assert_eq!(meta.catalog_name, "internal");
    assert_eq!(meta.db_id, 2);
    assert_eq!(meta.table_name, "t1");
    assert_eq!(meta.index_id, -1);
    assert_eq!(meta.row_count(), 1000);
    assert_eq!(
        meta.analyzed_columns(),
        ["a", "b"].iter().map(|c| c.to_string()).collect::<HashSet<_>>()
    );
    assert_eq!(meta.find_column_last_update_time("a"), 100);
    assert_eq!(meta.find_column_last_update_time("c"), 0);
    assert_eq!(meta.job_type(), JobType::System);
}

#[test]
fn construction_fails_when_catalog_cannot_resolve_database() {
    let mut table = TestTable::managed(vec![], schema_of(&[("a", DataType::Int64)]));
    table.fail_database = true;

    let err = TableStatsMeta::try_new(0, &system_job("[a]", 1), &table).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Catalog error: database for table t1 has been dropped"
    );
}

#[test]
fn reapplying_the_same_job_is_idempotent() {
    let table = TestTable::managed(
        vec![1, 2],
        schema_of(&[("a", DataType::Int64), ("b", DataType::Utf8)]),
    );
    let job = system_job("[a, b]", 100)
        .with_row_count(500)
        .with_index_row_counts(HashMap::from([(1, 300), (2, 200)]))
        .with_covered_partitions(covering(&["a", "b"]));

    let meta = TableStatsMeta::try_new(500, &job, &table).unwrap();
    let first_a = meta.find_column_stats_meta("a").unwrap();

    meta.update(&job, Some(&table)).unwrap();

    assert_eq!(meta.row_count(), 500);
    assert_eq!(meta.index_row_count(1), 300);
    assert_eq!(meta.index_row_count(2), 200);
    assert_eq!(meta.find_column_stats_meta("a").unwrap(), first_a);
    assert_eq!(meta.updated_time(), 100);
}

#[test]
fn full_coverage_resets_staleness_counters() {
    // c is a nested column: unsupported, so it does not count towards
    // coverage
    let table = TestTable::managed(
        vec![1],
        schema_of(&[
            ("a", DataType::Int64),
            ("b", DataType::Utf8),
            (
                "c",
                DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
            ),
        ]),
    );
    let seed = system_job("[a]", 50);
    let meta = TableStatsMeta::try_new(0, &seed, &table).unwrap();

    meta.add_updated_rows(123);
    meta.mark_new_partition_loaded();

    let full = system_job("[a, b]", 100).with_covered_partitions(covering(&["a", "b"]));
    meta.update(&full, Some(&table)).unwrap();

    assert_eq!(meta.updated_rows(), 0);
    assert!(!meta.new_partition_loaded());
}

#[test]
fn partial_coverage_leaves_staleness_counters_alone() {
    let table = TestTable::managed(
        vec![1],
        schema_of(&[("a", DataType::Int64), ("b", DataType::Utf8)]),
    );
    let seed = system_job("[a]", 50);
    let meta = TableStatsMeta::try_new(0, &seed, &table).unwrap();

    meta.add_updated_rows(123);
    meta.mark_new_partition_loaded();

    let partial = system_job("[a]", 100).with_covered_partitions(covering(&["a"]));
    meta.update(&partial, Some(&table)).unwrap();

    assert_eq!(meta.updated_rows(), 123);
    assert!(meta.new_partition_loaded());
}

#[test]
fn dropped_indexes_are_purged_on_reconcile() {
    let schema = schema_of(&[("a", DataType::Int64)]);
    let table = TestTable::managed(vec![1, 2, 3], Arc::clone(&schema));
    let job = system_job("[a]", 100)
        .with_index_row_counts(HashMap::from([(1, 10), (2, 20), (3, 99)]));
    let meta = TableStatsMeta::try_new(0, &job, &table).unwrap();
    assert_eq!(meta.index_row_count(3), 99);

    // Index 3 was dropped before the next analysis
    let table = TestTable::managed(vec![1, 2], schema);
    let job = system_job("[a]", 200).with_index_row_counts(HashMap::from([(1, 11)]));
    meta.update(&job, Some(&table)).unwrap();

    assert_eq!(meta.index_row_count(1), 11);
    assert_eq!(meta.index_row_count(2), 20);
    assert_eq!(meta.index_row_count(3), -1);
}

#[test]
fn manual_reanalysis_supersedes_injected_stats() {
    let table =
        TestTable::managed(vec![1], schema_of(&[("a", DataType::Int64)]));
    let injected = AnalysisJob::new(JobType::Manual)
        .with_update_time(100)
        .with_column_spec("[a]")
        .with_user_inject(true);
    let meta = TableStatsMeta::try_new(0, &injected, &table).unwrap();
    assert!(meta.user_injected());

    // A system job does not clear the flag
    meta.update(&system_job("[a]", 150), Some(&table)).unwrap();
    assert!(meta.user_injected());

    // A manual, non-injected analyze does
    let manual = AnalysisJob::new(JobType::Manual)
        .with_update_time(200)
        .with_column_spec("[a]");
    meta.update(&manual, Some(&table)).unwrap();
    assert!(!meta.user_injected());
}

#[test]
fn catalog_failure_leaves_table_level_state_untouched() {
    let schema = schema_of(&[("a", DataType::Int64)]);
    let table = TestTable::managed(vec![1], Arc::clone(&schema));
    let job = system_job("[a]", 100)
        .with_row_count(1000)
        .with_index_row_counts(HashMap::from([(1, 10)]));
    let meta = TableStatsMeta::try_new(1000, &job, &table).unwrap();
    meta.add_updated_rows(7);

    let mut broken = TestTable::managed(vec![1], schema);
    broken.fail_index_ids = true;
    let retry = system_job("[a, b]", 200)
        .with_row_count(2000)
        .with_index_row_counts(HashMap::from([(1, 99)]))
        .with_covered_partitions(covering(&["a"]));

    let err = meta.update(&retry, Some(&broken)).unwrap_err();
    assert!(err.to_string().starts_with("Catalog error:"));

    // Table-dependent state is exactly as before the failed call
    assert_eq!(meta.row_count(), 1000);
    assert_eq!(meta.index_row_count(1), 10);
    assert_eq!(meta.updated_rows(), 7);
    // Column-level merging does not depend on the catalog and may commit
    assert_eq!(meta.find_column_last_update_time("b"), 200);
}

#[test]
fn record_survives_serialization_mid_life() {
    let table = TestTable::managed(
        vec![1, 2],
        schema_of(&[("a", DataType::Int64), ("b", DataType::Utf8)]),
    );
    let job = system_job("[a, b]", 100)
        .with_row_count(500)
        .with_index_row_counts(HashMap::from([(1, 300), (2, 200)]));
    let meta = TableStatsMeta::try_new(500, &job, &table).unwrap();
    meta.incr_queried_times();

    let bytes = meta.to_bytes().unwrap();
    let decoded = TableStatsMeta::from_bytes(&bytes).unwrap();

    assert_eq!(decoded.analyzed_columns(), meta.analyzed_columns());
    assert_eq!(decoded.index_row_count(2), 200);
    assert_eq!(decoded.queried_times(), 1);
    assert_eq!(
        decoded.find_column_stats_meta("a"),
        meta.find_column_stats_meta("a")
    );

    // The decoded record is live: reconciliation keeps working on it
    let table = TestTable::managed(vec![1], schema_of(&[("a", DataType::Int64)]));
    decoded
        .update(&system_job("[a]", 300), Some(&table))
        .unwrap();
    assert_eq!(decoded.find_column_last_update_time("a"), 300);
    assert_eq!(decoded.index_row_count(2), -1);
}

#[test]
fn concurrent_readers_and_writers_do_not_corrupt_the_record() {
    let _ = env_logger::builder().is_test(true).try_init();

    let table = TestTable::managed(vec![1], schema_of(&[("a", DataType::Int64)]));
    let meta = TableStatsMeta::try_new(0, &system_job("[a]", 1), &table).unwrap();

    const WRITERS: usize = 4;
    const QUERIES_PER_READER: i64 = 1000;

    std::thread::scope(|scope| {
        for writer in 0..WRITERS {
            let meta = &meta;
            scope.spawn(move || {
                for round in 0..50 {
                    let job = AnalysisJob::new(JobType::System)
                        .with_update_time((writer * 1000 + round) as i64)
                        .with_columns(vec![format!("w{writer}")]);
                    meta.update(&job, None).unwrap();
                }
            });
        }
        for _ in 0..4 {
            let meta = &meta;
            scope.spawn(move || {
                for _ in 0..QUERIES_PER_READER {
                    meta.incr_queried_times();
                    let _ = meta.find_column_last_update_time("w0");
                    let _ = meta.analyzed_columns();
                }
            });
        }
    });

    assert_eq!(meta.queried_times(), 4 * QUERIES_PER_READER);
    let columns = meta.analyzed_columns();
    for writer in 0..WRITERS {
        assert!(columns.contains(&format!("w{writer}")));
    }
}
