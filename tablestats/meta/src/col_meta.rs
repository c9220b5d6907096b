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

//! Per-column freshness metadata, see [`ColStatsMeta`]

use serde::{Deserialize, Serialize};

use crate::analysis_job::{AnalysisMethod, AnalysisType, JobType};

/// Freshness metadata for a single analyzed column.
///
/// Entries are created lazily on the first reconciliation that covers the
/// column and live inside [`TableStatsMeta::col_stats`]; mutation happens
/// in place under the owning map's shard guard. The serde field tags are
/// part of the persisted format and must never be renamed, only added.
///
/// [`TableStatsMeta::col_stats`]: crate::TableStatsMeta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColStatsMeta {
    /// Time of the most recent reconciliation covering this column,
    /// epoch millis
    #[serde(rename = "updateTime")]
    pub updated_time: i64,

    #[serde(rename = "method")]
    pub analysis_method: AnalysisMethod,

    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,

    /// Trigger kind recorded at the column level. May lag the table-level
    /// value for columns the latest job did not touch.
    #[serde(rename = "trigger", default)]
    pub job_type: JobType,

    /// Rows changed since this column was last analyzed
    #[serde(rename = "updatedRows", default)]
    pub updated_rows: i64,
}

impl ColStatsMeta {
    pub fn new(
        updated_time: i64,
        analysis_method: AnalysisMethod,
        analysis_type: AnalysisType,
        job_type: JobType,
        updated_rows: i64,
    ) -> Self {
        Self {
            updated_time,
            analysis_method,
            analysis_type,
            job_type,
            updated_rows,
        }
    }

    /// Clears the accumulated stale-delta. The analysis timestamps and kinds
    /// are kept.
    pub fn clear(&mut self) {
        self.updated_rows = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_only_resets_the_delta() {
        let mut meta = ColStatsMeta::new(
            100,
            AnalysisMethod::Sample,
            AnalysisType::Fundamentals,
            JobType::Manual,
            42,
        );
        meta.clear();
        assert_eq!(meta.updated_rows, 0);
        assert_eq!(meta.updated_time, 100);
        assert_eq!(meta.job_type, JobType::Manual);
    }

    #[test]
    fn legacy_payload_defaults_trigger_and_delta() {
        // Payloads written before the trigger and delta fields existed
        let json = r#"{"updateTime": 7, "method": "FULL", "type": "HISTOGRAM"}"#;
        let meta: ColStatsMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.updated_time, 7);
        assert_eq!(meta.job_type, JobType::System);
        assert_eq!(meta.updated_rows, 0);
    }
}
