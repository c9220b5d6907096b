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

//! Defines [`AnalysisJob`], the description of a completed analysis run, and
//! the [`JobType`], [`AnalysisMethod`] and [`AnalysisType`] enums recorded on
//! freshness metadata.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tablestats_common::{internal_err, Result, StatsError};

/// What triggered an analysis job
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobType {
    /// Issued by a user statement
    Manual,
    /// Issued by the background statistics scheduler
    #[default]
    System,
}

impl Display for JobType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let job_type = match self {
            JobType::Manual => "MANUAL",
            JobType::System => "SYSTEM",
        };
        write!(f, "{job_type}")
    }
}

impl FromStr for JobType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_uppercase();
        match s.as_str() {
            "MANUAL" => Ok(JobType::Manual),
            "SYSTEM" => Ok(JobType::System),
            _ => internal_err!("The job type {s} does not exist"),
        }
    }
}

/// How the job gathered its statistics
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisMethod {
    /// Scanned every row of the table
    #[default]
    Full,
    /// Scanned a sampled subset of rows
    Sample,
}

impl Display for AnalysisMethod {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let method = match self {
            AnalysisMethod::Full => "FULL",
            AnalysisMethod::Sample => "SAMPLE",
        };
        write!(f, "{method}")
    }
}

impl FromStr for AnalysisMethod {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_uppercase();
        match s.as_str() {
            "FULL" => Ok(AnalysisMethod::Full),
            "SAMPLE" => Ok(AnalysisMethod::Sample),
            _ => internal_err!("The analysis method {s} does not exist"),
        }
    }
}

/// Which class of statistics the job computed
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisType {
    /// Fundamental column statistics (row count, NDV, null count, min/max)
    #[default]
    Fundamentals,
    /// Histogram statistics
    Histogram,
}

impl Display for AnalysisType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let analysis_type = match self {
            AnalysisType::Fundamentals => "FUNDAMENTALS",
            AnalysisType::Histogram => "HISTOGRAM",
        };
        write!(f, "{analysis_type}")
    }
}

impl FromStr for AnalysisType {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_uppercase();
        match s.as_str() {
            "FUNDAMENTALS" => Ok(AnalysisType::Fundamentals),
            "HISTOGRAM" => Ok(AnalysisType::Histogram),
            _ => internal_err!("The analysis type {s} does not exist"),
        }
    }
}

/// Description of a completed (or partially completed) analysis job, as
/// reported by the statistics-collection subsystem.
///
/// This is the sole input to [`TableStatsMeta::update`]: it carries what was
/// analyzed, when, how, and the table-level counts observed by the job.
/// Columns are carried as a structured list; the legacy bracketed text form
/// is accepted through [`AnalysisJob::with_column_spec`].
///
/// [`TableStatsMeta::update`]: crate::TableStatsMeta::update
#[derive(Debug, Clone, Default)]
pub struct AnalysisJob {
    /// Last update time of the table as observed by the job, epoch millis
    pub tbl_update_time: i64,
    /// True when the statistics values were injected manually rather than
    /// computed by a scan
    pub user_inject: bool,
    /// Columns this job analyzed
    pub columns: Vec<String>,
    pub analysis_method: AnalysisMethod,
    pub analysis_type: AnalysisType,
    pub job_type: JobType,
    /// Table row count reported by the job
    pub row_count: i64,
    /// Row count per materialized index id, as reported by the job
    pub index_row_counts: HashMap<i64, i64>,
    /// Partitions each analyzed column covered
    pub col_to_partitions: HashMap<String, HashSet<String>>,
}

impl AnalysisJob {
    pub fn new(job_type: JobType) -> Self {
        Self {
            job_type,
            ..Default::default()
        }
    }

    pub fn with_update_time(mut self, tbl_update_time: i64) -> Self {
        self.tbl_update_time = tbl_update_time;
        self
    }

    pub fn with_user_inject(mut self, user_inject: bool) -> Self {
        self.user_inject = user_inject;
        self
    }

    /// Set the analyzed columns from a structured list
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the analyzed columns from the legacy textual encoding, see
    /// [`parse_column_spec`]
    pub fn with_column_spec(mut self, spec: &str) -> Self {
        self.columns = parse_column_spec(spec);
        self
    }

    pub fn with_method(mut self, method: AnalysisMethod) -> Self {
        self.analysis_method = method;
        self
    }

    pub fn with_analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = analysis_type;
        self
    }

    pub fn with_row_count(mut self, row_count: i64) -> Self {
        self.row_count = row_count;
        self
    }

    pub fn with_index_row_counts(
        mut self,
        index_row_counts: HashMap<i64, i64>,
    ) -> Self {
        self.index_row_counts = index_row_counts;
        self
    }

    pub fn with_covered_partitions(
        mut self,
        col_to_partitions: HashMap<String, HashSet<String>>,
    ) -> Self {
        self.col_to_partitions = col_to_partitions;
        self
    }
}

/// Parses the legacy textual column list carried by older job records.
///
/// The accepted format surrounds a comma separated list with one pair of
/// square brackets, e.g. `"[a, b]"`. Input without the surrounding brackets
/// is split verbatim so both forms load. Names are trimmed and empty entries
/// dropped. This never fails: the encoding cannot escape commas or brackets
/// inside a column name, so the split is best effort.
pub fn parse_column_spec(spec: &str) -> Vec<String> {
    let spec = spec.trim();
    let inner = spec
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(spec);
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
