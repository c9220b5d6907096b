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

//! tablestats error types

use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::result;

/// Result type for operations that could result in a [StatsError]
pub type Result<T, E = StatsError> = result::Result<T, E>;

/// Error type for generic operations that could result in [`StatsError::External`]
pub type GenericError = Box<dyn error::Error + Send + Sync>;

/// tablestats error
#[derive(Debug)]
pub enum StatsError {
    /// Error associated to I/O operations and associated traits.
    IoError(io::Error),
    /// Error (de)serializing a persisted statistics record.
    SerdeJson(serde_json::Error),
    /// Error returned when the catalog cannot resolve the identity, schema
    /// or index set of a table.
    Catalog(String),
    /// Error returned as a consequence of an error in tablestats.
    /// This error should not happen in normal usage.
    Internal(String),
    /// Errors originating from outside the tablestats crates, typically
    /// raised by a catalog implementation behind the `TableSource` boundary.
    External(GenericError),
}

impl From<io::Error> for StatsError {
    fn from(e: io::Error) -> Self {
        StatsError::IoError(e)
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(e: serde_json::Error) -> Self {
        StatsError::SerdeJson(e)
    }
}

impl From<GenericError> for StatsError {
    fn from(err: GenericError) -> Self {
        StatsError::External(err)
    }
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match *self {
            StatsError::IoError(ref desc) => write!(f, "IO error: {desc}"),
            StatsError::SerdeJson(ref desc) => {
                write!(f, "Serialization error: {desc}")
            }
            StatsError::Catalog(ref desc) => {
                write!(f, "Catalog error: {desc}")
            }
            StatsError::Internal(ref desc) => {
                write!(f, "Internal error: {desc}. This was likely caused by a bug in tablestats' code")
            }
            StatsError::External(ref desc) => {
                write!(f, "External error: {desc}")
            }
        }
    }
}

impl error::Error for StatsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            StatsError::IoError(e) => Some(e),
            StatsError::SerdeJson(e) => Some(e),
            StatsError::Catalog(_) => None,
            StatsError::Internal(_) => None,
            StatsError::External(e) => Some(e.as_ref()),
        }
    }
}

/// Macro creates an `Err(StatsError::Catalog)` with a formatted message
#[macro_export]
macro_rules! catalog_err {
    ($($arg:tt)*) => {
        Err($crate::error::StatsError::Catalog(format!($($arg)*)))
    };
}

/// Macro creates an `Err(StatsError::Internal)` with a formatted message
#[macro_export]
macro_rules! internal_err {
    ($($arg:tt)*) => {
        Err($crate::error::StatsError::Internal(format!($($arg)*)))
    };
}
