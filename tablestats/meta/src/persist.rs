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

//! Serialization / Deserialization to Bytes
//!
//! Freshness records persist as tagged JSON: each field carries a stable
//! short tag, unknown tags are ignored on load and tags added in later
//! format versions default when absent. That makes the format evolvable in
//! both directions as long as tags are only ever added, never renamed.

use std::io::{Read, Write};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tablestats_common::{Result, StatsError};

use crate::table_meta::TableStatsMeta;

/// Encodes a persisted statistics record to/from a stream of bytes.
///
/// ```
/// use tablestats_meta::Serializeable;
/// use tablestats_meta::ColStatsMeta;
/// use tablestats_meta::{AnalysisMethod, AnalysisType, JobType};
///
/// let meta = ColStatsMeta::new(
///     100,
///     AnalysisMethod::Full,
///     AnalysisType::Fundamentals,
///     JobType::System,
///     0,
/// );
///
/// // Convert it to an opaque form
/// let bytes = meta.to_bytes().unwrap();
///
/// // Decode bytes from somewhere (disk, edit log, network)
/// let decoded = ColStatsMeta::from_bytes(&bytes).unwrap();
/// assert_eq!(meta, decoded);
/// ```
pub trait Serializeable: Sized {
    /// Convert `self` to an opaque byte stream
    fn to_bytes(&self) -> Result<Bytes>;

    /// Convert `bytes` (the output of [`to_bytes`]) back into an object.
    /// Errors on malformed payloads; no partial object is returned.
    ///
    /// [`to_bytes`]: Serializeable::to_bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

impl<T> Serializeable for T
where
    T: Serialize + DeserializeOwned,
{
    fn to_bytes(&self) -> Result<Bytes> {
        let encoded = serde_json::to_vec(self)?;
        Ok(encoded.into())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl TableStatsMeta {
    /// Writes this record to `out` as a length-prefixed payload, the stream
    /// form used by the metadata edit log
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        let bytes = self.to_bytes()?;
        let len = u32::try_from(bytes.len()).map_err(|_| {
            StatsError::Internal(format!(
                "statistics record for table {} too large to persist: {} bytes",
                self.table_name,
                bytes.len()
            ))
        })?;
        out.write_all(&len.to_be_bytes())?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Reads a record previously written with [`TableStatsMeta::write_to`]
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let mut len_buf = [0u8; 4];
        input.read_exact(&mut len_buf)?;
        let mut payload = vec![0u8; u32::from_be_bytes(len_buf) as usize];
        input.read_exact(&mut payload)?;
        Self::from_bytes(&payload)
    }
}
