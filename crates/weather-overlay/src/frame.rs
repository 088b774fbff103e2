// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Radar frame identifiers.
//!
//! A frame is one radar sweep published by the upstream provider. Frames are
//! keyed by the epoch second the provider assigned to the sweep, and every
//! tile of that sweep shares the same identifier.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream-assigned radar frame identifier (seconds since the Unix epoch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(u64);

impl FrameId {
    /// Wrap an epoch-second value.
    #[must_use]
    pub const fn new(epoch_secs: u64) -> Self {
        Self(epoch_secs)
    }

    /// Epoch seconds of this frame.
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    /// Parse a frame id from a query value.
    ///
    /// Only plain ASCII digits are accepted; signs, whitespace and decimals
    /// are rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value.parse().ok().map(Self)
    }

    /// Wall-clock time of the sweep, if representable.
    #[must_use]
    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FrameId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Which frame a tile request refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSelector {
    /// Whatever the provider currently lists as its newest sweep.
    #[default]
    Latest,
    /// A specific historical sweep.
    Pinned(FrameId),
}

impl FrameSelector {
    /// Interpret an optional `ts` query value.
    ///
    /// Anything that is not a plain non-negative integer floats to `Latest`.
    #[must_use]
    pub fn from_query(ts: Option<&str>) -> Self {
        ts.and_then(FrameId::parse).map_or(Self::Latest, Self::Pinned)
    }

    /// The pinned frame, if any.
    #[must_use]
    pub fn pinned(self) -> Option<FrameId> {
        match self {
            Self::Latest => None,
            Self::Pinned(id) => Some(id),
        }
    }
}
