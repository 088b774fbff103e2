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

use chrono::{DateTime, Utc};

use crate::frame::FrameId;

/// Human-readable age of a frame ("just now", "1 minute ago", "7 minutes ago").
///
/// Frames stamped in the future count as "just now".
#[must_use]
pub fn minutes_ago(frame: FrameId, now: DateTime<Utc>) -> String {
    let Some(taken) = frame.timestamp() else {
        return String::new();
    };
    let elapsed_secs = (now - taken).num_seconds().max(0);
    // Round to the nearest minute
    let mins = (elapsed_secs + 30) / 60;

    match mins {
        0 => "just now".to_string(),
        1 => "1 minute ago".to_string(),
        n => format!("{n} minutes ago"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_minutes_ago() {
        let frame = FrameId::new(1_000_000);
        let taken = at(1_000_000);
        assert_eq!(minutes_ago(frame, taken), "just now");
        assert_eq!(minutes_ago(frame, taken + Duration::seconds(29)), "just now");
        assert_eq!(minutes_ago(frame, taken + Duration::seconds(61)), "1 minute ago");
        assert_eq!(minutes_ago(frame, taken + Duration::seconds(90)), "2 minutes ago");
        assert_eq!(minutes_ago(frame, taken + Duration::minutes(10)), "10 minutes ago");
    }

    #[test]
    fn test_future_frame_is_just_now() {
        let frame = FrameId::new(1_000_600);
        assert_eq!(minutes_ago(frame, at(1_000_000)), "just now");
    }
}
