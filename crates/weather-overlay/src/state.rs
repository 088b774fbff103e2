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

//! Desired overlay state.
//!
//! [`DesiredState`] is what the user asked for. It is never edited in place:
//! every change produces a new value, so reconciling against it twice gives
//! the same result.

use chrono::{DateTime, Utc};

use crate::frame::FrameId;
use crate::label::minutes_ago;
use crate::layer::LayerKey;

/// Which layers should be shown and which radar frame is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    visibility: [bool; LayerKey::COUNT],
    selected_frame_index: usize,
    /// Known frames, oldest first.
    frame_list: Vec<FrameId>,
}

impl Default for DesiredState {
    /// Radar on, everything else off, no frames known yet.
    fn default() -> Self {
        let mut visibility = [false; LayerKey::COUNT];
        visibility[LayerKey::Radar.index()] = true;
        Self {
            visibility,
            selected_frame_index: 0,
            frame_list: Vec::new(),
        }
    }
}

impl DesiredState {
    /// State with every layer hidden.
    #[must_use]
    pub fn all_hidden() -> Self {
        Self {
            visibility: [false; LayerKey::COUNT],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_visible(&self, key: LayerKey) -> bool {
        self.visibility[key.index()]
    }

    #[must_use]
    pub fn selected_frame_index(&self) -> usize {
        self.selected_frame_index
    }

    #[must_use]
    pub fn frame_list(&self) -> &[FrameId] {
        &self.frame_list
    }

    /// The selected frame, or `None` while no frames are known.
    #[must_use]
    pub fn selected_frame(&self) -> Option<FrameId> {
        let last = self.frame_list.len().checked_sub(1)?;
        self.frame_list.get(self.selected_frame_index.min(last)).copied()
    }

    /// Display text for the selected frame's age.
    #[must_use]
    pub fn selected_frame_label(&self, now: DateTime<Utc>) -> String {
        self.selected_frame()
            .map(|frame| minutes_ago(frame, now))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn with_visibility(&self, key: LayerKey, visible: bool) -> Self {
        let mut next = self.clone();
        next.visibility[key.index()] = visible;
        next
    }

    /// Select a frame by index, clamped into the known list.
    #[must_use]
    pub fn with_frame_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.selected_frame_index = clamp_index(index, next.frame_list.len());
        next
    }

    /// Replace the frame list after a refresh.
    ///
    /// A selection on the newest frame (or no selection yet) follows the new
    /// newest frame. An older selection keeps pointing at the same sweep
    /// while it is still listed, and is clamped otherwise.
    #[must_use]
    pub fn with_frames(&self, frames: Vec<FrameId>) -> Self {
        let was_newest = self.frame_list.is_empty()
            || self.selected_frame_index + 1 >= self.frame_list.len();
        let previous = self.selected_frame();

        let index = if was_newest {
            frames.len().saturating_sub(1)
        } else {
            previous
                .and_then(|frame| frames.iter().position(|f| *f == frame))
                .unwrap_or(self.selected_frame_index)
        };

        Self {
            visibility: self.visibility,
            selected_frame_index: clamp_index(index, frames.len()),
            frame_list: frames,
        }
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    match len {
        0 => index,
        n => index.min(n - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(ids: &[u64]) -> Vec<FrameId> {
        ids.iter().copied().map(FrameId::new).collect()
    }

    #[test]
    fn test_default_visibility() {
        let state = DesiredState::default();
        assert!(state.is_visible(LayerKey::Radar));
        assert!(!state.is_visible(LayerKey::Wind));
        assert!(!state.is_visible(LayerKey::Temperature));
        assert!(!state.is_visible(LayerKey::Clouds));
        assert_eq!(state.selected_frame(), None);
    }

    #[test]
    fn test_out_of_range_index_is_clamped() {
        let state = DesiredState::default().with_frames(frames(&[100, 200, 300]));
        let last = state.with_frame_index(2).selected_frame();
        let past_end = state.with_frame_index(3).selected_frame();
        assert_eq!(past_end, last);
        assert_eq!(past_end, Some(FrameId::new(300)));
        assert_eq!(state.with_frame_index(3).selected_frame_index(), 2);
    }

    #[test]
    fn test_first_frames_select_newest() {
        let state = DesiredState::default().with_frames(frames(&[100, 200, 300]));
        assert_eq!(state.selected_frame_index(), 2);
        assert_eq!(state.selected_frame(), Some(FrameId::new(300)));
    }

    #[test]
    fn test_refresh_follows_newest() {
        let state = DesiredState::default()
            .with_frames(frames(&[100, 200, 300]))
            .with_frames(frames(&[200, 300, 400]));
        assert_eq!(state.selected_frame(), Some(FrameId::new(400)));
    }

    #[test]
    fn test_refresh_keeps_older_selection() {
        let state = DesiredState::default()
            .with_frames(frames(&[100, 200, 300]))
            .with_frame_index(1)
            .with_frames(frames(&[200, 300, 400]));
        assert_eq!(state.selected_frame(), Some(FrameId::new(200)));
        assert_eq!(state.selected_frame_index(), 0);
    }

    #[test]
    fn test_refresh_drops_expired_selection() {
        let state = DesiredState::default()
            .with_frames(frames(&[100, 200, 300, 400]))
            .with_frame_index(0)
            .with_frames(frames(&[300, 400]));
        // Frame 100 is gone; the old index is clamped
        assert_eq!(state.selected_frame_index(), 0);
        assert_eq!(state.selected_frame(), Some(FrameId::new(300)));
    }

    #[test]
    fn test_updates_do_not_touch_original() {
        let state = DesiredState::default();
        let next = state.with_visibility(LayerKey::Wind, true);
        assert!(!state.is_visible(LayerKey::Wind));
        assert!(next.is_visible(LayerKey::Wind));
    }

    #[test]
    fn test_empty_refresh() {
        let state = DesiredState::default()
            .with_frames(frames(&[100]))
            .with_frames(Vec::new());
        assert_eq!(state.selected_frame(), None);
        assert_eq!(state.selected_frame_label(Utc::now()), "");
    }
}
