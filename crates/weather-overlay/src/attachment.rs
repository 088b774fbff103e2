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

//! Mirror of what is currently attached to the live map.
//!
//! The table is updated in the same step that emits the matching map
//! operations, so it can be trusted without querying the renderer.

use crate::layer::LayerKey;

/// One source+layer pair present on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub source_id: String,
    pub layer_id: String,
    /// Tile template the source was created with.
    pub tiles: String,
    pub visible: bool,
}

/// At most one [`Attachment`] per [`LayerKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentTable {
    slots: [Option<Attachment>; LayerKey::COUNT],
}

impl AttachmentTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: LayerKey) -> Option<&Attachment> {
        self.slots[key.index()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, key: LayerKey) -> Option<&mut Attachment> {
        self.slots[key.index()].as_mut()
    }

    #[must_use]
    pub fn is_attached(&self, key: LayerKey) -> bool {
        self.slots[key.index()].is_some()
    }

    /// Whether the layer is attached and currently shown.
    #[must_use]
    pub fn is_visible(&self, key: LayerKey) -> bool {
        self.get(key).is_some_and(|a| a.visible)
    }

    pub(crate) fn insert(&mut self, key: LayerKey, attachment: Attachment) {
        self.slots[key.index()] = Some(attachment);
    }

    pub(crate) fn remove(&mut self, key: LayerKey) -> Option<Attachment> {
        self.slots[key.index()].take()
    }

    /// Forget everything, e.g. after a style swap destroyed all layers.
    pub(crate) fn clear(&mut self) {
        self.slots = Default::default();
    }

    /// Number of attached layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
