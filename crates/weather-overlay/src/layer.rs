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

//! Layer registry.
//!
//! A fixed catalog of weather overlays. Each [`LayerDefinition`] knows how to
//! attach itself to a map and how to toggle its own visibility, without
//! knowing about the other layers. Definitions that are declared but not yet
//! available (`enabled == false`) stay addressable and simply do nothing.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::attachment::{Attachment, AttachmentTable};
use crate::frame::FrameId;
use crate::map::{BlendMode, MapOp, RasterLayer, RasterSource};

/// Tile edge length served by the proxy.
pub const TILE_SIZE: u32 = 256;

/// Closed set of overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKey {
    Radar,
    Wind,
    Temperature,
    Clouds,
}

impl LayerKey {
    pub const COUNT: usize = 4;

    /// Every key, in registry order.
    pub const ALL: [LayerKey; Self::COUNT] = [
        LayerKey::Radar,
        LayerKey::Wind,
        LayerKey::Temperature,
        LayerKey::Clouds,
    ];

    /// Stable identifier, also used as the map layer id.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LayerKey::Radar => "radar",
            LayerKey::Wind => "wind",
            LayerKey::Temperature => "temperature",
            LayerKey::Clouds => "clouds",
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// Registry entry for this key.
    #[must_use]
    pub fn definition(self) -> &'static LayerDefinition {
        &REGISTRY[self.index()]
    }
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One overlay in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDefinition {
    pub key: LayerKey,
    pub label: &'static str,
    /// Whether the overlay is implemented at all.
    pub enabled: bool,
    /// Proxy provider path segment (`/tile/{provider}`).
    pub provider: &'static str,
    /// Tile URLs carry the selected radar frame.
    pub follows_frame: bool,
    pub opacity: f32,
    pub blend: BlendMode,
}

/// The process-wide catalog, indexed by [`LayerKey`].
pub static REGISTRY: [LayerDefinition; LayerKey::COUNT] = [
    LayerDefinition {
        key: LayerKey::Radar,
        label: "Radar",
        enabled: true,
        provider: "radar",
        follows_frame: true,
        opacity: 0.6,
        blend: BlendMode::Normal,
    },
    LayerDefinition {
        key: LayerKey::Wind,
        label: "Wind",
        enabled: true,
        provider: "wind",
        follows_frame: false,
        opacity: 0.5,
        blend: BlendMode::Screen,
    },
    LayerDefinition {
        key: LayerKey::Temperature,
        label: "Temperature",
        enabled: false,
        provider: "temperature",
        follows_frame: false,
        opacity: 0.5,
        blend: BlendMode::Multiply,
    },
    LayerDefinition {
        key: LayerKey::Clouds,
        label: "Cloud Cover",
        enabled: true,
        provider: "clouds",
        follows_frame: false,
        opacity: 0.5,
        blend: BlendMode::Screen,
    },
];

impl LayerDefinition {
    #[must_use]
    pub fn source_id(&self) -> String {
        format!("{}-source", self.key)
    }

    #[must_use]
    pub fn layer_id(&self) -> &'static str {
        self.key.as_str()
    }

    /// Tile template pointing at the proxy.
    ///
    /// Frame-following layers pin the given frame; without one the proxy
    /// resolves the latest sweep itself.
    #[must_use]
    pub fn tiles_url(&self, base_url: &str, frame: Option<FrameId>) -> String {
        let base = base_url.trim_end_matches('/');
        let mut url = format!("{base}/tile/{}?z={{z}}&x={{x}}&y={{y}}", self.provider);
        if self.follows_frame {
            if let Some(frame) = frame {
                url.push_str(&format!("&ts={frame}"));
            }
        }
        url
    }

    /// Ensure exactly one source+layer pair exists for this key.
    ///
    /// A no-op when the pair already exists with the same tile template. A
    /// changed template (new radar frame) detaches the old pair first, since
    /// a raster source cannot be retargeted in place. New layers start hidden.
    pub fn attach(
        &self,
        base_url: &str,
        frame: Option<FrameId>,
        table: &mut AttachmentTable,
        ops: &mut Vec<MapOp>,
    ) {
        if !self.enabled {
            return;
        }

        let tiles = self.tiles_url(base_url, frame);
        if let Some(existing) = table.get(self.key) {
            if existing.tiles == tiles {
                return;
            }
            debug!("Re-attaching {} with new tiles {}", self.key, tiles);
            self.detach(table, ops);
        }

        let source_id = self.source_id();
        let layer_id = self.layer_id().to_string();

        ops.push(MapOp::AddSource {
            id: source_id.clone(),
            source: RasterSource {
                tiles: tiles.clone(),
                tile_size: TILE_SIZE,
            },
        });
        ops.push(MapOp::AddLayer(RasterLayer {
            id: layer_id.clone(),
            source: source_id.clone(),
            opacity: self.opacity,
            blend: self.blend,
            visible: false,
        }));

        table.insert(
            self.key,
            Attachment {
                source_id,
                layer_id,
                tiles,
                visible: false,
            },
        );
    }

    /// Remove this key's pair from the map, if present.
    pub fn detach(&self, table: &mut AttachmentTable, ops: &mut Vec<MapOp>) {
        if let Some(old) = table.remove(self.key) {
            ops.push(MapOp::RemoveLayer(old.layer_id));
            ops.push(MapOp::RemoveSource(old.source_id));
        }
    }

    /// Show or hide the layer. Does nothing if it is not attached yet.
    pub fn set_visible(&self, table: &mut AttachmentTable, on: bool, ops: &mut Vec<MapOp>) {
        if !self.enabled {
            return;
        }
        let Some(attachment) = table.get_mut(self.key) else {
            return;
        };
        if attachment.visible == on {
            return;
        }
        attachment.visible = on;
        ops.push(MapOp::SetVisibility {
            layer_id: attachment.layer_id.clone(),
            visible: on,
        });
    }
}

/// Iterate the catalog in registry order.
pub fn registry() -> impl Iterator<Item = &'static LayerDefinition> {
    REGISTRY.iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::fake::FakeMap;

    fn apply(map: &mut FakeMap, ops: &[MapOp]) {
        for op in ops {
            op.apply(map);
        }
    }

    #[test]
    fn test_registry_is_indexed_by_key() {
        for key in LayerKey::ALL {
            assert_eq!(key.definition().key, key);
        }
        assert_eq!(registry().count(), LayerKey::COUNT);
    }

    #[test]
    fn test_tiles_url() {
        let radar = LayerKey::Radar.definition();
        assert_eq!(
            radar.tiles_url("http://proxy/", Some(FrameId::new(300))),
            "http://proxy/tile/radar?z={z}&x={x}&y={y}&ts=300"
        );
        assert_eq!(
            radar.tiles_url("", None),
            "/tile/radar?z={z}&x={x}&y={y}"
        );
        // Static layers ignore the frame
        assert_eq!(
            LayerKey::Clouds.definition().tiles_url("", Some(FrameId::new(300))),
            "/tile/clouds?z={z}&x={x}&y={y}"
        );
    }

    #[test]
    fn test_attach_is_idempotent() {
        let radar = LayerKey::Radar.definition();
        let mut table = AttachmentTable::new();
        let mut map = FakeMap::default();

        let mut ops = Vec::new();
        radar.attach("", Some(FrameId::new(100)), &mut table, &mut ops);
        apply(&mut map, &ops);
        assert_eq!(ops.len(), 2);

        let mut ops = Vec::new();
        radar.attach("", Some(FrameId::new(100)), &mut table, &mut ops);
        apply(&mut map, &ops);
        assert!(ops.is_empty());

        assert_eq!(map.sources.len(), 1);
        assert_eq!(map.layers.len(), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_attach_new_frame_detaches_first() {
        let radar = LayerKey::Radar.definition();
        let mut table = AttachmentTable::new();
        let mut map = FakeMap::default();

        let mut ops = Vec::new();
        radar.attach("", Some(FrameId::new(100)), &mut table, &mut ops);
        radar.set_visible(&mut table, true, &mut ops);
        apply(&mut map, &ops);
        assert!(map.is_visible("radar"));

        let mut ops = Vec::new();
        radar.attach("", Some(FrameId::new(200)), &mut table, &mut ops);
        apply(&mut map, &ops);

        assert_eq!(
            ops.iter().take(2).cloned().collect::<Vec<_>>(),
            vec![
                MapOp::RemoveLayer("radar".to_string()),
                MapOp::RemoveSource("radar-source".to_string()),
            ]
        );
        assert_eq!(map.layers.len(), 1);
        assert_eq!(map.tiles_of("radar-source"), Some("/tile/radar?z={z}&x={x}&y={y}&ts=200"));
        // Re-attached layers come back hidden
        assert!(!map.is_visible("radar"));
        assert!(!table.is_visible(LayerKey::Radar));
    }

    #[test]
    fn test_set_visible_before_attach_is_noop() {
        let wind = LayerKey::Wind.definition();
        let mut table = AttachmentTable::new();
        let mut ops = Vec::new();
        wind.set_visible(&mut table, true, &mut ops);
        assert!(ops.is_empty());
        assert!(!table.is_attached(LayerKey::Wind));
    }

    #[test]
    fn test_disabled_layer_is_inert() {
        let temperature = LayerKey::Temperature.definition();
        assert!(!temperature.enabled);

        let mut table = AttachmentTable::new();
        let mut ops = Vec::new();
        temperature.attach("", None, &mut table, &mut ops);
        temperature.set_visible(&mut table, true, &mut ops);
        assert!(ops.is_empty());
        assert!(table.is_empty());
    }
}
