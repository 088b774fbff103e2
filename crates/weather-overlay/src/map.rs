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

//! Minimal view of the map rendering library.
//!
//! The engine never talks to a renderer directly. It produces [`MapOp`]
//! values and applies them through the [`MapSurface`] trait, which only has
//! to expose the handful of calls a raster overlay needs.

/// A raster tile source.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tiles: String,
    /// Tile edge length in pixels.
    pub tile_size: u32,
}

/// How a raster layer is composited over the basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
}

/// A raster layer drawing one source.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    pub id: String,
    pub source: String,
    pub opacity: f32,
    pub blend: BlendMode,
    /// Initial visibility. Freshly attached layers always start hidden.
    pub visible: bool,
}

/// Operations the map library has to support.
pub trait MapSurface {
    fn add_source(&mut self, id: &str, source: &RasterSource);
    fn add_layer(&mut self, layer: &RasterLayer);
    fn remove_layer(&mut self, id: &str);
    fn remove_source(&mut self, id: &str);
    fn set_visibility(&mut self, layer_id: &str, visible: bool);
    fn has_layer(&self, id: &str) -> bool;
    /// Replace the base style. Destroys every source and layer.
    fn set_style(&mut self, style_url: &str);
}

/// One mutation to issue against the live map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    AddSource { id: String, source: RasterSource },
    AddLayer(RasterLayer),
    RemoveLayer(String),
    RemoveSource(String),
    SetVisibility { layer_id: String, visible: bool },
    SetStyle(String),
}

impl MapOp {
    /// Issue this operation against a map.
    pub fn apply<M: MapSurface + ?Sized>(&self, map: &mut M) {
        match self {
            Self::AddSource { id, source } => map.add_source(id, source),
            Self::AddLayer(layer) => map.add_layer(layer),
            Self::RemoveLayer(id) => map.remove_layer(id),
            Self::RemoveSource(id) => map.remove_source(id),
            Self::SetVisibility { layer_id, visible } => {
                // Layers are only ever addressed after they were attached.
                debug_assert!(map.has_layer(layer_id), "visibility on missing layer {layer_id}");
                map.set_visibility(layer_id, *visible);
            }
            Self::SetStyle(url) => map.set_style(url),
        }
    }
}
