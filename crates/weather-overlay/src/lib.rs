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

//! Client-side engine for time-varying weather overlays on a slippy map.
//!
//! The crate keeps a set of independently toggleable raster overlays (radar,
//! wind, temperature, clouds) consistent with what the user asked for, even
//! while radar frames change and the basemap style is swapped underneath.
//!
//! - **Registry layer**: [`layer::REGISTRY`], a fixed catalog of overlays that
//!   know how to attach and show/hide themselves
//! - **Sync layer**: [`LayerSync`], which owns the live map and reconciles it
//!   against [`DesiredState`] one event at a time
//! - **Feed layer**: [`FrameFeed`], which polls the tile proxy for the radar
//!   frame list
//!
//! # Quick Start
//!
//! Any renderer can be driven by implementing [`MapSurface`]:
//!
//! ```
//! use weather_overlay::{LayerKey, LayerSync, MapSurface, RasterLayer, RasterSource, SyncConfig};
//!
//! #[derive(Default)]
//! struct NullMap;
//!
//! impl MapSurface for NullMap {
//!     fn add_source(&mut self, _id: &str, _source: &RasterSource) {}
//!     fn add_layer(&mut self, _layer: &RasterLayer) {}
//!     fn remove_layer(&mut self, _id: &str) {}
//!     fn remove_source(&mut self, _id: &str) {}
//!     fn set_visibility(&mut self, _layer_id: &str, _visible: bool) {}
//!     fn has_layer(&self, _id: &str) -> bool { true }
//!     fn set_style(&mut self, _style_url: &str) {}
//! }
//!
//! let mut engine = LayerSync::new(SyncConfig::default());
//! engine.create_map(NullMap);
//! engine.style_loaded();
//! engine.set_visible(LayerKey::Clouds, true);
//! assert!(engine.attachments().is_visible(LayerKey::Clouds));
//! ```

pub mod attachment;
pub mod feed;
pub mod frame;
pub mod label;
pub mod layer;
pub mod map;
pub mod state;
pub mod sync;

pub use attachment::{Attachment, AttachmentTable};
pub use feed::{FeedConfig, FeedError, FeedEvent, FrameFeed};
pub use frame::{FrameId, FrameSelector};
pub use label::minutes_ago;
pub use layer::{LayerDefinition, LayerKey, REGISTRY};
pub use map::{BlendMode, MapOp, MapSurface, RasterLayer, RasterSource};
pub use state::DesiredState;
pub use sync::{LayerSync, Lifecycle, Reconciler, SyncConfig, SyncEvent};
