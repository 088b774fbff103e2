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

//! Layer synchronization engine.
//!
//! Keeps the overlays on a live map consistent with [`DesiredState`] across
//! user toggles, radar frame selection and destructive style swaps.
//!
//! The work is split in two:
//!
//! - [`Reconciler`] is a deterministic state machine. It takes one
//!   [`SyncEvent`] at a time and returns the [`MapOp`]s needed, updating its
//!   mirrored [`AttachmentTable`] in the same step. It never touches a map.
//! - [`LayerSync`] owns the map and an event queue, feeds events to the
//!   reconciler one at a time and applies the resulting operations.
//!
//! Map lifecycle:
//!
//! ```text
//! Uninitialized -> Loading -> Ready <-> StyleSwapping
//!                                 \-> Disposed
//! ```
//!
//! No operation is issued against a style that has not signalled
//! `StyleLoaded`. Changes made while loading or swapping are folded into the
//! desired state and applied when the style finishes loading.
//!
//! Every style request bumps a generation counter. A `StyleLoaded` carrying
//! an older generation belongs to a style that was already replaced and is
//! ignored.

use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::attachment::AttachmentTable;
use crate::frame::FrameId;
use crate::layer::{LayerKey, REGISTRY};
use crate::map::{MapOp, MapSurface};
use crate::state::DesiredState;

/// Engine configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Prefix for proxy tile URLs, e.g. `http://localhost:3000`. Empty means
    /// same-origin relative URLs.
    pub proxy_base_url: String,
    /// Desired state to start from.
    pub initial: DesiredState,
}

/// Where the live map is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    /// Map constructed, first style still loading.
    Loading,
    Ready,
    /// A new basemap style was requested and has not loaded yet.
    StyleSwapping,
    Disposed,
}

/// Inputs to the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The map object was constructed.
    MapCreated,
    /// A style finished loading.
    StyleLoaded { generation: u64 },
    /// The user picked another basemap.
    StyleSwapRequested(String),
    /// A new frame list arrived, oldest first.
    FrameListRefreshed(Vec<FrameId>),
    VisibilityChanged { key: LayerKey, visible: bool },
    FrameIndexChanged(usize),
    /// Teardown. Nothing is reconciled afterwards.
    Disposed,
}

/// Deterministic core of the engine.
#[derive(Debug, Clone)]
pub struct Reconciler {
    lifecycle: Lifecycle,
    desired: DesiredState,
    attached: AttachmentTable,
    base_url: String,
    generation: u64,
}

impl Reconciler {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            desired: config.initial,
            attached: AttachmentTable::new(),
            base_url: config.proxy_base_url,
            generation: 0,
        }
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[must_use]
    pub fn desired(&self) -> &DesiredState {
        &self.desired
    }

    #[must_use]
    pub fn attachments(&self) -> &AttachmentTable {
        &self.attached
    }

    /// Generation of the most recently requested style. The initial style is 0.
    #[must_use]
    pub fn style_generation(&self) -> u64 {
        self.generation
    }

    /// Process one event and return the map operations it requires.
    pub fn handle(&mut self, event: SyncEvent) -> Vec<MapOp> {
        let mut ops = Vec::new();

        if self.lifecycle == Lifecycle::Disposed {
            debug!("Ignoring {event:?} after teardown");
            return ops;
        }

        match event {
            SyncEvent::MapCreated => {
                if self.lifecycle == Lifecycle::Uninitialized {
                    self.lifecycle = Lifecycle::Loading;
                } else {
                    warn!("Map already created, ignoring duplicate initialization");
                }
            }
            SyncEvent::StyleLoaded { generation } if generation != self.generation => {
                debug!(
                    "Ignoring load of style generation {generation}, current is {}",
                    self.generation
                );
            }
            SyncEvent::StyleLoaded { .. } => match self.lifecycle {
                Lifecycle::Loading | Lifecycle::StyleSwapping => {
                    self.attach_all(&mut ops);
                    self.lifecycle = Lifecycle::Ready;
                    info!("Style loaded, {} overlay(s) attached", self.attached.len());
                }
                other => debug!("Ignoring style loaded while {other:?}"),
            },
            SyncEvent::StyleSwapRequested(style_url) => match self.lifecycle {
                Lifecycle::Loading | Lifecycle::Ready | Lifecycle::StyleSwapping => {
                    // The swap destroys every source and layer
                    self.attached.clear();
                    self.generation += 1;
                    if self.lifecycle == Lifecycle::Ready {
                        self.lifecycle = Lifecycle::StyleSwapping;
                    }
                    info!("Swapping basemap style to {style_url}");
                    ops.push(MapOp::SetStyle(style_url));
                }
                other => warn!("Cannot swap style while {other:?}"),
            },
            SyncEvent::VisibilityChanged { key, visible } => {
                self.desired = self.desired.with_visibility(key, visible);
                if self.lifecycle == Lifecycle::Ready {
                    let definition = key.definition();
                    if visible && !self.attached.is_attached(key) {
                        definition.attach(&self.base_url, self.frame_for(key), &mut self.attached, &mut ops);
                    }
                    definition.set_visible(&mut self.attached, visible, &mut ops);
                }
            }
            SyncEvent::FrameIndexChanged(index) => {
                let next = self.desired.with_frame_index(index);
                self.replace_desired(next, &mut ops);
            }
            SyncEvent::FrameListRefreshed(frames) => {
                let next = self.desired.with_frames(frames);
                self.replace_desired(next, &mut ops);
            }
            SyncEvent::Disposed => {
                self.attached.clear();
                self.lifecycle = Lifecycle::Disposed;
            }
        }

        ops
    }

    /// Swap in a new desired state and re-attach radar if its frame moved.
    fn replace_desired(&mut self, next: DesiredState, ops: &mut Vec<MapOp>) {
        let frame_changed = next.selected_frame() != self.desired.selected_frame();
        self.desired = next;

        if !frame_changed || self.lifecycle != Lifecycle::Ready {
            return;
        }

        let radar = LayerKey::Radar.definition();
        if !self.attached.is_attached(LayerKey::Radar) && !self.desired.is_visible(LayerKey::Radar) {
            return;
        }
        radar.attach(&self.base_url, self.desired.selected_frame(), &mut self.attached, ops);
        // Re-attachment always comes back hidden
        radar.set_visible(&mut self.attached, self.desired.is_visible(LayerKey::Radar), ops);
    }

    /// Attach every enabled or desired-on layer, then apply all visibility.
    fn attach_all(&mut self, ops: &mut Vec<MapOp>) {
        for definition in &REGISTRY {
            if definition.enabled || self.desired.is_visible(definition.key) {
                definition.attach(&self.base_url, self.frame_for(definition.key), &mut self.attached, ops);
            }
        }
        for definition in &REGISTRY {
            definition.set_visible(&mut self.attached, self.desired.is_visible(definition.key), ops);
        }
    }

    fn frame_for(&self, key: LayerKey) -> Option<FrameId> {
        if key.definition().follows_frame {
            self.desired.selected_frame()
        } else {
            None
        }
    }
}

/// Engine owning the live map and the event queue.
#[derive(Debug)]
pub struct LayerSync<M: MapSurface> {
    reconciler: Reconciler,
    map: Option<M>,
    queue: VecDeque<SyncEvent>,
}

impl<M: MapSurface> LayerSync<M> {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            reconciler: Reconciler::new(config),
            map: None,
            queue: VecDeque::new(),
        }
    }

    /// Hand the freshly constructed map to the engine. This is the only way
    /// into `Loading`.
    ///
    /// Returns `false` (and drops `map`) if a map is already owned or the
    /// engine was torn down.
    pub fn create_map(&mut self, map: M) -> bool {
        if self.map.is_some() || self.reconciler.lifecycle() != Lifecycle::Uninitialized {
            warn!("Map already initialized, ignoring second construction");
            return false;
        }
        self.map = Some(map);
        self.dispatch(SyncEvent::MapCreated);
        true
    }

    /// Signal from the map that the most recently requested style finished
    /// loading.
    pub fn style_loaded(&mut self) {
        let generation = self.reconciler.style_generation();
        self.dispatch(SyncEvent::StyleLoaded { generation });
    }

    /// Load signal for a specific style request, as returned by
    /// [`swap_style`](Self::swap_style). Stale generations are ignored.
    pub fn style_loaded_for(&mut self, generation: u64) {
        self.dispatch(SyncEvent::StyleLoaded { generation });
    }

    /// Replace the basemap. Overlays come back once the returned generation
    /// reports loaded.
    pub fn swap_style(&mut self, style_url: impl Into<String>) -> u64 {
        self.dispatch(SyncEvent::StyleSwapRequested(style_url.into()));
        self.reconciler.style_generation()
    }

    pub fn set_visible(&mut self, key: LayerKey, visible: bool) {
        self.dispatch(SyncEvent::VisibilityChanged { key, visible });
    }

    pub fn select_frame(&mut self, index: usize) {
        self.dispatch(SyncEvent::FrameIndexChanged(index));
    }

    pub fn refresh_frames(&mut self, frames: Vec<FrameId>) {
        self.dispatch(SyncEvent::FrameListRefreshed(frames));
    }

    /// Tear down and release the map.
    pub fn teardown(&mut self) -> Option<M> {
        let map = self.map.take();
        self.dispatch(SyncEvent::Disposed);
        map
    }

    /// Queue an event and process everything pending, one event at a time.
    fn dispatch(&mut self, event: SyncEvent) {
        if event == SyncEvent::MapCreated && self.map.is_none() {
            warn!("Ignoring map creation without a map");
            return;
        }
        self.queue.push_back(event);
        while let Some(next) = self.queue.pop_front() {
            let ops = self.reconciler.handle(next);
            if ops.is_empty() {
                continue;
            }
            match self.map.as_mut() {
                Some(map) => {
                    for op in &ops {
                        op.apply(map);
                    }
                }
                None => debug!("No map attached, dropping {} op(s)", ops.len()),
            }
        }
        if self.reconciler.lifecycle() == Lifecycle::Disposed {
            self.map = None;
        }
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.reconciler.lifecycle()
    }

    #[must_use]
    pub fn desired(&self) -> &DesiredState {
        self.reconciler.desired()
    }

    #[must_use]
    pub fn attachments(&self) -> &AttachmentTable {
        self.reconciler.attachments()
    }

    #[must_use]
    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }
}
