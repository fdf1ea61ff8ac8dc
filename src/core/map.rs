use crate::{
    core::{geo::Point, view::View},
    input::{events::MapEvent, handler::EventManager},
    layers::{
        base::{LayerRole, LayerTrait},
        image::ImageLayer,
        manager::LayerManager,
        tile::TileLayer,
    },
    tiles::loader::{LoadEvent, LoadNotifier, RequestId},
    InitializationError, Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use instant::Instant;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug)]
struct TargetInner {
    id: String,
    size: Point,
    bound: AtomicBool,
}

/// Handle to the surface a map renders into.
///
/// Clones refer to the same surface; at most one session can be bound to it.
#[derive(Debug, Clone)]
pub struct MapTarget {
    inner: Arc<TargetInner>,
}

impl MapTarget {
    pub fn new(id: impl Into<String>, size: Point) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                id: id.into(),
                size,
                bound: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Pixel size of the surface
    pub fn size(&self) -> Point {
        self.inner.size
    }

    pub fn is_bound(&self) -> bool {
        self.inner.bound.load(Ordering::Acquire)
    }

    fn bind(&self) -> std::result::Result<(), InitializationError> {
        self.inner
            .bound
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| InitializationError::TargetAlreadyBound {
                target: self.inner.id.clone(),
            })
    }

    fn release(&self) {
        self.inner.bound.store(false, Ordering::Release);
    }
}

/// The live map: a bound target, the layer collection and the view
pub struct MapSession {
    target: Option<MapTarget>,
    layers: LayerManager,
    view: View,
    events: EventManager,
    load_tx: Sender<LoadEvent>,
    load_rx: Receiver<LoadEvent>,
}

impl MapSession {
    /// Binds `target` and attaches `base` as the first layer
    pub fn new(target: MapTarget, base: TileLayer, view: View) -> Result<Self> {
        target.bind()?;

        let (load_tx, load_rx) = unbounded();
        let mut session = Self {
            target: Some(target),
            layers: LayerManager::new(),
            view,
            events: EventManager::new(),
            load_tx,
            load_rx,
        };
        if let Err(e) = session.add_layer(Box::new(base)) {
            session.detach();
            return Err(e);
        }
        Ok(session)
    }

    pub fn target(&self) -> Option<&MapTarget> {
        self.target.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    pub(crate) fn emit(&mut self, event: MapEvent) {
        self.events.emit(event);
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        self.layers.add_layer(layer)?;
        self.events.emit(MapEvent::LayerAdd { layer_id });
        Ok(())
    }

    /// Detaches every overlay in the layer collection; returns their ids
    pub fn remove_overlays(&mut self) -> Vec<String> {
        let removed: Vec<String> = self
            .layers
            .remove_by_role(LayerRole::Overlay)
            .iter()
            .map(|layer| layer.id().to_string())
            .collect();

        for layer_id in &removed {
            log::debug!("removed overlay layer {}", layer_id);
            self.events.emit(MapEvent::OverlayRemove {
                layer_id: layer_id.clone(),
            });
            self.events.emit(MapEvent::LayerRemove {
                layer_id: layer_id.clone(),
            });
        }
        removed
    }

    pub fn overlay_count(&self) -> usize {
        self.layers.count_role(LayerRole::Overlay)
    }

    /// The attached overlay, if any
    pub fn overlay(&self) -> Option<&ImageLayer> {
        let id = self.layers.ids_with_role(LayerRole::Overlay).into_iter().next()?;
        self.layers.get_layer(&id)?.as_any().downcast_ref::<ImageLayer>()
    }

    /// The attached overlay created for `request_id`, if it is still attached
    pub(crate) fn overlay_for_request_mut(&mut self, request_id: RequestId) -> Option<&mut ImageLayer> {
        let layer_id = format!("overlay-{}", request_id.0);
        let layer = self.layers.layer_mut(&layer_id)?;
        if layer.role() != LayerRole::Overlay {
            return None;
        }
        layer.as_any_mut().downcast_mut::<ImageLayer>()
    }

    /// Completion handle feeding this session's load queue
    pub(crate) fn notifier(&self, request_id: RequestId) -> LoadNotifier {
        LoadNotifier::new(request_id, self.load_tx.clone())
    }

    /// Completions reported since the last call
    pub(crate) fn drain_loads(&self) -> Vec<LoadEvent> {
        self.load_rx.try_iter().collect()
    }

    /// Advances any running view transition, emitting `ViewChanged` when it moves
    pub fn update(&mut self, now: Instant) -> bool {
        let moved = self.view.update(now);
        if moved {
            self.events.emit(MapEvent::ViewChanged {
                center: self.view.center,
                zoom: self.view.zoom,
            });
        }
        moved
    }

    /// Dispatches queued map events to listeners
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    /// Releases the target and drops every layer and listener. Idempotent.
    pub fn detach(&mut self) {
        if let Some(target) = self.target.take() {
            target.release();
            log::debug!("map detached from target '{}'", target.id());
        }
        self.view.cancel_animation();
        self.layers.clear();
        self.events.reset();
        // Anything still queued belongs to a session that no longer renders.
        let _ = self.drain_loads();
    }
}

impl Drop for MapSession {
    fn drop(&mut self) {
        if let Some(target) = self.target.take() {
            target.release();
        }
    }
}
