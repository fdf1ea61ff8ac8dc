//! Ownership of the single map session and the overlay swap protocol.
//!
//! All mutation happens through `&mut self` on the host's UI thread. Overlay
//! loads complete on other threads, but their completions are only queued
//! there; [`MapLifecycleManager::process_events`] applies them. Each overlay
//! request carries a [`RequestId`]; a completion whose id is not the current
//! request's is dropped, so a slow, superseded load can never move the view.

use crate::{
    catalog::{DatasetCatalog, DatasetEntry},
    core::{
        config::MapConfig,
        geo::Extent,
        map::{MapSession, MapTarget},
        view::View,
    },
    input::events::MapEvent,
    layers::{
        base::LayerTrait,
        image::{ImageLayer, OverlayRequest},
        tile::TileLayer,
    },
    tiles::{
        loader::{LoadEvent, LoadState, OverlayLoadRequest, OverlayLoader, RequestId},
        wms::WmsSource,
    },
    InitializationError, MapError, Result,
};
use instant::Instant;

/// What a `select_overlay` call left on the map
#[derive(Debug)]
pub enum OverlayOutcome {
    /// Empty key: only the base layer is shown
    Cleared,
    /// A new overlay is attached and loading
    Requested { request_id: RequestId, layer_id: String },
    /// The selection could not be honored; only the base layer is shown.
    /// The error has already been logged.
    Degraded(MapError),
}

impl OverlayOutcome {
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            OverlayOutcome::Requested { request_id, .. } => Some(*request_id),
            _ => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, OverlayOutcome::Degraded(_))
    }
}

/// Owns the map session and swaps its overlay on request
pub struct MapLifecycleManager {
    config: MapConfig,
    catalog: Box<dyn DatasetCatalog>,
    loader: Box<dyn OverlayLoader>,
    session: Option<MapSession>,
    current_request: Option<RequestId>,
    last_request: u64,
}

impl MapLifecycleManager {
    pub fn new(
        config: MapConfig,
        catalog: Box<dyn DatasetCatalog>,
        loader: Box<dyn OverlayLoader>,
    ) -> Self {
        Self {
            config,
            catalog,
            loader,
            session: None,
            current_request: None,
            last_request: 0,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn DatasetCatalog {
        self.catalog.as_ref()
    }

    pub fn session(&self) -> Option<&MapSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut MapSession> {
        self.session.as_mut()
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The request whose completion may still move the view
    pub fn current_request(&self) -> Option<RequestId> {
        self.current_request
    }

    /// Creates the session on `target` with the base layer and the default view.
    pub fn initialize(&mut self, target: Option<MapTarget>) -> Result<()> {
        if self.session.is_some() {
            return Err(InitializationError::AlreadyInitialized.into());
        }
        let target = target.ok_or(InitializationError::MissingTarget)?;
        self.config.validate()?;

        let base = TileLayer::from_template(
            "base".to_string(),
            "Base map".to_string(),
            &self.config.base.url_template,
            self.config.base.max_zoom,
        )?;

        let view_config = &self.config.view;
        let reported = target.size();
        let size = if [reported.x, reported.y].iter().all(|v| v.is_finite() && *v > 0.0) {
            reported
        } else {
            log::warn!(
                "target '{}' reported size {:?}, using configured {:?}",
                target.id(),
                reported,
                view_config.size
            );
            view_config.size()
        };
        let mut view = View::new(view_config.center(), view_config.zoom, size);
        view.set_zoom_limits(view_config.min_zoom, view_config.max_zoom);

        let session = MapSession::new(target.clone(), base, view)?;
        log::info!(
            "map initialized on '{}' at center {:?}, zoom {}",
            target.id(),
            session.view().center,
            session.view().zoom
        );
        self.session = Some(session);
        self.current_request = None;
        Ok(())
    }

    /// Replaces the overlay with the one for `key`; an empty key clears it.
    ///
    /// Only [`MapError::NotInitialized`] is returned as an error. Unknown keys
    /// and overlays that cannot be built are logged and reported as
    /// [`OverlayOutcome::Degraded`] with the map showing the base layer only.
    pub fn select_overlay(&mut self, key: &str) -> Result<OverlayOutcome> {
        let session = self.session.as_mut().ok_or(MapError::NotInitialized)?;

        // Sweep the whole collection, not just the overlay we know about.
        session.remove_overlays();
        self.current_request = None;

        if key.is_empty() {
            log::debug!("overlay cleared");
            return Ok(OverlayOutcome::Cleared);
        }

        let Some(entry) = self.catalog.resolve(key).cloned() else {
            let err = MapError::UnknownDataset {
                key: key.to_string(),
            };
            log::error!("{}", err);
            return Ok(OverlayOutcome::Degraded(err));
        };

        self.last_request += 1;
        let request_id = RequestId(self.last_request);

        match self.attach_overlay(&entry, request_id) {
            Ok(layer_id) => {
                self.current_request = Some(request_id);
                log::info!(
                    "overlay {} requested for dataset '{}' ({})",
                    request_id,
                    entry.key,
                    entry.overlay_id
                );
                Ok(OverlayOutcome::Requested { request_id, layer_id })
            }
            Err(err) => {
                log::error!("failed to add overlay for dataset '{}': {}", entry.key, err);
                Ok(OverlayOutcome::Degraded(err))
            }
        }
    }

    /// Builds the overlay, starts its load and attaches it.
    /// Leaves the layer collection untouched on error.
    fn attach_overlay(&mut self, entry: &DatasetEntry, request_id: RequestId) -> Result<String> {
        let session = self.session.as_mut().ok_or(MapError::NotInitialized)?;
        let overlay = &self.config.overlay;

        let source = WmsSource::new(
            &overlay.url,
            &entry.overlay_id,
            &overlay.format,
            overlay.server_type.as_deref(),
        )?
        .with_version(&overlay.version)
        .with_crs(&overlay.crs)
        .with_pixel_ratio(overlay.pixel_ratio);

        let view = session.view();
        let requested_extent = view
            .extent()
            .intersection(&Extent::world())
            .unwrap_or_else(Extent::world);
        let width = (view.size.x * overlay.pixel_ratio).round() as u32;
        let height = (view.size.y * overlay.pixel_ratio).round() as u32;
        let url = source.get_map_url(&requested_extent, width, height)?;

        let request = OverlayRequest::new(request_id, entry.key.clone(), requested_extent);
        let layer = ImageLayer::new(source, request);
        let layer_id = layer.id().to_string();

        self.loader.load(
            OverlayLoadRequest {
                id: request_id,
                url,
                extent: requested_extent,
                width,
                height,
            },
            session.notifier(request_id),
        )?;

        session.add_layer(Box::new(layer))?;
        session.emit(MapEvent::OverlayAdd {
            layer_id: layer_id.clone(),
            dataset: entry.key.clone(),
        });
        Ok(layer_id)
    }

    /// Applies queued load completions, advances the view and dispatches map
    /// events to listeners. Returns the dispatched events.
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.process_events_at(Instant::now())
    }

    /// [`process_events`](Self::process_events) with an explicit clock
    pub fn process_events_at(&mut self, now: Instant) -> Vec<MapEvent> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };

        for event in session.drain_loads() {
            self.apply_load(event, now);
        }

        match self.session.as_mut() {
            Some(session) => {
                session.update(now);
                session.process_events()
            }
            None => Vec::new(),
        }
    }

    fn apply_load(&mut self, event: LoadEvent, now: Instant) {
        if self.current_request != Some(event.request_id) {
            log::debug!("ignoring completion of superseded overlay {}", event.request_id);
            return;
        }
        let fit_options = self.config.overlay.fit_options();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(layer) = session.overlay_for_request_mut(event.request_id) else {
            log::debug!("overlay {} is no longer attached", event.request_id);
            return;
        };
        if !layer.request().is_pending() {
            return;
        }
        let layer_id = layer.id().to_string();

        match event.state {
            LoadState::Loaded { extent } => {
                layer.set_load_state(LoadState::Loaded { extent });
                session.emit(MapEvent::OverlayLoaded {
                    layer_id,
                    extent,
                });
                if session.view_mut().fit(&extent, fit_options, now) {
                    log::debug!("fitting view to overlay {} extent {:?}", event.request_id, extent);
                    session.emit(MapEvent::FitStart { extent });
                } else {
                    log::warn!("overlay {} reported an unusable extent {:?}", event.request_id, extent);
                }
            }
            LoadState::Failed { reason } => {
                log::warn!("overlay {} failed to load: {}", event.request_id, reason);
                layer.set_load_state(LoadState::Failed {
                    reason: reason.clone(),
                });
                session.emit(MapEvent::OverlayFailed { layer_id, reason });
            }
            LoadState::Pending => {}
        }
    }

    /// Advances the view transition without touching load completions
    pub fn tick(&mut self, now: Instant) -> bool {
        self.session
            .as_mut()
            .map(|session| session.update(now))
            .unwrap_or(false)
    }

    /// Detaches the map from its target and drops the session. Idempotent.
    pub fn dispose(&mut self) {
        self.current_request = None;
        match self.session.take() {
            Some(mut session) => {
                session.detach();
                log::info!("map disposed");
            }
            None => log::debug!("dispose called without a live map"),
        }
    }
}

impl Drop for MapLifecycleManager {
    fn drop(&mut self) {
        self.dispose();
    }
}
