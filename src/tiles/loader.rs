use crate::core::constants::{MAX_OVERLAY_BYTES, USER_AGENT};
use crate::core::geo::Extent;
use crate::{MapError, Result};
use crossbeam_channel::Sender;
use reqwest::blocking::Client;
use reqwest::Url;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

/// Identity of one overlay request. Later requests always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load-completion state of an overlay request
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Pending,
    Loaded { extent: Extent },
    Failed { reason: String },
}

/// Completion report sent by a loader when an overlay image finished loading
#[derive(Debug, Clone, PartialEq)]
pub struct LoadEvent {
    pub request_id: RequestId,
    pub state: LoadState,
}

/// What a loader is asked to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLoadRequest {
    pub id: RequestId,
    pub url: Url,
    pub extent: Extent,
    pub width: u32,
    pub height: u32,
}

/// One-shot completion handle for a single request.
///
/// Consuming `self` in [`loaded`](Self::loaded) and [`failed`](Self::failed)
/// means a request can complete at most once.
#[derive(Debug)]
pub struct LoadNotifier {
    request_id: RequestId,
    tx: Sender<LoadEvent>,
}

impl LoadNotifier {
    pub fn new(request_id: RequestId, tx: Sender<LoadEvent>) -> Self {
        Self { request_id, tx }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn loaded(self, extent: Extent) {
        self.send(LoadState::Loaded { extent });
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.send(LoadState::Failed {
            reason: reason.into(),
        });
    }

    fn send(self, state: LoadState) {
        let event = LoadEvent {
            request_id: self.request_id,
            state,
        };
        // The receiver is gone once the session is disposed; nothing left to tell.
        if self.tx.send(event).is_err() {
            log::debug!("dropping completion for {}: session closed", self.request_id);
        }
    }
}

/// Starts fetching overlay images. Completion is reported through the notifier;
/// an `Err` means the fetch could not even be started.
pub trait OverlayLoader: Send {
    fn load(&self, request: OverlayLoadRequest, notifier: LoadNotifier) -> Result<()>;
}

/// Fetches overlay images over HTTP on detached worker threads.
///
/// The underlying fetch always runs to completion; a superseded request is
/// filtered out by the session when its completion arrives.
pub struct HttpOverlayLoader {
    client: Client,
}

impl HttpOverlayLoader {
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    fn fetch(client: &Client, url: Url) -> Result<(u32, u32)> {
        let resp = client.get(url).send()?.error_for_status()?;
        if let Some(len) = resp.content_length() {
            check_body_size(len)?;
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        // WMS servers report errors as XML with a 200 status
        let bytes = read_capped(resp, MAX_OVERLAY_BYTES)?;
        if content_type.contains("xml") {
            let body = String::from_utf8_lossy(&bytes);
            return Err(MapError::OverlayConstruction(format!(
                "service exception: {}",
                body.trim()
            )));
        }

        let image = image::load_from_memory(&bytes)?;
        Ok((image.width(), image.height()))
    }
}

fn check_body_size(len: u64) -> Result<()> {
    if len > MAX_OVERLAY_BYTES {
        return Err(MapError::OverlayConstruction(format!(
            "overlay response of {} bytes exceeds the {} byte limit",
            len, MAX_OVERLAY_BYTES
        )));
    }
    Ok(())
}

/// Reads at most `limit` bytes; a longer body is an error.
fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.take(limit + 1).read_to_end(&mut bytes)?;
    check_body_size(bytes.len() as u64)?;
    Ok(bytes)
}

impl OverlayLoader for HttpOverlayLoader {
    fn load(&self, request: OverlayLoadRequest, notifier: LoadNotifier) -> Result<()> {
        let client = self.client.clone();
        let OverlayLoadRequest { id, url, extent, .. } = request;

        thread::Builder::new()
            .name(format!("overlay-load-{}", id.0))
            .spawn(move || {
                log::debug!("fetching overlay {} from {}", id, url);
                match Self::fetch(&client, url) {
                    Ok((width, height)) => {
                        log::info!("overlay {} loaded ({}x{})", id, width, height);
                        notifier.loaded(extent);
                    }
                    Err(e) => {
                        log::warn!("overlay {} failed to load: {}", id, e);
                        notifier.failed(e.to_string());
                    }
                }
            })
            .map_err(|e| MapError::OverlayConstruction(format!("cannot start loader: {}", e)))?;

        Ok(())
    }
}

#[derive(Debug, Default)]
struct ManualLoaderState {
    requests: Vec<OverlayLoadRequest>,
    pending: Vec<LoadNotifier>,
    refuse: Option<String>,
}

/// Loader that never touches the network: the caller fires completions.
///
/// For hosts that fetch images themselves, and for tests that need to
/// control completion order. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualLoader {
    state: Arc<Mutex<ManualLoaderState>>,
}

impl ManualLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `load` call fail with `reason`; `None` restores normal behavior.
    pub fn refuse_with(&self, reason: Option<&str>) {
        self.lock().refuse = reason.map(str::to_string);
    }

    /// Every request issued so far, oldest first
    pub fn requests(&self) -> Vec<OverlayLoadRequest> {
        self.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<OverlayLoadRequest> {
        self.lock().requests.last().cloned()
    }

    /// Reports `id` as loaded with `extent`. Returns `false` if it is not pending.
    pub fn complete(&self, id: RequestId, extent: Extent) -> bool {
        match self.take(id) {
            Some(notifier) => {
                notifier.loaded(extent);
                true
            }
            None => false,
        }
    }

    /// Reports `id` as failed. Returns `false` if it is not pending.
    pub fn fail(&self, id: RequestId, reason: &str) -> bool {
        match self.take(id) {
            Some(notifier) => {
                notifier.failed(reason);
                true
            }
            None => false,
        }
    }

    fn take(&self, id: RequestId) -> Option<LoadNotifier> {
        let mut state = self.lock();
        let pos = state.pending.iter().position(|n| n.request_id() == id)?;
        Some(state.pending.remove(pos))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualLoaderState> {
        // A panic while holding the lock cannot leave the vectors half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl OverlayLoader for ManualLoader {
    fn load(&self, request: OverlayLoadRequest, notifier: LoadNotifier) -> Result<()> {
        let mut state = self.lock();
        if let Some(reason) = &state.refuse {
            return Err(MapError::OverlayConstruction(reason.clone()));
        }
        state.requests.push(request);
        state.pending.push(notifier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn request(id: u64) -> OverlayLoadRequest {
        OverlayLoadRequest {
            id: RequestId(id),
            url: Url::parse("http://example.com/wms").unwrap(),
            extent: Extent::new(0.0, 0.0, 1.0, 1.0),
            width: 10,
            height: 10,
        }
    }

    #[test]
    fn test_notifier_sends_once() {
        let (tx, rx) = unbounded();
        let notifier = LoadNotifier::new(RequestId(7), tx);
        notifier.loaded(Extent::new(0.0, 0.0, 10.0, 10.0));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.request_id, RequestId(7));
        assert_eq!(
            event.state,
            LoadState::Loaded {
                extent: Extent::new(0.0, 0.0, 10.0, 10.0)
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_notifier_tolerates_closed_channel() {
        let (tx, rx) = unbounded();
        drop(rx);
        LoadNotifier::new(RequestId(1), tx).failed("gone");
    }

    #[test]
    fn test_manual_loader_completes_in_any_order() {
        let (tx, rx) = unbounded();
        let loader = ManualLoader::new();
        loader.load(request(1), LoadNotifier::new(RequestId(1), tx.clone())).unwrap();
        loader.load(request(2), LoadNotifier::new(RequestId(2), tx)).unwrap();

        assert!(loader.fail(RequestId(2), "boom"));
        assert!(loader.complete(RequestId(1), Extent::new(0.0, 0.0, 1.0, 1.0)));
        assert!(!loader.complete(RequestId(1), Extent::new(0.0, 0.0, 1.0, 1.0)));

        let ids: Vec<_> = rx.try_iter().map(|e| e.request_id).collect();
        assert_eq!(ids, vec![RequestId(2), RequestId(1)]);
        assert_eq!(loader.requests().len(), 2);
    }

    #[test]
    fn test_oversized_body_is_rejected() {
        assert!(check_body_size(MAX_OVERLAY_BYTES).is_ok());
        assert!(matches!(
            check_body_size(MAX_OVERLAY_BYTES + 1),
            Err(MapError::OverlayConstruction(_))
        ));

        let body = vec![0_u8; (MAX_OVERLAY_BYTES + 10) as usize];
        assert!(read_capped(body.as_slice(), MAX_OVERLAY_BYTES).is_err());
        assert_eq!(read_capped(&b"<ServiceException/>"[..], MAX_OVERLAY_BYTES).unwrap().len(), 19);
    }

    #[test]
    fn test_manual_loader_refusal() {
        let (tx, _rx) = unbounded();
        let loader = ManualLoader::new();
        loader.refuse_with(Some("offline"));
        let err = loader
            .load(request(1), LoadNotifier::new(RequestId(1), tx))
            .unwrap_err();
        assert!(matches!(err, MapError::OverlayConstruction(_)));
        assert!(loader.requests().is_empty());
    }
}
