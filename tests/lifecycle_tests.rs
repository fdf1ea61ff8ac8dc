use floodmap::{
    core::geo::{Extent, Point},
    tiles::loader::ManualLoader,
    EventManager, LayerRole, LayerTrait, MapBuilder, MapError, MapEvent, MapLifecycleManager, MapTarget,
    OverlayOutcome,
};
use instant::Instant;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Integration tests for the host-facing overlay lifecycle
/// These drive the manager the way a UI does: mount, select, tick, unmount
#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    fn setup() -> (MapLifecycleManager, ManualLoader, MapTarget) {
        let _ = env_logger::builder().is_test(true).try_init();
        let loader = ManualLoader::new();
        let mut manager = MapBuilder::new()
            .with_loader(Box::new(loader.clone()))
            .build()
            .unwrap();
        let target = MapTarget::new("map-container", Point::new(800.0, 600.0));
        manager.initialize(Some(target.clone())).unwrap();
        (manager, loader, target)
    }

    fn overlay_count(manager: &MapLifecycleManager) -> usize {
        manager.session().unwrap().overlay_count()
    }

    #[test]
    fn test_at_most_one_overlay_after_any_sequence() {
        let (mut manager, _loader, _target) = setup();
        let keys = [
            "pro_aug21", "pro_aug21", "pro_aug27", "", "unknown_key", "pro_sep02", "pro_aug27", "",
            "pro_aug21",
        ];

        for key in keys {
            manager.select_overlay(key).unwrap();
            let count = overlay_count(&manager);
            assert!(count <= 1, "{} overlays after selecting '{}'", count, key);
            assert_eq!(
                manager.session().unwrap().layers().count_role(LayerRole::Base),
                1
            );
        }
    }

    #[test]
    fn test_empty_key_leaves_base_only() {
        let (mut manager, _loader, _target) = setup();
        manager.select_overlay("pro_aug21").unwrap();
        assert_eq!(overlay_count(&manager), 1);

        let outcome = manager.select_overlay("").unwrap();
        assert!(matches!(outcome, OverlayOutcome::Cleared));
        assert_eq!(overlay_count(&manager), 0);
        assert_eq!(manager.session().unwrap().layers().len(), 1);

        // clearing an already-empty map is fine too
        assert!(matches!(
            manager.select_overlay("").unwrap(),
            OverlayOutcome::Cleared
        ));
    }

    #[test]
    fn test_unknown_key_degrades_without_error() {
        let (mut manager, loader, _target) = setup();
        manager.select_overlay("pro_aug21").unwrap();

        let outcome = manager.select_overlay("unknown_key").unwrap();
        match outcome {
            OverlayOutcome::Degraded(MapError::UnknownDataset { key }) => {
                assert_eq!(key, "unknown_key")
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(overlay_count(&manager), 0);
        assert_eq!(manager.current_request(), None);
        assert_eq!(loader.requests().len(), 1);
    }

    #[test]
    fn test_same_key_twice_keeps_one_overlay() {
        let (mut manager, loader, _target) = setup();
        let first = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();
        let second = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();

        assert!(second > first);
        assert_eq!(overlay_count(&manager), 1);
        let overlay = manager.session().unwrap().overlay().unwrap();
        assert_eq!(overlay.dataset_key(), "pro_aug21");
        assert_eq!(overlay.request_id(), second);
        assert_eq!(loader.requests().len(), 2);
    }

    #[test]
    fn test_completion_fits_view_to_extent() {
        let (mut manager, loader, _target) = setup();
        let id = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();

        let start = Instant::now();
        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert!(loader.complete(id, extent));
        let events = manager.process_events_at(start);
        assert!(events.contains(&MapEvent::FitStart { extent }));

        let session = manager.session().unwrap();
        assert!(session.view().is_animating());
        let (target_center, target_zoom) = session.view().target();
        assert_eq!(target_center, Point::new(5.0, 5.0));
        assert!(target_zoom > 20.0);
        assert_eq!(session.overlay().unwrap().extent(), Some(extent));

        // Still moving halfway through the transition window
        manager.tick(start + Duration::from_millis(500));
        let view = manager.session().unwrap().view();
        assert!(view.is_animating());
        assert!(view.zoom > 0.0 && view.zoom < target_zoom);

        // Settled once the window has passed
        manager.tick(start + Duration::from_millis(1000));
        let view = manager.session().unwrap().view();
        assert!(!view.is_animating());
        assert_eq!(view.center, Point::new(5.0, 5.0));
        assert_eq!(view.zoom, target_zoom);
    }

    #[test]
    fn test_out_of_order_completions_apply_only_latest() {
        let (mut manager, loader, _target) = setup();
        let a = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();
        let b = manager.select_overlay("pro_aug27").unwrap().request_id().unwrap();

        let extent_a = Extent::new(-1000.0, -1000.0, 1000.0, 1000.0);
        let extent_b = Extent::new(0.0, 0.0, 10.0, 10.0);

        // B finishes first, then A's late completion arrives
        let start = Instant::now();
        loader.complete(b, extent_b);
        manager.process_events_at(start);
        loader.complete(a, extent_a);
        let events = manager.process_events_at(start + Duration::from_millis(10));
        assert!(!events.iter().any(|e| matches!(e, MapEvent::FitStart { extent } if *extent == extent_a)));

        manager.tick(start + Duration::from_secs(2));
        let view = manager.session().unwrap().view();
        assert_eq!(view.center, extent_b.center());
        assert_eq!(manager.session().unwrap().overlay().unwrap().dataset_key(), "pro_aug27");
    }

    #[test]
    fn test_superseded_completion_arriving_first_is_ignored() {
        let (mut manager, loader, _target) = setup();
        let a = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();
        let b = manager.select_overlay("pro_aug27").unwrap().request_id().unwrap();

        let start = Instant::now();
        loader.complete(a, Extent::new(0.0, 0.0, 10.0, 10.0));
        manager.process_events_at(start);
        let view = manager.session().unwrap().view();
        assert!(!view.is_animating());
        assert_eq!(view.center, Point::new(0.0, 0.0));
        assert_eq!(view.zoom, 0.0);

        loader.complete(b, Extent::new(100.0, 100.0, 300.0, 300.0));
        manager.process_events_at(start);
        assert_eq!(
            manager.session().unwrap().view().target().0,
            Point::new(200.0, 200.0)
        );
    }

    #[test]
    fn test_reselect_removes_overlay_before_any_extent() {
        let (mut manager, loader, _target) = setup();
        let first = manager.select_overlay("pro_aug21").unwrap();
        let first_layer = match first {
            OverlayOutcome::Requested { layer_id, .. } => layer_id,
            other => panic!("unexpected outcome {:?}", other),
        };

        manager.select_overlay("pro_aug27").unwrap();
        let session = manager.session().unwrap();
        assert!(session.layers().get_layer(&first_layer).is_none());
        assert_eq!(session.overlay_count(), 1);
        assert!(!session.view().is_animating());

        let events = manager.process_events();
        let removed = events
            .iter()
            .position(|e| matches!(e, MapEvent::OverlayRemove { layer_id } if *layer_id == first_layer))
            .unwrap();
        let added = events
            .iter()
            .rposition(|e| matches!(e, MapEvent::OverlayAdd { dataset, .. } if dataset == "pro_aug27"))
            .unwrap();
        assert!(removed < added);
        assert_eq!(loader.requests().len(), 2);
    }

    #[test]
    fn test_failed_load_keeps_view() {
        let (mut manager, loader, _target) = setup();
        let id = manager.select_overlay("pro_sep02").unwrap().request_id().unwrap();
        loader.fail(id, "HTTP 503");

        let events = manager.process_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, MapEvent::OverlayFailed { reason, .. } if reason == "HTTP 503")));
        let session = manager.session().unwrap();
        assert!(!session.view().is_animating());
        assert_eq!(session.overlay_count(), 1);
    }

    #[test]
    fn test_loader_refusal_degrades_to_base_only() {
        let (mut manager, loader, _target) = setup();
        manager.select_overlay("pro_aug21").unwrap();
        loader.refuse_with(Some("network unavailable"));

        let outcome = manager.select_overlay("pro_aug27").unwrap();
        assert!(matches!(
            outcome,
            OverlayOutcome::Degraded(MapError::OverlayConstruction(_))
        ));
        assert_eq!(overlay_count(&manager), 0);
        assert_eq!(manager.current_request(), None);

        loader.refuse_with(None);
        assert!(manager.select_overlay("pro_aug27").unwrap().request_id().is_some());
        assert_eq!(overlay_count(&manager), 1);
    }

    #[test]
    fn test_dispose_twice_is_harmless() {
        let (mut manager, _loader, target) = setup();
        manager.select_overlay("pro_aug21").unwrap();

        manager.dispose();
        assert!(!manager.is_initialized());
        assert!(!target.is_bound());

        manager.dispose();
        assert!(!manager.is_initialized());
        assert!(matches!(
            manager.select_overlay("pro_aug21"),
            Err(MapError::NotInitialized)
        ));
    }

    #[test]
    fn test_completion_after_dispose_is_dropped() {
        let (mut manager, loader, _target) = setup();
        let id = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();
        manager.dispose();

        assert!(loader.complete(id, Extent::new(0.0, 0.0, 10.0, 10.0)));
        assert!(manager.process_events().is_empty());
        assert!(!manager.is_initialized());
    }

    #[test]
    fn test_target_cannot_host_two_maps() {
        let (_manager, _loader, target) = setup();
        let mut other = MapBuilder::new()
            .with_loader(Box::new(ManualLoader::new()))
            .build()
            .unwrap();
        assert!(matches!(
            other.initialize(Some(target.clone())),
            Err(MapError::Initialization(_))
        ));
    }

    #[test]
    fn test_nan_zoom_limit_fails_at_build() {
        let result = MapBuilder::new()
            .with_zoom_limits(f64::NAN, 28.0)
            .with_loader(Box::new(ManualLoader::new()))
            .build();
        assert!(matches!(result, Err(MapError::Config(_))));
    }

    #[test]
    fn test_listeners_see_overlay_events() {
        let (mut manager, loader, _target) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let events: &mut EventManager = manager.session_mut().unwrap().events_mut();
        events.on("overlayloaded", move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let id = manager.select_overlay("pro_aug21").unwrap().request_id().unwrap();
        loader.complete(id, Extent::new(0.0, 0.0, 10.0, 10.0));
        manager.process_events();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(matches!(&seen[0], MapEvent::OverlayLoaded { layer_id, .. } if layer_id == &format!("overlay-{}", id.0)));
    }
}
