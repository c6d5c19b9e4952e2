//! Device captures driven through the wizard.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use civic_capture::{Facing, SimulatedCamera, SimulatedGeolocation};
use civic_core::{CivicError, DeviceError, GeoFailure, ImagePayload, Location};
use civic_routing::{PlaceholderClassifier, KNOWN_CATEGORIES};
use civic_wizard::{MemorySink, WizardConfig, WizardController, WizardState};

fn wizard(config: WizardConfig) -> WizardController {
    WizardController::new(config, Arc::new(MemorySink::new())).unwrap()
}

fn with_devices(config: WizardConfig, camera: &SimulatedCamera, geo: Option<SimulatedGeolocation>) -> WizardController {
    let wizard = wizard(config).with_camera(Arc::new(camera.clone()));
    match geo {
        Some(geo) => wizard.with_geolocation(Arc::new(geo)),
        None => wizard,
    }
}

// =============================================================================
// Geolocation
// =============================================================================

#[tokio::test]
async fn test_location_fix_satisfies_evidence() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(
        WizardConfig::two_stage(),
        &camera,
        Some(SimulatedGeolocation::fixed(51.5074, -0.1278)),
    );
    wizard.set_description("Blocked drain").unwrap();

    let draft = wizard.capture_location().await.unwrap();
    assert_eq!(draft.address(), Some("51.5074, -0.1278"));
    assert!(wizard.advance().unwrap().is_moved());
}

#[tokio::test]
async fn test_geolocation_failures_leave_location_unset() {
    let mut messages = HashSet::new();

    for failure in GeoFailure::ALL {
        let camera = SimulatedCamera::new();
        let geo = match failure {
            GeoFailure::Unsupported => None,
            other => Some(SimulatedGeolocation::failing(other)),
        };
        let mut wizard = with_devices(WizardConfig::three_stage(), &camera, geo);

        let err = wizard.capture_location().await.unwrap_err();
        assert_eq!(err, CivicError::DeviceUnavailable(DeviceError::Geolocation(failure)));
        assert!(wizard.draft().location.is_none());

        let message = wizard.last_error().unwrap().to_string();
        assert!(!message.is_empty());
        messages.insert(message);
    }

    assert_eq!(messages.len(), GeoFailure::ALL.len());
}

#[tokio::test]
async fn test_failed_fix_keeps_manual_address() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(
        WizardConfig::three_stage(),
        &camera,
        Some(SimulatedGeolocation::failing(GeoFailure::PermissionDenied)),
    );
    wizard.set_manual_address("Corner of 3rd & Pine").unwrap();

    assert!(wizard.capture_location().await.is_err());
    assert_eq!(wizard.draft().address(), Some("Corner of 3rd & Pine"));

    // The next successful edit clears the stale message
    wizard.set_description("Broken curb").unwrap();
    assert!(wizard.last_error().is_none());
}

#[tokio::test]
async fn test_slow_fix_times_out_once() {
    let mut config = WizardConfig::three_stage();
    config.capture.geolocation_timeout_ms = 20;
    let geo = SimulatedGeolocation::fixed(1.0, 1.0).with_delay(Duration::from_millis(500));
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(config, &camera, Some(geo.clone()));

    // The default 10 s bound would let this fix through
    let started = std::time::Instant::now();
    let err = wizard.capture_location().await.unwrap_err();
    assert_eq!(err, CivicError::DeviceUnavailable(DeviceError::Geolocation(GeoFailure::Timeout)));
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(geo.requests(), 1);
    assert_eq!(wizard.capture().settings().geolocation_timeout_ms, 20);
}

#[tokio::test]
async fn test_configured_facing_reaches_camera() {
    let mut config = WizardConfig::three_stage();
    config.capture.facing = Facing::User;
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(config, &camera, None);

    let session = wizard.open_camera().await.unwrap();
    assert_eq!(session.facing(), Some(Facing::User));
}

#[tokio::test]
async fn test_configured_size_limit_applies_to_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.png");
    std::fs::write(&path, vec![1u8; 32]).unwrap();

    let mut config = WizardConfig::three_stage();
    config.capture.max_image_bytes = 8;
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(config, &camera, None);

    assert!(wizard.attach_file(&path, 0).await.is_err());
}

// =============================================================================
// Camera
// =============================================================================

#[tokio::test]
async fn test_camera_capture_into_slot() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);

    let mut session = wizard.open_camera().await.unwrap();
    wizard.capture_into(&mut session, 1).unwrap();
    wizard.capture_into(&mut session, 2).unwrap();
    session.close();

    let draft = wizard.draft();
    assert!(draft.images.get(0).is_none());
    assert_eq!(draft.images.get(1).unwrap().mime(), "image/jpeg");
    assert!(draft.images.get(2).is_some());
    assert_eq!(camera.live_tracks(), 0);
}

#[tokio::test]
async fn test_capture_then_remove_reverts_slot() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);
    let keep = ImagePayload::encode("image/png", b"keep").unwrap();
    wizard.set_image(0, keep.clone()).unwrap();

    let mut session = wizard.open_camera().await.unwrap();
    wizard.capture_into(&mut session, 1).unwrap();
    drop(session);

    wizard.remove_image(1).unwrap();
    let draft = wizard.draft();
    assert!(draft.images.get(1).is_none());
    assert_eq!(draft.images.get(0), Some(&keep));
    assert!(draft.images.get(2).is_none());
}

#[tokio::test]
async fn test_close_without_capture_then_reopen() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);

    let session = wizard.open_camera().await.unwrap();
    session.close();
    let again = wizard.open_camera().await.unwrap();

    assert!(again.is_open());
    assert_eq!(camera.opened(), 2);
    assert_eq!(camera.live_tracks(), 1);
}

#[tokio::test]
async fn test_camera_denied_is_reported() {
    let camera = SimulatedCamera::new().failing(civic_core::CameraFailure::PermissionDenied);
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);

    let err = wizard.open_camera().await.unwrap_err();
    assert!(err.is_device());
    assert!(wizard.last_error().unwrap().contains("Camera access denied"));
    assert!(!wizard.capture().camera_busy());
}

#[tokio::test]
async fn test_abandoned_view_discards_capture() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);

    let mut session = wizard.open_camera().await.unwrap();
    wizard.abandon_camera();

    let err = wizard.capture_into(&mut session, 0).unwrap_err();
    assert_eq!(err, CivicError::DeviceUnavailable(DeviceError::Abandoned));
    assert!(wizard.draft().images.get(0).is_none());
    assert!(wizard.last_error().is_none());
    assert_eq!(camera.live_tracks(), 0);
}

#[tokio::test]
async fn test_restart_releases_camera_of_previous_session() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);

    let old_view = wizard.open_camera().await.unwrap();
    wizard.restart();

    assert_eq!(camera.live_tracks(), 0);
    assert!(!old_view.is_open());
    let fresh = wizard.open_camera().await.unwrap();
    assert!(fresh.is_open());
    assert_eq!(camera.live_tracks(), 1);
}

#[tokio::test]
async fn test_late_stream_after_abandon_is_released() {
    let camera = SimulatedCamera::new().with_delay(Duration::from_millis(50));
    let mut wizard = with_devices(WizardConfig::three_stage(), &camera, None);
    let view = wizard.capture().clone();

    let (opened, _) = tokio::join!(wizard.open_camera(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        view.abandon_camera();
    });

    assert_eq!(opened.unwrap_err(), CivicError::DeviceUnavailable(DeviceError::Abandoned));
    assert_eq!(camera.live_tracks(), 0);
    assert!(!view.camera_busy());
}

#[tokio::test]
async fn test_capture_outside_configured_slots_is_rejected() {
    let camera = SimulatedCamera::new();
    let mut wizard = with_devices(WizardConfig::two_stage(), &camera, None);

    let mut session = wizard.open_camera().await.unwrap();
    let err = wizard.capture_into(&mut session, 1).unwrap_err();
    assert_eq!(err, CivicError::InvalidSlot { index: 1, capacity: 1 });
    assert_eq!(session.captures(), 0);
}

// =============================================================================
// Files
// =============================================================================

#[tokio::test]
async fn test_attach_file_into_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crack.png");
    std::fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();

    let mut wizard = wizard(WizardConfig::three_stage());
    let draft = wizard.attach_file(&path, 2).await.unwrap();
    assert_eq!(draft.images.get(2).unwrap().mime(), "image/png");
    assert_eq!(draft.images.populated_count(), 1);
}

#[tokio::test]
async fn test_attach_rejects_oversized_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.jpg");
    std::fs::write(&path, vec![0u8; 64]).unwrap();

    let mut config = WizardConfig::three_stage();
    config.capture.max_image_bytes = 16;
    let mut wizard = wizard(config);

    let err = wizard.attach_file(&path, 0).await.unwrap_err();
    assert!(matches!(err, CivicError::DeviceUnavailable(DeviceError::File(_))));
    assert!(wizard.draft().images.get(0).is_none());
    assert!(wizard.last_error().is_some());
}

// =============================================================================
// Classifier
// =============================================================================

#[tokio::test]
async fn test_suggestion_fills_empty_category() {
    let mut wizard = wizard(WizardConfig::three_stage()).with_classifier(Arc::new(PlaceholderClassifier::instant()));
    wizard.set_image(0, ImagePayload::encode("image/jpeg", b"pothole").unwrap()).unwrap();

    let suggestion = wizard.suggest_category(0).await.unwrap().unwrap();
    assert!(KNOWN_CATEGORIES.contains(&suggestion.as_str()));
    assert_eq!(wizard.draft().category(), Some(suggestion.as_str()));
}

#[tokio::test]
async fn test_suggestion_does_not_override_user_choice() {
    let mut wizard = wizard(WizardConfig::three_stage()).with_classifier(Arc::new(PlaceholderClassifier::instant()));
    wizard.set_image(0, ImagePayload::encode("image/jpeg", b"pothole").unwrap()).unwrap();
    wizard.select_category("Lost & Found").unwrap();

    assert!(wizard.suggest_category(0).await.unwrap().is_some());
    assert_eq!(wizard.draft().category(), Some("Lost & Found"));
}

#[tokio::test]
async fn test_without_classifier_category_stays_manual() {
    let mut wizard = wizard(WizardConfig::three_stage());
    wizard.set_image(0, ImagePayload::encode("image/jpeg", b"pothole").unwrap()).unwrap();

    assert_eq!(wizard.suggest_category(0).await.unwrap(), None);
    assert!(wizard.draft().category.is_none());
    assert!(wizard.suggest_category(1).await.is_err());
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn test_three_stage_flow_with_devices() {
    let camera = SimulatedCamera::new();
    let sink = Arc::new(MemorySink::new());
    let mut wizard = WizardController::new(WizardConfig::three_stage(), sink.clone())
        .unwrap()
        .with_camera(Arc::new(camera.clone()))
        .with_geolocation(Arc::new(SimulatedGeolocation::fixed(34.0522, -118.2437)))
        .with_classifier(Arc::new(PlaceholderClassifier::instant()));

    wizard.set_description("Streetlight flickering").unwrap();
    let mut session = wizard.open_camera().await.unwrap();
    wizard.capture_into(&mut session, 0).unwrap();
    session.close();
    wizard.capture_location().await.unwrap();
    wizard.advance().unwrap();

    wizard.suggest_category(0).await.unwrap();
    wizard.advance().unwrap();

    let complaint = wizard.finalize().await.unwrap();
    assert_eq!(wizard.state(), WizardState::Complete);
    assert_eq!(complaint.images().len(), 1);
    assert_eq!(complaint.location(), Some(&Location::from_fix(34.0522, -118.2437)));
    assert!(complaint.category().is_some());
    assert!(complaint.assigned_to().is_some());
    assert_eq!(sink.len().await, 1);
    assert_eq!(camera.live_tracks(), 0);
}
