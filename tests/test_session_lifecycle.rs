//! Session lifecycle against the software devices.

use std::time::Duration;

use cap_scale::presets::Size;
use doc_capture::capture::{
    CameraIdentity, CaptureDevice, DeviceFailure, Facing, ResolutionNegotiator, StillImageCamera,
    StreamRequest, SyntheticCamera,
};
use doc_capture::config::{RatioLabel, ResolutionCandidate};
use doc_capture::{CaptureError, CaptureSession, DerivationPipeline, SessionState};
use image::{Rgba, RgbaImage};

fn rear() -> CameraIdentity {
    CameraIdentity::new("rear", Facing::Environment)
}

async fn open(device: &mut dyn CaptureDevice, ratio: RatioLabel) -> CaptureSession {
    let active = ResolutionNegotiator::default()
        .negotiate(device, &rear(), ratio)
        .await
        .unwrap();
    CaptureSession::new(active)
}

#[tokio::test]
async fn one_live_session_per_device() {
    let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1280, 720)]);
    let probe = camera.probe();
    let mut first = open(&mut camera, RatioLabel::Wide16x9).await;
    first.wait_ready(Duration::from_secs(1)).await.unwrap();

    let err = ResolutionNegotiator::default()
        .negotiate(&mut camera, &rear(), RatioLabel::Wide16x9)
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::Device { .. }));

    first.stop();
    assert!(!probe.is_streaming());
    let mut second = open(&mut camera, RatioLabel::Wide16x9).await;
    assert_eq!(second.wait_ready(Duration::from_secs(1)).await.unwrap(), Size { w: 1280, h: 720 });
    assert_eq!(first.state(), SessionState::Stopped);
}

#[tokio::test]
async fn transient_failure_then_success_on_retry() {
    let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(1280, 720)])
        .then_failing(DeviceFailure::Hardware("sensor reset".into()));

    let err = ResolutionNegotiator::default()
        .negotiate(&mut camera, &rear(), RatioLabel::Wide16x9)
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::Device { .. }));

    let mut session = open(&mut camera, RatioLabel::Wide16x9).await;
    assert!(session.wait_ready(Duration::from_secs(1)).await.is_ok());
}

#[tokio::test]
async fn frames_keep_flowing_until_stopped() {
    let mut camera = SyntheticCamera::new("rear", vec![ResolutionCandidate::new(640, 360)]);
    let mut session = open(&mut camera, RatioLabel::Wide16x9).await;

    let mut sequences = Vec::new();
    for _ in 0..3 {
        sequences.push(session.poll_frame().await.unwrap().sequence);
    }
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(session.frame().unwrap().sequence, 3);
    assert_eq!(session.state().to_string(), "ready (640x360)");

    session.stop();
    assert_eq!(session.state().to_string(), "stopped");
}

#[tokio::test]
async fn still_image_is_delivered_at_native_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("card.png");
    RgbaImage::from_pixel(1000, 700, Rgba([20, 120, 200, 255]))
        .save(&path)
        .unwrap();

    let mut camera = StillImageCamera::from_path(&path).unwrap();
    assert_eq!(camera.size(), Size { w: 1000, h: 700 });

    let mut session = open(&mut camera, RatioLabel::Wide16x9).await;
    assert_eq!(session.requested(), ResolutionCandidate::new(1920, 1080));
    let size = session.wait_ready(Duration::from_secs(1)).await.unwrap();
    assert_eq!(size, Size { w: 1000, h: 700 });

    let request = StreamRequest::exact(&rear(), ResolutionCandidate::new(1280, 720));
    assert!(matches!(
        camera.open(&request).await,
        Err(DeviceFailure::Hardware(_))
    ));

    let set = DerivationPipeline::default()
        .capture(&session, "16:9", 0.9)
        .await
        .unwrap();
    assert_eq!((set.full.width, set.full.height), (1000, 700));
    assert!(set.is_complete());
}

#[test]
fn missing_still_image_is_an_error() {
    let err = StillImageCamera::from_path("/nonexistent/card.png").unwrap_err();
    assert_eq!(err.category(), "external");
}
