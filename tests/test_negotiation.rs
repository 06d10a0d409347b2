//! Resolution negotiation against scripted devices.

mod common;

use common::stub_device::StubDevice;
use doc_capture::capture::{
    AttemptOutcome, CameraIdentity, DeviceFailure, Facing, ResolutionNegotiator,
};
use doc_capture::config::{RatioLabel, ResolutionCandidate, ResolutionTable};
use doc_capture::error::{DeviceErrorKind, LookupTable, Retryable, classify};
use doc_capture::CaptureError;

fn back_camera() -> CameraIdentity {
    CameraIdentity::new("rear-0", Facing::Environment)
}

#[tokio::test]
async fn candidates_are_tried_in_table_order_until_one_is_accepted() {
    let table = ResolutionTable::standard();
    let negotiator = ResolutionNegotiator::default();

    for ratio in RatioLabel::ALL {
        let candidates = table.candidates(ratio).unwrap();
        for (index, &accepted) in candidates.iter().enumerate() {
            let mut device = StubDevice::accept_only(accepted);
            let active = negotiator
                .negotiate(&mut device, &back_camera(), ratio)
                .await
                .unwrap_or_else(|e| panic!("{ratio} {accepted}: {e}"));

            assert_eq!(active.requested(), accepted);
            assert_eq!(active.committed_ratio(), ratio);
            assert_eq!(device.requested(), candidates[..=index].to_vec(), "{ratio}");
            assert_eq!(active.attempts().len(), index + 1);
            assert_eq!(
                active.attempts().last().map(|a| &a.outcome),
                Some(&AttemptOutcome::Accepted)
            );
        }
    }
}

#[tokio::test]
async fn earlier_candidate_wins_when_several_would_work() {
    let mut device = StubDevice::new(|request| {
        if request.width <= 1280 {
            Ok(())
        } else {
            Err(DeviceFailure::overconstrained("width"))
        }
    });
    let active = ResolutionNegotiator::default()
        .negotiate(&mut device, &back_camera(), RatioLabel::Wide16x9)
        .await
        .unwrap();
    assert_eq!(active.requested(), ResolutionCandidate::new(1280, 720));
    assert_eq!(device.requested().len(), 2);
}

#[tokio::test]
async fn unknown_ratio_never_reaches_the_device() {
    let mut device = StubDevice::new(|_| Ok(()));
    for _ in 0..3 {
        let err = ResolutionNegotiator::default()
            .negotiate_label(&mut device, &back_camera(), "5:4")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::InvalidRatio {
                table: LookupTable::Parse,
                ..
            }
        ));
        assert!(classify::is_fatal(&err));
    }
    assert!(device.requested().is_empty());
}

#[tokio::test]
async fn exhausted_candidates_report_no_suitable_resolution() {
    let mut device = StubDevice::new(|_| Err(DeviceFailure::overconstrained("height")));
    let err = ResolutionNegotiator::default()
        .negotiate(&mut device, &back_camera(), RatioLabel::Tall9x16)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptureError::NoSuitableResolution { attempts: 4, .. }
    ));
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "No suitable resolution found for the ratio");
    assert_eq!(device.requested().len(), 4);
    assert_eq!(device.requested()[0], ResolutionCandidate::new(1080, 1920));
}

#[tokio::test]
async fn permission_denial_stops_the_search() {
    let mut device = StubDevice::new(|request| {
        if request.width == 1920 {
            Err(DeviceFailure::overconstrained("width"))
        } else {
            Err(DeviceFailure::PermissionDenied("user said no".into()))
        }
    });
    let err = ResolutionNegotiator::default()
        .negotiate(&mut device, &back_camera(), RatioLabel::Wide4x3)
        .await
        .unwrap_err();

    match &err {
        CaptureError::Device { kind, reason, .. } => {
            assert_eq!(*kind, DeviceErrorKind::PermissionDenied);
            assert_eq!(reason, "user said no");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.user_message(), "Error opening camera");
    assert_eq!(device.requested().len(), 2);
}

#[tokio::test]
async fn requests_carry_exact_device_and_facing() {
    let mut device = StubDevice::new(|_| Ok(()));
    let requests = device.requests.clone();
    let front = CameraIdentity::new("selfie", Facing::from_side_label("Front Camera"));
    ResolutionNegotiator::default()
        .negotiate(&mut device, &front, RatioLabel::Wide16x9)
        .await
        .unwrap();

    let request = requests.lock().unwrap()[0].clone();
    assert_eq!(request.device_id.as_deref(), Some("selfie"));
    assert_eq!(request.facing_mode.constraint_value(), "user");
    assert_eq!((request.width, request.height), (1920, 1080));
}

#[tokio::test]
async fn custom_table_without_ratio_is_invalid_ratio() {
    let table = ResolutionTable::new().with_ratio(
        RatioLabel::Wide16x9,
        vec![ResolutionCandidate::new(640, 360)],
    );
    let mut device = StubDevice::new(|_| Ok(()));
    let err = ResolutionNegotiator::new(table)
        .negotiate(&mut device, &back_camera(), RatioLabel::Tall3x4)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CaptureError::InvalidRatio {
            table: LookupTable::CaptureResolution,
            ..
        }
    ));
    assert!(device.requested().is_empty());
}
