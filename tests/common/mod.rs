//! Common test utilities and helpers for the doc-capture tests
//!
//! Frame builders, a hand-rolled device stub for the capture seam, and
//! assertions on decoded artifacts.
#![allow(dead_code)]

/// Test frame utilities and constants
pub mod test_frames {
    use cap_scale::presets::Size;
    use doc_capture::capture::RawFrame;

    pub const HD_SIZE: Size = Size { w: 1280, h: 720 };
    pub const FHD_SIZE: Size = Size { w: 1920, h: 1080 };
    pub const XGA_SIZE: Size = Size { w: 1024, h: 768 };

    /// Solid colour RGBA frame
    pub fn solid_frame(size: Size, r: u8, g: u8, b: u8) -> RawFrame {
        let data = [r, g, b, 255].repeat(size.area() as usize);
        RawFrame::from_rgba(size.w, size.h, data)
    }

    /// Left half `left`, right half `right`
    pub fn split_frame(size: Size, left: [u8; 3], right: [u8; 3]) -> RawFrame {
        let mut data = Vec::with_capacity(size.area() as usize * 4);
        for _ in 0..size.h {
            for x in 0..size.w {
                let [r, g, b] = if x < size.w / 2 { left } else { right };
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        RawFrame::from_rgba(size.w, size.h, data)
    }
}

/// Capture device stub driven by a predicate
pub mod stub_device {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use cap_scale::presets::Size;
    use doc_capture::capture::{
        CaptureDevice, DeviceFailure, MediaStream, RawFrame, StreamRequest,
    };
    use doc_capture::config::ResolutionCandidate;

    type Decide = dyn Fn(&StreamRequest) -> Result<(), DeviceFailure> + Send + Sync;

    /// Accepts requests the predicate allows and streams a grey frame of the
    /// requested size. Every request is logged.
    pub struct StubDevice {
        decide: Box<Decide>,
        pub requests: Arc<Mutex<Vec<StreamRequest>>>,
    }

    impl StubDevice {
        pub fn new(decide: impl Fn(&StreamRequest) -> Result<(), DeviceFailure> + Send + Sync + 'static) -> Self {
            Self {
                decide: Box::new(decide),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Accept exactly `accepted`, reject everything else as overconstrained.
        pub fn accept_only(accepted: ResolutionCandidate) -> Self {
            Self::new(move |request| {
                if request.candidate() == accepted {
                    Ok(())
                } else {
                    Err(DeviceFailure::overconstrained("width"))
                }
            })
        }

        pub fn requested(&self) -> Vec<ResolutionCandidate> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(StreamRequest::candidate)
                .collect()
        }
    }

    #[async_trait]
    impl CaptureDevice for StubDevice {
        async fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, DeviceFailure> {
            self.requests.lock().unwrap().push(request.clone());
            (self.decide)(request)?;
            Ok(Box::new(GreyStream {
                size: request.candidate().size(),
                live: true,
            }))
        }
    }

    struct GreyStream {
        size: Size,
        live: bool,
    }

    #[async_trait]
    impl MediaStream for GreyStream {
        async fn next_frame(&mut self) -> Option<RawFrame> {
            self.live.then(|| {
                RawFrame::from_rgba(self.size.w, self.size.h, vec![128; self.size.area() as usize * 4])
            })
        }

        fn stop(&mut self) {
            self.live = false;
        }

        fn is_live(&self) -> bool {
            self.live
        }
    }
}

/// Custom assertions for testing
pub mod assertions {
    use cap_scale::presets::Size;
    use doc_capture::ImageArtifact;

    /// Assert that an artifact has the expected size, in metadata and in pixels
    pub fn assert_artifact_size(artifact: &ImageArtifact, expected: Size) {
        assert_eq!(
            artifact.size(),
            expected,
            "Artifact size mismatch: expected {}, got {}",
            expected,
            artifact.size()
        );
        let decoded = artifact.decode().expect("artifact decodes");
        assert_eq!(
            (decoded.width(), decoded.height()),
            (expected.w, expected.h),
            "Decoded size mismatch"
        );
    }

    /// Assert that the pixel at (x, y) is within `tolerance` of `rgb`
    pub fn assert_pixel_near(artifact: &ImageArtifact, x: u32, y: u32, rgb: [u8; 3], tolerance: u8) {
        let decoded = artifact.decode().expect("artifact decodes");
        let px = decoded.get_pixel(x, y).0;
        for channel in 0..3 {
            assert!(
                px[channel].abs_diff(rgb[channel]) <= tolerance,
                "Pixel ({}, {}) = {:?}, expected about {:?}",
                x,
                y,
                px,
                rgb
            );
        }
    }
}
