//! Camera enumeration.

use async_trait::async_trait;

use crate::capture::device::{CameraIdentity, Facing};

/// Lists the cameras available to the scanner.
#[async_trait]
pub trait CameraDirectory: Send + Sync {
    async fn cameras(&self) -> Vec<CameraIdentity>;

    /// First environment-facing camera, if any.
    async fn back_camera(&self) -> Option<CameraIdentity> {
        self.cameras()
            .await
            .into_iter()
            .find(|camera| camera.facing == Facing::Environment)
    }
}

/// A fixed camera list.
#[derive(Debug, Clone, Default)]
pub struct StaticCameraDirectory {
    cameras: Vec<CameraIdentity>,
}

impl StaticCameraDirectory {
    pub fn new(cameras: Vec<CameraIdentity>) -> Self {
        Self { cameras }
    }

    /// Directory holding a single rear camera.
    pub fn single_back(device_id: impl Into<String>) -> Self {
        Self::new(vec![CameraIdentity::new(device_id, Facing::Environment)])
    }
}

#[async_trait]
impl CameraDirectory for StaticCameraDirectory {
    async fn cameras(&self) -> Vec<CameraIdentity> {
        self.cameras.clone()
    }
}
