// # Capture Module
//
// Camera-side plumbing: the device seam, enumeration, exact-resolution
// negotiation and the software devices used by the CLI and tests.

pub mod device;
pub mod directory;
pub mod negotiate;
pub mod still;
pub mod synthetic;

pub use device::{CameraIdentity, CaptureDevice, DeviceFailure, Facing, MediaStream, RawFrame, StreamRequest};
pub use directory::{CameraDirectory, StaticCameraDirectory};
pub use negotiate::{ActiveCapture, AttemptOutcome, NegotiationAttempt, ResolutionNegotiator};
pub use still::StillImageCamera;
pub use synthetic::{DeviceProbe, SyntheticCamera};
