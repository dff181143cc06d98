//! Audio capture, device enumeration, and clip encoding.

pub mod devices;
pub mod encoder;
pub mod recorder;

pub use devices::{AudioDeviceInfo, list_input_devices};
pub use encoder::{AudioEncoder, create_encoder};
pub use recorder::CpalCapture;
