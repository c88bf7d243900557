//! Register transports
//!
//! Three transports available:
//! - **Mmio**: volatile accesses to the real register window (`/dev/mem` or a
//!   raw bare-metal address)
//! - **Software**: behavioural model of the engine, no hardware needed
//! - **Recording**: wraps another transport and logs every access

pub mod mmio;
pub mod recording;
pub mod software;

pub use mmio::MmioBus;
pub use recording::{Access, AccessKind, RecordingBus};
pub use software::SoftwarePme;
