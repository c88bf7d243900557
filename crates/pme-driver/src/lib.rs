//! Register-level driver for the Pattern Matching Engine (PME).
//!
//! The PME is a 128-neuron hardware classifier: it learns byte patterns
//! (up to 128 components each) under a category and recognizes new patterns
//! by nearest distance, in radial-basis-function or k-nearest-neighbor mode.
//! It is driven entirely through fifteen 16-bit registers.
//!
//! # Transports
//!
//! ```text
//! Hardware:
//!   MmioBus       /dev/mem mapping or raw bare-metal address
//!
//! Development / tests:
//!   SoftwarePme   behavioural model of the engine
//!   RecordingBus  wraps any transport, logs every access
//! ```
//!
//! # Quick start
//!
//! ```
//! use pme_driver::{Pme, SoftwarePme};
//!
//! let mut pme = Pme::new(SoftwarePme::new());
//! pme.begin();
//!
//! pme.learn(&[10, 20, 30, 40], 1);
//! pme.learn(&[200, 210, 220, 230], 2);
//!
//! assert_eq!(pme.classify(&[12, 21, 29, 41]), 1);
//! assert_eq!(pme.committed_count(), 2);
//!
//! let saved = pme.save_knowledge();
//! let blob = pme_driver::pack_knowledge(&saved).unwrap();
//! assert_eq!(pme_driver::unpack_knowledge(&blob).unwrap(), saved);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod bus;
mod config;
mod driver;
mod error;
pub mod fields;
mod knowledge;
mod neuron;
mod session;

/// Register map, bit fields and network constants (re-exported from pme-chip).
pub use pme_chip as chip;

pub use backends::{Access, AccessKind, MmioBus, RecordingBus, SoftwarePme};
pub use bus::{BusType, RegisterBus};
pub use config::PmeConfig;
pub use driver::{Neighbor, Pme, VECTOR_OVERFLOW};
pub use error::{PmeError, Result};
pub use knowledge::{pack_knowledge, unpack_knowledge, KNOWLEDGE_MAGIC, RECORD_LEN};
pub use neuron::NeuronRecord;
pub use pme_chip::{ClassificationMode, DistanceMode, Register};
pub use session::{RestoreSession, SaveSession};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ClassificationMode, DistanceMode, NeuronRecord, Pme, PmeConfig, PmeError, RegisterBus,
        Result, SoftwarePme, VECTOR_OVERFLOW,
    };
}
