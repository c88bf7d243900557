//! Silicon model for the Pattern Matching Engine (PME).
//!
//! This crate has **no dependencies** and **no hardware access**: it is a
//! pure description of the co-processor as seen from software. Register
//! addresses, bit-field masks, network geometry and mode encodings are fixed
//! by the silicon and must be preserved bit for bit.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`map`] | Physical memory window of the register block |
//! | [`regs`] | Register map, typed [`Register`](regs::Register) names, bit definitions |
//! | [`network`] | Neuron count, vector size, category range, distance/classifier modes |

#![forbid(unsafe_code)]
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod map;
pub mod network;
pub mod regs;

pub use network::{ClassificationMode, DistanceMode};
pub use regs::Register;
