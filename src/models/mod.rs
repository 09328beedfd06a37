//! Domain models for course generation.
//!
//! # Core Concepts
//!
//! ## Persisted Entities
//!
//! - [`CourseModule`]: Container for one generated course. Owns its units.
//! - [`Unit`]: Chapter-sized segment with sanitized long-form content.
//! - [`Activity`]: Aggregated activity text generated for a unit.
//! - [`Assessment`]: Placeholder assessment synthesized per unit at commit time.
//! - [`Outline`]: Root record of a generation pass, referencing module and units in order.
//!
//! ## Transient Entities
//!
//! - [`CourseRequest`]: What the caller asked for. Never stored.
//! - [`DraftEntry`]: A generated course staged in the draft cache until it is
//!   committed or discarded.

mod course;
mod draft;
mod module;
mod outline;
mod regeneration;
mod unit;

pub use course::*;
pub use draft::*;
pub use module::*;
pub use outline::*;
pub use regeneration::*;
pub use unit::*;
