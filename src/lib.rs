//! Peak skin dose in fluoroscopically guided procedures.
//!
//! Each irradiation event of a procedure is replayed on a discretized model of
//! the patient's skin lying on the table: the cells struck by the X-ray beam
//! are found, the event's reference-point air kerma is corrected for distance,
//! backscatter, medium and table transmission, and the result is accumulated
//! into a per-cell dose map.

pub mod beam;
pub mod config;
pub mod corrections;
pub mod dose;
pub mod error;
pub mod event;
pub mod field;
pub mod io;
pub mod phantom;
pub mod scene;
pub mod store;
pub mod utils;

pub use geometry::{Point, RatioVec, Rotation, Vector};
pub use units::{Angle, Area, Length, Ratio};

pub use error::{ConfigurationError, CorrectionError, Error, LookupMiss, Result};
