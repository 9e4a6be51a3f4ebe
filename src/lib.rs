//! Atmospheric propagation for satellite-Earth links
//!
//! Reference standard atmospheres from Recommendation ITU-R P.835 and the
//! total slant-path attenuation combination from Recommendation ITU-R P.618.
//!
//! The reference atmospheres are self-contained. The slant-path attenuation
//! combines rain, gas, cloud and scintillation contributions computed by
//! external models, which are supplied through [`PropagationModels`].
//!
//! Physical inputs are [`Quantity`] values: bare numbers (or vectors of
//! numbers) in the documented unit, or values tagged with a compatible
//! [`Unit`]. Heights outside a profile's domain give `NaN` for that element
//! only; invalid inputs are rejected with an [`AtmosError`] before any
//! computation.
//!
//! ```
//! use itu_atmos::{p835, Quantity, Season, Unit};
//!
//! let t = p835::temperature([10., 30., 60.], Quantity::new(500., Unit::Metre), Season::Winter)?;
//! assert_eq!(t.len(), 3);
//! assert_eq!(t.unit(), Some(Unit::Kelvin));
//! # Ok::<(), itu_atmos::AtmosError>(())
//! ```

pub(crate) mod error;
pub mod p835;
pub mod slant_path;
pub(crate) mod units;

pub use error::AtmosError;
pub use p835::{ModelContext, Profile, Season, Version};
pub use slant_path::{
    atmospheric_attenuation_slant_path, atmospheric_attenuation_slant_path_with,
    AttenuationContributions, PropagationModels, SlantPathAttenuation, SlantPathOptions,
};
pub use units::{Dimension, IntoMagnitudes, Quantity, Unit};
