//! ITU-R P.835 reference standard atmospheres.
//!
//! Temperature, pressure and water-vapour density as a function of height,
//! either for the mean annual global reference atmosphere (the `standard_*`
//! functions) or for the latitude and season dependent reference profiles.
//!
//! All reads go through a [`ModelContext`], which holds the recommendation
//! version. The free functions in this module use the process-wide default
//! context, which [`change_version`] replaces.

mod dispatch;
mod profiles;
mod standard;


use std::sync::{PoisonError, RwLock};

use log::debug;
use ndarray::{Array1, Zip};

pub use self::dispatch::{classify, LatitudeBand, ProfileQuantity, Season};
pub use self::profiles::Profile;
use crate::error::AtmosError;
use crate::units::{broadcast, broadcast_len, Quantity, Unit};

/// Default surface temperature of the standard atmosphere, in K.
pub const STANDARD_SURFACE_TEMPERATURE: f64 = 288.15;

/// Default surface pressure of the standard atmosphere, in hPa.
pub const STANDARD_SURFACE_PRESSURE: f64 = 1013.25;

/// Default water-vapour scale height of the standard atmosphere, in km.
pub const STANDARD_SCALE_HEIGHT: f64 = 2.;

/// Default surface water-vapour density of the standard atmosphere, in g/m³.
pub const STANDARD_SURFACE_WATER_VAPOUR_DENSITY: f64 = 7.5;

/// Implemented versions of Recommendation ITU-R P.835.
///
/// Earlier revisions (P.835-1 to P.835-4) use the same reference profiles and
/// are not offered separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// P.835-5 (02/12)
    #[default]
    P835v5,
}

impl Version {
    /// Numeric revision identifier.
    pub fn id(self) -> u32 {
        match self {
            Version::P835v5 => 5,
        }
    }

    /// Evaluate `quantity` of `profile` at height `h` (km).
    fn profile_value(self, quantity: ProfileQuantity, profile: Profile, h: f64) -> f64 {
        match self {
            Version::P835v5 => match quantity {
                ProfileQuantity::Temperature => profile.temperature(h),
                ProfileQuantity::Pressure => profile.pressure(h),
                ProfileQuantity::WaterVapourDensity => profile.water_vapour_density(h),
            },
        }
    }
}

impl TryFrom<u32> for Version {
    type Error = AtmosError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            5 => Ok(Version::P835v5),
            _ => Err(AtmosError::UnsupportedVersion(id)),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ITU-R P.835-{}", self.id())
    }
}

/// Configuration for reading the reference atmospheres.
///
/// A context is a plain value: copying one takes a snapshot, so a computation
/// holding a copy keeps seeing the same version even if the default context
/// is switched meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelContext {
    version: Version,
}

impl ModelContext {
    /// A context using `version`.
    pub fn new(version: Version) -> Self {
        Self { version }
    }

    /// The recommendation version in use.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Switch to the version with identifier `id`. On error the context is
    /// left untouched.
    pub fn change_version(&mut self, id: u32) -> Result<(), AtmosError> {
        self.version = Version::try_from(id)?;
        Ok(())
    }

    /// Temperature in K at latitudes `lat` (degrees) and heights `h` (km).
    pub fn temperature(
        &self,
        lat: impl Into<Quantity>,
        h: impl Into<Quantity>,
        season: Season,
    ) -> Result<Quantity, AtmosError> {
        self.profile_quantity(lat.into(), h.into(), season, ProfileQuantity::Temperature)
    }

    /// Pressure in hPa at latitudes `lat` (degrees) and heights `h` (km).
    pub fn pressure(
        &self,
        lat: impl Into<Quantity>,
        h: impl Into<Quantity>,
        season: Season,
    ) -> Result<Quantity, AtmosError> {
        self.profile_quantity(lat.into(), h.into(), season, ProfileQuantity::Pressure)
    }

    /// Water-vapour density in g/m³ at latitudes `lat` (degrees) and heights
    /// `h` (km).
    pub fn water_vapour_density(
        &self,
        lat: impl Into<Quantity>,
        h: impl Into<Quantity>,
        season: Season,
    ) -> Result<Quantity, AtmosError> {
        self.profile_quantity(
            lat.into(),
            h.into(),
            season,
            ProfileQuantity::WaterVapourDensity,
        )
    }

    /// Scalar read of a reference profile, for callers that already hold
    /// plain magnitudes.
    pub(crate) fn profile_value(
        &self,
        quantity: ProfileQuantity,
        lat: f64,
        h: f64,
        season: Season,
    ) -> f64 {
        self.version
            .profile_value(quantity, classify(lat, season), h)
    }

    fn profile_quantity(
        &self,
        lat: Quantity,
        h: Quantity,
        season: Season,
        quantity: ProfileQuantity,
    ) -> Result<Quantity, AtmosError> {
        let lat = lat.magnitudes(Unit::Degree, "Latitude")?;
        let h = h.magnitudes(Unit::Kilometre, "Height")?;
        debug!("{quantity:?} from {} for {season}", self.version);

        let version = self.version;
        let values = dispatch::select_and_evaluate(lat.view(), h.view(), season, |profile, h| {
            version.profile_value(quantity, profile, h)
        })?;

        let unit = match quantity {
            ProfileQuantity::Temperature => Unit::Kelvin,
            ProfileQuantity::Pressure => Unit::HectoPascal,
            ProfileQuantity::WaterVapourDensity => Unit::GramPerCubicMetre,
        };
        Ok(Quantity::new(values, unit))
    }

    /// Standard atmosphere temperature in K at heights `h` (km), for surface
    /// temperature `t0` (K, usually [`STANDARD_SURFACE_TEMPERATURE`]).
    pub fn standard_temperature(
        &self,
        h: impl Into<Quantity>,
        t0: impl Into<Quantity>,
    ) -> Result<Quantity, AtmosError> {
        let h = h.into().magnitudes(Unit::Kilometre, "Height")?;
        let t0 = t0.into().magnitudes(Unit::Kelvin, "Surface temperature")?;
        let len = broadcast_len(&[h.len(), t0.len()])?;
        let values = match self.version {
            Version::P835v5 => Zip::from(broadcast(&h, len)?)
                .and(broadcast(&t0, len)?)
                .map_collect(|&h, &t0| standard::temperature(h, t0)),
        };
        Ok(Quantity::new(values, Unit::Kelvin))
    }

    /// Standard atmosphere pressure in hPa at heights `h` (km), for surface
    /// temperature `t0` (K) and surface pressure `p0` (hPa).
    ///
    /// Each height is integrated through the layers independently.
    pub fn standard_pressure(
        &self,
        h: impl Into<Quantity>,
        t0: impl Into<Quantity>,
        p0: impl Into<Quantity>,
    ) -> Result<Quantity, AtmosError> {
        let h = h.into().magnitudes(Unit::Kilometre, "Height")?;
        let t0 = t0.into().magnitudes(Unit::Kelvin, "Surface temperature")?;
        let p0 = p0.into().magnitudes(Unit::HectoPascal, "Surface pressure")?;
        let values = match self.version {
            Version::P835v5 => zip_with(&h, &t0, &p0, standard::pressure)?,
        };
        Ok(Quantity::new(values, Unit::HectoPascal))
    }

    /// Standard water-vapour density in g/m³ at heights `h` (km), for scale
    /// height `h0` (km) and surface density `rho0` (g/m³).
    pub fn standard_water_vapour_density(
        &self,
        h: impl Into<Quantity>,
        h0: impl Into<Quantity>,
        rho0: impl Into<Quantity>,
    ) -> Result<Quantity, AtmosError> {
        let (h, h0, rho0) = water_vapour_inputs(h.into(), h0.into(), rho0.into())?;
        let values = match self.version {
            Version::P835v5 => zip_with(&h, &h0, &rho0, standard::water_vapour_density)?,
        };
        Ok(Quantity::new(values, Unit::GramPerCubicMetre))
    }

    /// Standard water-vapour pressure in hPa at heights `h` (km), for scale
    /// height `h0` (km) and surface density `rho0` (g/m³).
    pub fn standard_water_vapour_pressure(
        &self,
        h: impl Into<Quantity>,
        h0: impl Into<Quantity>,
        rho0: impl Into<Quantity>,
    ) -> Result<Quantity, AtmosError> {
        let (h, h0, rho0) = water_vapour_inputs(h.into(), h0.into(), rho0.into())?;
        let values = match self.version {
            Version::P835v5 => zip_with(&h, &h0, &rho0, standard::water_vapour_pressure)?,
        };
        Ok(Quantity::new(values, Unit::HectoPascal))
    }
}

fn water_vapour_inputs(
    h: Quantity,
    h0: Quantity,
    rho0: Quantity,
) -> Result<(Array1<f64>, Array1<f64>, Array1<f64>), AtmosError> {
    Ok((
        h.magnitudes(Unit::Kilometre, "Height")?,
        h0.magnitudes(Unit::Kilometre, "Scale height")?,
        rho0.magnitudes(Unit::GramPerCubicMetre, "Surface water vapour density")?,
    ))
}

/// Apply `f` elementwise over three broadcast inputs.
fn zip_with<F>(
    a: &Array1<f64>,
    b: &Array1<f64>,
    c: &Array1<f64>,
    f: F,
) -> Result<Array1<f64>, AtmosError>
where
    F: Fn(f64, f64, f64) -> f64,
{
    let len = broadcast_len(&[a.len(), b.len(), c.len()])?;
    Ok(Zip::from(broadcast(a, len)?)
        .and(broadcast(b, len)?)
        .and(broadcast(c, len)?)
        .map_collect(|&a, &b, &c| f(a, b, c)))
}

/// The process-wide default context.
static DEFAULT_CONTEXT: RwLock<ModelContext> = RwLock::new(ModelContext {
    version: Version::P835v5,
});

/// Snapshot of the process-wide default context.
pub fn context() -> ModelContext {
    *DEFAULT_CONTEXT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Switch the process-wide default context to the version with identifier
/// `id`. Fails, leaving the current version in place, if it isn't
/// implemented.
pub fn change_version(id: u32) -> Result<(), AtmosError> {
    let version = Version::try_from(id)?;
    let mut context = DEFAULT_CONTEXT
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    context.version = version;
    debug!("switched default context to {version}");
    Ok(())
}

/// Identifier of the version used by the process-wide default context.
pub fn get_version() -> u32 {
    context().version().id()
}

/// Temperature in K, using the default context. See
/// [`ModelContext::temperature`].
pub fn temperature(
    lat: impl Into<Quantity>,
    h: impl Into<Quantity>,
    season: Season,
) -> Result<Quantity, AtmosError> {
    context().temperature(lat, h, season)
}

/// Pressure in hPa, using the default context. See
/// [`ModelContext::pressure`].
pub fn pressure(
    lat: impl Into<Quantity>,
    h: impl Into<Quantity>,
    season: Season,
) -> Result<Quantity, AtmosError> {
    context().pressure(lat, h, season)
}

/// Water-vapour density in g/m³, using the default context. See
/// [`ModelContext::water_vapour_density`].
pub fn water_vapour_density(
    lat: impl Into<Quantity>,
    h: impl Into<Quantity>,
    season: Season,
) -> Result<Quantity, AtmosError> {
    context().water_vapour_density(lat, h, season)
}

/// Standard atmosphere temperature in K, using the default context.
pub fn standard_temperature(
    h: impl Into<Quantity>,
    t0: impl Into<Quantity>,
) -> Result<Quantity, AtmosError> {
    context().standard_temperature(h, t0)
}

/// Standard atmosphere pressure in hPa, using the default context.
pub fn standard_pressure(
    h: impl Into<Quantity>,
    t0: impl Into<Quantity>,
    p0: impl Into<Quantity>,
) -> Result<Quantity, AtmosError> {
    context().standard_pressure(h, t0, p0)
}

/// Standard water-vapour density in g/m³, using the default context.
pub fn standard_water_vapour_density(
    h: impl Into<Quantity>,
    h0: impl Into<Quantity>,
    rho0: impl Into<Quantity>,
) -> Result<Quantity, AtmosError> {
    context().standard_water_vapour_density(h, h0, rho0)
}

/// Standard water-vapour pressure in hPa, using the default context.
pub fn standard_water_vapour_pressure(
    h: impl Into<Quantity>,
    h0: impl Into<Quantity>,
    rho0: impl Into<Quantity>,
) -> Result<Quantity, AtmosError> {
    context().standard_water_vapour_pressure(h, h0, rho0)
}
