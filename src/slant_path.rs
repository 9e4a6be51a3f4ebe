//! Total atmospheric attenuation along an Earth-space path (ITU-R P.618).
//!
//! The gaseous, cloud, rain and scintillation contributions come from
//! separate propagation models which this crate doesn't implement. They are
//! supplied by the caller through [`PropagationModels`], one trait per model.
//! Every trait is also implemented for plain closures.

#[cfg(test)]
mod tests;

use log::{debug, info, warn};
use ndarray::Array1;
use rayon::prelude::*;

use crate::error::AtmosError;
use crate::p835::{self, ModelContext, ProfileQuantity, Season};
use crate::units::{broadcast_len, Quantity, Unit};

/// Outage probabilities (%) the combination method is recommended for.
const VALID_PROBABILITY: std::ops::RangeInclusive<f64> = 0.001..=50.;

/// Below this outage probability (%) the cloud and gas contributions are
/// evaluated at this value instead, since the rain prediction already accounts
/// for most of them.
const MIN_CLOUD_GAS_PROBABILITY: f64 = 1.;

/// Inputs to the rain attenuation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainQuery {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Frequency in GHz
    pub f: f64,
    /// Elevation angle in degrees
    pub el: f64,
    /// Height of the ground station above mean sea level, in km
    pub hs: f64,
    /// Outage probability in %
    pub p: f64,
    /// Rain rate exceeded 0.01 % of an average year in mm/h, if known
    pub r001: Option<f64>,
    /// Polarization tilt angle in degrees
    pub tau: f64,
    /// Slant path length below the rain height in km, if known
    pub ls: Option<f64>,
}

/// Rain attenuation model (ITU-R P.618), in dB.
pub trait RainAttenuation: Send + Sync {
    /// Rain attenuation in dB exceeded for `query.p` % of the time.
    fn rain_attenuation(&self, query: &RainQuery) -> f64;
}

impl<F> RainAttenuation for F
where
    F: Fn(&RainQuery) -> f64 + Send + Sync,
{
    fn rain_attenuation(&self, query: &RainQuery) -> f64 {
        self(query)
    }
}

/// Method used by the gaseous attenuation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GasMode {
    /// Approximate estimation (Annex 2 of ITU-R P.676)
    #[default]
    Approx,
    /// Line-by-line calculation (Annex 1 of ITU-R P.676)
    Exact,
}

/// Inputs to the gaseous attenuation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasQuery {
    /// Frequency in GHz
    pub f: f64,
    /// Elevation angle in degrees
    pub el: f64,
    /// Surface water-vapour density in g/m³
    pub rho: f64,
    /// Surface pressure in hPa
    pub p_surface: f64,
    /// Surface temperature in K
    pub t: f64,
    /// Calculation method
    pub mode: GasMode,
    /// Outage probability in %, never below 1 %
    pub p: f64,
}

/// Gaseous attenuation model for slant paths (ITU-R P.676), in dB.
pub trait GaseousAttenuation: Send + Sync {
    /// Gaseous attenuation in dB.
    fn gaseous_attenuation(&self, query: &GasQuery) -> f64;
}

impl<F> GaseousAttenuation for F
where
    F: Fn(&GasQuery) -> f64 + Send + Sync,
{
    fn gaseous_attenuation(&self, query: &GasQuery) -> f64 {
        self(query)
    }
}

/// Inputs to the cloud attenuation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudQuery {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Elevation angle in degrees
    pub el: f64,
    /// Frequency in GHz
    pub f: f64,
    /// Outage probability in %, never below 1 %
    pub p: f64,
}

/// Cloud attenuation model (ITU-R P.840), in dB.
pub trait CloudAttenuation: Send + Sync {
    /// Cloud attenuation in dB exceeded for `query.p` % of the time.
    fn cloud_attenuation(&self, query: &CloudQuery) -> f64;
}

impl<F> CloudAttenuation for F
where
    F: Fn(&CloudQuery) -> f64 + Send + Sync,
{
    fn cloud_attenuation(&self, query: &CloudQuery) -> f64 {
        self(query)
    }
}

/// Inputs to the tropospheric scintillation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScintillationQuery {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Frequency in GHz
    pub f: f64,
    /// Elevation angle in degrees
    pub el: f64,
    /// Outage probability in %
    pub p: f64,
    /// Physical diameter of the earth-station antenna in m
    pub d: f64,
    /// Antenna efficiency
    pub eta: f64,
    /// Surface temperature in K
    pub t: f64,
    /// Average surface relative humidity in %, if known
    pub h: Option<f64>,
    /// Surface pressure in hPa
    pub p_surface: f64,
    /// Height of the turbulent layer in m
    pub h_l: f64,
}

/// Tropospheric scintillation model (ITU-R P.618), in dB.
pub trait ScintillationAttenuation: Send + Sync {
    /// Scintillation fade depth in dB exceeded for `query.p` % of the time.
    fn scintillation_attenuation(&self, query: &ScintillationQuery) -> f64;
}

impl<F> ScintillationAttenuation for F
where
    F: Fn(&ScintillationQuery) -> f64 + Send + Sync,
{
    fn scintillation_attenuation(&self, query: &ScintillationQuery) -> f64 {
        self(query)
    }
}

/// Topographic altitude map (ITU-R P.1511).
pub trait TopographicAltitude: Send + Sync {
    /// Height above mean sea level in km at `lat`, `lon` (degrees).
    fn topographic_altitude(&self, lat: f64, lon: f64) -> f64;
}

impl<F> TopographicAltitude for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn topographic_altitude(&self, lat: f64, lon: f64) -> f64 {
        self(lat, lon)
    }
}

/// Annual mean surface temperature map (ITU-R P.1510).
pub trait SurfaceMeanTemperature: Send + Sync {
    /// Surface temperature in K at `lat`, `lon` (degrees).
    fn surface_mean_temperature(&self, lat: f64, lon: f64) -> f64;
}

impl<F> SurfaceMeanTemperature for F
where
    F: Fn(f64, f64) -> f64 + Send + Sync,
{
    fn surface_mean_temperature(&self, lat: f64, lon: f64) -> f64 {
        self(lat, lon)
    }
}

/// Surface water-vapour density map (ITU-R P.836).
pub trait SurfaceWaterVapourDensity: Send + Sync {
    /// Water-vapour density in g/m³ exceeded for `p` % of the time at `lat`,
    /// `lon` (degrees) and altitude `hs` (km).
    fn surface_water_vapour_density(&self, lat: f64, lon: f64, p: f64, hs: f64) -> f64;
}

impl<F> SurfaceWaterVapourDensity for F
where
    F: Fn(f64, f64, f64, f64) -> f64 + Send + Sync,
{
    fn surface_water_vapour_density(&self, lat: f64, lon: f64, p: f64, hs: f64) -> f64 {
        self(lat, lon, p, hs)
    }
}

/// The external propagation models used to build the total attenuation.
#[derive(Clone, Copy)]
pub struct PropagationModels<'a> {
    /// Ground station altitude, when not given
    pub topographic_altitude: &'a dyn TopographicAltitude,
    /// Surface temperature, when not given
    pub surface_mean_temperature: &'a dyn SurfaceMeanTemperature,
    /// Surface water-vapour density, when not given
    pub surface_water_vapour_density: &'a dyn SurfaceWaterVapourDensity,
    /// Rain contribution
    pub rain: &'a dyn RainAttenuation,
    /// Gaseous contribution
    pub gas: &'a dyn GaseousAttenuation,
    /// Cloud contribution
    pub cloud: &'a dyn CloudAttenuation,
    /// Scintillation contribution
    pub scintillation: &'a dyn ScintillationAttenuation,
}

impl std::fmt::Debug for PropagationModels<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagationModels").finish_non_exhaustive()
    }
}

/// Optional inputs and switches for
/// [`atmospheric_attenuation_slant_path`].
///
/// Optional physical inputs may be scalars or have one value per site.
#[derive(Debug, Clone)]
pub struct SlantPathOptions {
    /// Height of the ground station above mean sea level (km). Looked up from
    /// the topographic altitude map when `None`.
    pub hs: Option<Quantity>,
    /// Surface water-vapour density (g/m³). Looked up when `None`.
    pub rho: Option<Quantity>,
    /// Rain rate exceeded 0.01 % of the time (mm/h), passed to the rain model.
    pub r001: Option<Quantity>,
    /// Antenna efficiency.
    pub eta: f64,
    /// Surface temperature (K). Looked up when `None`.
    pub t: Option<Quantity>,
    /// Average surface relative humidity (%), passed to the scintillation
    /// model.
    pub h: Option<Quantity>,
    /// Surface pressure (hPa). Taken from the reference atmosphere at the
    /// station altitude when `None`.
    pub p_surface: Option<Quantity>,
    /// Height of the turbulent layer (m).
    pub h_l: Quantity,
    /// Slant path length below the rain height (km), passed to the rain
    /// model.
    pub ls: Option<Quantity>,
    /// Polarization tilt angle relative to the horizontal (degrees).
    pub tau: Quantity,
    /// Gaseous attenuation method.
    pub mode: GasMode,
    /// Return every contribution instead of just the total.
    pub return_contributions: bool,
    /// Include the rain contribution.
    pub include_rain: bool,
    /// Include the gaseous contribution.
    pub include_gas: bool,
    /// Include the scintillation contribution.
    pub include_scintillation: bool,
    /// Include the cloud contribution.
    pub include_clouds: bool,
    /// Number of worker threads for vector inputs, or `None` to let rayon
    /// choose.
    pub num_threads: Option<usize>,
}

impl Default for SlantPathOptions {
    fn default() -> Self {
        Self {
            hs: None,
            rho: None,
            r001: None,
            eta: 0.5,
            t: None,
            h: None,
            p_surface: None,
            h_l: Quantity::new(1e3, Unit::Metre),
            ls: None,
            tau: Quantity::new(45., Unit::Degree),
            mode: GasMode::Approx,
            return_contributions: false,
            include_rain: true,
            include_gas: true,
            include_scintillation: true,
            include_clouds: true,
            num_threads: None,
        }
    }
}

/// Every attenuation contribution, plus their combination. All in dB, with
/// one value per site.
#[derive(Debug, Clone, PartialEq)]
pub struct AttenuationContributions {
    /// Gaseous attenuation
    pub gas: Quantity,
    /// Cloud attenuation
    pub cloud: Quantity,
    /// Rain attenuation
    pub rain: Quantity,
    /// Scintillation fade depth
    pub scintillation: Quantity,
    /// Total attenuation
    pub total: Quantity,
}

/// Result of [`atmospheric_attenuation_slant_path`].
#[derive(Debug, Clone, PartialEq)]
pub enum SlantPathAttenuation {
    /// Only the total attenuation
    Total(Quantity),
    /// Each contribution and the total
    Contributions(AttenuationContributions),
}

impl SlantPathAttenuation {
    /// The total attenuation in dB.
    pub fn total(&self) -> &Quantity {
        match self {
            SlantPathAttenuation::Total(total) => total,
            SlantPathAttenuation::Contributions(contributions) => &contributions.total,
        }
    }
}

/// Combine the contributions (dB) into the total attenuation (dB).
///
/// Rain and clouds are spatially correlated and add linearly; scintillation
/// adds in quadrature to them; gases add on top.
pub fn combine_contributions(gas: f64, cloud: f64, rain: f64, scintillation: f64) -> f64 {
    gas + f64::sqrt((rain + cloud).powi(2) + scintillation.powi(2))
}

/// Contributions for one site, in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SiteAttenuation {
    gas: f64,
    cloud: f64,
    rain: f64,
    scintillation: f64,
    total: f64,
}

/// Inputs for every site, as magnitudes in the units the models expect.
/// Each field has either one value per site or a single shared value.
struct SiteInputs {
    lat: Array1<f64>,
    lon: Array1<f64>,
    el: Array1<f64>,
    f: Array1<f64>,
    p: Array1<f64>,
    d: Array1<f64>,
    hs: Option<Array1<f64>>,
    rho: Option<Array1<f64>>,
    r001: Option<Array1<f64>>,
    t: Option<Array1<f64>>,
    h: Option<Array1<f64>>,
    p_surface: Option<Array1<f64>>,
    h_l: Array1<f64>,
    ls: Option<Array1<f64>>,
    tau: Array1<f64>,
}

/// Element `index` of a broadcast input.
fn at(values: &Array1<f64>, index: usize) -> f64 {
    if values.len() == 1 {
        values[0]
    } else {
        values[index]
    }
}

fn optional_magnitudes(
    quantity: Option<&Quantity>,
    unit: Unit,
    name: &'static str,
) -> Result<Option<Array1<f64>>, AtmosError> {
    quantity.map(|q| q.magnitudes(unit, name)).transpose()
}

impl SiteInputs {
    fn new(
        lat: &Quantity,
        lon: &Quantity,
        el: &Quantity,
        f: &Quantity,
        p: &Quantity,
        d: &Quantity,
        options: &SlantPathOptions,
    ) -> Result<Self, AtmosError> {
        Ok(Self {
            lat: lat.magnitudes(Unit::Degree, "Latitude")?,
            lon: lon.magnitudes(Unit::Degree, "Longitude")?,
            el: el.magnitudes(Unit::Degree, "Elevation angle")?,
            f: f.magnitudes(Unit::GigaHertz, "Frequency")?,
            p: p.magnitudes(Unit::Percent, "Percentage of the time")?,
            d: d.magnitudes(Unit::Metre, "Antenna diameter")?,
            hs: optional_magnitudes(options.hs.as_ref(), Unit::Kilometre, "Altitude")?,
            rho: optional_magnitudes(
                options.rho.as_ref(),
                Unit::GramPerCubicMetre,
                "Water vapour density",
            )?,
            r001: optional_magnitudes(
                options.r001.as_ref(),
                Unit::MillimetrePerHour,
                "Point rainfall rate",
            )?,
            t: optional_magnitudes(options.t.as_ref(), Unit::Kelvin, "Surface temperature")?,
            h: optional_magnitudes(options.h.as_ref(), Unit::Percent, "Relative humidity")?,
            p_surface: optional_magnitudes(
                options.p_surface.as_ref(),
                Unit::HectoPascal,
                "Surface pressure",
            )?,
            h_l: options.h_l.magnitudes(Unit::Metre, "Turbulent layer height")?,
            ls: optional_magnitudes(options.ls.as_ref(), Unit::Kilometre, "Slant path length")?,
            tau: options.tau.magnitudes(Unit::Degree, "Polarization tilt angle")?,
        })
    }

    /// Number of sites all inputs broadcast to.
    fn len(&self) -> Result<usize, AtmosError> {
        let mut lens = vec![
            self.lat.len(),
            self.lon.len(),
            self.el.len(),
            self.f.len(),
            self.p.len(),
            self.d.len(),
            self.h_l.len(),
            self.tau.len(),
        ];
        lens.extend(
            [
                &self.hs,
                &self.rho,
                &self.r001,
                &self.t,
                &self.h,
                &self.p_surface,
                &self.ls,
            ]
            .into_iter()
            .flatten()
            .map(|values| values.len()),
        );
        broadcast_len(&lens)
    }

    /// Compute the attenuation at site `index`.
    fn run(
        &self,
        index: usize,
        context: &ModelContext,
        models: &PropagationModels<'_>,
        options: &SlantPathOptions,
    ) -> SiteAttenuation {
        let lat = at(&self.lat, index);
        let lon = at(&self.lon, index);
        let el = at(&self.el, index);
        let f = at(&self.f, index);
        let p = at(&self.p, index);
        let optional = |values: &Option<Array1<f64>>| values.as_ref().map(|v| at(v, index));

        // Surface parameters not given are looked up
        let hs = optional(&self.hs)
            .unwrap_or_else(|| models.topographic_altitude.topographic_altitude(lat, lon));
        let t = optional(&self.t)
            .unwrap_or_else(|| models.surface_mean_temperature.surface_mean_temperature(lat, lon));
        let p_surface = optional(&self.p_surface).unwrap_or_else(|| {
            context.profile_value(ProfileQuantity::Pressure, lat, hs, Season::Summer)
        });
        let rho = optional(&self.rho).unwrap_or_else(|| {
            models
                .surface_water_vapour_density
                .surface_water_vapour_density(lat, lon, p, hs)
        });

        let p_cloud_gas = p.max(MIN_CLOUD_GAS_PROBABILITY);

        let rain = if options.include_rain {
            models.rain.rain_attenuation(&RainQuery {
                lat,
                lon,
                f,
                el,
                hs,
                p,
                r001: optional(&self.r001),
                tau: at(&self.tau, index),
                ls: optional(&self.ls),
            })
        } else {
            0.
        };

        let gas = if options.include_gas {
            models.gas.gaseous_attenuation(&GasQuery {
                f,
                el,
                rho,
                p_surface,
                t,
                mode: options.mode,
                p: p_cloud_gas,
            })
        } else {
            0.
        };

        let cloud = if options.include_clouds {
            models.cloud.cloud_attenuation(&CloudQuery {
                lat,
                lon,
                el,
                f,
                p: p_cloud_gas,
            })
        } else {
            0.
        };

        let scintillation = if options.include_scintillation {
            models
                .scintillation
                .scintillation_attenuation(&ScintillationQuery {
                    lat,
                    lon,
                    f,
                    el,
                    p,
                    d: at(&self.d, index),
                    eta: options.eta,
                    t,
                    h: optional(&self.h),
                    p_surface,
                    h_l: at(&self.h_l, index),
                })
        } else {
            0.
        };

        SiteAttenuation {
            gas,
            cloud,
            rain,
            scintillation,
            total: combine_contributions(gas, cloud, rain, scintillation),
        }
    }
}

/// Total atmospheric attenuation along a slant path, using the default
/// reference atmosphere context.
///
/// See [`atmospheric_attenuation_slant_path_with`].
#[allow(clippy::too_many_arguments)]
pub fn atmospheric_attenuation_slant_path(
    models: &PropagationModels<'_>,
    lat: impl Into<Quantity>,
    lon: impl Into<Quantity>,
    el: impl Into<Quantity>,
    f: impl Into<Quantity>,
    p: impl Into<Quantity>,
    d: impl Into<Quantity>,
    options: &SlantPathOptions,
) -> Result<SlantPathAttenuation, AtmosError> {
    atmospheric_attenuation_slant_path_with(&p835::context(), models, lat, lon, el, f, p, d, options)
}

/// Total atmospheric attenuation along a slant path, in dB.
///
/// For latitude `lat` and longitude `lon` (degrees), elevation angle `el`
/// (degrees), frequency `f` (GHz), outage probability `p` (%) and antenna
/// diameter `d` (m), combine the gaseous (Ag), cloud (Ac), rain (Ar) and
/// scintillation (As) contributions as
///
/// ```text
/// A = Ag + sqrt((Ar + Ac)² + As²)
/// ```
///
/// Cloud and gaseous attenuation are evaluated at no less than 1 % of the
/// time. A disabled contribution is 0 dB and its model isn't called. The
/// combination is only recommended for `p` between 0.001 % and 50 %; other
/// values log a warning but are still computed.
///
/// Inputs may be scalars or vectors with one value per site; all vectors must
/// have the same length. Sites are computed in parallel. Every input is unit
/// checked before anything is computed.
#[allow(clippy::too_many_arguments)]
pub fn atmospheric_attenuation_slant_path_with(
    context: &ModelContext,
    models: &PropagationModels<'_>,
    lat: impl Into<Quantity>,
    lon: impl Into<Quantity>,
    el: impl Into<Quantity>,
    f: impl Into<Quantity>,
    p: impl Into<Quantity>,
    d: impl Into<Quantity>,
    options: &SlantPathOptions,
) -> Result<SlantPathAttenuation, AtmosError> {
    let inputs = SiteInputs::new(
        &lat.into(),
        &lon.into(),
        &el.into(),
        &f.into(),
        &p.into(),
        &d.into(),
        options,
    )?;
    let num_sites = inputs.len()?;
    debug!("slant path inputs broadcast to {num_sites} sites");

    if inputs.p.iter().any(|p| !VALID_PROBABILITY.contains(p)) {
        warn!(
            "The method to compute the total atmospheric attenuation in recommendation \
             ITU-R P.618 is only recommended for unavailabilities (p) between 0.001 % and 50 %"
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.num_threads.unwrap_or(0))
        .build()
        .map_err(|e| AtmosError::ThreadPool(e.to_string()))?;

    info!(
        "Computing slant path attenuation for {num_sites} sites with {}",
        context.version()
    );
    let sites: Vec<SiteAttenuation> = pool.install(|| {
        (0..num_sites)
            .into_par_iter()
            .map(|index| inputs.run(index, context, models, options))
            .collect()
    });

    let collect = |component: fn(&SiteAttenuation) -> f64| {
        Quantity::new(
            sites.iter().map(component).collect::<Array1<f64>>(),
            Unit::Decibel,
        )
    };
    let total = collect(|site| site.total);

    if options.return_contributions {
        Ok(SlantPathAttenuation::Contributions(
            AttenuationContributions {
                gas: collect(|site| site.gas),
                cloud: collect(|site| site.cloud),
                rain: collect(|site| site.rain),
                scintillation: collect(|site| site.scintillation),
                total,
            },
        ))
    } else {
        Ok(SlantPathAttenuation::Total(total))
    }
}
