//! Selection of a reference profile from latitude and season.

use std::str::FromStr;

use log::debug;
use ndarray::{Array1, ArrayView1, Zip};

use super::profiles::Profile;
use crate::error::AtmosError;
use crate::units::broadcast_len;

/// Latitude band, determined by the absolute latitude only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LatitudeBand {
    /// |lat| < 22°
    Low,
    /// 22° ≤ |lat| < 45°
    Mid,
    /// |lat| ≥ 45°
    High,
}

impl LatitudeBand {
    /// Band containing `lat` (degrees). Non-finite latitudes land in
    /// [`LatitudeBand::High`].
    pub fn from_latitude(lat: f64) -> Self {
        let lat = lat.abs();
        if lat < 22. {
            LatitudeBand::Low
        } else if lat < 45. {
            LatitudeBand::Mid
        } else {
            LatitudeBand::High
        }
    }
}

/// Season of the year. Only the mid and high latitude profiles change with
/// the season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Season {
    /// Summer (the default)
    #[default]
    Summer,
    /// Winter
    Winter,
}

impl FromStr for Season {
    type Err = AtmosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Season::Summer),
            "winter" => Ok(Season::Winter),
            _ => Err(AtmosError::UnknownSeason(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Summer => write!(f, "summer"),
            Season::Winter => write!(f, "winter"),
        }
    }
}

/// Physical quantity read from a reference profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileQuantity {
    /// Temperature in K
    Temperature,
    /// Pressure in hPa
    Pressure,
    /// Water-vapour density in g/m³
    WaterVapourDensity,
}

/// Profile to use at latitude `lat` (degrees) during `season`.
pub fn classify(lat: f64, season: Season) -> Profile {
    match (LatitudeBand::from_latitude(lat), season) {
        (LatitudeBand::Low, _) => Profile::Low,
        (LatitudeBand::Mid, Season::Summer) => Profile::MidSummer,
        (LatitudeBand::Mid, Season::Winter) => Profile::MidWinter,
        (LatitudeBand::High, Season::Summer) => Profile::HighSummer,
        (LatitudeBand::High, Season::Winter) => Profile::HighWinter,
    }
}

/// Evaluate a profile quantity for every (latitude, height) pair.
///
/// `lat` and `h` must have the same length, or one of them must have length
/// 1 and is repeated. Every latitude is classified on its own first, and then
/// each element is evaluated with `evaluate` for its own profile only.
pub(crate) fn select_and_evaluate<F>(
    lat: ArrayView1<'_, f64>,
    h: ArrayView1<'_, f64>,
    season: Season,
    evaluate: F,
) -> Result<Array1<f64>, AtmosError>
where
    F: Fn(Profile, f64) -> f64,
{
    let len = broadcast_len(&[lat.len(), h.len()])?;
    let lat = lat.broadcast(len).ok_or(AtmosError::InconsistentInputs)?;
    let h = h.broadcast(len).ok_or(AtmosError::InconsistentInputs)?;
    debug!("selecting {season} profiles for {len} points");

    let profiles: Array1<Profile> = lat.mapv(|lat| classify(lat, season));

    Ok(Zip::from(&profiles)
        .and(h)
        .map_collect(|&profile, &h| evaluate(profile, h)))
}
