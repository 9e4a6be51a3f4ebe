//! Mean annual global reference atmosphere.
//!
//! Based on the United States Standard Atmosphere, 1976: seven successive
//! layers, each with a linear temperature lapse rate. Heights are in km.

use smallvec::SmallVec;

/// Number of layers with a defined lapse rate.
pub(crate) const NUM_LAYERS: usize = 7;

/// Layer base heights in km, followed by the top of the last layer.
pub(crate) const BOUNDARIES: [f64; NUM_LAYERS + 1] = [0., 11., 20., 32., 47., 51., 71., 85.];

/// Temperature lapse rate of each layer in K/km.
pub(crate) const LAPSE_RATES: [f64; NUM_LAYERS] = [-6.5, 0., 1., 2.8, 0., -2.8, -2.];

/// Temperature at each boundary relative to the surface temperature, in K.
/// Each entry accumulates the lapse rates of the layers below it.
pub(crate) const TEMPERATURE_OFFSETS: [f64; NUM_LAYERS + 1] =
    [0., -71.5, -71.5, -59.5, -17.5, -17.5, -73.5, -101.5];

/// g/R for dry air, used by the power-law (non-isothermal) layers.
const POWER_LAW_COEFFICIENT: f64 = 34.163;

/// g/R for dry air, used by the exponential (isothermal) layers.
const EXPONENTIAL_COEFFICIENT: f64 = 34.162;

/// Standard atmosphere temperature in K at height `h` (km) for a surface
/// temperature `t0` (K).
///
/// Linear between boundaries, and held at the 85 km value above that.
/// Negative heights are undefined.
pub(crate) fn temperature(h: f64, t0: f64) -> f64 {
    if h.is_nan() || h < 0. {
        return f64::NAN;
    }

    let layer = BOUNDARIES.partition_point(|&b| b <= h);
    if layer > NUM_LAYERS {
        return t0 + TEMPERATURE_OFFSETS[NUM_LAYERS];
    }
    let base = layer - 1;
    let fraction = (h - BOUNDARIES[base]) / (BOUNDARIES[layer] - BOUNDARIES[base]);
    t0 + TEMPERATURE_OFFSETS[base]
        + fraction * (TEMPERATURE_OFFSETS[layer] - TEMPERATURE_OFFSETS[base])
}

/// Pressure at the bottom of each layer walked to reach height `h`, with the
/// pressure at `h` itself as the last element.
///
/// The walk starts from `p0` at the surface. Every layer up to the one
/// containing `h` is traversed in order, since a layer's entry pressure is the
/// exit pressure of the one below. Above 85 km the last layer is extended.
pub(crate) fn layer_pressures(h: f64, t0: f64, p0: f64) -> SmallVec<[f64; NUM_LAYERS + 1]> {
    let num_layers = BOUNDARIES.partition_point(|&b| b < h).min(NUM_LAYERS);

    let mut pressures = SmallVec::new();
    pressures.push(p0);
    for layer in 0..num_layers {
        let top = if layer == num_layers - 1 {
            h
        } else {
            BOUNDARIES[layer + 1]
        };
        let thickness = top - BOUNDARIES[layer];
        let base_temperature = t0 + TEMPERATURE_OFFSETS[layer];
        let lapse_rate = LAPSE_RATES[layer];
        let entry = pressures[layer];

        let exit = if lapse_rate != 0. {
            entry
                * (base_temperature / (base_temperature + lapse_rate * thickness))
                    .powf(POWER_LAW_COEFFICIENT / lapse_rate)
        } else {
            entry * f64::exp(-EXPONENTIAL_COEFFICIENT * thickness / base_temperature)
        };
        pressures.push(exit);
    }
    pressures
}

/// Standard atmosphere pressure in hPa at height `h` (km), for a surface
/// temperature `t0` (K) and surface pressure `p0` (hPa).
pub(crate) fn pressure(h: f64, t0: f64, p0: f64) -> f64 {
    if !h.is_finite() || h < 0. {
        return f64::NAN;
    }
    layer_pressures(h, t0, p0)
        .last()
        .copied()
        .unwrap_or(f64::NAN)
}

/// Standard water-vapour density in g/m³ at height `h` (km), for a scale
/// height `h0` (km) and surface density `rho0` (g/m³).
pub(crate) fn water_vapour_density(h: f64, h0: f64, rho0: f64) -> f64 {
    if h.is_nan() || h < 0. {
        return f64::NAN;
    }
    rho0 * f64::exp(-h / h0)
}

/// Standard water-vapour pressure in hPa at height `h` (km).
///
/// Converted from the density at that height using the standard temperature
/// for the default surface temperature.
pub(crate) fn water_vapour_pressure(h: f64, h0: f64, rho0: f64) -> f64 {
    water_vapour_density(h, h0, rho0) * temperature(h, super::STANDARD_SURFACE_TEMPERATURE)
        / 216.7
}
