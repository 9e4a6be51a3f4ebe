//! Latitude and season dependent reference atmospheres.
//!
//! Each profile is defined from 0 to 100 km. Temperature is a chain of
//! polynomial, linear and exponential segments; pressure is a quadratic up to
//! 10 km and then two exponential decays anchored on the standard atmosphere
//! at 10 km and 72 km; water vapour decays exponentially up to a cutoff height
//! and is zero above it.

#![allow(clippy::excessive_precision)]

use std::sync::OnceLock;

use super::standard;

/// Top of every profile, in km.
pub(crate) const TOP_HEIGHT: f64 = 100.;

/// One of the reference atmosphere profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Low latitudes (|lat| < 22°), identical in both seasons
    Low,
    /// Mid latitudes (22° ≤ |lat| < 45°), summer
    MidSummer,
    /// Mid latitudes, winter
    MidWinter,
    /// High latitudes (|lat| ≥ 45°), summer
    HighSummer,
    /// High latitudes, winter
    HighWinter,
}

/// Coefficients of a pressure profile.
struct PressureCoefficients {
    /// Constant, linear and quadratic terms of the 0-10 km polynomial
    surface: [f64; 3],
    /// Decay rate (1/km) between 10 km and 72 km
    lower_decay: f64,
    /// Decay rate (1/km) between 72 km and 100 km
    upper_decay: f64,
}

/// Coefficients of a water-vapour density profile.
struct WaterVapourCoefficients {
    /// Density at the surface in g/m³
    surface: f64,
    /// Coefficients of h, h², h³ and h⁴ in the exponent
    exponent: [f64; 4],
    /// Height above which there is no water vapour, in km
    cutoff: f64,
}

/// Standard atmosphere pressures at the two anchor heights.
struct Anchors {
    p10: f64,
    p72: f64,
}

fn anchors() -> &'static Anchors {
    static ANCHORS: OnceLock<Anchors> = OnceLock::new();
    ANCHORS.get_or_init(|| Anchors {
        p10: standard::pressure(
            10.,
            super::STANDARD_SURFACE_TEMPERATURE,
            super::STANDARD_SURFACE_PRESSURE,
        ),
        p72: standard::pressure(
            72.,
            super::STANDARD_SURFACE_TEMPERATURE,
            super::STANDARD_SURFACE_PRESSURE,
        ),
    })
}

impl Profile {
    /// All profiles.
    pub const ALL: [Profile; 5] = [
        Profile::Low,
        Profile::MidSummer,
        Profile::MidWinter,
        Profile::HighSummer,
        Profile::HighWinter,
    ];

    /// Temperature in K at height `h` in km.
    pub fn temperature(self, h: f64) -> f64 {
        if !(0.0..=TOP_HEIGHT).contains(&h) {
            return f64::NAN;
        }
        match self {
            Profile::Low => match h {
                h if h < 17. => 300.4222 - 6.3533 * h + 0.005886 * h.powi(2),
                h if h < 47. => 194. + (h - 17.) * 2.533,
                h if h < 52. => 270.,
                h if h < 80. => 270. - (h - 52.) * 3.0714,
                _ => 184.,
            },
            Profile::MidSummer => match h {
                h if h < 10. => 286.8374 - 4.7805 * h - 0.1402 * h.powi(2),
                h if h < 23. => 225.,
                h if h < 48. => 225. * f64::exp((h - 23.) * 0.008317),
                h if h < 53. => 277.,
                h if h < 79. => 277. - (h - 53.) * 4.0769,
                _ => 171.,
            },
            Profile::MidWinter => match h {
                h if h < 8.5 => {
                    257.4345 + 2.3474 * h - 1.5479 * h.powi(2) + 0.08473 * h.powi(3)
                }
                h if h < 30. => 217.5,
                h if h < 50. => 217.5 + (h - 30.) * 2.125,
                h if h < 54. => 260.,
                _ => 260. - (h - 54.) * 1.667,
            },
            Profile::HighSummer => match h {
                h if h < 13. => 294.9838 - 5.2159 * h - 0.07109 * h.powi(2),
                h if h < 17. => 215.,
                h if h < 47. => 215. * f64::exp((h - 17.) * 0.008128),
                h if h < 53. => 275.,
                h if h < 80. => 275. + 20. * (1. - f64::exp((h - 53.) * 0.06)),
                _ => 175.,
            },
            Profile::HighWinter => match h {
                h if h < 10. => 272.7241 - 3.6217 * h - 0.1759 * h.powi(2),
                h if h < 33. => 218.,
                h if h < 47. => 218. + (h - 33.) * 3.3571,
                h if h < 53. => 265.,
                h if h < 80. => 265. - (h - 53.) * 2.0370,
                _ => 210.,
            },
        }
    }

    fn pressure_coefficients(self) -> PressureCoefficients {
        let (surface, lower_decay, upper_decay) = match self {
            Profile::Low => ([1012.0306, -109.0338, 3.6316], 0.147, 0.165),
            Profile::MidSummer => ([1008.0278, -113.2494, 3.9408], 0.140, 0.165),
            Profile::MidWinter => ([1010.8828, -122.2411, 4.554], 0.147, 0.150),
            Profile::HighSummer => ([1012.8186, -111.5569, 3.8646], 0.147, 0.165),
            Profile::HighWinter => ([1018.8627, -124.2954, 4.8307], 0.147, 0.155),
        };
        PressureCoefficients {
            surface,
            lower_decay,
            upper_decay,
        }
    }

    /// Pressure in hPa at height `h` in km.
    pub fn pressure(self, h: f64) -> f64 {
        if !(0.0..=TOP_HEIGHT).contains(&h) {
            return f64::NAN;
        }
        let PressureCoefficients {
            surface: [c0, c1, c2],
            lower_decay,
            upper_decay,
        } = self.pressure_coefficients();

        if h <= 10. {
            c0 + c1 * h + c2 * h.powi(2)
        } else if h <= 72. {
            anchors().p10 * f64::exp(-lower_decay * (h - 10.))
        } else {
            anchors().p72 * f64::exp(-upper_decay * (h - 72.))
        }
    }

    fn water_vapour_coefficients(self) -> WaterVapourCoefficients {
        let (surface, exponent, cutoff) = match self {
            Profile::Low => (19.6542, [-0.2313, -0.1122, 0.01351, -0.0005923], 15.),
            Profile::MidSummer => (8.988, [-0.3614, -0.005402, -0.001955, 0.], 15.),
            Profile::MidWinter => (1.2319, [0.07481, -0.0981, 0.00281, 0.], 10.),
            Profile::HighSummer => (14.3542, [-0.4174, -0.02290, 0.001007, 0.], 15.),
            Profile::HighWinter => (3.4742, [-0.2697, -0.03604, 0.0004489, 0.], 10.),
        };
        WaterVapourCoefficients {
            surface,
            exponent,
            cutoff,
        }
    }

    /// Height in km above which the profile holds no water vapour.
    pub fn water_vapour_cutoff(self) -> f64 {
        self.water_vapour_coefficients().cutoff
    }

    /// Water-vapour density in g/m³ at height `h` in km.
    pub fn water_vapour_density(self, h: f64) -> f64 {
        if !(0.0..=TOP_HEIGHT).contains(&h) {
            return f64::NAN;
        }
        let WaterVapourCoefficients {
            surface,
            exponent: [a1, a2, a3, a4],
            cutoff,
        } = self.water_vapour_coefficients();

        if h <= cutoff {
            surface * f64::exp(a1 * h + a2 * h.powi(2) + a3 * h.powi(3) + a4 * h.powi(4))
        } else {
            0.
        }
    }
}
