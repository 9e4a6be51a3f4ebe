//! Unit-tagged numeric inputs and outputs.
//!
//! Every public function takes its physical inputs as a [`Quantity`]. A bare
//! number (or vector of numbers) is assumed to already be in the unit the
//! function documents. A tagged value is converted if its unit measures the
//! same physical dimension, and rejected otherwise.

use ndarray::{Array1, ArrayView1};

use crate::error::AtmosError;

/// Physical units understood at the public boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Kilometres
    Kilometre,
    /// Metres
    Metre,
    /// Kelvin
    Kelvin,
    /// Degrees Celsius
    Celsius,
    /// Hectopascals (millibars)
    HectoPascal,
    /// Pascals
    Pascal,
    /// Degrees of arc
    Degree,
    /// Radians
    Radian,
    /// Gigahertz
    GigaHertz,
    /// Megahertz
    MegaHertz,
    /// Percent
    Percent,
    /// Grams per cubic metre
    GramPerCubicMetre,
    /// Millimetres per hour
    MillimetrePerHour,
    /// Decibels
    Decibel,
}

/// The physical dimension measured by a [`Unit`]. Conversion is only allowed
/// between units of the same dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Heights, distances, diameters
    Length,
    /// Absolute temperature
    Temperature,
    /// Pressure
    Pressure,
    /// Angles (latitude, longitude, elevation, polarization tilt)
    Angle,
    /// Frequency
    Frequency,
    /// Percentages (probabilities, humidity)
    Fraction,
    /// Mass density of water vapour
    Density,
    /// Rain rate
    RainRate,
    /// Attenuation
    Attenuation,
}

impl Unit {
    /// The dimension this unit measures.
    pub fn dimension(self) -> Dimension {
        match self {
            Unit::Kilometre | Unit::Metre => Dimension::Length,
            Unit::Kelvin | Unit::Celsius => Dimension::Temperature,
            Unit::HectoPascal | Unit::Pascal => Dimension::Pressure,
            Unit::Degree | Unit::Radian => Dimension::Angle,
            Unit::GigaHertz | Unit::MegaHertz => Dimension::Frequency,
            Unit::Percent => Dimension::Fraction,
            Unit::GramPerCubicMetre => Dimension::Density,
            Unit::MillimetrePerHour => Dimension::RainRate,
            Unit::Decibel => Dimension::Attenuation,
        }
    }

    /// Scale and offset that take a value in this unit to the base unit of
    /// its dimension: `base = value * scale + offset`.
    fn to_base(self) -> (f64, f64) {
        match self {
            Unit::Kilometre => (1e3, 0.),
            Unit::Celsius => (1., 273.15),
            Unit::HectoPascal => (1e2, 0.),
            Unit::Radian => (180. / std::f64::consts::PI, 0.),
            Unit::MegaHertz => (1e-3, 0.),
            Unit::Metre
            | Unit::Kelvin
            | Unit::Pascal
            | Unit::Degree
            | Unit::GigaHertz
            | Unit::Percent
            | Unit::GramPerCubicMetre
            | Unit::MillimetrePerHour
            | Unit::Decibel => (1., 0.),
        }
    }

    /// Convert `value` from this unit into `target`. Returns `None` when the
    /// two units measure different dimensions.
    pub fn convert(self, value: f64, target: Unit) -> Option<f64> {
        if self.dimension() != target.dimension() {
            return None;
        }
        if self == target {
            return Some(value);
        }
        let (scale, offset) = self.to_base();
        let (target_scale, target_offset) = target.to_base();
        Some((value * scale + offset - target_offset) / target_scale)
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Unit::Kilometre => "km",
            Unit::Metre => "m",
            Unit::Kelvin => "K",
            Unit::Celsius => "deg_C",
            Unit::HectoPascal => "hPa",
            Unit::Pascal => "Pa",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::GigaHertz => "GHz",
            Unit::MegaHertz => "MHz",
            Unit::Percent => "%",
            Unit::GramPerCubicMetre => "g / m3",
            Unit::MillimetrePerHour => "mm / h",
            Unit::Decibel => "dB",
        };
        f.write_str(symbol)
    }
}

/// One or more numeric values, optionally tagged with a [`Unit`].
///
/// Scalars are stored as length-1 vectors, so the same type flows through
/// scalar and vectorized call sites.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    values: Array1<f64>,
    unit: Option<Unit>,
}

impl Quantity {
    /// Tag raw `values` with `unit`.
    ///
    /// Only bare magnitudes can be tagged. To express an already tagged
    /// quantity in another unit use [`Quantity::to_unit`], which rejects
    /// incompatible units.
    pub fn new(values: impl IntoMagnitudes, unit: Unit) -> Self {
        Self {
            values: values.into_magnitudes(),
            unit: Some(unit),
        }
    }

    /// The unit tag, if any.
    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    /// The raw values, in [`Quantity::unit`].
    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    /// Consume the quantity and return the raw values.
    pub fn into_values(self) -> Array1<f64> {
        self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no values at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The single value of a scalar quantity, or `None` if there isn't
    /// exactly one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self.values.len() {
            1 => Some(self.values[0]),
            _ => None,
        }
    }

    /// Convert to `target`, keeping the tag. An untagged quantity is assumed
    /// to already be in `target`.
    pub fn to_unit(&self, target: Unit) -> Result<Quantity, AtmosError> {
        Ok(Quantity {
            values: self.magnitudes(target, "value")?,
            unit: Some(target),
        })
    }

    /// Magnitudes expressed in `expected`. `name` identifies the input in the
    /// error raised for an incompatible tag.
    pub(crate) fn magnitudes(
        &self,
        expected: Unit,
        name: &'static str,
    ) -> Result<Array1<f64>, AtmosError> {
        match self.unit {
            None => Ok(self.values.clone()),
            Some(unit) if unit == expected => Ok(self.values.clone()),
            Some(unit) => {
                if unit.dimension() != expected.dimension() {
                    return Err(AtmosError::UnitMismatch {
                        name,
                        expected,
                        found: unit,
                    });
                }
                Ok(self
                    .values
                    .mapv(|v| unit.convert(v, expected).unwrap_or(f64::NAN)))
            }
        }
    }
}

/// Bare numbers that can be tagged with a [`Unit`].
///
/// Not implemented for [`Quantity`], so a tag can never be silently replaced.
pub trait IntoMagnitudes {
    /// The numbers as a vector.
    fn into_magnitudes(self) -> Array1<f64>;
}

impl IntoMagnitudes for f64 {
    fn into_magnitudes(self) -> Array1<f64> {
        Array1::from_elem(1, self)
    }
}

impl IntoMagnitudes for Vec<f64> {
    fn into_magnitudes(self) -> Array1<f64> {
        Array1::from(self)
    }
}

impl IntoMagnitudes for &[f64] {
    fn into_magnitudes(self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }
}

impl<const N: usize> IntoMagnitudes for [f64; N] {
    fn into_magnitudes(self) -> Array1<f64> {
        Array1::from(self.to_vec())
    }
}

impl IntoMagnitudes for Array1<f64> {
    fn into_magnitudes(self) -> Array1<f64> {
        self
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self {
            values: value.into_magnitudes(),
            unit: None,
        }
    }
}

impl From<Vec<f64>> for Quantity {
    fn from(values: Vec<f64>) -> Self {
        Self {
            values: values.into_magnitudes(),
            unit: None,
        }
    }
}

impl From<&[f64]> for Quantity {
    fn from(values: &[f64]) -> Self {
        Self {
            values: values.into_magnitudes(),
            unit: None,
        }
    }
}

impl<const N: usize> From<[f64; N]> for Quantity {
    fn from(values: [f64; N]) -> Self {
        Self {
            values: values.into_magnitudes(),
            unit: None,
        }
    }
}

impl From<Array1<f64>> for Quantity {
    fn from(values: Array1<f64>) -> Self {
        Self { values, unit: None }
    }
}

/// Length every input broadcasts to: each length must either match the
/// longest one or be 1. An empty input makes the whole batch empty.
pub(crate) fn broadcast_len(lens: &[usize]) -> Result<usize, AtmosError> {
    let len = if lens.contains(&0) {
        0
    } else {
        lens.iter().copied().max().unwrap_or(0)
    };
    if lens.iter().all(|&l| l == len || l == 1) {
        Ok(len)
    } else {
        Err(AtmosError::InconsistentInputs)
    }
}

/// View `values` as `len` elements, repeating a single value as needed.
pub(crate) fn broadcast(values: &Array1<f64>, len: usize) -> Result<ArrayView1<'_, f64>, AtmosError> {
    values.broadcast(len).ok_or(AtmosError::InconsistentInputs)
}
