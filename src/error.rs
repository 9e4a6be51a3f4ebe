use crate::units::Unit;

/// Possible atmosphere model errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AtmosError {
    /// The requested recommendation version isn't implemented
    UnsupportedVersion(u32),
    /// An input was tagged with a unit of the wrong physical dimension
    UnitMismatch {
        /// Name of the offending input
        name: &'static str,
        /// Unit the input is expected in
        expected: Unit,
        /// Unit the input was tagged with
        found: Unit,
    },
    /// The inputs can't be broadcast to a common shape
    InconsistentInputs,
    /// The season name isn't one of "summer" or "winter"
    UnknownSeason(String),
    /// The worker thread pool couldn't be created
    ThreadPool(String),
}

impl std::fmt::Display for AtmosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtmosError::UnsupportedVersion(version) => {
                write!(
                    f,
                    "version {version} is not implemented for the ITU-R P.835 model"
                )
            }
            AtmosError::UnitMismatch {
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{name} must be given in units of {expected} (or a compatible unit), got {found}"
                )
            }
            AtmosError::InconsistentInputs => {
                write!(f, "inputs have incompatible lengths")
            }
            AtmosError::UnknownSeason(season) => {
                write!(f, "unknown season '{season}', expected 'summer' or 'winter'")
            }
            AtmosError::ThreadPool(reason) => write!(f, "couldn't build thread pool: {reason}"),
        }
    }
}

impl std::error::Error for AtmosError {}
