use std::error;
use std::fmt;

use crate::t1::Cblksty;

/// Errors a Tier-1 encode or decode entry point can report.
#[derive(Debug)]
pub enum T1Error {
    InvalidDimensions {
        width: usize,
        height: usize,
    },
    InconsistentCblksty {
        bits: u8,
    },
    Truncated {
        expected_passes: usize,
        available_passes: usize,
    },
}

impl error::Error for T1Error {}

impl fmt::Display for T1Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(
                    f,
                    "code-block dimensions must be nonzero and at most 4096x4096, got {}x{}",
                    width, height
                )
            }
            Self::InconsistentCblksty { bits } => {
                write!(f, "inconsistent code-block style flags 0x{:02X}", bits)
            }
            Self::Truncated {
                expected_passes,
                available_passes,
            } => {
                write!(
                    f,
                    "bitstream truncated: {} passes requested, only {} available",
                    expected_passes, available_passes
                )
            }
        }
    }
}

/// Pterm (predictable termination) only makes sense when every pass is
/// already individually terminated; catch the nonsensical combination
/// up front instead of silently treating Pterm as a no-op.
pub(crate) fn validate_cblksty(style: Cblksty) -> Result<(), T1Error> {
    if style.contains(Cblksty::PTERM) && !style.contains(Cblksty::TERM_ALL) {
        return Err(T1Error::InconsistentCblksty { bits: style.bits() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pterm_without_term_all_is_rejected() {
        let style = Cblksty::new(Cblksty::PTERM);
        assert!(validate_cblksty(style).is_err());
    }

    #[test]
    fn pterm_with_term_all_is_accepted() {
        let style = Cblksty::new(Cblksty::PTERM | Cblksty::TERM_ALL);
        assert!(validate_cblksty(style).is_ok());
    }

    #[test]
    fn default_style_is_accepted() {
        assert!(validate_cblksty(Cblksty::default()).is_ok());
    }
}
