//! Interpolation curves
//!
//! Each curve maps the normalized elapsed fraction of a run (0.0 to 1.0)
//! to normalized progress, which is then fed to [`lerp`].

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Curve applied to the elapsed fraction of a run
#[derive(Clone, Copy, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    /// `t` (identity)
    #[default]
    LinearDrive,
    /// `1 - t`
    LinearDecay,
    /// `e^(-2πt)`
    ExpDrive,
    /// `1 - e^(-2πt)`
    ExpDecay,
    /// Caller-supplied curve
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl Easing {
    /// Apply the curve to an elapsed fraction
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::LinearDrive => t,
            Easing::LinearDecay => 1.0 - t,
            Easing::ExpDrive => (-2.0 * PI * t).exp(),
            Easing::ExpDecay => 1.0 - (-2.0 * PI * t).exp(),
            Easing::Custom(f) => f(t),
        }
    }

    /// Name used in configuration files and logs
    pub fn name(&self) -> &'static str {
        match self {
            Easing::LinearDrive => "linear-drive",
            Easing::LinearDecay => "linear-decay",
            Easing::ExpDrive => "exp-drive",
            Easing::ExpDecay => "exp-decay",
            Easing::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Easing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear-drive" => Ok(Easing::LinearDrive),
            "linear-decay" => Ok(Easing::LinearDecay),
            "exp-drive" => Ok(Easing::ExpDrive),
            "exp-decay" => Ok(Easing::ExpDecay),
            other => Err(format!(
                "unknown easing '{}' (expected linear-drive, linear-decay, exp-drive or exp-decay)",
                other
            )),
        }
    }
}

/// Linear interpolation between `a` and `b` by factor `t`
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_curves() {
        assert!(approx(Easing::LinearDrive.apply(0.25), 0.25));
        assert!(approx(Easing::LinearDecay.apply(0.25), 0.75));
        assert!(approx(Easing::default().apply(0.6), 0.6));
    }

    #[test]
    fn test_exponential_curves() {
        assert!(approx(Easing::ExpDrive.apply(0.0), 1.0));
        assert!(approx(Easing::ExpDecay.apply(0.0), 0.0));

        // Drive and decay are complements of each other
        for t in [0.1, 0.5, 0.9] {
            let sum = Easing::ExpDrive.apply(t) + Easing::ExpDecay.apply(t);
            assert!(approx(sum, 1.0));
        }

        // Nearly settled by the end of the run
        assert!(Easing::ExpDecay.apply(1.0) > 0.99);
    }

    #[test]
    fn test_custom_curve() {
        let square = Easing::Custom(|t| t * t);
        assert!(approx(square.apply(0.5), 0.25));
        assert_eq!(square.name(), "custom");
    }

    #[test]
    fn test_lerp() {
        assert!(approx(lerp(10.0, 0.0, 0.5), 5.0));
        assert!(approx(lerp(-2.0, 2.0, 0.0), -2.0));
        assert!(approx(lerp(-2.0, 2.0, 1.0), 2.0));
    }

    #[test]
    fn test_parse_names() {
        for name in ["linear-drive", "linear-decay", "exp-drive", "exp-decay"] {
            let easing: Easing = name.parse().unwrap();
            assert_eq!(easing.name(), name);
        }
        assert!("bounce".parse::<Easing>().is_err());
    }
}
