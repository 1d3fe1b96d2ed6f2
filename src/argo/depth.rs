use serde::{Deserialize, Serialize};

/// Strategy used to derive depth (m) from sea pressure (dbar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthMethod {
    /// UNESCO 1983 (Fofonoff & Millard) with latitude-dependent gravity
    #[default]
    Unesco1983,
    /// 1 dbar = 1 m; a documented simplification that ignores gravity and compressibility
    Linear,
}

impl DepthMethod {
    /// Name written to quality reports
    pub fn name(self) -> &'static str {
        match self {
            DepthMethod::Unesco1983 => "unesco1983",
            DepthMethod::Linear => "linear",
        }
    }

    /// One-line description for processing notes
    pub fn description(self) -> &'static str {
        match self {
            DepthMethod::Unesco1983 => {
                "depth from pressure via UNESCO 1983 (Fofonoff & Millard) with latitude-dependent gravity"
            }
            DepthMethod::Linear => {
                "depth approximated as pressure (1 dbar = 1 m); simplified, not for scientific acceptance"
            }
        }
    }

    /// Depth in metres, never negative
    pub fn depth(self, pressure_dbar: f64, latitude_deg: f64) -> f64 {
        let depth = match self {
            DepthMethod::Unesco1983 => unesco_depth(pressure_dbar, latitude_deg),
            DepthMethod::Linear => pressure_dbar,
        };
        depth.max(0.0)
    }
}

/// UNESCO Technical Papers in Marine Science 44 (1983), `DEPTH` algorithm
fn unesco_depth(p: f64, latitude_deg: f64) -> f64 {
    let x = (latitude_deg / 57.29578).sin().powi(2);
    let gravity = 9.780318 * (1.0 + (5.2788e-3 + 2.36e-5 * x) * x) + 1.092e-6 * p;
    ((((-1.82e-15 * p + 2.279e-10) * p - 2.2512e-5) * p + 9.72659) * p) / gravity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unesco_check_value() {
        // Check value from the UNESCO paper: 10000 dbar at 30 deg -> 9712.653 m
        let depth = DepthMethod::Unesco1983.depth(10_000.0, 30.0);
        assert!((depth - 9712.653).abs() < 1e-3, "got {depth}");
    }

    #[test]
    fn test_gravity_varies_with_latitude() {
        let equator = DepthMethod::Unesco1983.depth(1000.0, 0.0);
        let pole = DepthMethod::Unesco1983.depth(1000.0, 90.0);
        assert!(equator > pole);
    }

    #[test]
    fn test_linear_and_clamping() {
        assert_eq!(DepthMethod::Linear.depth(10.0, 45.0), 10.0);
        assert_eq!(DepthMethod::Linear.depth(-0.4, 45.0), 0.0);
        assert_eq!(DepthMethod::Unesco1983.depth(-1.0, 45.0), 0.0);
    }
}
