use serde::{Deserialize, Serialize};
use std::fmt;
use visioncortex::PathSimplifyMode;
use vtracer::{ColorMode, Config, Hierarchical};

/// Named quality presets, ordered from highest fidelity to fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    #[default]
    Maximum,
    High,
    Medium,
    Fast,
}

impl QualityMode {
    /// Mode names accepted on the command line.
    pub const NAMES: [&'static str; 4] = ["maximum", "high", "medium", "fast"];

    pub const ALL: [QualityMode; 4] = [Self::Maximum, Self::High, Self::Medium, Self::Fast];

    /// Resolve a mode by name. Unrecognized names fall back to `Maximum`
    /// instead of failing.
    pub fn from_name(name: &str) -> Self {
        match name {
            "high" => Self::High,
            "medium" => Self::Medium,
            "fast" => Self::Fast,
            _ => Self::Maximum,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Maximum => "maximum",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }

    pub fn profile(&self) -> QualityProfile {
        match self {
            Self::Maximum => QualityProfile {
                filter_speckle: 0,
                color_precision: 8,
                layer_difference: 1,
                corner_threshold: 30,
                length_threshold: 1.0,
                max_iterations: 20,
                splice_threshold: 30,
                path_precision: 6,
                curve_mode: CurveMode::Spline,
            },
            Self::High => QualityProfile {
                filter_speckle: 1,
                color_precision: 7,
                layer_difference: 5,
                corner_threshold: 45,
                length_threshold: 2.0,
                max_iterations: 15,
                splice_threshold: 40,
                path_precision: 5,
                curve_mode: CurveMode::Spline,
            },
            Self::Medium => QualityProfile {
                filter_speckle: 2,
                color_precision: 6,
                layer_difference: 10,
                corner_threshold: 60,
                length_threshold: 3.5,
                max_iterations: 10,
                splice_threshold: 45,
                path_precision: 4,
                curve_mode: CurveMode::Spline,
            },
            Self::Fast => QualityProfile {
                filter_speckle: 4,
                color_precision: 5,
                layer_difference: 20,
                corner_threshold: 90,
                length_threshold: 5.0,
                max_iterations: 5,
                splice_threshold: 60,
                path_precision: 3,
                curve_mode: CurveMode::Polygon,
            },
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Edge fitting used by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveMode {
    /// Straight polygon edges only
    Polygon,
    /// Curved spline edges
    Spline,
}

impl From<CurveMode> for PathSimplifyMode {
    fn from(mode: CurveMode) -> Self {
        match mode {
            CurveMode::Polygon => PathSimplifyMode::Polygon,
            CurveMode::Spline => PathSimplifyMode::Spline,
        }
    }
}

/// Tracing parameters for one quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Discard patches smaller than this many pixels per side
    pub filter_speckle: usize,
    /// Significant bits per RGB channel (1-8)
    pub color_precision: i32,
    /// Color difference between gradient layers
    pub layer_difference: i32,
    /// Minimum angle (degrees) to be considered a corner
    pub corner_threshold: i32,
    /// Minimum segment length for curve subdivision
    pub length_threshold: f64,
    pub max_iterations: usize,
    /// Minimum angle displacement (degrees) to splice a spline
    pub splice_threshold: i32,
    /// Decimal places kept in path coordinates
    pub path_precision: u32,
    pub curve_mode: CurveMode,
}

impl QualityProfile {
    /// Look up the profile for a mode name, falling back to `maximum`.
    pub fn for_mode(name: &str) -> Self {
        QualityMode::from_name(name).profile()
    }

    /// Build the tracer configuration: full color, stacked layering, plus
    /// this profile's parameters.
    pub fn to_tracer_config(&self) -> Config {
        Config {
            color_mode: ColorMode::Color,
            hierarchical: Hierarchical::Stacked,
            mode: self.curve_mode.into(),
            filter_speckle: self.filter_speckle,
            color_precision: self.color_precision,
            layer_difference: self.layer_difference,
            corner_threshold: self.corner_threshold,
            length_threshold: self.length_threshold,
            max_iterations: self.max_iterations,
            splice_threshold: self.splice_threshold,
            path_precision: Some(self.path_precision),
        }
    }
}

impl Default for QualityProfile {
    fn default() -> Self {
        QualityMode::default().profile()
    }
}
