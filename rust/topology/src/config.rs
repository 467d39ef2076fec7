// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builder configuration, optionally loaded from environment variables.

use crate::boolean::BoolOptions;
use crate::error::{Error, Result};

/// Options for one sketch builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderOptions {
    /// Snapping distance shared by point encoding and the boolean engine.
    pub tolerance: f64,
    /// Drop zero-area slivers from the boolean result.
    pub clean: bool,
    /// Recentre coordinates before the boolean step.
    pub scale_fix: bool,
    /// Polyline segments per full turn when arcs are tessellated.
    pub arc_segments: usize,
}

impl BuilderOptions {
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;
    pub const DEFAULT_ARC_SEGMENTS: usize = 128;

    /// Load options from `SKETCH_TOLERANCE`, `SKETCH_CLEAN`,
    /// `SKETCH_SCALE_FIX` and `SKETCH_ARC_SEGMENTS`. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            tolerance: lookup("SKETCH_TOLERANCE")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.tolerance),
            clean: lookup("SKETCH_CLEAN")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.clean),
            scale_fix: lookup("SKETCH_SCALE_FIX")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.scale_fix),
            arc_segments: lookup("SKETCH_ARC_SEGMENTS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.arc_segments),
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn with_scale_fix(mut self, scale_fix: bool) -> Self {
        self.scale_fix = scale_fix;
        self
    }

    pub fn with_arc_segments(mut self, arc_segments: usize) -> Self {
        self.arc_segments = arc_segments;
        self
    }

    /// Rejects a non-finite or non-positive tolerance.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }

    /// The flags forwarded verbatim to the boolean engine.
    pub fn bool_options(&self) -> BoolOptions {
        BoolOptions {
            clean: self.clean,
            scale_fix: self.scale_fix,
            arc_segments: self.arc_segments.max(4),
        }
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            clean: true,
            scale_fix: false,
            arc_segments: Self::DEFAULT_ARC_SEGMENTS,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
