//! Parameters for centerline extraction.

use std::f64::consts::FRAC_PI_6;

use crate::error::{CenterlineError, CenterlineResult};

/// Parameters controlling accumulation, tracking and relaxation.
///
/// All lengths are in voxel units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct CenterlineParams {
    /// Length of the ray cast from every face into the volume. Also sets the
    /// tracking patch size (`2 · acc_radius`). Default: 10
    pub acc_radius: f64,
    /// Distance between consecutive tracked points. Default: 5
    pub track_step: f64,
    /// Minimum norm of a scan-direction cross product before it contributes
    /// to the direction field. Default: 0.1
    pub area_epsilon: f64,
    /// Relaxation stops once the drop in total squared radial error is no
    /// larger than this. Default: 1e-6
    pub relaxation_epsilon: f64,
    /// Maximum `|cos|` between a point-to-face vector and the local
    /// direction for the face to count as part of the cross-section.
    /// Default: 0.1
    pub section_tolerance: f64,
    /// Cross-section search radius as a multiple of `acc_radius`.
    /// Default: 1.5
    pub section_radius_factor: f64,
    /// Faces whose normal deviates from the radial vector by more than this
    /// angle (radians) exert no force. Default: π/6 (30 degrees)
    pub face_angle_limit: f64,
    /// Distance of the probe point used to orient face normals inward.
    /// Default: 20
    pub probe_distance: f64,
    /// Flip every face's scan direction before the probe test. Default: false
    pub invert_normals: bool,
    /// Voxels of padding around the mesh bounds. Default: 1
    pub domain_padding: f64,
    /// Maximum number of voxels before error (memory safety).
    /// Default: 50,000,000
    pub max_voxels: usize,
    /// Safety ceiling on relaxation iterations. Default: 10,000
    pub max_relaxation_iterations: usize,
    /// Safety ceiling on points tracked per direction. Default: 10,000
    pub max_track_steps: usize,
}

impl Default for CenterlineParams {
    fn default() -> Self {
        Self {
            acc_radius: 10.0,
            track_step: 5.0,
            area_epsilon: 0.1,
            relaxation_epsilon: 1e-6,
            section_tolerance: 0.1,
            section_radius_factor: 1.5,
            face_angle_limit: FRAC_PI_6,
            probe_distance: 20.0,
            invert_normals: false,
            domain_padding: 1.0,
            max_voxels: 50_000_000,
            max_relaxation_iterations: 10_000,
            max_track_steps: 10_000,
        }
    }
}

impl CenterlineParams {
    /// Params for thin vessels: short rays and small tracking steps.
    pub fn fine() -> Self {
        Self {
            acc_radius: 6.0,
            track_step: 3.0,
            probe_distance: 12.0,
            relaxation_epsilon: 1e-8,
            ..Default::default()
        }
    }

    /// Params for wide vessels: long rays and large tracking steps.
    pub fn coarse() -> Self {
        Self {
            acc_radius: 20.0,
            track_step: 10.0,
            probe_distance: 40.0,
            relaxation_epsilon: 1e-4,
            ..Default::default()
        }
    }

    /// Set the scan radius.
    pub fn with_acc_radius(mut self, acc_radius: f64) -> Self {
        self.acc_radius = acc_radius;
        self
    }

    /// Set the tracking step.
    pub fn with_track_step(mut self, track_step: f64) -> Self {
        self.track_step = track_step;
        self
    }

    /// Set the direction-field contribution threshold.
    pub fn with_area_epsilon(mut self, area_epsilon: f64) -> Self {
        self.area_epsilon = area_epsilon;
        self
    }

    /// Set the relaxation convergence threshold.
    pub fn with_relaxation_epsilon(mut self, epsilon: f64) -> Self {
        self.relaxation_epsilon = epsilon;
        self
    }

    /// Set the probe distance used to orient normals.
    pub fn with_probe_distance(mut self, probe_distance: f64) -> Self {
        self.probe_distance = probe_distance;
        self
    }

    /// Flip every face's scan direction.
    pub fn with_invert_normals(mut self, invert: bool) -> Self {
        self.invert_normals = invert;
        self
    }

    /// Set the voxel padding around the mesh.
    pub fn with_domain_padding(mut self, padding: f64) -> Self {
        self.domain_padding = padding;
        self
    }

    /// Set the voxel limit.
    pub fn with_max_voxels(mut self, max_voxels: usize) -> Self {
        self.max_voxels = max_voxels;
        self
    }

    /// Set the relaxation iteration ceiling.
    pub fn with_max_relaxation_iterations(mut self, iterations: usize) -> Self {
        self.max_relaxation_iterations = iterations;
        self
    }

    /// Set the per-direction tracking ceiling.
    pub fn with_max_track_steps(mut self, steps: usize) -> Self {
        self.max_track_steps = steps;
        self
    }

    /// Side of the square tracking patch, in voxels.
    #[inline]
    pub fn patch_size(&self) -> usize {
        (2.0 * self.acc_radius).round() as usize
    }

    /// Radius of the cross-section face search.
    #[inline]
    pub fn section_radius(&self) -> f64 {
        self.section_radius_factor * self.acc_radius
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> CenterlineResult<()> {
        positive("acc_radius", self.acc_radius)?;
        positive("track_step", self.track_step)?;
        positive("probe_distance", self.probe_distance)?;
        positive("section_radius_factor", self.section_radius_factor)?;
        non_negative("area_epsilon", self.area_epsilon)?;
        non_negative("relaxation_epsilon", self.relaxation_epsilon)?;
        non_negative("domain_padding", self.domain_padding)?;

        if !(self.section_tolerance > 0.0 && self.section_tolerance <= 1.0) {
            return Err(CenterlineError::invalid_param(
                "section_tolerance",
                self.section_tolerance.to_string(),
                "must be in (0, 1]",
            ));
        }
        if !(self.face_angle_limit > 0.0 && self.face_angle_limit <= std::f64::consts::FRAC_PI_2) {
            return Err(CenterlineError::invalid_param(
                "face_angle_limit",
                self.face_angle_limit.to_string(),
                "must be in (0, π/2]",
            ));
        }
        for (name, value) in [
            ("max_voxels", self.max_voxels),
            ("max_relaxation_iterations", self.max_relaxation_iterations),
            ("max_track_steps", self.max_track_steps),
        ] {
            if value == 0 {
                return Err(CenterlineError::invalid_param(name, "0", "must be at least 1"));
            }
        }
        Ok(())
    }

    /// Load params from a TOML string. Missing keys take default values.
    #[cfg(feature = "config")]
    pub fn from_toml(toml_str: &str) -> Result<Self, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::from_toml(toml_str)
    }

    /// Load params from a TOML file. Missing keys take default values.
    #[cfg(feature = "config")]
    pub fn from_toml_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::from_toml_file(path)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml(&self) -> Result<String, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::to_toml(self)
    }
}

fn positive(name: &str, value: f64) -> CenterlineResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CenterlineError::invalid_param(
            name,
            value.to_string(),
            "must be a positive number",
        ))
    }
}

fn non_negative(name: &str, value: f64) -> CenterlineResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CenterlineError::invalid_param(
            name,
            value.to_string(),
            "must be a non-negative number",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = CenterlineParams::default();
        assert_eq!(p.acc_radius, 10.0);
        assert_eq!(p.track_step, 5.0);
        assert_eq!(p.patch_size(), 20);
        assert!((p.section_radius() - 15.0).abs() < 1e-12);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(CenterlineParams::fine().validate().is_ok());
        assert!(CenterlineParams::coarse().validate().is_ok());
        assert!(CenterlineParams::fine().acc_radius < CenterlineParams::coarse().acc_radius);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = CenterlineParams::default()
            .with_track_step(0.0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            CenterlineError::InvalidParams { ref param_name, .. } if param_name.as_deref() == Some("track_step")
        ));

        assert!(CenterlineParams::default().with_acc_radius(f64::NAN).validate().is_err());
        assert!(CenterlineParams::default().with_max_track_steps(0).validate().is_err());

        let mut p = CenterlineParams::default();
        p.section_tolerance = 1.5;
        assert!(p.validate().is_err());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let p = CenterlineParams::from_toml("acc_radius = 15.0\ninvert_normals = true\n").unwrap();
        assert_eq!(p.acc_radius, 15.0);
        assert!(p.invert_normals);
        assert_eq!(p.track_step, 5.0);

        let text = p.to_toml().unwrap();
        assert_eq!(CenterlineParams::from_toml(&text).unwrap(), p);
    }
}
