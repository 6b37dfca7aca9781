// src/phase_field.rs

use std::path::Path;

use num_complex::Complex64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AnimError, Result};

/// Unit of the stored angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

/// Time evolution of the phase field, indexed (frame, row, col).
///
/// Real input is taken as an angle in degrees. Complex input stores `arg(z)/p` in
/// radians and keeps `|z|` as an amplitude channel.
#[derive(Debug, Clone)]
pub struct PhaseField {
    pub nt: usize,
    pub ny: usize,
    pub nx: usize,
    pub data: Vec<f64>,
    pub unit: AngleUnit,
    amplitude: Option<Vec<f64>>,
    amp_range: (f64, f64),
}

/// On-disk JSON layout: `{"shape": [nt, ny, nx], "data": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldFile {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

fn check_shape(shape: &[usize], len: usize) -> Result<(usize, usize, usize)> {
    if shape.len() != 3 {
        return Err(AnimError::FieldShape(format!("got rank {}", shape.len())));
    }
    let (nt, ny, nx) = (shape[0], shape[1], shape[2]);
    if nt == 0 || ny == 0 || nx == 0 {
        return Err(AnimError::FieldShape(format!(
            "every extent must be non-zero, got ({nt}, {ny}, {nx})"
        )));
    }
    if len != nt * ny * nx {
        return Err(AnimError::FieldShape(format!(
            "{len} values do not fill shape ({nt}, {ny}, {nx})"
        )));
    }
    Ok((nt, ny, nx))
}

impl PhaseField {
    /// Wrap flat row-major data of the given shape.
    pub fn new(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        let (nt, ny, nx) = check_shape(shape, data.len())?;
        Ok(Self {
            nt,
            ny,
            nx,
            data,
            unit: AngleUnit::Degrees,
            amplitude: None,
            amp_range: (0.0, 0.0),
        })
    }

    /// Build from nested frames; ragged input is a shape error.
    pub fn from_frames(frames: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let nt = frames.len();
        let ny = frames.first().map_or(0, |f| f.len());
        let nx = frames
            .first()
            .and_then(|f| f.first())
            .map_or(0, |r| r.len());

        let mut data = Vec::with_capacity(nt * ny * nx);
        for (t, frame) in frames.into_iter().enumerate() {
            if frame.len() != ny {
                return Err(AnimError::FieldShape(format!(
                    "frame {t} has {} rows, expected {ny}",
                    frame.len()
                )));
            }
            for (j, row) in frame.into_iter().enumerate() {
                if row.len() != nx {
                    return Err(AnimError::FieldShape(format!(
                        "frame {t} row {j} has {} columns, expected {nx}",
                        row.len()
                    )));
                }
                data.extend(row);
            }
        }
        Self::new(&[nt, ny, nx], data)
    }

    /// Build from complex order-parameter samples of a p-atic.
    pub fn from_complex(shape: &[usize], samples: &[Complex64], p: u32) -> Result<Self> {
        let (nt, ny, nx) = check_shape(shape, samples.len())?;
        if p == 0 {
            return Err(AnimError::InvalidDegree(p));
        }
        let p = p as f64;

        let (data, amplitude): (Vec<f64>, Vec<f64>) = samples
            .par_iter()
            .map(|z| (z.arg() / p, z.norm()))
            .unzip();
        let amp_range = min_max(&amplitude);

        Ok(Self {
            nt,
            ny,
            nx,
            data,
            unit: AngleUnit::Radians,
            amplitude: Some(amplitude),
            amp_range,
        })
    }

    /// Load a real field from the JSON layout described by [`FieldFile`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let parsed: FieldFile = serde_json::from_reader(std::io::BufReader::new(file))?;
        Self::new(&parsed.shape, parsed.data)
    }

    /// (nt, ny, nx)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nt, self.ny, self.nx)
    }

    pub fn is_complex(&self) -> bool {
        self.amplitude.is_some()
    }

    #[inline]
    pub fn idx(&self, t: usize, j: usize, i: usize) -> usize {
        debug_assert!(t < self.nt && j < self.ny && i < self.nx);
        (t * self.ny + j) * self.nx + i
    }

    #[inline]
    pub fn value(&self, t: usize, j: usize, i: usize) -> f64 {
        self.data[self.idx(t, j, i)]
    }

    /// Local orientation in radians.
    #[inline]
    pub fn angle(&self, t: usize, j: usize, i: usize) -> f64 {
        let v = self.value(t, j, i);
        match self.unit {
            AngleUnit::Degrees => v.to_radians(),
            AngleUnit::Radians => v,
        }
    }

    /// Row-major slice of frame `t`.
    pub fn frame(&self, t: usize) -> &[f64] {
        let n = self.ny * self.nx;
        &self.data[t * n..(t + 1) * n]
    }

    /// Min/max over the whole evolution.
    pub fn value_range(&self) -> (f64, f64) {
        min_max(&self.data)
    }

    pub fn frame_range(&self, t: usize) -> (f64, f64) {
        min_max(self.frame(t))
    }

    /// Amplitude normalised to [0, 1] over the evolution; 1 for real fields.
    pub fn amplitude_alpha(&self, t: usize, j: usize, i: usize) -> f64 {
        match &self.amplitude {
            None => 1.0,
            Some(a) => {
                let (lo, hi) = self.amp_range;
                if hi - lo <= f64::EPSILON {
                    1.0
                } else {
                    ((a[self.idx(t, j, i)] - lo) / (hi - lo)).clamp(0.0, 1.0)
                }
            }
        }
    }
}

/// Finite min/max; (0, 0) when nothing is finite.
fn min_max(values: &[f64]) -> (f64, f64) {
    let (lo, hi) = values
        .par_iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f64::INFINITY, f64::NEG_INFINITY),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        );
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_must_be_three() {
        let err = PhaseField::new(&[4, 4], vec![0.0; 16]).unwrap_err();
        assert!(matches!(err, AnimError::FieldShape(_)));
        let err = PhaseField::new(&[1, 2, 2, 2], vec![0.0; 8]).unwrap_err();
        assert!(matches!(err, AnimError::FieldShape(_)));
    }

    #[test]
    fn data_length_and_zero_extents_are_checked() {
        assert!(PhaseField::new(&[2, 3, 4], vec![0.0; 23]).is_err());
        assert!(PhaseField::new(&[0, 3, 4], vec![]).is_err());
        let f = PhaseField::new(&[2, 3, 4], vec![0.0; 24]).unwrap();
        assert_eq!(f.shape(), (2, 3, 4));
    }

    #[test]
    fn indexing_is_frame_row_col() {
        let data: Vec<f64> = (0..24).map(|v| v as f64).collect();
        let f = PhaseField::new(&[2, 3, 4], data).unwrap();
        assert_eq!(f.value(0, 0, 3), 3.0);
        assert_eq!(f.value(0, 2, 0), 8.0);
        assert_eq!(f.value(1, 0, 0), 12.0);
        assert_eq!(f.frame(1)[0], 12.0);
        assert_eq!(f.value_range(), (0.0, 23.0));
        assert_eq!(f.frame_range(0), (0.0, 11.0));
    }

    #[test]
    fn ragged_frames_are_rejected() {
        let ok = vec![vec![vec![0.0, 1.0], vec![2.0, 3.0]]];
        assert_eq!(PhaseField::from_frames(ok).unwrap().shape(), (1, 2, 2));

        let ragged = vec![vec![vec![0.0, 1.0], vec![2.0]]];
        assert!(matches!(
            PhaseField::from_frames(ragged),
            Err(AnimError::FieldShape(_))
        ));
        assert!(PhaseField::from_frames(vec![]).is_err());
    }

    #[test]
    fn complex_samples_become_angle_over_p_and_amplitude() {
        let z = vec![
            Complex64::from_polar(1.0, std::f64::consts::FRAC_PI_2),
            Complex64::from_polar(3.0, -std::f64::consts::FRAC_PI_2),
        ];
        let f = PhaseField::from_complex(&[1, 1, 2], &z, 2).unwrap();
        assert!(f.is_complex());
        assert_eq!(f.unit, AngleUnit::Radians);
        assert!((f.value(0, 0, 0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!((f.angle(0, 0, 1) + std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert_eq!(f.amplitude_alpha(0, 0, 0), 0.0);
        assert_eq!(f.amplitude_alpha(0, 0, 1), 1.0);
    }

    #[test]
    fn real_fields_are_degrees() {
        let f = PhaseField::new(&[1, 1, 1], vec![90.0]).unwrap();
        assert!((f.angle(0, 0, 0) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(f.amplitude_alpha(0, 0, 0), 1.0);
    }
}
