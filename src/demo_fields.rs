// src/demo_fields.rs
//
// Synthetic p-atic evolutions on the unit square, used by the CLI and the tests.
//
// Conventions:
// - Point (i, j) sits at (i/(nx-1), j/(ny-1)); a single point sits at 0.
// - Real fields are returned in degrees, wrapped to [-180/p, 180/p).
// - Complex fields carry psi = |psi| exp(i p theta), so converting back gives theta.

use std::f64::consts::{PI, TAU};
use std::str::FromStr;

use num_complex::Complex64;
use rayon::prelude::*;

use crate::error::{AnimError, Result};
use crate::phase_field::PhaseField;

/// Available synthetic evolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// A +1/p and -1/p defect pair orbiting the centre on a slowly rotating background.
    Defects,
    /// Spatially uniform orientation rotating through one full period.
    Uniform,
    /// Outward-travelling Archimedean spiral.
    Spiral,
}

impl FromStr for Demo {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "defects" => Ok(Demo::Defects),
            "uniform" => Ok(Demo::Uniform),
            "spiral" => Ok(Demo::Spiral),
            _ => Err(AnimError::InvalidArgument(format!("unknown demo '{s}'"))),
        }
    }
}

fn unit_coord(k: usize, n: usize) -> f64 {
    if n > 1 {
        k as f64 / (n - 1) as f64
    } else {
        0.0
    }
}

/// Wrap an angle (radians) into [-pi/p, pi/p).
pub fn wrap_angle(theta: f64, p: u32) -> f64 {
    let period = TAU / p.max(1) as f64;
    (theta + 0.5 * period).rem_euclid(period) - 0.5 * period
}

/// Defect core positions at time fraction `s` in [0, 1).
fn defect_pair(s: f64) -> [(f64, f64); 2] {
    let phi = TAU * s;
    let r = 0.22;
    [
        (0.5 + r * phi.cos(), 0.5 + r * phi.sin()),
        (0.5 - r * phi.cos(), 0.5 - r * phi.sin()),
    ]
}

impl Demo {
    /// Orientation (radians, unwrapped) and order-parameter amplitude at (x, y), time fraction s.
    fn sample(self, p: u32, x: f64, y: f64, s: f64) -> (f64, f64) {
        let p = p as f64;
        match self {
            Demo::Defects => {
                let [(ax, ay), (bx, by)] = defect_pair(s);
                let theta = ((y - ay).atan2(x - ax) - (y - by).atan2(x - bx)) / p + 0.25 * TAU * s / p;
                let core = 0.05;
                let ra = ((x - ax).powi(2) + (y - ay).powi(2)).sqrt();
                let rb = ((x - bx).powi(2) + (y - by).powi(2)).sqrt();
                (theta, (ra / core).tanh() * (rb / core).tanh())
            }
            Demo::Uniform => (TAU * s / p, 1.0),
            Demo::Spiral => {
                let (dx, dy) = (x - 0.5, y - 0.5);
                let r = (dx * dx + dy * dy).sqrt();
                let theta = (dy.atan2(dx) + 6.0 * PI * r - TAU * s) / p;
                (theta, (r / 0.05).tanh())
            }
        }
    }

    /// Real field in degrees, shape (nt, ny, nx).
    pub fn real_field(self, p: u32, nt: usize, ny: usize, nx: usize) -> Result<PhaseField> {
        if p == 0 {
            return Err(AnimError::InvalidDegree(p));
        }
        let data = self.fill(nt, ny, nx, |x, y, s| {
            let (theta, _) = self.sample(p, x, y, s);
            wrap_angle(theta, p).to_degrees()
        });
        PhaseField::new(&[nt, ny, nx], data)
    }

    /// Complex order parameter psi = A exp(i p theta), shape (nt, ny, nx).
    pub fn complex_field(self, p: u32, nt: usize, ny: usize, nx: usize) -> Result<PhaseField> {
        if p == 0 {
            return Err(AnimError::InvalidDegree(p));
        }
        let samples = self.fill(nt, ny, nx, |x, y, s| {
            let (theta, amp) = self.sample(p, x, y, s);
            Complex64::from_polar(amp, p as f64 * theta)
        });
        PhaseField::from_complex(&[nt, ny, nx], &samples, p)
    }

    fn fill<T, F>(self, nt: usize, ny: usize, nx: usize, f: F) -> Vec<T>
    where
        T: Send + Default + Clone,
        F: Fn(f64, f64, f64) -> T + Sync,
    {
        let mut data = vec![T::default(); nt * ny * nx];
        let frame_len = (ny * nx).max(1);
        data.par_chunks_mut(frame_len)
            .enumerate()
            .for_each(|(t, frame)| {
                let s = t as f64 / nt.max(1) as f64;
                for j in 0..ny {
                    let y = unit_coord(j, ny);
                    for i in 0..nx {
                        frame[j * nx + i] = f(unit_coord(i, nx), y, s);
                    }
                }
            });
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_angles_stay_in_the_symmetry_period() {
        for p in 1..=6 {
            for k in -50..50 {
                let w = wrap_angle(0.37 * k as f64, p);
                let half = PI / p as f64;
                assert!(w >= -half - 1e-12 && w < half + 1e-12, "p={p} w={w}");
            }
        }
        assert!((wrap_angle(PI + 0.1, 1) - (-PI + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn uniform_demo_is_constant_per_frame() {
        let f = Demo::Uniform.real_field(4, 4, 3, 5).unwrap();
        assert_eq!(f.shape(), (4, 3, 5));
        for t in 0..4 {
            let (lo, hi) = f.frame_range(t);
            assert!((hi - lo).abs() < 1e-12);
        }
        // a quarter period per frame at p = 4 is 22.5 degrees
        assert!((f.value(1, 0, 0) - 22.5).abs() < 1e-9);
    }

    #[test]
    fn real_demo_values_are_bounded_by_period() {
        let p = 3;
        let f = Demo::Defects.real_field(p, 2, 16, 16).unwrap();
        let (lo, hi) = f.value_range();
        assert!(lo >= -60.0 - 1e-9 && hi <= 60.0 + 1e-9);
    }

    #[test]
    fn complex_demo_round_trips_to_the_same_orientation() {
        let p = 2;
        let real = Demo::Spiral.real_field(p, 1, 8, 8).unwrap();
        let cplx = Demo::Spiral.complex_field(p, 1, 8, 8).unwrap();
        assert!(cplx.is_complex());
        for j in 0..8 {
            for i in 0..8 {
                let a = real.angle(0, j, i);
                let b = cplx.angle(0, j, i);
                // both are wrapped to the same half-open period
                assert!((wrap_angle(a - b, p)).abs() < 1e-9, "({j},{i}) {a} vs {b}");
            }
        }
    }

    #[test]
    fn zero_degree_is_rejected() {
        assert!(matches!(
            Demo::Uniform.real_field(0, 1, 2, 2),
            Err(AnimError::InvalidDegree(0))
        ));
        assert!("vortex".parse::<Demo>().is_err());
        assert_eq!("Spiral".parse::<Demo>().unwrap(), Demo::Spiral);
    }
}
