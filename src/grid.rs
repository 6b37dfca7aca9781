// src/grid.rs
//
// Coordinate bookkeeping for the animator.
//
// Axis limits may arrive before the phase field does, so the manager keeps two layers:
// - per-axis ranges (lo, hi), known as soon as the caller supplies any coordinates;
// - per-axis (ny, nx) meshes, materialised only once the field shape is known.

use tracing::debug;

use crate::error::{AnimError, Result};

/// Closed coordinate interval [lo, hi] with lo < hi.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub lo: f64,
    pub hi: f64,
}

impl AxisRange {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(AnimError::InvalidCoordinate(
                "coordinate limits must be finite numbers".into(),
            ));
        }
        if hi <= lo {
            return Err(AnimError::InvalidCoordinate(format!(
                "upper limit {hi} must be greater than lower limit {lo}"
            )));
        }
        Ok(Self { lo, hi })
    }

    /// The default [0, 1] interval.
    pub fn unit() -> Self {
        Self { lo: 0.0, hi: 1.0 }
    }

    pub fn span(&self) -> f64 {
        self.hi - self.lo
    }

    /// `n` evenly spaced points from lo to hi inclusive.
    pub fn linspace(&self, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![self.lo],
            _ => {
                let step = self.span() / (n - 1) as f64;
                (0..n)
                    .map(|k| if k == n - 1 { self.hi } else { self.lo + step * k as f64 })
                    .collect()
            }
        }
    }
}

/// Which coordinate axis an input applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Both,
}

impl std::str::FromStr for Axis {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "both" => Ok(Self::Both),
            _ => Err(AnimError::InvalidArgument(format!(
                "axis must be 'x', 'y' or 'both' (got '{s}')"
            ))),
        }
    }
}

/// Coordinate input: limits, a 1D coordinate vector, or a 2D (rows, cols) mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordInput {
    Range(f64, f64),
    Values(Vec<f64>),
    Mesh { rows: usize, cols: usize, data: Vec<f64> },
}

impl CoordInput {
    /// Extract the (min, max) limits of the input.
    pub fn bounds(&self) -> Result<AxisRange> {
        match self {
            CoordInput::Range(lo, hi) => AxisRange::new(*lo, *hi),
            CoordInput::Values(v) => min_max_range(v),
            CoordInput::Mesh { rows, cols, data } => {
                if data.len() != rows * cols {
                    return Err(AnimError::InvalidCoordinate(format!(
                        "mesh data has {} values, expected {} ({} x {})",
                        data.len(),
                        rows * cols,
                        rows,
                        cols
                    )));
                }
                min_max_range(data)
            }
        }
    }
}

impl From<(f64, f64)> for CoordInput {
    fn from((lo, hi): (f64, f64)) -> Self {
        CoordInput::Range(lo, hi)
    }
}

impl From<[f64; 2]> for CoordInput {
    fn from(c: [f64; 2]) -> Self {
        CoordInput::Range(c[0], c[1])
    }
}

impl From<Vec<f64>> for CoordInput {
    fn from(v: Vec<f64>) -> Self {
        CoordInput::Values(v)
    }
}

fn min_max_range(values: &[f64]) -> Result<AxisRange> {
    if values.is_empty() {
        return Err(AnimError::InvalidCoordinate("coordinate array is empty".into()));
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        if !v.is_finite() {
            return Err(AnimError::InvalidCoordinate(
                "coordinate array contains non-finite values".into(),
            ));
        }
        lo = lo.min(v);
        hi = hi.max(v);
    }
    AxisRange::new(lo, hi)
}

/// One coordinate component sampled on the (ny, nx) plot grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisGrid {
    pub nx: usize,
    pub ny: usize,
    pub data: Vec<f64>,
}

impl AxisGrid {
    /// x-coordinates: every row is a copy of `xs`.
    pub fn along_x(xs: &[f64], ny: usize) -> Self {
        let nx = xs.len();
        let mut data = Vec::with_capacity(nx * ny);
        for _ in 0..ny {
            data.extend_from_slice(xs);
        }
        Self { nx, ny, data }
    }

    /// y-coordinates: every column is a copy of `ys`.
    pub fn along_y(ys: &[f64], nx: usize) -> Self {
        let ny = ys.len();
        let mut data = Vec::with_capacity(nx * ny);
        for &y in ys {
            data.extend(std::iter::repeat(y).take(nx));
        }
        Self { nx, ny, data }
    }

    #[inline]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny);
        j * self.nx + i
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.data[self.idx(i, j)]
    }

    /// (ny, nx)
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Axis ranges plus the meshes derived from them.
#[derive(Debug, Clone, Default)]
pub struct CoordinateGrid {
    x_range: Option<AxisRange>,
    y_range: Option<AxisRange>,
    x: Option<AxisGrid>,
    y: Option<AxisGrid>,
    /// (ny, nx) of the current phase field, if any.
    shape: Option<(usize, usize)>,
}

impl CoordinateGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set coordinates for one or both axes.
    ///
    /// Inputs whose size matches the known point count are used verbatim for a single
    /// axis. Anything else only contributes its limits, and the mesh for that axis is
    /// rebuilt linearly from them once (or if) the field shape is known.
    pub fn set_axis_range(&mut self, input: &CoordInput, axis: Axis) -> Result<()> {
        let range = input.bounds()?;

        match axis {
            Axis::X => {
                self.x_range = Some(range);
                self.x = None;
                if let Some((ny, nx)) = self.shape {
                    self.x = Some(match input {
                        CoordInput::Values(v) if v.len() == nx => AxisGrid::along_x(v, ny),
                        CoordInput::Mesh { rows, cols, data } if (*rows, *cols) == (ny, nx) => {
                            AxisGrid { nx, ny, data: data.clone() }
                        }
                        _ => AxisGrid::along_x(&range.linspace(nx), ny),
                    });
                }
            }
            Axis::Y => {
                self.y_range = Some(range);
                self.y = None;
                if let Some((ny, nx)) = self.shape {
                    self.y = Some(match input {
                        CoordInput::Values(v) if v.len() == ny => AxisGrid::along_y(v, nx),
                        CoordInput::Mesh { rows, cols, data } if (*rows, *cols) == (ny, nx) => {
                            AxisGrid { nx, ny, data: data.clone() }
                        }
                        _ => AxisGrid::along_y(&range.linspace(ny), nx),
                    });
                }
            }
            Axis::Both => {
                self.x_range = Some(range);
                self.y_range = Some(range);
                self.x = None;
                self.y = None;
                if let Some((ny, nx)) = self.shape {
                    self.build_linear(ny, nx);
                }
            }
        }

        debug!(?axis, lo = range.lo, hi = range.hi, materialised = self.is_complete(), "axis range set");
        Ok(())
    }

    /// Rebuild both meshes for a field with `ny` rows and `nx` columns.
    ///
    /// Axes without a range fall back to [0, 1], which is then recorded as their range.
    pub fn derive_grid(&mut self, ny: usize, nx: usize) {
        self.shape = Some((ny, nx));
        if self.x_range.is_none() {
            self.x_range = Some(AxisRange::unit());
        }
        if self.y_range.is_none() {
            self.y_range = Some(AxisRange::unit());
        }
        self.build_linear(ny, nx);
        debug!(ny, nx, "coordinate grid derived");
    }

    fn build_linear(&mut self, ny: usize, nx: usize) {
        let xr = self.x_range.unwrap_or_else(AxisRange::unit);
        let yr = self.y_range.unwrap_or_else(AxisRange::unit);
        self.x = Some(AxisGrid::along_x(&xr.linspace(nx), ny));
        self.y = Some(AxisGrid::along_y(&yr.linspace(ny), nx));
    }

    pub fn x_range(&self) -> Option<AxisRange> {
        self.x_range
    }

    pub fn y_range(&self) -> Option<AxisRange> {
        self.y_range
    }

    pub fn x(&self) -> Option<&AxisGrid> {
        self.x.as_ref()
    }

    pub fn y(&self) -> Option<&AxisGrid> {
        self.y.as_ref()
    }

    /// (ny, nx) once a field has been attached.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.shape
    }

    /// Both meshes are materialised.
    pub fn is_complete(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }

    /// Plot limits (x, y), available once both ranges are known.
    pub fn limits(&self) -> Option<(AxisRange, AxisRange)> {
        Some((self.x_range?, self.y_range?))
    }
}
