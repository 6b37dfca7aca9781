// src/animator.rs
//
// The animator owns the phase field, the coordinate grid and the plot configuration, and
// keeps them consistent: attaching a field re-derives the grid and the density-driven
// marker sizes, whatever order the inputs arrive in.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend};
use tracing::debug;

use crate::config::{PlotConfig, RunManifest};
use crate::error::{AnimError, Result};
use crate::grid::{Axis, CoordInput, CoordinateGrid};
use crate::phase_field::PhaseField;
use crate::visualisation::{FrameImage, RenderOptions, Renderer};

/// Animates the time evolution of a p-atic phase field.
#[derive(Debug, Clone)]
pub struct PAticAnimator {
    config: PlotConfig,
    grid: CoordinateGrid,
    field: Option<PhaseField>,
    options: RenderOptions,
}

impl PAticAnimator {
    /// Empty animator for order-parameter degree `p` (>= 1).
    pub fn new(p: u32) -> Result<Self> {
        Ok(Self {
            config: PlotConfig::new(p)?,
            grid: CoordinateGrid::new(),
            field: None,
            options: RenderOptions::default(),
        })
    }

    /// Animator with any subset of field and coordinates supplied up front.
    ///
    /// A lone `x` or `y` is applied to both axes.
    pub fn with_data(
        p: u32,
        field: Option<PhaseField>,
        x: Option<CoordInput>,
        y: Option<CoordInput>,
    ) -> Result<Self> {
        let mut anim = Self::new(p)?;
        match (x, y) {
            (Some(x), Some(y)) => {
                anim.grid.set_axis_range(&x, Axis::X)?;
                anim.grid.set_axis_range(&y, Axis::Y)?;
            }
            (Some(c), None) | (None, Some(c)) => anim.grid.set_axis_range(&c, Axis::Both)?,
            (None, None) => {}
        }
        if let Some(field) = field {
            anim.set_field(field);
        }
        Ok(anim)
    }

    /// Set coordinates for one or both axes; see [`CoordinateGrid::set_axis_range`].
    pub fn set_axis_range(&mut self, input: impl Into<CoordInput>, axis: Axis) -> Result<()> {
        self.grid.set_axis_range(&input.into(), axis)
    }

    /// Attach (or replace) the phase field and re-derive everything that depends on its shape.
    pub fn set_field(&mut self, field: PhaseField) {
        let (nt, ny, nx) = field.shape();
        if let Some(old) = &self.field {
            if old.shape() != field.shape() {
                debug!(old = ?old.shape(), new = ?field.shape(), "phase field reshaped");
            }
        }
        self.grid.derive_grid(ny, nx);
        self.config.set_field_shape(ny, nx);
        self.field = Some(field);
        debug!(nt, ny, nx, "phase field set");
    }

    pub fn field(&self) -> Option<&PhaseField> {
        self.field.as_ref()
    }

    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Layout, marker and colour settings.
    pub fn config_mut(&mut self) -> &mut PlotConfig {
        &mut self.config
    }

    pub fn render_options(&self) -> RenderOptions {
        self.options
    }

    pub fn set_render_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    fn renderer(&self) -> Result<Renderer<'_>> {
        let field = self
            .field
            .as_ref()
            .ok_or(AnimError::NotReady("cannot make a plot without a phase field"))?;
        Renderer::new(&self.config, &self.grid, field, self.options)
    }

    /// Figure size in pixels for the current layout and dpi.
    pub fn figure_size(&self) -> Result<(u32, u32)> {
        Ok(self.renderer()?.figure_size())
    }

    /// Draw one frame onto a caller-provided drawing area; returns the frame actually drawn.
    pub fn draw_frame<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        frame: Option<usize>,
    ) -> Result<usize> {
        let r = self.renderer()?;
        let t = r.clamp_frame(frame);
        r.draw_frame(area, t)?;
        Ok(t)
    }

    /// Render a single frame in memory. Out-of-range frames clamp to the last one.
    pub fn preview(&self, frame: Option<usize>) -> Result<FrameImage> {
        self.renderer()?.preview(frame)
    }

    /// Write a single frame as a PNG.
    pub fn save_frame(&self, frame: Option<usize>, path: &Path) -> Result<()> {
        self.renderer()?.save_frame(frame, path)
    }

    /// Render every frame into `path` (`.gif` or `.mp4`).
    pub fn animate(&self, path: &Path) -> Result<()> {
        self.renderer()?.animate(path)
    }

    /// Run record describing the current state, for writing next to an output.
    pub fn manifest(&self, output: &Path) -> Result<RunManifest<'_>> {
        let field = self
            .field
            .as_ref()
            .ok_or(AnimError::NotReady("no phase field to describe"))?;
        let (nt, ny, nx) = field.shape();
        Ok(RunManifest {
            output: output.display().to_string(),
            shape: [nt, ny, nx],
            complex_field: field.is_complex(),
            x_range: self.grid.x_range().map(|r| [r.lo, r.hi]),
            y_range: self.grid.y_range().map(|r| [r.lo, r.hi]),
            fps: self.options.fps(),
            plot: &self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zeros(nt: usize, ny: usize, nx: usize) -> PhaseField {
        PhaseField::new(&[nt, ny, nx], vec![0.0; nt * ny * nx]).unwrap()
    }

    #[test]
    fn outputs_need_a_field() {
        let a = PAticAnimator::new(4).unwrap();
        assert!(matches!(a.preview(None), Err(AnimError::NotReady(_))));
        assert!(matches!(
            a.animate(Path::new("out.gif")),
            Err(AnimError::NotReady(_))
        ));
        assert!(a.manifest(Path::new("out.gif")).is_err());
    }

    #[test]
    fn lone_coordinate_applies_to_both_axes() {
        let a = PAticAnimator::with_data(2, Some(zeros(1, 3, 4)), Some((-2.0, 2.0).into()), None)
            .unwrap();
        assert_eq!(a.grid().x_range(), a.grid().y_range());
        assert_eq!(a.grid().y().unwrap().max(), 2.0);
    }

    #[test]
    fn field_shape_drives_marker_sizing() {
        let mut a = PAticAnimator::new(6).unwrap();
        assert_eq!(a.config().marker_size().get(), 500.0);
        a.set_field(zeros(1, 100, 100));
        // density 0.1 on 100 points: N = 10
        assert_eq!(a.config().marker_size().get(), 140.0);
        assert_eq!(a.config().stride(), (10, 10));
    }

    #[test]
    fn manifest_reflects_state() {
        let mut a = PAticAnimator::new(3).unwrap();
        a.set_axis_range((0.0, 5.0), Axis::X).unwrap();
        a.set_field(zeros(2, 3, 4));
        let m = a.manifest(Path::new("run/anim.gif")).unwrap();
        assert_eq!(m.shape, [2, 3, 4]);
        assert_eq!(m.x_range, Some([0.0, 5.0]));
        assert_eq!(m.y_range, Some([0.0, 1.0]));
        assert!(!m.complex_field);
    }
}
