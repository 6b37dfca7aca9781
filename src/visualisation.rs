// src/visualisation.rs
//
// Frame rendering on top of plotters.
//
// The renderer never owns a figure: every drawing routine takes the target
// `DrawingArea` as an argument, so the same code paints into an in-memory preview
// buffer, a PNG, or one frame of a GIF.

use std::path::Path;
use std::process::Command;

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::color::Rgb;
use crate::config::{Mode, PlotConfig, PlotMode, SubMarker};
use crate::error::{AnimError, Result};
use crate::grid::{AxisGrid, AxisRange, CoordinateGrid};
use crate::markers::{
    arrow_offsets, asterisk_offsets, line_width_px, marker_radius_px, polygon_offsets,
    tick_offsets,
};
use crate::phase_field::PhaseField;

/// Output resolution and decoration.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Pixels per inch of figure size.
    pub dpi: f64,
    /// Draw axis labels and colour-bar tick labels (needs a font back-end).
    pub labels: bool,
    /// Delay between animation frames.
    pub frame_delay_ms: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { dpi: 100.0, labels: true, frame_delay_ms: 100 }
    }
}

impl RenderOptions {
    pub fn fps(&self) -> f64 {
        1000.0 / self.frame_delay_ms.max(1) as f64
    }
}

/// A rendered frame held in memory, packed RGB.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Bytes in a packed-RGB buffer of `width` x `height`.
fn rgb_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

fn pixel_offset(width: u32, x: u32, y: u32) -> usize {
    (y as usize * width as usize + x as usize) * 3
}

impl FrameImage {
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let k = pixel_offset(self.width, x, y);
        Rgb(self.rgb[k], self.rgb[k + 1], self.rgb[k + 2])
    }
}

/// Colour-bar tick labels for a complex field, as multiples of pi spanning [-pi/p, pi/p].
pub fn pi_tick_labels(p: u32) -> Vec<String> {
    fn gcd(a: u32, b: u32) -> u32 {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }

    (0..9u32)
        .map(|k| {
            if k == 4 {
                return "0".to_string();
            }
            let n = k.abs_diff(4);
            let d = 4 * p.max(1);
            let g = gcd(n, d);
            let (nr, dr) = (n / g, d / g);
            let sign = if k < 4 { "-" } else { "" };
            match (nr, dr) {
                (1, 1) => format!("{sign}π"),
                (1, _) => format!("{sign}π/{dr}"),
                (_, 1) => format!("{sign}{nr}π"),
                _ => format!("{sign}{nr}π/{dr}"),
            }
        })
        .collect()
}

/// Cell edges around `centers`, clipped to [lo, hi].
fn cell_edges(centers: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let n = centers.len();
    if n == 1 {
        return vec![lo, hi];
    }
    let mut edges = Vec::with_capacity(n + 1);
    edges.push(centers[0] - 0.5 * (centers[1] - centers[0]));
    for k in 1..n {
        edges.push(0.5 * (centers[k - 1] + centers[k]));
    }
    edges.push(centers[n - 1] + 0.5 * (centers[n - 1] - centers[n - 2]));
    edges.into_iter().map(|e| e.clamp(lo, hi)).collect()
}

struct MarkerSample {
    x: f64,
    y: f64,
    angle: f64,
    value: f64,
}

/// Draws frames of one (config, grid, field) state.
pub struct Renderer<'a> {
    config: &'a PlotConfig,
    grid: &'a CoordinateGrid,
    x: &'a AxisGrid,
    y: &'a AxisGrid,
    field: &'a PhaseField,
    options: RenderOptions,
    value_range: (f64, f64),
}

impl<'a> Renderer<'a> {
    pub fn new(
        config: &'a PlotConfig,
        grid: &'a CoordinateGrid,
        field: &'a PhaseField,
        options: RenderOptions,
    ) -> Result<Self> {
        let (Some(x), Some(y)) = (grid.x(), grid.y()) else {
            return Err(AnimError::NotReady(
                "cannot make a plot without a fully defined coordinate grid",
            ));
        };
        if x.shape() != (field.ny, field.nx) || y.shape() != (field.ny, field.nx) {
            return Err(AnimError::FieldShape(format!(
                "coordinate grid {:?} does not match field frames ({}, {})",
                x.shape(),
                field.ny,
                field.nx
            )));
        }
        Ok(Self { config, grid, x, y, field, options, value_range: field.value_range() })
    }

    /// Figure size in pixels for the current layout.
    pub fn figure_size(&self) -> (u32, u32) {
        let (w_in, h_in) = match self.config.plot_mode() {
            PlotMode::OrderParameterOnly => (10.0, 10.0),
            PlotMode::BothSeparate => (24.0, 10.0),
            PlotMode::PhaseFieldOnly | PlotMode::BothTogether(_) => (12.0, 10.0),
        };
        let px = |inches: f64| ((inches * self.options.dpi).round() as u32).max(16);
        (px(w_in), px(h_in))
    }

    /// Requested frame clamped to [0, nt-1]; `None` is the first frame.
    pub fn clamp_frame(&self, frame: Option<usize>) -> usize {
        frame.unwrap_or(0).min(self.field.nt - 1)
    }

    /// Paint frame `t` onto `root`.
    pub fn draw_frame<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, t: usize) -> Result<()> {
        root.fill(&WHITE)?;

        match self.config.plot_mode() {
            PlotMode::PhaseFieldOnly => {
                let (main, bar) = self.split_colorbar(root);
                self.draw_panel(&main, t, true, false)?;
                self.draw_colorbar(&bar)?;
            }
            PlotMode::OrderParameterOnly => {
                self.draw_panel(root, t, false, true)?;
            }
            PlotMode::BothSeparate => {
                let (w, _) = root.dim_in_pixel();
                let (left, right) = root.split_horizontally(w / 2);
                let (main, bar) = self.split_colorbar(&left);
                self.draw_panel(&main, t, true, false)?;
                self.draw_colorbar(&bar)?;
                self.draw_panel(&right, t, false, true)?;
            }
            PlotMode::BothTogether(mode) => {
                let (main, bar) = self.split_colorbar(root);
                self.draw_panel(&main, t, mode != Mode::Mapped, true)?;
                self.draw_colorbar(&bar)?;
            }
        }
        Ok(())
    }

    fn split_colorbar<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
    ) -> (DrawingArea<DB, Shift>, DrawingArea<DB, Shift>) {
        let (w, _) = area.dim_in_pixel();
        let bar_w = ((w as f64) * 0.1).round() as u32;
        area.split_horizontally(w.saturating_sub(bar_w))
    }

    fn margin_px(&self, area_h: u32) -> u32 {
        ((area_h as f64) * 0.04).round() as u32
    }

    fn draw_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        t: usize,
        show_field: bool,
        show_markers: bool,
    ) -> Result<()> {
        let (xr, yr) = self
            .grid
            .limits()
            .ok_or(AnimError::NotReady("coordinate limits are not defined"))?;
        let (w, h) = area.dim_in_pixel();

        let mut builder = ChartBuilder::on(area);
        builder.margin(self.margin_px(h));
        if self.options.labels {
            builder
                .x_label_area_size(((h as f64) * 0.06).round() as u32)
                .y_label_area_size(((w as f64) * 0.08).round() as u32);
        }
        let mut chart = builder.build_cartesian_2d(xr.lo..xr.hi, yr.lo..yr.hi)?;

        if self.options.labels {
            let font = (self.options.dpi * 0.16).max(8.0);
            chart
                .configure_mesh()
                .disable_mesh()
                .x_desc("x")
                .y_desc("y")
                .label_style(("sans-serif", font))
                .axis_desc_style(("sans-serif", font * 1.2))
                .draw()?;
        }

        let face = self.config.axes_facecolor();
        chart.plotting_area().fill(&face.to_plotters())?;

        if show_field {
            self.draw_field_cells(&mut chart, t, face, xr, yr)?;
        }
        if show_markers {
            let (pw, ph) = chart.plotting_area().dim_in_pixel();
            self.draw_markers(&mut chart, t, pw, ph)?;
        }
        Ok(())
    }

    fn draw_field_cells<DB: DrawingBackend>(
        &self,
        chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
        t: usize,
        face: Rgb,
        xr: AxisRange,
        yr: AxisRange,
    ) -> Result<()> {
        let f = self.field;
        let (x, y) = (self.x, self.y);
        let xs: Vec<f64> = (0..f.nx).map(|i| x.at(i, 0)).collect();
        let ys: Vec<f64> = (0..f.ny).map(|j| y.at(0, j)).collect();
        let xe = cell_edges(&xs, xr.lo, xr.hi);
        let ye = cell_edges(&ys, yr.lo, yr.hi);

        let cmap = self.config.colormap();
        let pf_alpha = self.config.pf_transparency().get();
        let (lo, hi) = self.value_range;

        let mut cells = Vec::with_capacity(f.nx * f.ny);
        for j in 0..f.ny {
            for i in 0..f.nx {
                let alpha = pf_alpha * f.amplitude_alpha(t, j, i);
                let c = cmap.map(f.value(t, j, i), lo, hi).over(face, alpha);
                cells.push(Rectangle::new(
                    [(xe[i], ye[j]), (xe[i + 1], ye[j + 1])],
                    c.to_plotters().filled(),
                ));
            }
        }
        chart.draw_series(cells)?;
        Ok(())
    }

    fn marker_samples(&self, t: usize) -> Vec<MarkerSample> {
        let f = self.field;
        let (sx, sy) = self.config.stride();
        let (x, y) = (self.x, self.y);
        let mut out = Vec::new();
        for j in (0..f.ny).step_by(sy) {
            for i in (0..f.nx).step_by(sx) {
                out.push(MarkerSample {
                    x: x.at(i, j),
                    y: y.at(i, j),
                    angle: f.angle(t, j, i),
                    value: f.value(t, j, i),
                });
            }
        }
        out
    }

    fn marker_color(&self, sub: SubMarker, value: f64) -> Rgb {
        if self.config.is_colormapped(sub) {
            let (lo, hi) = self.value_range;
            self.config.colormap().map(value, lo, hi)
        } else {
            self.config.marker_color(sub).get()
        }
    }

    fn draw_markers<DB: DrawingBackend>(
        &self,
        chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
        t: usize,
        plot_w: u32,
        plot_h: u32,
    ) -> Result<()> {
        let cfg = self.config;
        let p = cfg.p();
        let dpi = self.options.dpi;
        let samples = self.marker_samples(t);

        if p == 1 {
            let f = self.field;
            let (sx, sy) = cfg.stride();
            let spacing_x = plot_w as f64 / f.nx as f64 * sx as f64;
            let spacing_y = plot_h as f64 / f.ny as f64 * sy as f64;
            let half_len = 0.4 * spacing_x.min(spacing_y);
            let stroke = line_width_px(0.75, dpi);
            let (lo, hi) = self.value_range;
            chart.draw_series(samples.iter().flat_map(|s| {
                let c = if cfg.markers_colormapped() {
                    cfg.colormap().map(s.value, lo, hi)
                } else {
                    Rgb::BLACK
                };
                let style = c.to_plotters().stroke_width(stroke);
                arrow_offsets(s.angle, half_len).into_iter().map(move |seg| {
                    EmptyElement::at((s.x, s.y)) + PathElement::new(vec![seg[0], seg[1]], style)
                })
            }))?;
            return Ok(());
        }

        let marker_type = cfg.marker_type().get();
        let radius = marker_radius_px(cfg.marker_size().get(), dpi);

        // a p < 3 polygon degenerates to nothing visible
        if marker_type.patch && p >= 3 {
            let alpha = cfg.marker_transparency(SubMarker::Patch).get();
            chart.draw_series(samples.iter().map(|s| {
                let c = self.marker_color(SubMarker::Patch, s.value);
                EmptyElement::at((s.x, s.y))
                    + Polygon::new(polygon_offsets(p, s.angle, radius), c.to_plotters().mix(alpha).filled())
            }))?;

            let edge = line_width_px(cfg.marker_linewidth(SubMarker::Patch).get(), dpi);
            if edge > 0 {
                chart.draw_series(samples.iter().map(|s| {
                    let c = self.marker_color(SubMarker::Patch, s.value);
                    let mut outline = polygon_offsets(p, s.angle, radius);
                    outline.push(outline[0]);
                    EmptyElement::at((s.x, s.y))
                        + PathElement::new(outline, c.to_plotters().mix(alpha).stroke_width(edge))
                }))?;
            }
        }

        if marker_type.point {
            let alpha = cfg.marker_transparency(SubMarker::Point).get();
            let stroke = line_width_px(cfg.marker_linewidth(SubMarker::Point).get(), dpi);
            if stroke > 0 {
                chart.draw_series(samples.iter().flat_map(|s| {
                    let style = self
                        .marker_color(SubMarker::Point, s.value)
                        .to_plotters()
                        .mix(alpha)
                        .stroke_width(stroke);
                    asterisk_offsets(p, s.angle, radius).into_iter().map(move |seg| {
                        EmptyElement::at((s.x, s.y)) + PathElement::new(vec![seg[0], seg[1]], style)
                    })
                }))?;
            }
        }

        if marker_type.tick {
            let alpha = cfg.marker_transparency(SubMarker::Tick).get();
            let stroke = line_width_px(cfg.marker_linewidth(SubMarker::Tick).get(), dpi);
            if stroke > 0 {
                chart.draw_series(samples.iter().map(|s| {
                    let style = self
                        .marker_color(SubMarker::Tick, s.value)
                        .to_plotters()
                        .mix(alpha)
                        .stroke_width(stroke);
                    let seg = tick_offsets(s.angle, radius);
                    EmptyElement::at((s.x, s.y)) + PathElement::new(vec![seg[0], seg[1]], style)
                }))?;
            }
        }
        Ok(())
    }

    fn draw_colorbar<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        let (w, h) = area.dim_in_pixel();
        let margin = self.margin_px(h) as i32;
        let bottom_pad = if self.options.labels {
            ((h as f64) * 0.06).round() as i32
        } else {
            0
        };
        let x0 = ((w as f64) * 0.1).round() as i32;
        let x1 = ((w as f64) * 0.35).round() as i32;
        let y0 = margin;
        let y1 = (h as i32 - margin - bottom_pad).max(y0 + 1);

        let cmap = self.config.colormap();
        const BANDS: i32 = 128;
        let span = (y1 - y0) as f64;
        for k in 0..BANDS {
            let ya = y0 + (span * k as f64 / BANDS as f64).round() as i32;
            let yb = y0 + (span * (k + 1) as f64 / BANDS as f64).round() as i32;
            let c = cmap.sample(1.0 - (k as f64 + 0.5) / BANDS as f64);
            area.draw(&Rectangle::new([(x0, ya), (x1, yb)], c.to_plotters().filled()))?;
        }
        area.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1)))?;

        if self.options.labels {
            let labels: Vec<String> = if self.field.is_complex() {
                pi_tick_labels(self.config.p())
            } else {
                let (lo, hi) = self.value_range;
                (0..9)
                    .map(|k| format!("{:.4}", lo + (hi - lo) * k as f64 / 8.0))
                    .collect()
            };
            let font = (self.options.dpi * 0.14).max(8.0);
            for (k, label) in labels.iter().enumerate() {
                let y = y1 - (span * k as f64 / 8.0).round() as i32;
                area.draw(&PathElement::new(vec![(x1, y), (x1 + 4, y)], BLACK.stroke_width(1)))?;
                area.draw(&Text::new(label.as_str(), (x1 + 6, y - (font / 2.0) as i32), ("sans-serif", font)))?;
            }
        }
        Ok(())
    }

    /// Render one frame into memory without touching the filesystem.
    pub fn preview(&self, frame: Option<usize>) -> Result<FrameImage> {
        let t = self.clamp_frame(frame);
        let (width, height) = self.figure_size();
        let mut rgb = vec![0u8; rgb_len(width, height)];
        {
            let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
            self.draw_frame(&root, t)?;
            root.present()?;
        }
        debug!(frame = t, width, height, "frame previewed");
        Ok(FrameImage { width, height, rgb })
    }

    /// Write one frame as a PNG.
    pub fn save_frame(&self, frame: Option<usize>, path: &Path) -> Result<()> {
        let t = self.clamp_frame(frame);
        let root = BitMapBackend::new(path, self.figure_size()).into_drawing_area();
        self.draw_frame(&root, t)?;
        root.present()?;
        Ok(())
    }

    /// Render all frames to `path`; the extension selects gif or mp4.
    pub fn animate(&self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "gif" => self.animate_gif(path),
            "mp4" => self.animate_mp4(path),
            _ => Err(AnimError::UnsupportedFormat(ext)),
        }
    }

    fn animate_gif(&self, path: &Path) -> Result<()> {
        let root = BitMapBackend::gif(path, self.figure_size(), self.options.frame_delay_ms)
            .map_err(|e| AnimError::Render(e.to_string()))?
            .into_drawing_area();

        let nt = self.field.nt;
        for t in 0..nt {
            self.draw_frame(&root, t)?;
            root.present()?;
            if (t + 1) % 10 == 0 || t + 1 == nt {
                info!("frame {}/{}", t + 1, nt);
            }
        }
        info!(path = %path.display(), frames = nt, "animation written");
        Ok(())
    }

    /// PNG frames into a fresh scratch directory, stitched by ffmpeg.
    fn animate_mp4(&self, path: &Path) -> Result<()> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "animation".to_string());
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let frames_dir = Builder::new()
            .prefix(&format!("_{stem}_frames"))
            .tempdir_in(parent)?;

        let result = self.write_mp4(path, frames_dir.path());
        if let Err(e) = frames_dir.close() {
            warn!("could not remove frame directory: {e}");
        }
        result
    }

    fn write_mp4(&self, path: &Path, frames_dir: &Path) -> Result<()> {
        let nt = self.field.nt;
        for t in 0..nt {
            self.save_frame(Some(t), &frames_dir.join(format!("frame_{t:05}.png")))?;
        }

        let pattern = frames_dir.join("frame_%05d.png");
        let status = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-framerate"])
            .arg(format!("{}", self.options.fps()))
            .arg("-i")
            .arg(&pattern)
            .args(["-pix_fmt", "yuv420p", "-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
            .arg(path)
            .status()
            .map_err(|e| AnimError::Encoder(format!("could not run ffmpeg: {e}")))?;

        if !status.success() {
            return Err(AnimError::Encoder(format!("ffmpeg exited with status {status}")));
        }
        info!(path = %path.display(), frames = nt, "animation written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pi_labels_span_minus_to_plus_pi_over_p() {
        let l = pi_tick_labels(1);
        assert_eq!(l[0], "-π");
        assert_eq!(l[2], "-π/2");
        assert_eq!(l[4], "0");
        assert_eq!(l[5], "π/4");
        assert_eq!(l[8], "π");

        let l = pi_tick_labels(2);
        assert_eq!(l[0], "-π/2");
        assert_eq!(l[6], "π/4");
        assert_eq!(l[7], "3π/8");
    }

    #[test]
    fn cell_edges_are_midpoints_clipped_to_limits() {
        let e = cell_edges(&[0.0, 1.0, 2.0], 0.0, 2.0);
        assert_eq!(e, vec![0.0, 0.5, 1.5, 2.0]);
        assert_eq!(cell_edges(&[3.0], 2.0, 4.0), vec![2.0, 4.0]);
    }

    #[test]
    fn buffer_arithmetic_does_not_wrap_at_high_dpi() {
        // 24 x 10 in at 3000 dpi
        let (w, h) = (72_000u32, 30_000u32);
        assert_eq!(rgb_len(w, h), 6_480_000_000);
        assert_eq!(pixel_offset(w, w - 1, h - 1), rgb_len(w, h) - 3);
        assert_eq!(pixel_offset(4, 1, 2), 27);
    }

    #[test]
    fn fps_from_delay() {
        let o = RenderOptions { frame_delay_ms: 50, ..Default::default() };
        assert_eq!(o.fps(), 20.0);
    }
}
