// src/config.rs
//
// Plot configuration for the animator.
//
// Several settings cascade: choosing a colour-mapped mode rewrites the marker type,
// the patch transparency and the phase-field transparency. Every cascading attribute is
// a `Setting<T>` that records whether its current value came from a default/cascade or
// from an explicit user call, so the precedence rules are observable:
// - a cascade always overwrites (calls made *before* `set_mode` lose);
// - density-driven auto sizing never overwrites a user value;
// - `reset_marker_settings` returns everything to the default origin.

use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::color::{Colormap, Rgb};
use crate::error::{AnimError, Result};
use crate::grid::Axis;
use crate::markers::{auto_marker_size, marker_stride};

/// Where the current value of a setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Default,
    User,
}

/// A value plus its origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Setting<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T: Copy> Setting<T> {
    fn default_to(value: T) -> Self {
        Self { value, origin: Origin::Default }
    }

    pub fn get(&self) -> T {
        self.value
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    fn set_user(&mut self, value: T) {
        self.value = value;
        self.origin = Origin::User;
    }

    fn cascade(&mut self, value: T) {
        self.value = value;
        self.origin = Origin::Default;
    }

    /// Derived value; kept only if the user has not set one.
    fn auto(&mut self, value: T) {
        if !self.is_user() {
            self.value = value;
        }
    }
}

/// What to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Which {
    PhaseField,
    OrderParameter,
    Both,
}

impl FromStr for Which {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pf" => Ok(Which::PhaseField),
            "op" => Ok(Which::OrderParameter),
            "both" => Ok(Which::Both),
            _ => Err(AnimError::InvalidArgument(format!(
                "which must be one of 'pf', 'op' and 'both' (got '{s}')"
            ))),
        }
    }
}

/// Panel layout when drawing both the field and the order parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    Separate,
    Together,
}

impl FromStr for Grouping {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "separate" => Ok(Grouping::Separate),
            "together" => Ok(Grouping::Together),
            _ => Err(AnimError::InvalidArgument(format!(
                "grouping must be one of 'separate' and 'together' (got '{s}')"
            ))),
        }
    }
}

/// Style of a combined (together) plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    /// 0: solid markers over the phase field.
    Solid,
    /// 1: colour-mapped markers over the plain axes background.
    Mapped,
    /// 2: colour-mapped markers over a faded phase field.
    MappedOverlay,
}

impl Mode {
    pub fn is_mapped(self) -> bool {
        matches!(self, Mode::Mapped | Mode::MappedOverlay)
    }
}

impl TryFrom<u8> for Mode {
    type Error = AnimError;

    fn try_from(m: u8) -> Result<Self> {
        match m {
            0 => Ok(Mode::Solid),
            1 => Ok(Mode::Mapped),
            2 => Ok(Mode::MappedOverlay),
            _ => Err(AnimError::InvalidArgument(format!(
                "the allowed values for mode are 0, 1 and 2 (got {m})"
            ))),
        }
    }
}

/// The effective layout, resolved from (which, grouping, mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    PhaseFieldOnly,
    OrderParameterOnly,
    BothSeparate,
    BothTogether(Mode),
}

/// One of the three basic marker shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubMarker {
    Patch,
    Point,
    Tick,
}

impl FromStr for SubMarker {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "patch" => Ok(SubMarker::Patch),
            "point" => Ok(SubMarker::Point),
            "tick" => Ok(SubMarker::Tick),
            _ => Err(AnimError::InvalidArgument(format!(
                "marker must be one of 'patch', 'point' or 'tick' (got '{s}')"
            ))),
        }
    }
}

/// Which sub-markers are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerType {
    pub patch: bool,
    pub point: bool,
    pub tick: bool,
}

impl MarkerType {
    pub const ALL: MarkerType = MarkerType { patch: true, point: true, tick: true };
    pub const PATCH: MarkerType = MarkerType { patch: true, point: false, tick: false };
    pub const POINT: MarkerType = MarkerType { patch: false, point: true, tick: false };
    pub const TICK: MarkerType = MarkerType { patch: false, point: false, tick: true };

    pub fn includes(&self, sub: SubMarker) -> bool {
        match sub {
            SubMarker::Patch => self.patch,
            SubMarker::Point => self.point,
            SubMarker::Tick => self.tick,
        }
    }
}

impl FromStr for MarkerType {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        let t = match s.to_ascii_lowercase().as_str() {
            "patch" => MarkerType::PATCH,
            "point" => MarkerType::POINT,
            "tick" => MarkerType::TICK,
            "patch & point" => MarkerType { patch: true, point: true, tick: false },
            "patch & tick" => MarkerType { patch: true, point: false, tick: true },
            "point & tick" => MarkerType { patch: false, point: true, tick: true },
            "all" => MarkerType::ALL,
            _ => {
                return Err(AnimError::InvalidArgument(format!(
                    "the possible marker types are 'patch', 'point', 'tick', 'patch & point', \
                     'patch & tick', 'point & tick' and 'all' (got '{s}')"
                )));
            }
        };
        Ok(t)
    }
}

/// One value per sub-marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerMarker<T> {
    pub patch: T,
    pub point: T,
    pub tick: T,
}

impl<T> PerMarker<T> {
    pub fn get(&self, sub: SubMarker) -> &T {
        match sub {
            SubMarker::Patch => &self.patch,
            SubMarker::Point => &self.point,
            SubMarker::Tick => &self.tick,
        }
    }

    fn get_mut(&mut self, sub: SubMarker) -> &mut T {
        match sub {
            SubMarker::Patch => &mut self.patch,
            SubMarker::Point => &mut self.point,
            SubMarker::Tick => &mut self.tick,
        }
    }
}

pub const DEFAULT_MARKER_SIZE: f64 = 500.0;
pub const DEFAULT_DENSITY: f64 = 0.1;
const DEFAULT_COLORS: PerMarker<Rgb> = PerMarker { patch: Rgb::BLACK, point: Rgb::BLACK, tick: Rgb::RED };
const DEFAULT_LINEWIDTHS: PerMarker<f64> = PerMarker { patch: 0.0, point: 0.2, tick: 0.5 };
const DEFAULT_TRANSPARENCIES: PerMarker<f64> = PerMarker { patch: 0.5, point: 1.0, tick: 1.0 };

fn defaults<T: Copy>(v: PerMarker<T>) -> PerMarker<Setting<T>> {
    PerMarker {
        patch: Setting::default_to(v.patch),
        point: Setting::default_to(v.point),
        tick: Setting::default_to(v.tick),
    }
}

fn clamp_unit(alpha: f64, what: &str) -> Result<f64> {
    if alpha.is_nan() {
        return Err(AnimError::InvalidArgument(format!(
            "{what} must be a number between 0 and 1"
        )));
    }
    Ok(alpha.clamp(0.0, 1.0))
}

/// Everything that decides how a frame looks.
#[derive(Debug, Clone, Serialize)]
pub struct PlotConfig {
    p: u32,
    which: Which,
    grouping: Grouping,
    mode: Mode,
    marker_type: Setting<MarkerType>,
    marker_size: Setting<f64>,
    marker_colors: PerMarker<Setting<Rgb>>,
    marker_linewidths: PerMarker<Setting<f64>>,
    marker_transparencies: PerMarker<Setting<f64>>,
    marker_density_x: f64,
    marker_density_y: f64,
    pf_transparency: Setting<f64>,
    colormap: Colormap,
    axes_facecolor: Rgb,
    /// (ny, nx) of the attached field; drives auto sizing.
    #[serde(skip)]
    shape: Option<(usize, usize)>,
}

impl PlotConfig {
    pub fn new(p: u32) -> Result<Self> {
        if p < 1 {
            return Err(AnimError::InvalidDegree(p));
        }
        Ok(Self {
            p,
            which: Which::PhaseField,
            grouping: Grouping::Together,
            mode: Mode::Solid,
            marker_type: Setting::default_to(MarkerType::ALL),
            marker_size: Setting::default_to(DEFAULT_MARKER_SIZE),
            marker_colors: defaults(DEFAULT_COLORS),
            marker_linewidths: defaults(DEFAULT_LINEWIDTHS),
            marker_transparencies: defaults(DEFAULT_TRANSPARENCIES),
            marker_density_x: DEFAULT_DENSITY,
            marker_density_y: DEFAULT_DENSITY,
            pf_transparency: Setting::default_to(1.0),
            colormap: Colormap::Twilight,
            axes_facecolor: Rgb::WHITESMOKE,
            shape: None,
        })
    }

    // ---- layout -------------------------------------------------------------------

    /// Leaving `pf` restores the phase field to full opacity.
    pub fn set_which(&mut self, which: Which) {
        if self.which == Which::PhaseField {
            self.pf_transparency.cascade(1.0);
        }
        if self.which == Which::Both && self.grouping == Grouping::Separate && which != Which::Both {
            self.grouping = Grouping::Together;
        }
        self.which = which;
    }

    /// Only meaningful when drawing both; ignored otherwise.
    pub fn set_grouping(&mut self, grouping: Grouping) {
        if self.which != Which::Both {
            debug!(?grouping, which = ?self.which, "grouping ignored unless which = both");
            return;
        }
        match grouping {
            Grouping::Together if self.mode.is_mapped() => self.apply_mapped_defaults(),
            Grouping::Separate => self.apply_solid_defaults(),
            Grouping::Together => {}
        }
        self.grouping = grouping;
    }

    /// Only meaningful for which = both, grouping = together; ignored otherwise.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.which != Which::Both || self.grouping != Grouping::Together {
            debug!(?mode, which = ?self.which, grouping = ?self.grouping, "mode ignored");
            return;
        }
        self.mode = mode;
        if mode.is_mapped() {
            self.apply_mapped_defaults();
        } else {
            self.apply_solid_defaults();
        }
    }

    fn apply_mapped_defaults(&mut self) {
        if self.p == 2 {
            self.marker_type.cascade(MarkerType::POINT);
        } else {
            self.marker_type.cascade(MarkerType::PATCH);
            self.marker_transparencies.patch.cascade(1.0);
        }
        self.pf_transparency.cascade(0.25);
    }

    fn apply_solid_defaults(&mut self) {
        self.marker_type.cascade(MarkerType::ALL);
        self.marker_transparencies.patch.cascade(DEFAULT_TRANSPARENCIES.patch);
        self.pf_transparency.cascade(1.0);
    }

    pub fn plot_mode(&self) -> PlotMode {
        match (self.which, self.grouping) {
            (Which::PhaseField, _) => PlotMode::PhaseFieldOnly,
            (Which::OrderParameter, _) => PlotMode::OrderParameterOnly,
            (Which::Both, Grouping::Separate) => PlotMode::BothSeparate,
            (Which::Both, Grouping::Together) => PlotMode::BothTogether(self.mode),
        }
    }

    /// Markers take their colour from the colormap (modes 1 and 2).
    pub fn markers_colormapped(&self) -> bool {
        matches!(self.plot_mode(), PlotMode::BothTogether(m) if m.is_mapped())
    }

    /// Whether `sub` is drawn with colormap colours instead of its solid colour.
    pub fn is_colormapped(&self, sub: SubMarker) -> bool {
        self.markers_colormapped()
            && match sub {
                SubMarker::Patch => true,
                SubMarker::Point => self.p <= 2,
                SubMarker::Tick => false,
            }
    }

    // ---- markers ------------------------------------------------------------------

    pub fn set_marker_type(&mut self, marker_type: MarkerType) {
        self.marker_type.set_user(marker_type);
    }

    /// The patch colour is locked to the colormap in modes 1 and 2.
    pub fn set_marker_color(&mut self, color: Rgb, sub: SubMarker) {
        if sub == SubMarker::Patch && self.is_colormapped(SubMarker::Patch) {
            debug!("patch colour follows the colormap in this mode; ignored");
            return;
        }
        self.marker_colors.get_mut(sub).set_user(color);
    }

    pub fn set_marker_size(&mut self, size: f64) -> Result<()> {
        if !size.is_finite() || size < 0.0 {
            return Err(AnimError::InvalidArgument(format!(
                "size must be a non-negative number (got {size})"
            )));
        }
        self.marker_size.set_user(size);
        Ok(())
    }

    pub fn set_marker_linewidth(&mut self, linewidth: f64, sub: SubMarker) -> Result<()> {
        if !linewidth.is_finite() || linewidth < 0.0 {
            return Err(AnimError::InvalidArgument(format!(
                "linewidth must be a non-negative number (got {linewidth})"
            )));
        }
        self.marker_linewidths.get_mut(sub).set_user(linewidth);
        Ok(())
    }

    /// Clamped to [0, 1].
    pub fn set_marker_transparency(&mut self, alpha: f64, sub: SubMarker) -> Result<()> {
        let alpha = clamp_unit(alpha, "alpha")?;
        self.marker_transparencies.get_mut(sub).set_user(alpha);
        Ok(())
    }

    /// Fraction of grid points carrying a marker, in (0, 1]; larger values clamp to 1.
    pub fn set_marker_density(&mut self, density: f64, direction: Axis) -> Result<()> {
        if !density.is_finite() || density <= 0.0 {
            return Err(AnimError::InvalidArgument(format!(
                "density must be a number in the half-open interval (0, 1] (got {density})"
            )));
        }
        let density = density.min(1.0);
        match direction {
            Axis::X => self.marker_density_x = density,
            Axis::Y => self.marker_density_y = density,
            Axis::Both => {
                self.marker_density_x = density;
                self.marker_density_y = density;
            }
        }
        self.refresh_auto_size();
        Ok(())
    }

    /// Restore marker type, colours, transparencies, linewidths and size to the defaults
    /// of the current mode.
    pub fn reset_marker_settings(&mut self) {
        self.marker_type = Setting::default_to(MarkerType::ALL);
        self.marker_size = Setting::default_to(DEFAULT_MARKER_SIZE);
        self.marker_colors = defaults(DEFAULT_COLORS);
        self.marker_linewidths = defaults(DEFAULT_LINEWIDTHS);
        self.marker_transparencies = defaults(DEFAULT_TRANSPARENCIES);

        if self.markers_colormapped() {
            self.marker_type.cascade(if self.p == 2 { MarkerType::POINT } else { MarkerType::PATCH });
            if self.p != 2 {
                self.marker_transparencies.patch.cascade(1.0);
            }
        }
        self.refresh_auto_size();
    }

    // ---- phase field appearance ---------------------------------------------------

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }

    /// Clamped to [0, 1].
    pub fn set_pf_transparency(&mut self, alpha: f64) -> Result<()> {
        let alpha = clamp_unit(alpha, "alpha")?;
        self.pf_transparency.set_user(alpha);
        Ok(())
    }

    pub fn set_axes_facecolor(&mut self, color: Rgb) {
        self.axes_facecolor = color;
    }

    // ---- field shape --------------------------------------------------------------

    /// Record the (ny, nx) of a newly attached field and re-derive marker sizes.
    pub fn set_field_shape(&mut self, ny: usize, nx: usize) {
        self.shape = Some((ny, nx));
        self.refresh_auto_size();
    }

    fn refresh_auto_size(&mut self) {
        let Some((ny, nx)) = self.shape else {
            return;
        };
        let auto = auto_marker_size(self.p, nx, ny, self.marker_density_x, self.marker_density_y);
        self.marker_size.auto(auto.size);
        if let Some(lw) = auto.line_width {
            self.marker_linewidths.point.auto(lw);
            self.marker_linewidths.tick.auto(lw);
        }
    }

    /// Marker sampling stride (x, y); (1, 1) before a field is attached.
    pub fn stride(&self) -> (usize, usize) {
        match self.shape {
            Some((ny, nx)) => (
                marker_stride(nx, self.marker_density_x),
                marker_stride(ny, self.marker_density_y),
            ),
            None => (1, 1),
        }
    }

    // ---- accessors ----------------------------------------------------------------

    pub fn p(&self) -> u32 {
        self.p
    }

    pub fn which(&self) -> Which {
        self.which
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn marker_type(&self) -> Setting<MarkerType> {
        self.marker_type
    }

    pub fn marker_size(&self) -> Setting<f64> {
        self.marker_size
    }

    pub fn marker_color(&self, sub: SubMarker) -> Setting<Rgb> {
        *self.marker_colors.get(sub)
    }

    pub fn marker_linewidth(&self, sub: SubMarker) -> Setting<f64> {
        *self.marker_linewidths.get(sub)
    }

    pub fn marker_transparency(&self, sub: SubMarker) -> Setting<f64> {
        *self.marker_transparencies.get(sub)
    }

    pub fn marker_density(&self) -> (f64, f64) {
        (self.marker_density_x, self.marker_density_y)
    }

    pub fn pf_transparency(&self) -> Setting<f64> {
        self.pf_transparency
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    pub fn axes_facecolor(&self) -> Rgb {
        self.axes_facecolor
    }
}

/// Run record written next to an animation.
#[derive(Serialize)]
pub struct RunManifest<'a> {
    pub output: String,
    pub shape: [usize; 3],
    pub complex_field: bool,
    pub x_range: Option<[f64; 2]>,
    pub y_range: Option<[f64; 2]>,
    pub fps: f64,
    pub plot: &'a PlotConfig,
}

impl RunManifest<'_> {
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
