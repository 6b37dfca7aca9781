// src/markers.rs
//
// Order-parameter marker geometry and density-driven sizing.
//
// Marker sizes follow the scatter convention: `size` is an area in pt^2, so the marker
// radius in points is sqrt(size)/2. Pixel radius = that times dpi/72.

use std::f64::consts::TAU;

/// Sample stride along an axis with `n` points at the given marker density.
pub fn marker_stride(n: usize, density: f64) -> usize {
    let count = ((density * n as f64).floor() as usize).max(1);
    (n / count).max(1)
}

/// Sizes derived from marker density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoSize {
    pub size: f64,
    /// Point/tick linewidth override, only for p <= 2.
    pub line_width: Option<f64>,
}

/// Density-driven marker size for a grid of (ny, nx) points.
///
/// The marker count N is taken along the longer axis.
pub fn auto_marker_size(p: u32, nx: usize, ny: usize, density_x: f64, density_y: f64) -> AutoSize {
    let nmax = nx.max(ny) as f64;
    let density = if nx >= ny { density_x } else { density_y };
    let n = (density * nmax).floor() as usize;

    let (polygon_size, line_size, lw) = match n {
        0..=19 => (140.0, 140.0, 1.75),
        20..=29 => (100.0, 140.0, 1.0),
        30..=39 => (60.0, 60.0, 0.85),
        40..=49 => (30.0, 45.0, 0.85),
        _ => (20.0, 30.0, 0.85),
    };

    if p >= 3 {
        AutoSize { size: polygon_size, line_width: None }
    } else {
        AutoSize { size: line_size, line_width: Some(lw) }
    }
}

/// Marker radius in pixels for a scatter size (pt^2) at `dpi`.
pub fn marker_radius_px(size: f64, dpi: f64) -> f64 {
    0.5 * size.max(0.0).sqrt() * dpi / 72.0
}

/// Linewidth in points to pixels (at least one pixel when non-zero).
pub fn line_width_px(lw: f64, dpi: f64) -> u32 {
    if lw <= 0.0 {
        0
    } else {
        ((lw * dpi / 72.0).round() as u32).max(1)
    }
}

/// Vertex directions of a p-fold marker whose first vertex points along `angle`.
fn vertex_dirs(p: u32, angle: f64) -> impl Iterator<Item = (f64, f64)> {
    let p = p.max(1);
    (0..p).map(move |k| {
        let a = angle + TAU * k as f64 / p as f64;
        (a.cos(), a.sin())
    })
}

/// Screen offset (y grows downwards in pixel space).
fn to_px(r: f64, (c, s): (f64, f64)) -> (i32, i32) {
    ((r * c).round() as i32, (-r * s).round() as i32)
}

/// Regular p-gon outline, as pixel offsets from the marker centre.
pub fn polygon_offsets(p: u32, angle: f64, radius: f64) -> Vec<(i32, i32)> {
    vertex_dirs(p, angle).map(|d| to_px(radius, d)).collect()
}

/// Spokes of a p-armed asterisk, each from the centre to a vertex.
pub fn asterisk_offsets(p: u32, angle: f64, radius: f64) -> Vec<[(i32, i32); 2]> {
    vertex_dirs(p, angle)
        .map(|d| [(0, 0), to_px(radius, d)])
        .collect()
}

/// Single spoke along `angle`.
pub fn tick_offsets(angle: f64, radius: f64) -> [(i32, i32); 2] {
    [(0, 0), to_px(radius, (angle.cos(), angle.sin()))]
}

/// Centred arrow of length `2 * half_len` along `angle`: shaft plus two head strokes.
pub fn arrow_offsets(angle: f64, half_len: f64) -> Vec<[(i32, i32); 2]> {
    let dir = (angle.cos(), angle.sin());
    let tail = to_px(-half_len, dir);
    let tip = to_px(half_len, dir);
    let head = 0.35 * half_len;
    let left = angle + 0.85 * std::f64::consts::PI;
    let right = angle - 0.85 * std::f64::consts::PI;
    let side = |a: f64| {
        let o = to_px(head, (a.cos(), a.sin()));
        (tip.0 + o.0, tip.1 + o.1)
    };
    vec![[tail, tip], [tip, side(left)], [tip, side(right)]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn stride_follows_density() {
        assert_eq!(marker_stride(100, 0.1), 10);
        assert_eq!(marker_stride(64, 0.1), 10);
        assert_eq!(marker_stride(64, 1.0), 1);
        // fewer than one marker still samples the first point
        assert_eq!(marker_stride(5, 0.1), 5);
    }

    #[test]
    fn auto_size_table() {
        // N = 10 along x
        assert_eq!(auto_marker_size(6, 100, 50, 0.1, 0.1).size, 140.0);
        // N = 25
        assert_eq!(auto_marker_size(6, 100, 50, 0.25, 0.1).size, 100.0);
        // longer axis is y, so y density is used: N = 45
        assert_eq!(auto_marker_size(4, 10, 100, 0.9, 0.45).size, 30.0);
        // p <= 2 also gets linewidths
        let a = auto_marker_size(2, 200, 200, 0.05, 0.05);
        assert_eq!(a, AutoSize { size: 140.0, line_width: Some(1.75) });
        let a = auto_marker_size(1, 100, 100, 0.7, 0.7);
        assert_eq!(a, AutoSize { size: 30.0, line_width: Some(0.85) });
    }

    #[test]
    fn radius_scales_with_dpi() {
        assert!((marker_radius_px(144.0, 72.0) - 6.0).abs() < 1e-12);
        assert!((marker_radius_px(144.0, 144.0) - 12.0).abs() < 1e-12);
        assert_eq!(line_width_px(0.0, 100.0), 0);
        assert_eq!(line_width_px(0.2, 100.0), 1);
        assert_eq!(line_width_px(1.8, 80.0), 2);
    }

    #[test]
    fn polygon_first_vertex_points_along_angle() {
        let v = polygon_offsets(4, 0.0, 10.0);
        assert_eq!(v, vec![(10, 0), (0, -10), (-10, 0), (0, 10)]);

        let v = polygon_offsets(3, FRAC_PI_2, 10.0);
        assert_eq!(v[0], (0, -10));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn nematic_asterisk_is_a_line_through_the_centre() {
        let spokes = asterisk_offsets(2, 0.0, 8.0);
        assert_eq!(spokes.len(), 2);
        assert_eq!(spokes[0][1], (8, 0));
        assert_eq!(spokes[1][1], (-8, 0));
        assert_eq!(tick_offsets(FRAC_PI_2, 5.0), [(0, 0), (0, -5)]);
    }

    #[test]
    fn arrow_is_centred() {
        let a = arrow_offsets(0.0, 10.0);
        assert_eq!(a[0], [(-10, 0), (10, 0)]);
        assert!(a[1][1].0 < 10 && a[2][1].0 < 10);
    }
}
