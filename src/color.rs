// src/color.rs
//
// Colour names and colormaps used for the phase field and the order-parameter markers.

use std::str::FromStr;

use plotters::style::RGBColor;
use serde::Serialize;

use crate::error::{AnimError, Result};

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const WHITESMOKE: Rgb = Rgb(245, 245, 245);

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    /// Composite `self` with opacity `alpha` over `bg`.
    pub fn over(self, bg: Rgb, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |f: u8, b: u8| (a * f as f64 + (1.0 - a) * b as f64).round() as u8;
        Rgb(mix(self.0, bg.0), mix(self.1, bg.1), mix(self.2, bg.2))
    }
}

impl FromStr for Rgb {
    type Err = AnimError;

    /// Single-letter codes, common names, or `#rrggbb`.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if let Some(hex) = name.strip_prefix('#') {
            if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                let byte = |k: usize| u8::from_str_radix(&hex[k..k + 2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (byte(0), byte(2), byte(4)) {
                    return Ok(Rgb(r, g, b));
                }
            }
            return Err(AnimError::InvalidArgument(format!("malformed hex colour '{s}'")));
        }

        let c = match name.as_str() {
            "k" | "black" => Rgb::BLACK,
            "w" | "white" => Rgb(255, 255, 255),
            "r" | "red" => Rgb::RED,
            "g" | "green" => Rgb(0, 128, 0),
            "b" | "blue" => Rgb(0, 0, 255),
            "c" | "cyan" => Rgb(0, 191, 191),
            "m" | "magenta" => Rgb(191, 0, 191),
            "y" | "yellow" => Rgb(191, 191, 0),
            "orange" => Rgb(255, 165, 0),
            "gray" | "grey" => Rgb(128, 128, 128),
            "lightgray" | "lightgrey" => Rgb(211, 211, 211),
            "whitesmoke" => Rgb::WHITESMOKE,
            _ => {
                return Err(AnimError::InvalidArgument(format!("unknown colour '{s}'")));
            }
        };
        Ok(c)
    }
}

/// Named colormaps, sampled by piecewise-linear interpolation between anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Cyclic: white → blue → black → red → white.
    Twilight,
    Viridis,
    /// Cyclic hue wheel.
    Hsv,
    /// Blue–white–red.
    Bwr,
    Greys,
}

const TWILIGHT: &[(u8, u8, u8)] = &[
    (226, 217, 226),
    (159, 183, 199),
    (102, 132, 189),
    (94, 67, 165),
    (47, 20, 51),
    (122, 43, 86),
    (178, 96, 84),
    (206, 164, 143),
    (226, 217, 226),
];

const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (71, 45, 123),
    (59, 82, 139),
    (44, 114, 142),
    (33, 145, 140),
    (40, 174, 128),
    (94, 201, 98),
    (173, 220, 48),
    (253, 231, 37),
];

const HSV: &[(u8, u8, u8)] = &[
    (255, 0, 0),
    (255, 255, 0),
    (0, 255, 0),
    (0, 255, 255),
    (0, 0, 255),
    (255, 0, 255),
    (255, 0, 0),
];

const BWR: &[(u8, u8, u8)] = &[(0, 0, 255), (255, 255, 255), (255, 0, 0)];

const GREYS: &[(u8, u8, u8)] = &[(255, 255, 255), (0, 0, 0)];

impl Colormap {
    fn anchors(self) -> &'static [(u8, u8, u8)] {
        match self {
            Colormap::Twilight => TWILIGHT,
            Colormap::Viridis => VIRIDIS,
            Colormap::Hsv => HSV,
            Colormap::Bwr => BWR,
            Colormap::Greys => GREYS,
        }
    }

    /// Colour at position `t` in [0, 1] (clamped; NaN maps to 0).
    pub fn sample(self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let a = self.anchors();
        let pos = t * (a.len() - 1) as f64;
        let k = (pos.floor() as usize).min(a.len() - 2);
        let s = pos - k as f64;
        let lerp = |x: u8, y: u8| (x as f64 + s * (y as f64 - x as f64)).round() as u8;
        let (c0, c1) = (a[k], a[k + 1]);
        Rgb(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2))
    }

    /// Colour of `v` normalised against [lo, hi]; a degenerate range maps to the midpoint.
    pub fn map(self, v: f64, lo: f64, hi: f64) -> Rgb {
        if !(hi - lo).is_finite() || (hi - lo).abs() < 1e-12 {
            return self.sample(0.5);
        }
        self.sample((v - lo) / (hi - lo))
    }
}

impl FromStr for Colormap {
    type Err = AnimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twilight" => Ok(Colormap::Twilight),
            "viridis" => Ok(Colormap::Viridis),
            "hsv" => Ok(Colormap::Hsv),
            "bwr" | "coolwarm" => Ok(Colormap::Bwr),
            "greys" | "grays" | "gray" => Ok(Colormap::Greys),
            _ => Err(AnimError::InvalidArgument(format!("unknown colormap '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_names_and_hex() {
        assert_eq!("k".parse::<Rgb>().unwrap(), Rgb::BLACK);
        assert_eq!("Red".parse::<Rgb>().unwrap(), Rgb::RED);
        assert_eq!("#10ff0a".parse::<Rgb>().unwrap(), Rgb(16, 255, 10));
        assert!("#12345".parse::<Rgb>().is_err());
        // six bytes but not six ASCII digits
        assert!("#aééb".parse::<Rgb>().is_err());
        assert!("#12345g".parse::<Rgb>().is_err());
        assert!("chartreuse-ish".parse::<Rgb>().is_err());
    }

    #[test]
    fn cyclic_maps_wrap_to_the_same_colour() {
        assert_eq!(Colormap::Twilight.sample(0.0), Colormap::Twilight.sample(1.0));
        assert_eq!(Colormap::Hsv.sample(0.0), Colormap::Hsv.sample(1.0));
    }

    #[test]
    fn bwr_midpoint_is_white_and_ends_are_pure() {
        assert_eq!(Colormap::Bwr.sample(0.5), Rgb(255, 255, 255));
        assert_eq!(Colormap::Bwr.map(-3.0, -3.0, 3.0), Rgb(0, 0, 255));
        assert_eq!(Colormap::Bwr.map(10.0, -3.0, 3.0), Rgb(255, 0, 0));
        assert_eq!(Colormap::Bwr.map(1.0, 1.0, 1.0), Rgb(255, 255, 255));
    }

    #[test]
    fn alpha_compositing() {
        assert_eq!(Rgb::BLACK.over(Rgb(255, 255, 255), 0.0), Rgb(255, 255, 255));
        assert_eq!(Rgb::BLACK.over(Rgb(255, 255, 255), 1.0), Rgb::BLACK);
        assert_eq!(Rgb::BLACK.over(Rgb(200, 100, 0), 0.5), Rgb(100, 50, 0));
    }

    #[test]
    fn colormap_names() {
        assert_eq!("twilight".parse::<Colormap>().unwrap(), Colormap::Twilight);
        assert_eq!("coolwarm".parse::<Colormap>().unwrap(), Colormap::Bwr);
        assert!("jet".parse::<Colormap>().is_err());
    }
}
