//! Colour-space conversions used by the quantizer.
//!
//! HSL components are normalised to `[0, 1]`. LAB uses the D65 white point
//! with the sRGB transfer curve; `L` is in `[0, 100]`.
use crate::types::Rgb;
use palette::white_point::D65;
use palette::{encoding, FromColor, Hsl, Lab, Srgb};

type SrgbHsl = Hsl<encoding::Srgb, f64>;
use serde::{Deserialize, Serialize};

/// Space in which k-means distances are measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Hsl,
    Lab,
}

impl ColorSpace {
    pub fn from_rgb(self, rgb: Rgb) -> [f64; 3] {
        match self {
            ColorSpace::Rgb => [rgb[0] as f64, rgb[1] as f64, rgb[2] as f64],
            ColorSpace::Hsl => rgb_to_hsl(rgb),
            ColorSpace::Lab => rgb_to_lab(rgb),
        }
    }

    pub fn to_rgb(self, v: [f64; 3]) -> Rgb {
        match self {
            ColorSpace::Rgb => [clamp_u8(v[0]), clamp_u8(v[1]), clamp_u8(v[2])],
            ColorSpace::Hsl => hsl_to_rgb(v),
            ColorSpace::Lab => lab_to_rgb(v),
        }
    }
}

#[inline]
fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Squared euclidean distance between two RGB colours.
#[inline]
pub fn rgb_distance_sq(a: Rgb, b: Rgb) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    dr * dr + dg * dg + db * db
}

#[inline]
pub fn distance_sq(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline]
fn to_srgb(rgb: Rgb) -> Srgb<f64> {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format()
}

#[inline]
fn from_srgb(c: Srgb<f64>) -> Rgb {
    [
        clamp_u8(c.red * 255.0),
        clamp_u8(c.green * 255.0),
        clamp_u8(c.blue * 255.0),
    ]
}

/// RGB to HSL with the hue folded into `[0, 1)`.
pub fn rgb_to_hsl(rgb: Rgb) -> [f64; 3] {
    let hsl = SrgbHsl::from_color(to_srgb(rgb));
    [
        hsl.hue.into_positive_degrees() / 360.0,
        hsl.saturation,
        hsl.lightness,
    ]
}

pub fn hsl_to_rgb(hsl: [f64; 3]) -> Rgb {
    let [h, s, l] = hsl;
    from_srgb(Srgb::from_color(SrgbHsl::new(h * 360.0, s, l)))
}

pub fn rgb_to_lab(rgb: Rgb) -> [f64; 3] {
    let lab: Lab<D65, f64> = Lab::from_color(to_srgb(rgb));
    let (l, a, b) = lab.into_components();
    [l, a, b]
}

pub fn lab_to_rgb(lab: [f64; 3]) -> Rgb {
    let lab: Lab<D65, f64> = Lab::new(lab[0], lab[1], lab[2]);
    from_srgb(Srgb::from_color(lab))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb, tol: i32) -> bool {
        a.iter()
            .zip(b.iter())
            .all(|(x, y)| (*x as i32 - *y as i32).abs() <= tol)
    }

    #[test]
    fn hsl_round_trip_primaries() {
        for rgb in [[255, 0, 0], [0, 128, 0], [12, 200, 99], [240, 240, 240]] {
            let back = hsl_to_rgb(rgb_to_hsl(rgb));
            assert!(close(rgb, back, 1), "{rgb:?} -> {back:?}");
        }
    }

    #[test]
    fn lab_white_and_black() {
        let white = rgb_to_lab([255, 255, 255]);
        assert!((white[0] - 100.0).abs() < 0.1, "L of white = {}", white[0]);
        let black = rgb_to_lab([0, 0, 0]);
        assert!(black[0].abs() < 1e-6);
        assert!(close(lab_to_rgb(rgb_to_lab([30, 90, 200])), [30, 90, 200], 1));
    }

    #[test]
    fn color_space_serde_names() {
        let cs: ColorSpace = serde_json::from_str("\"lab\"").expect("lab parses");
        assert_eq!(cs, ColorSpace::Lab);
    }
}
