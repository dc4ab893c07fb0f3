use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;

// ---------------------------------------------------------------------------
// Color params
// ---------------------------------------------------------------------------

/// Fixed constants of the escape-count → HSV mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorParams {
    /// Added to every hue before clamping.
    #[serde(default)]
    pub hue_shift: f64,
    /// Width of the hue domain. 180 matches half-degree hue storage.
    #[serde(default = "default_hue_range")]
    pub hue_range: f64,
    /// Brightness gain applied to the escape ratio.
    #[serde(default = "default_value_scale")]
    pub value_scale: f64,
}

fn default_hue_range() -> f64 {
    180.0
}

fn default_value_scale() -> f64 {
    8.0
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            hue_shift: 0.0,
            hue_range: default_hue_range(),
            value_scale: default_value_scale(),
        }
    }
}

// ---------------------------------------------------------------------------
// HSV pixel
// ---------------------------------------------------------------------------

/// One stored pixel: hue on `[0, hue_range]`, saturation and value on
/// `[0, T::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv<T> {
    pub hue: T,
    pub saturation: T,
    pub value: T,
}

impl<T: Channel> Hsv<T> {
    /// Convert to RGB with components on `[0, 1]`.
    pub fn to_rgb_unit(&self, hue_range: f64) -> [f64; 3] {
        let h = if hue_range > 0.0 {
            (self.hue.to_f64() / hue_range * 360.0).rem_euclid(360.0)
        } else {
            0.0
        };
        let s = self.saturation.to_unit();
        let v = self.value.to_unit();

        let c = v * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - c;
        let (r, g, b) = if h < 60.0 {
            (c, x, 0.0)
        } else if h < 120.0 {
            (x, c, 0.0)
        } else if h < 180.0 {
            (0.0, c, x)
        } else if h < 240.0 {
            (0.0, x, c)
        } else if h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };
        [r + m, g + m, b + m]
    }

    /// Convert to 8-bit RGB.
    pub fn to_rgb8(&self, hue_range: f64) -> [u8; 3] {
        self.to_rgb_unit(hue_range)
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

// ---------------------------------------------------------------------------
// Color mapping
// ---------------------------------------------------------------------------

/// Map an escape count to a stored pixel.
///
/// Pure: depends only on its arguments. Set members (`iterations == 0`) get
/// ratio 0 and therefore value 0.
#[inline]
pub fn color<T: Channel>(iterations: u32, max_iter: u32, params: &ColorParams) -> Hsv<T> {
    let depth = T::depth();
    let ratio = if iterations == 0 || max_iter == 0 {
        0.0
    } else {
        iterations as f64 / max_iter as f64
    };
    let hue = (params.hue_shift + ratio * (params.hue_range - 1.0)).clamp(0.0, params.hue_range);
    let value = (params.value_scale * ratio * depth).clamp(0.0, depth);
    Hsv {
        hue: T::from_f64(hue),
        saturation: T::MAX,
        value: T::from_f64(value),
    }
}

/// Color every count of a step in parallel.
pub fn colorize<T: Channel>(counts: &[u32], max_iter: u32, params: &ColorParams) -> Vec<Hsv<T>> {
    counts
        .par_iter()
        .map(|&n| color(n, max_iter, params))
        .collect()
}
