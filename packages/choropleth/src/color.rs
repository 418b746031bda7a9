//! Colour scale for predicted damage.

use serde::Serialize;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn lerp(self, other: Self, t: f64) -> Self {
        let channel = |a: u8, b: u8| {
            let (a, b) = (f64::from(a), f64::from(b));
            (b - a).mul_add(t, a).round().clamp(0.0, 255.0) as u8
        };
        Self(
            channel(self.0, other.0),
            channel(self.1, other.1),
            channel(self.2, other.2),
        )
    }
}

/// Six-class ColorBrewer `Spectral`, low to high.
pub const SPECTRAL: [Rgb; 6] = [
    Rgb(0xd5, 0x3e, 0x4f),
    Rgb(0xfc, 0x8d, 0x59),
    Rgb(0xfe, 0xe0, 0x8b),
    Rgb(0xe6, 0xf5, 0x98),
    Rgb(0x99, 0xd5, 0x94),
    Rgb(0x32, 0x88, 0xbd),
];

/// Number of legend bins.
pub const LEGEND_BINS: usize = 6;

/// One legend entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendBin {
    /// Lower bound in dollars.
    pub lower: f64,
    /// Upper bound in dollars.
    pub upper: f64,
    /// Colour at the bin midpoint.
    pub color: String,
}

/// Maps dollar amounts onto the [`SPECTRAL`] ramp between a minimum and a
/// maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Creates a scale spanning the finite values in `values`. With no
    /// finite values the scale is degenerate at zero.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 0.0));
        Self { min, max }
    }

    /// Smallest value on the scale.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Largest value on the scale.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Position of `value` on the ramp, in `[0, 1]`. A degenerate range
    /// maps everything to the midpoint.
    #[must_use]
    pub fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 || !span.is_finite() {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Interpolated colour for `value`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn color(&self, value: f64) -> Rgb {
        let segments = (SPECTRAL.len() - 1) as f64;
        let scaled = self.position(value) * segments;
        let index = (scaled.floor() as usize).min(SPECTRAL.len() - 2);
        let t = scaled - index as f64;
        SPECTRAL[index].lerp(SPECTRAL[index + 1], t)
    }

    /// Equal-width legend bins from minimum to maximum.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn legend(&self) -> Vec<LegendBin> {
        let width = (self.max - self.min) / LEGEND_BINS as f64;
        (0..LEGEND_BINS)
            .map(|i| {
                let lower = (i as f64).mul_add(width, self.min);
                let upper = if i + 1 == LEGEND_BINS {
                    self.max
                } else {
                    lower + width
                };
                LegendBin {
                    lower,
                    upper,
                    color: self.color((lower + upper) / 2.0).to_hex(),
                }
            })
            .collect()
    }
}
