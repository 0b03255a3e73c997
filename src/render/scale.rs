//! Sequential colour scales for the choropleth.

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` notation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Parses `#rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

const REDS: [Rgb; 9] = [
    Rgb(255, 245, 240),
    Rgb(254, 224, 210),
    Rgb(252, 187, 161),
    Rgb(252, 146, 114),
    Rgb(251, 106, 74),
    Rgb(239, 59, 44),
    Rgb(203, 24, 29),
    Rgb(165, 15, 21),
    Rgb(103, 0, 13),
];

const BLUES: [Rgb; 9] = [
    Rgb(247, 251, 255),
    Rgb(222, 235, 247),
    Rgb(198, 219, 239),
    Rgb(158, 202, 225),
    Rgb(107, 174, 214),
    Rgb(66, 146, 198),
    Rgb(33, 113, 181),
    Rgb(8, 81, 156),
    Rgb(8, 48, 107),
];

const GREENS: [Rgb; 9] = [
    Rgb(247, 252, 245),
    Rgb(229, 245, 224),
    Rgb(199, 233, 192),
    Rgb(161, 217, 155),
    Rgb(116, 196, 118),
    Rgb(65, 171, 93),
    Rgb(35, 139, 69),
    Rgb(0, 109, 44),
    Rgb(0, 68, 27),
];

/// Light-to-dark sequential scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorScale {
    #[default]
    Reds,
    Blues,
    Greens,
}

impl ColorScale {
    /// Names accepted by [`from_name`](Self::from_name).
    pub const NAMES: &[&str] = &["reds", "blues", "greens"];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "reds" => Some(Self::Reds),
            "blues" => Some(Self::Blues),
            "greens" => Some(Self::Greens),
            _ => None,
        }
    }

    /// Colour stops from lightest to darkest.
    pub fn stops(self) -> &'static [Rgb] {
        match self {
            Self::Reds => &REDS,
            Self::Blues => &BLUES,
            Self::Greens => &GREENS,
        }
    }

    /// Colour at `t` in `[0, 1]`; values outside are clamped.
    pub fn color_at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let pos = t * (stops.len() - 1) as f64;
        let i = (pos.floor() as usize).min(stops.len() - 2);
        stops[i].lerp(stops[i + 1], pos - i as f64)
    }

    /// Colour for `value` on a scale from 0 to `max`.
    pub fn color_for(self, value: f64, max: f64) -> Rgb {
        if max > 0.0 {
            self.color_at(value / max)
        } else {
            self.color_at(0.0)
        }
    }
}
