//! Color types and color space conversions.
//!
//! Provides RGBA and HCL color representations. HCL (polar CIE-Luv) is
//! the space the default categorical palette is spaced in: equal hue steps at
//! fixed chroma and luminance give groups equal visual weight.
//!
//! # References
//!
//! - Ihaka, R. (2003). "Colour for Presentation Graphics." *Proceedings of DSC 2003*.
//! - Zeileis, A., Hornik, K., & Murrell, P. (2009). "Escaping RGBland: Selecting
//!   Colors for Statistical Graphics." *Computational Statistics & Data Analysis*.

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::new(255, 0, 0, 255);
    /// Opaque green.
    pub const GREEN: Self = Self::new(0, 255, 0, 255);
    /// Opaque blue.
    pub const BLUE: Self = Self::new(0, 0, 255, 255);
    /// Dark grey used for unmapped polygon fills.
    pub const GREY20: Self = Self::new(51, 51, 51, 255);
    /// Mid grey used for missing categories.
    pub const GREY50: Self = Self::new(127, 127, 127, 255);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Scale the alpha channel by an opacity in `[0, 1]`.
    #[must_use]
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        self.with_alpha(a)
    }

    /// Convert to array representation.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Create from array representation.
    #[must_use]
    pub const fn from_array(arr: [u8; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    /// `#RRGGBB` hex notation (alpha is dropped).
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Polar CIE-Luv color (hue, chroma, luminance), D65 white point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hcl {
    /// Hue in degrees.
    pub h: f64,
    /// Chroma (0 = grey, ~100 = saturated).
    pub c: f64,
    /// Luminance (0-100).
    pub l: f64,
}

// D65 reference white, Y normalised to 100.
const WHITE_X: f64 = 95.047;
const WHITE_Y: f64 = 100.0;
const WHITE_Z: f64 = 108.883;

impl Hcl {
    /// Create a new HCL color.
    #[must_use]
    pub const fn new(h: f64, c: f64, l: f64) -> Self {
        Self { h, c, l }
    }

    /// Convert to opaque sRGB, clamping out-of-gamut channels.
    #[must_use]
    pub fn to_rgba(self) -> Rgba {
        if self.l <= 0.0 {
            return Rgba::BLACK;
        }

        let denom = WHITE_X + 15.0 * WHITE_Y + 3.0 * WHITE_Z;
        let un = 4.0 * WHITE_X / denom;
        let vn = 9.0 * WHITE_Y / denom;

        let hue = self.h.to_radians();
        let u = self.c * hue.cos();
        let v = self.c * hue.sin();

        let y = if self.l > 8.0 {
            WHITE_Y * ((self.l + 16.0) / 116.0).powi(3)
        } else {
            WHITE_Y * self.l / 903.3
        };
        let u_prime = u / (13.0 * self.l) + un;
        let v_prime = v / (13.0 * self.l) + vn;
        let x = 9.0 * y * u_prime / (4.0 * v_prime);
        let z = y * (12.0 - 3.0 * u_prime - 20.0 * v_prime) / (4.0 * v_prime);

        let (x, y, z) = (x / 100.0, y / 100.0, z / 100.0);
        let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
        let g = -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z;
        let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;

        Rgba::rgb(srgb_channel(r), srgb_channel(g), srgb_channel(b))
    }
}

/// Gamma-encode a linear channel and quantize it to 8 bits.
fn srgb_channel(linear: f64) -> u8 {
    let encoded = if linear <= 0.003_130_8 {
        12.92 * linear
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    };
    (encoded.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl From<Hcl> for Rgba {
    fn from(hcl: Hcl) -> Self {
        hcl.to_rgba()
    }
}
