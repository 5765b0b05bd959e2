//! Per-vertex color.

/// RGB color with 8-bit components, as stored in PLY `red/green/blue` properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexColor {
    /// Red component.
    pub r: u8,
    /// Green component.
    pub g: u8,
    /// Blue component.
    pub b: u8,
}

impl VertexColor {
    /// Create a color from its components.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Deterministic, well-separated color for the `index`-th label.
    ///
    /// Hues are spread with the golden angle so neighboring labels differ
    /// strongly; used to paint plane clusters for inspection.
    ///
    /// ```
    /// use mesh_types::VertexColor;
    ///
    /// assert_ne!(VertexColor::from_label(0), VertexColor::from_label(1));
    /// assert_eq!(VertexColor::from_label(7), VertexColor::from_label(7));
    /// ```
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    // Casts: hue math stays in [0, 255] after clamping
    pub fn from_label(index: usize) -> Self {
        const GOLDEN_ANGLE: f64 = 137.507_764;
        let hue = (index as f64 * GOLDEN_ANGLE) % 360.0;
        let sector = hue / 60.0;
        let x = 1.0 - (sector % 2.0 - 1.0).abs();
        let (r, g, b) = match sector as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let to_u8 = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Neutral gray used for unlabeled vertices.
    pub const GRAY: Self = Self::new(128, 128, 128);
}
