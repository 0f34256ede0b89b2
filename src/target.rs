//! Transient clickable targets (drops / cans) and their placement on the
//! play surface.

use rand::Rng;

/// Keep targets this far from the surface edges.
pub const EDGE_PADDING: f64 = 10.0;
/// Horizontal space reserved for the target footprint.
pub const FOOTPRINT_W: f64 = 40.0;
/// Vertical space reserved for the target footprint (extra room at the bottom).
pub const FOOTPRINT_H: f64 = 80.0;

/// Unclicked drops disappear after this long.
pub const DROP_LIFETIME_MS: u32 = 2_600;
/// Unclicked cans disappear after this long.
pub const CAN_LIFETIME_MS: u32 = 2_000;

/// Chance that a freshly spawned can is a good one.
pub const GOOD_CAN_CHANCE: f64 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TargetId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TargetKind {
    Drop,
    GoodCan,
    BadCan,
}

impl TargetKind {
    /// CSS class used by the page for this kind.
    pub fn css_class(self) -> &'static str {
        match self {
            TargetKind::Drop => "drop",
            TargetKind::GoodCan => "can good",
            TargetKind::BadCan => "can bad",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Target {
    pub id: TargetId,
    pub kind: TargetKind,
    pub x: f64,
    pub y: f64,
    pub spawned_ms: f64,
    pub lifetime_ms: u32,
}

impl Target {
    pub fn expires_at_ms(&self) -> f64 {
        self.spawned_ms + self.lifetime_ms as f64
    }
}

/// Size of the play surface in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Uniformly random top-left position that keeps a target inside the
    /// padded area. Surfaces too small for the footprint pin to the padding.
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let span_x = (self.width - FOOTPRINT_W - EDGE_PADDING).max(0.0);
        let span_y = (self.height - FOOTPRINT_H - EDGE_PADDING).max(0.0);
        (
            sample(rng, span_x) + EDGE_PADDING,
            sample(rng, span_y) + EDGE_PADDING,
        )
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, span: f64) -> f64 {
    if span > 0.0 { rng.gen_range(0.0..span) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn positions_stay_inside_padded_area() {
        let mut rng = StdRng::seed_from_u64(7);
        let b = Bounds::new(600.0, 400.0);
        for _ in 0..500 {
            let (x, y) = b.random_position(&mut rng);
            assert!((EDGE_PADDING..600.0 - FOOTPRINT_W).contains(&x), "x={x}");
            assert!((EDGE_PADDING..400.0 - FOOTPRINT_H).contains(&y), "y={y}");
        }
    }

    #[test]
    fn tiny_surface_pins_to_padding() {
        let mut rng = StdRng::seed_from_u64(1);
        let (x, y) = Bounds::new(20.0, 20.0).random_position(&mut rng);
        assert_eq!((x, y), (EDGE_PADDING, EDGE_PADDING));
    }

    #[test]
    fn expiry_is_spawn_plus_lifetime() {
        let t = Target {
            id: TargetId(1),
            kind: TargetKind::Drop,
            x: 0.0,
            y: 0.0,
            spawned_ms: 1_000.0,
            lifetime_ms: DROP_LIFETIME_MS,
        };
        assert_eq!(t.expires_at_ms(), 3_600.0);
        assert_eq!(TargetKind::BadCan.css_class(), "can bad");
    }
}
