//! Baseline-relative field placement.
//!
//! Fields on logical page 1 are positioned relative to the content baseline,
//! which is only known after the title and content have been drawn. Fields on
//! later pages carry absolute coordinates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum Placement {
    /// Offset from the content baseline (negative is below it).
    Relative(f32),
    /// Absolute y in page coordinates.
    Absolute(f32),
}

impl Placement {
    /// Tag a raw schema y by the logical page it belongs to.
    pub fn for_page(logical_page: u32, y: f32) -> Self {
        if logical_page <= 1 {
            Placement::Relative(y)
        } else {
            Placement::Absolute(y)
        }
    }

    pub fn resolve(&self, baseline: f32) -> f32 {
        match *self {
            Placement::Relative(dy) => baseline + dy,
            Placement::Absolute(y) => y,
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Placement::Relative(_))
    }

    /// Absolute y, if already resolved.
    pub fn absolute(&self) -> Option<f32> {
        match *self {
            Placement::Absolute(y) => Some(y),
            Placement::Relative(_) => None,
        }
    }
}

/// Anything that carries a `Placement`.
pub trait Placed {
    fn placement_mut(&mut self) -> &mut Placement;
}

/// Rewrite every relative placement as `baseline + offset`. Absolute ones are
/// untouched.
pub fn adjust_field_positions<T: Placed>(fields: &mut [T], baseline: f32) {
    for field in fields {
        let placement = field.placement_mut();
        *placement = Placement::Absolute(placement.resolve(baseline));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe(Placement);

    impl Placed for Probe {
        fn placement_mut(&mut self) -> &mut Placement {
            &mut self.0
        }
    }

    #[test]
    fn page_one_is_relative_others_absolute() {
        assert_eq!(Placement::for_page(1, -50.0), Placement::Relative(-50.0));
        assert_eq!(Placement::for_page(2, 600.0), Placement::Absolute(600.0));
    }

    #[test]
    fn baseline_is_added_to_relative_only() {
        let mut fields = vec![
            Probe(Placement::for_page(1, -50.0)),
            Probe(Placement::for_page(2, 640.0)),
        ];
        adjust_field_positions(&mut fields, 700.0);
        assert_eq!(fields[0].0, Placement::Absolute(650.0));
        assert_eq!(fields[1].0, Placement::Absolute(640.0));
    }

    #[test]
    fn adjusting_twice_is_stable() {
        let mut fields = vec![Probe(Placement::Relative(-10.0))];
        adjust_field_positions(&mut fields, 500.0);
        adjust_field_positions(&mut fields, 300.0);
        assert_eq!(fields[0].0.absolute(), Some(490.0));
    }
}
