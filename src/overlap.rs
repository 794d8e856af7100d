//! Post-hoc overlap scan over the geometry recorded while drawing.

use log::warn;
use serde::Serialize;

/// Axis-aligned box in page coordinates. `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.top()
            && other.y < self.top()
    }
}

/// One drawn region, kept only for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnElement {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
}

impl DrawnElement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapDiagnostic {
    pub page: usize,
    pub first: String,
    pub second: String,
}

/// Report every intersecting pair of elements on the same physical page.
pub fn detect_overlaps(elements: &[DrawnElement]) -> Vec<OverlapDiagnostic> {
    let mut pages: Vec<usize> = elements.iter().map(|e| e.page).collect();
    pages.sort_unstable();
    pages.dedup();

    let mut diagnostics = Vec::new();
    for page in pages {
        let on_page: Vec<&DrawnElement> = elements.iter().filter(|e| e.page == page).collect();
        for (i, a) in on_page.iter().enumerate() {
            for b in &on_page[i + 1..] {
                if a.rect().intersects(&b.rect()) {
                    warn!("Overlap on page {}: '{}' and '{}'", page, a.label, b.label);
                    diagnostics.push(OverlapDiagnostic {
                        page,
                        first: a.label.clone(),
                        second: b.label.clone(),
                    });
                }
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(page: usize, x: f32, y: f32, w: f32, h: f32, label: &str) -> DrawnElement {
        DrawnElement { page, x, y, width: w, height: h, label: label.to_string() }
    }

    #[test]
    fn overlapping_pair_is_reported() {
        let elements = vec![
            element(0, 50.0, 600.0, 200.0, 20.0, "name"),
            element(0, 100.0, 610.0, 200.0, 20.0, "email"),
        ];
        let found = detect_overlaps(&elements);
        assert_eq!(
            found,
            vec![OverlapDiagnostic { page: 0, first: "name".into(), second: "email".into() }]
        );
    }

    #[test]
    fn separate_boxes_are_clean() {
        let elements = vec![
            element(0, 50.0, 600.0, 200.0, 20.0, "name"),
            element(0, 50.0, 560.0, 200.0, 20.0, "email"),
            // touching edge only
            element(0, 250.0, 600.0, 50.0, 20.0, "age"),
        ];
        assert!(detect_overlaps(&elements).is_empty());
    }

    #[test]
    fn pages_are_checked_independently() {
        let elements = vec![
            element(0, 50.0, 600.0, 200.0, 20.0, "a"),
            element(1, 50.0, 600.0, 200.0, 20.0, "b"),
        ];
        assert!(detect_overlaps(&elements).is_empty());
    }
}
