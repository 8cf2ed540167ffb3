//! Calibration fiducials and the safe working area of a page.
//!
//! Everything here is a pure function of [`CornerMarkConfig`] and the page
//! size. Values are taken as given, negative ones included.

use crate::model::{PageSetup, Point, RectF};
use serde::{Deserialize, Serialize};

/// Side length of a printed fiducial square.
pub const CORNER_MARK_SIZE: f32 = 20.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CornerMarkConfig {
    pub safe_zone_margin: f32,
    pub safe_zone_padding: f32,
    pub is_visible: bool,
}

impl Default for CornerMarkConfig {
    fn default() -> Self {
        Self {
            safe_zone_margin: 17.0,
            safe_zone_padding: 10.0,
            is_visible: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CornerMark {
    pub corner: Corner,
    /// Outer corner of the mark, `margin` away from both adjacent page edges.
    pub anchor: Point,
    pub rect: RectF,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationOverlay {
    pub marks: [CornerMark; 4],
    pub safe_zone: RectF,
}

impl CornerMarkConfig {
    pub fn total_safe_zone_margin(&self) -> f32 {
        self.safe_zone_margin + self.safe_zone_padding
    }

    /// `None` when hidden: no marks, no boundary, nothing to lay out.
    pub fn layout(&self, page: PageSetup) -> Option<CalibrationOverlay> {
        if !self.is_visible {
            return None;
        }
        let m = self.safe_zone_margin;
        let marks = Corner::ALL.map(|corner| {
            let (anchor, min) = match corner {
                Corner::TopLeft => (Point::new(m, m), Point::new(m, m)),
                Corner::TopRight => (
                    Point::new(page.width - m, m),
                    Point::new(page.width - m - CORNER_MARK_SIZE, m),
                ),
                Corner::BottomLeft => (
                    Point::new(m, page.height - m),
                    Point::new(m, page.height - m - CORNER_MARK_SIZE),
                ),
                Corner::BottomRight => (
                    Point::new(page.width - m, page.height - m),
                    Point::new(
                        page.width - m - CORNER_MARK_SIZE,
                        page.height - m - CORNER_MARK_SIZE,
                    ),
                ),
            };
            CornerMark {
                corner,
                anchor,
                rect: RectF::from_min_size(min, CORNER_MARK_SIZE, CORNER_MARK_SIZE),
            }
        });
        let t = self.total_safe_zone_margin();
        let safe_zone = RectF {
            min: Point::new(t, t),
            max: Point::new(page.width - t, page.height - t),
        };
        Some(CalibrationOverlay { marks, safe_zone })
    }
}

/// Whether `rect` lies fully inside the safe zone, or `true` when marks are hidden.
pub fn within_safe_zone(config: &CornerMarkConfig, page: PageSetup, rect: RectF) -> bool {
    match config.layout(page) {
        Some(overlay) => overlay.safe_zone.contains(rect.min) && overlay.safe_zone.contains(rect.max),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edge_distances(p: Point, page: PageSetup) -> (f32, f32) {
        let dx = p.x.min(page.width - p.x);
        let dy = p.y.min(page.height - p.y);
        (dx, dy)
    }

    #[test]
    fn defaults_match_printed_sheet() {
        let c = CornerMarkConfig::default();
        assert_eq!(c.safe_zone_margin, 17.0);
        assert_eq!(c.safe_zone_padding, 10.0);
        assert!(c.is_visible);
        assert_eq!(c.total_safe_zone_margin(), 27.0);
    }

    #[test]
    fn marks_are_symmetric_at_margin() {
        let page = PageSetup::default();
        for (m, p) in [(17.0, 10.0), (0.0, 0.0), (40.0, 3.5)] {
            let config = CornerMarkConfig {
                safe_zone_margin: m,
                safe_zone_padding: p,
                is_visible: true,
            };
            let overlay = config.layout(page).unwrap();
            for mark in overlay.marks {
                assert_eq!(edge_distances(mark.anchor, page), (m, m));
                assert!(mark.rect.contains(mark.anchor));
            }
            let z = overlay.safe_zone;
            assert_eq!(z.min, Point::new(m + p, m + p));
            assert_eq!(page.width - z.max.x, m + p);
            assert_eq!(page.height - z.max.y, m + p);
        }
    }

    #[test]
    fn marks_extend_inward_from_anchor() {
        let page = PageSetup::default();
        let overlay = CornerMarkConfig::default().layout(page).unwrap();
        let [tl, tr, bl, br] = overlay.marks;
        assert_eq!(tl.rect.min, tl.anchor);
        assert_eq!(tr.rect.max.x, tr.anchor.x);
        assert_eq!(tr.rect.min.y, tr.anchor.y);
        assert_eq!(bl.rect.min.x, bl.anchor.x);
        assert_eq!(bl.rect.max.y, bl.anchor.y);
        assert_eq!(br.rect.max, br.anchor);
    }

    #[test]
    fn hidden_overlay_is_a_no_op() {
        for m in [-5.0, 0.0, 17.0] {
            let config = CornerMarkConfig {
                safe_zone_margin: m,
                safe_zone_padding: 10.0,
                is_visible: false,
            };
            assert_eq!(config.layout(PageSetup::default()), None);
        }
    }

    #[test]
    fn layout_is_idempotent_and_accepts_negative_values() {
        let config = CornerMarkConfig {
            safe_zone_margin: -4.0,
            safe_zone_padding: -1.0,
            is_visible: true,
        };
        let page = PageSetup::default();
        let a = config.layout(page);
        let b = config.layout(page);
        assert_eq!(a, b);
        assert_eq!(a.unwrap().safe_zone.min, Point::new(-5.0, -5.0));
    }

    #[test]
    fn safe_zone_containment() {
        let config = CornerMarkConfig::default();
        let page = PageSetup::default();
        let inside = RectF::from_min_size(Point::new(30.0, 30.0), 100.0, 40.0);
        let outside = RectF::from_min_size(Point::new(5.0, 30.0), 100.0, 40.0);
        assert!(within_safe_zone(&config, page, inside));
        assert!(!within_safe_zone(&config, page, outside));

        let hidden = CornerMarkConfig {
            is_visible: false,
            ..config
        };
        assert!(within_safe_zone(&hidden, page, outside));
    }
}
