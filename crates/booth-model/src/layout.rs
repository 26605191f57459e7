//! Collage layouts.
//!
//! A layout fixes how many shots a session takes and how they are arranged:
//! `rows = ceil(slot_count / columns)`, and each slot's height follows from
//! its width through the slot aspect ratio.

use serde::Serialize;
use snapbooth_common::error::{BoothError, BoothResult};

/// Per-slot aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotAspect {
    /// 1:1.
    Square,
    /// 16:9 video frame.
    Video,
    /// 3:4 portrait.
    Portrait,
    /// 4:3 classic photo.
    Classic,
}

impl SlotAspect {
    /// Slot height for a given slot width.
    pub fn height_for(self, width: f64) -> f64 {
        match self {
            SlotAspect::Square => width,
            SlotAspect::Video => width * (9.0 / 16.0),
            SlotAspect::Portrait => width * (4.0 / 3.0),
            SlotAspect::Classic => width * 0.75,
        }
    }

    /// Width over height as a rational `(w, h)`.
    pub fn ratio(self) -> (u32, u32) {
        match self {
            SlotAspect::Square => (1, 1),
            SlotAspect::Video => (16, 9),
            SlotAspect::Portrait => (3, 4),
            SlotAspect::Classic => (4, 3),
        }
    }
}

/// Layout family, which selects the composite's base width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutFamily {
    /// Narrow single-column photo strip.
    Strip,
    /// Multi-column grids and wide single-column layouts.
    Grid,
    /// A single portrait shot.
    Solo,
}

impl LayoutFamily {
    /// Base canvas width before the export scale factor is applied.
    pub fn base_width(self) -> u32 {
        match self {
            LayoutFamily::Strip => 300,
            LayoutFamily::Solo => 360,
            LayoutFamily::Grid => 500,
        }
    }
}

/// Immutable catalog entry describing a collage layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub slot_count: u32,
    pub columns: u32,
    pub aspect: SlotAspect,
    pub family: LayoutFamily,
}

impl LayoutDescriptor {
    /// Number of grid rows.
    pub fn rows(&self) -> u32 {
        self.slot_count.div_ceil(self.columns)
    }

    /// `(column, row)` of the slot at position `idx`.
    pub fn cell(&self, idx: u32) -> (u32, u32) {
        (idx % self.columns, idx / self.columns)
    }
}

/// The layout catalog.
pub const LAYOUTS: [LayoutDescriptor; 5] = [
    LayoutDescriptor {
        id: "strip-4",
        name: "Classic Strip",
        slot_count: 4,
        columns: 1,
        aspect: SlotAspect::Classic,
        family: LayoutFamily::Strip,
    },
    LayoutDescriptor {
        id: "wide-3",
        name: "Wide Trio",
        slot_count: 3,
        columns: 1,
        aspect: SlotAspect::Video,
        family: LayoutFamily::Grid,
    },
    LayoutDescriptor {
        id: "grid-4",
        name: "Quad Grid",
        slot_count: 4,
        columns: 2,
        aspect: SlotAspect::Classic,
        family: LayoutFamily::Grid,
    },
    LayoutDescriptor {
        id: "grid-6",
        name: "Six Pack",
        slot_count: 6,
        columns: 2,
        aspect: SlotAspect::Square,
        family: LayoutFamily::Grid,
    },
    LayoutDescriptor {
        id: "solo",
        name: "Solo Portrait",
        slot_count: 1,
        columns: 1,
        aspect: SlotAspect::Portrait,
        family: LayoutFamily::Solo,
    },
];

/// Layout used when nothing else is selected.
pub const DEFAULT_LAYOUT_ID: &str = "grid-4";

/// Look up a layout by id.
pub fn layout_by_id(id: &str) -> BoothResult<LayoutDescriptor> {
    LAYOUTS
        .iter()
        .find(|layout| layout.id == id)
        .copied()
        .ok_or_else(|| {
            let known: Vec<&str> = LAYOUTS.iter().map(|l| l.id).collect();
            BoothError::validation(format!(
                "unknown layout {id:?} (expected one of: {})",
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_from_slots_and_columns() {
        assert_eq!(layout_by_id("strip-4").unwrap().rows(), 4);
        assert_eq!(layout_by_id("grid-4").unwrap().rows(), 2);
        assert_eq!(layout_by_id("grid-6").unwrap().rows(), 3);
        assert_eq!(layout_by_id("solo").unwrap().rows(), 1);
    }

    #[test]
    fn test_quad_grid_cells_fill_rows_first() {
        let layout = layout_by_id("grid-4").unwrap();
        let cells: Vec<_> = (0..4).map(|i| layout.cell(i)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn test_aspect_heights() {
        assert_eq!(SlotAspect::Square.height_for(400.0), 400.0);
        assert_eq!(SlotAspect::Video.height_for(1600.0), 900.0);
        assert_eq!(SlotAspect::Portrait.height_for(300.0), 400.0);
        assert_eq!(SlotAspect::Classic.height_for(468.0), 351.0);
    }

    #[test]
    fn test_slot_counts_are_capture_options() {
        for layout in LAYOUTS {
            assert!(crate::session::SLOT_COUNT_OPTIONS.contains(&layout.slot_count));
            assert!(layout.columns >= 1);
        }
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let err = layout_by_id("mosaic-9").unwrap_err();
        assert!(err.to_string().contains("grid-4"));
    }

    #[test]
    fn test_family_base_widths() {
        assert_eq!(layout_by_id("strip-4").unwrap().family.base_width(), 300);
        assert_eq!(layout_by_id("wide-3").unwrap().family.base_width(), 500);
        assert_eq!(layout_by_id("grid-6").unwrap().family.base_width(), 500);
        assert_eq!(layout_by_id("solo").unwrap().family.base_width(), 360);
    }
}
