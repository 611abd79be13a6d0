//! Row-based layout of the thumbnail grid and the notification grid below it.
//!
//! Everything here is a pure function of the counts and the configured
//! metrics; nothing is cached between passes.

pub mod classes;

use serde::{Deserialize, Serialize};

pub use classes::{NoteColumn, SizeClass};
use crate::common::config::{Config, LayoutSettings};
use crate::sys::geometry::{Point, Rect, Size};

/// Up to this many thumbnails the content height is fixed and reserves room
/// for exactly one notification row.
pub const FIXED_HEIGHT_THUMBNAIL_LIMIT: usize = 9;

/// Grids with more rows than this no longer fit the screen and start at the
/// very top instead of being centred.
pub const MAX_CENTRED_ROWS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub thumbnail_count: usize,
    pub size_class: SizeClass,
    pub rows: usize,
    pub columns_per_row: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub first_row_start_x: f64,
    pub last_row_start_x: f64,
    pub start_y: f64,
    pub horizontal_pitch: f64,
    pub vertical_pitch: f64,
}

impl Layout {
    pub fn cell_size(&self) -> Size { Size::new(self.cell_width, self.cell_height) }

    /// Top-left corner of the `index`th cell in row-major order.
    pub fn slot(&self, index: usize) -> Point {
        let row = index / self.columns_per_row;
        let col = index % self.columns_per_row;
        let row_x = if row + 1 == self.rows {
            self.last_row_start_x
        } else {
            self.first_row_start_x
        };
        Point::new(
            row_x + col as f64 * self.horizontal_pitch,
            self.start_y + row as f64 * self.vertical_pitch,
        )
    }

    pub fn cell_rect(&self, index: usize) -> Rect { Rect::new(self.slot(index), self.cell_size()) }

    /// Bottom edge of the last thumbnail row.
    pub fn grid_bottom(&self) -> f64 {
        if self.rows == 0 {
            return self.start_y;
        }
        self.start_y + (self.rows - 1) as f64 * self.vertical_pitch + self.cell_height
    }
}

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    screen: Size,
    settings: LayoutSettings,
}

impl LayoutEngine {
    pub fn new(screen: Size, settings: LayoutSettings) -> Self { Self { screen, settings } }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.screen.size(), config.layout.clone())
    }

    pub fn screen(&self) -> Size { self.screen }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    pub fn compute_layout(&self, thumbnails: usize, notifications: usize) -> Layout {
        let s = &self.settings;
        let size_class = SizeClass::for_count(thumbnails);
        let cell = size_class.cell(s);
        let columns = size_class.columns();
        let rows = thumbnails.div_ceil(columns);

        let (column_gap, row_gap, first_x) = if size_class.has_fixed_gaps() {
            let gap = s.small_column_gap;
            (gap, s.small_row_gap, self.centred_row_x(columns, cell.width, gap))
        } else {
            let spare = self.screen.width - 2.0 * s.side_margin - columns as f64 * cell.width;
            let gap = (spare / (columns - 1) as f64).max(0.0);
            (gap, gap.min(s.small_row_gap), s.side_margin)
        };

        let last_row_cells = if rows == 0 {
            0
        } else {
            thumbnails - (rows - 1) * columns
        };
        let last_x = if last_row_cells == columns {
            first_x
        } else {
            self.centred_row_x(last_row_cells, cell.width, column_gap)
        };

        let grid_height = if rows == 0 {
            0.0
        } else {
            rows as f64 * cell.height + (rows - 1) as f64 * row_gap
        };
        let start_y = if rows > MAX_CENTRED_ROWS {
            0.0
        } else if notifications > 0 {
            let available = self.screen.height - (s.note_gap + s.note_height);
            ((available - grid_height) / 2.0).max(0.0)
        } else {
            ((self.screen.height - grid_height) / 2.0).max(s.top_margin)
        };

        Layout {
            thumbnail_count: thumbnails,
            size_class,
            rows,
            columns_per_row: columns,
            cell_width: cell.width,
            cell_height: cell.height,
            first_row_start_x: first_x,
            last_row_start_x: last_x,
            start_y,
            horizontal_pitch: cell.width + column_gap,
            vertical_pitch: cell.height + row_gap,
        }
    }

    fn centred_row_x(&self, cells: usize, cell_width: f64, gap: f64) -> f64 {
        if cells == 0 {
            return self.screen.width / 2.0;
        }
        let row_width = cells as f64 * cell_width + (cells - 1) as f64 * gap;
        (self.screen.width - row_width) / 2.0
    }

    /// Top of the notification grid, following the actual bottom edge of the
    /// thumbnail grid.
    pub fn notes_area_top(&self, layout: &Layout) -> f64 {
        if layout.rows == 0 {
            self.settings.top_margin
        } else {
            layout.grid_bottom() + self.settings.note_gap
        }
    }

    pub fn note_rows(count: usize) -> usize { count.div_ceil(2) }

    pub fn note_size(&self) -> Size { Size::new(self.settings.note_width, self.settings.note_height) }

    pub fn note_slot(&self, area_top: f64, index: usize, count: usize) -> Point {
        let s = &self.settings;
        let x = match NoteColumn::for_index(index, count) {
            NoteColumn::Left => s.note_margin,
            NoteColumn::Right => s.note_margin + s.note_width,
        };
        Point::new(x, area_top + (index / 2) as f64 * s.note_height)
    }

    /// Total scrollable height of the navigator content.
    ///
    /// Small grids always get exactly one screen; `compute_layout` already
    /// keeps one notification row free below them when there are
    /// notifications, whatever their number.
    pub fn content_height(&self, layout: &Layout, notifications: usize) -> f64 {
        let s = &self.settings;
        if layout.thumbnail_count <= FIXED_HEIGHT_THUMBNAIL_LIMIT {
            return self.screen.height;
        }
        let mut height = layout.grid_bottom();
        if notifications > 0 {
            height += s.note_gap + Self::note_rows(notifications) as f64 * s.note_height;
        }
        height
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn engine() -> LayoutEngine { LayoutEngine::from_config(&Config::default()) }

    fn cells(layout: &Layout) -> Vec<Rect> {
        (0..layout.thumbnail_count).map(|i| layout.cell_rect(i)).collect()
    }

    #[test]
    fn cells_never_overlap_and_stay_on_screen() {
        let engine = engine();
        for notes in [0, 3] {
            for count in [1, 2, 3, 4, 5, 9, 10] {
                let layout = engine.compute_layout(count, notes);
                let rects = cells(&layout);
                for (i, a) in rects.iter().enumerate() {
                    assert!(a.origin.x >= 0.0, "{count}: {a:?}");
                    assert!(a.max().x <= 800.0, "{count}: {a:?}");
                    assert!(a.origin.y >= 0.0, "{count}: {a:?}");
                    for b in &rects[i + 1..] {
                        assert!(!a.intersects(b), "{count}: {a:?} overlaps {b:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn two_thumbnails_on_800_by_480() {
        let layout = engine().compute_layout(2, 0);
        assert_eq!(layout.columns_per_row, 2);
        assert_eq!(layout.size_class, SizeClass::Pair);
        assert_eq!(layout.cell_width, 384.0);
        // Centred on the full screen height, clamped by the top margin.
        assert_eq!(layout.start_y, (480.0 - 248.0) / 2.0);
        assert_eq!(layout.horizontal_pitch, 384.0 + 16.0);

        let left = layout.cell_rect(0);
        let right = layout.cell_rect(1);
        assert_eq!(left.origin.x, 800.0 - right.max().x);
        assert_eq!(right.origin.x - left.max().x, 16.0);
        assert_eq!(left.origin.y, right.origin.y);
    }

    #[test]
    fn columns_per_count() {
        let engine = engine();
        let columns: Vec<usize> =
            (1..=7).map(|n| engine.compute_layout(n, 0).columns_per_row).collect();
        assert_eq!(columns, vec![1, 2, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn partial_last_row_is_centred_on_its_own() {
        let layout = engine().compute_layout(5, 0);
        assert_eq!(layout.first_row_start_x, 16.0);
        assert_eq!(layout.horizontal_pitch, 232.0 + 36.0);
        let last_row_width = 2.0 * 232.0 + 36.0;
        assert_eq!(layout.last_row_start_x, (800.0 - last_row_width) / 2.0);
        assert_eq!(layout.slot(3).x, layout.last_row_start_x);

        let full = engine().compute_layout(6, 0);
        assert_eq!(full.last_row_start_x, full.first_row_start_x);
    }

    #[test]
    fn odd_small_grid_centres_last_cell() {
        let layout = engine().compute_layout(3, 0);
        let last = layout.cell_rect(2);
        assert_eq!(last.mid().x, 400.0);
    }

    #[test]
    fn notifications_push_the_grid_up() {
        let engine = engine();
        let without = engine.compute_layout(4, 0);
        let with = engine.compute_layout(4, 1);
        assert!(with.start_y < without.start_y);

        let top = engine.notes_area_top(&with);
        assert_eq!(top, with.grid_bottom() + 8.0);
        assert!(top + 64.0 <= 480.0);
    }

    #[test]
    fn tall_grids_start_at_the_top() {
        let layout = engine().compute_layout(10, 0);
        assert_eq!(layout.rows, 4);
        assert_eq!(layout.start_y, 0.0);
    }

    #[test]
    fn content_height_is_fixed_for_small_grids() {
        let engine = engine();
        for notes in [0, 1, 5] {
            let layout = engine.compute_layout(9, notes);
            assert_eq!(engine.content_height(&layout, notes), 480.0);
        }
    }

    #[test]
    fn content_height_grows_with_notifications_for_large_grids() {
        let engine = engine();
        let layout = engine.compute_layout(12, 0);
        let bottom = layout.grid_bottom();
        assert_eq!(engine.content_height(&layout, 0), bottom);

        let layout = engine.compute_layout(12, 3);
        assert_eq!(engine.content_height(&layout, 3), bottom + 8.0 + 2.0 * 64.0);
    }

    #[test]
    fn notification_slots() {
        let engine = engine();
        let slots: Vec<Point> = (0..3).map(|i| engine.note_slot(100.0, i, 3)).collect();
        assert_eq!(slots, vec![
            Point::new(8.0, 100.0),
            Point::new(400.0, 100.0),
            Point::new(400.0, 164.0),
        ]);
    }
}
