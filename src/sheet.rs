//! Grid planning for sheets of identical labels.

use crate::error::LabelError;
use crate::units::PhysicalSize;

const FIT_EPSILON: f64 = 1e-9;

/// Top-left corner of one cell, in inches from the top-left paper corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileOrigin {
    pub row: u32,
    pub column: u32,
    pub x_in: f64,
    pub y_in: f64,
}

/// Planned grid of labels on one sheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileGrid {
    pub paper: PhysicalSize,
    pub label: PhysicalSize,
    pub margin_in: f64,
    /// Rows actually placed, after clamping.
    pub rows: u32,
    /// Columns actually placed, after clamping.
    pub columns: u32,
    pub max_rows: u32,
    pub max_columns: u32,
    /// Horizontal space between neighbouring cells.
    pub gutter_x_in: f64,
    /// Vertical space between neighbouring cells.
    pub gutter_y_in: f64,
}

impl TileGrid {
    pub fn cell_count(&self) -> u32 {
        self.rows * self.columns
    }

    pub fn origin(&self, row: u32, column: u32) -> TileOrigin {
        TileOrigin {
            row,
            column,
            x_in: self.margin_in + f64::from(column) * (self.label.width_in + self.gutter_x_in),
            y_in: self.margin_in + f64::from(row) * (self.label.height_in + self.gutter_y_in),
        }
    }

    /// Cell origins in row-major order.
    pub fn origins(&self) -> impl Iterator<Item = TileOrigin> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |col| self.origin(row, col)))
    }
}

fn capacity(paper: f64, label: f64, margin: f64) -> u32 {
    let usable = paper - 2.0 * margin;
    if usable <= 0.0 {
        return 0;
    }
    let fit = (usable / label + FIT_EPSILON).floor();
    fit.min(f64::from(u32::MAX)) as u32
}

// The margin doubles as the gutter while it fits; otherwise the gutter
// shrinks so the last cell still ends inside the far margin.
fn gutter(paper: f64, label: f64, margin: f64, count: u32) -> f64 {
    if count < 2 {
        return margin;
    }
    let usable = paper - 2.0 * margin;
    let slack = usable - f64::from(count) * label;
    let per_gap = slack / f64::from(count - 1);
    if per_gap + FIT_EPSILON >= margin {
        margin
    } else {
        per_gap.max(0.0)
    }
}

/// Plans a `rows x columns` grid of `label` on `paper` with `margin` on every
/// edge. Requests are clamped into `1..=max`; a label that cannot fit even
/// once is an error.
pub fn plan(
    paper: PhysicalSize,
    label: PhysicalSize,
    margin_in: f64,
    requested_rows: u32,
    requested_columns: u32,
) -> Result<TileGrid, LabelError> {
    if !paper.is_positive() || !label.is_positive() || !margin_in.is_finite() || margin_in < 0.0
    {
        return Err(LabelError::dimensions(
            "sheet",
            (label.width_in * 1000.0) as u32,
            (label.height_in * 1000.0) as u32,
        ));
    }

    let max_columns = capacity(paper.width_in, label.width_in, margin_in);
    if max_columns < 1 {
        return Err(LabelError::IncompatibleSizing {
            axis: "width",
            paper_in: paper.width_in,
            label_in: label.width_in,
            margin_in,
        });
    }
    let max_rows = capacity(paper.height_in, label.height_in, margin_in);
    if max_rows < 1 {
        return Err(LabelError::IncompatibleSizing {
            axis: "height",
            paper_in: paper.height_in,
            label_in: label.height_in,
            margin_in,
        });
    }

    let rows = requested_rows.clamp(1, max_rows);
    let columns = requested_columns.clamp(1, max_columns);
    if rows != requested_rows || columns != requested_columns {
        log::debug!(
            "sheet request {}x{} clamped to {}x{}",
            requested_rows,
            requested_columns,
            rows,
            columns
        );
    }

    let gutter_x_in = gutter(paper.width_in, label.width_in, margin_in, columns);
    let gutter_y_in = gutter(paper.height_in, label.height_in, margin_in, rows);
    if gutter_x_in < margin_in || gutter_y_in < margin_in {
        log::warn!(
            "sheet gutters compressed to {:.3}in x {:.3}in to fit {}x{} labels",
            gutter_x_in,
            gutter_y_in,
            rows,
            columns
        );
    }

    Ok(TileGrid {
        paper,
        label,
        margin_in,
        rows,
        columns,
        max_rows,
        max_columns,
        gutter_x_in,
        gutter_y_in,
    })
}
