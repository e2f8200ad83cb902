//! Grid placement of popup buttons.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridCell {
    pub row: usize,
    pub column: usize,
}

impl GridCell {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Palette buttons per row.
pub const PALETTE_COLUMNS: usize = 5;

/// Columns of a roughly square grid holding `count` buttons: `ceil(sqrt(count))`.
pub fn grid_columns(count: usize) -> usize {
    let mut columns = 1;
    while columns * columns < count {
        columns += 1;
    }
    columns
}

/// Row-major cells for `count` buttons wrapped at `columns`.
pub fn wrap_cells(count: usize, columns: usize) -> Vec<GridCell> {
    let columns = columns.max(1);
    (0..count)
        .map(|i| GridCell::new(i / columns, i % columns))
        .collect()
}

/// Cells of the connector picker.
#[derive(Clone, Debug, PartialEq)]
pub struct PickerLayout {
    pub connectors: Vec<GridCell>,
    pub create_parent: GridCell,
    pub search: GridCell,
    pub completions: GridCell,
}

/// Connector buttons fill a square grid; the side column right of a one-column
/// spacer holds the create button, the search field and its completion list.
pub fn picker_layout(count: usize) -> PickerLayout {
    let columns = grid_columns(count);
    let side = columns + 1;
    PickerLayout {
        connectors: wrap_cells(count, columns),
        create_parent: GridCell::new(0, side),
        search: GridCell::new(1, side),
        completions: GridCell::new(2, side),
    }
}
