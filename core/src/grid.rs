use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;

pub const DEFAULT_GRID_WIDTH: u32 = 1000;
pub const DEFAULT_GRID_HEIGHT: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Parses the `"x,y"` keys used by the bulk grid payload.
    pub fn parse_key(key: &str) -> Result<Self, GridKeyError> {
        let (x, y) = key
            .split_once(',')
            .ok_or_else(|| GridKeyError(key.to_string()))?;
        let x = x.trim().parse().map_err(|_| GridKeyError(key.to_string()))?;
        let y = y.trim().parse().map_err(|_| GridKeyError(key.to_string()))?;
        Ok(Self { x, y })
    }

    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed cell key {0:?}")]
pub struct GridKeyError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {coord} is outside the {width}x{height} grid")]
    OutOfBounds {
        coord: CellCoord,
        width: u32,
        height: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
}

impl GridDims {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    pub fn contains_cell(&self, coord: CellCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
        }
    }
}

/// Sparse cell storage. Cells that were never written read back as the
/// background color.
#[derive(Clone, Debug, Default)]
pub struct GridStore {
    dims: GridDims,
    background: Color,
    cells: HashMap<CellCoord, Color>,
}

impl GridStore {
    pub fn new(dims: GridDims) -> Self {
        Self::with_background(dims, Color::white())
    }

    pub fn with_background(dims: GridDims, background: Color) -> Self {
        Self {
            dims,
            background,
            cells: HashMap::new(),
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn background(&self) -> &Color {
        &self.background
    }

    pub fn get_pixel(&self, coord: CellCoord) -> &Color {
        self.cells.get(&coord).unwrap_or(&self.background)
    }

    pub fn is_set(&self, coord: CellCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    pub fn set_pixel(&mut self, coord: CellCoord, color: Color) -> Result<(), GridError> {
        if !self.dims.contains_cell(coord) {
            return Err(GridError::OutOfBounds {
                coord,
                width: self.dims.width,
                height: self.dims.height,
            });
        }
        self.cells.insert(coord, color);
        Ok(())
    }

    /// Replaces every cell. Entries outside the grid are dropped.
    pub fn replace(&mut self, cells: HashMap<CellCoord, Color>) {
        let dims = self.dims;
        self.cells = cells
            .into_iter()
            .filter(|(coord, _)| {
                let keep = dims.contains_cell(*coord);
                if !keep {
                    tracing::warn!(%coord, "dropping cell outside grid");
                }
                keep
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells inside the half-open window `[x0, x1) x [y0, y1)`.
    pub fn cells_in(
        &self,
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
    ) -> impl Iterator<Item = (&CellCoord, &Color)> {
        self.cells
            .iter()
            .filter(move |(coord, _)| coord.x >= x0 && coord.x < x1 && coord.y >= y0 && coord.y < y1)
    }
}

/// Converts the bulk `{"x,y": "#RRGGBB"}` payload into typed cells, skipping
/// entries that do not parse.
pub fn cells_from_wire(raw: &HashMap<String, String>) -> HashMap<CellCoord, Color> {
    let mut cells = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let coord = match CellCoord::parse_key(key) {
            Ok(coord) => coord,
            Err(err) => {
                tracing::warn!(%err, "skipping grid entry");
                continue;
            }
        };
        let color = match Color::parse(value) {
            Ok(color) => color,
            Err(err) => {
                tracing::warn!(%err, %coord, "skipping grid entry");
                continue;
            }
        };
        cells.insert(coord, color);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red() -> Color {
        Color::parse("#FF0000").unwrap()
    }

    #[test]
    fn unset_cell_reads_background() {
        let grid = GridStore::new(GridDims::default());
        assert_eq!(grid.get_pixel(CellCoord::new(3, 4)), &Color::white());
        assert!(!grid.is_set(CellCoord::new(3, 4)));
    }

    #[test]
    fn set_then_get_returns_color() {
        let mut grid = GridStore::new(GridDims::default());
        grid.set_pixel(CellCoord::new(5, 5), red()).unwrap();
        assert_eq!(grid.get_pixel(CellCoord::new(5, 5)), &red());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn rejects_out_of_bounds() {
        let mut grid = GridStore::new(GridDims { width: 10, height: 10 });
        let err = grid.set_pixel(CellCoord::new(10, 0), red()).unwrap_err();
        assert!(matches!(err, GridError::OutOfBounds { .. }));
        assert!(grid.is_empty());
    }

    #[test]
    fn parses_wire_keys() {
        assert_eq!(CellCoord::parse_key("12,34").unwrap(), CellCoord::new(12, 34));
        assert!(CellCoord::parse_key("12").is_err());
        assert!(CellCoord::parse_key("-1,3").is_err());
        assert_eq!(CellCoord::new(7, 8).key(), "7,8");
    }

    #[test]
    fn wire_conversion_skips_bad_entries() {
        let mut raw = HashMap::new();
        raw.insert("1,2".to_string(), "#00ff00".to_string());
        raw.insert("x,2".to_string(), "#00FF00".to_string());
        raw.insert("3,4".to_string(), "green".to_string());
        let cells = cells_from_wire(&raw);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[&CellCoord::new(1, 2)].as_str(), "#00FF00");
    }

    #[test]
    fn replace_drops_out_of_bounds() {
        let mut grid = GridStore::new(GridDims { width: 4, height: 4 });
        grid.set_pixel(CellCoord::new(0, 0), red()).unwrap();
        let mut cells = HashMap::new();
        cells.insert(CellCoord::new(1, 1), red());
        cells.insert(CellCoord::new(9, 9), red());
        grid.replace(cells);
        assert_eq!(grid.len(), 1);
        assert!(grid.is_set(CellCoord::new(1, 1)));
        assert!(!grid.is_set(CellCoord::new(0, 0)));
    }
}
