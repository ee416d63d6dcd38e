use crate::errors::{Error, Result};
use crate::model::CellValue;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// The authoritative cell store the snapshot is loaded from and mutations
/// are written back to. Coordinates are 1-indexed, matching native
/// spreadsheet addressing.
pub trait SheetSurface {
    fn sheet_names(&self) -> Vec<String>;
    fn read_used_range(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>>;
    fn write_cell(&mut self, sheet: &str, row: u32, col: u32, value: &CellValue) -> Result<()>;
    fn write_block(
        &mut self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: &[Vec<CellValue>],
    ) -> Result<()>;
    fn clear_sheet(&mut self, sheet: &str) -> Result<()>;
    /// Persist buffered writes. Called once per mutating command.
    fn flush(&mut self) -> Result<()>;
}

/// Workbook-file surface. Writes mutate the open `Spreadsheet` in memory
/// and `flush` saves the file, so a mutating command performs one save
/// regardless of how many cells changed.
pub struct XlsxSurface {
    book: umya_spreadsheet::Spreadsheet,
    path: PathBuf,
    dirty: bool,
}

impl XlsxSurface {
    pub fn open(path: &Path) -> Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| {
            Error::Attachment(format!("could not open '{}': {}", path.display(), e))
        })?;
        Ok(Self {
            book,
            path: path.to_path_buf(),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet(&self, name: &str) -> Result<&umya_spreadsheet::Worksheet> {
        self.book
            .get_sheet_by_name(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut umya_spreadsheet::Worksheet> {
        self.book
            .get_sheet_by_name_mut(name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }
}

fn set_cell(sheet: &mut umya_spreadsheet::Worksheet, row: u32, col: u32, value: &CellValue) {
    match value {
        CellValue::Empty => {
            sheet.remove_cell((col, row));
        }
        CellValue::Number(n) => {
            sheet.get_cell_mut((col, row)).set_value_number(*n);
        }
        CellValue::Bool(b) => {
            sheet.get_cell_mut((col, row)).set_value_bool(*b);
        }
        CellValue::Text(s) => {
            sheet.get_cell_mut((col, row)).set_value(s.clone());
        }
    }
}

impl SheetSurface for XlsxSurface {
    fn sheet_names(&self) -> Vec<String> {
        self.book
            .get_sheet_collection_no_check()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    fn read_used_range(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>> {
        let sheet = self.sheet(sheet)?;
        let (max_col, max_row) = sheet.get_highest_column_and_row();
        if max_col == 0 || max_row == 0 {
            return Ok(Vec::new());
        }
        let mut rows = Vec::with_capacity(max_row as usize);
        for row in 1..=max_row {
            let mut cells = Vec::with_capacity(max_col as usize);
            for col in 1..=max_col {
                cells.push(CellValue::sniff(&sheet.get_value((col, row))));
            }
            rows.push(cells);
        }
        Ok(rows)
    }

    fn write_cell(&mut self, sheet: &str, row: u32, col: u32, value: &CellValue) -> Result<()> {
        let sheet = self.sheet_mut(sheet)?;
        set_cell(sheet, row, col, value);
        self.dirty = true;
        Ok(())
    }

    fn write_block(
        &mut self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: &[Vec<CellValue>],
    ) -> Result<()> {
        let sheet = self.sheet_mut(sheet)?;
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                set_cell(sheet, start_row + i as u32, start_col + j as u32, value);
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn clear_sheet(&mut self, sheet: &str) -> Result<()> {
        let sheet = self.sheet_mut(sheet)?;
        let (max_col, max_row) = sheet.get_highest_column_and_row();
        for row in 1..=max_row {
            for col in 1..=max_col {
                sheet.remove_cell((col, row));
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|e| {
            Error::Surface(format!("could not save '{}': {}", self.path.display(), e))
        })?;
        self.dirty = false;
        Ok(())
    }
}

/// In-memory surface. Backs the write-back tests and any caller that wants
/// to run statements against fabricated sheets without a workbook file.
#[derive(Debug, Default)]
pub struct MemorySurface {
    sheets: IndexMap<String, Vec<Vec<CellValue>>>,
    pub cell_writes: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.sheets.insert(name.to_string(), rows);
        self
    }

    pub fn grid(&self, sheet: &str) -> Option<&Vec<Vec<CellValue>>> {
        self.sheets.get(sheet)
    }

    fn grid_mut(&mut self, sheet: &str) -> Result<&mut Vec<Vec<CellValue>>> {
        self.sheets
            .get_mut(sheet)
            .ok_or_else(|| Error::SheetNotFound(sheet.to_string()))
    }

    fn place(grid: &mut Vec<Vec<CellValue>>, row: u32, col: u32, value: &CellValue) {
        let (r, c) = (row as usize - 1, col as usize - 1);
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        if grid[r].len() <= c {
            grid[r].resize(c + 1, CellValue::Empty);
        }
        grid[r][c] = value.clone();
    }
}

impl SheetSurface for MemorySurface {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    fn read_used_range(&self, sheet: &str) -> Result<Vec<Vec<CellValue>>> {
        self.sheets
            .get(sheet)
            .cloned()
            .ok_or_else(|| Error::SheetNotFound(sheet.to_string()))
    }

    fn write_cell(&mut self, sheet: &str, row: u32, col: u32, value: &CellValue) -> Result<()> {
        let grid = self.grid_mut(sheet)?;
        Self::place(grid, row, col, value);
        self.cell_writes += 1;
        Ok(())
    }

    fn write_block(
        &mut self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: &[Vec<CellValue>],
    ) -> Result<()> {
        let grid = self.grid_mut(sheet)?;
        let mut written = 0;
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                Self::place(grid, start_row + i as u32, start_col + j as u32, value);
                written += 1;
            }
        }
        self.cell_writes += written;
        Ok(())
    }

    fn clear_sheet(&mut self, sheet: &str) -> Result<()> {
        self.grid_mut(sheet)?.clear();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
