use crate::errors::Result;
use crate::model::{CellValue, Table};
use crate::surface::SheetSurface;
use indexmap::IndexMap;
use tracing::debug;

/// Sheet-name → table cache of the surface, loaded once per invocation.
/// Always possibly stale; the surface stays authoritative.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    tables: IndexMap<String, Table>,
}

impl SnapshotStore {
    /// Read every sheet's used range and keep the ones that yield a table
    /// under the given 1-indexed header row. Sheets with no content, or
    /// whose header row falls beyond their rows, are skipped.
    pub fn load(surface: &dyn SheetSurface, header_row: u32) -> Result<Self> {
        let mut tables = IndexMap::new();
        for name in surface.sheet_names() {
            let raw = surface.read_used_range(&name)?;
            match table_from_used_range(raw, header_row) {
                Some(table) => {
                    tables.insert(name, table);
                }
                None => debug!(sheet = %name, header_row, "skipping sheet without table"),
            }
        }
        Ok(Self { tables })
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn insert(&mut self, name: String, table: Table) {
        self.tables.insert(name, table);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Table)> {
        self.tables.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

/// Split raw used-range rows into column names and body. Rows strictly
/// before the header row are discarded. Header cells are trimmed; blanks
/// become `col_<position>` and duplicates get a numeric suffix so every
/// column stays addressable in SQL.
pub fn table_from_used_range(raw: Vec<Vec<CellValue>>, header_row: u32) -> Option<Table> {
    if header_row == 0 || raw.len() < header_row as usize {
        return None;
    }
    let mut iter = raw.into_iter().skip(header_row as usize - 1);
    let header = iter.next()?;
    let width = header.len();
    if width == 0 {
        return None;
    }

    let mut columns = Vec::with_capacity(width);
    for (i, cell) in header.iter().enumerate() {
        let name = cell.render().trim().to_string();
        let base = if name.is_empty() {
            format!("col_{}", i + 1)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut suffix = 2;
        while columns.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        columns.push(candidate);
    }

    let rows = iter
        .map(|mut row| {
            row.resize(width, CellValue::Empty);
            row
        })
        .collect();

    Some(Table { columns, rows })
}
