use crate::errors::Result;
use crate::model::{CellValue, Table, values_equal};
use crate::surface::SheetSurface;

/// One cell mutation at 1-indexed sheet coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
}

/// The minimal mutation set that brings a sheet in sync with a
/// post-statement table. Applying a plan to the old table's sheet
/// representation yields exactly the new table's representation; the
/// header row is untouched except under `Rewrite`.
#[derive(Debug, Clone, PartialEq)]
pub enum WritePlan {
    /// Individual cell writes from the row-level diff.
    Cells(Vec<CellWrite>),
    /// Net-new rows written as one contiguous block.
    Append {
        start_row: u32,
        rows: Vec<Vec<CellValue>>,
    },
    /// Clear the sheet, rewrite header and body. Row deletion shifts every
    /// following row and no row identity is tracked, so incremental
    /// diffing would be unsound here.
    Rewrite {
        header_row: u32,
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    },
}

impl WritePlan {
    /// Cells this plan will touch when applied.
    pub fn cell_count(&self) -> usize {
        match self {
            WritePlan::Cells(writes) => writes.len(),
            WritePlan::Append { rows, .. } => rows.iter().map(Vec::len).sum(),
            WritePlan::Rewrite { columns, rows, .. } => {
                columns.len() + rows.iter().map(Vec::len).sum::<usize>()
            }
        }
    }
}

/// Sheet row holding body index `i` when the header sits at `header_row`.
fn body_row(header_row: u32, index: usize) -> u32 {
    header_row + 1 + index as u32
}

/// Row-level diff for UPDATE: compare row indices common to both tables,
/// column positions of the new table, and emit one write per unequal pair.
/// An update the engine counts as "affected" but that sets a cell to its
/// existing value produces no write.
pub fn plan_update(old: &Table, new: &Table, header_row: u32) -> WritePlan {
    let mut writes = Vec::new();
    let shared_rows = old.rows.len().min(new.rows.len());
    for i in 0..shared_rows {
        for j in 0..new.width() {
            let old_value = old.cell(i, j);
            let new_value = new.cell(i, j);
            if !values_equal(old_value, new_value) {
                writes.push(CellWrite {
                    row: body_row(header_row, i),
                    col: j as u32 + 1,
                    value: new_value.clone(),
                });
            }
        }
    }
    WritePlan::Cells(writes)
}

/// Append for INSERT: rows beyond the old table's length are net-new and
/// go verbatim after the old table's last row. No diffing.
pub fn plan_append(old: &Table, new: &Table, header_row: u32) -> WritePlan {
    WritePlan::Append {
        start_row: body_row(header_row, old.rows.len()),
        rows: new.rows.iter().skip(old.rows.len()).cloned().collect(),
    }
}

/// Full rewrite for DELETE: everything cleared, header rewritten from the
/// new table's columns, body written as one block below it.
pub fn plan_rewrite(new: &Table, header_row: u32) -> WritePlan {
    WritePlan::Rewrite {
        header_row,
        columns: new.columns.clone(),
        rows: new.rows.clone(),
    }
}

/// Apply a plan through the surface. Returns the number of cells written.
/// Writes are not individually retried; a failing surface call aborts the
/// rest of the plan and earlier writes stay applied.
pub fn apply(surface: &mut dyn SheetSurface, sheet: &str, plan: &WritePlan) -> Result<usize> {
    match plan {
        WritePlan::Cells(writes) => {
            for write in writes {
                surface.write_cell(sheet, write.row, write.col, &write.value)?;
            }
            Ok(writes.len())
        }
        WritePlan::Append { start_row, rows } => {
            surface.write_block(sheet, *start_row, 1, rows)?;
            Ok(plan.cell_count())
        }
        WritePlan::Rewrite {
            header_row,
            columns,
            rows,
        } => {
            surface.clear_sheet(sheet)?;
            let header = columns
                .iter()
                .map(|c| CellValue::Text(c.clone()))
                .collect::<Vec<_>>();
            surface.write_block(sheet, *header_row, 1, &[header])?;
            surface.write_block(sheet, header_row + 1, 1, rows)?;
            Ok(plan.cell_count())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn unchanged_tables_plan_zero_writes() {
        let old = table(
            &["id", "status"],
            vec![vec![num(1.0), text("open")], vec![num(2.0), text("open")]],
        );
        let plan = plan_update(&old, &old.clone(), 1);
        assert_eq!(plan, WritePlan::Cells(Vec::new()));
        assert_eq!(plan.cell_count(), 0);
    }

    #[test]
    fn typed_drift_without_logical_change_plans_zero_writes() {
        // the engine may hand back text where the sheet held a number
        let old = table(&["id"], vec![vec![num(5.0)]]);
        let new = table(&["id"], vec![vec![text("5")]]);
        assert_eq!(plan_update(&old, &new, 1).cell_count(), 0);
    }

    #[test]
    fn changed_cell_lands_at_header_offset_coordinates() {
        let old = table(
            &["id", "status"],
            vec![vec![num(1.0), text("open")], vec![num(2.0), text("open")]],
        );
        let mut new = old.clone();
        new.rows[1][1] = text("shipped");

        let WritePlan::Cells(writes) = plan_update(&old, &new, 1) else {
            panic!("expected cell writes");
        };
        assert_eq!(
            writes,
            vec![CellWrite {
                row: 3,
                col: 2,
                value: text("shipped"),
            }]
        );

        // a header loaded from row 3 shifts the same logical cell down
        let WritePlan::Cells(writes) = plan_update(&old, &new, 3) else {
            panic!("expected cell writes");
        };
        assert_eq!(writes[0].row, 5);
    }

    #[test]
    fn append_targets_first_row_after_old_body() {
        let old = table(&["id"], vec![vec![num(1.0)], vec![num(2.0)]]);
        let mut new = old.clone();
        new.rows.push(vec![num(3.0)]);
        new.rows.push(vec![num(4.0)]);

        let plan = plan_append(&old, &new, 1);
        assert_eq!(
            plan,
            WritePlan::Append {
                start_row: 4,
                rows: vec![vec![num(3.0)], vec![num(4.0)]],
            }
        );
    }

    #[test]
    fn applied_rewrite_leaves_header_and_body_only() {
        let mut surface = MemorySurface::new().with_sheet(
            "Orders",
            vec![
                vec![text("id"), text("status")],
                vec![num(1.0), text("open")],
                vec![num(2.0), text("open")],
                vec![num(3.0), text("closed")],
            ],
        );
        let new = table(&["id", "status"], vec![vec![num(3.0), text("closed")]]);

        let written = apply(&mut surface, "Orders", &plan_rewrite(&new, 1)).unwrap();
        assert_eq!(written, 4);

        let grid = surface.grid("Orders").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], vec![text("id"), text("status")]);
        assert_eq!(grid[1], vec![num(3.0), text("closed")]);
    }

    #[test]
    fn applied_append_writes_exactly_the_new_rows() {
        let mut surface = MemorySurface::new().with_sheet(
            "T",
            vec![vec![text("id")], vec![num(1.0)]],
        );
        let old = table(&["id"], vec![vec![num(1.0)]]);
        let mut new = old.clone();
        new.rows.push(vec![num(2.0)]);

        let written = apply(&mut surface, "T", &plan_append(&old, &new, 1)).unwrap();
        assert_eq!(written, 1);
        let grid = surface.grid("T").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2], vec![num(2.0)]);
    }

    #[test]
    fn update_diff_applies_to_surface_row_below_header() {
        let mut surface = MemorySurface::new().with_sheet(
            "T",
            vec![
                vec![text("id"), text("status")],
                vec![num(1.0), text("open")],
            ],
        );
        let old = table(&["id", "status"], vec![vec![num(1.0), text("open")]]);
        let mut new = old.clone();
        new.rows[0][1] = text("done");

        let written = apply(&mut surface, "T", &plan_update(&old, &new, 1)).unwrap();
        assert_eq!(written, 1);
        assert_eq!(surface.grid("T").unwrap()[1][1], text("done"));
    }
}
