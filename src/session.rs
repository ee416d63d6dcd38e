use crate::engine::{self, Execution};
use crate::errors::Error;
use crate::model::Table;
use crate::snapshot::SnapshotStore;
use crate::state::SessionState;
use crate::statement::{self, StatementKind};
use crate::surface::{SheetSurface, XlsxSurface};
use crate::writeback::{self, WritePlan};
use anyhow::{Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Serialize)]
pub struct AttachOutcome {
    pub workbook: String,
    pub header_row: u32,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SchemaEntry {
    pub sheet: String,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Serialize)]
pub struct ExecOutcome {
    pub kind: StatementKind,
    pub table: String,
    pub rows_affected: usize,
    pub cells_written: usize,
}

/// One CLI invocation's worth of state: the attached surface plus the
/// snapshot store loaded from it. Constructed at invocation start,
/// discarded at the end; nothing here is ambient.
pub struct Session {
    state_path: PathBuf,
    surface: Option<Box<dyn SheetSurface>>,
    workbook: Option<String>,
    header_row: u32,
    store: SnapshotStore,
}

impl Session {
    pub fn new(state_path: PathBuf) -> Self {
        Self {
            state_path,
            surface: None,
            workbook: None,
            header_row: 1,
            store: SnapshotStore::default(),
        }
    }

    pub fn header_row(&self) -> u32 {
        self.header_row
    }

    /// Attach to a workbook file and load all sheets. With no workbook
    /// argument the previously persisted one is reused. Persists
    /// (workbook, header_row) on success.
    pub fn attach_workbook(
        &mut self,
        workbook: Option<String>,
        header_row: Option<u32>,
    ) -> Result<AttachOutcome> {
        let persisted = SessionState::load(&self.state_path);
        let reattaching = workbook.is_none();
        let workbook = match workbook.or_else(|| persisted.as_ref().map(|s| s.workbook.clone())) {
            Some(name) => name,
            None => {
                return Err(Error::Attachment(
                    "no workbook given and none previously attached".to_string(),
                )
                .into());
            }
        };
        // a re-attach inherits the persisted header row; attaching a
        // workbook explicitly starts from row 1 unless told otherwise
        let header_row = match header_row {
            Some(row) => row,
            None if reattaching => persisted.map(|s| s.header_row).unwrap_or(1),
            None => 1,
        };
        if header_row == 0 {
            bail!("header row is 1-indexed and must be at least 1");
        }

        let surface = XlsxSurface::open(Path::new(&workbook))?;
        let outcome = self.attach_surface(Box::new(surface), &workbook, header_row)?;

        SessionState {
            workbook: workbook.clone(),
            header_row,
        }
        .save(&self.state_path)?;
        Ok(outcome)
    }

    /// Attach an already-open surface. Used directly by tests with an
    /// in-memory surface; does not touch the persisted state.
    pub fn attach_surface(
        &mut self,
        surface: Box<dyn SheetSurface>,
        name: &str,
        header_row: u32,
    ) -> Result<AttachOutcome> {
        let store = SnapshotStore::load(surface.as_ref(), header_row)?;
        self.surface = Some(surface);
        self.workbook = Some(name.to_string());
        self.header_row = header_row;
        self.store = store;
        Ok(AttachOutcome {
            workbook: name.to_string(),
            header_row,
            sheets: self.sheet_summaries(),
        })
    }

    /// Reload from the persisted workbook. An explicit header row
    /// overrides the persisted one and is re-persisted.
    pub fn reload(&mut self, header_row: Option<u32>) -> Result<AttachOutcome> {
        if SessionState::load(&self.state_path).is_none() {
            return Err(Error::Attachment(
                "no workbook attached. Run: attach [workbook]".to_string(),
            )
            .into());
        }
        self.attach_workbook(None, header_row)
    }

    /// Best-effort auto-reattach for fresh invocations. Its own failure is
    /// suppressed; the operation that actually needs data reports it.
    fn ensure_loaded(&mut self) {
        if !self.store.is_empty() {
            return;
        }
        if let Err(e) = self.attach_workbook(None, None) {
            debug!("auto-reattach skipped: {e:#}");
        }
    }

    fn require_data(&self) -> Result<()> {
        if self.store.is_empty() {
            bail!("no sheets loaded. Run: attach [workbook]");
        }
        Ok(())
    }

    fn sheet_summaries(&self) -> Vec<SheetSummary> {
        self.store
            .iter()
            .map(|(name, table)| SheetSummary {
                name: name.clone(),
                rows: table.rows.len(),
                columns: table.width(),
            })
            .collect()
    }

    pub fn sheets(&mut self) -> Result<Vec<SheetSummary>> {
        self.ensure_loaded();
        self.require_data()?;
        Ok(self.sheet_summaries())
    }

    pub fn schema(&mut self, sheet: Option<&str>) -> Result<Vec<SchemaEntry>> {
        self.ensure_loaded();
        self.require_data()?;
        match sheet {
            Some(name) => {
                let table = self
                    .store
                    .get(name)
                    .ok_or_else(|| Error::SheetNotFound(name.to_string()))?;
                Ok(vec![schema_entry(name, table)])
            }
            None => Ok(self
                .store
                .iter()
                .map(|(name, table)| schema_entry(name, table))
                .collect()),
        }
    }

    /// Run a read statement and return the result table.
    pub fn query(&mut self, sql: &str) -> Result<Table> {
        self.ensure_loaded();
        self.require_data()?;
        let kind = statement::classify(sql)?;
        if kind.is_mutation() {
            return Err(Error::UnsupportedStatement(
                "mutating statement; use exec".to_string(),
            )
            .into());
        }
        match engine::execute(&self.store, sql)? {
            Execution::Read { table } => Ok(table),
            Execution::Mutation { .. } => unreachable!("read statements stay on the read path"),
        }
    }

    /// Run a mutating statement, write the resulting cell changes back to
    /// the surface, and update the snapshot in place.
    pub fn exec(&mut self, sql: &str) -> Result<ExecOutcome> {
        self.ensure_loaded();
        self.require_data()?;
        let kind = statement::classify(sql)?;
        if !kind.is_mutation() {
            return Err(Error::UnsupportedStatement(
                "read statement; use query".to_string(),
            )
            .into());
        }

        let Execution::Mutation {
            kind,
            target,
            rows_affected,
            new_table,
        } = engine::execute(&self.store, sql)?
        else {
            unreachable!("mutations stay on the write-back path");
        };

        let plan = {
            let old = self
                .store
                .get(&target)
                .ok_or_else(|| Error::SheetNotFound(target.clone()))?;
            self.plan_for(kind, old, &new_table)
        };

        let surface = self
            .surface
            .as_mut()
            .ok_or_else(|| Error::Attachment("no workbook attached".to_string()))?;
        let cells_written = writeback::apply(surface.as_mut(), &target, &plan)?;
        surface.flush()?;
        self.store.insert(target.clone(), new_table);

        Ok(ExecOutcome {
            kind,
            table: target,
            rows_affected,
            cells_written,
        })
    }

    fn plan_for(&self, kind: StatementKind, old: &Table, new: &Table) -> WritePlan {
        match kind {
            StatementKind::Update => {
                if new.rows.len() == old.rows.len() {
                    writeback::plan_update(old, new, self.header_row)
                } else {
                    // the row-level diff assumes UPDATE preserves row
                    // count; if the engine disagrees, rewrite instead of
                    // diffing against shifted rows
                    warn!(
                        old_rows = old.rows.len(),
                        new_rows = new.rows.len(),
                        "row count changed under UPDATE; rewriting sheet"
                    );
                    writeback::plan_rewrite(new, self.header_row)
                }
            }
            StatementKind::Insert => writeback::plan_append(old, new, self.header_row),
            StatementKind::Delete => writeback::plan_rewrite(new, self.header_row),
            StatementKind::Select => unreachable!("select has no write-back plan"),
        }
    }
}

fn schema_entry(name: &str, table: &Table) -> SchemaEntry {
    SchemaEntry {
        sheet: name.to_string(),
        columns: table
            .columns
            .iter()
            .zip(table.column_kinds())
            .map(|(name, kind)| ColumnInfo {
                name: name.clone(),
                kind,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;
    use crate::surface::MemorySurface;

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn orders_rows() -> Vec<Vec<CellValue>> {
        vec![
            vec![text("id"), text("status")],
            vec![num(1.0), text("open")],
            vec![num(2.0), text("open")],
            vec![num(3.0), text("closed")],
        ]
    }

    fn session_with_orders() -> Session {
        let dir = std::env::temp_dir().join("sheetsql-session-tests-unused-state.json");
        let mut session = Session::new(dir);
        let surface = MemorySurface::new().with_sheet("Orders", orders_rows());
        session
            .attach_surface(Box::new(surface), "test", 1)
            .unwrap();
        session
    }

    #[test]
    fn update_writes_exactly_the_changed_cell() {
        let mut session = session_with_orders();
        let outcome = session
            .exec("UPDATE Orders SET status = 'shipped' WHERE id = 2")
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.cells_written, 1);
        assert_eq!(outcome.table, "Orders");
    }

    #[test]
    fn noop_update_reports_affected_rows_but_zero_writes() {
        let mut session = session_with_orders();
        let outcome = session.exec("UPDATE Orders SET status = status").unwrap();
        assert_eq!(outcome.rows_affected, 3);
        assert_eq!(outcome.cells_written, 0);
    }

    #[test]
    fn insert_appends_and_snapshot_tracks_it() {
        let mut session = session_with_orders();
        let outcome = session
            .exec("INSERT INTO Orders VALUES (4, 'open')")
            .unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.cells_written, 2);

        let sheets = session.sheets().unwrap();
        assert_eq!(sheets[0].rows, 4);
    }

    #[test]
    fn delete_rewrites_and_counts_header_plus_body() {
        let mut session = session_with_orders();
        let outcome = session
            .exec("DELETE FROM Orders WHERE status = 'open'")
            .unwrap();
        assert_eq!(outcome.rows_affected, 2);
        // 2 header cells + 1 surviving row of 2 cells
        assert_eq!(outcome.cells_written, 4);
    }

    #[test]
    fn query_rejects_mutations_and_exec_rejects_reads() {
        let mut session = session_with_orders();
        assert!(session.query("UPDATE Orders SET status = 'x'").is_err());
        assert!(session.exec("SELECT * FROM Orders").is_err());
    }

    #[test]
    fn schema_reports_column_kinds() {
        let mut session = session_with_orders();
        let entries = session.schema(Some("Orders")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].columns[0].name, "id");
        assert_eq!(entries[0].columns[0].kind, "number");
        assert_eq!(entries[0].columns[1].kind, "text");

        assert!(session.schema(Some("Nope")).is_err());
    }
}
