use crate::errors::{Error, Result};
use crate::model::{CellValue, Table};
use crate::snapshot::SnapshotStore;
use crate::statement::{self, StatementKind};
use rusqlite::Connection;
use rusqlite::types::{Value as SqlValue, ValueRef};
use tracing::debug;

/// Outcome of one statement run against a fresh in-memory database.
#[derive(Debug)]
pub enum Execution {
    Read {
        table: Table,
    },
    Mutation {
        kind: StatementKind,
        target: String,
        rows_affected: usize,
        /// Full post-statement re-read of the target table. Intentional:
        /// the engine's coercion, defaults, and NULL handling become the
        /// new snapshot instead of locally re-derived bookkeeping.
        new_table: Table,
    },
}

/// Load every snapshot table into a fresh `:memory:` SQLite connection,
/// run one statement, and discard the connection. The per-statement reload
/// trades speed for consistency with the engine's semantics.
pub fn execute(store: &SnapshotStore, sql: &str) -> Result<Execution> {
    let kind = statement::classify(sql)?;

    if !kind.is_mutation() {
        let conn = load_store(store)?;
        let table = query_table(&conn, sql)?;
        return Ok(Execution::Read { table });
    }

    let target = statement::target_table(sql, kind)?;
    if store.get(&target).is_none() {
        return Err(Error::SheetNotFound(target));
    }

    let conn = load_store(store)?;
    let rows_affected = conn.execute(sql, [])?;
    let new_table = query_table(&conn, &format!("SELECT * FROM {}", quote_ident(&target)))?;
    debug!(target = %target, rows_affected, "statement executed");

    Ok(Execution::Mutation {
        kind,
        target,
        rows_affected,
        new_table,
    })
}

fn load_store(store: &SnapshotStore) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    for (name, table) in store.iter() {
        create_table(&conn, name, table)?;
    }
    Ok(conn)
}

fn create_table(conn: &Connection, name: &str, table: &Table) -> Result<()> {
    // Columns are declared without a type so SQLite stores values as bound
    // and does not coerce them on the way in.
    let column_list = table
        .columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    conn.execute(
        &format!("CREATE TABLE {} ({})", quote_ident(name), column_list),
        [],
    )?;

    if table.rows.is_empty() {
        return Ok(());
    }

    let placeholders = (1..=table.width())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(name),
        placeholders
    ))?;
    for row in &table.rows {
        let params = rusqlite::params_from_iter(row.iter().map(bind_value));
        stmt.execute(params)?;
    }
    Ok(())
}

fn bind_value(value: &CellValue) -> SqlValue {
    match value {
        CellValue::Empty => SqlValue::Null,
        CellValue::Number(n) if n.is_nan() => SqlValue::Null,
        CellValue::Number(n) => SqlValue::Real(*n),
        CellValue::Bool(b) => SqlValue::Integer(*b as i64),
        CellValue::Text(s) => SqlValue::Text(s.clone()),
    }
}

fn read_value(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Empty,
        ValueRef::Integer(i) => CellValue::Number(i as f64),
        ValueRef::Real(f) => CellValue::Number(f),
        ValueRef::Text(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => CellValue::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn query_table(conn: &Connection, sql: &str) -> Result<Table> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let width = columns.len();
    let mut table = Table::new(columns);
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(read_value(row.get_ref(i)?));
        }
        table.rows.push(cells);
    }
    Ok(table)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
