use crate::cli::{OutputFormat, Response};
use crate::model::Table;
use crate::session::ExecOutcome;
use crate::statement::StatementKind;
use anyhow::Result;
use std::io::Write;

pub fn emit(response: &Response, format: OutputFormat, quiet: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match format {
        OutputFormat::Json => {
            if quiet {
                serde_json::to_writer(&mut handle, response)?;
            } else {
                serde_json::to_writer_pretty(&mut handle, response)?;
            }
            handle.write_all(b"\n")?;
        }
        OutputFormat::Text => {
            writeln!(handle, "{}", render_text(response))?;
        }
    }
    Ok(())
}

fn render_text(response: &Response) -> String {
    match response {
        Response::Attach(outcome) => {
            let sheets = if outcome.sheets.is_empty() {
                "(none)".to_string()
            } else {
                outcome
                    .sheets
                    .iter()
                    .map(|s| format!("{} ({} rows)", s.name, s.rows))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "Attached to '{}' (header row {}). Sheets: {}",
                outcome.workbook, outcome.header_row, sheets
            )
        }
        Response::Sheets(sheets) => {
            let mut lines = vec!["Loaded sheets:".to_string()];
            for sheet in sheets {
                lines.push(format!(
                    "  {}: {} rows, {} columns",
                    sheet.name, sheet.rows, sheet.columns
                ));
            }
            lines.join("\n")
        }
        Response::Schema(entries) => entries
            .iter()
            .map(|entry| {
                let columns = entry
                    .columns
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.kind))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", entry.sheet, columns)
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Response::Query(table) => render_table(table),
        Response::Exec(outcome) => render_exec(outcome),
    }
}

fn render_exec(outcome: &ExecOutcome) -> String {
    match outcome.kind {
        StatementKind::Update => format!(
            "Updated {} row(s) in '{}'. {} cell(s) written.",
            outcome.rows_affected, outcome.table, outcome.cells_written
        ),
        StatementKind::Insert => format!(
            "Inserted {} row(s) into '{}'. {} cell(s) written.",
            outcome.rows_affected, outcome.table, outcome.cells_written
        ),
        StatementKind::Delete => format!(
            "Deleted {} row(s) from '{}'. Sheet rewritten ({} cells).",
            outcome.rows_affected, outcome.table, outcome.cells_written
        ),
        StatementKind::Select => String::new(),
    }
}

/// Plain aligned columns, two spaces apart.
fn render_table(table: &Table) -> String {
    if table.is_empty() {
        return "(no results)".to_string();
    }

    let mut widths: Vec<usize> = table.columns.iter().map(String::len).collect();
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.render()).collect())
        .collect();
    for row in &rendered {
        for (j, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(j) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let mut lines = Vec::with_capacity(rendered.len() + 1);
    let format_row = |cells: Vec<String>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(j, cell)| format!("{:<width$}", cell, width = widths[j]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    lines.push(format_row(table.columns.clone()));
    for row in rendered {
        lines.push(format_row(row));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    #[test]
    fn renders_aligned_table() {
        let table = Table {
            columns: vec!["id".into(), "status".into()],
            rows: vec![
                vec![CellValue::Number(1.0), CellValue::Text("open".into())],
                vec![CellValue::Number(2.0), CellValue::Text("shipped".into())],
            ],
        };
        let text = render_table(&table);
        assert_eq!(text, "id  status\n1   open\n2   shipped");
    }

    #[test]
    fn empty_result_renders_placeholder() {
        let table = Table::new(vec!["id".into()]);
        assert_eq!(render_table(&table), "(no results)");
    }
}
