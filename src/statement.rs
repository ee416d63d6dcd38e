use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Select,
    Update,
    Insert,
    Delete,
}

impl StatementKind {
    pub fn is_mutation(self) -> bool {
        !matches!(self, StatementKind::Select)
    }
}

/// Route by leading keyword, case-insensitive. UPDATE/INSERT/DELETE take
/// the write-back path, SELECT (and WITH-prefixed selects) the read path;
/// everything else is rejected before reaching the engine.
pub fn classify(sql: &str) -> Result<StatementKind> {
    let keyword = sql
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    match keyword.as_str() {
        "SELECT" | "WITH" => Ok(StatementKind::Select),
        "UPDATE" => Ok(StatementKind::Update),
        "INSERT" => Ok(StatementKind::Insert),
        "DELETE" => Ok(StatementKind::Delete),
        "" => Err(Error::Parse("empty statement".to_string())),
        other => Err(Error::UnsupportedStatement(format!(
            "{} (use SELECT, UPDATE, INSERT, or DELETE)",
            other
        ))),
    }
}

// Identifier alternatives: "quoted", `quoted`, [quoted], or a bare word.
const IDENT: &str = r#"(?:"([^"]+)"|`([^`]+)`|\[([^\]]+)\]|([A-Za-z_][A-Za-z0-9_]*))"#;

static UPDATE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is)^\s*UPDATE\s+{IDENT}\s+SET\b")).expect("update target regex")
});
static INSERT_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*INSERT\s+(?:OR\s+[A-Za-z]+\s+)?INTO\s+{IDENT}[\s(]"
    ))
    .expect("insert target regex")
});
static DELETE_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is)^\s*DELETE\s+FROM\s+{IDENT}\s*(?:$|WHERE\b)"))
        .expect("delete target regex")
});

/// Extract the mutated table from the statement's expected clause shape.
/// A name that does not parse is a typed Parse error, distinct from an
/// engine-raised SQL error.
pub fn target_table(sql: &str, kind: StatementKind) -> Result<String> {
    reject_multiple_statements(sql)?;
    let trimmed = sql.trim();
    let statement = trimmed.strip_suffix(';').unwrap_or(trimmed);
    let captures = match kind {
        StatementKind::Update => UPDATE_TARGET.captures(statement),
        StatementKind::Insert => INSERT_TARGET.captures(statement),
        StatementKind::Delete => DELETE_TARGET.captures(statement),
        StatementKind::Select => {
            return Err(Error::Parse(
                "read statements have no write-back target".to_string(),
            ));
        }
    };
    captures
        .and_then(|c| {
            (1..=4)
                .find_map(|i| c.get(i))
                .map(|m| m.as_str().to_string())
        })
        .ok_or_else(|| {
            Error::Parse(format!(
                "could not extract target table from {} statement",
                keyword(kind)
            ))
        })
}

fn keyword(kind: StatementKind) -> &'static str {
    match kind {
        StatementKind::Select => "SELECT",
        StatementKind::Update => "UPDATE",
        StatementKind::Insert => "INSERT",
        StatementKind::Delete => "DELETE",
    }
}

/// One statement per call. A semicolon outside quotes followed by anything
/// but whitespace means a second statement; write-back cannot attribute a
/// diff across several targets.
fn reject_multiple_statements(sql: &str) -> Result<()> {
    let mut chars = sql.chars();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                ';' => {
                    if chars.any(|rest| !rest.is_whitespace()) {
                        return Err(Error::Parse(
                            "multiple statements are not supported".to_string(),
                        ));
                    }
                    return Ok(());
                }
                _ => {}
            },
        }
    }
    Ok(())
}
