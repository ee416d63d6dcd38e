use serde::{Serialize, Serializer};

/// Loosely typed cell scalar. Spreadsheet cells and SQLite columns may
/// disagree on typing for the same logical value; `render` collapses both
/// sides to a comparable textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    /// Interpret a raw cell string the way the spreadsheet displays it.
    pub fn sniff(raw: &str) -> CellValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match trimmed {
            "TRUE" => return CellValue::Bool(true),
            "FALSE" => return CellValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<f64>()
            && n.is_finite()
        {
            return CellValue::Number(n);
        }
        CellValue::Text(raw.to_string())
    }

    /// Missing covers the empty cell and the NaN a numeric pipeline may
    /// produce for one.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Textual form used for display and for the equality fallback.
    /// Integral floats render without a fraction so `5` and `"5"` agree.
    pub fn render(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => render_number(*n),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

pub fn render_number(n: f64) -> String {
    if n.is_nan() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Two cell values are equal if both are missing, or directly comparable
/// and equal, or (when the variants disagree) equal in textual form.
pub fn values_equal(a: &CellValue, b: &CellValue) -> bool {
    if a.is_missing() && b.is_missing() {
        return true;
    }
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x == y,
        (CellValue::Bool(x), CellValue::Bool(y)) => x == y,
        (CellValue::Text(x), CellValue::Text(y)) => x == y,
        _ => a.render() == b.render(),
    }
}

/// An in-memory table: ordered column names plus ordered rows. Column order
/// maps to sheet column position, row order to sheet row position below the
/// header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at 0-indexed (row, col); absent positions read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Per-column value kind for schema display: the single kind the body
    /// agrees on, or `mixed`.
    pub fn column_kinds(&self) -> Vec<&'static str> {
        (0..self.width())
            .map(|col| {
                let mut kind: Option<&'static str> = None;
                for row in &self.rows {
                    let value = row.get(col).unwrap_or(&CellValue::Empty);
                    let this = match value {
                        CellValue::Empty => continue,
                        CellValue::Number(_) => "number",
                        CellValue::Bool(_) => "bool",
                        CellValue::Text(_) => "text",
                    };
                    match kind {
                        None => kind = Some(this),
                        Some(seen) if seen == this => {}
                        Some(_) => return "mixed",
                    }
                }
                kind.unwrap_or("empty")
            })
            .collect()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            columns: &'a [String],
            rows: &'a [Vec<CellValue>],
        }
        Repr {
            columns: &self.columns,
            rows: &self.rows,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_are_equal() {
        assert!(values_equal(&CellValue::Empty, &CellValue::Empty));
        assert!(values_equal(
            &CellValue::Empty,
            &CellValue::Number(f64::NAN)
        ));
        assert!(values_equal(
            &CellValue::Number(f64::NAN),
            &CellValue::Number(f64::NAN)
        ));
    }

    #[test]
    fn number_and_numeric_text_collapse_to_string_comparison() {
        assert!(values_equal(
            &CellValue::Number(5.0),
            &CellValue::Text("5".to_string())
        ));
        assert!(!values_equal(
            &CellValue::Number(5.0),
            &CellValue::Number(6.0)
        ));
        assert!(!values_equal(
            &CellValue::Number(5.0),
            &CellValue::Text("5.5".to_string())
        ));
    }

    #[test]
    fn empty_is_not_equal_to_present_value() {
        assert!(!values_equal(
            &CellValue::Empty,
            &CellValue::Text("x".to_string())
        ));
        assert!(!values_equal(&CellValue::Empty, &CellValue::Number(0.0)));
    }

    #[test]
    fn sniff_classifies_raw_strings() {
        assert_eq!(CellValue::sniff(""), CellValue::Empty);
        assert_eq!(CellValue::sniff("  "), CellValue::Empty);
        assert_eq!(CellValue::sniff("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::sniff("-1.5"), CellValue::Number(-1.5));
        assert_eq!(CellValue::sniff("TRUE"), CellValue::Bool(true));
        assert_eq!(
            CellValue::sniff("shipped"),
            CellValue::Text("shipped".to_string())
        );
    }

    #[test]
    fn render_drops_trailing_fraction_for_integral_floats() {
        assert_eq!(CellValue::Number(5.0).render(), "5");
        assert_eq!(CellValue::Number(5.25).render(), "5.25");
        assert_eq!(CellValue::Number(-3.0).render(), "-3");
    }

    #[test]
    fn column_kinds_report_uniform_and_mixed_columns() {
        let table = Table {
            columns: vec!["id".into(), "name".into(), "flag".into()],
            rows: vec![
                vec![
                    CellValue::Number(1.0),
                    CellValue::Text("a".into()),
                    CellValue::Bool(true),
                ],
                vec![
                    CellValue::Number(2.0),
                    CellValue::Number(7.0),
                    CellValue::Empty,
                ],
            ],
        };
        assert_eq!(table.column_kinds(), vec!["number", "mixed", "bool"]);
    }
}
