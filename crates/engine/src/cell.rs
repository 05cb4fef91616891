use serde::{Deserialize, Serialize};

/// How a cell's content is interpreted. Derived from the raw input,
/// never chosen by the user directly; `Date` only appears on cells
/// that arrive through an explicit import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    Text,
    Number,
    Date,
    Formula,
}

/// The stored value of a cell: JSON `null`, a number, or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub formula: Option<String>,
    pub data_type: DataType,
}

impl Cell {
    /// Build a cell from raw user input, deriving the data type.
    /// Returns `None` for blank input — an empty cell is simply absent
    /// from the store.
    pub fn from_input(input: &str) -> Option<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('=') {
            return Some(Cell {
                value: CellValue::Text(trimmed.to_string()),
                formula: Some(trimmed.to_string()),
                data_type: DataType::Formula,
            });
        }

        // Non-finite parses ("inf", "nan", overflowing exponents) stay
        // text: JSON has no representation for them, so a Number(inf)
        // would serialize as null — the wire encoding of a deletion.
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => {
                return Some(Cell {
                    value: CellValue::Number(n),
                    formula: None,
                    data_type: DataType::Number,
                });
            }
            _ => {}
        }

        Some(Cell {
            value: CellValue::Text(trimmed.to_string()),
            formula: None,
            data_type: DataType::Text,
        })
    }

    /// Build a cell from imported parts, re-establishing the
    /// formula/data-type invariant no matter what the source claimed.
    pub fn imported(value: CellValue, formula: Option<String>, data_type: DataType) -> Self {
        let data_type = if formula.is_some() {
            DataType::Formula
        } else {
            data_type
        };
        Cell {
            value,
            formula,
            data_type,
        }
    }

    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    pub fn display(&self) -> String {
        self.value.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_input_detects_formula() {
        let cell = Cell::from_input("  =SUM(A1:A3) ").unwrap();
        assert_eq!(cell.formula.as_deref(), Some("=SUM(A1:A3)"));
        assert_eq!(cell.data_type, DataType::Formula);
    }

    #[test]
    fn from_input_detects_number() {
        let cell = Cell::from_input("42.5").unwrap();
        assert_eq!(cell.value, CellValue::Number(42.5));
        assert_eq!(cell.data_type, DataType::Number);
        assert!(cell.formula.is_none());
    }

    #[test]
    fn from_input_malformed_number_is_stored_as_text() {
        // Validation never rejects input outright
        let cell = Cell::from_input("12..3").unwrap();
        assert_eq!(cell.value, CellValue::Text("12..3".into()));
        assert_eq!(cell.data_type, DataType::Text);
    }

    #[test]
    fn from_input_non_finite_stays_text() {
        // "inf" and "nan" parse as f64, but a non-finite Number would
        // serialize as JSON null — indistinguishable from a deletion
        // on the wire. They must land as text.
        for input in ["inf", "infinity", "NaN", "nan", "-inf", "1e999"] {
            let cell = Cell::from_input(input).unwrap();
            assert_eq!(cell.value, CellValue::Text(input.into()), "input {:?}", input);
            assert_eq!(cell.data_type, DataType::Text);
            assert_ne!(serde_json::to_string(&cell.value).unwrap(), "null");
        }
    }

    #[test]
    fn from_input_blank_is_none() {
        assert!(Cell::from_input("").is_none());
        assert!(Cell::from_input("   ").is_none());
    }

    #[test]
    fn imported_forces_formula_type_when_formula_present() {
        let cell = Cell::imported(
            CellValue::Text("=A1+A2".into()),
            Some("=A1+A2".into()),
            DataType::Text,
        );
        assert_eq!(cell.data_type, DataType::Formula);
    }

    #[test]
    fn value_serializes_untagged() {
        let json = serde_json::to_string(&CellValue::Number(3.0)).unwrap();
        assert_eq!(json, "3.0");
        let json = serde_json::to_string(&CellValue::Null).unwrap();
        assert_eq!(json, "null");

        let back: CellValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(back, CellValue::Text("hello".into()));
        let back: CellValue = serde_json::from_str("null").unwrap();
        assert_eq!(back, CellValue::Null);
    }

    #[test]
    fn number_display_drops_trailing_zeroes() {
        assert_eq!(CellValue::Number(7.0).display(), "7");
        assert_eq!(CellValue::Number(7.25).display(), "7.25");
    }
}
