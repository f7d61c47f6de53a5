use chrono::NaiveDate;
use polars::prelude::*;

/// Output column holding the ISO trading date.
pub const DATE_COLUMN: &str = "date";

/// Output column holding the closing price.
pub const PRICE_COLUMN: &str = "price (USD)";

/// Date format of the output file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fractional digits kept on every price.
pub const PRICE_DECIMALS: usize = 2;

/// Expected schema for the projected two-column price table
pub struct PriceSchema;

impl PriceSchema {
    /// Header row of the output file, in column order.
    pub fn header() -> [&'static str; 2] {
        [DATE_COLUMN, PRICE_COLUMN]
    }

    /// Validate a projected table: exactly `date` and `price (USD)`, in that order
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        for expected in Self::header() {
            if !names.iter().any(|n| n == expected) {
                return Err(SchemaError::MissingColumn(expected.to_string()));
            }
        }
        if names != Self::header() {
            return Err(SchemaError::UnexpectedHeader(names.join(",")));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Ambiguous column for '{field}': {candidates:?}")]
    AmbiguousColumn {
        field: String,
        candidates: Vec<String>,
    },

    #[error("Positional fallback needs {needed} columns, table has {found}")]
    TooFewColumns { needed: usize, found: usize },

    #[error("Unsupported type in column {column}: {dtype:?}")]
    UnsupportedType { column: String, dtype: DataType },

    #[error("Unsupported time zone in column {column}: {tz} (expected UTC or a fixed offset)")]
    UnsupportedTimeZone { column: String, tz: String },

    #[error("Unexpected header: {0}")]
    UnexpectedHeader(String),

    #[error("Missing date in row {row}")]
    NullDate { row: usize },

    #[error("Invalid date in row {row}: '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Missing price on {date}")]
    NullPrice { date: NaiveDate },

    #[error("Invalid price on {date}: {value}")]
    InvalidPrice { date: NaiveDate, value: String },

    #[error("Table error: {0}")]
    Table(#[from] PolarsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_projected_table() {
        let df = df!(
            DATE_COLUMN => &["2015-01-02"],
            PRICE_COLUMN => &[27.33],
        )
        .unwrap();
        assert!(PriceSchema::validate(&df).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let df = df!(DATE_COLUMN => &["2015-01-02"]).unwrap();
        let result = PriceSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::MissingColumn(c) if c == PRICE_COLUMN));
    }

    #[test]
    fn test_validate_rejects_extra_or_reordered_columns() {
        let df = df!(
            PRICE_COLUMN => &[27.33],
            DATE_COLUMN => &["2015-01-02"],
        )
        .unwrap();
        assert!(matches!(
            PriceSchema::validate(&df).unwrap_err(),
            SchemaError::UnexpectedHeader(_)
        ));
    }
}
