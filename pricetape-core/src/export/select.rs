//! Column resolution: find the date and close columns of a raw table.
//!
//! Resolution runs in order and stops at the first success:
//! 1. **Named**: exact `Date` and `Close` headers.
//! 2. **Composite**: each field matches an exact header or a header level,
//!    as in `Close|AAPL`. Date and close are looked up independently.
//! 3. **Positional**: only when both lookups report a missing column.
//!
//! The positional fallback relies on a precondition the table cannot prove:
//! the date is column 0 and the value columns that follow are ordered
//! `Open, High, Low, Close`, so close is value column 3 (table column 4).
//! Providers are free to reorder their fields, so a positional pick is
//! always logged with the headers that were actually used.

use super::schema::{SchemaError, DATE_COLUMN, PRICE_COLUMN};
use crate::data::frame::split_levels;
use polars::prelude::*;
use tracing::{debug, warn};

/// Header of the date column in a flat table.
pub const DATE_FIELD: &str = "Date";

/// Header of the (adjusted) close column in a flat table.
pub const CLOSE_FIELD: &str = "Close";

/// Table column holding the date under the positional fallback.
pub const FALLBACK_DATE_POSITION: usize = 0;

/// Value column (counted after the date) holding close under the positional fallback.
pub const FALLBACK_CLOSE_VALUE_POSITION: usize = 3;

/// How the columns were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Named,
    Composite,
    Positional,
}

/// Headers of the two columns to project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub date: String,
    pub close: String,
    pub resolution: Resolution,
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Exact header lookup.
pub fn lookup_named(df: &DataFrame) -> Result<ColumnSelection, SchemaError> {
    let names = column_names(df);
    for field in [DATE_FIELD, CLOSE_FIELD] {
        if !names.iter().any(|n| n == field) {
            return Err(SchemaError::MissingColumn(field.to_string()));
        }
    }
    Ok(ColumnSelection {
        date: DATE_FIELD.to_string(),
        close: CLOSE_FIELD.to_string(),
        resolution: Resolution::Named,
    })
}

/// Find one field: an exact header first, then a header level equal to `field`.
fn find_field(names: &[String], field: &str) -> Result<String, SchemaError> {
    if let Some(exact) = names.iter().find(|n| n.as_str() == field) {
        return Ok(exact.clone());
    }
    let candidates: Vec<String> = names
        .iter()
        .filter(|n| split_levels(n).any(|level| level == field))
        .cloned()
        .collect();
    match candidates.len() {
        0 => Err(SchemaError::MissingColumn(field.to_string())),
        1 => Ok(candidates[0].clone()),
        _ => Err(SchemaError::AmbiguousColumn {
            field: field.to_string(),
            candidates,
        }),
    }
}

/// Lookup through multi-level headers. Date and close resolve independently,
/// so a flat `Date` next to `Close|AAPL` still matches.
pub fn lookup_composite(df: &DataFrame) -> Result<ColumnSelection, SchemaError> {
    let names = column_names(df);
    Ok(ColumnSelection {
        date: find_field(&names, DATE_FIELD)?,
        close: find_field(&names, CLOSE_FIELD)?,
        resolution: Resolution::Composite,
    })
}

/// Positional fallback: date in column 0, close in value column 3.
pub fn lookup_positional(df: &DataFrame) -> Result<ColumnSelection, SchemaError> {
    let names = column_names(df);
    let close_position = FALLBACK_DATE_POSITION + 1 + FALLBACK_CLOSE_VALUE_POSITION;
    if names.len() <= close_position {
        return Err(SchemaError::TooFewColumns {
            needed: close_position + 1,
            found: names.len(),
        });
    }

    let selection = ColumnSelection {
        date: names[FALLBACK_DATE_POSITION].clone(),
        close: names[close_position].clone(),
        resolution: Resolution::Positional,
    };
    warn!(
        date = %selection.date,
        close = %selection.close,
        "named columns unavailable, selected by position (assumes Open, High, Low, Close order)"
    );
    Ok(selection)
}

/// Resolve the date and close columns, falling back step by step.
pub fn resolve_columns(df: &DataFrame) -> Result<ColumnSelection, SchemaError> {
    match lookup_named(df) {
        Err(SchemaError::MissingColumn(missing)) => {
            debug!(%missing, "flat headers not found, trying composite headers");
        }
        other => return other,
    }
    match lookup_composite(df) {
        Err(SchemaError::MissingColumn(missing)) => {
            debug!(%missing, "composite headers not found, falling back to positions");
        }
        other => return other,
    }
    lookup_positional(df)
}

/// Project the selected columns and rename them to the output schema.
pub fn project(df: &DataFrame, selection: &ColumnSelection) -> Result<DataFrame, SchemaError> {
    let projected = df
        .clone()
        .lazy()
        .select([
            col(selection.date.as_str()).alias(DATE_COLUMN),
            col(selection.close.as_str()).alias(PRICE_COLUMN),
        ])
        .collect()?;
    Ok(projected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> DataFrame {
        df!(
            "Date" => &["2015-01-02", "2015-01-05"],
            "Open" => &[27.85, 27.07],
            "High" => &[27.86, 27.16],
            "Low" => &[26.84, 26.35],
            "Close" => &[27.332, 26.568],
            "Volume" => &[212_818_400i64, 257_142_000],
        )
        .unwrap()
    }

    fn composite() -> DataFrame {
        df!(
            "Price|Ticker|Date" => &["2015-01-02", "2015-01-05"],
            "Open|AAPL" => &[27.85, 27.07],
            "High|AAPL" => &[27.86, 27.16],
            "Low|AAPL" => &[26.84, 26.35],
            "Close|AAPL" => &[27.332, 26.568],
            "Volume|AAPL" => &[212_818_400i64, 257_142_000],
        )
        .unwrap()
    }

    #[test]
    fn flat_headers_resolve_by_name() {
        let sel = resolve_columns(&flat()).unwrap();
        assert_eq!(sel.resolution, Resolution::Named);
        assert_eq!(sel.date, "Date");
        assert_eq!(sel.close, "Close");
    }

    #[test]
    fn composite_headers_resolve_through_levels() {
        let sel = resolve_columns(&composite()).unwrap();
        assert_eq!(sel.resolution, Resolution::Composite);
        assert_eq!(sel.date, "Price|Ticker|Date");
        assert_eq!(sel.close, "Close|AAPL");
    }

    #[test]
    fn adj_close_level_is_not_close() {
        let df = df!(
            "Price|Ticker|Date" => &["2015-01-02"],
            "Adj Close|AAPL" => &[24.4],
            "Close|AAPL" => &[27.33],
        )
        .unwrap();
        assert_eq!(lookup_composite(&df).unwrap().close, "Close|AAPL");
    }

    #[test]
    fn flat_date_with_composite_values_resolves_by_level() {
        let df = df!(
            "Date" => &["2015-01-02"],
            "Close|AAPL" => &[27.33],
            "High|AAPL" => &[27.86],
            "Low|AAPL" => &[26.84],
            "Open|AAPL" => &[27.85],
            "Volume|AAPL" => &[212_818_400i64],
        )
        .unwrap();
        let sel = resolve_columns(&df).unwrap();
        assert_eq!(sel.resolution, Resolution::Composite);
        assert_eq!(sel.date, "Date");
        assert_eq!(sel.close, "Close|AAPL");
    }

    #[test]
    fn unknown_headers_fall_back_to_positions() {
        let df = df!(
            "0" => &["2015-01-02"],
            "1" => &[27.85],
            "2" => &[27.86],
            "3" => &[26.84],
            "4" => &[27.33],
            "5" => &[212_818_400i64],
        )
        .unwrap();
        let sel = resolve_columns(&df).unwrap();
        assert_eq!(sel.resolution, Resolution::Positional);
        assert_eq!(sel.date, "0");
        assert_eq!(sel.close, "4");
    }

    #[test]
    fn narrow_table_cannot_fall_back() {
        let df = df!("a" => &["2015-01-02"], "b" => &[1.0]).unwrap();
        assert!(matches!(
            resolve_columns(&df),
            Err(SchemaError::TooFewColumns { needed: 5, found: 2 })
        ));
    }

    #[test]
    fn multiple_tickers_are_ambiguous() {
        let df = df!(
            "Price|Ticker|Date" => &["2015-01-02"],
            "Close|AAPL" => &[27.33],
            "Close|MSFT" => &[46.76],
        )
        .unwrap();
        assert!(matches!(
            resolve_columns(&df),
            Err(SchemaError::AmbiguousColumn { .. })
        ));
    }

    #[test]
    fn projection_renames_to_output_schema() {
        let df = composite();
        let sel = resolve_columns(&df).unwrap();
        let projected = project(&df, &sel).unwrap();
        let names: Vec<String> = column_names(&projected);
        assert_eq!(names, vec![DATE_COLUMN, PRICE_COLUMN]);
        assert_eq!(projected.height(), 2);
    }
}
