//! Shaping a raw provider table into the two-column price file

pub mod csv_out;
pub mod exporter;
pub mod schema;
pub mod select;
pub mod series;

pub use csv_out::{parse_csv, render_csv, write_csv};
pub use exporter::{shape_table, ExportError, ExportOutcome, ExportRequest, PriceSeriesExporter};
pub use schema::{PriceSchema, SchemaError, DATE_COLUMN, PRICE_COLUMN};
pub use select::{resolve_columns, ColumnSelection, Resolution};
pub use series::{PriceRecord, PriceSeries};
