//! Data providers and raw price tables

pub mod frame;
pub mod import;
pub mod provider;
pub mod yahoo;

pub use frame::{bars_to_frame, HeaderLayout, HEADER_LEVEL_SEPARATOR};
pub use import::CsvImportProvider;
pub use provider::{
    DataError, DataProvider, DataSource, FetchRequest, FetchResult, PriceAdjustment, RawBar,
};
pub use yahoo::YahooProvider;
