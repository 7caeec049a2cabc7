pub mod series_file;

pub use series_file::{load_series, save_series};
