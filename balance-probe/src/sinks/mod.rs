pub mod series_file;

pub use series_file::SeriesFile;
