pub mod observation;

pub use observation::{Account, HourBucket, Observation};
