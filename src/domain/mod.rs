pub mod quote;

pub use quote::{normalize, seed_quotes, Quote, RawEntry, RawRecord};
