pub mod filter;
pub mod goals;
pub mod relations;
pub mod retention;
pub mod review;
pub mod stats;
