pub mod sentiment;
pub(crate) mod stats;
