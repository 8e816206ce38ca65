pub mod correlation;
pub mod stats;
pub mod top_n;
