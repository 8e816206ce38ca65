pub mod documents;
pub mod feature_table;

pub use documents::{
    DocumentFormat,
    RunDocument,
};
pub use feature_table::write_feature_table;
