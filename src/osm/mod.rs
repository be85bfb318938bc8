pub mod parser;
pub mod store;

pub use parser::extract_features;
pub use store::{PrimitiveStore, RelationRecord, WayRecord};
