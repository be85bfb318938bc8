pub mod feature;
pub mod polygon;
pub mod primitives;
pub mod street;

pub use feature::{ElementKind, Feature, FeatureId, FeatureKind, FeatureSource};
pub use polygon::{OpenPath, Polygon, Ring};
pub use primitives::{Point, PointId, Role, Segment};
pub use street::StreetClass;
