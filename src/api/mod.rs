pub mod nominatim;
pub mod overpass;

pub use nominatim::{City, geocode_city};
pub use overpass::{Element, FeatureQuery, Member, OverpassResponse, fetch_features};
