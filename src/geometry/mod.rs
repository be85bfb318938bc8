pub mod projection;
pub mod scaling;
pub mod simplify;

pub use projection::Projector;
pub use scaling::{Bounds, Scaler};
pub use simplify::{pixel_epsilon, simplify_polyline};
