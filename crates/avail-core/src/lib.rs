pub mod codec;
pub mod ids;
pub mod model;
pub mod types;

pub use codec::*;
pub use ids::*;
pub use model::*;
pub use types::*;
