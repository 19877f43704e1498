pub mod batch;
pub mod memory;
pub mod projection;
pub mod sync;
pub mod traits;

pub use batch::*;
pub use memory::*;
pub use projection::*;
pub use sync::*;
pub use traits::*;
