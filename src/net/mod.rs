pub mod address;
pub mod traits;
pub mod tcp;
pub mod sim;

pub use address::*;
pub use traits::*;
pub use tcp::*;
pub use sim::*;
