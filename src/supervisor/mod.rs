pub mod clock;
pub mod machine;

pub use clock::*;
pub use machine::*;
