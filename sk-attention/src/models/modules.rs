mod branch;
mod gate;
mod norm;
mod projection_head;

pub use branch::*;
pub use gate::*;
pub use norm::*;
pub use projection_head::*;
