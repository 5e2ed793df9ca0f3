pub mod compositor;
pub mod dom;
pub mod geometry;
pub mod normalizer;
pub mod scheduler;

pub use compositor::*;
pub use geometry::*;
pub use normalizer::*;
pub use scheduler::*;
