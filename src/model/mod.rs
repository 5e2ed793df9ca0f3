pub mod concept;
pub mod entity;
pub mod response;

pub use concept::*;
pub use entity::*;
pub use response::*;
