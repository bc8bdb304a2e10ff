pub mod filters;
pub mod layer;
pub mod mask;
pub mod pipeline;
pub mod surface;
