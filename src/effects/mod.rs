pub mod blur;
pub mod bokeh;
pub mod double_exposure;
pub mod duotone;
pub mod glitch;
pub mod light_leaks;
pub mod shadow;
