pub mod annotations;
pub mod stickers;
pub mod text;
