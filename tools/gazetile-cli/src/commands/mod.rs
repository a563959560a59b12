pub mod fit;
pub mod info;
pub mod replay;
