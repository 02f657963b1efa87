pub mod analysis;
pub mod extraction;
