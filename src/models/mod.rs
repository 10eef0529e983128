pub mod quiz;
pub mod session;
