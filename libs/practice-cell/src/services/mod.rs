pub mod appointments;
pub mod practice;
