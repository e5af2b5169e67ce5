pub mod agent;
pub mod booking;
pub mod message;
pub mod params;
pub mod quiz;
pub mod suggestion;
