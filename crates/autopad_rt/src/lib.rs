pub mod report;
pub mod transport;
