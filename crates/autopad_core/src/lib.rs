pub mod calendar;
pub mod echo;
pub mod frame;
pub mod model;
pub mod script;
pub mod sequencer;
pub mod session;
