pub mod logging;
pub mod poll;
