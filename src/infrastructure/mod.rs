pub mod session;
pub mod sleeper;

#[cfg(test)]
pub mod fake;

pub use session::{BrowserLauncher, BrowserSession};
pub use sleeper::{Sleeper, TokioSleeper};
