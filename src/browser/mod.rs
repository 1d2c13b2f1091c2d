pub mod headless;

pub use headless::{ChromiumLauncher, ChromiumSession};
