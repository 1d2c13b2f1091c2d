pub mod classifier;
pub mod download_watcher;
pub mod result_writer;

pub use classifier::{Classification, DocumentClassifier, DocumentKind};
pub use download_watcher::DownloadWatcher;
pub use result_writer::ResultWriter;
