// Export modules for use in tests
pub mod pdf;
pub mod settings;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export viewer components
pub use pdf::{Command, DisplayRequest, DocumentRef, PdfViewer, ViewerConfig, ViewerStatus};
pub use settings::Settings;
