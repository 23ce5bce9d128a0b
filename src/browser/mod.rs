pub mod launcher;
pub mod session;

// Re-export common types
pub use launcher::{BrowserLauncher, BrowserPage};
pub use session::{RenderSession, WebDriverLauncher};
