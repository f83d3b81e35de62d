//! Infrastructure layer: the only code that touches CDP

pub mod chrome_page;
pub mod page_driver;

pub use chrome_page::{ChromeContext, ChromePage};
pub use page_driver::{BrowserSession, Locator, PageDriver, PopupWatch, ResponseWatch};
