pub mod delay;
pub mod logging;

pub use delay::{jitter, sleep_jitter};
pub use logging::truncate_text;
