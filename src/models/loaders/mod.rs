pub mod processed_ids;

pub use processed_ids::load_processed_ids;
