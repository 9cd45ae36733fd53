pub mod hydration_record;
pub mod settings;

pub use hydration_record::{reconcile, HydrationRecord};
pub use settings::Settings;
