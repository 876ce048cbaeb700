pub mod classify;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod regions;
pub mod report;

pub use loader::{Table, TableLoader};
pub use models::Config;
pub use pipeline::{build_preference_list, FilterStats, PreferenceList};
