pub(crate) mod detect_utils;
pub mod manager;
pub mod process_source;
pub(crate) mod process_utils;
pub mod profile;

pub use manager::{
    AdapterResult, CommandOutcome, ManagerAdapter, ManagerSource, QueryMode, UpgradeAdapter,
    rejects_structured_query,
};
pub use process_source::ProcessManagerSource;
pub use profile::{ManagerProfile, WINGET_UPDATE_NOT_APPLICABLE};
