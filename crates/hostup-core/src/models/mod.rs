pub mod error;
pub mod exclusion;
pub mod manager;
pub mod package;

pub use error::{CoreError, CoreErrorKind};
pub use exclusion::ExclusionSet;
pub use manager::{ManagerAction, ManagerDescriptor, ManagerKind};
pub use package::{
    SPAWN_FAILURE_EXIT_CODE, UpgradeCandidate, UpgradeResult, UpgradeStatus, normalize_id,
};
