use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::models::{ManagerAction, ManagerKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    InvalidInput,
    Timeout,
    ProcessFailure,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoreError {
    pub manager: Option<ManagerKind>,
    pub action: Option<ManagerAction>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn for_action(
        manager: ManagerKind,
        action: ManagerAction,
        kind: CoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            manager: Some(manager),
            action: Some(action),
            kind,
            message: message.into(),
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.manager {
            Some(manager) => write!(f, "{:?} ({}): {}", self.kind, manager.as_str(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for CoreError {}
