use thiserror::Error;

use crate::panel::PanelId;
use crate::tree::ElementId;

/// Usage errors raised by tree mutations and queries.
///
/// Every variant is detected before any state is touched, so a failed call
/// leaves the tree exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("element {0:?} is not part of this tree")]
    StaleElement(ElementId),
    #[error("panel {0:?} is not part of this tree")]
    StalePanel(PanelId),
    #[error("index out of range: {index} (child count {count})")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("cannot insert element as its own child")]
    SelfInsertion,
    #[error("cannot insert an ancestor into one of its descendants")]
    WouldCreateCycle,
    #[error("cannot modify element hierarchy during layout calculation")]
    DuringLayout,
    #[error("elements are not siblings")]
    NotSiblings,
    #[error("element {0:?} is not a child of this element")]
    NotAChild(ElementId),
    #[error("cannot add directly to this element, use the hierarchy API if you know what you're doing")]
    NoContentContainer,
}

pub type Result<T, E = HierarchyError> = std::result::Result<T, E>;

/// Outcome of an immediate-mode handler that did not run to completion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuiError {
    /// Non-local early exit out of the current replay pass. Not a failure.
    #[error("exit gui")]
    ExitGui,
    #[error("getting control {index}'s position in a group with only {available} controls")]
    LayoutMismatch { index: usize, available: usize },
    #[error("gui handler failed: {0}")]
    Handler(String),
}

impl GuiError {
    pub fn handler(message: impl Into<String>) -> Self {
        GuiError::Handler(message.into())
    }

    pub fn is_exit_gui(&self) -> bool {
        matches!(self, GuiError::ExitGui)
    }
}
