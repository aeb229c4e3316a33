pub mod child_list;
pub mod config;
pub mod element;
pub mod error;
pub mod events;
pub mod focus;
pub mod geometry;
pub mod hierarchy;
pub mod imgui;
pub mod layout;
pub mod logical;
pub mod panel;
pub mod query;
pub mod transform;
pub mod tree;

pub use error::{GuiError, HierarchyError, Result};
pub use tree::{ElementId, Tree};

pub mod prelude {
    pub use crate::config::{EventInterests, EventMask, PanelConfig};
    pub use crate::element::{Composite, Element, VisualElement};
    pub use crate::error::{GuiError, HierarchyError};
    pub use crate::events::{
        ElementEvent, EventResponse, HierarchyChange, InputEvent, InputKind, PointerType,
        VersionChange,
    };
    pub use crate::focus::{FocusChangeDirection, FocusController};
    pub use crate::geometry::{Color, LanguageDirection, Rect, Size};
    pub use crate::hierarchy::Hierarchy;
    pub use crate::imgui::{on_gui, EventType, GuiFrame, ImEvent, ImguiContainer, Replay};
    pub use crate::layout::MeasureMode;
    pub use crate::panel::{Panel, PanelId, RepaintData};
    pub use crate::transform::Transform;
    pub use crate::tree::{ElementFlags, ElementId, Tree};
}
