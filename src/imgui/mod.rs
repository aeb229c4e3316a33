//! Immediate-mode side of the bridge: events, ambient per-thread state, the
//! layout cache handlers reserve rects from, and the container element that
//! replays events through a handler.

pub mod container;
pub mod event;
pub mod layout_cache;
pub mod state;

pub use container::{on_gui, ContextType, ImguiContainer, OnGuiHandler, Replay};
pub use event::{EventType, ImEvent, Modifiers, NEW_KEYBOARD_FOCUS};
pub use layout_cache::{GuiFrame, LayoutCache};
pub use state::{GlobalsScope, GuiGlobals, ObjectGuiState, ParentClipScope};
