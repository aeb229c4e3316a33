//! Focus management.
//!
//! Each panel has a [`FocusController`] tracking the focused element and the
//! immediate-mode control that owns keyboard focus inside it. Focus changes
//! are queued as [`FocusEvent`]s and delivered by
//! [`Tree::dispatch_focus_events`].

use std::collections::VecDeque;

use crate::error::GuiError;
use crate::events::ElementEvent;
use crate::panel::PanelId;
use crate::tree::{ElementFlags, ElementId, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusChangeDirection {
    #[default]
    Unspecified,
    None,
    Left,
    Right,
}

impl FocusChangeDirection {
    /// True for the directions that move through the focus ring.
    pub fn is_navigation(self) -> bool {
        matches!(self, FocusChangeDirection::Left | FocusChangeDirection::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Focus {
        target: ElementId,
        direction: FocusChangeDirection,
        delegated: bool,
    },
    Blur {
        target: ElementId,
    },
}

#[derive(Debug, Default)]
pub struct FocusController {
    focused: Option<ElementId>,
    imgui_keyboard_control: i32,
    pending: VecDeque<FocusEvent>,
}

impl FocusController {
    pub fn focused_element(&self) -> Option<ElementId> {
        self.focused
    }

    /// Innermost focused element. Focus delegation is resolved eagerly, so
    /// this is the focused element itself.
    pub fn leaf_focused_element(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn imgui_keyboard_control(&self) -> i32 {
        self.imgui_keyboard_control
    }

    pub fn set_imgui_keyboard_control(&mut self, id: i32) {
        self.imgui_keyboard_control = id;
    }

    /// Move focus to `target`, queueing blur and focus events.
    pub fn switch_focus(
        &mut self,
        target: Option<ElementId>,
        direction: FocusChangeDirection,
        delegated: bool,
    ) {
        if self.focused == target {
            return;
        }
        if let Some(old) = self.focused.take() {
            self.pending.push_back(FocusEvent::Blur { target: old });
        }
        self.focused = target;
        if let Some(new) = target {
            log::debug!("focus -> {:?} ({:?})", new, direction);
            self.pending.push_back(FocusEvent::Focus {
                target: new,
                direction,
                delegated,
            });
        }
    }

    pub fn blur(&mut self, id: ElementId) {
        if self.focused == Some(id) {
            self.switch_focus(None, FocusChangeDirection::Unspecified, false);
        }
    }

    /// Record the immediate-mode keyboard control and focus the container
    /// that owns it.
    pub fn sync_imgui_focus(&mut self, control_id: i32, container: ElementId, force: bool) {
        self.imgui_keyboard_control = control_id;
        if force || control_id != 0 {
            self.switch_focus(Some(container), FocusChangeDirection::Unspecified, false);
        } else {
            self.switch_focus(None, FocusChangeDirection::Unspecified, false);
        }
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn take_pending(&mut self) -> Vec<FocusEvent> {
        self.pending.drain(..).collect()
    }

    pub(crate) fn on_element_detached(&mut self, id: ElementId) {
        if self.focused == Some(id) {
            self.focused = None;
            self.imgui_keyboard_control = 0;
        }
    }
}

const MAX_FOCUS_ROUNDS: usize = 16;

impl Tree {
    /// Focusable, enabled elements of a panel in depth-first order.
    pub fn focus_ring(&self, panel: PanelId) -> Vec<ElementId> {
        let Some(root) = self.panel(panel).map(|p| p.root()) else {
            return Vec::new();
        };

        let mut ring = Vec::new();
        let mut current = Some(root);
        while let Some(id) = current {
            if self.flags(id).contains(ElementFlags::FOCUSABLE)
                && self.enabled_in_hierarchy(id)
                // An element whose behaviour is running is asking about itself.
                && self.with_element(id, |e| e.can_grab_focus()).unwrap_or(true)
            {
                ring.push(id);
            }
            current = self.next_element_depth_first(id, Some(root));
        }
        ring
    }

    /// Focus the next focusable element after `from` in `direction`,
    /// wrapping around at either end.
    pub fn focus_next_in_direction(
        &mut self,
        panel: PanelId,
        from: Option<ElementId>,
        direction: FocusChangeDirection,
    ) -> Option<ElementId> {
        if !direction.is_navigation() {
            return None;
        }
        let ring = self.focus_ring(panel);
        if ring.is_empty() {
            return None;
        }

        let len = ring.len();
        let position = from.and_then(|f| ring.iter().position(|&id| id == f));
        let next = match direction {
            FocusChangeDirection::Right => position.map(|p| (p + 1) % len).unwrap_or(0),
            _ => position.map(|p| (p + len - 1) % len).unwrap_or(len - 1),
        };
        let target = ring[next];

        self.panel_mut(panel)?
            .focus_mut()
            .switch_focus(Some(target), direction, false);
        Some(target)
    }

    /// Deliver queued focus and blur events of a panel to their targets.
    pub fn dispatch_focus_events(&mut self, panel: PanelId) -> Result<(), GuiError> {
        for _ in 0..MAX_FOCUS_ROUNDS {
            let events = match self.panel_mut(panel) {
                Some(p) if p.focus().has_pending_events() => p.focus_mut().take_pending(),
                _ => return Ok(()),
            };

            for event in events {
                let (target, mut element_event) = match event {
                    FocusEvent::Focus {
                        target,
                        direction,
                        delegated,
                    } => (target, ElementEvent::Focus { direction, delegated }),
                    FocusEvent::Blur { target } => (target, ElementEvent::Blur),
                };
                self.dispatch_event(target, &mut element_event)?;
            }
        }

        log::warn!("focus events still pending after {} rounds", MAX_FOCUS_ROUNDS);
        Ok(())
    }
}
