//! Retained-mode element that hosts an immediate-mode handler.
//!
//! Every relevant event is replayed through the handler. Before the handler
//! runs the container saves the ambient immediate-mode state, applies
//! pending focus changes and pushes its clip region. After it returns the
//! container reconciles tab navigation with the panel's focus controller,
//! restores the saved state, repairs an unbalanced clip stack and reports
//! measured-size changes to layout.

use std::cell::RefCell;
use std::rc::Rc;

use crate::element::Element;
use crate::error::GuiError;
use crate::events::{ElementEvent, EventResponse, InputEvent, InputKind, VersionChange};
use crate::focus::FocusChangeDirection;
use crate::geometry::{Color, Rect, Size};
use crate::imgui::state::{self, GlobalsScope, ObjectGuiState, ParentClipScope};
use crate::imgui::{EventType, GuiFrame, ImEvent, LayoutCache, NEW_KEYBOARD_FOCUS};
use crate::layout::{clamp_measured, MeasureMode};
use crate::panel::PanelId;
use crate::transform::Transform;
use crate::tree::{ElementId, Tree};

/// Immediate-mode handler. Returning [`GuiError::ExitGui`] unwinds the
/// current replay.
pub type OnGuiHandler = Rc<RefCell<dyn FnMut(&mut GuiFrame<'_>) -> Result<(), GuiError>>>;

/// Wrap a closure as an [`OnGuiHandler`].
pub fn on_gui(f: impl FnMut(&mut GuiFrame<'_>) -> Result<(), GuiError> + 'static) -> OnGuiHandler {
    Rc::new(RefCell::new(f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextType {
    Player,
    #[default]
    Editor,
}

/// Result of replaying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// Not delivered, or delivered and left unused.
    Ignored,
    /// The handler used the event.
    Consumed,
    /// The handler left a layout pass early with `ExitGui`.
    Exited,
}

impl Replay {
    pub fn is_consumed(self) -> bool {
        self == Replay::Consumed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassOutcome {
    Completed,
    Exited,
}

struct PassContext<'h> {
    handler: &'h OnGuiHandler,
    transform: Transform,
    clip: Rect,
    is_computing_layout: bool,
    layout_size: Rect,
    can_affect_focus: bool,
}

pub struct ImguiContainer {
    on_gui: Option<OnGuiHandler>,
    gui_state: Option<ObjectGuiState>,
    disposed: bool,
    cache: LayoutCache,
    culling_enabled: bool,
    refresh_cached_layout: bool,
    context_type: ContextType,
    play_mode_tint: Color,
    cached_clipping_rect: Rect,
    cached_transform: Transform,
    last_world_clip: Rect,
    lost_focus: bool,
    received_focus: bool,
    focus_change_direction: FocusChangeDirection,
    is_focus_delegated: bool,
    has_focusable_controls: bool,
    focus_only_if_has_focusable_controls: bool,
    new_keyboard_focus_control_id: i32,
}

impl ImguiContainer {
    pub fn new(handler: impl FnMut(&mut GuiFrame<'_>) -> Result<(), GuiError> + 'static) -> Self {
        Self::with_handler(Some(on_gui(handler)))
    }

    pub fn empty() -> Self {
        Self::with_handler(None)
    }

    pub fn with_handler(handler: Option<OnGuiHandler>) -> Self {
        Self {
            on_gui: handler,
            gui_state: None,
            disposed: false,
            cache: LayoutCache::new(),
            culling_enabled: false,
            refresh_cached_layout: true,
            context_type: ContextType::default(),
            play_mode_tint: Color::WHITE,
            cached_clipping_rect: Rect::ZERO,
            cached_transform: Transform::IDENTITY,
            last_world_clip: Rect::ZERO,
            lost_focus: false,
            received_focus: false,
            focus_change_direction: FocusChangeDirection::Unspecified,
            is_focus_delegated: false,
            has_focusable_controls: false,
            focus_only_if_has_focusable_controls: true,
            new_keyboard_focus_control_id: 0,
        }
    }

    pub fn with_context_type(mut self, context_type: ContextType) -> Self {
        self.context_type = context_type;
        self
    }

    pub fn with_play_mode_tint(mut self, tint: Color) -> Self {
        self.play_mode_tint = tint;
        self
    }

    pub fn with_culling(mut self, enabled: bool) -> Self {
        self.culling_enabled = enabled;
        self
    }

    /// When set, the container only takes focus while its handler creates
    /// focusable controls, and a click does not force focus onto it.
    pub fn focus_only_if_has_focusable_controls(mut self, value: bool) -> Self {
        self.focus_only_if_has_focusable_controls = value;
        self
    }

    pub fn has_handler(&self) -> bool {
        self.on_gui.is_some()
    }

    pub fn culling_enabled(&self) -> bool {
        self.culling_enabled
    }

    pub fn context_type(&self) -> ContextType {
        self.context_type
    }

    pub fn has_focusable_controls(&self) -> bool {
        self.has_focusable_controls
    }

    pub fn gui_state(&self) -> Option<&ObjectGuiState> {
        self.gui_state.as_ref()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Size measured by the most recent layout replay.
    pub fn layout_measured_size(&self) -> Size {
        Size::new(self.cache.measured_width(), self.cache.measured_height())
    }

    /// Replay an immediate-mode event through the container's handler.
    pub fn handle_event(tree: &mut Tree, id: ElementId, event: &mut ImEvent) -> Result<Replay, GuiError> {
        tree.with_imgui_container_mut(id, |container, tree| {
            container.handle_imgui_event(tree, id, event, true)
        })
        .unwrap_or(Ok(Replay::Ignored))
    }

    /// Deliver a retained-mode input event. Returns true when consumed.
    pub fn send_event(
        tree: &mut Tree,
        id: ElementId,
        event: &mut InputEvent,
        can_affect_focus: bool,
        verify_bounds: bool,
    ) -> Result<bool, GuiError> {
        tree.with_imgui_container_mut(id, |container, tree| {
            container.send_event_to_imgui(tree, id, event, can_affect_focus, verify_bounds)
        })
        .unwrap_or(Ok(false))
    }

    /// Replay the panel's repaint event, unless culled.
    pub fn repaint(tree: &mut Tree, id: ElementId) -> Result<Replay, GuiError> {
        tree.with_imgui_container_mut(id, |container, tree| container.do_repaint(tree, id))
            .unwrap_or(Ok(Replay::Ignored))
    }

    /// Force a layout replay before the next event.
    pub fn mark_dirty_layout(tree: &mut Tree, id: ElementId) {
        let marked = tree
            .with_imgui_container_mut(id, |container, _| container.refresh_cached_layout = true)
            .is_some();
        if marked {
            tree.increment_version(id, VersionChange::LAYOUT);
        }
    }

    pub fn set_on_gui_handler(tree: &mut Tree, id: ElementId, handler: Option<OnGuiHandler>) {
        let changed = tree
            .with_imgui_container_mut(id, |container, _| {
                let changed = match (&container.on_gui, &handler) {
                    (Some(old), Some(new)) => Rc::as_ptr(old).cast::<()>() != Rc::as_ptr(new).cast::<()>(),
                    (None, None) => false,
                    _ => true,
                };
                if changed {
                    container.on_gui = handler;
                }
                changed
            })
            .unwrap_or(false);

        if changed {
            tree.increment_version(id, VersionChange::LAYOUT | VersionChange::REPAINT);
        }
    }

    pub fn set_culling_enabled(tree: &mut Tree, id: ElementId, enabled: bool) {
        let changed = tree
            .with_imgui_container_mut(id, |container, _| {
                let changed = container.culling_enabled != enabled;
                container.culling_enabled = enabled;
                changed
            })
            .unwrap_or(false);

        if changed {
            tree.increment_version(id, VersionChange::LAYOUT | VersionChange::REPAINT);
        }
    }

    /// Release the container's control-id block. Later replays allocate a
    /// new one.
    pub fn dispose(tree: &mut Tree, id: ElementId) -> bool {
        tree.with_imgui_container_mut(id, |container, _| container.dispose_state())
            .unwrap_or(false)
    }

    fn dispose_state(&mut self) -> bool {
        self.disposed = true;
        match self.gui_state.take() {
            Some(released) => {
                log::debug!("released control ids at {}", released.id_base());
                true
            }
            None => false,
        }
    }

    fn owns_control(&self, id: i32) -> bool {
        self.gui_state.as_ref().is_some_and(|s| s.owns_id(id))
    }

    fn current_clip_rect(&self, tree: &Tree, this: ElementId) -> Rect {
        if self.last_world_clip.is_degenerate() {
            tree.world_bound(this)
        } else {
            self.last_world_clip
        }
    }

    fn current_transform_and_clip(&self, tree: &Tree, this: ElementId, event: &ImEvent) -> (Transform, Rect) {
        let clip = self.current_clip_rect(tree, this);
        let mut transform = tree.world_transform(this);
        if event.kind() == EventType::Repaint {
            if let Some(panel) = tree.panel_of(this).and_then(|p| tree.panel(p)) {
                transform = panel.repaint_data().current_offset.then(&transform);
            }
        }
        (transform, clip)
    }

    fn handle_imgui_event(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut ImEvent,
        can_affect_focus: bool,
    ) -> Result<Replay, GuiError> {
        let (transform, clip) = self.current_transform_and_clip(tree, this, event);
        self.replay(tree, this, event, transform, clip, can_affect_focus)
    }

    fn replay(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut ImEvent,
        transform: Transform,
        clip: Rect,
        can_affect_focus: bool,
    ) -> Result<Replay, GuiError> {
        let Some(handler) = self.on_gui.clone() else {
            return Ok(Replay::Ignored);
        };
        let Some(panel) = tree.panel_of(this).and_then(|p| tree.panel(p)) else {
            return Ok(Replay::Ignored);
        };
        let interests = panel.interests();
        let original = event.kind();
        if !interests.wants_event(original) {
            return Ok(Replay::Ignored);
        }

        let mut ctx = PassContext {
            handler: &handler,
            transform,
            clip,
            is_computing_layout: false,
            layout_size: tree.layout_rect(this),
            can_affect_focus,
        };

        if original != EventType::Layout {
            if self.refresh_cached_layout || interests.wants_layout_pass(original) {
                event.set_kind(EventType::Layout);
                let refreshed = self.do_on_gui(tree, this, event, &ctx);
                event.set_kind(original);
                self.refresh_cached_layout = false;
                refreshed?;
            } else {
                self.cache.reset_cursor();
            }
        }

        ctx.layout_size = tree.layout_rect(this);
        let outcome = self.do_on_gui(tree, this, event, &ctx)?;
        if outcome == PassOutcome::Exited {
            return Ok(Replay::Exited);
        }

        if self.new_keyboard_focus_control_id > 0 {
            self.new_keyboard_focus_control_id = 0;
            let mut command = ImEvent::command(NEW_KEYBOARD_FOCUS);
            self.handle_imgui_event(tree, this, &mut command, true)?;
        }

        self.finish_replay(tree, this, event, original)
    }

    fn finish_replay(
        &self,
        tree: &mut Tree,
        this: ElementId,
        event: &ImEvent,
        original: EventType,
    ) -> Result<Replay, GuiError> {
        if event.raw_type() == EventType::Used {
            return Ok(Replay::Consumed);
        }

        if original == EventType::MouseUp {
            if let Some(panel) = tree.panel_of(this).and_then(|p| tree.panel_mut(p)) {
                if panel.mouse_capture() == Some(this) {
                    state::set_hot_control(0);
                    panel.release_mouse(this);
                }
            }
        }

        // Detached while the event was being handled.
        if tree.panel_of(this).is_none() {
            return Err(GuiError::ExitGui);
        }
        Ok(Replay::Ignored)
    }

    fn do_on_gui(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut ImEvent,
        ctx: &PassContext<'_>,
    ) -> Result<PassOutcome, GuiError> {
        let Some(panel) = tree.panel_of(this) else {
            return Ok(PassOutcome::Completed);
        };
        let pixels_per_point = tree.panel(panel).map(|p| p.pixels_per_point()).unwrap_or(1.0);

        let clip_depth = state::clip_count();
        let previous_width = self.cache.measured_width();
        let previous_height = self.cache.measured_height();
        let original = event.kind();
        let is_layout = original == EventType::Layout;

        let globals = GlobalsScope::save();
        if self.context_type == ContextType::Editor {
            state::set_color(self.play_mode_tint);
        }
        state::set_pixels_per_point(pixels_per_point);
        state::set_display_index(event.display_index);

        if self.disposed {
            log::warn!("replaying disposed container {:?}", this);
            self.disposed = false;
        }
        let gui_state = self.gui_state.get_or_insert_with(ObjectGuiState::allocate);
        let fallback_focusable = gui_state.last_focusable().to_vec();
        let pass = state::begin_pass(gui_state.id_base());
        self.cache.begin(original, ctx.layout_size);

        if !is_layout {
            self.pre_process_focus(tree, panel, event, &fallback_focusable);
        }

        let (result, depth_after_handler) = {
            let _clip = ParentClipScope::new(ctx.transform, ctx.clip);
            let result = match ctx.handler.try_borrow_mut() {
                Ok(mut handler) => {
                    let mut frame = GuiFrame::new(event, &mut self.cache, this);
                    (&mut *handler)(&mut frame)
                }
                Err(_) => {
                    log::warn!("gui handler of {:?} is already running", this);
                    Ok(())
                }
            };
            (result, state::clip_count())
        };

        let mut outcome = PassOutcome::Completed;
        let mut failure = None;
        match result {
            Ok(()) => {}
            Err(GuiError::ExitGui) if is_layout => outcome = PassOutcome::Exited,
            Err(err) if is_layout => {
                log::error!("gui handler of {:?} failed during layout: {}", this, err);
            }
            Err(err) => failure = Some(err),
        }

        if !is_layout && ctx.can_affect_focus {
            self.post_process_focus(tree, panel, this, event, original);
        }

        let focusable = state::end_pass(pass);
        self.has_focusable_controls = !focusable.is_empty();
        if let Some(gui_state) = self.gui_state.as_mut() {
            gui_state.set_last_focusable(focusable);
        }
        self.cache.end();
        drop(globals);

        while state::clip_count() > clip_depth {
            state::pop_clip();
        }

        if let Some(err) = failure {
            return Err(err);
        }

        if is_layout
            && (previous_width != self.cache.measured_width()
                || previous_height != self.cache.measured_height())
        {
            if ctx.is_computing_layout {
                if let Some(p) = tree.panel_mut(panel) {
                    p.schedule(this, VersionChange::LAYOUT);
                }
            } else {
                tree.increment_version(this, VersionChange::LAYOUT);
            }
        }

        let expected_depth = clip_depth + 1;
        if outcome != PassOutcome::Exited
            && !matches!(event.kind(), EventType::Used | EventType::Ignore)
            && depth_after_handler != expected_depth
        {
            log::error!(
                "GUI clip push/pop mismatch in {:?}: expected depth {} after handler, found {}",
                this,
                expected_depth,
                depth_after_handler
            );
        }

        if event.kind() == EventType::Used {
            tree.increment_version(this, VersionChange::REPAINT);
        }
        Ok(outcome)
    }

    fn pre_process_focus(&mut self, tree: &mut Tree, panel: PanelId, event: &mut ImEvent, fallback: &[i32]) {
        if self.lost_focus {
            if self.owns_control(state::keyboard_control()) {
                state::set_keyboard_control(0);
                if let Some(p) = tree.panel_mut(panel) {
                    p.focus_mut().set_imgui_keyboard_control(0);
                }
            }
            self.lost_focus = false;
        }

        if self.received_focus {
            if self.has_focusable_controls {
                if self.focus_change_direction.is_navigation() {
                    if event.is_tab() {
                        event.use_event();
                    }
                    if self.focus_change_direction == FocusChangeDirection::Left {
                        state::set_keyboard_control_to_last_control_id(fallback);
                    } else {
                        state::set_keyboard_control_to_first_control_id(fallback);
                    }
                } else if state::keyboard_control() == 0 && self.is_focus_delegated {
                    state::set_keyboard_control_to_first_control_id(fallback);
                }
            }

            let keyboard = state::keyboard_control();
            if let Some(p) = tree.panel_mut(panel) {
                let focus = p.focus_mut();
                if focus.imgui_keyboard_control() != keyboard
                    && self.focus_change_direction != FocusChangeDirection::Unspecified
                {
                    self.new_keyboard_focus_control_id = keyboard;
                }
                focus.set_imgui_keyboard_control(keyboard);
            }

            self.received_focus = false;
            self.focus_change_direction = FocusChangeDirection::Unspecified;
        }
    }

    fn post_process_focus(
        &mut self,
        tree: &mut Tree,
        panel: PanelId,
        this: ElementId,
        event: &mut ImEvent,
        original: EventType,
    ) {
        let already_used = event.kind() == EventType::Used;
        let keyboard_before = state::keyboard_control();
        let result = state::check_for_tab_event(event);
        let Some(focused) = tree.panel(panel).map(|p| p.focus().leaf_focused_element()) else {
            return;
        };

        if result < 0 && !already_used {
            let direction = if result == -1 {
                FocusChangeDirection::Right
            } else {
                FocusChangeDirection::Left
            };
            let next = tree.focus_next_in_direction(panel, Some(this), direction);

            if focused == Some(this) {
                if next == Some(this) {
                    // Only focusable element in the panel: wrap inside.
                    if result == -2 {
                        state::set_keyboard_control_to_last_control_id(&[]);
                    } else {
                        state::set_keyboard_control_to_first_control_id(&[]);
                    }
                    let keyboard = state::keyboard_control();
                    self.new_keyboard_focus_control_id = keyboard;
                    if let Some(p) = tree.panel_mut(panel) {
                        p.focus_mut().set_imgui_keyboard_control(keyboard);
                    }
                } else {
                    state::set_keyboard_control(0);
                    if let Some(p) = tree.panel_mut(panel) {
                        p.focus_mut().set_imgui_keyboard_control(0);
                    }
                }
            }
        } else if result > 0 && !already_used {
            if let Some(p) = tree.panel_mut(panel) {
                p.focus_mut().set_imgui_keyboard_control(result);
            }
            self.new_keyboard_focus_control_id = result;
        } else if result == 0 {
            let keyboard = state::keyboard_control();
            let Some(focus) = tree.panel_mut(panel).map(|p| p.focus_mut()) else {
                return;
            };

            if original == EventType::MouseDown && !self.focus_only_if_has_focusable_controls {
                focus.sync_imgui_focus(keyboard, this, true);
            } else if keyboard_before != keyboard || original == EventType::MouseDown {
                focus.sync_imgui_focus(keyboard, this, false);
            } else if keyboard != focus.imgui_keyboard_control() {
                self.new_keyboard_focus_control_id = keyboard;
                if focused == Some(this) {
                    focus.set_imgui_keyboard_control(keyboard);
                } else {
                    focus.sync_imgui_focus(keyboard, this, false);
                }
            }
        }
    }

    fn send_event_to_imgui(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut InputEvent,
        can_affect_focus: bool,
        verify_bounds: bool,
    ) -> Result<bool, GuiError> {
        if !event.kind.is_pointer() {
            return self.send_raw(tree, this, event, can_affect_focus, verify_bounds);
        }
        if !event.imgui.is_direct_manipulation_device {
            return Ok(false);
        }

        let touch = match event.kind {
            InputKind::PointerDown => Some(EventType::TouchDown),
            InputKind::PointerUp => Some(EventType::TouchUp),
            InputKind::PointerMove if event.imgui.kind() == EventType::MouseDrag => Some(EventType::TouchMove),
            InputKind::PointerEnter => Some(EventType::TouchEnter),
            InputKind::PointerLeave => Some(EventType::TouchLeave),
            _ => None,
        };
        let Some(touch) = touch else {
            return Ok(false);
        };

        let original = event.imgui.kind();
        event.imgui.set_kind(touch);
        let result = self.send_raw(tree, this, event, can_affect_focus, verify_bounds);
        event.imgui.set_kind(original);
        result
    }

    fn send_raw(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut InputEvent,
        can_affect_focus: bool,
        verify_bounds: bool,
    ) -> Result<bool, GuiError> {
        if verify_bounds && !self.verify_bounds(tree, this, event) {
            return Ok(false);
        }
        let replay = self.handle_imgui_event(tree, this, &mut event.imgui, can_affect_focus)?;
        Ok(replay.is_consumed())
    }

    fn verify_bounds(&self, tree: &Tree, this: ElementId, event: &InputEvent) -> bool {
        let capturing = tree
            .panel_of(this)
            .and_then(|p| tree.panel(p))
            .and_then(|p| p.mouse_capture())
            == Some(this);
        capturing
            || !event.kind.is_local()
            || event.imgui.is_mouse_inside(&self.current_clip_rect(tree, this))
    }

    fn handle_bubble_up(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut ElementEvent,
    ) -> Result<EventResponse, GuiError> {
        match event {
            ElementEvent::Input(input) => {
                if self.send_event_to_imgui(tree, this, input, true, true)? {
                    Ok(EventResponse::Handled)
                } else {
                    Ok(EventResponse::Ignored)
                }
            }
            // The handler does its own keyboard navigation.
            ElementEvent::NavigationMove
            | ElementEvent::NavigationSubmit
            | ElementEvent::NavigationCancel => Ok(EventResponse::Handled),
            ElementEvent::Blur => {
                self.lost_focus = true;
                tree.increment_version(this, VersionChange::REPAINT);
                Ok(EventResponse::Ignored)
            }
            ElementEvent::Focus {
                direction,
                delegated,
            } => {
                self.received_focus = true;
                self.focus_change_direction = *direction;
                self.is_focus_delegated = *delegated;
                Ok(EventResponse::Ignored)
            }
        }
    }

    fn do_repaint(&mut self, tree: &mut Tree, this: ElementId) -> Result<Replay, GuiError> {
        let Some(data) = tree
            .panel_of(this)
            .and_then(|p| tree.panel(p))
            .map(|p| p.repaint_data().clone())
        else {
            return Ok(Replay::Ignored);
        };

        self.last_world_clip = data.current_world_clip;
        let world_bound = tree.world_bound(this);
        if self.culling_enabled && !world_bound.intersects(&data.current_world_clip) {
            log::trace!("culled {:?}", this);
            return Ok(Replay::Ignored);
        }

        self.cached_clipping_rect = data.current_offset.transform_rect(&world_bound);
        self.cached_transform = data.current_offset.then(&tree.world_transform(this));

        let mut event = data.repaint_event;
        let (transform, clip) = (self.cached_transform, self.cached_clipping_rect);
        self.replay(tree, this, &mut event, transform, clip, true)
    }

    fn do_measure(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        width: f32,
        width_mode: MeasureMode,
        height: f32,
        height_mode: MeasureMode,
    ) -> Size {
        let mut measured = Size::undefined();

        if width_mode != MeasureMode::Exactly || height_mode != MeasureMode::Exactly {
            if let Some(handler) = self.on_gui.clone() {
                let mut layout_size = tree.layout_rect(this);
                if width_mode == MeasureMode::Exactly {
                    layout_size.width = width;
                }
                if height_mode == MeasureMode::Exactly {
                    layout_size.height = height;
                }

                // Cached values: reading the live transform here would
                // disturb the transform's dirty state mid-layout.
                let ctx = PassContext {
                    handler: &handler,
                    transform: self.cached_transform,
                    clip: self.cached_clipping_rect,
                    is_computing_layout: true,
                    layout_size,
                    can_affect_focus: true,
                };
                let mut event = ImEvent::layout();
                if let Err(err) = self.do_on_gui(tree, this, &mut event, &ctx) {
                    log::error!("measuring {:?} failed: {}", this, err);
                }
                measured = Size::new(self.cache.measured_width(), self.cache.measured_height());
            }
        }

        Size::new(
            clamp_measured(measured.width, width, width_mode),
            clamp_measured(measured.height, height, height_mode),
        )
    }
}

impl Default for ImguiContainer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Element for ImguiContainer {
    fn requires_measure(&self) -> bool {
        true
    }

    fn focusable(&self) -> bool {
        true
    }

    fn can_grab_focus(&self) -> bool {
        !self.focus_only_if_has_focusable_controls || self.has_focusable_controls
    }

    fn measure(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        width: f32,
        width_mode: MeasureMode,
        height: f32,
        height_mode: MeasureMode,
    ) -> Size {
        self.do_measure(tree, this, width, width_mode, height, height_mode)
    }

    fn handle_event(
        &mut self,
        tree: &mut Tree,
        this: ElementId,
        event: &mut ElementEvent,
    ) -> Result<EventResponse, GuiError> {
        self.handle_bubble_up(tree, this, event)
    }

    fn as_imgui_container(&self) -> Option<&ImguiContainer> {
        Some(self)
    }

    fn as_imgui_container_mut(&mut self) -> Option<&mut ImguiContainer> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelConfig;

    fn attached(tree: &mut Tree, container: ImguiContainer) -> (PanelId, ElementId) {
        let panel = tree.create_panel(PanelConfig::default());
        let root = tree.panel(panel).unwrap().root();
        let id = tree.create_element(container);
        tree.add(root, id).unwrap();
        tree.set_layout_rect(id, Rect::new(0.0, 0.0, 100.0, 100.0));
        (panel, id)
    }

    #[test]
    fn test_gate_without_panel() {
        let mut tree = Tree::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let id = tree.create_element(ImguiContainer::new(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        let mut event = ImEvent::repaint();
        assert_eq!(ImguiContainer::handle_event(&mut tree, id, &mut event), Ok(Replay::Ignored));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_gate_without_handler() {
        let mut tree = Tree::new();
        let (_, id) = attached(&mut tree, ImguiContainer::empty());
        let mut event = ImEvent::repaint();
        assert_eq!(ImguiContainer::handle_event(&mut tree, id, &mut event), Ok(Replay::Ignored));
    }

    #[test]
    fn test_unwanted_event_is_ignored() {
        let mut tree = Tree::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let (_, id) = attached(
            &mut tree,
            ImguiContainer::new(move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        );

        let mut event = ImEvent::mouse(EventType::MouseMove, 1.0, 1.0);
        assert_eq!(ImguiContainer::handle_event(&mut tree, id, &mut event), Ok(Replay::Ignored));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_layout_pass_precedes_event() {
        let mut tree = Tree::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let (_, id) = attached(
            &mut tree,
            ImguiContainer::new(move |frame| {
                log.borrow_mut().push(frame.event_type());
                Ok(())
            }),
        );

        let mut event = ImEvent::mouse(EventType::MouseDown, 5.0, 5.0);
        ImguiContainer::handle_event(&mut tree, id, &mut event).unwrap();
        assert_eq!(*seen.borrow(), vec![EventType::Layout, EventType::MouseDown]);
        assert_eq!(event.kind(), EventType::MouseDown);
    }

    #[test]
    fn test_used_event_is_consumed_and_repaints() {
        let mut tree = Tree::new();
        let (panel, id) = attached(
            &mut tree,
            ImguiContainer::new(|frame| {
                if frame.event_type() == EventType::MouseDown {
                    frame.use_event();
                }
                Ok(())
            }),
        );
        tree.panel_mut(panel).unwrap().take_version_changes();

        let mut event = ImEvent::mouse(EventType::MouseDown, 5.0, 5.0);
        assert_eq!(
            ImguiContainer::handle_event(&mut tree, id, &mut event),
            Ok(Replay::Consumed)
        );
        let changes = tree.panel_mut(panel).unwrap().take_version_changes();
        assert!(changes
            .iter()
            .any(|(e, c)| *e == id && c.contains(VersionChange::REPAINT)));
    }

    #[test]
    fn test_handler_moving_keyboard_control_replays_new_focus_command() {
        let mut tree = Tree::new();
        let ids = Rc::new(RefCell::new((0, 0)));
        let focus_commands = Rc::new(RefCell::new(0));
        let (seen_ids, seen_commands) = (ids.clone(), focus_commands.clone());
        let (panel, id) = attached(
            &mut tree,
            ImguiContainer::new(move |frame| {
                let first = frame.control_id(true);
                let second = frame.control_id(true);
                *seen_ids.borrow_mut() = (first, second);

                let event = frame.event();
                let pressed_x = event.kind() == EventType::KeyDown && event.character == Some('x');
                let focus_command = event.kind() == EventType::ExecuteCommand
                    && event.command_name.as_deref() == Some(NEW_KEYBOARD_FOCUS);
                if pressed_x {
                    frame.set_keyboard_control(second);
                }
                if focus_command {
                    *seen_commands.borrow_mut() += 1;
                }
                Ok(())
            }),
        );
        let mut repaint = ImEvent::repaint();
        ImguiContainer::handle_event(&mut tree, id, &mut repaint).unwrap();
        let (first, second) = *ids.borrow();

        let focus = tree.panel_mut(panel).unwrap().focus_mut();
        focus.switch_focus(Some(id), FocusChangeDirection::Unspecified, false);
        focus.set_imgui_keyboard_control(first);
        state::set_keyboard_control(first);

        let mut key = ImEvent::key_down('x');
        ImguiContainer::handle_event(&mut tree, id, &mut key).unwrap();

        assert_eq!(state::keyboard_control(), second);
        assert_eq!(
            tree.panel(panel).unwrap().focus().imgui_keyboard_control(),
            second
        );
        assert_eq!(*focus_commands.borrow(), 1);
    }

    #[test]
    fn test_detached_during_replay_exits() {
        let mut tree = Tree::new();
        let (_, id) = attached(&mut tree, ImguiContainer::new(|_| Ok(())));
        tree.remove_from_hierarchy(id).unwrap();

        let unused = ImEvent::key_down('a');
        let result = tree.with_imgui_container_mut(id, |container, tree| {
            container.finish_replay(tree, id, &unused, EventType::KeyDown)
        });
        assert_eq!(result, Some(Err(GuiError::ExitGui)));

        let mut used = ImEvent::key_down('a');
        used.use_event();
        let result = tree.with_imgui_container_mut(id, |container, tree| {
            container.finish_replay(tree, id, &used, EventType::KeyDown)
        });
        assert_eq!(result, Some(Ok(Replay::Consumed)));
    }

    #[test]
    fn test_exit_gui_during_layout_is_not_an_error() {
        let mut tree = Tree::new();
        let (_, id) = attached(&mut tree, ImguiContainer::new(|frame| frame.exit_gui()));

        let mut layout = ImEvent::layout();
        assert_eq!(ImguiContainer::handle_event(&mut tree, id, &mut layout), Ok(Replay::Exited));

        let mut repaint = ImEvent::repaint();
        assert_eq!(
            ImguiContainer::handle_event(&mut tree, id, &mut repaint),
            Err(GuiError::ExitGui)
        );
    }

    #[test]
    fn test_handler_change_invalidates_layout_and_repaint() {
        let mut tree = Tree::new();
        let (panel, id) = attached(&mut tree, ImguiContainer::empty());
        tree.panel_mut(panel).unwrap().take_version_changes();

        ImguiContainer::set_on_gui_handler(&mut tree, id, Some(on_gui(|_| Ok(()))));
        let changes = tree.panel_mut(panel).unwrap().take_version_changes();
        assert_eq!(changes, vec![(id, VersionChange::LAYOUT | VersionChange::REPAINT)]);

        ImguiContainer::set_culling_enabled(&mut tree, id, false);
        assert!(tree.panel_mut(panel).unwrap().take_version_changes().is_empty());
    }

    #[test]
    fn test_dispose_releases_control_ids() {
        let mut tree = Tree::new();
        let (_, id) = attached(&mut tree, ImguiContainer::new(|_| Ok(())));
        let mut repaint = ImEvent::repaint();
        ImguiContainer::handle_event(&mut tree, id, &mut repaint).unwrap();

        assert!(ImguiContainer::dispose(&mut tree, id));
        assert!(!ImguiContainer::dispose(&mut tree, id));
        let disposed = tree
            .with_element(id, |e| e.as_imgui_container().map(|c| c.is_disposed()))
            .flatten();
        assert_eq!(disposed, Some(true));
    }

    #[test]
    fn test_culling_skips_offscreen_repaint() {
        let mut tree = Tree::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let (panel, id) = attached(
            &mut tree,
            ImguiContainer::new(move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            })
            .with_culling(true),
        );

        tree.panel_mut(panel).unwrap().set_repaint_data(crate::panel::RepaintData {
            current_world_clip: Rect::new(500.0, 500.0, 10.0, 10.0),
            ..Default::default()
        });
        assert_eq!(ImguiContainer::repaint(&mut tree, id), Ok(Replay::Ignored));
        assert_eq!(*calls.borrow(), 0);

        tree.panel_mut(panel).unwrap().set_repaint_data(crate::panel::RepaintData {
            current_world_clip: Rect::new(0.0, 0.0, 50.0, 50.0),
            ..Default::default()
        });
        ImguiContainer::repaint(&mut tree, id).unwrap();
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_touch_translation() {
        let mut tree = Tree::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let (_, id) = attached(
            &mut tree,
            ImguiContainer::new(move |frame| {
                if frame.event_type() != EventType::Layout {
                    log.borrow_mut().push(frame.event_type());
                }
                Ok(())
            }),
        );

        let mut mouse_pointer = InputEvent::new(
            InputKind::PointerDown,
            ImEvent::mouse(EventType::MouseDown, 1.0, 1.0),
        );
        assert_eq!(
            ImguiContainer::send_event(&mut tree, id, &mut mouse_pointer, true, true),
            Ok(false)
        );

        let mut touch = InputEvent::new(
            InputKind::PointerDown,
            ImEvent::mouse(EventType::MouseDown, 1.0, 1.0),
        )
        .with_pointer_type(crate::events::PointerType::Touch);
        ImguiContainer::send_event(&mut tree, id, &mut touch, true, true).unwrap();
        assert_eq!(touch.imgui.kind(), EventType::MouseDown);
        assert_eq!(*seen.borrow(), vec![EventType::TouchDown]);
    }

    #[test]
    fn test_verify_bounds_rejects_outside_clicks() {
        let mut tree = Tree::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let (_, id) = attached(
            &mut tree,
            ImguiContainer::new(move |_| {
                *counter.borrow_mut() += 1;
                Ok(())
            }),
        );

        let mut outside = InputEvent::new(
            InputKind::MouseDown,
            ImEvent::mouse(EventType::MouseDown, 300.0, 300.0),
        );
        assert_eq!(
            ImguiContainer::send_event(&mut tree, id, &mut outside, true, true),
            Ok(false)
        );
        assert_eq!(*calls.borrow(), 0);

        let mut key = InputEvent::new(InputKind::KeyDown, ImEvent::key_down('a'));
        ImguiContainer::send_event(&mut tree, id, &mut key, true, true).unwrap();
        assert_eq!(*calls.borrow(), 2);
    }
}
