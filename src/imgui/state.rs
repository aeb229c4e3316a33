//! Immediate-mode global state.
//!
//! Handlers expect ambient, process-wide drawing state (matrix, colors,
//! enabled flag, keyboard focus, clip stack). It lives in a thread-local so
//! that the container can snapshot it before a replay and restore it after.

use std::cell::RefCell;

use crate::geometry::{Color, Rect};
use crate::imgui::ImEvent;
use crate::transform::Transform;

/// Size of the control-id block reserved for one container.
pub const CONTROL_ID_BLOCK: i32 = 1 << 16;

/// Ambient drawing state saved and restored around every replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuiGlobals {
    pub matrix: Transform,
    pub color: Color,
    pub content_color: Color,
    pub background_color: Color,
    pub enabled: bool,
    pub changed: bool,
    pub display_index: i32,
    pub pixels_per_point: f32,
}

impl Default for GuiGlobals {
    fn default() -> Self {
        Self {
            matrix: Transform::IDENTITY,
            color: Color::WHITE,
            content_color: Color::WHITE,
            background_color: Color::WHITE,
            enabled: true,
            changed: false,
            display_index: 0,
            pixels_per_point: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ClipFrame {
    transform: Transform,
    rect: Rect,
}

#[derive(Debug)]
struct ContainerPass {
    id_base: i32,
    next_offset: i32,
    focusable: Vec<i32>,
}

#[derive(Debug, Default)]
struct GuiState {
    globals: GuiGlobals,
    keyboard_control: i32,
    hot_control: i32,
    clips: Vec<ClipFrame>,
    pass: Option<ContainerPass>,
    blocks_allocated: i32,
}

thread_local! {
    static GUI_STATE: RefCell<GuiState> = RefCell::new(GuiState::default());
}

fn with_state<R>(f: impl FnOnce(&mut GuiState) -> R) -> R {
    GUI_STATE.with(|cell| f(&mut cell.borrow_mut()))
}

pub fn globals() -> GuiGlobals {
    with_state(|s| s.globals)
}

pub fn set_globals(globals: GuiGlobals) {
    with_state(|s| s.globals = globals);
}

pub fn matrix() -> Transform {
    with_state(|s| s.globals.matrix)
}

pub fn set_matrix(matrix: Transform) {
    with_state(|s| s.globals.matrix = matrix);
}

pub fn color() -> Color {
    with_state(|s| s.globals.color)
}

pub fn set_color(color: Color) {
    with_state(|s| s.globals.color = color);
}

pub fn set_content_color(color: Color) {
    with_state(|s| s.globals.content_color = color);
}

pub fn set_background_color(color: Color) {
    with_state(|s| s.globals.background_color = color);
}

pub fn enabled() -> bool {
    with_state(|s| s.globals.enabled)
}

pub fn set_enabled(enabled: bool) {
    with_state(|s| s.globals.enabled = enabled);
}

pub fn changed() -> bool {
    with_state(|s| s.globals.changed)
}

pub fn set_changed(changed: bool) {
    with_state(|s| s.globals.changed = changed);
}

pub fn display_index() -> i32 {
    with_state(|s| s.globals.display_index)
}

pub fn set_display_index(index: i32) {
    with_state(|s| s.globals.display_index = index);
}

pub fn pixels_per_point() -> f32 {
    with_state(|s| s.globals.pixels_per_point)
}

pub fn set_pixels_per_point(value: f32) {
    with_state(|s| s.globals.pixels_per_point = value);
}

/// Control id that owns keyboard focus. 0 means none.
pub fn keyboard_control() -> i32 {
    with_state(|s| s.keyboard_control)
}

pub fn set_keyboard_control(id: i32) {
    with_state(|s| s.keyboard_control = id);
}

/// Control id that captured the mouse. 0 means none.
pub fn hot_control() -> i32 {
    with_state(|s| s.hot_control)
}

pub fn set_hot_control(id: i32) {
    with_state(|s| s.hot_control = id);
}

/// Saves [`GuiGlobals`] on creation and restores them when dropped.
pub struct GlobalsScope {
    saved: GuiGlobals,
}

impl GlobalsScope {
    pub fn save() -> Self {
        Self { saved: globals() }
    }

    pub fn saved(&self) -> &GuiGlobals {
        &self.saved
    }
}

impl Drop for GlobalsScope {
    fn drop(&mut self) {
        set_globals(self.saved);
    }
}

pub fn push_clip(transform: Transform, rect: Rect) {
    with_state(|s| s.clips.push(ClipFrame { transform, rect }));
}

/// Pop the innermost clip. Returns false when the stack was empty.
pub fn pop_clip() -> bool {
    with_state(|s| s.clips.pop().is_some())
}

pub fn clip_count() -> usize {
    with_state(|s| s.clips.len())
}

/// Innermost clip rect in world space.
pub fn visible_rect() -> Option<Rect> {
    with_state(|s| {
        s.clips
            .last()
            .map(|frame| frame.transform.transform_rect(&frame.rect))
    })
}

/// Clip region a container's handler runs inside.
///
/// Pushed on creation and popped on drop, unless the handler already popped
/// it.
pub struct ParentClipScope {
    depth: usize,
}

impl ParentClipScope {
    pub fn new(transform: Transform, rect: Rect) -> Self {
        push_clip(transform, rect);
        Self { depth: clip_count() }
    }
}

impl Drop for ParentClipScope {
    fn drop(&mut self) {
        if clip_count() >= self.depth {
            pop_clip();
        }
    }
}

/// Block of control ids owned by one container.
#[derive(Debug)]
pub struct ObjectGuiState {
    id_base: i32,
    last_focusable: Vec<i32>,
}

impl ObjectGuiState {
    /// Reserve a fresh block of control ids on this thread.
    pub fn allocate() -> Self {
        let block = with_state(|s| {
            s.blocks_allocated = match s.blocks_allocated.checked_add(1) {
                Some(next) if next < i32::MAX / CONTROL_ID_BLOCK => next,
                _ => {
                    log::warn!("control id blocks exhausted, reusing from the start");
                    1
                }
            };
            s.blocks_allocated
        });
        Self {
            id_base: block * CONTROL_ID_BLOCK,
            last_focusable: Vec::new(),
        }
    }

    pub fn id_base(&self) -> i32 {
        self.id_base
    }

    pub fn owns_id(&self, id: i32) -> bool {
        id >= self.id_base && id < self.id_base + CONTROL_ID_BLOCK
    }

    /// Focusable control ids seen during the most recent pass.
    pub fn last_focusable(&self) -> &[i32] {
        &self.last_focusable
    }

    pub(crate) fn set_last_focusable(&mut self, ids: Vec<i32>) {
        self.last_focusable = ids;
    }
}

/// Previous pass, restored by [`end_pass`].
pub(crate) struct PassToken {
    previous: Option<ContainerPass>,
}

/// Start handing out control ids from `id_base`.
pub(crate) fn begin_pass(id_base: i32) -> PassToken {
    let pass = ContainerPass {
        id_base,
        next_offset: 1,
        focusable: Vec::new(),
    };
    PassToken {
        previous: with_state(|s| s.pass.replace(pass)),
    }
}

/// Finish the current pass and return the focusable ids it produced.
pub(crate) fn end_pass(token: PassToken) -> Vec<i32> {
    with_state(|s| {
        let finished = std::mem::replace(&mut s.pass, token.previous);
        finished.map(|p| p.focusable).unwrap_or_default()
    })
}

/// Next control id of the running container. 0 outside a replay.
pub fn get_control_id(focusable: bool) -> i32 {
    with_state(|s| match s.pass.as_mut() {
        Some(pass) => {
            let id = pass.id_base + pass.next_offset;
            pass.next_offset = (pass.next_offset + 1) % CONTROL_ID_BLOCK;
            if focusable {
                pass.focusable.push(id);
            }
            id
        }
        None => 0,
    })
}

fn focusable_ids(fallback: &[i32]) -> Vec<i32> {
    with_state(|s| match s.pass.as_ref() {
        Some(pass) if !pass.focusable.is_empty() => pass.focusable.clone(),
        _ => fallback.to_vec(),
    })
}

pub fn has_focusable_controls() -> bool {
    with_state(|s| s.pass.as_ref().is_some_and(|p| !p.focusable.is_empty()))
}

/// Give keyboard focus to the first focusable control of the running pass,
/// or of `fallback` before any control has been created.
pub(crate) fn set_keyboard_control_to_first_control_id(fallback: &[i32]) {
    if let Some(&first) = focusable_ids(fallback).first() {
        set_keyboard_control(first);
    }
}

pub(crate) fn set_keyboard_control_to_last_control_id(fallback: &[i32]) {
    if let Some(&last) = focusable_ids(fallback).last() {
        set_keyboard_control(last);
    }
}

/// Move keyboard focus for a tab key press.
///
/// Returns 0 if the event is not a tab, the newly focused control id, -1 if
/// focus ran past the last control, or -2 if it ran before the first.
pub fn check_for_tab_event(event: &mut ImEvent) -> i32 {
    if !event.is_tab() {
        return 0;
    }

    let ids = focusable_ids(&[]);
    let current = keyboard_control();
    let position = ids.iter().position(|&id| id == current);

    let next = if event.is_backward_tab() {
        match position {
            Some(0) => return -2,
            Some(p) => ids[p - 1],
            None => match ids.last() {
                Some(&last) => last,
                None => return -2,
            },
        }
    } else {
        match position {
            Some(p) if p + 1 < ids.len() => ids[p + 1],
            Some(_) => return -1,
            None => match ids.first() {
                Some(&first) => first,
                None => return -1,
            },
        }
    };

    set_keyboard_control(next);
    event.use_event();
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_globals_scope_restores() {
        set_color(Color::BLACK);
        {
            let _scope = GlobalsScope::save();
            set_color(Color::rgb(1.0, 0.0, 0.0));
            set_enabled(false);
        }
        assert_eq!(color(), Color::BLACK);
        assert!(enabled());
        set_color(Color::WHITE);
    }

    #[test]
    fn test_parent_clip_scope_pops_once() {
        let before = clip_count();
        {
            let _scope = ParentClipScope::new(Transform::IDENTITY, Rect::new(0.0, 0.0, 10.0, 10.0));
            assert_eq!(clip_count(), before + 1);
            assert_eq!(visible_rect(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        }
        assert_eq!(clip_count(), before);
    }

    #[test]
    fn test_parent_clip_scope_tolerates_early_pop() {
        let before = clip_count();
        {
            let _scope = ParentClipScope::new(Transform::IDENTITY, Rect::ZERO);
            pop_clip();
        }
        assert_eq!(clip_count(), before);
    }

    #[test]
    fn test_blocks_do_not_overlap() {
        let a = ObjectGuiState::allocate();
        let b = ObjectGuiState::allocate();
        assert!(a.owns_id(a.id_base() + 1));
        assert!(!a.owns_id(b.id_base() + 1));
        assert!(!b.owns_id(0));
    }

    #[test]
    fn test_control_ids_and_tab_order() {
        let gui_state = ObjectGuiState::allocate();
        let token = begin_pass(gui_state.id_base());
        let first = get_control_id(true);
        let _label = get_control_id(false);
        let second = get_control_id(true);
        assert!(gui_state.owns_id(first));
        assert!(has_focusable_controls());

        set_keyboard_control(0);
        let mut tab = ImEvent::tab(false);
        assert_eq!(check_for_tab_event(&mut tab), first);
        assert!(tab.is_used());

        let mut tab = ImEvent::tab(false);
        assert_eq!(check_for_tab_event(&mut tab), second);
        let mut tab = ImEvent::tab(false);
        assert_eq!(check_for_tab_event(&mut tab), -1);
        assert_eq!(keyboard_control(), second);

        set_keyboard_control(first);
        let mut back = ImEvent::tab(true);
        assert_eq!(check_for_tab_event(&mut back), -2);

        let mut key = ImEvent::key_down('x');
        assert_eq!(check_for_tab_event(&mut key), 0);

        assert_eq!(end_pass(token), vec![first, second]);
        assert_eq!(get_control_id(true), 0);
        set_keyboard_control(0);
    }

    #[test]
    fn test_first_and_last_use_fallback_before_controls_exist() {
        let token = begin_pass(CONTROL_ID_BLOCK * 500);
        set_keyboard_control_to_last_control_id(&[7, 8, 9]);
        assert_eq!(keyboard_control(), 9);
        set_keyboard_control_to_first_control_id(&[7, 8, 9]);
        assert_eq!(keyboard_control(), 7);
        end_pass(token);
        set_keyboard_control(0);
    }
}
