//! Builds a small inspector panel: a composite foldout whose content hosts
//! two immediate-mode sections, then drives layout, repaint and tab focus.
//!
//! Run with `RUST_LOG=debug` to see the tree and focus traffic.

use std::cell::Cell;
use std::rc::Rc;

use uitree::imgui::state;
use uitree::prelude::*;

fn section(label: &'static str, rows: usize, focused: Rc<Cell<i32>>) -> ImguiContainer {
    ImguiContainer::new(move |frame| {
        for row in 0..rows {
            let rect = frame.layout_rect(0.0, 18.0)?;
            let control = frame.control_id(true);
            if frame.event_type() == EventType::Repaint && frame.keyboard_control() == control {
                focused.set(control);
                log::info!("{label}: row {row} focused at {:?}", rect);
            }
        }
        Ok(())
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut tree = Tree::new();
    let panel = tree.create_panel(
        PanelConfig::new()
            .name("inspector")
            .root_size(Size::new(320.0, 480.0)),
    );
    let root = tree.panel(panel).map(|p| p.root()).ok_or("missing panel")?;

    let (foldout, content) = Composite::build(&mut tree)?;
    tree.set_name(foldout, "foldout");
    tree.add(root, foldout)?;

    let focused = Rc::new(Cell::new(0));
    let transform = tree.create_element(section("Transform", 3, focused.clone()));
    let material = tree.create_element(section("Material", 2, focused.clone()));
    tree.add(foldout, transform)?;
    tree.add(foldout, material)?;
    tree.set_layout_rect(transform, Rect::new(0.0, 0.0, 320.0, 54.0));
    tree.set_layout_rect(material, Rect::new(0.0, 54.0, 320.0, 36.0));

    log::info!(
        "foldout holds {} sections in {:?}, {} immediate-mode containers in panel",
        tree.child_count(foldout),
        content,
        tree.panel(panel).map(|p| p.imgui_container_count()).unwrap_or(0)
    );

    for id in [transform, material] {
        let size = tree
            .run_layout_pass(panel, |tree| {
                tree.measure(id, 320.0, MeasureMode::Exactly, 0.0, MeasureMode::Undefined)
            })??
            .unwrap_or(Size::zero());
        log::info!("{:?} measured {}x{}", id, size.width, size.height);
        ImguiContainer::repaint(&mut tree, id)?;
    }

    if let Some(p) = tree.panel_mut(panel) {
        p.focus_mut()
            .switch_focus(Some(transform), FocusChangeDirection::Unspecified, false);
    }
    tree.dispatch_focus_events(panel)?;

    for _ in 0..5 {
        let Some(target) = tree.panel(panel).and_then(|p| p.focus().focused_element()) else {
            break;
        };
        let mut tab = ImEvent::tab(false);
        ImguiContainer::handle_event(&mut tree, target, &mut tab)?;
        tree.dispatch_focus_events(panel)?;
        let next = tree.panel(panel).and_then(|p| p.focus().focused_element());
        if let Some(next) = next {
            ImguiContainer::repaint(&mut tree, next)?;
        }
        log::info!(
            "tab: element {:?}, keyboard control {}",
            next,
            state::keyboard_control()
        );
    }

    log::info!("last focused control {}", focused.get());
    Ok(())
}
