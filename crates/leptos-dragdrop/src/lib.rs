//! Leptos DragDrop Utilities
//!
//! Mouse-event drag-and-drop for reorderable lists in Leptos.
//! Uses a movement threshold to distinguish click from drag, and
//! `apply_drop` to turn a finished drag into a new order.

use leptos::prelude::*;
use wasm_bindgen::JsCast;

/// Drop target types
#[derive(Clone, Debug, PartialEq)]
pub enum DropTarget {
    /// Drop on an item; the dragged item takes its place
    Item(String),
    /// Drop on the gap before `position` (`len` means the end)
    Slot(usize),
}

/// DnD state signals
#[derive(Clone, Copy)]
pub struct DndSignals {
    pub dragging_id_read: ReadSignal<Option<String>>,
    pub dragging_id_write: WriteSignal<Option<String>>,
    pub drop_target_read: ReadSignal<Option<DropTarget>>,
    pub drop_target_write: WriteSignal<Option<DropTarget>>,
    pub drag_just_ended_read: ReadSignal<bool>,
    pub drag_just_ended_write: WriteSignal<bool>,
    /// Pending item id (mousedown but not yet dragging)
    pub pending_id_read: ReadSignal<Option<String>>,
    pub pending_id_write: WriteSignal<Option<String>>,
    /// Start position for movement detection
    pub start_x_read: ReadSignal<i32>,
    pub start_x_write: WriteSignal<i32>,
    pub start_y_read: ReadSignal<i32>,
    pub start_y_write: WriteSignal<i32>,
}

/// Movement threshold in pixels to start dragging
const DRAG_THRESHOLD_PX: i32 = 5;

pub fn create_dnd_signals() -> DndSignals {
    let (dragging_id_read, dragging_id_write) = signal(None::<String>);
    let (drop_target_read, drop_target_write) = signal(None::<DropTarget>);
    let (drag_just_ended_read, drag_just_ended_write) = signal(false);
    let (pending_id_read, pending_id_write) = signal(None::<String>);
    let (start_x_read, start_x_write) = signal(0i32);
    let (start_y_read, start_y_write) = signal(0i32);
    DndSignals {
        dragging_id_read,
        dragging_id_write,
        drop_target_read,
        drop_target_write,
        drag_just_ended_read,
        drag_just_ended_write,
        pending_id_read,
        pending_id_write,
        start_x_read,
        start_x_write,
        start_y_read,
        start_y_write,
    }
}

/// Moved far enough from the mousedown point to count as a drag
pub fn past_threshold(start: (i32, i32), now: (i32, i32)) -> bool {
    (now.0 - start.0).abs() > DRAG_THRESHOLD_PX || (now.1 - start.1).abs() > DRAG_THRESHOLD_PX
}

/// Move `dragged` to `target` within `order`. Returns `None` when the drop
/// leaves the order unchanged or refers to an unknown item.
pub fn apply_drop<T, K>(order: &[T], key: K, dragged: &str, target: &DropTarget) -> Option<Vec<T>>
where
    T: Clone,
    K: Fn(&T) -> &str,
{
    let from = order.iter().position(|item| key(item) == dragged)?;
    let to = match target {
        DropTarget::Item(id) if id == dragged => return None,
        DropTarget::Item(id) => order.iter().position(|item| key(item) == id)?,
        DropTarget::Slot(gap) => {
            let gap = (*gap).min(order.len());
            if gap > from {
                gap - 1
            } else {
                gap
            }
        }
    };
    if to == from {
        return None;
    }

    let mut next = order.to_vec();
    let moved = next.remove(from);
    next.insert(to, moved);
    Some(next)
}

/// Record a pending drag at the mousedown point
pub fn press(dnd: &DndSignals, item_id: String, x: i32, y: i32) {
    dnd.pending_id_write.set(Some(item_id));
    dnd.start_x_write.set(x);
    dnd.start_y_write.set(y);
}

/// Pointer moved; promote the pending drag once past the threshold.
/// Returns whether a drag is active afterwards.
pub fn track_pointer(dnd: &DndSignals, x: i32, y: i32) -> bool {
    if dnd.dragging_id_read.get_untracked().is_some() {
        return true;
    }
    let Some(pending) = dnd.pending_id_read.get_untracked() else {
        return false;
    };
    let start = (dnd.start_x_read.get_untracked(), dnd.start_y_read.get_untracked());
    if past_threshold(start, (x, y)) {
        dnd.dragging_id_write.set(Some(pending));
        return true;
    }
    false
}

/// Pointer entered a card; it becomes the target unless it is the dragged one
pub fn hover_item(dnd: &DndSignals, item_id: &str) {
    if let Some(dragging) = dnd.dragging_id_read.get_untracked() {
        if dragging != item_id {
            dnd.drop_target_write.set(Some(DropTarget::Item(item_id.to_string())));
        }
    }
}

/// Pointer entered a gap (zone boundary, list end)
pub fn hover_slot(dnd: &DndSignals, position: usize) {
    if dnd.dragging_id_read.get_untracked().is_some() {
        dnd.drop_target_write.set(Some(DropTarget::Slot(position)));
    }
}

/// Clear all drag state, returning the drop when a real drag ended on a target
pub fn finish_drag(dnd: &DndSignals) -> Option<(String, DropTarget)> {
    let dragged = dnd.dragging_id_read.get_untracked();
    let target = dnd.drop_target_read.get_untracked();
    dnd.dragging_id_write.set(None);
    dnd.drop_target_write.set(None);
    dnd.pending_id_write.set(None);
    dnd.drag_just_ended_write.set(true);
    dragged.zip(target)
}

/// End drag operation; `drag_just_ended` stays set for 100ms so the click
/// that follows mouseup can be ignored
pub fn end_drag(dnd: &DndSignals) -> Option<(String, DropTarget)> {
    let dropped = finish_drag(dnd);

    if let Some(win) = web_sys::window() {
        let clear = dnd.drag_just_ended_write;
        let cb = wasm_bindgen::closure::Closure::<dyn FnMut()>::new(move || {
            clear.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 100);
        cb.forget();
    }
    dropped
}

/// Mousedown handler for a draggable card; records a pending drag
pub fn make_on_mousedown(dnd: DndSignals, item_id: String) -> impl Fn(web_sys::MouseEvent) + Clone + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        if let Some(target) = ev.target() {
            if target.dyn_ref::<web_sys::HtmlInputElement>().is_some() { return; }
            if target.dyn_ref::<web_sys::HtmlButtonElement>().is_some() { return; }
        }
        press(&dnd, item_id.clone(), ev.client_x(), ev.client_y());
    }
}

/// Document mousemove; promotes a pending drag once past the threshold
pub fn bind_global_mousemove(dnd: DndSignals) {
    use wasm_bindgen::closure::Closure;

    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        track_pointer(&dnd, ev.client_x(), ev.client_y());
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
}

/// Mouseenter on a card makes it the drop target
pub fn make_on_item_mouseenter(dnd: DndSignals, item_id: String) -> impl Fn(web_sys::MouseEvent) + Clone + 'static {
    move |_ev: web_sys::MouseEvent| {
        hover_item(&dnd, &item_id);
    }
}

/// Mouseenter on a gap (zone boundary, list end)
pub fn make_on_slot_mouseenter(dnd: DndSignals, position: usize) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |_ev: web_sys::MouseEvent| {
        hover_slot(&dnd, position);
    }
}

pub fn make_on_mouseleave(dnd: DndSignals) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |_ev: web_sys::MouseEvent| {
        if dnd.dragging_id_read.get_untracked().is_some() {
            dnd.drop_target_write.set(None);
        }
    }
}

/// Bind document mouseup for drop detection (and mousemove for drag start)
pub fn bind_global_mouseup<F>(dnd: DndSignals, on_drop: F)
where
    F: Fn(String, DropTarget) + 'static,
{
    use wasm_bindgen::closure::Closure;

    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        // plain click: the element's click handler fires on its own
        if let Some((dragged, target)) = end_drag(&dnd) {
            on_drop(dragged, target);
        }
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    }
    on_mouseup.forget();

    bind_global_mousemove(dnd);
}
