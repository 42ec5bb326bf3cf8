mod common;

use common::*;
use dockedmodal::{KeyInput, Options};

fn no_close_existing() -> Options {
    Options {
        close_existing: false,
        ..Options::default()
    }
}

#[test]
fn open_close_round_trip() {
    let mut rt = runtime();
    let content = body_div(&mut rt);

    let id = rt.open_from(content, Options::default()).unwrap();
    assert!(rt.is_active());
    assert_eq!(rt.current().unwrap().id(), id);
    assert_eq!(rt.stack().len(), 1);

    // The content now lives inside the blocking layer.
    let blocker = rt.current().unwrap().blocker_node().unwrap();
    assert_eq!(rt.doc().parent(content), Some(blocker));
    assert!(rt.doc().is_visible(content));
    assert_layering(&rt);

    let closed = rt.close_current();
    assert_eq!(closed, Some(content));
    assert!(!rt.is_active());
    // The content returned to the body, the layer left the tree.
    assert_eq!(rt.doc().parent(content), Some(rt.doc().body()));
    assert!(!rt.doc().is_attached(blocker));
    assert!(!rt.doc().is_shown(content));
}

#[test]
fn close_on_empty_stack_is_a_no_op() {
    let mut rt = runtime();
    let content = body_div(&mut rt);
    rt.open_from(content, Options::default());

    assert!(rt.close_current().is_some());
    assert!(rt.close_current().is_none());
    assert!(rt.close_current().is_none());
    assert!(!rt.is_active());
}

#[test]
fn keydown_listener_tracks_stack_occupancy() {
    let mut rt = runtime();
    let first = body_div(&mut rt);
    let second = body_div(&mut rt);
    assert!(!rt.doc().keydown_attached());

    rt.open_from(first, Options::default());
    assert!(rt.doc().keydown_attached());

    rt.open_from(second, no_close_existing());
    assert!(rt.doc().keydown_attached());

    rt.close_current();
    assert!(rt.doc().keydown_attached());

    rt.close_current();
    assert!(!rt.doc().keydown_attached());
}

#[test]
fn stacked_dialogs_layer_current_over_behind() {
    let mut rt = runtime();
    let first = body_div(&mut rt);
    let second = body_div(&mut rt);

    rt.open_from(first, no_close_existing());
    let lower = rt.current().unwrap().blocker_node().unwrap();
    rt.open_from(second, no_close_existing());
    let upper = rt.current().unwrap().blocker_node().unwrap();

    assert_eq!(rt.stack().len(), 2);
    assert!(rt.doc().has_class(upper, "current"));
    assert!(rt.doc().has_class(lower, "behind"));
    assert_layering(&rt);

    rt.close_current();
    assert!(rt.doc().has_class(lower, "current"));
    assert!(!rt.doc().has_class(lower, "behind"));
    assert!(!rt.doc().is_attached(upper));
    assert_layering(&rt);
}

#[test]
fn close_existing_drains_the_stack_first() {
    let mut rt = runtime();
    let first = body_div(&mut rt);
    let second = body_div(&mut rt);
    let third = body_div(&mut rt);

    rt.open_from(first, no_close_existing());
    rt.open_from(second, no_close_existing());
    assert_eq!(rt.stack().len(), 2);

    rt.open_from(third, Options::default());
    assert_eq!(rt.stack().len(), 1);
    assert_eq!(rt.current().unwrap().content(), third);
    assert_layering(&rt);
}

#[test]
fn direct_handle_close_removes_a_non_top_instance() {
    let mut rt = runtime();
    let first = body_div(&mut rt);
    let second = body_div(&mut rt);

    let lower_id = rt.open_from(first, no_close_existing()).unwrap();
    rt.open_from(second, no_close_existing());

    assert!(rt.close(lower_id));
    assert_eq!(rt.stack().len(), 1);
    assert_eq!(rt.current().unwrap().content(), second);
    // The closed dialog's content is back in the body, the survivor is
    // still the current layer.
    assert_eq!(rt.doc().parent(first), Some(rt.doc().body()));
    assert_layering(&rt);

    // A second close through the same stale handle reports failure.
    assert!(!rt.close(lower_id));
}

#[test]
fn escape_closes_only_when_permitted() {
    let mut rt = runtime();
    let stubborn = body_div(&mut rt);
    rt.open_from(
        stubborn,
        Options {
            escape_close: false,
            ..Options::default()
        },
    );
    assert!(!rt.handle_key(KeyInput::Escape));
    assert!(rt.is_active());
    rt.close_current();

    let polite = body_div(&mut rt);
    rt.open_from(polite, Options::default());
    assert!(rt.handle_key(KeyInput::Escape));
    assert!(!rt.is_active());

    // With the stack empty the listener is detached and keys pass through.
    assert!(!rt.handle_key(KeyInput::Escape));
    assert!(!rt.handle_key(KeyInput::Tab));
}

#[test]
fn escape_targets_the_current_dialog_options() {
    let mut rt = runtime();
    let lower = body_div(&mut rt);
    let upper = body_div(&mut rt);

    rt.open_from(lower, no_close_existing());
    rt.open_from(
        upper,
        Options {
            close_existing: false,
            escape_close: false,
            ..Options::default()
        },
    );

    // The top dialog refuses escape even though the lower one would allow it.
    assert!(!rt.handle_key(KeyInput::Escape));
    assert_eq!(rt.stack().len(), 2);
}

#[test]
fn declarative_affordances_route_through_click_delegation() {
    let mut rt = runtime();

    // rel="dockedmodal:open" anchor pointing at an existing element.
    let target = body_div(&mut rt);
    rt.doc_mut().set_attr(target, "id", "news");
    let opener = anchor(&mut rt, "#news");
    rt.doc_mut().set_attr(opener, "rel", "dockedmodal:open");

    assert!(rt.handle_click(opener));
    assert!(rt.is_active());
    assert_eq!(rt.current().unwrap().content(), target);

    // Any element carrying the close marker closes the current dialog.
    let closer = {
        let doc = rt.doc_mut();
        let node = doc.create_element("button");
        doc.set_attr(node, "rel", "confirm dockedmodal:close");
        doc.append(target, node);
        node
    };
    assert!(rt.handle_click(closer));
    assert!(!rt.is_active());

    // Unmarked elements fall through.
    let plain = body_div(&mut rt);
    assert!(!rt.handle_click(plain));
}

#[test]
fn blocker_click_closes_when_configured() {
    let mut rt = runtime();
    let content = body_div(&mut rt);
    rt.open_from(content, Options::default());
    let blocker = rt.current().unwrap().blocker_node().unwrap();

    // A click on the content itself does not close.
    assert!(!rt.handle_click(content));
    assert!(rt.is_active());

    assert!(rt.handle_click(blocker));
    assert!(!rt.is_active());

    let fixed = body_div(&mut rt);
    rt.open_from(
        fixed,
        Options {
            click_close: false,
            ..Options::default()
        },
    );
    let blocker = rt.current().unwrap().blocker_node().unwrap();
    assert!(!rt.handle_click(blocker));
    assert!(rt.is_active());
}
