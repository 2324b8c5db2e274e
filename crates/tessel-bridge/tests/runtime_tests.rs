//! Runtime integration tests
//!
//! Drives the runtime only through its boundary calls: instruction streams
//! written into shared memory, native events, callbacks and timers.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tessel_bridge::codec::op;
use tessel_bridge::events::FormEventData;
use tessel_bridge::{
    ArenaError, BridgeError, CallbackError, CallbackId, CanonicalEventRecord, ComputeModule, DecodeError,
    EditWriter, EventControl, EventData, FieldMap, FormValue, NodeId, Runtime, SharedBuffer, TemplateNode,
    TimerToken,
};
use tessel_dom::events::{KeyboardInit, MouseInit};
use tessel_dom::{Document, DomError, EventDetail, NativeEvent, NodeRef, Property};

#[derive(Default)]
struct Recorder {
    events: Vec<CanonicalEventRecord>,
    released: Vec<CallbackId>,
    timers: Vec<TimerToken>,
}

impl ComputeModule for Recorder {
    fn handle_event(&mut self, record: &CanonicalEventRecord, _control: &mut EventControl) {
        self.events.push(record.clone());
    }

    fn callback_released(&mut self, id: CallbackId) {
        self.released.push(id);
    }

    fn timer_fired(&mut self, token: TimerToken) {
        self.timers.push(token);
    }
}

fn runtime() -> Runtime<Recorder> {
    let mut rt = Runtime::new(Document::new(), SharedBuffer::new(1, 16), Recorder::default());
    let body = rt.document().body();
    rt.initialize(body, &[]).unwrap();
    rt
}

fn apply(rt: &mut Runtime<Recorder>, writer: &EditWriter) -> Result<usize, BridgeError> {
    let (offset, len) = rt.memory().buffer().write_bytes(writer.as_bytes())?;
    rt.apply_edits(offset, len)
}

fn root_html(rt: &Runtime<Recorder>) -> String {
    rt.document().inner_html(rt.document().body())
}

fn click(node: NodeRef) -> NativeEvent {
    NativeEvent::new("click", node).with_detail(EventDetail::Mouse(MouseInit::at(10.0, 20.0)))
}

// ============================================================================
// INTERPRETER
// ============================================================================

#[test]
fn test_scenario_create_attribute_append() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .set_attribute(NodeId(1), "class", "x")
        .append_children(NodeId::ROOT, &[NodeId(1)]);

    assert_eq!(apply(&mut rt, &w).unwrap(), 3);
    assert_eq!(root_html(&rt), r#"<div class="x"></div>"#);
    assert!(rt.take_last_error().is_none());
}

#[test]
fn test_replay_creates_new_nodes() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "p").append_children(NodeId::ROOT, &[NodeId(1)]);

    apply(&mut rt, &w).unwrap();
    let first = rt.node(NodeId(1)).unwrap();
    apply(&mut rt, &w).unwrap();
    let second = rt.node(NodeId(1)).unwrap();

    assert_ne!(first, second);
    assert_eq!(root_html(&rt), "<p></p><p></p>");
    // Only the newer node is still addressable
    assert_eq!(rt.arena().lookup(first), None);
    assert_eq!(rt.arena().lookup(second), Some(NodeId(1)));
}

#[test]
fn test_insert_and_replace() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_text(NodeId(1), "b")
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .create_text(NodeId(2), "a")
        .insert_before(NodeId(1), &[NodeId(2)])
        .create_text(NodeId(3), "c")
        .insert_after(NodeId(1), &[NodeId(3)])
        .create_element(NodeId(4), "em")
        .replace_with(NodeId(1), &[NodeId(4)]);
    apply(&mut rt, &w).unwrap();

    assert_eq!(root_html(&rt), "a<em></em>c");
    assert!(!rt.arena().contains(NodeId(1)));
}

#[test]
fn test_insert_after_detached_reference_is_noop() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_element(NodeId(2), "span")
        .insert_after(NodeId(1), &[NodeId(2)]);
    apply(&mut rt, &w).unwrap();

    let span = rt.node(NodeId(2)).unwrap();
    assert_eq!(rt.document().tree().parent(span), None);
}

#[test]
fn test_bind_element_by_id() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "section")
        .set_attribute(NodeId(1), "id", "main")
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .bind_element_by_id(NodeId(9), "main");
    apply(&mut rt, &w).unwrap();

    // Rebinding moves the node to the new id
    assert!(!rt.arena().contains(NodeId(1)));
    let mut w = EditWriter::new();
    w.set_attribute(NodeId(9), "title", "bound");
    apply(&mut rt, &w).unwrap();
    assert_eq!(root_html(&rt), r#"<section id="main" title="bound"></section>"#);
}

#[test]
fn test_properties_and_styles() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "input")
        .set_attribute(NodeId(1), "value", "attr")
        .set_property(NodeId(1), Property::Value, "typed")
        .set_property(NodeId(1), Property::ClassName, "field")
        .set_style(NodeId(1), "color", "red")
        .toggle_attribute(NodeId(1), "disabled", None)
        .append_children(NodeId::ROOT, &[NodeId(1)]);
    apply(&mut rt, &w).unwrap();

    let input = rt.node(NodeId(1)).unwrap();
    let doc = rt.document();
    assert_eq!(doc.value(input).as_deref(), Some("typed"));
    assert_eq!(doc.tree().attribute(input, "value"), Some("attr"));
    assert_eq!(doc.tree().attribute(input, "class"), Some("field"));
    assert!(doc.tree().attribute(input, "disabled").is_some());

    let mut w = EditWriter::new();
    w.toggle_attribute(NodeId(1), "disabled", None).remove_attribute(NodeId(1), "class");
    apply(&mut rt, &w).unwrap();
    let doc = rt.document();
    assert_eq!(doc.tree().attribute(input, "disabled"), None);
    assert_eq!(doc.tree().attribute(input, "class"), None);
}

#[test]
fn test_inner_html_releases_old_children() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_element(NodeId(2), "span")
        .append_children(NodeId(1), &[NodeId(2)])
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .set_property(NodeId(1), Property::InnerHtml, "<b>hi</b><i>there</i>");
    apply(&mut rt, &w).unwrap();

    assert_eq!(root_html(&rt), "<div><b>hi</b><i>there</i></div>");
    assert!(!rt.arena().contains(NodeId(2)));
    assert!(rt.arena().contains(NodeId(1)));
}

#[test]
fn test_inner_html_uses_element_context() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_element(NodeId(2), "table")
        .append_children(NodeId::ROOT, &[NodeId(1), NodeId(2)])
        .set_property(NodeId(1), Property::InnerHtml, "<style>.a{color:red}</style><b>x</b>")
        .set_property(NodeId(2), Property::InnerHtml, "<tr><td>1</td></tr>");
    apply(&mut rt, &w).unwrap();

    assert_eq!(
        root_html(&rt),
        "<div><style>.a{color:red}</style><b>x</b></div><table><tbody><tr><td>1</td></tr></tbody></table>"
    );
}

#[test]
fn test_sparse_node_ids() {
    let mut rt = runtime();
    let far = NodeId(u32::MAX - 1);
    let mut w = EditWriter::new();
    w.create_element(far, "div").append_children(NodeId::ROOT, &[far]);
    apply(&mut rt, &w).unwrap();

    assert_eq!(root_html(&rt), "<div></div>");
    assert_eq!(rt.arena().live_count(), 2);
}

#[test]
fn test_replace_detached_keeps_binding() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_element(NodeId(2), "span")
        .replace_with(NodeId(1), &[NodeId(2)]);
    apply(&mut rt, &w).unwrap();

    let div = rt.node(NodeId(1)).unwrap();
    assert!(rt.document().tree().get(div).is_some());
    assert_eq!(rt.document().tree().parent(rt.node(NodeId(2)).unwrap()), None);
}

#[test]
fn test_render_loop_reuses_nodes() {
    let mut rt = runtime();
    let mut render = EditWriter::new();
    render.create_element(NodeId(1), "ul")
        .create_element(NodeId(2), "li")
        .create_text(NodeId(3), "item")
        .append_children(NodeId(2), &[NodeId(3)])
        .append_children(NodeId(1), &[NodeId(2)])
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .remove(NodeId(1));

    apply(&mut rt, &render).unwrap();
    let stale = rt.document().tree().len();
    let capacity = rt.document().tree().capacity();
    for _ in 0..50 {
        apply(&mut rt, &render).unwrap();
    }
    assert_eq!(rt.document().tree().len(), stale);
    assert_eq!(rt.document().tree().capacity(), capacity);
    assert_eq!(root_html(&rt), "");
}

#[test]
fn test_removed_handles_stop_resolving() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "p").append_children(NodeId::ROOT, &[NodeId(1)]);
    apply(&mut rt, &w).unwrap();
    let p = rt.node(NodeId(1)).unwrap();

    let mut w = EditWriter::new();
    w.remove(NodeId(1)).create_element(NodeId(2), "em");
    apply(&mut rt, &w).unwrap();

    let em = rt.node(NodeId(2)).unwrap();
    assert_ne!(em, p);
    assert!(rt.document().tree().get(p).is_none());
    assert!(matches!(
        rt.dispatch_event(click(p)),
        Err(BridgeError::Host(DomError::NotFound(_)))
    ));
}

#[test]
fn test_rebinding_frees_orphaned_node() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div");
    apply(&mut rt, &w).unwrap();
    let orphan = rt.node(NodeId(1)).unwrap();
    let live = rt.document().tree().len();

    apply(&mut rt, &w).unwrap();
    assert!(rt.document().tree().get(orphan).is_none());
    assert_eq!(rt.document().tree().len(), live);

    let mut w = EditWriter::new();
    w.free_id(NodeId(1));
    apply(&mut rt, &w).unwrap();
    assert_eq!(rt.document().tree().len(), live - 1);
}

#[test]
fn test_svg_namespace() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element_ns(NodeId(1), "circle", "http://www.w3.org/2000/svg")
        .set_attribute_ns(NodeId(1), "xlink:href", "#a", "http://www.w3.org/1999/xlink");
    apply(&mut rt, &w).unwrap();

    let circle = rt.node(NodeId(1)).unwrap();
    let element = rt.document().tree().element(circle).unwrap();
    assert_eq!(element.namespace.as_deref(), Some("http://www.w3.org/2000/svg"));
    assert_eq!(element.get_attr_ns(Some("http://www.w3.org/1999/xlink"), "href"), Some("#a"));
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_host_error_aborts_pass() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_text(NodeId(2), "text")
        .append_children(NodeId(2), &[NodeId(1)])
        .create_element(NodeId(3), "p");

    let err = apply(&mut rt, &w).unwrap_err();
    assert!(matches!(err, BridgeError::Host(DomError::HierarchyRequest(_))));
    assert!(!err.is_protocol());

    // Earlier instructions stay applied, later ones never ran
    assert!(rt.arena().contains(NodeId(1)));
    assert!(!rt.arena().contains(NodeId(3)));
    assert_eq!(rt.take_last_error(), Some(err));
    assert_eq!(rt.take_last_error(), None);
}

#[test]
fn test_invalid_tag_is_host_error() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "1div");
    assert_eq!(
        apply(&mut rt, &w).unwrap_err(),
        BridgeError::Host(DomError::InvalidCharacter("1div".into()))
    );
}

#[test]
fn test_unknown_id_is_lookup_error() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.set_attribute(NodeId(42), "class", "x");

    let err = apply(&mut rt, &w).unwrap_err();
    assert_eq!(err, BridgeError::Lookup(ArenaError::NotFound(NodeId(42))));
    assert!(err.is_protocol());
}

#[test]
fn test_unknown_opcode_is_protocol_error() {
    let mut rt = runtime();
    let (offset, len) = rt.memory().buffer().write_bytes(&[op::CREATE_PLACEHOLDER, 1, 0, 0, 0, 0xEE]).unwrap();

    let err = rt.apply_edits(offset, len).unwrap_err();
    assert_eq!(err, BridgeError::Protocol(DecodeError::UnknownOpcode { opcode: 0xEE, offset: offset + 5 }));
    assert!(rt.arena().contains(NodeId(1)));
}

#[test]
fn test_truncated_stream() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_text(NodeId(1), "hello");
    let bytes = w.finish();
    let (offset, _) = rt.memory().buffer().write_bytes(&bytes).unwrap();

    let err = rt.apply_edits(offset, bytes.len() - 2).unwrap_err();
    assert!(matches!(err, BridgeError::Protocol(DecodeError::Truncated { .. })));
}

// ============================================================================
// TEMPLATES
// ============================================================================

fn card_template() -> Vec<TemplateNode> {
    vec![
        TemplateNode::element("div", 2).with_attr("class", "card"),
        TemplateNode::element("h2", 1),
        TemplateNode::DynamicText,
        TemplateNode::element("p", 0).as_slot(),
    ]
}

#[test]
fn test_template_instances_are_independent() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.save_template(1, &card_template())
        .load_template(1, NodeId(10), &[NodeId(11), NodeId(12)])
        .load_template(1, NodeId(20), &[NodeId(21), NodeId(22)])
        .append_children(NodeId::ROOT, &[NodeId(10), NodeId(20)]);
    apply(&mut rt, &w).unwrap();

    let first = rt.node(NodeId(10)).unwrap();
    let second = rt.node(NodeId(20)).unwrap();
    assert_ne!(first, second);
    assert_eq!(rt.document().outer_html(first), rt.document().outer_html(second));

    let mut w = EditWriter::new();
    w.set_attribute(NodeId(12), "class", "body")
        .replace_with(NodeId(11), &[NodeId(30)]);
    // Id 30 is not bound yet; bind it first
    let mut setup = EditWriter::new();
    setup.create_text(NodeId(30), "Title");
    apply(&mut rt, &setup).unwrap();
    apply(&mut rt, &w).unwrap();

    assert_eq!(
        rt.document().outer_html(first),
        r#"<div class="card"><h2>Title</h2><p class="body"></p></div>"#
    );
    assert_eq!(
        rt.document().outer_html(second),
        r#"<div class="card"><h2></h2><p></p></div>"#
    );

    // The saved prototype itself never changed
    let template = rt.templates().get(1).unwrap();
    assert_eq!(
        rt.document().outer_html(template.root()),
        r#"<div class="card"><h2></h2><p></p></div>"#
    );
}

#[test]
fn test_deep_template_instantiates() {
    let mut rt = runtime();
    let depth = 20_000;
    let mut nodes: Vec<TemplateNode> = (0..depth).map(|_| TemplateNode::element("div", 1)).collect();
    nodes.push(TemplateNode::DynamicText);
    rt.save_template(9, nodes).unwrap();

    let mut w = EditWriter::new();
    w.load_template(9, NodeId(1), &[NodeId(2)]).append_children(NodeId::ROOT, &[NodeId(1)]);
    apply(&mut rt, &w).unwrap();

    let root = rt.node(NodeId(1)).unwrap();
    assert_eq!(rt.document().tree().descendants(root).count(), depth + 1);

    let mut w = EditWriter::new();
    w.remove(NodeId(1));
    apply(&mut rt, &w).unwrap();
    assert!(!rt.arena().contains(NodeId(2)));
}

#[test]
fn test_template_slot_count_mismatch() {
    let mut rt = runtime();
    rt.save_template(1, card_template()).unwrap();
    let mut w = EditWriter::new();
    w.load_template(1, NodeId(10), &[NodeId(11)]);
    assert!(matches!(apply(&mut rt, &w).unwrap_err(), BridgeError::Template(_)));
}

// ============================================================================
// MEMORY
// ============================================================================

#[test]
fn test_view_sees_growth() {
    let buffer = SharedBuffer::new(1, 4);
    let mut rt = Runtime::new(Document::new(), buffer.clone(), Recorder::default());
    assert_eq!(rt.memory().view::<u8>().unwrap().len(), 64 * 1024);

    let offset = buffer.allocate(100 * 1024).unwrap();
    assert_eq!(offset, 0);
    assert_eq!(rt.memory().view::<u8>().unwrap().len(), 128 * 1024);
    assert_eq!(rt.memory().view::<u32>().unwrap().len(), 32 * 1024);

    // A stream written after the growth is read from the new storage
    let body = rt.document().body();
    rt.initialize(body, &[]).unwrap();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "hr").append_children(NodeId::ROOT, &[NodeId(1)]);
    let (offset, len) = buffer.write_bytes(w.as_bytes()).unwrap();
    assert!(offset >= 100 * 1024);
    rt.apply_edits(offset, len).unwrap();
    assert_eq!(root_html(&rt), "<hr>");
}

#[test]
fn test_update_shared_memory() {
    let mut rt = runtime();
    let replacement = SharedBuffer::new(2, 2);
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "nav").append_children(NodeId::ROOT, &[NodeId(1)]);
    let (offset, len) = replacement.write_bytes(w.as_bytes()).unwrap();

    rt.update_shared_memory(replacement.clone());
    assert!(rt.memory().buffer().ptr_eq(&replacement));
    rt.apply_edits(offset, len).unwrap();
    assert_eq!(root_html(&rt), "<nav></nav>");
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_click_resolves_nearest_registered_ancestor() {
    let mut rt = runtime();
    rt.save_template(7, vec![
        TemplateNode::element("ul", 1),
        TemplateNode::element("li", 1),
        TemplateNode::element("a", 1),
        TemplateNode::element("span", 0),
    ])
    .unwrap();
    let mut w = EditWriter::new();
    w.load_template(7, NodeId(5), &[]).append_children(NodeId::ROOT, &[NodeId(5)]);
    apply(&mut rt, &w).unwrap();

    let list = rt.node(NodeId(5)).unwrap();
    let span = rt.document().tree().child_at_path(list, &[0, 0, 0]).unwrap();
    assert!(rt.dispatch_event(click(span)).unwrap());

    let record = &rt.compute().events[0];
    assert_eq!(record.target, NodeId(5));
    assert!(record.bubbles);
    match &record.data {
        EventData::Mouse(mouse) => {
            assert_eq!(mouse.client_x, 10.0);
            assert_eq!(mouse.page_y, 20.0);
        }
        other => panic!("expected mouse data, got {other:?}"),
    }

    // Binding an inner node makes it the nearer match
    let anchor = rt.document().tree().child_at_path(list, &[0, 0]).unwrap();
    rt.set_node(NodeId(6), anchor).unwrap();
    rt.dispatch_event(click(span)).unwrap();
    assert_eq!(rt.compute().events[1].target, NodeId(6));
}

#[test]
fn test_keyboard_record_json() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "input").append_children(NodeId::ROOT, &[NodeId(1)]);
    apply(&mut rt, &w).unwrap();

    let input = rt.node(NodeId(1)).unwrap();
    let event = NativeEvent::new("keydown", input).with_detail(EventDetail::Keyboard(KeyboardInit::key("a", "KeyA")));
    rt.dispatch_event(event).unwrap();

    let record = &rt.compute().events[0];
    let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "keydown");
    assert_eq!(json["target"], 1);
    assert_eq!(json["data"]["kind"], "keyboard");
    assert_eq!(json["data"]["key"], "a");
    assert_eq!(json["data"]["code"], "KeyA");
}

#[test]
fn test_focus_is_captured_at_root() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "input").append_children(NodeId::ROOT, &[NodeId(1)]);
    apply(&mut rt, &w).unwrap();

    let input = rt.node(NodeId(1)).unwrap();
    rt.dispatch_event(NativeEvent::new("focus", input).non_bubbling()).unwrap();

    let record = &rt.compute().events[0];
    assert_eq!(record.name, "focus");
    assert!(!record.bubbles);
    assert_eq!(record.data, EventData::Focus);
}

fn build_form(rt: &mut Runtime<Recorder>, fields: &[(&str, &str)]) -> NodeId {
    let mut w = EditWriter::new();
    w.create_element(NodeId(100), "form");
    for (i, (name, value)) in fields.iter().enumerate() {
        let id = NodeId(101 + i as u32);
        w.create_element(id, "input")
            .set_attribute(id, "name", name)
            .set_attribute(id, "value", value)
            .append_children(NodeId(100), &[id]);
    }
    w.append_children(NodeId::ROOT, &[NodeId(100)]);
    apply(rt, &w).unwrap();
    NodeId(100)
}

#[test]
fn test_get_form_data() {
    let mut rt = runtime();
    let form = build_form(&mut rt, &[("a", "1"), ("b", "2")]);
    assert_eq!(
        rt.get_form_data(form).unwrap(),
        FieldMap::from([
            ("a".to_string(), vec![FormValue::text("1")]),
            ("b".to_string(), vec![FormValue::text("2")]),
        ])
    );

    let mut rt = runtime();
    let form = build_form(&mut rt, &[("a", "1"), ("a", "2")]);
    assert_eq!(rt.get_form_data(form).unwrap()["a"], vec![FormValue::text("1"), FormValue::text("2")]);
}

#[test]
fn test_submit_carries_field_map() {
    let mut rt = runtime();
    let form = build_form(&mut rt, &[("user", "ada"), ("tag", "x"), ("tag", "y")]);
    let node = rt.node(form).unwrap();
    rt.dispatch_event(NativeEvent::new("submit", node)).unwrap();

    let record = &rt.compute().events[0];
    assert_eq!(record.target, form);
    let EventData::Form(FormEventData { values, .. }) = &record.data else {
        panic!("expected form data, got {:?}", record.data);
    };
    assert_eq!(values["user"], vec![FormValue::text("ada")]);
    assert_eq!(values["tag"], vec![FormValue::text("x"), FormValue::text("y")]);
}

#[test]
fn test_input_reports_value() {
    let mut rt = runtime();
    let form = build_form(&mut rt, &[("q", "")]);
    let input = rt.node(NodeId(101)).unwrap();
    rt.document_mut().set_value(input, "rust").unwrap();
    rt.dispatch_event(NativeEvent::new("input", input)).unwrap();

    let record = &rt.compute().events[0];
    assert_eq!(record.target, NodeId(101));
    let EventData::Form(data) = &record.data else {
        panic!("expected form data, got {:?}", record.data);
    };
    assert_eq!(data.value, "rust");
    assert_eq!(rt.get_form_data(form).unwrap()["q"], vec![FormValue::text("rust")]);
}

// ============================================================================
// CALLBACKS
// ============================================================================

fn counting(calls: &Rc<Cell<u32>>) -> tessel_bridge::Closure {
    let calls = Rc::clone(calls);
    Box::new(move |_, _| calls.set(calls.get() + 1))
}

#[test]
fn test_callback_refcount_across_categories() {
    let mut rt = runtime();
    let calls = Rc::new(Cell::new(0));
    let cb = CallbackId(7);
    rt.register_callback(cb, counting(&calls)).unwrap();

    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "button")
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .new_event_listener(NodeId(1), "click", cb, false)
        .new_event_listener(NodeId(1), "keydown", cb, false)
        // Duplicate listener is ignored by the host and not counted
        .new_event_listener(NodeId(1), "click", cb, false);
    apply(&mut rt, &w).unwrap();
    assert_eq!(rt.callbacks().count(cb), 2);

    let button = rt.node(NodeId(1)).unwrap();
    rt.dispatch_event(click(button)).unwrap();
    assert_eq!(calls.get(), 1);

    let mut w = EditWriter::new();
    w.remove_event_listener(NodeId(1), "click", cb, false);
    apply(&mut rt, &w).unwrap();
    assert_eq!(rt.callbacks().count(cb), 1);

    rt.dispatch_event(click(button)).unwrap();
    assert_eq!(calls.get(), 1);
    rt.dispatch_event(NativeEvent::new("keydown", button)).unwrap();
    assert_eq!(calls.get(), 2);

    let mut w = EditWriter::new();
    w.remove_event_listener(NodeId(1), "keydown", cb, false);
    apply(&mut rt, &w).unwrap();
    assert_eq!(rt.callbacks().count(cb), 0);
    assert_eq!(rt.compute().released, vec![cb]);

    let record = rt.compute().events[0].clone();
    let mut control = EventControl::default();
    assert_eq!(rt.callbacks().invoke(cb, &record, &mut control), Err(CallbackError::Disposed(cb)));
}

#[test]
fn test_dispose_waits_for_listeners() {
    let mut rt = runtime();
    let calls = Rc::new(Cell::new(0));
    let cb = CallbackId(1);
    rt.register_callback(cb, counting(&calls)).unwrap();

    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "button")
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .new_event_listener(NodeId(1), "click", cb, false);
    apply(&mut rt, &w).unwrap();

    // The listener keeps the closure alive
    assert!(!rt.dispose_callback(cb).unwrap());
    assert!(rt.compute().released.is_empty());
    let button = rt.node(NodeId(1)).unwrap();
    rt.dispatch_event(click(button)).unwrap();
    assert_eq!(calls.get(), 1);

    // No new listeners once disposal is pending
    let mut w = EditWriter::new();
    w.new_event_listener(NodeId(1), "keydown", cb, false);
    assert_eq!(apply(&mut rt, &w).unwrap_err(), BridgeError::Callback(CallbackError::Disposed(cb)));

    let mut w = EditWriter::new();
    w.remove_event_listener(NodeId(1), "click", cb, false)
        .set_attribute(NodeId(1), "class", "done");
    assert_eq!(apply(&mut rt, &w).unwrap(), 2);
    assert_eq!(rt.compute().released, vec![cb]);
    assert_eq!(rt.document().tree().attribute(button, "class"), Some("done"));

    rt.dispatch_event(click(button)).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(rt.document().listeners().get(button, "click").iter().all(|l| l.handler_id != cb.handler()));
}

#[test]
fn test_listener_for_unknown_callback() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "a").new_event_listener(NodeId(1), "click", CallbackId(3), false);
    assert_eq!(
        apply(&mut rt, &w).unwrap_err(),
        BridgeError::Callback(CallbackError::Unknown(CallbackId(3)))
    );
}

#[test]
fn test_remove_releases_subtree() {
    let mut rt = runtime();
    let calls = Rc::new(Cell::new(0));
    let cb = CallbackId(1);
    rt.register_callback(cb, counting(&calls)).unwrap();

    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .create_element(NodeId(2), "button")
        .append_children(NodeId(1), &[NodeId(2)])
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .new_event_listener(NodeId(2), "click", cb, false)
        .remove(NodeId(1));
    apply(&mut rt, &w).unwrap();

    assert_eq!(root_html(&rt), "");
    assert!(!rt.arena().contains(NodeId(1)));
    assert!(!rt.arena().contains(NodeId(2)));
    assert_eq!(rt.compute().released, vec![cb]);

    let mut w = EditWriter::new();
    w.set_attribute(NodeId(2), "class", "gone");
    assert_eq!(
        apply(&mut rt, &w).unwrap_err(),
        BridgeError::Lookup(ArenaError::NotFound(NodeId(2)))
    );
}

#[test]
fn test_free_id_keeps_node() {
    let mut rt = runtime();
    let mut w = EditWriter::new();
    w.create_element(NodeId(1), "div")
        .append_children(NodeId::ROOT, &[NodeId(1)])
        .free_id(NodeId(1));
    apply(&mut rt, &w).unwrap();

    assert_eq!(root_html(&rt), "<div></div>");
    assert!(!rt.arena().contains(NodeId(1)));
}

// ============================================================================
// TIMERS
// ============================================================================

#[test]
fn test_interval_and_timeout() {
    let mut rt = runtime();
    let tick = rt.set_interval(Duration::from_millis(10));
    let once = rt.set_timeout(Duration::from_millis(15));

    assert_eq!(rt.run_timers(Duration::from_millis(10)), 1);
    assert_eq!(rt.run_timers(Duration::from_millis(20)), 2);
    assert_eq!(rt.compute().timers, vec![tick, once, tick]);

    assert!(rt.clear_timer(tick));
    assert_eq!(rt.run_timers(Duration::from_millis(100)), 0);
    assert!(!rt.timers().has_pending());
}
