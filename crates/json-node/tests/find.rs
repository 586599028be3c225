use std::ops::ControlFlow;

use json_node::{Node, Visit};
use serde_json::json;

fn is_target(n: &Node) -> bool {
    n.parent_key() == Some("type") && n.as_str() == Some("Target")
}

fn events() -> Node {
    Node::from_value(json!({
        "events": [
            {"type": "Target", "data": {"message": "shallow"}},
            {"type": "Other", "data": {"message": "skip"}},
            {
                "type": "Group",
                "children": [
                    {"type": "Target", "data": {"message": "deep"}}
                ]
            }
        ]
    }))
}

#[test]
fn test_two_targets_with_parents() {
    let mut messages: Vec<String> = events()
        .find(|n| Visit::from(is_target(n)))
        .map(|hit| {
            let event = hit.parent().unwrap();
            assert!(event.is_object());
            event.get("data").unwrap().get("message").unwrap().to_string()
        })
        .collect();
    messages.sort();
    assert_eq!(messages, vec!["deep", "shallow"]);
}

#[test]
fn test_match_pointers() {
    let mut pointers: Vec<String> = events()
        .find(|n| Visit::from(is_target(n)))
        .map(|hit| hit.pointer())
        .collect();
    pointers.sort();
    assert_eq!(
        pointers,
        vec!["/events/0/type", "/events/2/children/0/type"]
    );
}

#[test]
fn test_matches_follow_array_order() {
    let root = Node::from_value(json!([
        {"n": 1},
        [{"n": 2}, [{"n": 3}]],
        {"n": 4}
    ]));
    let found: Vec<i64> = root
        .find(|n| Visit::from(n.parent_key() == Some("n")))
        .map(|n| n.int().unwrap())
        .collect();
    assert_eq!(found, vec![1, 2, 3, 4]);
}

#[test]
fn test_stop_prevents_every_later_match() {
    let root = Node::from_value(json!([
        [{"n": 1}, {"n": 2}],
        {"n": 3},
        [[{"n": 4}]]
    ]));
    let found: Vec<i64> = root
        .find(|n| {
            let hit = n.parent_key() == Some("n");
            Visit::new(hit, hit && n.int() == Ok(2))
        })
        .map(|n| n.int().unwrap())
        .collect();
    assert_eq!(found, vec![1, 2]);
}

#[test]
fn test_collect_parents_with_traverse() {
    let root = events();
    let mut starts = Vec::new();
    root.traverse(|n| {
        if is_target(n) {
            starts.push(n.parent().unwrap().clone());
        }
        ControlFlow::Continue(())
    });
    assert_eq!(starts.len(), 2);
    assert!(starts.iter().all(|e| e.get("type").unwrap().as_str() == Some("Target")));
}

#[test]
fn test_isolated_match_cannot_walk_up() {
    let hit = events().find(|n| Visit::from(is_target(n))).next().unwrap();
    let iso = hit.parent().unwrap().isolate();
    assert!(iso.parent().is_none());
    assert_eq!(iso.get("type").unwrap().pointer(), "/type");
}

#[test]
fn test_concurrent_form_agrees_with_lazy_form() {
    let root = events();
    let lazy: Vec<String> = root
        .find(|n| Visit::from(n.parent_key() == Some("message")))
        .map(|n| n.pointer())
        .collect();
    let streamed: Vec<String> = root
        .find_concurrent(|n| Visit::from(n.parent_key() == Some("message")))
        .unwrap()
        .nodes()
        .map(|n| n.pointer())
        .collect();
    assert_eq!(lazy, streamed);
    assert_eq!(lazy.len(), 3);
}
