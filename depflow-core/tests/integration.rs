//! Integration Tests for the Scheduling Core
//!
//! These tests drive the public API the way a host would: build edges, fire,
//! then pop/resolve/reject as external work completes.

use depflow_core::graph::{adjacency, Adjacency, DependencyResolver, StackScheduler};
use depflow_core::map::InvertibleMap;
use indexmap::{IndexMap, IndexSet};

fn set<const N: usize>(items: [&'static str; N]) -> IndexSet<&'static str> {
    items.into_iter().collect()
}

/// Every forward association is mirrored on the reverse side and back.
fn assert_inverse(map: &InvertibleMap<&str, &str>) {
    for (key, values) in map {
        for value in values {
            assert!(map.get_reverse(value).unwrap().contains(key));
        }
    }
    for (value, keys) in map.iter_reverse() {
        for key in keys {
            assert!(map.contains(key, value));
        }
    }
}

/// Test that the two sides stay inverse across a mixed sequence of edits.
#[test]
fn multimap_stays_invertible() {
    let mut map = InvertibleMap::new();

    map.add("a", ["x", "y"]);
    assert_inverse(&map);
    map.add_reverse("z", ["a", "b"]);
    assert_inverse(&map);
    map.remove(&"a", ["x"]);
    assert_inverse(&map);
    map.set("b", ["x"]).set("c", ["y", "z"]);
    assert_inverse(&map);
    map.delete(&"a", false);
    assert_inverse(&map);
    map.delete_reverse(&"z", true);
    assert_inverse(&map);

    assert_eq!(map.get(&"c"), Some(&set(["y"])));
    assert_eq!(map.get_reverse(&"z"), Some(&IndexSet::new()));
    assert_eq!(map.get(&"a"), None);
}

/// Test that deriving forward from a derived reverse gives back the input.
#[test]
fn forward_survives_reverse_round_trip() {
    let mut forward: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    forward.insert("a", set(["b", "c"]));
    forward.insert("b", set(["c"]));
    forward.insert("d", set(["a"]));

    let derived = InvertibleMap::from_forward(forward.clone());
    let rebuilt = InvertibleMap::<&str, &str>::from_reverse(derived.reverse().clone());

    assert_eq!(rebuilt.forward(), &forward);
}

fn diamond() -> Adjacency<&'static str> {
    adjacency([("A", vec!["B", "C"]), ("B", vec!["D"]), ("C", vec!["D"])])
}

/// Test that a fired diamond comes out once per node, in dependency order.
#[test]
fn stack_scheduler_pops_diamond_in_order() {
    let mut scheduler = StackScheduler::new(diamond());
    scheduler.fire(["A"]);

    assert_eq!(scheduler.stack(), &["D", "B", "C", "A"]);

    let order: Vec<_> = scheduler.drain().collect();
    assert_eq!(order.len(), 4);
    assert_eq!(order[0], "A");
    assert_eq!(order[3], "D");
    assert!(order[1..3].contains(&"B") && order[1..3].contains(&"C"));
}

/// Test that a host loop can block a failed node mid-traversal.
#[test]
fn stack_scheduler_host_loop_with_blocking() {
    let edges = adjacency([
        ("fetch", vec!["parse", "log"]),
        ("parse", vec!["index"]),
        ("log", vec![]),
    ]);
    let mut scheduler = StackScheduler::new(edges);
    scheduler.fire(["fetch"]);

    let mut ran = Vec::new();
    while let Some(id) = scheduler.pop() {
        ran.push(id);
        if id == "parse" {
            // parse failed: nothing downstream of it should run
            scheduler.block_last();
        }
    }

    assert!(ran.contains(&"log"));
    assert!(!ran.contains(&"index"));
    assert_eq!(ran[0], "fetch");
}

/// Test that blocking a chain's middle node empties what it alone reached.
#[test]
fn blocking_chain_empties_stack() {
    let mut scheduler = StackScheduler::new(adjacency([("A", vec!["B"]), ("B", vec!["C"])]));
    scheduler.fire(["A"]);

    assert_eq!(scheduler.pop(), Some("A"));
    scheduler.block(["B"]);
    assert!(scheduler.is_empty());
    assert_eq!(scheduler.pop(), None);
}

fn fan_in() -> InvertibleMap<&'static str, &'static str> {
    [("A", "C"), ("B", "C")].into_iter().collect()
}

/// Test that resolution waits on every dependency.
#[test]
fn resolver_resolves_after_all_dependencies() {
    let mut resolver = DependencyResolver::new(fan_in());
    resolver.fire(["A", "B"]);

    assert_eq!(resolver.resolve(["A"]), Vec::<&str>::new());
    assert_eq!(resolver.resolve(["B"]), vec!["C"]);
}

/// Test that rejection cascades only when every dependency was rejected.
#[test]
fn resolver_rejects_after_all_dependencies() {
    let mut resolver = DependencyResolver::new(fan_in());
    resolver.fire(["A", "B"]);

    let first = resolver.reject(["A"]);
    assert!(!first.contains(&"C"));

    let second = resolver.reject(["B"]);
    assert!(second.contains(&"C"));
}

/// Test that clearing twice behaves like clearing once for every component.
#[test]
fn clear_is_idempotent() {
    let mut map = fan_in();
    map.clear();
    map.clear();
    assert!(map.is_empty());

    let mut scheduler = StackScheduler::new(diamond());
    scheduler.fire(["A"]);
    scheduler.clear();
    scheduler.clear();
    assert_eq!(scheduler.pop(), None);
    scheduler.fire(["A"]);
    assert_eq!(scheduler.pop(), Some("A"));

    let mut resolver = DependencyResolver::new(fan_in());
    resolver.fire(["A", "B"]);
    resolver.clear();
    resolver.clear();
    assert!(resolver.resolve(["A"]).is_empty());
    resolver.fire(["A", "B"]);
    resolver.resolve(["A"]);
    assert_eq!(resolver.resolve(["B"]), vec!["C"]);
}

/// Test a full host loop over the resolver: run what is pending, feed back.
#[test]
fn resolver_host_loop_visits_whole_graph() {
    let edges: InvertibleMap<u32, u32> = [(1, 3), (2, 3), (3, 4), (3, 5), (4, 6), (5, 6)]
        .into_iter()
        .collect();
    let mut resolver = DependencyResolver::new(edges);
    resolver.fire([1, 2]);

    let mut queue: Vec<u32> = resolver.pending().copied().collect();
    let mut done = Vec::new();
    while let Some(id) = queue.pop() {
        done.push(id);
        queue.extend(resolver.resolve([id]));
    }

    assert_eq!(done.len(), 6);
    assert_eq!(done.last(), Some(&6));
    assert_eq!(resolver.pending_len(), 0);
}
