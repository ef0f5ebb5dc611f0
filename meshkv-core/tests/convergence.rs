//! Convergence and CRDT law tests
//!
//! Store-level tests for the algebraic properties the merge rule must
//! satisfy (commutativity, idempotence, order-independent convergence),
//! plus mesh-level tests wiring whole replicas together over in-memory
//! links: full-state push on join, gossip propagation, conflicting
//! concurrent writes.

use meshkv_core::{Entry, LinkKey, MpscLink, Replica, ReplicaConfig, ReplicaStore, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

fn text(s: &str) -> Option<Value> {
    Some(Value::from(s))
}

fn sorted_entries(store: &ReplicaStore) -> Vec<(String, Entry)> {
    let mut entries = store.snapshot_all();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

// =============================================================================
// STORE-LEVEL LAWS
// =============================================================================

#[test]
fn test_merge_commutativity() {
    let a = Entry::at(text("a"), 100, "r1");
    let b = Entry::at(text("b"), 200, "r2");

    let mut ab = ReplicaStore::new("local", 16);
    ab.merge("k".into(), a.clone());
    ab.merge("k".into(), b.clone());

    let mut ba = ReplicaStore::new("local", 16);
    ba.merge("k".into(), b);
    ba.merge("k".into(), a);

    assert_eq!(sorted_entries(&ab), sorted_entries(&ba));
    assert_eq!(ab.get("k"), Some(Value::from("b")));
}

#[test]
fn test_merge_idempotence() {
    let entry = Entry::at(text("v"), 100, "r2");

    let mut once = ReplicaStore::new("local", 16);
    once.merge("k".into(), entry.clone());

    let mut twice = ReplicaStore::new("local", 16);
    twice.merge("k".into(), entry.clone());
    twice.merge("k".into(), entry);

    assert_eq!(sorted_entries(&once), sorted_entries(&twice));
}

#[test]
fn test_tiebreak_is_deterministic_not_arrival_order() {
    let a = Entry::at(text("from_ra"), 300, "ra");
    let b = Entry::at(text("from_rb"), 300, "rb");

    let mut first = ReplicaStore::new("x", 16);
    first.merge("k".into(), a.clone());
    first.merge("k".into(), b.clone());

    let mut second = ReplicaStore::new("y", 16);
    second.merge("k".into(), b);
    second.merge("k".into(), a);

    // "rb" > "ra" wins on both, regardless of which arrived first
    assert_eq!(first.get("k"), Some(Value::from("from_rb")));
    assert_eq!(second.get("k"), Some(Value::from("from_rb")));
}

#[test]
fn test_convergence_under_permuted_duplicated_delivery() {
    let deliveries: Vec<(String, Entry)> = vec![
        ("color".into(), Entry::at(text("red"), 100, "r1")),
        ("color".into(), Entry::at(text("blue"), 120, "r2")),
        ("size".into(), Entry::at(Some(Value::from(4.0)), 90, "r3")),
        ("size".into(), Entry::at(Some(Value::from(7.0)), 90, "r4")),
        ("title".into(), Entry::at(None, 50, "r1")),
        // Duplicates of earlier messages
        ("color".into(), Entry::at(text("red"), 100, "r1")),
        ("size".into(), Entry::at(Some(Value::from(7.0)), 90, "r4")),
    ];

    let mut forward = ReplicaStore::new("a", 16);
    for (key, entry) in deliveries.clone() {
        forward.merge(key, entry);
    }

    let mut backward = ReplicaStore::new("b", 16);
    for (key, entry) in deliveries.into_iter().rev() {
        backward.merge(key, entry);
    }

    assert_eq!(sorted_entries(&forward), sorted_entries(&backward));
    assert_eq!(forward.get("color"), Some(Value::from("blue")));
    assert_eq!(forward.get("size"), Some(Value::from(7.0)));
    assert_eq!(forward.get("title"), None);
}

// =============================================================================
// MESH SCENARIOS
// =============================================================================

/// Wire two replicas together with a pair of in-memory links, pumping each
/// receiver into the other side's inbound handler.
async fn connect(a: &Arc<Replica>, b: &Arc<Replica>, conn: &str) {
    let (a_to_b, mut a_to_b_rx) = MpscLink::channel();
    let (b_to_a, mut b_to_a_rx) = MpscLink::channel();

    let link_at_a = LinkKey::new("mesh", b.replica_id(), conn);
    let link_at_b = LinkKey::new("mesh", a.replica_id(), conn);

    {
        let b = b.clone();
        let key = link_at_b.clone();
        tokio::spawn(async move {
            while let Some(frame) = a_to_b_rx.recv().await {
                b.handle_message(&key, &frame).await;
            }
        });
    }
    {
        let a = a.clone();
        let key = link_at_a.clone();
        tokio::spawn(async move {
            while let Some(frame) = b_to_a_rx.recv().await {
                a.handle_message(&key, &frame).await;
            }
        });
    }

    a.link_opened(link_at_a, Arc::new(a_to_b)).await;
    b.link_opened(link_at_b, Arc::new(b_to_a)).await;
}

fn replica(id: &str) -> Arc<Replica> {
    Arc::new(Replica::new(ReplicaConfig::new(id)).unwrap())
}

async fn settle() {
    sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_update_propagates_between_peers() {
    let r1 = replica("r1");
    let r2 = replica("r2");
    connect(&r1, &r2, "c1").await;

    r1.write("color", "red").await;
    settle().await;

    assert_eq!(r2.get("color").await, Some(Value::from("red")));
}

#[tokio::test]
async fn test_third_replica_converges_on_join() {
    // Scenario D: r3 joins an established two-replica mesh and converges
    // via the full-state push alone, with no local writes of its own
    let r1 = replica("r1");
    let r2 = replica("r2");
    connect(&r1, &r2, "c1").await;

    r1.write("color", "red").await;
    r2.write("size", 4.0).await;
    r1.clear("color").await;
    r1.write("title", "mesh").await;
    settle().await;

    let r3 = replica("r3");
    connect(&r1, &r3, "c2").await;
    connect(&r2, &r3, "c3").await;
    settle().await;

    assert_eq!(r3.snapshot().await, r1.snapshot().await);
    assert_eq!(r3.snapshot().await, r2.snapshot().await);
    assert_eq!(r3.get("size").await, Some(Value::from(4.0)));
    assert_eq!(r3.get("title").await, Some(Value::from("mesh")));
    assert_eq!(r3.get("color").await, None);
}

#[tokio::test]
async fn test_concurrent_conflicting_writes_converge() {
    let r1 = replica("r1");
    let r2 = replica("r2");
    connect(&r1, &r2, "c1").await;

    // Both write the same key before either hears from the other
    r1.write("k", "from_r1").await;
    r2.write("k", "from_r2").await;
    settle().await;

    // Whoever wins, both sides agree
    let v1 = r1.get("k").await;
    let v2 = r2.get("k").await;
    assert!(v1.is_some());
    assert_eq!(v1, v2);
}

#[tokio::test]
async fn test_malformed_frame_does_not_poison_the_mesh() {
    // Scenario E, end to end: garbage on a live link changes nothing and
    // gossip keeps flowing afterwards
    let r1 = replica("r1");
    let r2 = replica("r2");
    connect(&r1, &r2, "c1").await;

    let bogus_source = LinkKey::new("mesh", "r2", "c1");
    r1.handle_message(&bogus_source, b"{\"key\":\"k\"}").await;
    r1.handle_message(&bogus_source, b"\xff\xfe").await;
    assert!(r1.snapshot().await.is_empty());

    r2.write("k", "still works").await;
    settle().await;
    assert_eq!(r1.get("k").await, Some(Value::from("still works")));
}

#[tokio::test]
async fn test_closed_link_stops_receiving() {
    let r1 = replica("r1");
    let r2 = replica("r2");
    connect(&r1, &r2, "c1").await;

    r1.write("before", "seen").await;
    settle().await;
    assert_eq!(r2.get("before").await, Some(Value::from("seen")));

    // Transport reports the connection gone on r1's side
    r1.link_closed(&LinkKey::new("mesh", "r2", "c1")).await;
    r1.write("after", "unseen").await;
    settle().await;

    assert_eq!(r2.get("after").await, None);
    assert_eq!(r1.link_count().await, 0);
}
