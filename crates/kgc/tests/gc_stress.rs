//! GC Stress Tests - Repeated Cycles Over Persistent Structure

use kgc::{print_value, Machine, MachineConfig, Value};

#[test]
fn repeated_collections_keep_content_stable() {
    let mut m = Machine::new(MachineConfig {
        page_size: 1024,
        ..Default::default()
    })
    .expect("valid config");

    let items: Vec<Value> = (0..1_000).map(Value::Int).collect();
    let mut root = m.make_list(&items);
    let expected = print_value(m.heap(), root);

    for _ in 0..10 {
        // Churn: garbage between collections.
        for i in 0..500 {
            m.cons(Value::Int(i), Value::Null);
        }
        root = m.collect(root);
        assert_eq!(print_value(m.heap(), root), expected);
    }
    assert_eq!(m.stats().cycles, 10);
    assert!(m.stats().live_bytes > 0);
}

#[test]
fn interning_stays_consistent_across_cycles() {
    let mut m = Machine::with_defaults();
    for round in 0..5 {
        for i in 0..100 {
            m.intern(&format!("sym-{i}"));
        }
        m.collect(Value::Null);
        let a = m.intern("sym-0");
        let b = m.intern("SYM-0");
        assert_eq!(a, b, "round {round}: interning lost identity");
    }
}
