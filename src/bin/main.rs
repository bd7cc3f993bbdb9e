use cordyceps_avl::AvlMap;
use tracing_subscriber::EnvFilter;

fn dump(map: &AvlMap<u32, &str>, step: &str) {
    println!("{step}: {:?}", map.keys().collect::<Vec<_>>());

    let mut graph = String::new();
    if map.dotgraph(step, &mut graph).is_ok() {
        println!("{graph}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut map: AvlMap<u32, &str> = AvlMap::new();

    for (key, value) in [(4, "four"), (2, "two"), (6, "six"), (1, "one"), (3, "three")] {
        map.insert(key, value);
        map.assert_invariants();
        dump(&map, &format!("insert-{key}"));
    }

    map.insert(5, "five");
    map.insert(7, "seven");
    map.assert_invariants();
    dump(&map, "perfect");

    let previous = map.insert(3, "THREE");
    assert_eq!(previous, Some("three"));

    // Removing the root relocates it through its predecessor.
    assert_eq!(map.remove(&4), Some("four"));
    map.assert_invariants();
    dump(&map, "remove-4");

    match map.at(&4) {
        Ok(value) => println!("4 => {value}"),
        Err(err) => println!("4: {err}"),
    }

    let zero = map.pop_first();
    assert_eq!(zero, Some((1, "one")));
    map.assert_invariants();

    drop(map);
}
