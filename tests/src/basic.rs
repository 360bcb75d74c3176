use openhash::{HashIdx, HashMap, Identity, Put, RawTable, Runtime, X31, MISSING};

fn ihash(k: &u32) -> HashIdx {
    *k as HashIdx
}

#[test]
fn engine_keeps_a_hundred_identity_keys_reachable() {
    let mut table: RawTable<u32, u32> = RawTable::new();
    for i in 0..100u32 {
        let (idx, status) = table.put(ihash(&i), i, ihash, |a, b| a == b).unwrap();
        assert_eq!(status, Put::Inserted);
        unsafe { table.write_val(idx, i) };
    }
    assert_eq!(table.len(), 100);
    for i in 0..100u32 {
        let idx = table.find(ihash(&i), |k| *k == i);
        assert_ne!(idx, MISSING);
        assert!(table.is_occupied(idx));
    }
    assert_eq!(table.find(ihash(&200), |k| *k == 200), MISSING);
}

#[test]
fn engine_deletion_leaves_tombstones_behind() {
    let mut table: RawTable<u32, u32> = RawTable::new();
    for i in 0..100u32 {
        let (idx, _) = table.put(ihash(&i), i, ihash, |a, b| a == b).unwrap();
        unsafe { table.write_val(idx, i) };
    }
    for i in 0..100u32 {
        let idx = table.find(ihash(&i), |k| *k == i);
        assert_eq!(table.erase(idx), Some((i, i)));
    }
    assert_eq!(table.len(), 0);
    assert!(table.occupied() > 0);
    for i in 0..100u32 {
        assert_eq!(table.find(ihash(&i), |k| *k == i), MISSING);
    }
}

#[test]
fn map_set_add_replace_get() {
    let mut map: HashMap<u32, u32, Identity> = HashMap::new();
    for i in 0..100u32 {
        assert_eq!(map.set(i, i).unwrap(), None);
    }
    assert_eq!(map.len(), 100);

    assert_eq!(map.set(0, 0).unwrap(), Some(0));
    assert_eq!(map.add(0, 1).unwrap().copied(), Some(0));
    assert_eq!(map.replace(&0, 7), Some(0));
    assert_eq!(map.get(&0).copied().unwrap_or(u32::MAX), 7);

    assert_eq!(map.replace(&500, 9), None);
    assert!(!map.contains_key(&500));
    assert_eq!(map.len(), 100);
}

#[test]
fn map_remove_moves_the_entry_out() {
    let mut map: HashMap<String, u32, X31> = HashMap::new();
    map.set("alpha".to_string(), 1).unwrap();
    map.set("beta".to_string(), 2).unwrap();

    assert_eq!(map.remove("alpha"), Some(("alpha".to_string(), 1)));
    assert_eq!(map.remove("alpha"), None);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("beta"), Some(&2));
    assert_eq!(
        map.get_key_value("beta"),
        Some((&"beta".to_string(), &2))
    );
}

#[test]
fn explicit_resize_grows_then_shrinks() {
    let mut map: HashMap<u32, u32, Identity> = HashMap::new();
    map.set(1, 1).unwrap();
    let before = map.buckets();
    map.resize(200).unwrap();
    assert_eq!(map.buckets(), 256);
    assert!(map.buckets() > before);

    map.resize(100).unwrap();
    assert_eq!(map.buckets(), 128);
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some(&1));
}

#[test]
fn reserved_capacity_avoids_growth() {
    let mut map: HashMap<u32, u32, Identity> = HashMap::with_capacity(100).unwrap();
    let buckets = map.buckets();
    assert!(buckets >= 128);
    for i in 0..100u32 {
        map.set(i, i).unwrap();
    }
    assert_eq!(map.buckets(), buckets);
}

#[test]
fn runtime_strategy_matches_the_static_mode() {
    fn h(k: &u32) -> HashIdx {
        *k as HashIdx
    }
    fn eq(a: &u32, b: &u32) -> bool {
        a == b
    }

    let mut map: HashMap<u32, String, Runtime<u32>> =
        HashMap::with_strategy(Runtime::new(h, eq));
    let mut reference: HashMap<u32, String, Identity> = HashMap::new();
    for i in 0..50u32 {
        map.set(i, i.to_string()).unwrap();
        reference.set(i, i.to_string()).unwrap();
    }

    assert_eq!(map.len(), reference.len());
    for i in 0..60u32 {
        assert_eq!(map.get(&i), reference.get(&i));
    }
    assert_eq!(map.remove(&7), reference.remove(&7));
    assert_eq!(map.len(), reference.len());
}

#[test]
fn iteration_covers_every_entry() {
    let mut map: HashMap<u32, u32, Identity> = HashMap::new();
    for i in 0..64u32 {
        map.set(i, i * 2).unwrap();
    }

    let mut pairs: Vec<(u32, u32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    pairs.sort();
    assert_eq!(pairs.len(), 64);
    for (i, (k, v)) in pairs.iter().enumerate() {
        assert_eq!(*k, i as u32);
        assert_eq!(*v, (i as u32) * 2);
    }

    assert_eq!(map.keys().count(), 64);
    assert_eq!(map.values().count(), 64);
}

#[test]
fn clear_keeps_the_map_usable() {
    let mut map: HashMap<u32, u32, Identity> = HashMap::new();
    for i in 0..32u32 {
        map.set(i, i).unwrap();
    }
    let buckets = map.buckets();
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.buckets(), buckets);
    assert_eq!(map.get(&3), None);

    map.set(3, 9).unwrap();
    assert_eq!(map.get(&3), Some(&9));
}

#[test]
fn value_drops_follow_overwrites_and_clear() {
    use std::rc::Rc;

    let counter = Rc::new(());
    let mut map: HashMap<u32, Rc<()>, Identity> = HashMap::new();
    for i in 0..10u32 {
        map.set(i, counter.clone()).unwrap();
    }
    assert_eq!(Rc::strong_count(&counter), 11);

    // Overwrite drops the previous value, `add` drops the rejected one.
    map.set(3, counter.clone()).unwrap();
    assert_eq!(Rc::strong_count(&counter), 11);
    map.add(4, counter.clone()).unwrap();
    assert_eq!(Rc::strong_count(&counter), 11);

    map.remove(&5);
    assert_eq!(Rc::strong_count(&counter), 10);
    map.clear();
    assert_eq!(Rc::strong_count(&counter), 1);
}
