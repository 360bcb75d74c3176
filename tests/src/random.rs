use std::collections::HashMap as StdMap;

use rand::Rng;

use openhash::{HashIdx, HashMap, Identity, Put, RawTable, MISSING};

fn ihash(k: &u32) -> HashIdx {
    *k as HashIdx
}

#[test]
fn random_map_ops_match_the_std_model() {
    let mut rng = rand::thread_rng();
    let mut map: HashMap<u32, u64, Identity> = HashMap::new();
    let mut model: StdMap<u32, u64> = StdMap::new();

    for round in 0..10_000u64 {
        let key = rng.gen_range(0, 512u32);
        match rng.gen_range(0, 4u8) {
            0 => {
                assert_eq!(map.set(key, round).unwrap(), model.insert(key, round));
            }
            1 => {
                let removed = map.remove(&key).map(|(_, v)| v);
                assert_eq!(removed, model.remove(&key));
            }
            2 => {
                assert_eq!(map.get(&key), model.get(&key));
            }
            _ => {
                assert_eq!(map.contains_key(&key), model.contains_key(&key));
            }
        }

        assert_eq!(map.len(), model.len());
        let buckets = map.buckets();
        assert!(buckets == 0 || (buckets.is_power_of_two() && buckets >= 4));
    }

    // Full sweep at the end: present keys resolve, absent keys miss.
    for key in 0..512u32 {
        assert_eq!(map.get(&key), model.get(&key));
    }
}

#[test]
fn random_engine_churn_upholds_the_bookkeeping() {
    let mut rng = rand::thread_rng();
    let mut table: RawTable<u32, u32> = RawTable::new();
    let mut model: StdMap<u32, u32> = StdMap::new();

    for round in 0..20_000u32 {
        let key = rng.gen_range(0, 256u32);
        if rng.gen_range(0, 2u8) == 0 {
            let (idx, status) = table.put(ihash(&key), key, ihash, |a, b| a == b).unwrap();
            if status == Put::Inserted {
                unsafe { table.write_val(idx, key) };
            }
            model.insert(key, key);
        } else {
            let idx = table.find(ihash(&key), |k| *k == key);
            if model.remove(&key).is_some() {
                assert_ne!(idx, MISSING);
                assert_eq!(table.erase(idx).map(|(k, _)| k), Some(key));
            } else {
                assert_eq!(idx, MISSING);
            }
        }

        // Bookkeeping invariants hold after every mutation.
        assert_eq!(table.len(), model.len());
        assert!(table.occupied() >= table.len());
        let bound = (table.buckets() as f64 * table.load_factor() + 0.5) as usize;
        assert!(table.occupied() <= bound);
        assert!(table.buckets() == 0 || table.buckets().is_power_of_two());

        if round % 128 == 0 {
            // `len` is exactly the number of occupied buckets.
            assert_eq!(unsafe { table.iter() }.count(), table.len());
            for (k, v) in &model {
                let idx = table.find(ihash(k), |stored| stored == k);
                assert_ne!(idx, MISSING);
                assert_eq!(unsafe { table.val_at(idx) }, v);
            }
        }
    }
}

#[test]
fn insert_then_delete_restores_the_prior_size() {
    let mut rng = rand::thread_rng();
    let mut map: HashMap<u32, u32, Identity> = HashMap::new();
    for i in 0..100u32 {
        map.set(i, i).unwrap();
    }

    for _ in 0..100 {
        let key = rng.gen_range(1_000, 2_000u32);
        let before = map.len();
        map.set(key, 0).unwrap();
        assert_eq!(map.len(), before + 1);
        assert_eq!(map.remove(&key), Some((key, 0)));
        assert_eq!(map.len(), before);
        assert_eq!(map.get(&key), None);
    }
}
