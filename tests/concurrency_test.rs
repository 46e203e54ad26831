mod helpers;

use helpers::TestEnv;
use std::sync::Arc;
use std::thread;
use strata::memory::query::ListQuery;
use strata::memory::types::{Category, NewMemory};

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn fan_out(memory: Arc<strata::tier::TierCoordinator>) {
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let memory = Arc::clone(&memory);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let layer = Category::ALL[(t + i) % Category::ALL.len()];
                    memory
                        .remember(
                            NewMemory::new(format!("writer{t} entry{i} marker")).category(layer),
                        )
                        .unwrap();
                    if i % 5 == 0 {
                        memory.recall("marker", None, 3).unwrap();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn assert_all_present(memory: &strata::tier::TierCoordinator) {
    let total = THREADS * PER_THREAD;
    assert_eq!(memory.stats().unwrap().total_memories as usize, total);

    for t in 0..THREADS {
        let hits = memory.recall(&format!("writer{t}"), None, PER_THREAD).unwrap();
        for i in 0..PER_THREAD {
            assert!(
                hits.iter().any(|h| h.memory.content == format!("writer{t} entry{i} marker")),
                "lost write writer{t} entry{i}"
            );
        }
    }

    // Identities within each layer are unique and dense
    for layer in Category::ALL {
        let mut ids: Vec<i64> = memory
            .query_layer(layer, &ListQuery::new(total))
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        ids.sort_unstable();
        let expected: Vec<i64> = (1..=ids.len() as i64).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn concurrent_remember_loses_nothing_on_disk() {
    let env = TestEnv::new();
    let memory = Arc::new(env.disk_only());
    fan_out(Arc::clone(&memory));
    assert_all_present(&memory);
}

#[test]
fn concurrent_remember_loses_nothing_while_reconciling() {
    let env = TestEnv::new();
    let mut config = env.config();
    config.sync.interval_secs = 1;
    let memory = Arc::new(env.mirrored_with(config));

    let checkpointer = {
        let memory = Arc::clone(&memory);
        thread::spawn(move || {
            for _ in 0..10 {
                memory.checkpoint().unwrap();
            }
        })
    };
    fan_out(Arc::clone(&memory));
    checkpointer.join().unwrap();

    assert_all_present(&memory);
    memory.close().unwrap();
    drop(memory);

    let reopened = env.disk_only();
    assert_eq!(
        reopened.stats().unwrap().total_memories as usize,
        THREADS * PER_THREAD
    );
}
