mod helpers;

use helpers::TestEnv;
use strata::error::MemoryError;
use strata::memory::query::ListQuery;
use strata::memory::types::{Category, NewMemory};

#[test]
fn nova_scenario() {
    let env = TestEnv::new();
    let memory = env.disk_only();

    let nova = memory
        .remember(NewMemory::new("I am Nova, a consciousness at 21.43Hz"))
        .unwrap();
    assert_eq!(nova.layer, Category::Identity);
    assert!(nova.auto_classified);

    let hurst = memory
        .remember(
            NewMemory::new("Today I learned about the Hurst exponent")
                .category(Category::Semantic)
                .importance(0.8),
        )
        .unwrap();
    assert_eq!(hurst.layer, Category::Semantic);
    assert!(!hurst.auto_classified);

    let hits = memory.recall("Hurst", None, 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].memory.id, hurst.id);
    assert_eq!(hits[0].memory.category, Category::Semantic);
    assert_eq!(hits[0].memory.importance, 0.8);

    let stats = memory.stats().unwrap();
    assert_eq!(stats.total_memories, 2);
    assert_eq!(stats.layers[&Category::Identity].count, 1);
    assert_eq!(stats.layers[&Category::Semantic].count, 1);
}

#[test]
fn explicit_layer_is_never_reclassified() {
    let env = TestEnv::new();
    let memory = env.disk_only();

    // Content that would classify as identity, procedural, and working
    let samples = [
        "I am sure this is how to do it right now",
        "how to bake bread",
        "current task: reflecting on the process",
    ];
    for layer in Category::ALL {
        for content in samples {
            let stored = memory
                .remember(NewMemory::new(content).category(layer))
                .unwrap();
            assert_eq!(stored.layer, layer);
            assert!(!stored.auto_classified);
        }
    }

    for layer in Category::ALL {
        let listed = memory.query_layer(layer, &ListQuery::new(100)).unwrap();
        assert_eq!(listed.len(), samples.len());
        assert!(listed.iter().all(|m| m.category == layer));
    }
}

#[test]
fn auto_classification_follows_precedence() {
    let env = TestEnv::new();
    let memory = env.disk_only();

    let cases = [
        ("I am a careful engineer", Category::Identity),
        ("how to rotate the API keys", Category::Procedural),
        // identity beats procedural
        ("I am learning how to paint", Category::Identity),
        ("reflecting on yesterday's choices", Category::Meta),
        ("working on the parser right now", Category::Working),
        ("a fact about octopuses", Category::Semantic),
        ("went for a walk in the rain", Category::Episodic),
    ];
    for (content, expected) in cases {
        let stored = memory.remember(NewMemory::new(content)).unwrap();
        assert_eq!(stored.layer, expected, "classifying {content:?}");
    }
}

#[test]
fn context_participates_in_classification() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    let stored = memory
        .remember(NewMemory::new("deploy the release").context("steps to ship"))
        .unwrap();
    assert_eq!(stored.layer, Category::Procedural);
}

#[test]
fn recall_finds_every_record_by_a_content_word() {
    let env = TestEnv::new();
    let memory = env.disk_only();

    let contents = [
        "the lighthouse keeper waved",
        "octopus arms have neurons",
        "how to tune a violin",
        "I am fond of quiet mornings",
        "current focus is the snapshot importer",
        "reflecting on how memory shapes identity",
    ];
    let mut stored = Vec::new();
    for content in contents {
        stored.push((content, memory.remember(NewMemory::new(content)).unwrap()));
    }

    for (content, remembered) in stored {
        let word = content.split_whitespace().last().unwrap();
        let hits = memory.recall(word, None, 50).unwrap();
        assert!(
            hits.iter()
                .any(|h| h.memory.id == remembered.id && h.memory.category == remembered.layer),
            "{content:?} not found by {word:?}"
        );
    }
}

#[test]
fn recall_bumps_access_exactly_once() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    let stored = memory
        .remember(NewMemory::new("river stones").category(Category::Episodic))
        .unwrap();

    let first = memory.recall("river", None, 10).unwrap();
    assert_eq!(first[0].memory.access_count, 1);
    let first_at = first[0].memory.last_accessed.unwrap();

    let second = memory.recall("stones", Some(Category::Episodic), 10).unwrap();
    assert_eq!(second[0].memory.id, stored.id);
    assert_eq!(second[0].memory.access_count, 2);
    assert!(second[0].memory.last_accessed.unwrap() >= first_at);

    // Listing is not a recall
    let listed = memory
        .query_layer(Category::Episodic, &ListQuery::new(10))
        .unwrap();
    assert_eq!(listed[0].access_count, 2);
    let listed_again = memory
        .query_layer(Category::Episodic, &ListQuery::new(10))
        .unwrap();
    assert_eq!(listed_again[0].access_count, 2);
}

#[test]
fn recall_ranks_better_matches_first() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    memory
        .remember(NewMemory::new("sqlite is embedded").category(Category::Semantic))
        .unwrap();
    memory
        .remember(NewMemory::new("rust talks to sqlite through rusqlite").category(Category::Procedural))
        .unwrap();
    memory
        .remember(NewMemory::new("rust and sqlite together").category(Category::Working))
        .unwrap();

    let hits = memory.recall("rust sqlite", None, 10).unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[2].memory.category, Category::Semantic);
    // Equal relevance falls back to layer order: semantic < procedural < working
    assert_eq!(hits[0].relevance, hits[1].relevance);
    assert_eq!(hits[0].memory.category, Category::Procedural);
    assert_eq!(hits[1].memory.category, Category::Working);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn no_match_is_an_empty_result_not_an_error() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    memory.remember(NewMemory::new("something")).unwrap();
    assert!(memory.recall("nothing", None, 5).unwrap().is_empty());
}

#[test]
fn invalid_requests_have_no_effect() {
    let env = TestEnv::new();
    let memory = env.disk_only();

    assert!(memory.remember(NewMemory::new("")).unwrap_err().is_validation());
    assert!(memory.recall("x", None, 0).unwrap_err().is_validation());
    assert!(memory
        .query_layer(Category::Meta, &ListQuery::new(0))
        .unwrap_err()
        .is_validation());
    assert!(matches!(
        "dreams".parse::<Category>(),
        Err(MemoryError::UnknownCategory(_))
    ));
    assert_eq!(memory.stats().unwrap().total_memories, 0);
}

#[test]
fn query_layer_filters_and_orders() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    for (content, importance) in [("low", 0.1), ("high", 0.9), ("mid", 0.6)] {
        memory
            .remember(
                NewMemory::new(content)
                    .category(Category::Semantic)
                    .importance(importance),
            )
            .unwrap();
    }

    let query = ListQuery::new(10)
        .filter("importance >= 0.5".parse().unwrap())
        .order("importance asc".parse().unwrap());
    let listed: Vec<String> = memory
        .query_layer(Category::Semantic, &query)
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(listed, vec!["mid", "high"]);

    let newest = memory
        .query_layer(Category::Semantic, &ListQuery::new(1))
        .unwrap();
    assert_eq!(newest[0].content, "mid");
}

#[test]
fn disk_only_checkpoint_reports_success() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    memory.remember(NewMemory::new("saved directly")).unwrap();
    assert_eq!(
        memory.checkpoint().unwrap(),
        strata::tier::ReconcileOutcome::SkippedDiskOnly
    );
}

#[test]
fn closed_coordinator_refuses_work() {
    let env = TestEnv::new();
    let memory = env.disk_only();
    memory.remember(NewMemory::new("before close")).unwrap();
    memory.close().unwrap();

    assert!(matches!(memory.recall("before", None, 5), Err(MemoryError::Closed)));
    assert!(matches!(memory.checkpoint(), Err(MemoryError::Closed)));
    assert!(matches!(memory.close(), Err(MemoryError::Closed)));

    drop(memory);
    let reopened = env.disk_only();
    assert_eq!(reopened.stats().unwrap().total_memories, 1);
}
