use std::sync::Arc;
use std::time::Duration;

use dsefs_contract_tests::seed_collections;
use dsefs_search::{GlobalSearch, SearchAggregator, SearchConfig, SearchHistory, SearchTarget};
use dsefs_storage::{KeyValueStore, MemoryStore, SharedStore, SledStore};

#[test]
fn annual_report_is_found_by_nature() {
    let storage = MemoryStore::new();
    seed_collections(&storage).unwrap();
    let aggregator = SearchAggregator::new(Arc::new(storage), SearchConfig::default());

    let results = aggregator.search("annuel");

    let first = &results[0];
    assert_eq!(first.id, "rapport-r1");
    assert_eq!(first.type_label, "Rapport");
    assert_eq!(first.title, "Rapport Annuel 2024");
    assert!(results.iter().any(|item| item.id == "doc-d1"));
    assert!(results.iter().any(|item| item.type_label == "Catégorie"));
}

#[test]
fn agent_and_report_share_a_name() {
    let storage = MemoryStore::new();
    seed_collections(&storage).unwrap();
    let aggregator = SearchAggregator::new(Arc::new(storage), SearchConfig::default());

    let ids: Vec<_> = aggregator
        .search("ndiaye")
        .into_iter()
        .map(|item| item.id)
        .collect();

    assert_eq!(ids, ["rapport-r1", "agent-a1"]);
}

#[tokio::test(start_paused = true)]
async fn live_search_selection_feeds_history() {
    let storage = MemoryStore::new();
    seed_collections(&storage).unwrap();
    let mut search = GlobalSearch::new(Arc::new(storage.clone()), SearchConfig::default());

    search.set_query("feux");
    tokio::time::sleep(Duration::from_millis(350)).await;
    let item = search.state().results[0].clone();
    assert_eq!(item.id, "rapport-r2");

    assert_eq!(
        search.select(SearchTarget::Item(item)).unwrap(),
        "/rapports/preparation#item-r2"
    );
    search.select(SearchTarget::Term("reboisement".into())).unwrap();

    let reloaded = SearchHistory::load(Arc::new(storage.open_tab()), 7);
    let terms: Vec<_> = reloaded.entries().iter().map(|e| e.term.as_str()).collect();
    assert_eq!(terms, ["reboisement", "Bilan des feux de brousse"]);
}

#[test]
fn history_survives_reopening_durable_storage() {
    let dir = tempfile::tempdir().unwrap();
    {
        let storage = SledStore::open(dir.path()).unwrap();
        seed_collections(&storage).unwrap();
        let shared: SharedStore = Arc::new(storage);
        let aggregator = SearchAggregator::new(Arc::clone(&shared), SearchConfig::default());
        let mut history = SearchHistory::load(shared, 7);

        let item = aggregator.search("plan")[0].clone();
        let (term, path) = SearchTarget::Item(item).resolve();
        assert_eq!(path, "/documents/view/d1");
        history.add_at(&term, 1).unwrap();
        history.add_at("inventaire", 2).unwrap();
    }

    let storage = SledStore::open(dir.path()).unwrap();
    let history = SearchHistory::load(Arc::new(storage.clone()), 7);
    let terms: Vec<_> = history.entries().iter().map(|e| e.term.as_str()).collect();
    assert_eq!(terms, ["inventaire", "Plan d'aménagement annuel"]);
    assert!(storage.get("global_search_history").unwrap().is_some());
}
