//! Multi-tenant retrieval scenarios against the in-memory store

mod common;

use std::sync::Arc;

use lectern::retrieval::{RetrievalConfig, RetrievalQuery, Retriever};
use lectern::store::{CollectionAdapter, MemoryStore};
use lectern::{AuditGrant, Error, Principal, Role};

fn sources_for(principal: Principal) -> Vec<String> {
    let retriever = Retriever::new(common::course_adapter());
    retriever
        .retrieve_default("agenda setting", &principal)
        .unwrap()
        .sources
}

#[test]
fn test_owners_see_public_and_their_own() {
    assert_eq!(
        sources_for(Principal::student("alice")),
        vec!["theory.md", "alice_notes.md"]
    );
    assert_eq!(
        sources_for(Principal::teacher("bob")),
        vec!["theory.md", "bob_draft.md"]
    );
}

#[test]
fn test_anonymous_sees_only_public() {
    assert_eq!(sources_for(Principal::default()), vec!["theory.md"]);
}

#[test]
fn test_internal_test_with_targets() {
    assert_eq!(
        sources_for(Principal::internal_test(vec!["bob".into()])),
        vec!["theory.md", "bob_draft.md"]
    );
}

#[test]
fn test_god_view_requires_grant() {
    let without = Principal::internal_test(Vec::new());
    assert_eq!(sources_for(without.clone()), vec!["theory.md"]);

    let with = without.with_audit_grant(AuditGrant::authorized());
    assert_eq!(
        sources_for(with),
        vec!["theory.md", "alice_notes.md", "bob_draft.md"]
    );
}

#[test]
fn test_context_format() {
    let retriever = Retriever::new(common::course_adapter());
    let result = retriever
        .retrieve(&RetrievalQuery::new("agenda setting", 1, Principal::default()))
        .unwrap();
    assert_eq!(
        result.context(),
        "Source (theory.md):\nAgenda setting theory: the media tell us what to think about."
    );
}

#[test]
fn test_not_ready_before_collection_exists() {
    let adapter = Arc::new(CollectionAdapter::new(Arc::new(MemoryStore::new()), "kb"));
    let retriever = Retriever::new(adapter);

    let err = retriever
        .retrieve_default("anything", &Principal::student("alice"))
        .unwrap_err();
    assert!(matches!(err, Error::NotReady));
    assert!(err.is_retryable());

    // Listing degrades to an empty map instead
    assert!(retriever
        .list_sources(Some("alice"), Role::Student)
        .unwrap()
        .is_empty());
}

#[test]
fn test_sparse_tenant_gets_short_result() {
    let adapter = common::empty_adapter();
    for i in 0..5 {
        adapter
            .add_document(
                &format!("press freedom index report {}", i),
                &format!("bob{}.md", i),
                Some("bob"),
                None,
            )
            .unwrap();
    }
    adapter
        .add_document("press notes", "alice.md", Some("alice"), None)
        .unwrap();

    // Alice's chunk ranks below the over-fetch window of 1 * 3
    let retriever = Retriever::with_config(
        adapter,
        RetrievalConfig {
            k: 1,
            fetch_multiplier: 3,
        },
    );
    let result = retriever
        .retrieve_default("press freedom index report", &Principal::student("alice"))
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_list_sources_by_owner() {
    let retriever = Retriever::new(common::course_adapter());

    let mine = retriever.list_sources(Some("alice"), Role::Teacher).unwrap();
    assert_eq!(mine.keys().collect::<Vec<_>>(), vec!["alice"]);

    let all = retriever.list_sources(Some("alice"), Role::InternalTest).unwrap();
    assert_eq!(all.keys().collect::<Vec<_>>(), vec!["alice", "bob", "system"]);
    assert!(all["system"].contains("theory.md"));
}
