//! End-to-end catalogue flows against an in-memory store.

use biblio_model::ContributorRole;
use biblio_service::CatalogService;
use biblio_service::error::ErrorKind;
use biblio_service::request::{
    AttachContributorsRequest, ContributorRef, CreateBookRequest, CreateContributorRequest,
};
use biblio_service::response::{ChangeAction, ChangeSummary};
use biblio_store::{Database, Repository};
use std::ops::Deref;

async fn service() -> CatalogService {
    let db = Database::connect_in_memory().await.unwrap();
    CatalogService::new(Repository::from(&db))
}

fn by_name(name: &str) -> ContributorRef {
    ContributorRef::ByName { name: name.to_string(), role: ContributorRole::Author }
}

fn book_req(title: &str, contributors: Vec<ContributorRef>) -> CreateBookRequest {
    CreateBookRequest {
        title: title.to_string(),
        format: "PAPERBACK".to_string(),
        isbn: None,
        year: None,
        pages: None,
        contributors,
    }
}

fn sole_book_id(summary: &ChangeSummary) -> i64 {
    assert_eq!(summary.books.len(), 1);
    *summary.books.keys().next().unwrap()
}

fn contributor_id(summary: &ChangeSummary, name: &str) -> i64 {
    summary
        .contributors
        .iter()
        .find(|(_, change)| change.entity.as_ref().is_some_and(|c| c.name == name))
        .map(|(id, _)| *id)
        .unwrap_or_else(|| panic!("no contributor entry named {name}"))
}

#[tokio::test]
async fn create_book_reports_added_entities_and_rotates_the_token() {
    let service = service().await;
    let before = service.tracker().current();

    let summary = service
        .create_book(book_req("The Gunslinger", vec![by_name("Stephen King")]))
        .await
        .unwrap();

    let book_id = sole_book_id(&summary);
    assert_eq!(summary.books[&book_id].action, ChangeAction::Added);
    let king = contributor_id(&summary, "Stephen King");
    assert_eq!(summary.contributors[&king].action, ChangeAction::Added);
    assert_eq!(summary.last_change_id.as_deref(), Some(before.as_str()));
    assert_ne!(summary.change_id, before);
    assert_eq!(service.tracker().current(), summary.change_id);
}

#[tokio::test]
async fn descriptive_fields_survive_a_round_trip() {
    let service = service().await;
    let summary = service
        .create_book(CreateBookRequest {
            title: "'Salem's Lot".to_string(),
            format: "PAPERBACK".to_string(),
            isbn: Some("978-0-385-00751-1".to_string()),
            year: Some("1975".to_string()),
            pages: Some(439),
            contributors: vec![by_name("Stephen King")],
        })
        .await
        .unwrap();
    let book = service.get_book(sole_book_id(&summary)).await.unwrap().data;
    assert_eq!(book.isbn.as_deref(), Some("978-0-385-00751-1"));
    assert_eq!(book.year.as_deref(), Some("1975"));
    assert_eq!(book.pages, Some(439));
}

#[tokio::test]
async fn reads_carry_the_live_token_without_rotating_it() {
    let service = service().await;
    service.create_book(book_req("The Gunslinger", vec![by_name("Stephen King")])).await.unwrap();
    let token = service.tracker().current();
    let listing = service.list_books().await.unwrap();
    assert_eq!(listing.change_id, token);
    assert_eq!(listing.data.len(), 1);
    assert_eq!(service.tracker().current(), token);
}

#[tokio::test]
async fn duplicate_book_content_is_a_conflict() {
    let service = service().await;
    service.create_book(book_req("The Gunslinger", vec![by_name("Stephen King")])).await.unwrap();
    // Case and punctuation differences normalize away, so this is the same content.
    let err = service
        .create_book(book_req("THE GUNSLINGER!", vec![by_name("stephen king")]))
        .await
        .unwrap_err();
    assert!(matches!(err.deref(), ErrorKind::Conflict));
}

#[tokio::test]
async fn by_name_references_reuse_existing_contributors() {
    let service = service().await;
    let created =
        service.create_contributor(CreateContributorRequest { name: "Stephen King".to_string() }).await.unwrap();
    let king = contributor_id(&created, "Stephen King");

    let summary =
        service.create_book(book_req("The Gunslinger", vec![by_name("STEPHEN KING")])).await.unwrap();
    assert_eq!(summary.contributors[&king].action, ChangeAction::Updated);
    let reloaded = service.get_contributor(king).await.unwrap().data;
    assert_eq!(reloaded.contributions.len(), 1);
}

#[tokio::test]
async fn missing_ids_in_a_batch_surface_as_partial_result() {
    let service = service().await;
    let created =
        service.create_contributor(CreateContributorRequest { name: "Stephen King".to_string() }).await.unwrap();
    let king = contributor_id(&created, "Stephen King");

    let req = book_req(
        "The Gunslinger",
        vec![
            ContributorRef::ById { id: king, role: ContributorRole::Author },
            ContributorRef::ById { id: 999_999, role: ContributorRole::Editor },
        ],
    );
    let err = service.create_book(req).await.unwrap_err();
    match err.deref() {
        ErrorKind::PartialResult(missing) => assert_eq!(missing, &vec![999_999]),
        other => panic!("expected PartialResult, got {other}"),
    }
}

#[tokio::test]
async fn detaching_the_sole_contributor_is_refused() {
    let service = service().await;
    let summary =
        service.create_book(book_req("The Gunslinger", vec![by_name("Stephen King")])).await.unwrap();
    let book = sole_book_id(&summary);
    let king = contributor_id(&summary, "Stephen King");

    let err = service.detach_contributor(book, king).await.unwrap_err();
    assert!(matches!(err.deref(), ErrorKind::InvalidOperation(_)));
    assert_eq!(service.get_book(book).await.unwrap().data.credits().len(), 1);
}

#[tokio::test]
async fn detaching_an_orphaned_contributor_removes_them() {
    let service = service().await;
    let summary = service
        .create_book(book_req("The Talisman", vec![by_name("Stephen King"), by_name("Peter Straub")]))
        .await
        .unwrap();
    let book = sole_book_id(&summary);
    let straub = contributor_id(&summary, "Peter Straub");

    let summary = service.detach_contributor(book, straub).await.unwrap();
    assert_eq!(summary.books[&book].action, ChangeAction::Updated);
    assert_eq!(summary.contributors[&straub].action, ChangeAction::Deleted);
    assert!(matches!(service.get_contributor(straub).await.unwrap_err().deref(), ErrorKind::NotFound));
}

#[tokio::test]
async fn detaching_changes_the_book_fingerprint() {
    let service = service().await;
    let summary = service
        .create_book(book_req("The Talisman", vec![by_name("Stephen King"), by_name("Peter Straub")]))
        .await
        .unwrap();
    let book = sole_book_id(&summary);
    let straub = contributor_id(&summary, "Peter Straub");
    let before = service.get_book(book).await.unwrap().data.sha256;

    service.detach_contributor(book, straub).await.unwrap();
    assert_ne!(service.get_book(book).await.unwrap().data.sha256, before);
}

#[tokio::test]
async fn deleting_a_book_sweeps_orphans_and_keeps_shared_contributors() {
    let service = service().await;
    let talisman = service
        .create_book(book_req("The Talisman", vec![by_name("Stephen King"), by_name("Peter Straub")]))
        .await
        .unwrap();
    service.create_book(book_req("The Gunslinger", vec![by_name("Stephen King")])).await.unwrap();
    let book = sole_book_id(&talisman);
    let king = contributor_id(&talisman, "Stephen King");
    let straub = contributor_id(&talisman, "Peter Straub");

    let summary = service.delete_book(book).await.unwrap();
    assert_eq!(summary.books[&book].action, ChangeAction::Deleted);
    // King is still credited on the other book; Straub is not credited anywhere.
    assert_eq!(summary.contributors[&king].action, ChangeAction::Updated);
    assert_eq!(summary.contributors[&straub].action, ChangeAction::Deleted);
    assert!(service.get_contributor(king).await.is_ok());
}

#[tokio::test]
async fn replacing_credits_sweeps_dropped_contributors() {
    let service = service().await;
    let summary = service
        .create_book(book_req("Good Omens", vec![by_name("Terry Pratchett"), by_name("Neil Gaiman")]))
        .await
        .unwrap();
    let book = sole_book_id(&summary);
    let pratchett = contributor_id(&summary, "Terry Pratchett");

    let summary = service
        .replace_book_credits(book, AttachContributorsRequest { contributors: vec![by_name("Neil Gaiman")] })
        .await
        .unwrap();
    assert_eq!(summary.books[&book].action, ChangeAction::Updated);
    assert_eq!(summary.contributors[&pratchett].action, ChangeAction::Deleted);
    assert_eq!(service.get_book(book).await.unwrap().data.credits().len(), 1);
}

#[tokio::test]
async fn attaching_contributors_appends_after_existing_credits() {
    let service = service().await;
    let summary =
        service.create_book(book_req("The Talisman", vec![by_name("Stephen King")])).await.unwrap();
    let book = sole_book_id(&summary);

    service
        .attach_contributors(book, AttachContributorsRequest { contributors: vec![by_name("Peter Straub")] })
        .await
        .unwrap();
    let names: Vec<String> =
        service.contributors_of_book(book).await.unwrap().data.into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Stephen King".to_string(), "Peter Straub".to_string()]);
}

#[tokio::test]
async fn replacing_a_contributor_repoints_credits_and_reseals_books() {
    let service = service().await;
    let summary = service
        .create_book(book_req("The Cuckoo's Calling", vec![by_name("Robert Galbraith")]))
        .await
        .unwrap();
    let book = sole_book_id(&summary);
    let galbraith = contributor_id(&summary, "Robert Galbraith");
    let before = service.get_book(book).await.unwrap().data.sha256;

    let summary = service
        .replace_contributor(galbraith, CreateContributorRequest { name: "J. K. Rowling".to_string() })
        .await
        .unwrap();
    assert_eq!(summary.contributors[&galbraith].action, ChangeAction::Deleted);
    let rowling = contributor_id(&summary, "J. K. Rowling");
    assert_eq!(summary.contributors[&rowling].action, ChangeAction::Added);
    assert_eq!(summary.books[&book].action, ChangeAction::Updated);

    let reloaded = service.get_book(book).await.unwrap().data;
    assert_ne!(reloaded.sha256, before);
    assert_eq!(reloaded.credits()[0].contributor_id, Some(rowling));
}

#[tokio::test]
async fn replacing_a_book_swaps_content_and_sweeps() {
    let service = service().await;
    let summary =
        service.create_book(book_req("The Gunslinger", vec![by_name("Stephen King")])).await.unwrap();
    let old_book = sole_book_id(&summary);
    let king = contributor_id(&summary, "Stephen King");

    let summary = service
        .replace_book(old_book, book_req("The Drawing of the Three", vec![by_name("Stephen King")]))
        .await
        .unwrap();
    let new_book = sole_book_id(&summary);
    assert_eq!(summary.books[&new_book].action, ChangeAction::Updated);
    // King moved with the replacement, so the sweep keeps them.
    assert_eq!(summary.contributors[&king].action, ChangeAction::Updated);
    assert!(matches!(service.get_book(old_book).await.unwrap_err().deref(), ErrorKind::NotFound));
}

#[tokio::test]
async fn validation_failures_never_rotate_the_token() {
    let service = service().await;
    let token = service.tracker().current();
    let err = service.create_book(book_req("  ", vec![by_name("Stephen King")])).await.unwrap_err();
    assert!(matches!(err.deref(), ErrorKind::Validation(_)));
    let err = service.create_book(book_req("The Gunslinger", vec![])).await.unwrap_err();
    assert!(matches!(err.deref(), ErrorKind::Validation(_)));
    assert_eq!(service.tracker().current(), token);
}
