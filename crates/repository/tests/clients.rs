mod common;

use common::*;

use librarian_core::{ClientId, DomainError};
use librarian_domain::NewClient;
use librarian_repository::RepositoryError;

#[tokio::test]
async fn empty_clients() {
    let repo = librarian();
    assert!(repo.list_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_non_existing_client() {
    let repo = librarian();
    assert_eq!(repo.get_client(ClientId::new(13)).await.unwrap(), None);
}

#[tokio::test]
async fn adding_a_client() {
    let repo = librarian();
    let id = add_sample_client(&repo, 30, false).await;

    let client = repo.get_client(id).await.unwrap().unwrap();
    assert_eq!(client.age_on(chrono::Utc::now().date_naive()), 30);
    assert!(!client.is_untrustworthy);
    assert_eq!(repo.list_clients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn clients_are_listed_by_name() {
    let repo = librarian();
    for name in ["Cortázar", "Ambrose", "Borges"] {
        repo.add_client(NewClient {
            name: name.to_string(),
            birthdate: birthdate_for_age(30),
            is_untrustworthy: false,
        })
        .await
        .unwrap();
    }

    let names: Vec<String> = repo
        .list_clients()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Ambrose", "Borges", "Cortázar"]);
}

#[tokio::test]
async fn duplicate_client_names_are_rejected() {
    let repo = librarian();
    let draft = NewClient {
        name: "John Walker".to_string(),
        birthdate: birthdate_for_age(30),
        is_untrustworthy: false,
    };
    repo.add_client(draft.clone()).await.unwrap();

    let err = repo.add_client(draft).await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Domain(DomainError::rule("Name", "Such a client already exists"))
    );
}

#[tokio::test]
async fn updating_a_client_birthdate() {
    let repo = librarian();
    let id = add_sample_client(&repo, 30, false).await;

    let mut client = repo.get_client(id).await.unwrap().unwrap();
    client.birthdate = birthdate_for_age(31);
    repo.update_client(client).await.unwrap();

    let client = repo.get_client(id).await.unwrap().unwrap();
    assert_eq!(client.age_on(chrono::Utc::now().date_naive()), 31);
}

#[tokio::test]
async fn updating_a_missing_client_is_not_found() {
    let repo = librarian();
    let client = NewClient {
        name: "John Walker".to_string(),
        birthdate: birthdate_for_age(30),
        is_untrustworthy: false,
    }
    .with_id(ClientId::new(13));

    let err = repo.update_client(client).await.unwrap_err();
    assert_eq!(err, RepositoryError::Domain(DomainError::not_found("client")));
}

#[tokio::test]
async fn renaming_to_an_existing_name_is_rejected() {
    let repo = librarian();
    let taken = add_sample_client(&repo, 30, false).await;
    let id = add_sample_client(&repo, 40, false).await;

    let taken_name = repo.get_client(taken).await.unwrap().unwrap().name;
    let mut client = repo.get_client(id).await.unwrap().unwrap();
    client.name = taken_name;

    let err = repo.update_client(client).await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Domain(DomainError::rule("Name", "Such a client already exists"))
    );
}

#[tokio::test]
async fn lowering_the_birthdate_under_an_age_limited_borrowing_is_rejected() {
    let repo = librarian();
    let client_id = add_sample_client(&repo, 21, false).await;
    let shelf_id = add_sample_shelf(&repo, 1, 20).await;
    let book_id = add_sample_book(&repo, shelf_id, 1, Some(18), None).await;
    add_sample_borrowing(&repo, client_id, book_id, None).await;

    let mut client = repo.get_client(client_id).await.unwrap().unwrap();
    client.birthdate = birthdate_for_age(16);
    let err = repo.update_client(client).await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Domain(DomainError::rule(
            "Birthdate",
            "Age not satisfies current borrowed book limit"
        ))
    );
}

#[tokio::test]
async fn untrustworthiness_is_not_cleared_by_updates() {
    let repo = librarian();
    let id = add_sample_client(&repo, 30, true).await;

    let mut client = repo.get_client(id).await.unwrap().unwrap();
    client.is_untrustworthy = false;
    repo.update_client(client).await.unwrap();

    assert!(repo.get_client(id).await.unwrap().unwrap().is_untrustworthy);
}

#[tokio::test]
async fn deleting_a_client() {
    let repo = librarian();
    let id = add_sample_client(&repo, 30, false).await;
    repo.delete_client(id).await.unwrap();
    assert!(repo.list_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_non_existent_client_is_not_found() {
    let repo = librarian();
    let err = repo.delete_client(ClientId::new(13)).await.unwrap_err();
    assert_eq!(err, RepositoryError::Domain(DomainError::not_found("client")));
}

#[tokio::test]
async fn deleting_a_client_with_an_open_borrowing_is_rejected() {
    let repo = librarian();
    let client_id = add_sample_client(&repo, 30, false).await;
    let shelf_id = add_sample_shelf(&repo, 1, 20).await;
    let book_id = add_sample_book(&repo, shelf_id, 1, None, None).await;
    add_sample_borrowing(&repo, client_id, book_id, None).await;

    let err = repo.delete_client(client_id).await.unwrap_err();
    assert_eq!(
        err,
        RepositoryError::Domain(DomainError::rule("", "Client has active borrowings"))
    );
}

#[tokio::test]
async fn deleting_a_client_removes_their_closed_borrowings() {
    let repo = librarian();
    let client_id = add_sample_client(&repo, 30, false).await;
    let shelf_id = add_sample_shelf(&repo, 1, 20).await;
    let book_id = add_sample_book(&repo, shelf_id, 1, None, None).await;
    let borrowing_id = add_sample_borrowing(&repo, client_id, book_id, None).await;
    repo.return_book(borrowing_id).await.unwrap();

    repo.delete_client(client_id).await.unwrap();

    assert!(repo.get_client(client_id).await.unwrap().is_none());
    assert!(repo.get_borrowing(borrowing_id).await.unwrap().is_none());
    // The book itself stays.
    assert!(repo.get_book(book_id).await.unwrap().is_some());
}
