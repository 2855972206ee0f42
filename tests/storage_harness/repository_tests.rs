//! Macro-generated test suite for `Repository<TicketWithMetadata>` contract validation.
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_and_read`: store assigns id and version, read returns the same entity
//! - `test_read_nonexistent`: NotFound
//! - `test_read_malformed_id`: Request error, not NotFound
//! - `test_update_changes_version`: new version, new data persisted
//! - `test_update_stale_version`: Conflict, stored entity untouched
//! - `test_update_nonexistent`: NotFound
//! - `test_update_malformed_version`: Request error
//! - `test_update_malformed_version_of_missing_row`: Request error, not NotFound
//! - `test_delete_existing`: delete then read is NotFound
//! - `test_delete_ignores_version`: no version is needed to delete
//! - `test_delete_nonexistent`: succeeds
//!
//! ## Query
//! - `test_query_empty`: empty page has page 0 and size 0
//! - `test_query_filter_and_sort`: conjoined filters, descending sort
//! - `test_query_pagination`: slices and the past-the-end page
//! - `test_query_multi_sort`: second sort term breaks ties
//!
//! ## Transactions
//! - `test_rollback_discards`: explicit rollback leaves no trace
//! - `test_drop_discards`: dropping an uncommitted tx leaves no trace
//! - `test_concurrent_updates_one_conflicts`: exactly one of two racing
//!   updates from the same version succeeds

/// Generate a full `Repository<TicketWithMetadata>` conformance test suite.
///
/// `$factory` must be an expression producing a fresh, empty repository.
/// It is re-evaluated for each test.
#[macro_export]
macro_rules! repository_contract_tests {
    ($factory:expr) => {
        mod repository_contract_tests {
            use super::*;
            use ticket::core::error::ErrorKind;
            use ticket::core::query::{Direction, Operator, QuerySpec};
            use ticket::core::repository::{Repository, Transaction};
            use ticket::entities::Ticket;

            async fn seed<R: Repository<TicketWithMetadata>>(repo: &R) -> Vec<TicketWithMetadata> {
                let mut tx = repo.start_tx(false).await.unwrap();
                let mut created = Vec::new();
                for t in sample_batch() {
                    created.push(repo.create(&mut tx, t).await.unwrap());
                }
                tx.commit().await.unwrap();
                created
            }

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_create_and_read() {
                let repo = $factory;

                let mut tx = repo.start_tx(false).await.unwrap();
                let created = repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                tx.commit().await.unwrap();

                assert_uuid(created.id());
                assert!(!created.version().is_empty());
                assert_eq!(created.data, Ticket::new("alpha", "about alpha", "open"));

                let mut tx = repo.start_tx(true).await.unwrap();
                let read = repo.read(&mut tx, created.id()).await.unwrap();
                tx.commit().await.unwrap();
                assert_eq!(read, created);
            }

            #[tokio::test]
            async fn test_read_nonexistent() {
                let repo = $factory;
                let mut tx = repo.start_tx(true).await.unwrap();
                let err = repo
                    .read(&mut tx, &uuid::Uuid::new_v4().to_string())
                    .await
                    .unwrap_err();
                assert_eq!(err.kind(), ErrorKind::NotFound);
            }

            #[tokio::test]
            async fn test_read_malformed_id() {
                let repo = $factory;
                let mut tx = repo.start_tx(true).await.unwrap();
                let err = repo.read(&mut tx, "not-a-uuid").await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Request);
            }

            #[tokio::test]
            async fn test_update_changes_version() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                let created = repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                tx.commit().await.unwrap();

                let mut changed = created.clone();
                changed.data.status = "closed".to_string();

                let mut tx = repo.start_tx(false).await.unwrap();
                let updated = repo.update(&mut tx, changed).await.unwrap();
                tx.commit().await.unwrap();

                assert_eq!(updated.id(), created.id());
                assert_ne!(updated.version(), created.version());
                assert_eq!(updated.data.status, "closed");

                let mut tx = repo.start_tx(true).await.unwrap();
                let read = repo.read(&mut tx, created.id()).await.unwrap();
                assert_eq!(read, updated);
            }

            #[tokio::test]
            async fn test_update_stale_version() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                let created = repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                tx.commit().await.unwrap();

                let mut first = created.clone();
                first.data.summary = "first".to_string();
                let mut tx = repo.start_tx(false).await.unwrap();
                let winner = repo.update(&mut tx, first).await.unwrap();
                tx.commit().await.unwrap();

                let mut stale = created.clone();
                stale.data.summary = "stale".to_string();
                let mut tx = repo.start_tx(false).await.unwrap();
                let err = repo.update(&mut tx, stale).await.unwrap_err();
                tx.rollback().await.unwrap();
                assert_eq!(err.kind(), ErrorKind::Conflict);

                let mut tx = repo.start_tx(true).await.unwrap();
                let read = repo.read(&mut tx, created.id()).await.unwrap();
                assert_eq!(read, winner);
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let repo = $factory;
                let mut ghost = new_ticket("ghost", "open");
                ghost.metadata.id = uuid::Uuid::new_v4().to_string();
                ghost.metadata.version = "1".to_string();

                let mut tx = repo.start_tx(false).await.unwrap();
                let err = repo.update(&mut tx, ghost).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::NotFound);
            }

            #[tokio::test]
            async fn test_update_malformed_version() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                let mut created = repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                created.metadata.version = "v1".to_string();

                let err = repo.update(&mut tx, created).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Request);
            }

            #[tokio::test]
            async fn test_update_malformed_version_of_missing_row() {
                let repo = $factory;
                let mut ghost = new_ticket("ghost", "open");
                ghost.metadata.id = uuid::Uuid::new_v4().to_string();
                ghost.metadata.version = "v1".to_string();

                let mut tx = repo.start_tx(false).await.unwrap();
                let err = repo.update(&mut tx, ghost).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::Request);
                assert_eq!(err.to_string(), "invalid version: v1");
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let repo = $factory;
                let created = seed(&repo).await;
                let target = created[0].id().to_string();

                let mut tx = repo.start_tx(false).await.unwrap();
                repo.delete(&mut tx, &target).await.unwrap();
                tx.commit().await.unwrap();

                let mut tx = repo.start_tx(true).await.unwrap();
                let err = repo.read(&mut tx, &target).await.unwrap_err();
                assert_eq!(err.kind(), ErrorKind::NotFound);

                let page = repo.query(&mut tx, &QuerySpec::new()).await.unwrap();
                assert_eq!(page.size, 4);
            }

            #[tokio::test]
            async fn test_delete_ignores_version() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                let created = repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                tx.commit().await.unwrap();

                // bump the version so any version the deleter could hold is stale
                let mut tx = repo.start_tx(false).await.unwrap();
                repo.update(&mut tx, created.clone()).await.unwrap();
                tx.commit().await.unwrap();

                let mut tx = repo.start_tx(false).await.unwrap();
                repo.delete(&mut tx, created.id()).await.unwrap();
                tx.commit().await.unwrap();

                let mut tx = repo.start_tx(true).await.unwrap();
                assert!(repo.read(&mut tx, created.id()).await.unwrap_err().is_not_found());
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                repo.delete(&mut tx, &uuid::Uuid::new_v4().to_string())
                    .await
                    .unwrap();
                tx.commit().await.unwrap();
            }

            // ==============================================================
            // Query
            // ==============================================================

            #[tokio::test]
            async fn test_query_empty() {
                let repo = $factory;
                let mut tx = repo.start_tx(true).await.unwrap();
                let page = repo
                    .query(&mut tx, &QuerySpec::new().page(1).size(10))
                    .await
                    .unwrap();
                assert!(page.is_empty());
                assert_eq!(page.page, 0);
                assert_eq!(page.size, 0);
            }

            #[tokio::test]
            async fn test_query_filter_and_sort() {
                let repo = $factory;
                seed(&repo).await;

                let query = QuerySpec::new()
                    .filter("status", Operator::Eq, "open")
                    .filter("summary", Operator::Ne, "charlie")
                    .sort("summary", Direction::Desc);

                let mut tx = repo.start_tx(true).await.unwrap();
                let page = repo.query(&mut tx, &query).await.unwrap();
                assert_eq!(summaries(&page), vec!["echo", "alpha"]);
            }

            #[tokio::test]
            async fn test_query_pagination() {
                let repo = $factory;
                seed(&repo).await;

                let base = QuerySpec::new().sort("summary", Direction::Asc).size(2);
                let mut tx = repo.start_tx(true).await.unwrap();

                let first = repo.query(&mut tx, &base.clone().page(1)).await.unwrap();
                assert_eq!(summaries(&first), vec!["alpha", "bravo"]);
                assert_eq!((first.page, first.size), (1, 2));

                let last = repo.query(&mut tx, &base.clone().page(3)).await.unwrap();
                assert_eq!(summaries(&last), vec!["echo"]);
                assert_eq!((last.page, last.size), (3, 1));

                let beyond = repo.query(&mut tx, &base.clone().page(4)).await.unwrap();
                assert!(beyond.is_empty());
                assert_eq!(beyond.page, 0);
            }

            #[tokio::test]
            async fn test_query_multi_sort() {
                let repo = $factory;
                seed(&repo).await;

                let query = QuerySpec::new()
                    .sort("status", Direction::Asc)
                    .sort("summary", Direction::Desc);

                let mut tx = repo.start_tx(true).await.unwrap();
                let page = repo.query(&mut tx, &query).await.unwrap();
                assert_eq!(
                    summaries(&page),
                    vec!["bravo", "echo", "charlie", "alpha", "delta"]
                );
            }

            // ==============================================================
            // Transactions
            // ==============================================================

            #[tokio::test]
            async fn test_rollback_discards() {
                let repo = $factory;
                let mut tx = repo.start_tx(false).await.unwrap();
                repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                tx.rollback().await.unwrap();

                let mut tx = repo.start_tx(true).await.unwrap();
                let page = repo.query(&mut tx, &QuerySpec::new()).await.unwrap();
                assert!(page.is_empty());
            }

            #[tokio::test]
            async fn test_drop_discards() {
                let repo = $factory;
                {
                    let mut tx = repo.start_tx(false).await.unwrap();
                    repo.create(&mut tx, new_ticket("alpha", "open")).await.unwrap();
                }

                let mut tx = repo.start_tx(true).await.unwrap();
                let page = repo.query(&mut tx, &QuerySpec::new()).await.unwrap();
                assert!(page.is_empty());
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
            async fn test_concurrent_updates_one_conflicts() {
                let service = service_for($factory);
                let created = service
                    .create(&ctx(), new_ticket("alpha", "open"))
                    .await
                    .unwrap();

                let mut handles = Vec::new();
                for status in ["closed", "pending"] {
                    let service = service.clone();
                    let mut entity = created.clone();
                    entity.data.status = status.to_string();
                    handles.push(tokio::spawn(async move {
                        service.update(&ctx(), entity).await
                    }));
                }

                let mut ok = 0;
                let mut conflicts = 0;
                for handle in handles {
                    match handle.await.unwrap() {
                        Ok(_) => ok += 1,
                        Err(e) if e.kind() == ErrorKind::Conflict => conflicts += 1,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                assert_eq!((ok, conflicts), (1, 1));
            }
        }
    };
}
