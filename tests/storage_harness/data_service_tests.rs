//! Macro-generated test suite for `DataService<TestRecord>` contract validation.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use payroll::storage::InMemoryDataService;
//!
//! data_service_tests!(InMemoryDataService::<TestRecord>::new());
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_create_and_get`, `test_get_nonexistent`, `test_list_empty`,
//!   `test_list_in_creation_order`, `test_update_existing`,
//!   `test_update_nonexistent`, `test_delete_existing`,
//!   `test_delete_nonexistent`, `test_create_duplicate_id`
//!
//! ## Tenancy
//! - `test_list_by_company`, `test_get_scoped`, `test_search_stays_in_tenant`
//!
//! ## Search
//! - string, integer, float and boolean fields, no results, unknown field
//!
//! ## Concurrency
//! - `test_concurrent_access`

/// Generate a full `DataService<TestRecord>` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty `DataService<TestRecord>`. It is
/// re-evaluated for each test. The concurrent test also needs `Clone + 'static`.
#[macro_export]
macro_rules! data_service_tests {
    ($factory:expr) => {
        mod data_service_contract_tests {
            use super::*;
            use payroll::core::entity::Entity;
            use payroll::core::service::DataService;
            use uuid::Uuid;

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get() {
                let service = $factory;
                let record = test_record("Alice");
                let id = record.id;

                let created = service.create(record).await.unwrap();
                assert_eq!(created.id(), id);
                assert_eq!(created.email, "alice@test.com");

                let fetched = service.get(&id).await.unwrap().unwrap();
                assert_eq!(fetched.name, "Alice");
                assert_eq!(fetched.age, 30);
                assert!((fetched.score - 4.5).abs() < f64::EPSILON);
                assert!(fetched.active);
                assert_eq!(fetched.company_id, created.company_id);
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let service = $factory;
                assert!(service.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_empty() {
                let service = $factory;
                assert!(service.list().await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_list_in_creation_order() {
                let service = $factory;
                let company = Uuid::new_v4();
                for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
                    let record = create_test_record(company, name, "x@test.com", i as i64, 1.0, true);
                    service.create(record).await.unwrap();
                    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
                }

                let names: Vec<String> = service
                    .list_by_company(&company)
                    .await
                    .unwrap()
                    .into_iter()
                    .map(|r| r.name)
                    .collect();
                assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
            }

            #[tokio::test]
            async fn test_update_existing() {
                let service = $factory;
                let mut record = service.create(test_record("Bob")).await.unwrap();
                record.name = "Robert".to_string();
                record.touch();

                service.update(&record.id, record.clone()).await.unwrap();
                let fetched = service.get(&record.id).await.unwrap().unwrap();
                assert_eq!(fetched.name, "Robert");
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let service = $factory;
                let record = test_record("Ghost");
                assert!(service.update(&record.id, record.clone()).await.is_err());
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let service = $factory;
                let record = service.create(test_record("Carol")).await.unwrap();
                service.delete(&record.id).await.unwrap();
                assert!(service.get(&record.id).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let service = $factory;
                assert!(service.delete(&Uuid::new_v4()).await.is_ok());
            }

            #[tokio::test]
            async fn test_create_duplicate_id() {
                let service = $factory;
                let record = service.create(test_record("Dup")).await.unwrap();
                assert!(service.create(record).await.is_err());
            }

            // ==================================================================
            // Tenancy
            // ==================================================================

            #[tokio::test]
            async fn test_list_by_company() {
                let service = $factory;
                let acme = Uuid::new_v4();
                let globex = Uuid::new_v4();
                service
                    .create(create_test_record(acme, "a1", "a1@acme.in", 1, 1.0, true))
                    .await
                    .unwrap();
                service
                    .create(create_test_record(acme, "a2", "a2@acme.in", 2, 1.0, true))
                    .await
                    .unwrap();
                service
                    .create(create_test_record(globex, "g1", "g1@globex.in", 3, 1.0, true))
                    .await
                    .unwrap();

                assert_eq!(service.list().await.unwrap().len(), 3);
                assert_eq!(service.list_by_company(&acme).await.unwrap().len(), 2);
                assert_eq!(service.list_by_company(&globex).await.unwrap().len(), 1);
                assert!(service.list_by_company(&Uuid::new_v4()).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_get_scoped() {
                let service = $factory;
                let record = service.create(test_record("Scoped")).await.unwrap();
                assert!(
                    service
                        .get_scoped(&record.company_id, &record.id)
                        .await
                        .unwrap()
                        .is_some()
                );
                assert!(
                    service
                        .get_scoped(&Uuid::new_v4(), &record.id)
                        .await
                        .unwrap()
                        .is_none()
                );
            }

            #[tokio::test]
            async fn test_search_stays_in_tenant() {
                let service = $factory;
                let acme = Uuid::new_v4();
                let globex = Uuid::new_v4();
                for company in [acme, globex] {
                    service
                        .create(create_test_record(company, "same", "same@test.com", 1, 1.0, true))
                        .await
                        .unwrap();
                }
                let found = service.search(&acme, "name", "same").await.unwrap();
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].company_id, acme);
            }

            // ==================================================================
            // Search
            // ==================================================================

            async fn seeded() -> (Uuid, impl DataService<TestRecord>) {
                let service = $factory;
                let company = Uuid::new_v4();
                let rows = [
                    ("Alice", "alice@test.com", 30, 4.5, true),
                    ("Bob", "bob@test.com", 25, 3.0, false),
                    ("Carol", "carol@test.com", 30, 2.5, true),
                ];
                for (name, email, age, score, active) in rows {
                    service
                        .create(create_test_record(company, name, email, age, score, active))
                        .await
                        .unwrap();
                }
                (company, service)
            }

            #[tokio::test]
            async fn test_search_string_field() {
                let (company, service) = seeded().await;
                let found = service.search(&company, "email", "bob@test.com").await.unwrap();
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].name, "Bob");
            }

            #[tokio::test]
            async fn test_search_integer_field() {
                let (company, service) = seeded().await;
                let found = service.search(&company, "age", "30").await.unwrap();
                assert_eq!(found.len(), 2);
            }

            #[tokio::test]
            async fn test_search_float_field() {
                let (company, service) = seeded().await;
                let found = service.search(&company, "score", "2.5").await.unwrap();
                assert_eq!(found.len(), 1);
                assert_eq!(found[0].name, "Carol");
            }

            #[tokio::test]
            async fn test_search_boolean_field() {
                let (company, service) = seeded().await;
                assert_eq!(service.search(&company, "active", "true").await.unwrap().len(), 2);
                assert_eq!(service.search(&company, "active", "false").await.unwrap().len(), 1);
            }

            #[tokio::test]
            async fn test_search_no_results() {
                let (company, service) = seeded().await;
                assert!(service.search(&company, "name", "Zed").await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_search_unknown_field() {
                let (company, service) = seeded().await;
                assert!(service.search(&company, "nope", "x").await.unwrap().is_empty());
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test]
            async fn test_concurrent_access() {
                let service = $factory;
                let company = Uuid::new_v4();
                let mut handles = Vec::new();
                for i in 0..10 {
                    let service = service.clone();
                    handles.push(tokio::spawn(async move {
                        let record = create_test_record(company, &format!("c{}", i), "c@test.com", i, 0.0, true);
                        service.create(record).await.unwrap();
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }
                assert_eq!(service.list_by_company(&company).await.unwrap().len(), 10);
            }
        }
    };
}
