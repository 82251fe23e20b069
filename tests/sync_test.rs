//! Integration tests for refreshing captured images against a mocked image
//! service.

mod common;

use assert_matches::assert_matches;
use common::{config_for, create_product, image_json, stored_images, sync_service, LogCapture};
use plcimages::sync::SyncOutcome;
use plcimages_db::pool::init_memory_pool;
use plcimages_db::queries::products;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn product_without_part_number_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Unnumbered", None);
    let service = sync_service(&config_for(&server.uri()), &db);

    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::MissingPartNumber);
    assert!(stored_images(&db, &product).is_empty());
}

#[tokio::test]
async fn clearing_part_number_removes_stored_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json(
            "P-100",
            "b1",
            "f1.jpg",
            "2024-05-01T10:00:00.000Z"
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    service.sync_product(&product).await;
    assert_eq!(stored_images(&db, &product).len(), 1);

    let product = {
        let conn = db.get().unwrap();
        products::set_part_number(&conn, product.id, None).unwrap();
        products::get_product(&conn, product.id).unwrap().unwrap()
    };
    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::MissingPartNumber);
    assert!(stored_images(&db, &product).is_empty());
}

#[tokio::test]
async fn keeps_only_records_for_the_products_part() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .and(query_param("part_number", "P-100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("P-100", "b1", "f1.jpg", "2024-05-01T10:00:00.000Z"),
            image_json("P-200", "b2", "f2.jpg", "2024-05-01T11:00:00.000Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::Synced { stored: 1, skipped: 1 });
    let images = stored_images(&db, &product);
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].part_number.as_deref(), Some("P-100"));
    assert_eq!(images[0].image_url, "http://localhost:9000/b1/f1.jpg");
    assert_eq!(images[0].preview(), "http://localhost:9000/b1/f1.jpg");
    assert_eq!(images[0].camera_model.as_deref(), Some("Basler acA1920"));
    assert_eq!(images[0].camera_location.as_deref(), Some("Line 3"));
    assert_eq!(images[0].image_size, Some(20480));
}

#[tokio::test]
async fn service_listing_every_part_with_gaps_still_syncs() {
    let server = MockServer::start().await;
    // The service ignores the query and returns images for every part.
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("P-100", "b1", "f1.jpg", "2024-05-01T10:00:00.000Z"),
            {
                "image_id": 2,
                "file_name": "upload.png",
                "file_type": "image/png",
                "captured_at": "05/01/2024 10:00",
                "bucket_name": null,
                "part_name": null,
                "part_number": "P-200",
                "device_model": null,
                "location": null
            },
            {
                "image_id": 3,
                "file_name": null,
                "captured_at": null,
                "bucket_name": "b3",
                "part_number": "P-300"
            },
            {
                "image_id": 4,
                "file_name": "orphan.jpg",
                "bucket_name": "b1",
                "part_number": null
            },
            {
                "image_id": 5,
                "file_name": "f5.jpg",
                "captured_at": null,
                "bucket_name": "b1",
                "part_name": null,
                "part_number": "P-100",
                "device_model": null,
                "location": null,
                "resolution": null,
                "capture_mode": null,
                "notes": null
            }
        ])))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::Synced { stored: 2, skipped: 3 });
    let images = stored_images(&db, &product);
    let names: Vec<_> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["f1.jpg", "f5.jpg"]);
    assert!(images[1].captured_at.is_none());
    assert!(images[1].camera_model.is_none());
    assert_eq!(images[1].image_url, "http://localhost:9000/b1/f5.jpg");
}

#[tokio::test]
async fn matching_record_without_storage_location_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("P-100", "b1", "f1.jpg", "2024-05-01T10:00:00.000Z"),
            {"file_name": "f2.jpg", "bucket_name": null, "part_number": "P-100"}
        ])))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    let outcome = service.sync_product(&product).await;

    assert_matches!(outcome, SyncOutcome::ParseFailed { .. });
    assert!(stored_images(&db, &product).is_empty());
}

#[tokio::test]
async fn repeated_sync_replaces_instead_of_doubling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("P-100", "b1", "f1.jpg", "2024-05-01T10:00:00.000Z"),
            image_json("P-100", "b1", "f2.jpg", "2024-05-02T10:00:00.000Z"),
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    service.sync_product(&product).await;
    let first: Vec<_> = stored_images(&db, &product)
        .into_iter()
        .map(|i| (i.image_url, i.captured_at))
        .collect();

    service.sync_product(&product).await;
    let second: Vec<_> = stored_images(&db, &product)
        .into_iter()
        .map(|i| (i.image_url, i.captured_at))
        .collect();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn non_success_status_leaves_no_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json(
            "P-100",
            "b1",
            "f1.jpg",
            "2024-05-01T10:00:00.000Z"
        )])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to fetch images"})),
        )
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    service.sync_product(&product).await;
    assert_eq!(stored_images(&db, &product).len(), 1);

    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::Rejected { status: 500 });
    assert!(stored_images(&db, &product).is_empty());
}

#[tokio::test]
async fn non_success_status_keeps_images_when_clearing_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json(
            "P-100",
            "b1",
            "f1.jpg",
            "2024-05-01T10:00:00.000Z"
        )])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let mut config = config_for(&server.uri());
    config.sync.clear_on_failure = false;
    let service = sync_service(&config, &db);

    service.sync_product(&product).await;
    let outcome = service.sync_product(&product).await;

    assert_eq!(outcome, SyncOutcome::Rejected { status: 503 });
    assert_eq!(stored_images(&db, &product).len(), 1);
}

#[tokio::test]
async fn network_error_is_logged_not_raised() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let logs = LogCapture::default();
    let _guard = logs.install();

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&format!("http://{}", addr)), &db);

    let outcome = service.sync_product(&product).await;

    assert_matches!(outcome, SyncOutcome::FetchFailed { .. });
    assert!(stored_images(&db, &product).is_empty());

    let output = logs.contents();
    assert!(output.contains("ERROR"), "log output: {}", output);
    assert!(output.contains("Error fetching captured images"), "log output: {}", output);
}

#[tokio::test]
async fn malformed_body_is_parse_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    let outcome = service.sync_product(&product).await;

    assert_matches!(outcome, SyncOutcome::ParseFailed { .. });
    assert!(stored_images(&db, &product).is_empty());
}

#[tokio::test]
async fn images_are_read_back_newest_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("P-100", "b1", "old.jpg", "2024-01-01T08:00:00.000Z"),
            image_json("P-100", "b1", "newest.jpg", "2024-06-01T08:00:00.000Z"),
            image_json("P-100", "b1", "middle.jpg", "2024-03-01T08:00:00.000Z"),
        ])))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let service = sync_service(&config_for(&server.uri()), &db);

    service.sync_product(&product).await;

    let images = stored_images(&db, &product);
    let names: Vec<_> = images.iter().map(|i| i.file_name.as_str()).collect();
    assert_eq!(names, vec!["newest.jpg", "middle.jpg", "old.jpg"]);
    assert!(images
        .windows(2)
        .all(|pair| pair[0].captured_at >= pair[1].captured_at));
}

#[tokio::test]
async fn storage_url_comes_from_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json(
            "P-100",
            "plc-captures",
            "cam1_0001.jpg",
            "2024-05-01T10:00:00.000Z"
        )])))
        .mount(&server)
        .await;

    let db = init_memory_pool().unwrap();
    let product = create_product(&db, "Bracket", Some("P-100"));
    let mut config = config_for(&server.uri());
    config.storage.public_url = "https://minio.plant.local".to_string();
    let service = sync_service(&config, &db);

    service.sync_product(&product).await;

    let images = stored_images(&db, &product);
    assert_eq!(
        images[0].image_url,
        "https://minio.plant.local/plc-captures/cam1_0001.jpg"
    );
}
