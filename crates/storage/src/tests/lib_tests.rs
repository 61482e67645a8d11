use super::*;
use shared::domain::MenuItem;

fn line(id: &str, price: u64, quantity: u32) -> CartLine {
    CartLine {
        item: MenuItem {
            id: id.into(),
            name: id.to_string(),
            price,
            comment: None,
            image: None,
        },
        quantity,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn round_trips_and_overwrites_blobs() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.get_blob("missing").await.expect("get"), None);

    storage.put_blob("greeting", "hello").await.expect("put");
    storage.put_blob("greeting", "namaste").await.expect("put");
    assert_eq!(
        storage.get_blob("greeting").await.expect("get").as_deref(),
        Some("namaste")
    );

    storage.delete_blob("greeting").await.expect("delete");
    assert_eq!(storage.get_blob("greeting").await.expect("get"), None);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("orders.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn cart_round_trips_through_state_store_contract() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let lines = vec![line("momo", 500, 2), line("chiya", 300, 1)];

    storage.save_cart(&lines).await.expect("save");
    assert_eq!(storage.load_cart().await.expect("load"), lines);

    storage.clear_cart().await.expect("clear");
    assert!(storage.load_cart().await.expect("load").is_empty());
    assert_eq!(storage.get_blob(CART_KEY).await.expect("get"), None);
}

#[tokio::test]
async fn malformed_cart_blob_loads_as_empty() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .put_blob(CART_KEY, "{not valid json")
        .await
        .expect("put");
    assert!(storage.load_cart().await.expect("load").is_empty());
}

#[tokio::test]
async fn receipt_round_trips_and_clears_both_keys() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .save_receipt(OrderReceipt { amount: 1300 })
        .await
        .expect("save");

    assert_eq!(
        storage.get_blob(ORDER_COMPLETE_KEY).await.expect("get").as_deref(),
        Some("true")
    );
    assert_eq!(
        storage.get_blob(PAID_AMOUNT_KEY).await.expect("get").as_deref(),
        Some("1300")
    );
    assert_eq!(
        storage.load_receipt().await.expect("load"),
        Some(OrderReceipt { amount: 1300 })
    );

    storage.clear_receipt().await.expect("clear");
    assert_eq!(storage.load_receipt().await.expect("load"), None);
    assert_eq!(storage.get_blob(ORDER_COMPLETE_KEY).await.expect("get"), None);
    assert_eq!(storage.get_blob(PAID_AMOUNT_KEY).await.expect("get"), None);
}

#[tokio::test]
async fn receipt_requires_flag_and_parsable_amount() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    // Amount without the completion flag.
    storage.put_blob(PAID_AMOUNT_KEY, "900").await.expect("put");
    assert_eq!(storage.load_receipt().await.expect("load"), None);

    // Flag with a garbage amount.
    storage
        .put_blob(ORDER_COMPLETE_KEY, "true")
        .await
        .expect("put");
    storage
        .put_blob(PAID_AMOUNT_KEY, "not-a-number")
        .await
        .expect("put");
    assert_eq!(storage.load_receipt().await.expect("load"), None);
}
