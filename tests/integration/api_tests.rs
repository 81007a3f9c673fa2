//! API integration tests
//!
//! Run against a live server and database with: cargo test -- --ignored

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api";
const SERVER_URL: &str = "http://localhost:8080";

/// Unique marker so tests can share a live database without colliding
fn marker() -> String {
    Uuid::new_v4().simple().to_string()
}

async fn create_author(client: &Client, first_name: &str, last_name: &str) -> i64 {
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({
            "first_name": first_name,
            "last_name": last_name
        }))
        .send()
        .await
        .expect("Failed to send create author request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"]["id"].as_i64().expect("No author ID")
}

fn book_form(title: &str, author_ids: &[i64]) -> Form {
    let mut form = Form::new().text("title", title.to_string());
    for id in author_ids {
        form = form.text("author_ids[]", id.to_string());
    }
    form
}

fn image_part(bytes: &[u8], filename: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(filename.to_string())
        .mime_str("image/png")
        .expect("Invalid mime type")
}

async fn create_book(client: &Client, form: Form) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send create book request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

fn author_ids_of(book: &Value) -> Vec<i64> {
    let mut ids: Vec<i64> = book["authors"]
        .as_array()
        .expect("No authors array")
        .iter()
        .map(|a| a["id"].as_i64().expect("No author id"))
        .collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_author_round_trip() {
    let client = Client::new();
    let last_name = format!("Lovelace{}", marker());

    let id = create_author(&client, "Ada", &last_name).await;

    let response = client
        .get(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["first_name"], "Ada");
    assert_eq!(body["data"]["last_name"], Value::String(last_name));
}

#[tokio::test]
#[ignore]
async fn test_author_validation() {
    let client = Client::new();

    // empty required field
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({"first_name": "Ada", "last_name": ""}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["last_name"].is_array());

    // unknown fields are rejected
    let response = client
        .post(format!("{}/authors", BASE_URL))
        .json(&json!({"first_name": "Ada", "last_name": "Lovelace", "bio": "nope"}))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_client_error());
}

#[tokio::test]
#[ignore]
async fn test_author_search_matches_either_name_ordered_by_last_name() {
    let client = Client::new();
    let m = marker();
    let other = marker();

    // marker in first_name only for one author, last_name only for the other
    create_author(&client, &format!("Zz{}", m), &format!("Aaa{}", other)).await;
    create_author(&client, "Plain", &format!("Bbb{}", m)).await;
    create_author(&client, "Unrelated", &format!("Ccc{}", marker())).await;

    let response = client
        .get(format!("{}/authors?search={}", BASE_URL, m))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let last_names: Vec<String> = body["data"]
        .as_array()
        .expect("No data array")
        .iter()
        .map(|a| a["last_name"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(
        last_names,
        vec![format!("Aaa{}", other), format!("Bbb{}", m)],
        "search must match either name and order by last_name"
    );
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["per_page"], 15);
}

#[tokio::test]
#[ignore]
async fn test_author_update_and_delete() {
    let client = Client::new();
    let id = create_author(&client, "Grace", &format!("Hopper{}", marker())).await;

    let response = client
        .put(format!("{}/authors/{}", BASE_URL, id))
        .json(&json!({"first_name": "Grace", "last_name": "Murray Hopper"}))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["last_name"], "Murray Hopper");

    let response = client
        .delete(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/authors/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_book_round_trip_with_authors() {
    let client = Client::new();
    let m = marker();

    let a = create_author(&client, "First", &format!("Author{}", m)).await;
    let b = create_author(&client, "Second", &format!("Author{}b", m)).await;

    let form = book_form(&format!("Round Trip {}", m), &[a, b])
        .text("description", "a test book")
        .text("publication_date", "1843-10-18");
    let created = create_book(&client, form).await;
    let book_id = created["id"].as_i64().expect("No book ID");

    assert_eq!(author_ids_of(&created), {
        let mut ids = vec![a, b];
        ids.sort_unstable();
        ids
    });

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["title"], format!("Round Trip {}", m));
    assert_eq!(body["data"]["description"], "a test book");
    assert_eq!(body["data"]["publication_date"], "1843-10-18");
    assert_eq!(author_ids_of(&body["data"]), {
        let mut ids = vec![a, b];
        ids.sort_unstable();
        ids
    });
}

#[tokio::test]
#[ignore]
async fn test_book_unknown_author_ids_rejected() {
    let client = Client::new();
    let title = format!("Ghost {}", marker());

    let response = client
        .post(format!("{}/books", BASE_URL))
        .multipart(book_form(&title, &[999_999_999]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["errors"]["author_ids"].is_array());

    // no book row was persisted
    let response = client
        .get(format!("{}/books?title={}", BASE_URL, title))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 0);
}

#[tokio::test]
#[ignore]
async fn test_book_empty_author_ids_rejected() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .multipart(book_form(&format!("Orphan {}", marker()), &[]))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
}

#[tokio::test]
#[ignore]
async fn test_book_filters_combine_with_and() {
    let client = Client::new();
    let m = marker();

    let austen = create_author(&client, "Jane", &format!("Austen{}", m)).await;
    let bronte = create_author(&client, "Emily", &format!("Bronte{}", m)).await;

    create_book(&client, book_form(&format!("Emma {}", m), &[austen])).await;
    create_book(&client, book_form(&format!("Heights {}", m), &[bronte])).await;

    // author filter alone
    let response = client
        .get(format!("{}/books?author=Austen{}", BASE_URL, m))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], format!("Emma {}", m));

    // title AND author: both must hold
    let response = client
        .get(format!(
            "{}/books?title=Heights&author=Austen{}",
            BASE_URL, m
        ))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 0);

    // search matches title or author name
    let response = client
        .get(format!("{}/books?search=Emma {}", BASE_URL, m))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 1);

    let response = client
        .get(format!("{}/books?search=Bronte{}", BASE_URL, m))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], format!("Heights {}", m));
}

#[tokio::test]
#[ignore]
async fn test_association_sync_is_idempotent() {
    let client = Client::new();
    let m = marker();

    let a = create_author(&client, "One", &format!("Sync{}", m)).await;
    let b = create_author(&client, "Two", &format!("Sync{}b", m)).await;

    let created = create_book(&client, book_form(&format!("Synced {}", m), &[a])).await;
    let book_id = created["id"].as_i64().expect("No book ID");

    // apply the same set twice
    for _ in 0..2 {
        let response = client
            .put(format!("{}/books/{}", BASE_URL, book_id))
            .multipart(book_form(&format!("Synced {}", m), &[a, b]))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");

    assert_eq!(author_ids_of(&body["data"]), {
        let mut ids = vec![a, b];
        ids.sort_unstable();
        ids
    });
}

#[tokio::test]
#[ignore]
async fn test_image_lifecycle() {
    let client = Client::new();
    let m = marker();
    let author = create_author(&client, "Cover", &format!("Artist{}", m)).await;

    // create with an image
    let form = book_form(&format!("Covered {}", m), &[author])
        .part("image", image_part(b"first image bytes", "cover.png"));
    let created = create_book(&client, form).await;
    let book_id = created["id"].as_i64().expect("No book ID");

    let first_image = created["image"].as_str().expect("No image path").to_string();
    assert!(first_image.starts_with("/storage/books/"));
    assert!(first_image.ends_with(".png"));

    let response = client
        .get(format!("{}{}", SERVER_URL, first_image))
        .send()
        .await
        .expect("Failed to fetch image");
    assert!(response.status().is_success());

    // replace the image
    let form = book_form(&format!("Covered {}", m), &[author])
        .part("image", image_part(b"second image bytes", "cover2.png"));
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let second_image = body["data"]["image"].as_str().expect("No image path").to_string();
    assert_ne!(first_image, second_image);

    let response = client
        .get(format!("{}{}", SERVER_URL, first_image))
        .send()
        .await
        .expect("Failed to fetch old image");
    assert_eq!(response.status(), 404, "old image must be gone");

    let response = client
        .get(format!("{}{}", SERVER_URL, second_image))
        .send()
        .await
        .expect("Failed to fetch new image");
    assert!(response.status().is_success());

    // update without an image leaves it unchanged
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .multipart(book_form(&format!("Covered {}", m), &[author]))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["image"], Value::String(second_image.clone()));

    // delete removes the stored file
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}{}", SERVER_URL, second_image))
        .send()
        .await
        .expect("Failed to fetch deleted image");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_list_books_by_author_name() {
    let client = Client::new();
    let m = marker();

    let ada = create_author(&client, "Ada", &format!("Lovelace{}", m)).await;
    create_book(&client, book_form(&format!("Notes {}", m), &[ada])).await;

    let response = client
        .get(format!("{}/books?author=Lovelace{}", BASE_URL, m))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], format!("Notes {}", m));
    assert_eq!(author_ids_of(&body["data"][0]), vec![ada]);
}

#[tokio::test]
#[ignore]
async fn test_book_not_found() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books/0", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Book 0 not found");
}
