//! Worker catalog tests: listing, filtering, search, and lookup.

mod common;

use axum::http::StatusCode;
use common::app;

#[tokio::test]
async fn workers_are_listed_by_rating_descending() {
    let app = app().await;
    app.create_worker("Rank Low", "RankCat", "low rated", 1000, 3.1)
        .await;
    app.create_worker("Rank High", "RankCat", "high rated", 1000, 4.9)
        .await;
    app.create_worker("Rank Mid", "RankCat", "mid rated", 1000, 4.0)
        .await;

    let resp = app.get("/workers?category=RankCat", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Rank High", "Rank Mid", "Rank Low"]);
}

#[tokio::test]
async fn category_filter_is_exact() {
    let app = app().await;
    app.create_worker("Exact Member", "ExactCat", "in the category", 1000, 4.0)
        .await;
    app.create_worker("Exact Outsider", "ExactCatPlus", "another category", 1000, 4.0)
        .await;

    let resp = app.get("/workers?category=ExactCat", None).await;

    let body = resp.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Exact Member");
}

#[tokio::test]
async fn search_matches_name_description_and_category_case_insensitively() {
    let app = app().await;
    app.create_worker("Xylo Plumber", "SearchCatA", "fixes things", 1000, 4.0)
        .await;
    app.create_worker("Search Desc", "SearchCatA", "expert XYLOPHONE repair", 1000, 4.0)
        .await;
    app.create_worker("Search Cat", "XyloServices", "general help", 1000, 4.0)
        .await;
    app.create_worker("Search Miss", "SearchCatA", "unrelated", 1000, 4.0)
        .await;

    let resp = app.get("/workers?search=xylo", None).await;

    let body = resp.json();
    let mut names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Search Cat", "Search Desc", "Xylo Plumber"]);
}

#[tokio::test]
async fn category_and_search_filters_combine() {
    let app = app().await;
    app.create_worker("Combo Hit", "ComboCat", "quartz polishing", 1000, 4.0)
        .await;
    app.create_worker("Combo Wrong Cat", "ComboOther", "quartz polishing", 1000, 4.0)
        .await;
    app.create_worker("Combo Wrong Text", "ComboCat", "granite polishing", 1000, 4.0)
        .await;

    let resp = app
        .get("/workers?category=ComboCat&search=quartz", None)
        .await;

    let body = resp.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Combo Hit");
}

#[tokio::test]
async fn all_category_and_blank_filters_are_ignored() {
    let app = app().await;
    app.create_worker("Unfiltered One", "UnfilteredCat", "visible", 1000, 4.0)
        .await;

    let all = app.get("/workers?category=All&search=", None).await;
    assert_eq!(all.status, StatusCode::OK);
    let body = all.json();
    let found = body
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w["name"] == "Unfiltered One");
    assert!(found);
}

#[tokio::test]
async fn like_wildcards_in_search_are_literal() {
    let app = app().await;
    app.create_worker("Wild Literal", "WildCat", "100% satisfaction", 1000, 4.0)
        .await;
    app.create_worker("Wild Other", "WildCat", "100 percent", 1000, 4.0)
        .await;

    let resp = app.get("/workers?search=100%25", None).await;

    let body = resp.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Wild Literal");
}

#[tokio::test]
async fn categories_are_distinct_and_sorted() {
    let app = app().await;
    app.create_worker("Cat Seed A", "ZCatSort", "desc", 1000, 4.0)
        .await;
    app.create_worker("Cat Seed B", "ACatSort", "desc", 1000, 4.0)
        .await;
    app.create_worker("Cat Seed C", "ZCatSort", "desc", 1000, 4.0)
        .await;

    let resp = app.get("/workers/categories", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let categories: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();

    // No duplicates anywhere in the list.
    let mut deduped = categories.clone();
    deduped.dedup();
    assert_eq!(categories, deduped);

    // Alphabetical order.
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);

    let a = categories.iter().position(|c| *c == "ACatSort").unwrap();
    let z = categories.iter().position(|c| *c == "ZCatSort").unwrap();
    assert!(a < z);
}

#[tokio::test]
async fn get_worker_returns_rates_in_dollars() {
    let app = app().await;
    let worker_id = app
        .create_worker("Dollar Worker", "DollarCat", "hourly work", 6500, 4.9)
        .await;

    let resp = app.get(&format!("/workers/{}", worker_id), None).await;

    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["name"], "Dollar Worker");
    assert_eq!(body["hourly_rate"], 65.0);
    assert!(body.get("hourly_rate_cents").is_none());
}

#[tokio::test]
async fn get_unknown_worker_is_not_found() {
    let app = app().await;

    let resp = app.get("/workers/999999", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "Worker not found.");
}
