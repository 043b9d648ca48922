//! HTTP tests for the Webside routes
//!
//! The router is driven in-process; every test starts from a fresh kernel session with
//! the sample objects pinned.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use webside_server::{kernel_inspector, router, AppState};

fn app() -> Router {
    let inspector = kernel_inspector(true).unwrap();
    router(AppState::new(inspector), true)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> Value {
    let (status, body) = send(app, "GET", uri, None).await;
    assert_eq!(status, StatusCode::OK, "GET {} answered {}", uri, body);
    serde_json::from_str(&body).unwrap()
}

mod code {
    use super::*;

    #[tokio::test]
    async fn test_dialect_is_plain_text() {
        let (status, body) = send(&app(), "GET", "/dialect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "WebsideKernel");
    }

    #[tokio::test]
    async fn test_class_definition() {
        let app = app();
        let point = get_json(&app, "/classes/Point").await;
        assert_eq!(point["name"], "Point");
        assert_eq!(point["superclass"], "Object");
        assert_eq!(point["instanceVariableNames"], json!(["x", "y"]));

        let meta = get_json(&app, "/classes/Point%20class").await;
        assert_eq!(meta["name"], "Point class");
    }

    #[tokio::test]
    async fn test_nonexistent_class_is_404() {
        let (status, _) = send(&app(), "GET", "/classes/Nonexistent", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app(), "GET", "/classes/Nonexistent/methods", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_class_listing_and_tree() {
        let app = app();
        let names = get_json(&app, "/classes?names=true").await;
        assert_eq!(names[0], "Object");
        assert!(names.as_array().unwrap().contains(&json!("SmallInteger")));

        let tree = get_json(&app, "/classes?root=Boolean&tree=true&depth=0&names=true").await;
        assert_eq!(tree, json!([{"name": "Boolean", "superclass": "Object"}]));

        let tree = get_json(&app, "/classes?root=Boolean&tree=true&depth=1").await;
        assert_eq!(tree[0]["subclasses"].as_array().unwrap().len(), 2);
        assert_eq!(tree[0]["subclasses"][0]["name"], "True");
    }

    #[tokio::test]
    async fn test_malformed_query_is_400() {
        let (status, _) = send(&app(), "GET", "/classes?tree=true&depth=deep", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_class_sub_routes() {
        let app = app();
        let subclasses = get_json(&app, "/classes/Boolean/subclasses").await;
        assert_eq!(subclasses.as_array().unwrap().len(), 2);

        let categories = get_json(&app, "/classes/Point/categories").await;
        assert!(categories.as_array().unwrap().contains(&json!("accessing")));

        let used = get_json(&app, "/classes/Point%20class/used-categories").await;
        assert_eq!(used, json!(["instance creation"]));

        let variables = get_json(&app, "/classes/Point/variables").await;
        assert_eq!(variables[0]["type"], "class");
        assert_eq!(variables[1], json!({"name": "x", "class": "Point", "type": "instance"}));

        let instance = get_json(&app, "/classes/Point/instance-variables").await;
        assert_eq!(instance.as_array().unwrap().len(), 2);
        let shared = get_json(&app, "/classes/Point/class-variables").await;
        assert_eq!(shared[0]["name"], "DependentsFields");
    }

    #[tokio::test]
    async fn test_method_queries() {
        let app = app();
        let empty = get_json(&app, "/methods?selector=foo&class=Point").await;
        assert_eq!(empty, json!([]));

        let accessors = get_json(&app, "/classes/Point/methods?category=accessing").await;
        let selectors: Vec<&str> = accessors
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["selector"].as_str().unwrap())
            .collect();
        assert_eq!(selectors, vec!["x", "y"]);

        let both = get_json(&app, "/methods?sending=x&referencingClass=Point").await;
        assert_eq!(both.as_array().unwrap().len(), 1);
        assert_eq!(both[0]["methodClass"], "Point");
        assert_eq!(both[0]["selector"], "=");
        assert_eq!(both[0]["overriding"], false);

        let primitive = get_json(&app, "/methods?selector=%2A").await;
        assert_eq!(primitive[0]["source"], "no source");
    }

    #[tokio::test]
    async fn test_unknown_class_parameter_is_empty() {
        let app = app();
        let found = get_json(&app, "/methods?selector=foo&class=Bar").await;
        assert_eq!(found, json!([]));
        let found = get_json(&app, "/methods?class=Bar").await;
        assert_eq!(found, json!([]));
    }

    #[tokio::test]
    async fn test_unknown_scope_is_ignored() {
        let app = app();
        let scoped = get_json(&app, "/methods?selector=printOn%3A&scope=Nowhere").await;
        let unscoped = get_json(&app, "/methods?selector=printOn%3A").await;
        assert_eq!(scoped, unscoped);
        assert!(!scoped.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_usual_categories() {
        let categories = get_json(&app(), "/usual-categories").await;
        assert!(categories.as_array().unwrap().contains(&json!("printing")));
    }
}

mod objects {
    use super::*;

    #[tokio::test]
    async fn test_pinned_samples() {
        let app = app();
        let objects = get_json(&app, "/objects").await;
        assert_eq!(objects.as_array().unwrap().len(), 6);
        assert_eq!(objects[3]["id"], "3");
        assert_eq!(objects[3]["printString"], "#(1 2 3)");

        let point = get_json(&app, "/objects/4").await;
        assert_eq!(point["id"], "4");
        assert_eq!(point["objectClass"], "Point");
    }

    #[tokio::test]
    async fn test_slot_paths() {
        let app = app();
        let x = get_json(&app, "/objects/4/x").await;
        assert_eq!(x["printString"], "1");

        let named = get_json(&app, "/objects/4/named-slots").await;
        assert_eq!(named[0]["slot"], "x");
        assert_eq!(named[1]["slot"], "y");

        let names = get_json(&app, "/objects/4/instance-variables").await;
        assert_eq!(names, json!([{"name": "x"}, {"name": "y"}]));

        let indexed = get_json(&app, "/objects/3/indexed-slots?from=2&to=3").await;
        let slots: Vec<i64> = indexed
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["slot"].as_i64().unwrap())
            .collect();
        assert_eq!(slots, vec![2, 3]);

        let presentations = get_json(&app, "/objects/4/custom-presentations").await;
        assert_eq!(presentations, json!([]));
    }

    #[tokio::test]
    async fn test_missing_slots_are_404() {
        let app = app();
        for uri in [
            "/objects/4/z",
            "/objects/3/4",
            "/objects/3/0",
            "/objects/99",
            "/objects/99/x",
            "/objects/4/indexed-slots",
        ] {
            let (status, _) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_pin_by_uri() {
        let app = app();
        let body = r#"{"uri": "http://localhost:9001/objects/4/y"}"#;
        let (status, response) = send(&app, "POST", "/objects", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        let pinned: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(pinned["id"], "7");
        assert_eq!(pinned["printString"], "2");

        let again = get_json(&app, "/objects/7").await;
        assert_eq!(again["printString"], "2");
    }

    #[tokio::test]
    async fn test_bad_pin_requests_are_400() {
        let app = app();
        for body in [
            None,
            Some("{}"),
            Some("not json"),
            Some(r#"{"uri": "/elsewhere/4"}"#),
            Some(r#"{"uri": "/objects/4/z"}"#),
        ] {
            let (status, text) = send(&app, "POST", "/objects", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(text, "Bad object slot URI");
        }
    }

    #[tokio::test]
    async fn test_unpin() {
        let app = app();
        let (status, body) = send(&app, "DELETE", "/objects/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "2");

        let (status, _) = send(&app, "GET", "/objects/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/objects/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod cors {
    use super::*;

    #[tokio::test]
    async fn test_cross_origin_requests_allowed() {
        let request = Request::builder()
            .uri("/dialect")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_can_be_disabled() {
        let app = router(AppState::new(kernel_inspector(false).unwrap()), false);
        let request = Request::builder()
            .uri("/objects")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.as_ref(), b"[]");
    }
}
