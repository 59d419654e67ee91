mod common;

use axum::http::StatusCode;
use common::{spawn_app, spawn_app_with};
use flock_domain::config::ApiConfig;
use flock_domain::events::{CommentAdded, CommentRemoved, PostLiked, PostPublished, PostRemoved};
use flock_event_bus::EventReceiverExt;
use serde_json::json;

#[tokio::test]
async fn create_post_announces_mentions() {
    let app = spawn_app().await;
    let (ada, token) = app.register("ada").await;
    let mut published = app.events.subscribe::<PostPublished>().unwrap();

    let (status, body) = app
        .call(
            "POST",
            "/api/posts",
            Some(&token),
            Some(json!({ "title": "Engines", "content": "Thanks @grace and @grace, cc @bob" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "ada");
    assert_eq!(body["author_id"], ada.as_str());
    assert_eq!(body["title"], "Engines");
    assert_eq!(body["likes_count"], 0);
    assert_eq!(body["is_liked"], false);

    let event = published.recv_event().await.unwrap();
    assert_eq!(event.post, body["id"].as_str().unwrap());
    assert_eq!(event.author, ada);
    assert_eq!(event.mentions, vec!["grace".to_owned(), "bob".to_owned()]);
}

#[tokio::test]
async fn create_post_validates_content() {
    let app = spawn_app().await;
    let (_, token) = app.register("ada").await;

    let (status, body) =
        app.call("POST", "/api/posts", Some(&token), Some(json!({ "content": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Post content is required.");

    let (status, _) = app
        .call("POST", "/api/posts", Some(&token), Some(json!({ "content": "x".repeat(5001) })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", "/api/posts", Some(&token), Some(json!({ "nope": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("POST", "/api/posts", None, Some(json!({ "content": "hi" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_author_mutates_a_post() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let post = app.post(&ada, "first draft").await;
    let uri = format!("/api/posts/{post}");

    let (status, body) =
        app.call("PATCH", &uri, Some(&grace), Some(json!({ "content": "mine now" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only update your own posts.");

    let (status, body) = app.call("DELETE", &uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only delete your own posts.");

    let (status, body) =
        app.call("PUT", &uri, Some(&ada), Some(json!({ "content": "final", "title": "T" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "final");
    assert_eq!(body["title"], "T");

    let (status, body) = app.call("GET", &uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "final");
}

#[tokio::test]
async fn likes_are_unique_per_account() {
    let app = spawn_app().await;
    let (ada, ada_token) = app.register("ada").await;
    let (grace, token) = app.register("grace").await;
    let post = app.post(&ada_token, "like me").await;
    let mut liked = app.events.subscribe::<PostLiked>().unwrap();

    let like = format!("/api/posts/{post}/like");
    let (status, body) = app.call("POST", &like, Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Post liked successfully");
    assert_eq!(body["likes_count"], 1);

    let event = liked.recv_event().await.unwrap();
    assert_eq!(event.post_author, ada);
    assert_eq!(event.actor, grace);

    let (status, body) = app.call("POST", &like, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have already liked this post.");

    let (_, body) = app.call("GET", &format!("/api/posts/{post}"), Some(&token), None).await;
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["is_liked"], true);

    let unlike = format!("/api/posts/{post}/unlike");
    let (status, body) = app.call("POST", &unlike, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post unliked successfully");
    assert_eq!(body["likes_count"], 0);

    let (status, body) = app.call("POST", &unlike, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You have not liked this post.");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_count_once() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let post = app.post(&ada, "race me").await;

    let like = format!("/api/posts/{post}/like");
    let (first, second) = tokio::join!(
        app.call("POST", &like, Some(&grace), None),
        app.call("POST", &like, Some(&grace), None),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    let rejected = if first.0 == StatusCode::BAD_REQUEST { first.1 } else { second.1 };
    assert_eq!(rejected["error"], "You have already liked this post.");

    let (_, body) = app.call("GET", &format!("/api/posts/{post}"), Some(&grace), None).await;
    assert_eq!(body["likes_count"], 1);
}

#[tokio::test]
async fn comments_form_two_level_threads() {
    let app = spawn_app().await;
    let (ada, ada_token) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let post = app.post(&ada_token, "discuss").await;
    let mut added = app.events.subscribe::<CommentAdded>().unwrap();

    let first = app.comment(&grace, &post, "first", None).await;
    let event = added.recv_event().await.unwrap();
    assert_eq!(event.post_author, ada);
    assert_eq!(event.parent_author, None);

    let reply = app.comment(&ada_token, &post, "reply", Some(&first)).await;
    let nested = app.comment(&grace, &post, "reply to reply @ada", Some(&reply)).await;
    let second = app.comment(&grace, &post, "second", None).await;

    added.recv_event().await.unwrap();
    let event = added.recv_event().await.unwrap();
    assert_eq!(event.comment, nested);
    assert_eq!(event.parent_author.as_deref(), Some(ada.as_str()));
    assert_eq!(event.mentions, vec!["ada".to_owned()]);

    let (status, body) = app.call("GET", &format!("/api/posts/{post}"), Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comments_count"], 4);

    let threads = body["comments"].as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["id"], second.as_str());
    assert_eq!(threads[1]["id"], first.as_str());
    let replies: Vec<_> = threads[1]["replies"].as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(replies, vec![json!(reply), json!(nested)]);
    assert_eq!(threads[1]["replies"][1]["parent"], first.as_str());

    let (status, body) =
        app.call("GET", &format!("/api/posts/{post}/comments"), Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    assert_eq!(body["comments"][0]["id"], second.as_str());
}

#[tokio::test]
async fn replies_accept_table_qualified_parent_ids() {
    let app = spawn_app().await;
    let (_, token) = app.register("ada").await;
    let post = app.post(&token, "thread").await;
    let first = app.comment(&token, &post, "first", None).await;

    let uri = format!("/api/posts/post:{post}/comment");
    let (status, body) = app
        .call("POST", &uri, Some(&token), Some(json!({ "content": "hi", "parent": format!("comment:{first}") })))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["parent"], first.as_str());

    let (status, body) = app
        .call(
            "POST",
            "/api/comments",
            Some(&token),
            Some(json!({ "post": format!("post:{post}"), "content": "hi", "parent": format!("comment:{first}") })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["parent"], first.as_str());

    let (status, body) = app
        .call("POST", &uri, Some(&token), Some(json!({ "content": "hi", "parent": format!("post:{first}") })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Parent comment not found.");
}

#[tokio::test]
async fn comment_validation() {
    let app = spawn_app().await;
    let (_, token) = app.register("ada").await;
    let post = app.post(&token, "one").await;
    let other = app.post(&token, "two").await;
    let foreign = app.comment(&token, &other, "elsewhere", None).await;

    let uri = format!("/api/posts/{post}/comment");
    let (status, body) = app.call("POST", &uri, Some(&token), Some(json!({ "content": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Comment content is required.");

    let (status, _) = app
        .call("POST", &uri, Some(&token), Some(json!({ "content": "hi", "parent": foreign })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("POST", &uri, Some(&token), Some(json!({ "content": "hi", "parent": "NoSuchComment" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("POST", "/api/posts/NoSuchPost/comment", Some(&token), Some(json!({ "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call("POST", "/api/comments", Some(&token), Some(json!({ "post": "NoSuchPost", "content": "hi" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comment_endpoints() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let post = app.post(&ada, "post").await;
    let mut removed = app.events.subscribe::<CommentRemoved>().unwrap();

    let (status, body) = app
        .call("POST", "/api/comments", Some(&grace), Some(json!({ "post": post, "content": "Nice" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment = body["id"].as_str().unwrap().to_owned();
    let reply = app.comment(&ada, &post, "Thanks", Some(&comment)).await;

    let (_, body) = app.call("GET", "/api/comments?author=grace", Some(&ada), None).await;
    assert_eq!(body["count"], 1);
    let (_, body) = app.call("GET", "/api/comments?search=THANK", Some(&ada), None).await;
    assert_eq!(body["results"][0]["id"], reply.as_str());
    let (_, body) = app.call("GET", &format!("/api/comments?post={post}"), Some(&ada), None).await;
    assert_eq!(body["count"], 2);
    let (_, body) = app.call("GET", "/api/comments?author=nobody", Some(&ada), None).await;
    assert_eq!(body["count"], 0);

    let uri = format!("/api/comments/{comment}");
    let (status, body) =
        app.call("PATCH", &uri, Some(&ada), Some(json!({ "content": "hijack" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only update your own comments.");

    let (status, body) =
        app.call("PUT", &uri, Some(&grace), Some(json!({ "content": "Very nice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Very nice");

    let (status, body) = app.call("DELETE", &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You can only delete your own comments.");

    let (status, _) = app.call("DELETE", &uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let mut gone = removed.recv_event().await.unwrap().comments.clone();
    gone.sort();
    let mut expected = vec![comment.clone(), reply.clone()];
    expected.sort();
    assert_eq!(gone, expected);

    let (status, _) = app.call("GET", &uri, Some(&grace), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("GET", &format!("/api/comments/{reply}"), Some(&grace), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_post_cascades() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let post = app.post(&ada, "short lived").await;
    let comment = app.comment(&grace, &post, "hi", None).await;
    app.call("POST", &format!("/api/posts/{post}/like"), Some(&grace), None).await;
    let mut removed = app.events.subscribe::<PostRemoved>().unwrap();

    let (status, _) = app.call("DELETE", &format!("/api/posts/{post}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let event = removed.recv_event().await.unwrap();
    assert_eq!(event.post, post);
    assert_eq!(event.comments, vec![comment.clone()]);

    let (status, _) = app.call("GET", &format!("/api/posts/{post}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("GET", &format!("/api/comments/{comment}"), Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_filters_orders_and_paginates() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (_, grace) = app.register("grace").await;
    let first = app.post(&ada, "Rust is fun").await;
    app.post(&grace, "Compilers").await;
    let last = app.post(&ada, "More rust").await;

    let (status, body) = app.call("GET", "/api/posts?page_size=2", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][0]["id"], last.as_str());

    let (_, body) = app.call("GET", "/api/posts?page=3&page_size=2", Some(&ada), None).await;
    assert!(body["results"].as_array().unwrap().is_empty());

    let (_, body) = app.call("GET", "/api/posts?ordering=created_at", Some(&ada), None).await;
    assert_eq!(body["results"][0]["id"], first.as_str());

    let (_, body) = app.call("GET", "/api/posts?author=grace", Some(&ada), None).await;
    assert_eq!(body["count"], 1);

    let (_, body) = app.call("GET", "/api/posts?search=RUST", Some(&ada), None).await;
    assert_eq!(body["count"], 2);

    let (_, body) = app.call("GET", "/api/posts?author=nobody", Some(&ada), None).await;
    assert_eq!(body["count"], 0);

    let (status, body) = app.call("GET", "/api/posts/user_posts?username=ada", Some(&grace), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["username"], "ada");

    let (status, body) = app.call("GET", "/api/posts/user_posts", Some(&grace), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "username query parameter is required.");
}

#[tokio::test]
async fn feed_shows_followed_authors_only() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    let (grace_id, grace) = app.register("grace").await;
    let (_, bob) = app.register("bob").await;

    let (status, body) = app.call("GET", "/api/feed", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["following_count"], 0);
    assert!(body["posts"].as_array().unwrap().is_empty());

    let from_grace = app.post(&grace, "grace post").await;
    app.post(&bob, "bob post").await;
    app.call("POST", &format!("/api/auth/follow/{grace_id}"), Some(&ada), None).await;

    let (_, body) = app.call("GET", "/api/feed?page_size=5", Some(&ada), None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["following_count"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 5);
    assert_eq!(body["posts"][0]["id"], from_grace.as_str());

    let (status, _) = app.call("GET", "/api/feed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_feeds_need_no_token() {
    let app = spawn_app().await;
    let (_, ada) = app.register("ada").await;
    app.register("grace").await;
    let post = app.post(&ada, "hello world").await;
    app.call("POST", &format!("/api/posts/{post}/like"), Some(&ada), None).await;

    let (status, body) = app.call("GET", "/api/feed/ada", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["posts"][0]["is_liked"], false);

    let (_, body) = app.call("GET", "/api/feed/ada", Some(&ada), None).await;
    assert_eq!(body["posts"][0]["is_liked"], true);

    let (status, body) = app.call("GET", "/api/feed/grace", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User grace not found or has no posts.");

    let (status, _) = app.call("GET", "/api/feed/nobody", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.call("GET", "/api/explore", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["posts"][0]["id"], post.as_str());
}

#[tokio::test]
async fn explore_is_capped_at_the_configured_limit() {
    let mut config = ApiConfig::default();
    config.feed.explore_limit = 3;
    let app = spawn_app_with(config).await;
    let (_, ada) = app.register("ada").await;

    let mut published = Vec::new();
    for n in 0..5 {
        published.push(app.post(&ada, &format!("post {n}")).await);
    }

    let (status, body) = app.call("GET", "/api/explore", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let ids: Vec<&str> = body["posts"].as_array().unwrap().iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, [published[4].as_str(), published[3].as_str(), published[2].as_str()]);
}
