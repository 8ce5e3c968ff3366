/// Integration tests for the Taskboard API
///
/// These tests exercise the full HTTP surface against a real database:
/// - Registration with single-use license keys
/// - Login and bearer-token authentication
/// - Project membership gating
/// - Member and assignee rules
/// - Task state updates and filters
///
/// They skip silently when DATABASE_URL is not set.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;
use taskboard_shared::license::is_valid_key_format;

/// A license key registers exactly one user
#[tokio::test]
async fn test_license_key_is_single_use() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let key = ctx.seed_license_key().await;

    let (status, _) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": format!("first-{}", uuid::Uuid::new_v4().simple()),
                "email": format!("first-{}@example.com", uuid::Uuid::new_v4().simple()),
                "password": "password1",
                "license_key": key,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same key again must be rejected
    let (status, body) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": format!("second-{}", uuid::Uuid::new_v4().simple()),
                "email": format!("second-{}@example.com", uuid::Uuid::new_v4().simple()),
                "password": "password2",
                "license_key": key,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid license key");
}

/// Registering with a taken username is rejected with 400
#[tokio::test]
async fn test_duplicate_username_rejected() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let (username, _) = ctx.register_user().await;
    let key = ctx.seed_license_key().await;

    let (status, body) = ctx
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "username": username,
                "email": format!("other-{}@example.com", uuid::Uuid::new_v4().simple()),
                "password": "password1",
                "license_key": key,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already registered");
}

/// Generated keys follow the AAAA-BBBB-CCCC-DDDD format
#[tokio::test]
async fn test_generated_key_format() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;

    let (status, body) = ctx
        .request("POST", "/license-keys/generate", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let key = body["key"].as_str().expect("response should carry a key");
    assert!(is_valid_key_format(key), "bad key format: {}", key);
    assert_eq!(body["is_active"], true);
}

/// Key validation works without authentication and rejects burned keys
#[tokio::test]
async fn test_validate_key_public() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let key = ctx.seed_license_key().await;

    let (status, body) = ctx
        .request(
            "POST",
            "/license-keys/validate",
            None,
            Some(json!({ "key": key })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, _) = ctx
        .request(
            "POST",
            "/license-keys/validate",
            None,
            Some(json!({ "key": "AAAA-AAAA-AAAA-AAAA" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// An empty validation payload is distinguished from an unknown key
#[tokio::test]
async fn test_validate_key_requires_a_key() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let (status, body) = ctx
        .request(
            "POST",
            "/license-keys/validate",
            None,
            Some(json!({ "key": "   " })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "License key is required");
}

/// Requests without a bearer token are rejected
#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let (status, _) = ctx.request("GET", "/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Non-members cannot read a project
#[tokio::test]
async fn test_non_member_is_forbidden() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let owner = ctx.authed_user().await;
    let outsider = ctx.authed_user().await;

    let project_id = ctx.create_project(&owner, "Members Only").await;

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/projects/{}", project_id),
            Some(&outsider),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not a member of this project");
}

/// The project creator is automatically its first member
#[tokio::test]
async fn test_creator_is_first_member() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Solo").await;

    let (status, body) = ctx
        .request("GET", &format!("/projects/{}", project_id), Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(|a| a.len()), Some(1));
}

/// The last member of a project cannot be removed
#[tokio::test]
async fn test_last_member_cannot_be_removed() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Last Stand").await;

    let (_, me) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    let my_id = me["id"].as_str().expect("me should have an id");

    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}/users/{}", project_id, my_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot remove the last user from a project. A project must have at least 1 user."
    );
}

/// A single-member project refuses removal even for made-up user ids
#[tokio::test]
async fn test_last_member_check_precedes_user_lookup() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Tiny").await;

    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}/users/{}", project_id, uuid::Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot remove the last user from a project. A project must have at least 1 user."
    );
}

/// Members can be added and then removed once another member exists
#[tokio::test]
async fn test_member_add_and_remove() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let owner = ctx.authed_user().await;
    let (other_name, other_pass) = ctx.register_user().await;
    let other_token = ctx.login(&other_name, &other_pass).await;

    let (_, other_me) = ctx.request("GET", "/auth/me", Some(&other_token), None).await;
    let other_id = other_me["id"].as_str().expect("id").to_string();

    let project_id = ctx.create_project(&owner, "Shared").await;

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/projects/{}/users/{}", project_id, other_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(|a| a.len()), Some(2));

    // Adding the same member twice is rejected
    let (status, body) = ctx
        .request(
            "POST",
            &format!("/projects/{}/users/{}", project_id, other_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User is already a member of this project");

    // Now removal works
    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/projects/{}/users/{}", project_id, other_id),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().map(|a| a.len()), Some(1));
}

/// Only project members can be assigned to a task
#[tokio::test]
async fn test_assignee_must_be_project_member() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let owner = ctx.authed_user().await;
    let outsider_token = ctx.authed_user().await;
    let (_, outsider_me) = ctx
        .request("GET", "/auth/me", Some(&outsider_token), None)
        .await;
    let outsider_id = outsider_me["id"].as_str().expect("id").to_string();

    let project_id = ctx.create_project(&owner, "Assignments").await;

    let (status, task) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&owner),
            Some(json!({
                "title": "Write the report",
                "project_id": project_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_str().expect("task id");

    let (status, body) = ctx
        .request(
            "POST",
            &format!("/tasks/{}/assign/{}", task_id, outsider_id),
            Some(&owner),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot assign a user who is not a member of the task's project"
    );
}

/// Unassigning an unknown user answers 404, not 400
#[tokio::test]
async fn test_unassign_unknown_user_is_not_found() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Ghost Hunt").await;

    let (status, task) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "title": "Haunted", "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let task_id = task["id"].as_str().expect("task id").to_string();

    let (status, body) = ctx
        .request(
            "DELETE",
            &format!("/tasks/{}/assign/{}", task_id, uuid::Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

/// A task may be created directly in a non-default state
#[tokio::test]
async fn test_task_creation_accepts_initial_state() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Running Start").await;

    let (status, task) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({
                "title": "Already underway",
                "state": "in_progress",
                "project_id": project_id,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["state"], "in_progress");
}

/// Task states can move freely in any direction
#[tokio::test]
async fn test_task_state_updates_are_unconstrained() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "States").await;

    let (status, task) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "title": "Flip-flop", "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["state"], "scheduled");
    let task_id = task["id"].as_str().expect("task id").to_string();

    // Straight to completed, then back again
    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "state": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "completed");

    let (status, body) = ctx
        .request(
            "PUT",
            &format!("/tasks/{}", task_id),
            Some(&token),
            Some(json!({ "state": "scheduled" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "scheduled");
}

/// Unknown state filters are rejected with 400
#[tokio::test]
async fn test_invalid_state_filter() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let project_id = ctx.create_project(&token, "Filters").await;

    let (status, body) = ctx
        .request(
            "GET",
            &format!("/tasks/project/{}?state=done", project_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid task state filter");
}

/// Assigned-task listing carries the owning project projection
#[tokio::test]
async fn test_assigned_to_me_listing() {
    let Some(mut ctx) = TestContext::new().await else {
        return;
    };

    let token = ctx.authed_user().await;
    let (_, me) = ctx.request("GET", "/auth/me", Some(&token), None).await;
    let my_id = me["id"].as_str().expect("id").to_string();

    let project_id = ctx.create_project(&token, "My Work").await;

    let (_, task) = ctx
        .request(
            "POST",
            "/tasks",
            Some(&token),
            Some(json!({ "title": "Assigned to me", "project_id": project_id })),
        )
        .await;
    let task_id = task["id"].as_str().expect("task id").to_string();

    let (status, _) = ctx
        .request(
            "POST",
            &format!("/tasks/{}/assign/{}", task_id, my_id),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .request("GET", "/tasks/assigned-to-me", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let listing = body.as_array().expect("listing should be an array");
    let entry = listing
        .iter()
        .find(|t| t["id"] == task_id.as_str())
        .expect("assigned task should be listed");
    assert_eq!(entry["project"]["title"], "My Work");
}
