#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use common::{bearer, create_project, create_task, register_user, send, test_state};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

#[actix_rt::test]
async fn test_project_crud() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;

    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(bearer(&alice.token))
        .set_json(json!({ "name": "  Website  ", "description": "Relaunch", "color": "#3B82F6" }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let project = &body["data"]["project"];
    assert_eq!(project["name"], "Website");
    assert_eq!(project["userId"], alice.id.as_str());
    assert_eq!(project["taskCount"], 0);
    let project_id = project["id"].as_str().unwrap().to_string();

    create_task(&app, &alice, json!({ "title": "Draft copy", "projectId": project_id })).await;

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let projects = body["data"]["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["taskCount"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["project"]["tasks"][0]["title"], "Draft copy");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&alice.token))
        .set_json(json!({ "name": "Website v2", "description": null }))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["project"]["name"], "Website v2");
    assert_eq!(body["data"]["project"]["description"], serde_json::Value::Null);
    assert_eq!(body["data"]["project"]["color"], "#3B82F6");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Project deleted successfully");

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_foreign_project_is_forbidden() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;
    let bob = register_user(&app, "bob@example.com", "Bob").await;
    let project_id = create_project(&app, &alice, "Private").await;

    let uri = format!("/api/projects/{}", project_id);
    let requests = vec![
        test::TestRequest::get().uri(&uri),
        test::TestRequest::patch().uri(&uri).set_json(json!({ "name": "Mine now" })),
        test::TestRequest::delete().uri(&uri),
        test::TestRequest::get().uri(&format!("{}/stats", uri)),
    ];
    for req in requests {
        let (status, body) = send(&app, req.insert_header(bearer(&bob.token)).to_request()).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
        assert_eq!(body["message"], "Access denied to this project");
    }

    let req = test::TestRequest::get()
        .uri("/api/projects")
        .insert_header(bearer(&bob.token))
        .to_request();
    let (_, body) = send(&app, req).await;
    assert_eq!(body["data"]["projects"], json!([]));

    // Still intact for the owner.
    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["project"]["name"], "Private");
}

#[actix_rt::test]
async fn test_missing_and_malformed_project_ids() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}", Uuid::new_v4()))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");

    let req = test::TestRequest::get()
        .uri("/api/projects/not-a-uuid")
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[actix_rt::test]
async fn test_invalid_project_input() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;

    let cases = vec![
        json!({ "name": "" }),
        json!({ "name": "x".repeat(101) }),
        json!({ "name": "Ok", "color": "red" }),
        json!({ "name": "Ok", "description": "d".repeat(501) }),
    ];
    for payload in cases {
        let req = test::TestRequest::post()
            .uri("/api/projects")
            .insert_header(bearer(&alice.token))
            .set_json(&payload)
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
    }
}

#[actix_rt::test]
async fn test_project_stats() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;
    let project_id = create_project(&app, &alice, "Launch").await;

    for status in ["COMPLETED", "COMPLETED", "IN_PROGRESS"] {
        create_task(
            &app,
            &alice,
            json!({ "title": "Step", "status": status, "projectId": project_id }),
        )
        .await;
    }
    create_task(
        &app,
        &alice,
        json!({
            "title": "Late",
            "projectId": project_id,
            "dueDate": "2020-01-01T00:00:00Z"
        }),
    )
    .await;
    // Outside the project; must not be counted.
    create_task(&app, &alice, json!({ "title": "Loose", "status": "COMPLETED" })).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/stats", project_id))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["data"],
        json!({
            "totalTasks": 4,
            "completedTasks": 2,
            "completionRate": 50,
            "overdueTasks": 1,
            "tasksByStatus": [
                { "status": "TODO", "count": 1 },
                { "status": "IN_PROGRESS", "count": 1 },
                { "status": "COMPLETED", "count": 2 }
            ]
        })
    );
}

#[actix_rt::test]
async fn test_deleting_project_detaches_its_tasks() {
    let app = test_app!(test_state());
    let alice = register_user(&app, "alice@example.com", "Alice").await;
    let project_id = create_project(&app, &alice, "Doomed").await;
    let task = create_task(&app, &alice, json!({ "title": "Survivor", "projectId": project_id })).await;
    assert_eq!(task["project"]["name"], "Doomed");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/projects/{}", project_id))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task["id"].as_str().unwrap()))
        .insert_header(bearer(&alice.token))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["task"]["title"], "Survivor");
    assert_eq!(body["data"]["task"]["projectId"], serde_json::Value::Null);
    assert_eq!(body["data"]["task"]["project"], serde_json::Value::Null);
}
