#[cfg(test)]
mod tests {
    use runrun_tracker::api::{ApiError, Credentials, Runrun, RunrunConfig, TaskApi, TaskQuery};
    use runrun_tracker::libs::state::Id;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Runrun {
        let config = RunrunConfig { base_url: server.uri() };
        Runrun::new(&config, || Some(Credentials::new("the-key", "the-token"))).unwrap()
    }

    #[tokio::test]
    async fn test_current_user_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.0/users/me"))
            .and(header("app-key", "the-key"))
            .and(header("user-token", "the-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "jane", "name": "Jane", "position": "Dev" })))
            .expect(1)
            .mount(&server)
            .await;

        let user = client(&server).current_user().await.unwrap();

        assert_eq!(user.id, Id::from("jane"));
        assert_eq!(user.name.as_deref(), Some("Jane"));
        assert_eq!(user.extra["position"], json!("Dev"));
    }

    #[tokio::test]
    async fn test_open_tasks_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.0/tasks"))
            .and(query_param("sort", "priority"))
            .and(query_param("sort_dir", "asc"))
            .and(query_param("limit", "10"))
            .and(query_param("is_closed", "false"))
            .and(query_param("task_list_user_id", "jane"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 42, "title": "Write docs", "is_working_on": false, "unknown_field": 1 },
                { "id": 7, "title": "Fix login", "is_working_on": true, "time_worked": 3600 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = client(&server).tasks(&TaskQuery::open_for(&Id::from("jane"))).await.unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, Id::from(42));
        assert!(tasks[1].is_working_on);
        assert_eq!(tasks[1].time_worked, Some(3600));
    }

    #[tokio::test]
    async fn test_closed_tasks_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1.0/tasks"))
            .and(query_param("sort", "close_date"))
            .and(query_param("sort_dir", "desc"))
            .and(query_param("is_closed", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let tasks = client(&server).tasks(&TaskQuery::closed()).await.unwrap();

        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_task_actions_post() {
        let server = MockServer::start().await;
        for action in ["pause", "play", "reopen", "deliver"] {
            Mock::given(method("POST"))
                .and(path(format!("/api/v1.0/tasks/42/{}", action)))
                .and(header("app-key", "the-key"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let api = client(&server);
        let id = Id::from(42);
        api.pause(&id).await.unwrap();
        api.play(&id).await.unwrap();
        api.reopen(&id).await.unwrap();
        api.deliver(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1.0/tasks/1/pause"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let error = client(&server).pause(&Id::from(1)).await.unwrap_err();

        match error {
            ApiError::Status { url, status } => {
                assert_eq!(status, reqwest::StatusCode::FORBIDDEN);
                assert!(url.ends_with("/api/v1.0/tasks/1/pause"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let api = Runrun::new(&RunrunConfig { base_url: server.uri() }, || None).unwrap();

        assert!(matches!(api.current_user().await, Err(ApiError::MissingCredentials)));
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let api = Runrun::new(
            &RunrunConfig {
                base_url: "https://runrun.it/".to_string(),
            },
            || None,
        )
        .unwrap();

        assert_eq!(api.url("tasks"), "https://runrun.it/api/v1.0/tasks");
    }
}
