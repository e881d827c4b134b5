#[cfg(test)]
mod tests {
    use crate::api::{ProfileResponse, UserData};
    use crate::test::utils::{
        bearer, check_in, create_test_habit, register_test_user, setup_test_client,
    };
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    #[rocket::async_test]
    async fn test_profile_includes_activity_counts() {
        let (client, _pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;

        let run = create_test_habit(&client, &auth.token, "Run").await;
        let read = create_test_habit(&client, &auth.token, "Read").await;

        check_in(&client, &auth.token, run.id, "2025-12-01", true).await;
        check_in(&client, &auth.token, run.id, "2025-12-02", true).await;
        check_in(&client, &auth.token, read.id, "2025-12-01", false).await;

        let response = client
            .get("/users/me")
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let profile: ProfileResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(profile.stats.habits_count, 2);
        // Unchecked rows still exist and count as activity here.
        assert_eq!(profile.stats.logs_count, 3);
        assert_eq!(profile.provider, "local");
    }

    #[rocket::async_test]
    async fn test_update_profile_name_is_trimmed() {
        let (client, _pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;

        let response = client
            .patch("/users/me")
            .header(ContentType::JSON)
            .header(bearer(&auth.token))
            .body(json!({ "name": "  Alice Walker  " }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let updated: UserData =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(updated.name.as_deref(), Some("Alice Walker"));

        let response = client
            .patch("/users/me")
            .header(ContentType::JSON)
            .header(bearer(&auth.token))
            .body(json!({ "name": "   " }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn test_delete_account_removes_everything() {
        let (client, pool) = setup_test_client().await;
        let auth = register_test_user(&client, "dave@example.com").await;
        let habit = create_test_habit(&client, &auth.token, "Run").await;
        check_in(&client, &auth.token, habit.id, "2025-12-01", true).await;

        let response = client
            .delete("/users/me")
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // The session died with the account.
        let response = client
            .get("/users/me")
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        for table in ["users", "habits", "habit_logs", "user_sessions"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{} not emptied", table);
        }
    }

    #[rocket::async_test]
    async fn test_deleted_email_can_register_again() {
        let (client, _pool) = setup_test_client().await;
        let first = register_test_user(&client, "dave@example.com").await;
        create_test_habit(&client, &first.token, "Run").await;

        client
            .delete("/users/me")
            .header(bearer(&first.token))
            .dispatch()
            .await;

        // Same email, brand-new account with no history.
        let second = register_test_user(&client, "dave@example.com").await;
        assert_eq!(second.user.email, "dave@example.com");

        let response = client
            .get("/users/me")
            .header(bearer(&second.token))
            .dispatch()
            .await;
        let profile: ProfileResponse =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(profile.stats.habits_count, 0);
        assert_eq!(profile.stats.logs_count, 0);
    }
}
