#[cfg(test)]
mod tests {
    use crate::db::set_check_in;
    use crate::stats::MonthSummary;
    use crate::test::utils::{
        bearer, check_in, create_test_habit, register_test_user, setup_test_client,
    };
    use rocket::http::Status;

    async fn fetch_stats(
        client: &rocket::local::asynchronous::Client,
        token: &str,
        month: &str,
    ) -> MonthSummary {
        let response = client
            .get(format!("/habits/stats?month={}", month))
            .header(bearer(token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    #[rocket::async_test]
    async fn test_stats_for_an_empty_month() {
        let (client, _pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;

        let summary = fetch_stats(&client, &auth.token, "2025-12").await;

        assert_eq!(summary.month, "2025-12");
        assert_eq!(summary.days_in_month, 31);
        assert_eq!(summary.habit_count, 0);
        assert_eq!(summary.overall_completion, 0);
        assert!(summary.per_habit.is_empty());
        assert!(summary.weekly.is_empty());
    }

    #[rocket::async_test]
    async fn test_weekly_buckets_cover_a_30_day_month() {
        let (client, pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;
        let run = create_test_habit(&client, &auth.token, "Run").await;
        let read = create_test_habit(&client, &auth.token, "Read").await;

        // Seed through the store layer; 60 dispatches would just be
        // noise here.
        for day in 1..=30 {
            let date = format!("2025-04-{:02}", day);
            set_check_in(&pool, auth.user.id, run.id, &date, true)
                .await
                .unwrap();
            set_check_in(&pool, auth.user.id, read.id, &date, true)
                .await
                .unwrap();
        }

        let summary = fetch_stats(&client, &auth.token, "2025-04").await;

        assert_eq!(summary.overall_completion, 100);
        assert_eq!(summary.weekly.len(), 5);

        let totals: Vec<u32> = summary.weekly.iter().map(|w| w.total).collect();
        assert_eq!(totals, vec![14, 14, 14, 14, 4]);
        assert!(summary.weekly.iter().all(|w| w.percent == 100));
        assert_eq!(summary.weekly[4].start_day, 29);
        assert_eq!(summary.weekly[4].end_day, 30);
    }

    #[rocket::async_test]
    async fn test_deleting_a_habit_shrinks_the_denominator() {
        let (client, pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;
        let a = create_test_habit(&client, &auth.token, "A").await;
        let b = create_test_habit(&client, &auth.token, "B").await;

        for date in ["2025-12-01", "2025-12-02", "2025-12-03"] {
            set_check_in(&pool, auth.user.id, a.id, date, true)
                .await
                .unwrap();
        }
        set_check_in(&pool, auth.user.id, b.id, "2025-12-01", true)
            .await
            .unwrap();

        let before = fetch_stats(&client, &auth.token, "2025-12").await;
        assert_eq!(before.habit_count, 2);
        assert_eq!(before.completed_count, 4);

        let response = client
            .delete(format!("/habits/{}", a.id))
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        // A's logs went with it; B alone sets the denominator now.
        let after = fetch_stats(&client, &auth.token, "2025-12").await;
        assert_eq!(after.habit_count, 1);
        assert_eq!(after.completed_count, 1);
        assert_eq!(after.overall_completion, 3); // 1/31
        assert_eq!(after.per_habit.len(), 1);
        assert_eq!(after.per_habit[0].name, "B");
    }

    #[rocket::async_test]
    async fn test_per_habit_ranking_breaks_ties_by_creation() {
        let (client, pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;
        let x = create_test_habit(&client, &auth.token, "X").await;
        let y = create_test_habit(&client, &auth.token, "Y").await;
        let z = create_test_habit(&client, &auth.token, "Z").await;

        for day in 1..=10 {
            let date = format!("2025-12-{:02}", day);
            set_check_in(&pool, auth.user.id, x.id, &date, true)
                .await
                .unwrap();
            set_check_in(&pool, auth.user.id, y.id, &date, true)
                .await
                .unwrap();
        }
        for day in 1..=5 {
            let date = format!("2025-12-{:02}", day);
            set_check_in(&pool, auth.user.id, z.id, &date, true)
                .await
                .unwrap();
        }

        let summary = fetch_stats(&client, &auth.token, "2025-12").await;

        let names: Vec<&str> = summary.per_habit.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["X", "Y", "Z"]);
        assert_eq!(summary.per_habit[0].percent, summary.per_habit[1].percent);
    }

    #[rocket::async_test]
    async fn test_stats_validates_the_month() {
        let (client, _pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;

        let response = client
            .get("/habits/stats")
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .get("/habits/stats?month=2025-00")
            .header(bearer(&auth.token))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn test_per_day_reflects_each_calendar_day() {
        let (client, _pool) = setup_test_client().await;
        let auth = register_test_user(&client, "alice@example.com").await;
        let habit = create_test_habit(&client, &auth.token, "Run").await;

        check_in(&client, &auth.token, habit.id, "2025-12-04", true).await;

        let summary = fetch_stats(&client, &auth.token, "2025-12").await;

        assert_eq!(summary.per_day.len(), 31);
        assert_eq!(summary.per_day[3].day, 4);
        assert_eq!(summary.per_day[3].completed, 1);
        assert_eq!(summary.per_day[3].percent, 100);
        assert_eq!(summary.per_day[4].completed, 0);
    }
}
