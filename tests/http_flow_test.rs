use bigdecimal::BigDecimal;
use referral_ledger::adapters::{InMemoryLedgerRepository, InMemoryUserDirectory};
use referral_ledger::domain::UserRole;
use referral_ledger::services::SettingsProvider;
use referral_ledger::{create_app, AppState};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const ADMIN_KEY: &str = "test-admin-key";

struct TestApp {
    base_url: String,
    client: Client,
    users: Arc<InMemoryUserDirectory>,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn user(&self, role: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        self.users.register(id, role).await;
        id
    }

    async fn admin_post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(ADMIN_KEY)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn wallet(&self, user_id: Uuid) -> Value {
        self.client
            .get(self.url(&format!("/wallets/{}", user_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn fund(&self, user_id: Uuid, amount: i64) {
        let res = self
            .admin_post(
                &format!("/admin/wallets/{}/bonus", user_id),
                json!({"amount": amount.to_string(), "description": "welcome bonus"}),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }
}

async fn setup_test_app() -> TestApp {
    let repository = Arc::new(InMemoryLedgerRepository::new(Duration::from_secs(1)));
    let users = Arc::new(InMemoryUserDirectory::new());
    let settings = SettingsProvider::load(repository.clone()).await.unwrap();

    let state = AppState::new(repository, users.clone(), settings, ADMIN_KEY);
    let app = create_app(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], 0));
    let server = axum::Server::bind(&addr).serve(app.into_make_service());
    let actual_addr = server.local_addr();

    tokio::spawn(async move {
        server.await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", actual_addr),
        client: Client::new(),
        users,
    }
}

fn decimal(value: &Value) -> BigDecimal {
    value
        .as_str()
        .expect("amounts are serialized as strings")
        .parse()
        .expect("valid decimal")
}

#[tokio::test]
async fn test_health_check() {
    let app = setup_test_app().await;
    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["db"], "connected");
}

#[tokio::test]
async fn test_admin_routes_require_api_key() {
    let app = setup_test_app().await;

    let missing = app.client.get(app.url("/admin/stats")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth("not-the-key")
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let body: Value = wrong.json().await.unwrap();
    assert_eq!(body["code"], "unauthorized");

    let ok = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = setup_test_app().await;
    let res = app.client.get(app.url("/health")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_referral_lifecycle_credits_once() {
    let app = setup_test_app().await;
    let doctor = app.user(UserRole::Doctor).await;
    let patient = app.user(UserRole::Patient).await;

    let res = app
        .client
        .post(app.url("/referrals"))
        .json(&json!({"referrer_id": doctor, "referee_id": patient}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["outcome"], "created");
    assert_eq!(created["data"]["referral_type"], "doctor_to_patient");
    let referral_id = created["data"]["id"].as_str().unwrap().to_string();

    let complete_url = app.url(&format!("/referrals/{}/complete", referral_id));
    let first: Value = app.client.post(&complete_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(first["outcome"], "completed");
    assert_eq!(decimal(&first["data"]["reward_amount"]), BigDecimal::from(100));

    let second: Value = app.client.post(&complete_url).send().await.unwrap().json().await.unwrap();
    assert_eq!(second["outcome"], "already_completed");
    assert_eq!(second["data"]["completed_at"], first["data"]["completed_at"]);

    let credit_path = format!("/admin/referrals/{}/credit", referral_id);
    let credited: Value = app.admin_post(&credit_path, json!({})).await.json().await.unwrap();
    assert_eq!(credited["outcome"], "credited");
    assert_eq!(credited["data"]["status"], "credited");

    let again: Value = app.admin_post(&credit_path, json!({})).await.json().await.unwrap();
    assert_eq!(again["outcome"], "already_credited");

    let wallet = app.wallet(doctor).await;
    assert_eq!(decimal(&wallet["available_balance"]), BigDecimal::from(100));
    assert_eq!(decimal(&wallet["total_earned"]), BigDecimal::from(100));

    let listed: Value = app
        .client
        .get(app.url(&format!("/users/{}/referrals", doctor)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_self_referral_is_rejected() {
    let app = setup_test_app().await;
    let patient = app.user(UserRole::Patient).await;

    let res = app
        .client
        .post(app.url("/referrals"))
        .json(&json!({"referrer_id": patient, "referee_id": patient}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "invalid_referral_pair");
}

#[tokio::test]
async fn test_withdrawal_scenario_with_reject() {
    let app = setup_test_app().await;
    let user = Uuid::new_v4();
    let admin = Uuid::new_v4();
    app.fund(user, 500).await;

    let request = |amount: &str| {
        json!({
            "user_id": user,
            "amount": amount,
            "method": "upi",
            "details": {"upi_id": "patient@okbank"},
        })
    };

    let too_much = app
        .client
        .post(app.url("/withdrawals"))
        .json(&request("600"))
        .send()
        .await
        .unwrap();
    assert_eq!(too_much.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = too_much.json().await.unwrap();
    assert_eq!(body["code"], "insufficient_funds");

    let too_little = app
        .client
        .post(app.url("/withdrawals"))
        .json(&request("50"))
        .send()
        .await
        .unwrap();
    let body: Value = too_little.json().await.unwrap();
    assert_eq!(body["code"], "below_minimum");

    let created = app
        .client
        .post(app.url("/withdrawals"))
        .json(&request("200"))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["outcome"], "requested");
    let request_id = created["data"]["id"].as_str().unwrap().to_string();

    let wallet = app.wallet(user).await;
    assert_eq!(decimal(&wallet["available_balance"]), BigDecimal::from(300));
    assert_eq!(decimal(&wallet["pending_withdrawal"]), BigDecimal::from(200));

    let reject_path = format!("/admin/withdrawals/{}/reject", request_id);
    let no_note = app.admin_post(&reject_path, json!({"admin_id": admin})).await;
    assert_eq!(no_note.status(), StatusCode::BAD_REQUEST);

    let rejected: Value = app
        .admin_post(&reject_path, json!({"admin_id": admin, "note": "UPI id inactive"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(rejected["outcome"], "rejected");
    assert_eq!(rejected["data"]["admin_note"], "UPI id inactive");

    let again: Value = app
        .admin_post(&reject_path, json!({"admin_id": admin, "note": "again"}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["outcome"], "already_rejected");

    let retry = app.admin_post(&reject_path, json!({"admin_id": admin})).await;
    assert_eq!(retry.status(), StatusCode::OK);
    let retry: Value = retry.json().await.unwrap();
    assert_eq!(retry["outcome"], "already_rejected");
    assert_eq!(retry["data"]["admin_note"], "UPI id inactive");

    let wallet = app.wallet(user).await;
    assert_eq!(decimal(&wallet["available_balance"]), BigDecimal::from(500));
    assert_eq!(decimal(&wallet["pending_withdrawal"]), BigDecimal::from(0));
}

#[tokio::test]
async fn test_withdrawal_approve_and_process() {
    let app = setup_test_app().await;
    let user = Uuid::new_v4();
    let admin = Uuid::new_v4();
    app.fund(user, 300).await;

    let created: Value = app
        .client
        .post(app.url("/withdrawals"))
        .json(&json!({
            "user_id": user,
            "amount": "150.50",
            "method": "bank",
            "details": {
                "account_holder_name": "Dr. Rao",
                "account_number": "001234567890",
                "ifsc_code": "SBIN0001234",
            },
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let request_id = created["data"]["id"].as_str().unwrap().to_string();

    let early = app
        .admin_post(
            &format!("/admin/withdrawals/{}/process", request_id),
            json!({"admin_id": admin}),
        )
        .await;
    assert_eq!(early.status(), StatusCode::CONFLICT);

    let approved: Value = app
        .admin_post(
            &format!("/admin/withdrawals/{}/approve", request_id),
            json!({"admin_id": admin}),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(approved["outcome"], "approved");

    let queue: Value = app
        .client
        .get(app.url("/admin/withdrawals?status=approved"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let process_path = format!("/admin/withdrawals/{}/process", request_id);
    let processed: Value = app
        .admin_post(&process_path, json!({"admin_id": admin}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(processed["outcome"], "processed");

    let repeat: Value = app
        .admin_post(&process_path, json!({"admin_id": admin}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(repeat["outcome"], "already_processed");

    let wallet = app.wallet(user).await;
    assert_eq!(
        decimal(&wallet["available_balance"]),
        "149.50".parse::<BigDecimal>().unwrap()
    );
    assert_eq!(
        decimal(&wallet["total_withdrawn"]),
        "150.50".parse::<BigDecimal>().unwrap()
    );
    assert_eq!(decimal(&wallet["pending_withdrawal"]), BigDecimal::from(0));

    let audit: Value = app
        .client
        .get(app.url(&format!("/admin/wallets/{}/audit", user)))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(audit["consistent"], true);
    assert_eq!(audit["transaction_count"], 3);
}

#[tokio::test]
async fn test_transaction_history_and_export() {
    let app = setup_test_app().await;
    let user = Uuid::new_v4();
    app.fund(user, 100).await;
    app.fund(user, 25).await;

    let history: Value = app
        .client
        .get(app.url(&format!("/wallets/{}/transactions?limit=1", user)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(decimal(&history[0]["amount"]), BigDecimal::from(25));

    let export = app
        .client
        .get(app.url(&format!("/wallets/{}/transactions/export", user)))
        .send()
        .await
        .unwrap();
    assert_eq!(export.status(), StatusCode::OK);
    assert!(export.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));

    let csv = export.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,created_at,kind,amount"));
    assert!(lines[1].contains(",bonus,100,"));
}

#[tokio::test]
async fn test_settings_update_changes_new_rewards() {
    let app = setup_test_app().await;

    let res = app
        .client
        .put(app.url("/admin/settings"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"patient_to_patient_reward": "75.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let settings: Value = res.json().await.unwrap();
    assert_eq!(settings["version"], 1);

    let invalid = app
        .client
        .put(app.url("/admin/settings"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"doctor_to_doctor_reward": "0"}))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let sub_cent = app
        .client
        .put(app.url("/admin/settings"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"patient_to_patient_reward": "10.555"}))
        .send()
        .await
        .unwrap();
    assert_eq!(sub_cent.status(), StatusCode::BAD_REQUEST);
    let body: Value = sub_cent.json().await.unwrap();
    assert_eq!(body["code"], "validation");

    let a = app.user(UserRole::Patient).await;
    let b = app.user(UserRole::Patient).await;
    let created: Value = app
        .client
        .post(app.url("/referrals"))
        .json(&json!({"referrer_id": a, "referee_id": b}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let referral_id = created["data"]["id"].as_str().unwrap().to_string();

    let completed: Value = app
        .client
        .post(app.url(&format!("/referrals/{}/complete", referral_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(decimal(&completed["data"]["reward_amount"]), BigDecimal::from(75));
    assert_eq!(completed["data"]["settings_version"], 1);
}

#[tokio::test]
async fn test_unknown_entities_return_not_found() {
    let app = setup_test_app().await;

    let res = app
        .client
        .get(app.url(&format!("/withdrawals/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "not_found");

    let res = app
        .client
        .get(app.url(&format!("/referrals/{}", Uuid::new_v4())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
