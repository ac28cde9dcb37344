mod common;

use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{holdings_fixture, run_blocking, TestEnv};

#[tokio::test]
async fn holdings_sends_ordering_filters_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journal/cumulative_ticker_holdings"))
        .and(header("Authorization", "Bearer tok"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header_regex("User-Agent", "^monfaristo/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(holdings_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args([
                "holdings",
                "--sort",
                "-total_buy_amount,pnl_amount",
                "--filter",
                "status=Completed",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Total Buy Amount ▼"))
            .stdout(predicate::str::contains("PnL ▲"))
            .stdout(predicate::str::contains("AAPL"))
            .stdout(predicate::str::contains("1,500.00 USD"))
            .stdout(predicate::str::contains("12.99 %"));
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].url.query(),
        Some("ordering=-total_buy_amount%2Cpnl_amount&is_completed=true")
    );
}

#[tokio::test]
async fn holdings_json_with_account_shorthand() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journal/cumulative_ticker_holdings"))
        .and(query_param("investment_account_id", "3"))
        .and(query_param("is_completed", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(holdings_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    let output = run_blocking(move || {
        env.cmd_at(&uri)
            .args(["holdings", "--json", "--filter", "status=open", "--account", "3"])
            .output()
            .unwrap()
    })
    .await;

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.get("ordering").is_none());
    assert_eq!(parsed["holdings"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["holdings"][1]["ticker"]["code"], "SAP");
}

#[tokio::test]
async fn holdings_server_error_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&server)
        .await;

    let env = TestEnv::with_session("expired", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .arg("holdings")
            .assert()
            .failure()
            .stderr(predicate::str::contains("401"))
            .stderr(predicate::str::contains("monfaristo login"));
    })
    .await;
}

#[tokio::test]
async fn login_saves_session_then_whoami_greets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/token"))
        .and(body_string_contains("a@b.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh-token", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let uri = server.uri();
    let env = run_blocking(move || {
        env.cmd_at(&uri)
            .args(["login", "a@b.com", "--password", "x"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Hi a@b.com!"));

        env.cmd()
            .arg("whoami")
            .assert()
            .success()
            .stdout(predicate::str::contains("Hi a@b.com!"));
        env
    })
    .await;

    let saved = std::fs::read_to_string(env.session_path()).unwrap();
    assert!(saved.contains("fresh-token"));
}

#[tokio::test]
async fn login_reads_password_from_stdin_and_ignores_stale_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/token"))
        .and(body_string_contains("from-stdin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t2"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("stale", "old@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args(["login", "a@b.com"])
            .write_stdin("from-stdin\n")
            .assert()
            .success();
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn login_rejected_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let uri = server.uri();
    let env = run_blocking(move || {
        env.cmd_at(&uri)
            .args(["login", "a@b.com", "--password", "wrong"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Login rejected"));
        env
    })
    .await;

    assert!(!env.session_path().exists());
}

#[tokio::test]
async fn token_flag_overrides_saved_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journal/accounts"))
        .and(header("Authorization", "Bearer from-flag"))
        .and(query_param("q", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "title": "Main", "owner": {"email": "a@b.com"}, "is_active": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("saved", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args(["--token", "from-flag", "accounts", "list", "--q", "main"])
            .assert()
            .success()
            .stdout(predicate::str::contains("#3 Main (a@b.com)"));
    })
    .await;
}

#[tokio::test]
async fn accounts_create_posts_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/journal/account"))
        .and(body_string_contains("\"title\":\"Savings\""))
        .and(body_string_contains("\"owner_id\":4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8, "title": "Savings"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args(["accounts", "create", "--title", "Savings", "--owner-id", "4"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created #8 Savings"));
    })
    .await;
}

#[tokio::test]
async fn transactions_list_passes_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journal/transactions"))
        .and(query_param("investment_account", "3"))
        .and(query_param("type", "sell"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 9, "ticker_id": 10, "price": 170.0, "count": 10.0, "type": "sell",
             "executed_at": "2024-03-01T12:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args(["--utc", "transactions", "list", "--account", "3", "--type", "sell"])
            .assert()
            .success()
            .stdout(predicate::str::contains("#9 01.03.2024 SELL 10.00 @ 170.00"));
    })
    .await;
}

#[tokio::test]
async fn config_file_sets_api_host() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/journal/transaction/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "type": "buy"})))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    env.write_config(&format!("api_host = \"{}\"\n", server.uri()));
    run_blocking(move || {
        env.cmd()
            .args(["transactions", "show", "9", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"type\": \"buy\""));
    })
    .await;
}

#[tokio::test]
async fn transactions_create_posts_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/journal/transaction"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_partial_json(json!({
            "ticker_id": 10,
            "price": 150.5,
            "count": 2.0,
            "commission": 0.0,
            "type": "BUY",
            "investment_account_id": 3,
            "platform_id": 1,
            "executed_at": "2024-01-15T10:30:00",
            "description": "first lot"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 21, "ticker_id": 10, "price": 150.5, "count": 2.0, "type": "BUY",
            "executed_at": "2024-01-15T10:30:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args([
                "--utc", "transactions", "create", "--type", "BUY", "--ticker", "10",
                "--account", "3", "--platform", "1", "--price", "150.5", "--count", "2",
                "--executed-at", "2024-01-15T10:30", "--description", "first lot",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Recorded #21 15.01.2024 BUY 2.00 @ 150.50"));
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("executed_by_id").is_none());
}

#[tokio::test]
async fn transactions_create_rejects_zero_count_without_request() {
    let server = MockServer::start().await;
    let env = TestEnv::with_session("tok", "a@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args([
                "transactions", "create", "--type", "SELL", "--ticker", "10", "--account", "3",
                "--platform", "1", "--price", "170", "--count", "0",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("count must be greater than 0"));
    })
    .await;

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn signup_creates_user_without_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/create"))
        .and(body_partial_json(json!({
            "email": "new@b.com",
            "first_name": "Ada",
            "last_name": null,
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "email": "new@b.com", "first_name": "Ada"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::with_session("stale", "old@b.com");
    let uri = server.uri();
    run_blocking(move || {
        env.cmd_at(&uri)
            .args(["signup", "new@b.com", "--first-name", "Ada", "--password", "pw"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created user new@b.com."));
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}
