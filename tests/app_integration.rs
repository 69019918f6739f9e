use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn mount(mock_server: &MockServer, url_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(mock_server)
            .await;
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
            home_currency: "PLN"
            currencies: ["EUR", "USD", "GBP", "CHF"]
            providers:
              frankfurter:
                base_url: {}
                timeout_secs: 5
            data_path: {}
            backfill_days: 5
        "#,
            base_url,
            dir.join("data").display()
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::from_str(s).unwrap()
}

// 2024-03-29 (Good Friday) and the weekend have no ECB fixing
const RANGE_RESPONSE: &str = r#"{
    "amount": 1.0, "base": "EUR", "start_date": "2024-03-27", "end_date": "2024-03-28",
    "rates": {
        "2024-03-27": {"CHF": 0.9814, "GBP": 0.8576, "PLN": 4.3167, "USD": 1.0816},
        "2024-03-28": {"CHF": 0.9766, "GBP": 0.8551, "PLN": 4.3191, "USD": 1.0811}
    }
}"#;

const DAY_RESPONSE: &str = r#"{
    "amount": 1.0, "base": "EUR", "date": "2024-04-02",
    "rates": {"CHF": 0.9765, "GBP": 0.8563, "PLN": 4.3, "USD": 1.075}
}"#;

fn store_lines(data_dir: &Path) -> Vec<String> {
    fs::read_to_string(data_dir.join("history_pln.csv"))
        .expect("store file")
        .lines()
        .map(String::from)
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_backfill_then_daily_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount(&mock_server, "/2024-03-27..2024-03-31", 200, RANGE_RESPONSE).await;
    test_utils::mount(&mock_server, "/2024-04-02", 200, DAY_RESPONSE).await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());
    let config_path = config_path.to_str().unwrap();
    let data_dir = dir.path().join("data");

    let result =
        fxdash::run_command_on(fxdash::AppCommand::Backfill, Some(config_path), d("2024-03-31"))
            .await;
    assert!(result.is_ok(), "Backfill failed with: {:?}", result.err());
    assert_eq!(
        store_lines(&data_dir),
        vec![
            "date,EUR,USD,GBP,CHF",
            "2024-03-27,4.3167,3.9910,5.0335,4.3985",
            "2024-03-28,4.3191,3.9951,5.0510,4.4226",
        ]
    );

    // Second backfill on the same day changes nothing
    let before = fs::read(data_dir.join("history_pln.csv")).unwrap();
    fxdash::run_command_on(fxdash::AppCommand::Backfill, Some(config_path), d("2024-03-31"))
        .await
        .unwrap();
    assert_eq!(fs::read(data_dir.join("history_pln.csv")).unwrap(), before);

    let result =
        fxdash::run_command_on(fxdash::AppCommand::Daily, Some(config_path), d("2024-04-02")).await;
    assert!(result.is_ok(), "Daily failed with: {:?}", result.err());

    let lines = store_lines(&data_dir);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "2024-04-02,4.3000,4.0000,5.0216,4.4035");

    let html = fs::read_to_string(data_dir.join("dashboard.html")).unwrap();
    assert!(html.contains("Current rates (2024-04-02)"));
    assert!(html.contains("<td>2024-03-27</td>"));

    // Re-running the daily job is a no-op and renders the same page
    fxdash::run_command_on(fxdash::AppCommand::Daily, Some(config_path), d("2024-04-02"))
        .await
        .unwrap();
    assert_eq!(store_lines(&data_dir), lines);
    assert_eq!(
        fs::read_to_string(data_dir.join("dashboard.html")).unwrap(),
        html
    );

    fxdash::run_command_on(fxdash::AppCommand::Show, Some(config_path), d("2024-04-02"))
        .await
        .unwrap();
}

#[test_log::test(tokio::test)]
async fn test_daily_fetch_failure_exits_with_error() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount(&mock_server, "/2024-03-27..2024-03-31", 200, RANGE_RESPONSE).await;
    test_utils::mount(&mock_server, "/2024-04-02", 503, "").await;

    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), &mock_server.uri());
    let config_path = config_path.to_str().unwrap();
    let data_dir = dir.path().join("data");

    fxdash::run_command_on(fxdash::AppCommand::Backfill, Some(config_path), d("2024-03-31"))
        .await
        .unwrap();
    let before = fs::read(data_dir.join("history_pln.csv")).unwrap();

    let result =
        fxdash::run_command_on(fxdash::AppCommand::Daily, Some(config_path), d("2024-04-02")).await;

    let err = result.expect_err("daily run must fail when the source is down");
    let message = format!("{err:#}");
    assert!(message.contains("2024-04-02"), "{message}");
    assert!(message.contains("503"), "{message}");
    assert_eq!(fs::read(data_dir.join("history_pln.csv")).unwrap(), before);
    assert!(!data_dir.join("dashboard.html").exists());
}

#[test_log::test(tokio::test)]
async fn test_corrupt_store_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:9");
    let data_dir = dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("history_pln.csv"),
        "date,EUR,USD,GBP,CHF\n2024-03-27,4.3167,3.9910,oops,4.3985\n",
    )
    .unwrap();

    for command in [fxdash::AppCommand::Daily, fxdash::AppCommand::Render] {
        let result =
            fxdash::run_command_on(command, Some(config_path.to_str().unwrap()), d("2024-04-02"))
                .await;
        let message = format!("{:#}", result.expect_err("corrupt store must abort"));
        assert!(message.contains("Corrupt store"), "{message}");
    }
}

#[test_log::test(tokio::test)]
async fn test_render_empty_store_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = test_utils::write_config(dir.path(), "http://127.0.0.1:9");

    let result = fxdash::run_command_on(
        fxdash::AppCommand::Render,
        Some(config_path.to_str().unwrap()),
        d("2024-04-02"),
    )
    .await;
    let message = format!("{:#}", result.expect_err("nothing to render"));
    assert!(message.contains("no records"), "{message}");
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live Frankfurter API"]
async fn test_real_frankfurter_api() {
    use fxdash::core::{DateRange, RateSource};
    use fxdash::providers::FrankfurterProvider;

    let currencies = ["EUR", "USD", "GBP", "CHF"].map(String::from);
    let provider = FrankfurterProvider::new(
        "https://api.frankfurter.app",
        "PLN",
        &currencies,
        std::time::Duration::from_secs(30),
    )
    .unwrap();

    let range = DateRange::new(d("2024-03-25"), d("2024-03-31")).unwrap();
    info!(%range, "Fetching rates from Frankfurter");

    match provider.fetch(range).await {
        Ok(records) => {
            info!(?records, "Received rates");
            // Mon..Thu; Good Friday and the weekend have no fixing
            assert_eq!(records.len(), 4);
            assert!(records.iter().all(|r| r.covers_exactly(&currencies)));
        }
        Err(e) => {
            error!("Rate request failed: {e}\n{e:?}");
            panic!("Rate request failed: {e}");
        }
    }
}
