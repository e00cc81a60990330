use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Created {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Record {
    id: i64,
    club_name: String,
    result: f64,
    date_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Rollup {
    club_name: String,
    commission_percentage: f64,
    sessions: usize,
    total_result: f64,
    adjusted_total: f64,
    best_session: f64,
    worst_session: f64,
}

#[derive(Debug, Deserialize)]
struct Period {
    period: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    previous: String,
    next: String,
}

#[derive(Debug, Deserialize)]
struct Restored {
    restored_records: usize,
    skipped_records: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::{Mutex, Once};

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    pub fn registered() -> Vec<i32> {
        PIDS.lock().map(|pids| pids.clone()).unwrap_or_default()
    }

    extern "C" fn on_exit() {
        for pid in registered() {
            if pid > 0 {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("poker_ledger_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/commissions")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_poker_ledger"))
        .env("PORT", port.to_string())
        .env("APP_HOST", "127.0.0.1")
        .env("APP_DATA_PATH", data_path)
        .env("TZ", "UTC")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn add_result(client: &Client, base_url: &str, club: &str, result: f64, date_time: &str) -> i64 {
    let response = client
        .post(format!("{base_url}/api/results"))
        .json(&json!({
            "club_name": club,
            "account_name": "hero",
            "result": result,
            "date_time": date_time,
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success(), "create failed: {}", response.status());
    response.json::<Created>().await.unwrap().id
}

#[tokio::test]
async fn http_day_window_honours_day_start_hour() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    add_result(&client, base, "Harbor", 1.0, "2031-03-10T05:00:00Z").await;
    let inside_first = add_result(&client, base, "Harbor", 2.0, "2031-03-10T06:00:00Z").await;
    let inside_last = add_result(&client, base, "Harbor", 3.0, "2031-03-11T05:59:00Z").await;
    add_result(&client, base, "Harbor", 4.0, "2031-03-11T06:00:00Z").await;

    let records: Vec<Record> = client
        .get(format!(
            "{base}/api/results?period=day&date=2031-03-10&dayStartTime=06:00&weekStartDay=1"
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, [inside_last, inside_first]);
    assert!(records.iter().all(|r| r.club_name == "Harbor"));
    assert_eq!(records[0].date_time.to_rfc3339(), "2031-03-11T05:59:00+00:00");
}

#[tokio::test]
async fn http_summary_applies_commission_per_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    let response = client
        .put(format!("{base}/api/commissions/Summit"))
        .json(&json!({ "commission_percentage": 10.0 }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    add_result(&client, base, "Summit", 100.0, "2032-05-03T20:00:00Z").await;
    add_result(&client, base, "Summit", -50.0, "2032-05-20T20:00:00Z").await;
    add_result(&client, base, "Valley", 60.0, "2032-05-21T20:00:00Z").await;

    let summary: Vec<Rollup> = client
        .get(format!("{base}/api/summary?period=month&date=2032-05-15"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].club_name, "Valley");
    let summit = &summary[1];
    assert_eq!(summit.club_name, "Summit");
    assert_eq!(summit.commission_percentage, 10.0);
    assert_eq!(summit.sessions, 2);
    assert!((summit.total_result - 50.0).abs() < 1e-9);
    assert!((summit.adjusted_total - 45.0).abs() < 1e-9);
    assert_eq!(summit.best_session, 100.0);
    assert_eq!(summit.worst_session, -50.0);
}

#[tokio::test]
async fn http_summary_etag_skips_unchanged_content() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    let id = add_result(&client, base, "Lagoon", 25.0, "2033-08-08T21:00:00Z").await;
    let url = format!("{base}/api/summary?period=year&date=2033-01-01");

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first
        .headers()
        .get("etag")
        .expect("summary carries an etag")
        .to_str()
        .unwrap()
        .to_string();

    let second = client
        .get(&url)
        .header("If-None-Match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);

    let response = client
        .put(format!("{base}/api/results/{id}"))
        .json(&json!({
            "club_name": "Lagoon",
            "account_name": "hero",
            "result": 26.0,
            "date_time": "2033-08-08T21:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let third = client
        .get(&url)
        .header("If-None-Match", &etag)
        .send()
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::OK);
    assert_ne!(third.headers().get("etag").unwrap().to_str().unwrap(), etag);
    let summary: Vec<Rollup> = third.json().await.unwrap();
    assert_eq!(summary[0].total_result, 26.0);
}

#[tokio::test]
async fn http_missing_records_return_not_found() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    let id = add_result(&client, base, "Ghost", 5.0, "2034-01-01T12:00:00Z").await;
    let response = client
        .delete(format!("{base}/api/results/{id}"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .delete(format!("{base}/api/results/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .put(format!("{base}/api/results/{id}"))
        .json(&json!({
            "club_name": "Ghost",
            "account_name": "hero",
            "result": 1.0,
            "date_time": "2034-01-01T12:00:00Z",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Result not found");
}

#[tokio::test]
async fn http_rejects_bad_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();
    let base = &server.base_url;

    let response = client
        .get(format!("{base}/api/summary?period=fortnight&date=2024-01-01"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert!(body.error.contains("invalid period kind"));

    let response = client
        .get(format!("{base}/api/results?period=week&date=2024-01-01&weekStartDay=9"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{base}/api/results"))
        .json(&json!({ "club_name": "X", "account_name": " ", "result": 1.0, "date_time": "2024-01-01T00:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .put(format!("{base}/api/commissions/Harbor"))
        .json(&json!({ "commission_percentage": 120.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_period_reports_window_and_neighbours() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let period: Period = client
        .get(format!("{}/api/period?period=month&date=2024-01-31", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(period.period, "month");
    assert_eq!(period.start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert_eq!(period.end.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    assert_eq!(period.next, "2024-02-29");
    assert_eq!(period.previous, "2023-12-31");

    let week: Period = client
        .get(format!(
            "{}/api/period?period=week&date=2024-01-10&weekStartDay=1&dayStartTime=4",
            server.base_url
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(week.start.to_rfc3339(), "2024-01-08T04:00:00+00:00");
    assert_eq!(week.end.to_rfc3339(), "2024-01-15T04:00:00+00:00");
}

#[tokio::test]
async fn http_backup_restores_into_fresh_ledger() {
    let source = spawn_server().await;
    let target = spawn_server().await;

    #[cfg(unix)]
    {
        let pids = cleanup::registered();
        assert!(pids.contains(&(source.child.id() as i32)));
        assert!(pids.contains(&(target.child.id() as i32)));
    }
    let client = Client::new();

    add_result(&client, &source.base_url, "Reef", 12.0, "2035-02-01T19:00:00Z").await;
    add_result(&client, &source.base_url, "Reef", -4.5, "2035-02-02T19:00:00Z").await;
    client
        .put(format!("{}/api/commissions/Reef", source.base_url))
        .json(&json!({ "commission_percentage": 5.0 }))
        .send()
        .await
        .unwrap();

    let backup = client
        .get(format!("{}/api/backup", source.base_url))
        .send()
        .await
        .unwrap();
    assert!(backup.status().is_success());
    let disposition = backup
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"poker-ledger-backup-"));
    let bytes = backup.bytes().await.unwrap().to_vec();

    let part = Part::bytes(bytes)
        .file_name("backup.json")
        .mime_str("application/json")
        .unwrap();
    let restored: Restored = client
        .post(format!("{}/api/restore", target.base_url))
        .multipart(Form::new().part("backup", part))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(restored.restored_records, 2);
    assert_eq!(restored.skipped_records, 0);

    let records: Vec<Record> = client
        .get(format!("{}/api/results", target.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut amounts: Vec<f64> = records.iter().map(|r| r.result).collect();
    amounts.sort_by(f64::total_cmp);
    assert_eq!(amounts, [-4.5, 12.0]);

    let summary: Vec<Rollup> = client
        .get(format!("{}/api/summary?period=year&date=2035-06-01", target.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary[0].commission_percentage, 5.0);
}

#[tokio::test]
async fn http_restore_requires_a_backup_file() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/restore", server.base_url))
        .multipart(Form::new().text("note", "nothing here"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "No backup file provided");

    let part = Part::bytes(br#"{"version": "1.0", "data": "nope"}"#.to_vec()).file_name("bad.json");
    let response = client
        .post(format!("{}/api/restore", server.base_url))
        .multipart(Form::new().part("backup", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Invalid backup file format");
}
