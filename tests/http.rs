use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: String,
    amount_ml: u32,
}

#[derive(Debug, Deserialize)]
struct ReminderResponse {
    enabled: bool,
    interval_minutes: u32,
    next_fire_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodayResponse {
    date: String,
    current_intake_ml: u32,
    daily_goal_ml: u32,
    drink_amount_ml: u32,
    records: Vec<RecordResponse>,
    reminder: ReminderResponse,
    notification_permission: String,
    installable: bool,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    notifications: Vec<serde_json::Value>,
    prompts: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WeeklyResponse {
    days: Vec<serde_json::Value>,
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
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
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

fn data_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("water_tracker_http")
        .tempdir()
        .expect("create temp dir")
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
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
    // leaked so the directory outlives the shared server
    let dir = Box::leak(Box::new(data_dir()));
    let child = Command::new(env!("CARGO_BIN_EXE_water_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", dir.path().join("state.json"))
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

async fn today(client: &Client, base_url: &str) -> TodayResponse {
    client
        .get(format!("{base_url}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_add_water_updates_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today(&client, &server.base_url).await;

    let after: TodayResponse = client
        .post(format!("{}/api/water", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(
        after.current_intake_ml,
        before.current_intake_ml + before.drink_amount_ml
    );
    assert_eq!(after.records.len(), before.records.len() + 1);
    assert!(!after.date.is_empty());

    let listed = today(&client, &server.base_url).await;
    assert_eq!(listed.current_intake_ml, after.current_intake_ml);
}

#[tokio::test]
async fn http_remove_record_subtracts_amount() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let added: TodayResponse = client
        .post(format!("{}/api/water", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let record = added.records.last().expect("record was added");

    let after: TodayResponse = client
        .delete(format!("{}/api/records/{}", server.base_url, record.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        after.current_intake_ml,
        added.current_intake_ml - record.amount_ml
    );
    assert!(after.records.iter().all(|r| r.id != record.id));

    let missing = client
        .delete(format!("{}/api/records/{}", server.base_url, record.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let malformed = client
        .delete(format!("{}/api/records/not-a-uuid", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_settings_are_validated_and_applied() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let rejected = client
        .put(format!("{}/api/settings", server.base_url))
        .json(&serde_json::json!({ "daily_goal_ml": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = client
        .put(format!("{}/api/settings", server.base_url))
        .json(&serde_json::json!({ "daily_goal_ml": 1500, "interval_minutes": 30 }))
        .send()
        .await
        .unwrap();
    assert!(accepted.status().is_success());

    let state = today(&client, &server.base_url).await;
    assert_eq!(state.daily_goal_ml, 1500);
    assert_eq!(state.reminder.interval_minutes, 30);
}

#[tokio::test]
async fn http_reminder_toggle_arms_and_disarms() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today(&client, &server.base_url).await;
    let response = client
        .post(format!("{}/api/reminder/toggle", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let toggled = today(&client, &server.base_url).await;
    assert_eq!(toggled.reminder.enabled, !before.reminder.enabled);
    assert_eq!(toggled.reminder.next_fire_at.is_some(), toggled.reminder.enabled);

    client
        .post(format!("{}/api/reminder/toggle", server.base_url))
        .send()
        .await
        .unwrap();
    let restored = today(&client, &server.base_url).await;
    assert_eq!(restored.reminder.enabled, before.reminder.enabled);
}

#[tokio::test]
async fn http_drink_amount_steps_and_weekly_has_seven_days() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today(&client, &server.base_url).await;
    let increased: TodayResponse = client
        .post(format!("{}/api/drink-amount", server.base_url))
        .json(&serde_json::json!({ "action": "increase" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(increased.drink_amount_ml, before.drink_amount_ml + 20);

    let bad = client
        .post(format!("{}/api/drink-amount", server.base_url))
        .json(&serde_json::json!({ "action": "sideways" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    client
        .post(format!("{}/api/drink-amount", server.base_url))
        .json(&serde_json::json!({ "action": "decrease" }))
        .send()
        .await
        .unwrap();

    let weekly: WeeklyResponse = client
        .get(format!("{}/api/weekly", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(weekly.days.len(), 7);

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Water Intake Tracker"));
}

#[tokio::test]
async fn http_page_bridge_reports_and_polls() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let reported = client
        .post(format!("{}/api/permission", server.base_url))
        .json(&serde_json::json!({ "permission": "granted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(reported.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        today(&client, &server.base_url).await.notification_permission,
        "granted"
    );

    let unknown_permission = client
        .post(format!("{}/api/permission", server.base_url))
        .json(&serde_json::json!({ "permission": "sometimes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown_permission.status(), StatusCode::BAD_REQUEST);

    let pending: PendingResponse = client
        .get(format!("{}/api/pending", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.notifications.is_empty());
    assert!(pending.prompts.is_empty());

    let no_notification = client
        .post(format!("{}/api/notifications/99", server.base_url))
        .json(&serde_json::json!({ "interaction": "click" }))
        .send()
        .await
        .unwrap();
    assert_eq!(no_notification.status(), StatusCode::NOT_FOUND);

    let no_prompt = client
        .post(format!("{}/api/prompts/99", server.base_url))
        .json(&serde_json::json!({ "accepted": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(no_prompt.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_install_events_drive_installable() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let post_event = |event: &'static str| {
        client
            .post(format!("{}/api/install", server.base_url))
            .json(&serde_json::json!({ "event": event }))
            .send()
    };

    let bogus = post_event("bogus").await.unwrap();
    assert_eq!(bogus.status(), StatusCode::BAD_REQUEST);

    assert!(post_event("available").await.unwrap().status().is_success());
    assert!(today(&client, &server.base_url).await.installable);

    assert!(post_event("dismissed").await.unwrap().status().is_success());
    assert!(today(&client, &server.base_url).await.installable);

    assert!(post_event("accepted").await.unwrap().status().is_success());
    assert!(!today(&client, &server.base_url).await.installable);

    assert!(post_event("available").await.unwrap().status().is_success());
    assert!(post_event("installed").await.unwrap().status().is_success());
    assert!(!today(&client, &server.base_url).await.installable);
}
