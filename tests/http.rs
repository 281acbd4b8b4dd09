use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize, PartialEq)]
struct PlantStatus {
    watered: bool,
    fertilized: bool,
    harvested: bool,
}

#[derive(Debug, Deserialize)]
struct Plant {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    age: u32,
    status: BTreeMap<String, PlantStatus>,
}

#[derive(Debug, Deserialize)]
struct CartView {
    total: u64,
    item_count: u64,
}

#[derive(Debug, Deserialize)]
struct Order {
    id: String,
    total: u64,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    is_authenticated: bool,
    user: Option<serde_json::Value>,
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

fn unique_path(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("gardenary_http_{label}_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/plants")).send().await {
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
    // Nothing listens here; the remote API is never reached in these tests.
    let api_port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_gardenary"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_path("data"))
        .env("APP_STORAGE_PATH", unique_path("storage"))
        .env("GARDEN_API_URL", format!("http://127.0.0.1:{api_port}"))
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

async fn add_plant(client: &Client, base_url: &str, name: &str, kind: &str) -> Plant {
    let response = client
        .post(format!("{base_url}/api/plants"))
        .json(&serde_json::json!({ "name": name, "type": kind }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn toggle(client: &Client, base_url: &str, id: u64, field: &str) -> PlantStatus {
    client
        .post(format!("{base_url}/api/plants/{id}/toggle"))
        .json(&serde_json::json!({ "field": field }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_add_plant_seeds_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let plant = add_plant(&client, &server.base_url, "Mint", "Herb").await;
    assert_eq!(plant.name, "Mint");
    assert_eq!(plant.kind, "Herb");
    assert_eq!(plant.age, 0);
    assert_eq!(plant.status.len(), 1);
    let today = plant.status.values().next().unwrap();
    assert_eq!(
        today,
        &PlantStatus {
            watered: false,
            fertilized: false,
            harvested: false
        }
    );

    let plants: Vec<Plant> = client
        .get(format!("{}/api/plants", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(plants.iter().any(|p| p.id == plant.id));
}

#[tokio::test]
async fn http_toggle_flips_one_flag_and_back() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let plant = add_plant(&client, &server.base_url, "Paprika", "Vegetable").await;

    let once = toggle(&client, &server.base_url, plant.id, "watered").await;
    assert!(once.watered);
    assert!(!once.fertilized);
    assert!(!once.harvested);

    let twice = toggle(&client, &server.base_url, plant.id, "watered").await;
    assert!(!twice.watered);

    let missing = client
        .post(format!("{}/api/plants/999999/toggle", server.base_url))
        .json(&serde_json::json!({ "field": "watered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_blank_plant_name_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/plants", server.base_url))
        .json(&serde_json::json!({ "name": "  ", "type": "Herb" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let form = client
        .post(format!("{}/add", server.base_url))
        .form(&[("name", ""), ("type", "Herb")])
        .send()
        .await
        .unwrap();
    assert_eq!(form.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(form.text().await.unwrap().contains("Name required"));
}

#[tokio::test]
async fn http_cart_and_checkout() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    for _ in 0..2 {
        let response = client
            .post(format!("{}/cart/add/1", server.base_url))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    let cart: CartView = client
        .get(format!("{}/api/cart", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.total, 50_000);

    let incomplete = client
        .post(format!("{}/checkout", server.base_url))
        .form(&[("name", "Sari"), ("email", ""), ("address", ""), ("phone", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(incomplete.status(), reqwest::StatusCode::BAD_REQUEST);

    let placed = client
        .post(format!("{}/checkout", server.base_url))
        .form(&[
            ("name", "Sari"),
            ("email", "sari@example.com"),
            ("address", "Jl. Merdeka 1"),
            ("phone", "0812"),
        ])
        .send()
        .await
        .unwrap();
    assert!(placed.status().is_success());
    assert_eq!(placed.url().path(), "/my-orders");

    let orders: Vec<Order> = client
        .get(format!("{}/api/orders", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order = orders.last().expect("order recorded");
    assert!(order.id.starts_with("ORD-"));
    assert_eq!(order.total, 50_000);
    assert_eq!(order.status, "pending");

    let detail = client
        .get(format!("{}/my-orders/{}", server.base_url, order.id))
        .send()
        .await
        .unwrap();
    assert!(detail.status().is_success());
    assert!(detail.text().await.unwrap().contains(r#"<li class="step current">pending</li>"#));

    let unknown = client
        .get(format!("{}/my-orders/ORD-0000-000000", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);

    let cart: CartView = client
        .get(format!("{}/api/cart", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart.item_count, 0);
}

#[tokio::test]
async fn http_anonymous_session_is_guarded() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let session: Session = client
        .get(format!("{}/api/session", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!session.is_authenticated);
    assert!(session.user.is_none());

    let tasks = client
        .get(format!("{}/tasks", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(tasks.url().path(), "/login");
}
