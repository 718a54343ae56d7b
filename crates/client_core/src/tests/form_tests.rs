use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::Contact;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

use crate::ContactStore;

async fn spawn_api(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn mike() -> Contact {
    Contact {
        id: ContactId(1),
        first_name: "Mike".to_string(),
        last_name: "Anamendolla".to_string(),
        email: "mike.ana@example.com".to_string(),
        phone: "(870) 288-4149".to_string(),
        address: Address {
            address: "5842 Hillcrest Rd".to_string(),
            city: "Anytown".to_string(),
        },
        image: None,
    }
}

async fn seeded_store(base_url: String, contacts: Vec<Contact>) -> Arc<ContactStore> {
    let store = ContactStore::new(base_url);
    store.inner.lock().await.contacts = contacts;
    store
}

fn filled_create_form() -> ContactForm {
    let mut form = ContactForm::create();
    form.set_field(DraftField::FirstName, "Ana");
    form.set_field(DraftField::LastName, "B");
    form.set_field(DraftField::Email, "a@b.com");
    form.set_field(DraftField::Phone, "123");
    form.set_field(DraftField::Address, "5 Elm St");
    form
}

#[derive(Clone)]
struct CountingState {
    hits: Arc<AtomicUsize>,
}

async fn count_hit(State(state): State<CountingState>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::OK
}

#[tokio::test]
async fn blank_required_field_aborts_before_any_network_call() {
    let hits = Arc::new(AtomicUsize::new(0));
    let state = CountingState { hits: hits.clone() };
    let app = Router::new()
        .route("/add", post(count_hit))
        .route("/:id", put(count_hit))
        .with_state(state);
    let base_url = spawn_api(app).await;
    let store = ContactStore::new(base_url);

    let mut form = filled_create_form();
    form.set_field(DraftField::FirstName, "");

    let outcome = form.submit(&store).await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(ValidationError {
            message: REQUIRED_FIELDS_MESSAGE.to_string(),
        })
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    // Validation failures never touch the store's error slot.
    assert_eq!(store.last_error().await, None);
    assert_eq!(form.phase(), FormPhase::Empty);
}

#[tokio::test]
async fn whitespace_only_required_field_is_rejected() {
    let store = ContactStore::new("http://127.0.0.1:1");
    let mut form = filled_create_form();
    form.set_field(DraftField::Phone, "   ");

    assert!(matches!(
        form.submit(&store).await,
        SubmitOutcome::Rejected(_)
    ));
}

#[derive(Clone)]
struct CaptureState {
    tx: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
}

async fn capture_add(State(state): State<CaptureState>, Json(payload): Json<Value>) -> Json<Value> {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(payload.clone());
    }
    let mut created = payload;
    created["id"] = json!(11);
    Json(created)
}

async fn capture_update(
    State(state): State<CaptureState>,
    Path(id): Path<i64>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(json!({"id": id, "body": payload}));
    }
    Json(json!({"phone": "999"}))
}

fn capture_channel() -> (CaptureState, oneshot::Receiver<Value>) {
    let (tx, rx) = oneshot::channel();
    (
        CaptureState {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        rx,
    )
}

#[tokio::test]
async fn create_submit_wraps_street_with_placeholder_city() {
    let (state, payload_rx) = capture_channel();
    let app = Router::new().route("/add", post(capture_add)).with_state(state);
    let base_url = spawn_api(app).await;
    let store = ContactStore::new(base_url);

    let mut form = filled_create_form();
    let outcome = form.submit(&store).await;

    assert_eq!(outcome, SubmitOutcome::Saved);
    assert_eq!(form.phase(), FormPhase::Succeeded);

    let payload = payload_rx.await.expect("posted payload");
    assert_eq!(payload["firstName"], "Ana");
    assert_eq!(payload["address"]["address"], "5 Elm St");
    assert_eq!(payload["address"]["city"], DRAFT_CITY_PLACEHOLDER);
    assert_eq!(payload.get("id"), None);

    // The saved contact was prepended to the store's collection.
    assert_eq!(store.contacts().await[0].id, ContactId(11));
}

#[tokio::test]
async fn edit_submit_targets_the_update_endpoint() {
    let (state, payload_rx) = capture_channel();
    let app = Router::new()
        .route("/:id", put(capture_update))
        .with_state(state);
    let base_url = spawn_api(app).await;
    let store = seeded_store(base_url, vec![mike()]).await;

    let mut form = ContactForm::edit(ContactId(1));
    form.sync_from_store(&store).await;
    form.set_field(DraftField::Phone, "999");

    assert_eq!(form.submit(&store).await, SubmitOutcome::Saved);

    let captured = payload_rx.await.expect("put payload");
    assert_eq!(captured["id"], 1);
    assert_eq!(captured["body"]["phone"], "999");
    assert_eq!(captured["body"]["firstName"], "Mike");
}

#[tokio::test]
async fn sync_from_store_populates_draft_on_lookup_hit() {
    let store = seeded_store("http://127.0.0.1:1".to_string(), vec![mike()]).await;
    let mut form = ContactForm::edit(ContactId(1));

    form.sync_from_store(&store).await;

    assert_eq!(form.phase(), FormPhase::Populated);
    let draft = form.draft();
    assert_eq!(draft.first_name, "Mike");
    assert_eq!(draft.email, "mike.ana@example.com");
    // The nested address is flattened to its street line.
    assert_eq!(draft.address, "5842 Hillcrest Rd");
}

#[tokio::test]
async fn sync_from_store_miss_leaves_draft_at_defaults() {
    let store = seeded_store("http://127.0.0.1:1".to_string(), Vec::new()).await;
    let mut form = ContactForm::edit(ContactId(99));

    form.sync_from_store(&store).await;

    assert_eq!(form.phase(), FormPhase::Empty);
    assert_eq!(form.draft(), &ContactDraft::default());

    // A later call can still populate once the collection loads.
    store.inner.lock().await.contacts = vec![Contact {
        id: ContactId(99),
        ..mike()
    }];
    form.sync_from_store(&store).await;
    assert_eq!(form.phase(), FormPhase::Populated);
    assert_eq!(form.draft().first_name, "Mike");
}

#[tokio::test]
async fn sync_from_store_is_a_noop_in_create_mode() {
    let store = seeded_store("http://127.0.0.1:1".to_string(), vec![mike()]).await;
    let mut form = ContactForm::create();

    form.sync_from_store(&store).await;

    assert_eq!(form.phase(), FormPhase::Empty);
    assert_eq!(form.draft(), &ContactDraft::default());
}

#[tokio::test]
async fn failed_submit_restores_phase_for_retry() {
    let app = Router::new().route(
        "/:id",
        put(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base_url = spawn_api(app).await;
    let store = seeded_store(base_url, vec![mike()]).await;

    let mut form = ContactForm::edit(ContactId(1));
    form.sync_from_store(&store).await;

    assert_eq!(form.submit(&store).await, SubmitOutcome::Failed);

    assert_eq!(form.phase(), FormPhase::Populated);
    assert_eq!(
        store.last_error().await,
        Some(crate::UPDATE_FAILED_ERROR.to_string())
    );
    // The draft survives for resubmission.
    assert_eq!(form.draft().first_name, "Mike");
}

#[tokio::test]
async fn street_line_is_not_required() {
    let (state, payload_rx) = capture_channel();
    let app = Router::new().route("/add", post(capture_add)).with_state(state);
    let base_url = spawn_api(app).await;
    let store = ContactStore::new(base_url);

    let mut form = filled_create_form();
    form.set_field(DraftField::Address, "");

    assert_eq!(form.submit(&store).await, SubmitOutcome::Saved);
    let payload = payload_rx.await.expect("posted payload");
    assert_eq!(payload["address"]["address"], "");
    assert_eq!(payload["address"]["city"], DRAFT_CITY_PLACEHOLDER);
}
