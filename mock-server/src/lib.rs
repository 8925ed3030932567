//! In-memory stand-in for the mobile backend REST API.
//!
//! Serves the object, file and script roots under any API version segment
//! and answers failures with the backend's `{"code","error"}` envelope.

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Multipart, Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const FIXED_DATE: &str = "2013-09-01T00:00:00.000Z";

#[derive(Clone, Debug)]
pub struct StoredFile {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub acl: Value,
}

#[derive(Default, Debug)]
pub struct Store {
    pub objects: HashMap<(String, String), Map<String, Value>>,
    pub files: HashMap<String, StoredFile>,
}

pub type Db = Arc<RwLock<Store>>;

/// Backend error envelope.
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub error: &'static str,
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            code: "E404001",
            error: "No data available.",
        }),
    )
        .into_response()
}

fn bad_request(error: &'static str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            code: "E400001",
            error,
        }),
    )
        .into_response()
}

fn duplicate() -> Response {
    (
        StatusCode::CONFLICT,
        Json(ErrorBody {
            code: "E409001",
            error: "Duplication Error.",
        }),
    )
        .into_response()
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/{version}/classes/{class}", post(create_object).get(find_objects))
        .route(
            "/{version}/classes/{class}/{id}",
            get(get_object).put(update_object).delete(delete_object),
        )
        .route(
            "/{version}/files/{name}",
            post(upload_file)
                .get(download_file)
                .put(update_file)
                .delete(delete_file),
        )
        .route("/{version}/script/{name}", any(run_script))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn create_object(
    State(db): State<Db>,
    Path((_version, class)): Path<(String, String)>,
    Json(mut input): Json<Map<String, Value>>,
) -> Response {
    let id = Uuid::new_v4().simple().to_string();
    input.insert("objectId".to_string(), json!(id));
    input.insert("createDate".to_string(), json!(FIXED_DATE));
    db.write().await.objects.insert((class, id.clone()), input);
    (
        StatusCode::CREATED,
        Json(json!({"objectId": id, "createDate": FIXED_DATE})),
    )
        .into_response()
}

async fn find_objects(
    State(db): State<Db>,
    Path((_version, class)): Path<(String, String)>,
) -> Json<Value> {
    let store = db.read().await;
    let results: Vec<Value> = store
        .objects
        .iter()
        .filter(|((c, _), _)| *c == class)
        .map(|(_, fields)| Value::Object(fields.clone()))
        .collect();
    Json(json!({ "results": results }))
}

async fn get_object(
    State(db): State<Db>,
    Path((_version, class, id)): Path<(String, String, String)>,
) -> Response {
    let store = db.read().await;
    match store.objects.get(&(class, id)) {
        Some(fields) => Json(Value::Object(fields.clone())).into_response(),
        None => not_found(),
    }
}

async fn update_object(
    State(db): State<Db>,
    Path((_version, class, id)): Path<(String, String, String)>,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    let mut store = db.write().await;
    let Some(fields) = store.objects.get_mut(&(class, id)) else {
        return not_found();
    };
    fields.extend(input);
    fields.insert("updateDate".to_string(), json!(FIXED_DATE));
    Json(json!({"updateDate": FIXED_DATE})).into_response()
}

async fn delete_object(
    State(db): State<Db>,
    Path((_version, class, id)): Path<(String, String, String)>,
) -> Response {
    let mut store = db.write().await;
    match store.objects.remove(&(class, id)) {
        Some(_) => StatusCode::OK.into_response(),
        None => not_found(),
    }
}

async fn upload_file(
    State(db): State<Db>,
    Path((_version, name)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Response {
    let mut file = StoredFile {
        data: Vec::new(),
        mime_type: "application/octet-stream".to_string(),
        acl: json!({}),
    };
    let mut has_file = false;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return err.into_response(),
        };
        let part_name = field.name().map(str::to_string);
        match part_name.as_deref() {
            Some("file") => {
                if let Some(mime_type) = field.content_type() {
                    file.mime_type = mime_type.to_string();
                }
                match field.bytes().await {
                    Ok(bytes) => file.data = bytes.to_vec(),
                    Err(err) => return err.into_response(),
                }
                has_file = true;
            }
            Some("acl") => match field.bytes().await {
                Ok(bytes) => match serde_json::from_slice(&bytes) {
                    Ok(acl) => file.acl = acl,
                    Err(_) => return bad_request("Invalid format."),
                },
                Err(err) => return err.into_response(),
            },
            _ => {}
        }
    }
    if !has_file {
        return bad_request("Missing file part.");
    }

    let mut store = db.write().await;
    if store.files.contains_key(&name) {
        return duplicate();
    }
    store.files.insert(name.clone(), file);
    (
        StatusCode::CREATED,
        Json(json!({"fileName": name, "createDate": FIXED_DATE})),
    )
        .into_response()
}

async fn download_file(
    State(db): State<Db>,
    Path((_version, name)): Path<(String, String)>,
) -> Response {
    let store = db.read().await;
    match store.files.get(&name) {
        Some(file) => (
            [(header::CONTENT_TYPE, file.mime_type.clone())],
            file.data.clone(),
        )
            .into_response(),
        None => not_found(),
    }
}

async fn update_file(
    State(db): State<Db>,
    Path((_version, name)): Path<(String, String)>,
    Json(input): Json<Map<String, Value>>,
) -> Response {
    let mut store = db.write().await;
    let Some(file) = store.files.get_mut(&name) else {
        return not_found();
    };
    if let Some(acl) = input.get("acl") {
        file.acl = acl.clone();
    }
    Json(json!({"updateDate": FIXED_DATE})).into_response()
}

async fn delete_file(
    State(db): State<Db>,
    Path((_version, name)): Path<(String, String)>,
) -> Response {
    let mut store = db.write().await;
    match store.files.remove(&name) {
        Some(_) => StatusCode::OK.into_response(),
        None => not_found(),
    }
}

/// Echo the invocation back so callers can see what reached the script.
async fn run_script(
    Path((_version, name)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let body = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(_) => return bad_request("Invalid format."),
        }
    };
    let echoed_headers: Map<String, Value> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), json!(value)))
        })
        .collect();
    Json(json!({
        "script": name,
        "method": method.as_str(),
        "query": query,
        "headers": echoed_headers,
        "body": body,
    }))
    .into_response()
}
