//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the object, file
//! and script operations over real HTTP through `UreqExecutor`. Validates
//! that request building, the transport and response interpretation agree
//! with an actual server end-to-end.

use std::net::SocketAddr;
use std::sync::{mpsc, Arc};

use ncmb_core::{
    Acl, HttpMethod, NcmbClient, NcmbConfig, NcmbFile, NcmbObject, NcmbScript, ParamValue,
    ScriptParams, UreqExecutor,
};
use serde_json::{json, Value};

/// Spawn the mock server on its own runtime thread and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> NcmbClient {
    let base = format!("http://{addr}");
    let config = NcmbConfig::new("app-key", "client-key")
        .with_endpoint(&base)
        .with_script_endpoint(&base);
    NcmbClient::with_executor(config, Arc::new(UreqExecutor::new()))
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[test]
fn object_lifecycle() {
    let client = client(start_server());

    // Step 1: save a new object.
    let mut object = NcmbObject::new("TestClass");
    object.set("name", "takanokun");
    object.set("age", 29);
    object.set("objectId", "ignored"); // reserved, no-op
    let created = json_body(&client.save_object(&object).wait().unwrap().body);
    let id = created["objectId"].as_str().unwrap().to_string();
    object.set_object_id(Some(&id));

    // Step 2: fetch it back.
    let fetched = json_body(&client.fetch_object(&object).wait().unwrap().body);
    assert_eq!(fetched["name"], "takanokun");
    assert_eq!(fetched["age"], 29);
    assert_eq!(fetched["objectId"], id.as_str());

    // Step 3: update one field; saving an object with an id is a PUT.
    object.set("age", 30);
    let updated = json_body(&client.save_object(&object).wait().unwrap().body);
    assert!(updated["updateDate"].is_string());
    let fetched = json_body(&client.fetch_object(&object).wait().unwrap().body);
    assert_eq!(fetched["age"], 30);

    // Step 4: find within the class.
    let mut queries = std::collections::BTreeMap::new();
    queries.insert("limit".to_string(), ParamValue::from("10"));
    let found = json_body(&client.find_objects("TestClass", &queries).wait().unwrap().body);
    assert_eq!(found["results"].as_array().unwrap().len(), 1);

    // Step 5: delete, then fetch reports not found with the backend code.
    client.delete_object(&object).wait().unwrap();
    let err = client.fetch_object(&object).wait().unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert_eq!(err.code(), Some("E404001"));
}

#[test]
fn file_lifecycle() {
    let client = client(start_server());

    let mut file = NcmbFile::new("hello.txt");
    file.set_mime_type("text/plain");
    file.set_acl(Acl::public_read_write());

    client.save_file(&file, b"hello, world".to_vec()).wait().unwrap();

    // Same name twice is a duplicate on the backend.
    let err = client.save_file(&file, b"again".to_vec()).wait().unwrap_err();
    assert_eq!(err.code(), Some("E409001"));

    let data = client.fetch_file(&file).wait().unwrap();
    assert_eq!(data, b"hello, world");

    let mut acl = Acl::empty();
    acl.put("user1", true, false);
    file.set_acl(acl);
    client.update_file(&file).wait().unwrap();

    client.delete_file(&file).wait().unwrap();
    let err = client.fetch_file(&file).wait().unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn script_round_trip() {
    let client = client(start_server());

    let script = NcmbScript::new("myScript.js", HttpMethod::Post);
    let params = ScriptParams::new()
        .header("X-Custom", "value1")
        .header("X-Skipped", ParamValue::Absent)
        .query("piyo", ParamValue::Null)
        .body_value("age", 29)
        .body_value("job", Value::Null);
    let payload = client.execute_script(&script, params).wait().unwrap().unwrap();
    let echoed = json_body(&payload);

    assert_eq!(echoed["script"], "myScript.js");
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["query"], "piyo");
    assert_eq!(echoed["headers"]["x-custom"], "value1");
    assert!(echoed["headers"].get("x-skipped").is_none());
    assert_eq!(echoed["headers"]["x-ncmb-application-key"], "app-key");
    assert_eq!(echoed["body"], json!({"age": 29, "job": null}));
}

#[test]
fn background_form_matches_blocking_form() {
    let client = client(start_server());

    let mut file = NcmbFile::new("bg.txt");
    file.set_mime_type("text/plain");
    client.save_file(&file, b"payload".to_vec()).wait().unwrap();

    let blocking = client.fetch_file(&file).wait();
    let (tx, rx) = mpsc::channel();
    client.fetch_file(&file).in_background(move |result| {
        tx.send(result).unwrap();
    });
    let background = rx.recv().unwrap();

    assert_eq!(blocking.unwrap(), background.unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn awaitable_form_against_live_server() {
    let client = client(start_server());

    let mut object = NcmbObject::new("AsyncClass");
    object.set("flag", true);
    let created = json_body(&client.save_object(&object).await.unwrap().body);
    object.set_object_id(created["objectId"].as_str());

    let fetched = json_body(&client.fetch_object(&object).await.unwrap().body);
    assert_eq!(fetched["flag"], true);

    client.delete_object(&object).await.unwrap();
    assert!(client.fetch_object(&object).await.unwrap_err().is_not_found());
}
