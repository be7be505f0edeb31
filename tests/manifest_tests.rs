#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Manifest policy tests.
//!
//! Library code must not panic, so the clippy deny list has to stay in
//! `Cargo.toml`, and the feature graph must keep the WebSocket transport
//! on by default and tied to the tokio runtime.

use std::path::PathBuf;

use toml::Table;

fn manifest() -> Table {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read '{}': {e}", path.display()));
    toml::from_str::<Table>(&raw).expect("Cargo.toml is valid TOML")
}

fn string_list(value: &toml::Value) -> Vec<&str> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|v| v.as_str().expect("string"))
        .collect()
}

#[test]
fn panicking_lints_are_denied() {
    let manifest = manifest();
    let clippy = manifest["lints"]["clippy"]
        .as_table()
        .expect("[lints.clippy] table");
    for lint in [
        "unwrap_used",
        "expect_used",
        "panic",
        "todo",
        "unimplemented",
        "indexing_slicing",
    ] {
        assert_eq!(
            clippy.get(lint).and_then(|v| v.as_str()),
            Some("deny"),
            "clippy::{lint} must be denied"
        );
    }
}

#[test]
fn websocket_transport_is_default_and_needs_runtime() {
    let manifest = manifest();
    let features = manifest["features"].as_table().expect("[features] table");

    assert_eq!(
        string_list(&features["default"]),
        vec!["transport-websocket"]
    );
    let websocket = string_list(&features["transport-websocket"]);
    assert!(websocket.contains(&"tokio-runtime"));
    assert!(websocket.contains(&"dep:tokio-tungstenite"));
    assert!(string_list(&features["tokio-runtime"]).contains(&"tokio/time"));
}

#[test]
fn websocket_dependencies_are_optional() {
    let manifest = manifest();
    let deps = manifest["dependencies"].as_table().expect("[dependencies]");
    for name in ["tokio-tungstenite", "futures-util"] {
        assert_eq!(
            deps[name].get("optional").and_then(|v| v.as_bool()),
            Some(true),
            "{name} must be optional"
        );
    }
}

#[test]
fn demos_point_at_existing_files() {
    let manifest = manifest();
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let demos = manifest["example"].as_array().expect("[[example]] entries");
    assert!(!demos.is_empty());
    for demo in demos {
        let path = demo["path"].as_str().expect("example path");
        assert!(root.join(path).is_file(), "missing demo file {path}");
    }
}
