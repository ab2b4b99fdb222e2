//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! End-to-end round-trip tests: typed client calls against a live server
//! over an in-memory transport.

use tdrpc::client::Connection;
use tdrpc::dispatch::{Module, Registry, RegistrationError};
use tdrpc::method::{Method, MethodError};
use tdrpc::server::RpcServer;
use tdrpc::transport::MemoryTransport;

struct Scale;

impl Method for Scale {
    const MODULE: &'static str = "math";
    const NAME: &'static str = "Scale";
    type Args = (u32, Vec<u32>);
    type Output = Vec<u32>;
}

struct Join;

impl Method for Join {
    const MODULE: &'static str = "math";
    const NAME: &'static str = "Join";
    type Args = (Vec<String>, String);
    type Output = String;
}

struct Reset;

impl Method for Reset {
    const MODULE: &'static str = "math";
    const NAME: &'static str = "Reset";
    type Args = ();
    type Output = ();
}

struct MathModule;

impl Module for MathModule {
    fn name(&self) -> &str {
        "math"
    }

    fn version_key(&self) -> &str {
        "math v0.2.0"
    }

    fn init(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
        registry.register::<Scale, _>(|(factor, words)| {
            words
                .into_iter()
                .map(|word| {
                    word.checked_mul(factor)
                        .ok_or_else(|| MethodError::new("scale overflow"))
                })
                .collect()
        })?;
        registry.register::<Join, _>(|(parts, separator)| Ok(parts.join(&separator)))?;
        registry.register::<Reset, _>(|()| Ok(()))?;
        Ok(())
    }
}

/// Builds a served connection; the server task lives until the client half
/// is dropped.
fn connect() -> Connection<MemoryTransport> {
    let server = RpcServer::builder().module(&MathModule).unwrap().build();
    let (client_io, server_io) = MemoryTransport::pair(64 * 1024);
    tokio::spawn(async move { server.serve_connection(server_io).await });
    Connection::over(client_io)
}

#[tokio::test]
async fn test_vectors_and_words_round_trip() {
    let mut conn = connect();
    let scaled = conn.call::<Scale>((3, vec![1, 2, 4])).await.unwrap();
    assert_eq!(scaled, vec![3, 6, 12]);
}

#[tokio::test]
async fn test_strings_round_trip() {
    let mut conn = connect();
    let joined = conn
        .call::<Join>((
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            "-".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(joined, "a-b-c");
}

#[tokio::test]
async fn test_unit_return_yields_unit() {
    let mut conn = connect();
    conn.call::<Reset>(()).await.unwrap();
}

#[tokio::test]
async fn test_many_calls_share_one_connection() {
    let mut conn = connect();
    for round in 0..32u32 {
        let scaled = conn.call::<Scale>((round, vec![1])).await.unwrap();
        assert_eq!(scaled, vec![round]);
    }
}

#[tokio::test]
async fn test_load_module_handshake() {
    let mut conn = connect();
    conn.load_module("math", "math v0.2.0").await.unwrap();

    let err = conn.load_module("math", "math v9.0.0").await.unwrap_err();
    assert!(err.is_remote());

    let err = conn.load_module("daq", "daq v1").await.unwrap_err();
    match err {
        tdrpc::error::RpcError::Remote(remote) => {
            assert_eq!(remote.message(), "module daq is not loaded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_calls_keep_working_after_a_remote_error() {
    let mut conn = connect();
    // Overflow produces a remote error but must not poison the connection.
    let err = conn.call::<Scale>((2, vec![u32::MAX])).await.unwrap_err();
    assert!(err.is_remote());

    let scaled = conn.call::<Scale>((2, vec![21])).await.unwrap();
    assert_eq!(scaled, vec![42]);
}
