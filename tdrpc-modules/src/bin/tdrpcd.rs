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

//! Demo RPC daemon: serves the `memory` module over TCP.
//!
//! ```text
//! tdrpcd [listen-address]    # default 0.0.0.0:9090
//! ```

use std::env;
use std::sync::Arc;
use tdrpc::server::RpcServer;
use tdrpc::transport::TcpListener;
use tdrpc_modules::memory::{MemoryModule, RegisterBank};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let listen = env::args()
        .nth(1)
        .unwrap_or_else(|| format!("0.0.0.0:{}", tdrpc::client::DEFAULT_PORT));

    // Seed a small demo region so rpc-client has something to read.
    let bank = Arc::new(RegisterBank::new());
    bank.map_region(
        0x6640_0000,
        &[
            0xdead_beef,
            0xcafe_f00d,
            0x0000_0001,
            0x0000_0002,
            0x0000_0003,
            0x0000_0004,
            0x0000_0005,
            0x0000_0006,
            0x0000_0007,
            0x0000_0008,
        ],
    );
    info!("demo region mapped at 0x66400000");

    let server = RpcServer::builder()
        .module(&MemoryModule::new(bank))?
        .build();
    let listener = TcpListener::bind(&listen).await?;
    server.serve(listener).await?;
    Ok(())
}
