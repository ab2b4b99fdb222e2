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

//! Demo client: reads ten words from the demo region of a running `tdrpcd`.
//!
//! ```text
//! rpc-client [host]    # default localhost
//! ```

use std::env;
use tdrpc::client::Connection;
use tdrpc::error::RpcError;
use tdrpc_modules::memory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let host = env::args().nth(1).unwrap_or_else(|| "localhost".to_string());

    let mut conn = Connection::connect(&host).await?;
    conn.load_module("memory", memory::MODULE_VERSION_KEY).await?;

    match conn.call::<memory::Read>((0x6640_0000, 10)).await {
        Ok(words) => {
            let rendered: Vec<String> = words.iter().map(|w| format!("{w:08x}")).collect();
            println!("{}", rendered.join(" "));
        }
        Err(RpcError::Remote(err)) => {
            eprintln!("remote failure: {}", err.message());
            for symbol in err.backtrace() {
                eprintln!("    {symbol}");
            }
            std::process::exit(1);
        }
        Err(other) => return Err(other.into()),
    }

    Ok(())
}
