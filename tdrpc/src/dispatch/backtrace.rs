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

//! Best-effort symbolic backtrace capture for error replies.
//!
//! Capture is advisory: correctness of the call protocol never depends on
//! it. On targets without backtrace support, or when no frame yields a
//! symbol line, the reply simply omits the `"backtrace"` key.

use std::backtrace::{Backtrace, BacktraceStatus};

/// Upper bound on captured frames shipped to the caller.
const MAX_FRAMES: usize = 30;

/// Captures up to [`MAX_FRAMES`] symbol names for the current call stack.
///
/// Returns `None` when the platform cannot produce a backtrace or nothing
/// symbolic was recovered.
pub(crate) fn capture() -> Option<Vec<String>> {
    // force_capture: the error trap wants a trace regardless of the
    // RUST_BACKTRACE environment.
    let captured = Backtrace::force_capture();
    if !matches!(captured.status(), BacktraceStatus::Captured) {
        return None;
    }

    let rendered = captured.to_string();
    let mut symbols = Vec::new();
    for line in rendered.lines() {
        // Frame lines render as `N: symbol`; the interleaved
        // `at file:line` location lines do not carry a frame index.
        let Some((index, symbol)) = line.trim().split_once(": ") else {
            continue;
        };
        if index.parse::<u32>().is_err() {
            continue;
        }
        symbols.push(symbol.to_string());
        if symbols.len() == MAX_FRAMES {
            break;
        }
    }

    if symbols.is_empty() {
        None
    } else {
        Some(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_is_bounded() {
        if let Some(symbols) = capture() {
            assert!(!symbols.is_empty());
            assert!(symbols.len() <= MAX_FRAMES);
            // Symbol lines, not location lines.
            assert!(symbols.iter().all(|s| !s.starts_with("at ")));
        }
    }
}
