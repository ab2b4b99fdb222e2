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

//! The server-side invocation stub.
//!
//! [`invoke`] is the decode -> execute -> encode routine the typed
//! registration path erases every method to. Its error trap is total: by the
//! time a request reaches a stub the transport is committed to producing a
//! reply, so every failure (frame errors from decoding or encoding, domain
//! errors from the body, even panics) is rewritten into an error reply
//! carrying the `"error"` key and a best-effort `"backtrace"`. Should the
//! rewrite itself fail, the process terminates rather than hand the
//! transport a half-written frame.

use super::backtrace;
use crate::frame::{Frame, FrameError, BACKTRACE_KEY, ERROR_KEY};
use crate::method::{Method, MethodError};
use crate::message::{MessageReader, MessageWriter};
use crate::wire::{Args, Returns};
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::error;

/// What the un-trapped part of a stub can raise.
#[derive(Debug, Error)]
enum StubError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Method(#[from] MethodError),
}

/// Runs the method body for `M` against a request/response frame pair.
///
/// Arguments are decoded in declaration order from the request's positional
/// keys; a non-`()` result is encoded under key `"0"` of the response. On
/// any failure the response is cleared and rewritten as an error reply, so
/// the caller can always ship whatever this leaves behind.
///
/// The error texts follow a fixed taxonomy: domain errors travel verbatim,
/// frame errors use their canonical renderings (`bad RPC key <k>`,
/// `RPC type error`, `RPC buffer too small`, `corrupt RPC message: <why>`),
/// and panics become `caught unknown exception`.
pub fn invoke<M, F>(body: &F, request: &Frame, response: &mut Frame)
where
    M: Method,
    F: Fn(M::Args) -> Result<M::Output, MethodError>,
{
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        run::<M, F>(body, request, &mut *response)
    }));

    let failure = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err.to_string(),
        Err(_panic) => "caught unknown exception".to_string(),
    };

    error!(
        method = request.method(),
        error = failure.as_str(),
        "RPC method failed"
    );
    write_error_frame(response, &failure);
    if let Some(symbols) = backtrace::capture() {
        // Best effort only: on failure the key stays absent, the frame is
        // never left inconsistent.
        let _ = response.set_string_array(BACKTRACE_KEY, symbols);
    }
}

fn run<M, F>(body: &F, request: &Frame, response: &mut Frame) -> Result<(), StubError>
where
    M: Method,
    F: Fn(M::Args) -> Result<M::Output, MethodError>,
{
    let mut query = MessageReader::new(request);
    let args = M::Args::decode(&mut query)?;

    let result = body(args)?;

    let mut reply = MessageWriter::new(response);
    result.encode(&mut reply)?;
    Ok(())
}

/// Clears `response` and rewrites it as an error reply.
///
/// The response must reach the wire carrying *only* the error description,
/// no leftover positional keys from a partial write. If even this minimal
/// write fails the process aborts: the transport has committed to a reply
/// and a broken one is worse than none.
pub(crate) fn write_error_frame(response: &mut Frame, message: &str) {
    response.clear();
    if let Err(err) = response.set_string(ERROR_KEY, message) {
        error!(%err, "could not write RPC error reply; aborting");
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;

    struct Scale;

    impl Method for Scale {
        const MODULE: &'static str = "test";
        const NAME: &'static str = "Scale";
        type Args = (u32, Vec<u32>);
        type Output = Vec<u32>;
    }

    struct Reset;

    impl Method for Reset {
        const MODULE: &'static str = "test";
        const NAME: &'static str = "Reset";
        type Args = ();
        type Output = ();
    }

    fn scale(args: (u32, Vec<u32>)) -> Result<Vec<u32>, MethodError> {
        let (factor, words) = args;
        Ok(words.into_iter().map(|w| w * factor).collect())
    }

    fn request_for_scale(factor: u32, words: Vec<u32>) -> Frame {
        let mut request = Frame::request("test.Scale", 0);
        let mut writer = MessageWriter::new(&mut request);
        writer.push(factor).unwrap();
        writer.push(words).unwrap();
        request
    }

    #[test]
    fn test_success_encodes_result_under_key_zero() {
        let request = request_for_scale(3, vec![1, 2]);
        let mut response = Frame::reply();
        invoke::<Scale, _>(&scale, &request, &mut response);

        assert!(!response.key_exists(ERROR_KEY));
        assert_eq!(response.get_word_array("0").unwrap(), &[3, 6]);
        assert_eq!(response.len(), 1);
    }

    #[test]
    fn test_unit_return_emits_no_keys_at_all() {
        let request = Frame::request("test.Reset", 0);
        let mut response = Frame::reply();
        invoke::<Reset, _>(&|()| Ok(()), &request, &mut response);

        assert!(!response.key_exists(ERROR_KEY));
        assert!(response.is_empty());
    }

    #[test]
    fn test_domain_error_text_travels_verbatim() {
        let request = Frame::request("test.Reset", 0);
        let mut response = Frame::reply();
        invoke::<Reset, _>(
            &|()| Err(MethodError::new("read memsvc error: EIO")),
            &request,
            &mut response,
        );

        assert_eq!(
            response.get_string(ERROR_KEY).unwrap(),
            "read memsvc error: EIO"
        );
        // Backtrace is best-effort but on a hosted target it is there.
        assert!(response.key_exists(BACKTRACE_KEY));
    }

    #[test]
    fn test_missing_argument_reports_bad_key() {
        let mut request = Frame::request("test.Scale", 0);
        let mut writer = MessageWriter::new(&mut request);
        writer.push(3u32).unwrap(); // second argument never written

        let mut response = Frame::reply();
        invoke::<Scale, _>(&scale, &request, &mut response);
        assert_eq!(response.get_string(ERROR_KEY).unwrap(), "bad RPC key 1");
    }

    #[test]
    fn test_mistyped_argument_reports_type_error() {
        let mut request = Frame::request("test.Scale", 0);
        request.set_string("0", "three").unwrap();
        request.set_word_array("1", vec![1]).unwrap();

        let mut response = Frame::reply();
        invoke::<Scale, _>(&scale, &request, &mut response);
        assert_eq!(response.get_string(ERROR_KEY).unwrap(), "RPC type error");
    }

    #[test]
    fn test_oversized_result_reports_buffer_too_small() {
        let request = request_for_scale(1, vec![0xaa; 64]);
        // Too small for the 64-word result, comfortably big enough for the
        // error reply.
        let mut response = Frame::with_capacity("", 0, 128);
        invoke::<Scale, _>(&scale, &request, &mut response);
        assert_eq!(
            response.get_string(ERROR_KEY).unwrap(),
            "RPC buffer too small"
        );
    }

    #[test]
    fn test_panicking_body_reports_unknown_exception() {
        let request = Frame::request("test.Reset", 0);
        let mut response = Frame::reply();
        invoke::<Reset, _>(
            &|()| panic!("handler exploded"),
            &request,
            &mut response,
        );
        assert_eq!(
            response.get_string(ERROR_KEY).unwrap(),
            "caught unknown exception"
        );
    }

    #[test]
    fn test_error_trap_discards_partial_response() {
        // Simulate a handler that wrote positional keys before failing.
        let mut response = Frame::reply();
        response.set_word("0", 1).unwrap();
        response.set_word("1", 2).unwrap();

        write_error_frame(&mut response, "late failure");
        assert_eq!(response.len(), 1);
        assert_eq!(response.get_string(ERROR_KEY).unwrap(), "late failure");
        assert!(!response.key_exists("0"));
        assert!(!response.key_exists("1"));
    }
}
