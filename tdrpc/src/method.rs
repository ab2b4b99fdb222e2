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

//! Method declarations: the compile-time signature model.
//!
//! A remote method is declared once, as a type implementing [`Method`]. The
//! declaration fixes the module, the name, the revision, the argument tuple
//! and the return type; both the client call-site
//! ([`Connection::call`](crate::client::Connection::call)) and the server
//! stub ([`Registry::register`](crate::dispatch::Registry::register)) are
//! derived from it by monomorphization, so neither side ever hand-writes
//! wire code and the two sides cannot drift apart without failing to
//! typecheck.
//!
//! # Examples
//!
//! ```rust
//! use tdrpc::method::Method;
//!
//! /// Reads `count` words starting at `address`.
//! struct Read;
//!
//! impl Method for Read {
//!     const MODULE: &'static str = "memory";
//!     const NAME: &'static str = "Read";
//!     const REVISION: u32 = 1;
//!     type Args = (u32, u32);
//!     type Output = Vec<u32>;
//! }
//!
//! assert_eq!(Read::routing_key(), "memory.Read");
//! assert_eq!(Read::signature().args.len(), 2);
//! ```

use crate::frame::WireType;
use crate::wire::{Args, Returns};
use std::fmt;
use thiserror::Error;

/// A remotely callable method, declared as a typed signature.
///
/// `MODULE` and `NAME` form the routing key `"MODULE.NAME"` the server
/// demultiplexes on; `NAME` must not contain `.` (enforced at registration).
/// `REVISION` is stamped on every request frame but never used for matching.
pub trait Method {
    /// The module this method belongs to, e.g. `"memory"`.
    const MODULE: &'static str;

    /// The method name within the module, e.g. `"Read"`.
    const NAME: &'static str;

    /// Interface revision, transmitted verbatim.
    const REVISION: u32 = 0;

    /// The argument tuple, in declaration order.
    type Args: Args;

    /// The return type: one wire type, or `()` for no return keys.
    type Output: Returns;

    /// The routing key stamped on request frames.
    fn routing_key() -> String {
        format!("{}.{}", Self::MODULE, Self::NAME)
    }

    /// The signature as a value, for diagnostics and introspection.
    fn signature() -> Signature {
        Signature {
            module: Self::MODULE,
            name: Self::NAME,
            revision: Self::REVISION,
            args: <Self::Args as Args>::TYPES,
            output: <Self::Output as Returns>::TYPES,
        }
    }
}

/// A method signature reified as data.
///
/// Everything in here is fixed at declaration time; the registry keeps one
/// per typed registration so `Debug` output can show what a server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Module the method belongs to.
    pub module: &'static str,
    /// Method name within the module.
    pub name: &'static str,
    /// Interface revision.
    pub revision: u32,
    /// Argument wire types in declaration order.
    pub args: &'static [WireType],
    /// Return wire types: empty, or exactly one.
    pub output: &'static [WireType],
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.module, self.name)?;
        for (index, ty) in self.args.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, ")")?;
        match self.output {
            [] => Ok(()),
            [ty] => write!(f, " -> {ty}"),
            many => write!(f, " -> {many:?}"),
        }
    }
}

/// A domain error raised by a method body.
///
/// The text travels to the remote caller verbatim in the reply's `"error"`
/// key, so it should read as a complete diagnostic on its own, e.g.
/// `"read memsvc error: EIO"`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct MethodError(String);

impl MethodError {
    /// Creates a method error from a diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        MethodError(message.into())
    }

    /// The diagnostic text.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<String> for MethodError {
    fn from(message: String) -> Self {
        MethodError(message)
    }
}

impl From<&str> for MethodError {
    fn from(message: &str) -> Self {
        MethodError(message.to_string())
    }
}

/// The framework's one built-in method: the connect-time module/version
/// handshake issued by
/// [`Connection::load_module`](crate::client::Connection::load_module) and
/// answered by the server's control path.
pub(crate) struct LoadModule;

impl Method for LoadModule {
    const MODULE: &'static str = "module";
    const NAME: &'static str = "load";
    type Args = (String, String);
    type Output = ();
}
