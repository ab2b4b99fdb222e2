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

//! Server-side dispatch: the method registry and the plug-in module
//! contract.
//!
//! A [`Registry`] maps routing keys (`"module.name"`) to handlers of the
//! registration contract's shape, `(request, response) -> ()`. It is built
//! serially while modules load and frozen behind an `Arc` before the first
//! request is served, so the dispatch hot path takes no locks.
//!
//! Handlers come in two flavors:
//!
//! - [`Registry::register`], the typed path: give it a method declaration
//!   `M` and a body closure `Fn(M::Args) -> Result<M::Output, MethodError>`;
//!   the decode -> execute -> encode stub and its total error trap are derived
//!   from the declaration (see [`invoke`]).
//! - [`Registry::register_raw`], the escape hatch for handlers that want
//!   the raw frames. Such handlers own their error discipline.

mod backtrace;
mod invoke;

pub use invoke::invoke;
pub(crate) use invoke::write_error_frame;

use crate::frame::Frame;
use crate::method::{Method, MethodError, Signature};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// The registration contract's handler shape: `(request, response) -> ()`.
pub type RawHandler = Box<dyn Fn(&Frame, &mut Frame) + Send + Sync>;

/// Errors raised while a module registers its methods.
///
/// Registration errors abort the module load; they are never seen on the
/// call path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// A handler is already registered under this `(module, name)` pair.
    #[error("method {module}.{name} is already registered")]
    Duplicate {
        /// Module of the rejected registration.
        module: String,
        /// Method name of the rejected registration.
        name: String,
    },

    /// The method name cannot be used in a routing key.
    #[error("invalid method name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The module name was empty.
    #[error("module name must not be empty")]
    EmptyModule,

    /// The module name collides with the framework's control surface.
    #[error("module name {module:?} is reserved")]
    ReservedModule {
        /// The rejected module name.
        module: String,
    },

    /// Two loaded modules carry the same module name.
    #[error("module {module:?} is already loaded")]
    DuplicateModule {
        /// The colliding module name.
        module: String,
    },
}

/// The module name owned by the framework's control path (`module.load`).
const RESERVED_MODULE: &str = "module";

struct Registration {
    handler: RawHandler,
    /// Present for typed registrations, absent for raw ones.
    signature: Option<Signature>,
}

/// A process-wide mapping from routing keys to handlers.
///
/// Populated once at module load, immutable for the lifetime of the process
/// afterwards.
///
/// # Examples
///
/// ```rust
/// use tdrpc::dispatch::Registry;
/// use tdrpc::method::{Method, MethodError};
///
/// struct Add;
///
/// impl Method for Add {
///     const MODULE: &'static str = "math";
///     const NAME: &'static str = "Add";
///     type Args = (u32, u32);
///     type Output = u32;
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .register::<Add, _>(|(a, b)| a.checked_add(b).ok_or_else(|| MethodError::new("overflow")))
///     .unwrap();
/// assert!(registry.handler("math.Add").is_some());
/// assert!(registry.handler("math.Sub").is_none());
/// ```
#[derive(Default)]
pub struct Registry {
    methods: HashMap<String, Registration>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            methods: HashMap::new(),
        }
    }

    /// Registers the typed stub for method `M` with the given body.
    ///
    /// The body may capture whatever module state it needs; it runs to
    /// completion in the dispatcher's task, and anything it raises (a
    /// [`MethodError`], a frame error, a panic) is trapped into an error
    /// reply by the stub.
    ///
    /// # Errors
    ///
    /// The same rejections as [`register_raw`](Registry::register_raw).
    pub fn register<M, F>(&mut self, body: F) -> Result<(), RegistrationError>
    where
        M: Method + 'static,
        F: Fn(M::Args) -> Result<M::Output, MethodError> + Send + Sync + 'static,
    {
        self.insert(
            M::MODULE,
            M::NAME,
            Registration {
                handler: Box::new(move |request, response| {
                    invoke::<M, F>(&body, request, response);
                }),
                signature: Some(M::signature()),
            },
        )
    }

    /// Registers a raw `(request, response)` handler.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Duplicate`] for a second registration under the
    /// same `(module, name)`, [`RegistrationError::InvalidName`] if the name
    /// is empty or contains `.`, [`RegistrationError::EmptyModule`] /
    /// [`RegistrationError::ReservedModule`] for unusable module names.
    pub fn register_raw(
        &mut self,
        module: &str,
        name: &str,
        handler: RawHandler,
    ) -> Result<(), RegistrationError> {
        self.insert(
            module,
            name,
            Registration {
                handler,
                signature: None,
            },
        )
    }

    fn insert(
        &mut self,
        module: &str,
        name: &str,
        registration: Registration,
    ) -> Result<(), RegistrationError> {
        if module.is_empty() {
            return Err(RegistrationError::EmptyModule);
        }
        if module == RESERVED_MODULE {
            return Err(RegistrationError::ReservedModule {
                module: module.to_string(),
            });
        }
        if name.is_empty() {
            return Err(RegistrationError::InvalidName {
                name: name.to_string(),
                reason: "name must not be empty",
            });
        }
        if name.contains('.') {
            return Err(RegistrationError::InvalidName {
                name: name.to_string(),
                reason: "name must not contain '.'",
            });
        }
        let key = format!("{module}.{name}");
        if self.methods.contains_key(&key) {
            return Err(RegistrationError::Duplicate {
                module: module.to_string(),
                name: name.to_string(),
            });
        }
        self.methods.insert(key, registration);
        Ok(())
    }

    /// Looks up the handler for a routing key.
    pub fn handler(&self, routing_key: &str) -> Option<&RawHandler> {
        self.methods
            .get(routing_key)
            .map(|registration| &registration.handler)
    }

    /// Looks up the signature recorded for a typed registration.
    pub fn signature(&self, routing_key: &str) -> Option<&Signature> {
        self.methods
            .get(routing_key)
            .and_then(|registration| registration.signature.as_ref())
    }

    /// Returns the number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Registry").field("methods", &keys).finish()
    }
}

/// The plug-in module contract.
///
/// A module exposes a version tag that clients may match against on connect
/// (via [`load_module`](crate::client::Connection::load_module)) and
/// registers every one of its methods when loaded. Registration happens once
/// per process, before the server accepts its first connection.
pub trait Module: Send + Sync {
    /// The module name, e.g. `"memory"`. Used as the first half of every
    /// routing key the module registers.
    fn name(&self) -> &str;

    /// The version tag clients match against, e.g. `"memory v1.0.1"`.
    fn version_key(&self) -> &str;

    /// Registers every `(module, name, handler)` this module exposes.
    fn init(&self, registry: &mut Registry) -> Result<(), RegistrationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    struct Ping;

    impl Method for Ping {
        const MODULE: &'static str = "test";
        const NAME: &'static str = "Ping";
        type Args = ();
        type Output = ();
    }

    #[test]
    fn test_duplicate_registration_fails_deterministically() {
        let mut registry = Registry::new();
        registry.register::<Ping, _>(|()| Ok(())).unwrap();
        let err = registry.register::<Ping, _>(|()| Ok(())).unwrap_err();
        assert_eq!(
            err,
            RegistrationError::Duplicate {
                module: "test".to_string(),
                name: "Ping".to_string(),
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_name_in_distinct_modules_coexists() {
        let mut registry = Registry::new();
        registry
            .register_raw("memory", "read", Box::new(|_, _| {}))
            .unwrap();
        registry
            .register_raw("amc", "read", Box::new(|_, _| {}))
            .unwrap();
        assert!(registry.handler("memory.read").is_some());
        assert!(registry.handler("amc.read").is_some());

        let err = registry
            .register_raw("memory", "read", Box::new(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Duplicate { .. }));
    }

    #[test]
    fn test_dotted_and_empty_names_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register_raw("memory", "read.raw", Box::new(|_, _| {})),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.register_raw("memory", "", Box::new(|_, _| {})),
            Err(RegistrationError::InvalidName { .. })
        ));
        assert!(matches!(
            registry.register_raw("", "read", Box::new(|_, _| {})),
            Err(RegistrationError::EmptyModule)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_module_namespace_is_reserved() {
        let mut registry = Registry::new();
        let err = registry
            .register_raw("module", "load", Box::new(|_, _| {}))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::ReservedModule {
                module: "module".to_string()
            }
        );
    }

    #[test]
    fn test_unregistered_lookup_returns_no_handler() {
        let registry = Registry::new();
        assert!(registry.handler("memory.Read").is_none());
    }

    #[test]
    fn test_typed_registration_records_signature() {
        let mut registry = Registry::new();
        registry.register::<Ping, _>(|()| Ok(())).unwrap();
        let signature = registry.signature("test.Ping").unwrap();
        assert_eq!(signature.name, "Ping");
        assert!(signature.args.is_empty());

        registry
            .register_raw("test", "raw", Box::new(|_, _| {}))
            .unwrap();
        assert!(registry.signature("test.raw").is_none());
    }
}
