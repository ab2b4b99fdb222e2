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

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! Example plug-in modules for the TDRPC framework.
//!
//! The framework itself carries no methods; everything callable is
//! registered by a module at server start. This crate provides the
//! reference module, [`memory`] (word-addressed register access), together
//! with the demo daemon (`tdrpcd`) and demo client (`rpc-client`) binaries
//! that wire it to a TCP endpoint.

pub mod memory;
