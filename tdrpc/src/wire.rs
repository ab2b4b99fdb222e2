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

//! The type-directed serialization layer.
//!
//! Three sealed traits map Rust types onto the wire:
//!
//! - [`Wire`]: the four leaf types (`u32`, `String`, `Vec<u32>`,
//!   `Vec<String>`), each pinned to a [`WireType`] tag;
//! - [`Args`]: ordered argument tuples of `Wire` elements, arity 0 through
//!   8, encoded left to right;
//! - [`Returns`]: a method's return, either one `Wire` value or `()`,
//!   which emits and reads no keys at all.
//!
//! All three are sealed: the wire type set is a closed contract, and a
//! method signature referencing anything outside it simply does not
//! typecheck. Everything here drives the two cursor entry points
//! [`MessageWriter::push`] and [`MessageReader::pop`], so declaration order
//! and key order cannot drift apart.

use crate::frame::{FrameError, Value, WireType};
use crate::message::{MessageReader, MessageWriter};

mod sealed {
    /// Marker restricting the wire traits to the closed type set.
    pub trait Sealed {}

    impl Sealed for u32 {}
    impl Sealed for String {}
    impl Sealed for Vec<u32> {}
    impl Sealed for Vec<String> {}
}

/// A leaf value of the wire type set.
///
/// Implemented for exactly `u32`, `String`, `Vec<u32>` and `Vec<String>`;
/// the trait is sealed so the set cannot grow behind the wire contract's
/// back.
pub trait Wire: sealed::Sealed + Sized {
    /// The tag this type occupies on the wire.
    const WIRE_TYPE: WireType;

    /// Wraps the value into a tagged frame [`Value`].
    fn into_value(self) -> Value;

    /// Extracts the value if the tag matches, `None` otherwise.
    ///
    /// Decoding copies out of the frame; no borrow survives the call.
    fn from_value(value: &Value) -> Option<Self>;
}

impl Wire for u32 {
    const WIRE_TYPE: WireType = WireType::Word;

    fn into_value(self) -> Value {
        Value::Word(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Word(word) => Some(*word),
            _ => None,
        }
    }
}

impl Wire for String {
    const WIRE_TYPE: WireType = WireType::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl Wire for Vec<u32> {
    const WIRE_TYPE: WireType = WireType::WordArray;

    fn into_value(self) -> Value {
        Value::WordArray(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::WordArray(words) => Some(words.clone()),
            _ => None,
        }
    }
}

impl Wire for Vec<String> {
    const WIRE_TYPE: WireType = WireType::StrArray;

    fn into_value(self) -> Value {
        Value::StrArray(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StrArray(items) => Some(items.clone()),
            _ => None,
        }
    }
}

/// An ordered argument list drawn from the wire type set.
///
/// Implemented for tuples of [`Wire`] elements up to arity 8. Encoding
/// writes each element left to right through the writer's cursor; decoding
/// reads them back in the same order. The two sides can therefore never
/// disagree on key assignment as long as they share the method declaration.
pub trait Args: sealed::Sealed + Sized {
    /// The argument wire types, in declaration order.
    const TYPES: &'static [WireType];

    /// Writes every element at the cursor, left to right.
    fn encode(self, msg: &mut MessageWriter<'_>) -> Result<(), FrameError>;

    /// Reads every element at the cursor, left to right.
    fn decode(msg: &mut MessageReader<'_>) -> Result<Self, FrameError>;
}

macro_rules! impl_args {
    ($($element:ident),*) => {
        impl<$($element: Wire),*> sealed::Sealed for ($($element,)*) {}

        impl<$($element: Wire),*> Args for ($($element,)*) {
            const TYPES: &'static [WireType] = &[$($element::WIRE_TYPE),*];

            #[allow(non_snake_case)]
            fn encode(self, _msg: &mut MessageWriter<'_>) -> Result<(), FrameError> {
                let ($($element,)*) = self;
                $(_msg.push($element)?;)*
                Ok(())
            }

            fn decode(_msg: &mut MessageReader<'_>) -> Result<Self, FrameError> {
                // Tuple expressions evaluate left to right, which is exactly
                // the cursor order we need.
                Ok(($(_msg.pop::<$element>()?,)*))
            }
        }
    };
}

impl_args!();
impl_args!(A);
impl_args!(A, B);
impl_args!(A, B, C);
impl_args!(A, B, C, D);
impl_args!(A, B, C, D, E);
impl_args!(A, B, C, D, E, F);
impl_args!(A, B, C, D, E, F, G);
impl_args!(A, B, C, D, E, F, G, H);

/// A method's return value.
///
/// Implemented for `()` (the empty return, which emits no keys) and for
/// each single [`Wire`] type. Multi-value returns are not part of the
/// contract.
pub trait Returns: sealed::Sealed + Sized {
    /// The return wire types: empty for `()`, one element otherwise.
    const TYPES: &'static [WireType];

    /// Writes the return value at the cursor, if there is one.
    fn encode(self, msg: &mut MessageWriter<'_>) -> Result<(), FrameError>;

    /// Reads the return value at the cursor, if there is one.
    fn decode(msg: &mut MessageReader<'_>) -> Result<Self, FrameError>;
}

impl Returns for () {
    const TYPES: &'static [WireType] = &[];

    fn encode(self, _msg: &mut MessageWriter<'_>) -> Result<(), FrameError> {
        Ok(())
    }

    fn decode(_msg: &mut MessageReader<'_>) -> Result<Self, FrameError> {
        Ok(())
    }
}

macro_rules! impl_returns {
    ($ty:ty) => {
        impl Returns for $ty {
            const TYPES: &'static [WireType] = &[<$ty as Wire>::WIRE_TYPE];

            fn encode(self, msg: &mut MessageWriter<'_>) -> Result<(), FrameError> {
                msg.push(self)
            }

            fn decode(msg: &mut MessageReader<'_>) -> Result<Self, FrameError> {
                msg.pop::<$ty>()
            }
        }
    };
}

impl_returns!(u32);
impl_returns!(String);
impl_returns!(Vec<u32>);
impl_returns!(Vec<String>);
