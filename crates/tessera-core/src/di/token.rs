// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NAMED_TOKEN: AtomicU64 = AtomicU64::new(1);

/// The identity a token is compared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// Identity of a concrete type.
    Type(TypeId),
    /// Identity of an explicitly created marker.
    Named(u64),
}

/// Type-erased view of a [`Token`]: its key plus a human-readable name.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    /// The identity used for lookups.
    pub key: TokenKey,
    /// Name used in diagnostics only.
    pub name: &'static str,
}

impl PartialEq for TokenInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TokenInfo {}

impl Hash for TokenInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// An opaque dependency-resolution key that resolves to an `Rc<T>`.
///
/// A token is either the identity of a type ([`Token::of`]) or an explicit
/// marker ([`Token::named`]). Tokens are never compared by value: two named
/// tokens created with the same description are distinct identities.
///
/// ```rust
/// use std::rc::Rc;
/// use tessera_core::di::{Container, ResolveExt, Token};
///
/// trait Greeter {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let greeter: Token<dyn Greeter> = Token::named("Greeter");
/// let container = Container::new();
/// container
///     .bind_instance(&greeter, Rc::new(English) as Rc<dyn Greeter>, &[])
///     .unwrap();
/// assert_eq!(container.get_instance(&greeter).unwrap().greet(), "hello");
/// ```
pub struct Token<T: ?Sized> {
    info: TokenInfo,
    _marker: PhantomData<fn() -> Rc<T>>,
}

impl<T: ?Sized + 'static> Token<T> {
    /// Returns the token identifying the type `T` itself.
    pub fn of() -> Self {
        Self {
            info: TokenInfo {
                key: TokenKey::Type(TypeId::of::<T>()),
                name: std::any::type_name::<T>(),
            },
            _marker: PhantomData,
        }
    }

    /// Creates a fresh marker token. Every call yields a new identity.
    pub fn named(description: &'static str) -> Self {
        Self {
            info: TokenInfo {
                key: TokenKey::Named(NEXT_NAMED_TOKEN.fetch_add(1, Ordering::Relaxed)),
                name: description,
            },
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Token<T> {
    /// Returns the type-erased description of this token.
    pub fn info(&self) -> TokenInfo {
        self.info
    }

    /// Returns the diagnostic name of this token.
    pub fn name(&self) -> &'static str {
        self.info.name
    }
}

impl<T: ?Sized> Clone for Token<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Token<T> {}

impl<T: ?Sized> PartialEq for Token<T> {
    fn eq(&self, other: &Self) -> bool {
        self.info.key == other.info.key
    }
}

impl<T: ?Sized> Eq for Token<T> {}

impl<T: ?Sized> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("name", &self.info.name)
            .field("key", &self.info.key)
            .finish()
    }
}
