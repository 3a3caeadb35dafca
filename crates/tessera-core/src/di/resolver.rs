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

use super::{ContainerError, Token, TokenInfo};
use std::any::Any;
use std::rc::Rc;

/// Minimal resolution surface.
///
/// Handed to factories, controllers and anything else that must resolve
/// dependencies without being able to register new ones. Typed access goes
/// through [`ResolveExt`].
pub trait InstanceResolver {
    /// Resolves a token to its type-erased instance.
    ///
    /// The returned value wraps an `Rc<T>` where `T` is the token's type.
    fn resolve_erased(&self, token: TokenInfo) -> Result<Rc<dyn Any>, ContainerError>;
}

/// Typed helpers available on every [`InstanceResolver`], including
/// `dyn InstanceResolver`.
pub trait ResolveExt: InstanceResolver {
    /// Resolves `token` to its shared instance.
    fn get_instance<T: ?Sized + 'static>(&self, token: &Token<T>) -> Result<Rc<T>, ContainerError> {
        let erased = self.resolve_erased(token.info())?;
        erased
            .downcast_ref::<Rc<T>>()
            .cloned()
            .ok_or_else(|| ContainerError::TypeMismatch {
                token: token.name().to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolves the type token of `T`.
    fn resolve<T: 'static>(&self) -> Result<Rc<T>, ContainerError> {
        self.get_instance(&Token::<T>::of())
    }
}

impl<R: InstanceResolver + ?Sized> ResolveExt for R {}
