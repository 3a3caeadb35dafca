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

use super::{ContainerError, InstanceResolver, Token, TokenInfo, TokenKey};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

type ErasedInstance = Rc<dyn Any>;
type ErasedFactory = Rc<dyn Fn(&dyn InstanceResolver) -> Result<ErasedInstance, ContainerError>>;

enum Provider {
    Instance(ErasedInstance),
    Factory {
        factory: ErasedFactory,
        instance: Option<ErasedInstance>,
        /// True only while `factory` is running.
        creating: bool,
    },
}

struct Binding {
    token: TokenInfo,
    provider: Provider,
}

/// Singleton-only dependency container.
///
/// - `bind_instance` registers a pre-built value.
/// - `bind_singleton` registers a factory realised on first resolution and
///   cached for the container's lifetime.
/// - Each binding may declare aliases that resolve to the same provider.
///
/// The container implements [`InstanceResolver`]; factories receive it as
/// `&dyn InstanceResolver` so they can resolve their own dependencies.
#[derive(Default)]
pub struct Container {
    providers: RefCell<HashMap<TokenKey, Binding>>,
    aliases: RefCell<HashMap<TokenKey, TokenInfo>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pre-built singleton under `token` and its `aliases`.
    pub fn bind_instance<T: ?Sized + 'static>(
        &self,
        token: &Token<T>,
        value: Rc<T>,
        aliases: &[Token<T>],
    ) -> Result<(), ContainerError> {
        let erased: ErasedInstance = Rc::new(value);
        self.insert_provider(token.info(), Provider::Instance(erased))?;
        self.bind_aliases(token.info(), aliases)
    }

    /// Registers a lazily created singleton under `token` and its `aliases`.
    ///
    /// `factory` runs at most once successfully; a failed run is not cached
    /// and the next resolution retries it.
    pub fn bind_singleton<T, F>(
        &self,
        token: &Token<T>,
        factory: F,
        aliases: &[Token<T>],
    ) -> Result<(), ContainerError>
    where
        T: ?Sized + 'static,
        F: Fn(&dyn InstanceResolver) -> Result<Rc<T>, ContainerError> + 'static,
    {
        let factory: ErasedFactory = Rc::new(move |resolver: &dyn InstanceResolver| {
            factory(resolver).map(|value| Rc::new(value) as ErasedInstance)
        });
        self.insert_provider(
            token.info(),
            Provider::Factory {
                factory,
                instance: None,
                creating: false,
            },
        )?;
        self.bind_aliases(token.info(), aliases)
    }

    /// Returns `true` if `token` (or the primary it aliases) has a provider.
    pub fn is_bound<T: ?Sized>(&self, token: &Token<T>) -> bool {
        let primary = self.primary_of(token.info());
        self.providers.borrow().contains_key(&primary.key)
    }

    /// Returns the number of primary bindings.
    pub fn len(&self) -> usize {
        self.providers.borrow().len()
    }

    /// Returns `true` if nothing has been bound yet.
    pub fn is_empty(&self) -> bool {
        self.providers.borrow().is_empty()
    }

    fn insert_provider(&self, token: TokenInfo, provider: Provider) -> Result<(), ContainerError> {
        let mut providers = self.providers.borrow_mut();
        if providers.contains_key(&token.key) {
            return Err(ContainerError::DuplicateBinding {
                token: token.name.to_string(),
            });
        }
        log::debug!("Container: bound {token}");
        providers.insert(token.key, Binding { token, provider });
        Ok(())
    }

    fn bind_aliases<T: ?Sized>(
        &self,
        primary: TokenInfo,
        aliases: &[Token<T>],
    ) -> Result<(), ContainerError> {
        let mut map = self.aliases.borrow_mut();
        for alias in aliases.iter().map(Token::info) {
            if let Some(existing) = map.get(&alias.key) {
                if existing.key != primary.key {
                    return Err(ContainerError::AliasConflict {
                        alias: alias.name.to_string(),
                        existing: existing.name.to_string(),
                    });
                }
            }
            log::debug!("Container: alias {alias} -> {primary}");
            map.insert(alias.key, primary);
        }
        Ok(())
    }

    fn primary_of(&self, token: TokenInfo) -> TokenInfo {
        self.aliases
            .borrow()
            .get(&token.key)
            .copied()
            .unwrap_or(token)
    }

    fn store_instance(&self, key: TokenKey, created: &ErasedInstance) {
        if let Some(binding) = self.providers.borrow_mut().get_mut(&key) {
            if let Provider::Factory { instance, .. } = &mut binding.provider {
                *instance = Some(created.clone());
            }
        }
    }
}

impl InstanceResolver for Container {
    fn resolve_erased(&self, token: TokenInfo) -> Result<Rc<dyn Any>, ContainerError> {
        let primary = self.primary_of(token);

        let factory = {
            let mut providers = self.providers.borrow_mut();
            let Some(binding) = providers.get_mut(&primary.key) else {
                return Err(ContainerError::MissingBinding {
                    requested: token.name.to_string(),
                    resolved: (primary.key != token.key).then(|| primary.name.to_string()),
                });
            };

            match &mut binding.provider {
                Provider::Instance(value) => return Ok(value.clone()),
                Provider::Factory {
                    instance: Some(value),
                    ..
                } => return Ok(value.clone()),
                Provider::Factory { creating: true, .. } => {
                    return Err(ContainerError::CircularDependency {
                        token: binding.token.name.to_string(),
                    });
                }
                Provider::Factory {
                    factory, creating, ..
                } => {
                    *creating = true;
                    factory.clone()
                }
            }
        };

        // The provider table must not stay borrowed while the factory runs:
        // factories resolve (and may bind) through this same container.
        let _creating = CreatingGuard {
            container: self,
            key: primary.key,
        };
        log::trace!("Container: creating {primary}");
        let created = factory(self)?;
        self.store_instance(primary.key, &created);
        Ok(created)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.providers.borrow().len())
            .field("aliases", &self.aliases.borrow().len())
            .finish()
    }
}

/// Clears a provider's `creating` flag on every exit path of its factory,
/// including error returns and unwinding.
struct CreatingGuard<'a> {
    container: &'a Container,
    key: TokenKey,
}

impl Drop for CreatingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut providers) = self.container.providers.try_borrow_mut() {
            if let Some(binding) = providers.get_mut(&self.key) {
                if let Provider::Factory { creating, .. } = &mut binding.provider {
                    *creating = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::ResolveExt;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Config {
        name: String,
    }

    struct Service {
        config: Rc<Config>,
    }

    trait Logger {
        fn prefix(&self) -> &str;
    }

    struct ConsoleLogger;

    impl Logger for ConsoleLogger {
        fn prefix(&self) -> &str {
            "console"
        }
    }

    #[test]
    fn instance_binding_returns_the_same_value() {
        let container = Container::new();
        let token = Token::<Config>::of();
        let config = Rc::new(Config {
            name: "app".into(),
        });
        container
            .bind_instance(&token, config.clone(), &[])
            .unwrap();

        let resolved = container.get_instance(&token).unwrap();
        assert!(Rc::ptr_eq(&resolved, &config));
        assert_eq!(resolved.name, "app");
    }

    #[test]
    fn singleton_factory_runs_once() {
        let container = Container::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        container
            .bind_singleton(
                &Token::<Config>::of(),
                move |_| {
                    counter.set(counter.get() + 1);
                    Ok(Rc::new(Config {
                        name: "lazy".into(),
                    }))
                },
                &[],
            )
            .unwrap();

        assert_eq!(calls.get(), 0, "factory must be lazy");
        let first = container.resolve::<Config>().unwrap();
        let second = container.resolve::<Config>().unwrap();
        let third = container.resolve::<Config>().unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&second, &third));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn factories_resolve_their_dependencies() {
        let container = Container::new();
        container
            .bind_instance(
                &Token::<Config>::of(),
                Rc::new(Config {
                    name: "dep".into(),
                }),
                &[],
            )
            .unwrap();
        container
            .bind_singleton(
                &Token::<Service>::of(),
                |resolver| {
                    Ok(Rc::new(Service {
                        config: resolver.resolve::<Config>()?,
                    }))
                },
                &[],
            )
            .unwrap();

        let service = container.resolve::<Service>().unwrap();
        assert_eq!(service.config.name, "dep");
    }

    #[test]
    fn alias_resolves_to_the_primary_instance() {
        let container = Container::new();
        let primary = Token::<dyn Logger>::named("ConsoleLogger");
        let alias = Token::<dyn Logger>::named("ILogger");
        container
            .bind_singleton(
                &primary,
                |_| Ok(Rc::new(ConsoleLogger) as Rc<dyn Logger>),
                &[alias],
            )
            .unwrap();

        let via_alias = container.get_instance(&alias).unwrap();
        let via_primary = container.get_instance(&primary).unwrap();
        assert!(Rc::ptr_eq(&via_alias, &via_primary));
        assert_eq!(via_alias.prefix(), "console");
        assert!(container.is_bound(&alias));
    }

    #[test]
    fn duplicate_binding_is_rejected() {
        let container = Container::new();
        let token = Token::<Config>::of();
        container
            .bind_instance(&token, Rc::new(Config { name: "a".into() }), &[])
            .unwrap();

        let err = container
            .bind_singleton(&token, |_| Ok(Rc::new(Config { name: "b".into() })), &[])
            .unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateBinding { .. }));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn alias_cannot_be_rebound_to_another_primary() {
        let container = Container::new();
        let first = Token::<Config>::named("First");
        let second = Token::<Config>::named("Second");
        let alias = Token::<Config>::named("Alias");

        container
            .bind_instance(&first, Rc::new(Config { name: "1".into() }), &[alias])
            .unwrap();
        let err = container
            .bind_instance(&second, Rc::new(Config { name: "2".into() }), &[alias])
            .unwrap_err();

        match err {
            ContainerError::AliasConflict { alias, existing } => {
                assert_eq!(alias, "Alias");
                assert_eq!(existing, "First");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rebinding_alias_to_same_primary_is_allowed() {
        let container = Container::new();
        let primary = Token::<Config>::named("Primary");
        let alias = Token::<Config>::named("Alias");
        container
            .bind_instance(&primary, Rc::new(Config { name: "p".into() }), &[alias, alias])
            .unwrap();
        assert!(container.get_instance(&alias).is_ok());
    }

    #[test]
    fn missing_binding_names_requested_and_resolved_tokens() {
        let container = Container::new();
        let err = container.resolve::<Config>().unwrap_err();
        assert!(matches!(
            err,
            ContainerError::MissingBinding { resolved: None, .. }
        ));
    }

    #[test]
    fn self_referencing_factory_is_reported_as_circular() {
        let container = Container::new();
        let token = Token::<Config>::named("Recursive");
        container
            .bind_singleton(
                &token,
                move |resolver| {
                    resolver.get_instance(&token)?;
                    Ok(Rc::new(Config {
                        name: "never".into(),
                    }))
                },
                &[],
            )
            .unwrap();

        let err = container.get_instance(&token).unwrap_err();
        match err {
            ContainerError::CircularDependency { token } => assert_eq!(token, "Recursive"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_factory_can_be_retried() {
        let container = Container::new();
        let attempts = Rc::new(Cell::new(0));
        let counter = attempts.clone();
        container
            .bind_singleton(
                &Token::<Config>::of(),
                move |_| {
                    counter.set(counter.get() + 1);
                    if counter.get() == 1 {
                        Err(ContainerError::creation_failed(
                            "Config",
                            anyhow::anyhow!("not yet"),
                        ))
                    } else {
                        Ok(Rc::new(Config {
                            name: "second try".into(),
                        }))
                    }
                },
                &[],
            )
            .unwrap();

        assert!(matches!(
            container.resolve::<Config>(),
            Err(ContainerError::CreationFailed { .. })
        ));
        let config = container.resolve::<Config>().unwrap();
        assert_eq!(config.name, "second try");
        let again = container.resolve::<Config>().unwrap();
        assert!(Rc::ptr_eq(&config, &again));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn creating_flag_is_cleared_after_a_panic() {
        let container = Container::new();
        let should_panic = Rc::new(Cell::new(true));
        let flag = should_panic.clone();
        container
            .bind_singleton(
                &Token::<Config>::of(),
                move |_| {
                    if flag.get() {
                        panic!("factory exploded");
                    }
                    Ok(Rc::new(Config { name: "ok".into() }))
                },
                &[],
            )
            .unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = container.resolve::<Config>();
        }));
        assert!(outcome.is_err());

        should_panic.set(false);
        assert_eq!(container.resolve::<Config>().unwrap().name, "ok");
    }
}
