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

use crate::container::ViewContainer;
use crate::error::ViewError;
use crate::transition::Transition;
use crate::view::{
    AnyScreen, AnyView, ControllerRef, ExitStatus, Screen, View, ViewController, ViewHandle,
};
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tessera_core::{InstanceResolver, Scheduler};
use tessera_io::AssetLoader;

/// A view created together with its controller.
#[derive(Debug)]
pub struct Created<V, C> {
    /// The initialized view.
    pub view: ViewHandle<V>,
    /// The initialized controller, also owned by the view.
    pub controller: Rc<RefCell<C>>,
}

type ConstructFn<V> = Box<dyn Fn(&dyn InstanceResolver) -> Result<V, ViewError>>;
type CustomAttachFn = Rc<dyn Fn(Option<&dyn Any>, AnyView) -> Result<(), ViewError>>;

#[derive(Clone)]
enum Attachment {
    Hud,
    World,
    Custom(CustomAttachFn),
}

/// Type-erased half of a registration, keyed by view type.
trait Registration {
    fn view_name(&self) -> &'static str;
    fn controller_name(&self) -> &'static str;
    fn controller_type(&self) -> TypeId;
    fn construct(&self, resolver: &dyn InstanceResolver) -> Result<Box<dyn Any>, ViewError>;
    fn attachment(&self) -> &Attachment;
    fn make_controller(
        &self,
        view: Rc<dyn Any>,
        resolver: &dyn InstanceResolver,
    ) -> Result<(ControllerRef, Rc<dyn Any>), ViewError>;
}

struct TypedRegistration<V, C> {
    construct: ConstructFn<V>,
    attachment: Attachment,
    _controller: PhantomData<fn() -> C>,
}

impl<V: View, C: ViewController<V>> Registration for TypedRegistration<V, C> {
    fn view_name(&self) -> &'static str {
        type_name::<V>()
    }

    fn controller_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn controller_type(&self) -> TypeId {
        TypeId::of::<C>()
    }

    fn construct(&self, resolver: &dyn InstanceResolver) -> Result<Box<dyn Any>, ViewError> {
        Ok(Box::new((self.construct)(resolver)?))
    }

    fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    fn make_controller(
        &self,
        view: Rc<dyn Any>,
        resolver: &dyn InstanceResolver,
    ) -> Result<(ControllerRef, Rc<dyn Any>), ViewError> {
        let view = view
            .downcast::<RefCell<V>>()
            .map_err(|_| ViewError::ControllerMismatch {
                view: type_name::<V>(),
                registered: type_name::<C>(),
                requested: "a view of another type",
            })?;
        let controller = Rc::new(RefCell::new(C::default()));
        let erased: ControllerRef = controller.clone();
        let typed: Rc<dyn Any> = controller.clone();
        view.borrow_mut().set_controller(Some(erased.clone()));
        controller.borrow_mut().initialize(&view, resolver)?;
        Ok((erased, typed))
    }
}

struct FactoryInner {
    resolver: Rc<dyn InstanceResolver>,
    assets: Rc<AssetLoader>,
    scheduler: Rc<dyn Scheduler>,
    registry: RefCell<HashMap<TypeId, Rc<dyn Registration>>>,
    active_screen: RefCell<Option<AnyScreen>>,
    exiting: RefCell<Vec<AnyScreen>>,
    last_resize: Cell<Option<(f32, f32, f32)>>,
    hud: RefCell<Option<Rc<dyn ViewContainer>>>,
    world: RefCell<Option<Rc<dyn ViewContainer>>>,
}

impl FactoryInner {
    fn creator(self: &Rc<Self>) -> ViewCreator {
        ViewCreator {
            factory: Rc::downgrade(self),
            scheduler: self.scheduler.clone(),
        }
    }

    fn registration<V: View>(&self) -> Result<Rc<dyn Registration>, ViewError> {
        self.registry
            .borrow()
            .get(&TypeId::of::<V>())
            .cloned()
            .ok_or(ViewError::MissingViewRegistration {
                view: type_name::<V>(),
            })
    }

    fn attach(
        &self,
        attachment: &Attachment,
        parent: Option<&dyn Any>,
        view: AnyView,
    ) -> Result<(), ViewError> {
        let layer = match attachment {
            Attachment::Custom(attach) => return attach(parent, view),
            Attachment::Hud => ("hud", self.hud.borrow().clone()),
            Attachment::World => ("world", self.world.borrow().clone()),
        };
        match layer {
            (_, Some(container)) => container.attach_child(view, parent),
            (layer, None) => Err(ViewError::ContainerNotSet { layer }),
        }
    }

    /// Construct, attach, initialize, then bind the controller.
    fn build<V: View>(
        self: &Rc<Self>,
        parent: Option<&dyn Any>,
    ) -> Result<(ViewHandle<V>, Rc<dyn Any>), ViewError> {
        let registration = self.registration::<V>()?;
        let constructed = registration.construct(&*self.resolver)?;
        let view: V = match constructed.downcast::<V>() {
            Ok(view) => *view,
            Err(_) => {
                return Err(ViewError::ConstructedTypeMismatch {
                    view: type_name::<V>(),
                    constructed: registration.view_name(),
                })
            }
        };
        let handle: ViewHandle<V> = Rc::new(RefCell::new(view));
        let any_view: AnyView = handle.clone();

        self.attach(registration.attachment(), parent, any_view.clone())?;

        let initialized = {
            let mut view = handle.borrow_mut();
            view.bind_handle(Rc::downgrade(&any_view));
            view.initialize(self.creator(), self.assets.clone());
            view.post_initialize()
        };
        let controller = initialized.and_then(|()| {
            registration.make_controller(handle.clone(), &*self.resolver)
        });

        match controller {
            Ok((_, typed)) => {
                log::debug!(
                    "ViewFactory: created {} with {}",
                    registration.view_name(),
                    registration.controller_name()
                );
                Ok((handle, typed))
            }
            Err(err) => {
                log::warn!(
                    "ViewFactory: failed to create {}: {err}",
                    registration.view_name()
                );
                if let Ok(mut view) = handle.try_borrow_mut() {
                    view.destroy();
                }
                Err(err)
            }
        }
    }

    fn create<V: View, C: ViewController<V>>(
        self: &Rc<Self>,
        parent: Option<&dyn Any>,
    ) -> Result<Created<V, C>, ViewError> {
        let registration = self.registration::<V>()?;
        if registration.controller_type() != TypeId::of::<C>() {
            return Err(ViewError::ControllerMismatch {
                view: type_name::<V>(),
                registered: registration.controller_name(),
                requested: type_name::<C>(),
            });
        }
        let (view, controller) = self.build::<V>(parent)?;
        let controller = controller
            .downcast::<RefCell<C>>()
            .map_err(|_| ViewError::ControllerMismatch {
                view: type_name::<V>(),
                registered: registration.controller_name(),
                requested: type_name::<C>(),
            })?;
        Ok(Created { view, controller })
    }

    fn create_view<V: View>(
        self: &Rc<Self>,
        parent: Option<&dyn Any>,
    ) -> Result<ViewHandle<V>, ViewError> {
        self.build::<V>(parent).map(|(view, _)| view)
    }

    fn create_screen<V: Screen>(
        self: &Rc<Self>,
        parent: Option<&dyn Any>,
        transition: &Transition,
    ) -> Result<ViewHandle<V>, ViewError> {
        self.destroy_exiting();

        let previous = self.active_screen.borrow_mut().take();
        if let Some(previous) = previous {
            self.retire(previous, transition);
        }

        let handle = self.create_view::<V>(parent)?;
        let screen: AnyScreen = handle.clone();
        *self.active_screen.borrow_mut() = Some(screen);

        if let Some((width, height, dpr)) = self.last_resize.get() {
            handle.borrow_mut().on_resize(width, height, dpr);
        }
        handle.borrow_mut().on_enter(transition);
        Ok(handle)
    }

    fn retire(self: &Rc<Self>, screen: AnyScreen, transition: &Transition) {
        let status = screen
            .try_borrow_mut()
            .map(|mut outgoing| outgoing.on_exit(transition));
        match status {
            Ok(ExitStatus::Finished) => destroy_screen(&screen),
            Ok(ExitStatus::Pending) => {
                if !is_destroyed(&screen) {
                    self.exiting.borrow_mut().push(screen);
                }
            }
            Err(_) => self.defer_exit(screen, *transition),
        }
        self.prune_exiting();
    }

    /// Exits a screen that is on the stack (it started this swap from one of
    /// its own hooks) on the next frame.
    fn defer_exit(self: &Rc<Self>, screen: AnyScreen, transition: Transition) {
        log::debug!("ViewFactory: outgoing screen busy, deferring its exit");
        self.exiting.borrow_mut().push(screen.clone());
        let factory = Rc::downgrade(self);
        self.scheduler.schedule(
            Duration::ZERO,
            Box::new(move || {
                if is_destroyed(&screen) {
                    return;
                }
                let status = match screen.try_borrow_mut() {
                    Ok(mut outgoing) => outgoing.on_exit(&transition),
                    Err(_) => {
                        log::warn!("ViewFactory: outgoing screen still busy; exit skipped");
                        return;
                    }
                };
                if status == ExitStatus::Finished {
                    destroy_screen(&screen);
                }
                if let Some(factory) = factory.upgrade() {
                    factory.prune_exiting();
                }
            }),
        );
    }

    fn prune_exiting(&self) {
        self.exiting
            .borrow_mut()
            .retain(|screen| !is_destroyed(screen));
    }

    fn destroy_exiting(&self) {
        let exiting = std::mem::take(&mut *self.exiting.borrow_mut());
        for screen in exiting {
            if !is_destroyed(&screen) {
                log::debug!("ViewFactory: force-destroying a screen still exiting");
                destroy_screen(&screen);
            }
        }
    }

    fn resize(&self, width: f32, height: f32, dpr: f32) {
        self.last_resize.set(Some((width, height, dpr)));
        let active = self.active_screen.borrow().clone();
        if let Some(active) = active {
            match active.try_borrow_mut() {
                Ok(mut screen) => screen.on_resize(width, height, dpr),
                Err(_) => log::warn!("ViewFactory: active screen busy; resize not forwarded"),
            }
        }
    }
}

fn is_destroyed(screen: &AnyScreen) -> bool {
    screen.try_borrow().map_or(false, |s| s.is_destroyed())
}

fn destroy_screen(screen: &AnyScreen) {
    match screen.try_borrow_mut() {
        Ok(mut screen) => screen.destroy(),
        Err(_) => log::warn!("ViewFactory: screen busy; destroy skipped"),
    }
}

/// Creates views from their registrations and keeps the single active
/// screen.
///
/// Cloning yields another handle to the same factory.
#[derive(Clone)]
pub struct ViewFactory {
    inner: Rc<FactoryInner>,
}

impl ViewFactory {
    /// A factory with an empty registration table.
    pub fn new(
        resolver: Rc<dyn InstanceResolver>,
        assets: Rc<AssetLoader>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        Self {
            inner: Rc::new(FactoryInner {
                resolver,
                assets,
                scheduler,
                registry: RefCell::new(HashMap::new()),
                active_screen: RefCell::new(None),
                exiting: RefCell::new(Vec::new()),
                last_resize: Cell::new(None),
                hud: RefCell::new(None),
                world: RefCell::new(None),
            }),
        }
    }

    fn insert<V: View, C: ViewController<V>>(
        &self,
        construct: ConstructFn<V>,
        attachment: Attachment,
    ) {
        let registration: Rc<dyn Registration> = Rc::new(TypedRegistration::<V, C> {
            construct,
            attachment,
            _controller: PhantomData,
        });
        log::debug!(
            "ViewFactory: registered {} -> {}",
            registration.view_name(),
            registration.controller_name()
        );
        self.inner
            .registry
            .borrow_mut()
            .insert(TypeId::of::<V>(), registration);
    }

    /// Registers `V` with controller `C`, built with `V::default()` and
    /// attached through `attach`. Replaces any earlier registration of `V`.
    pub fn register<V, C>(
        &self,
        attach: impl Fn(Option<&dyn Any>, AnyView) -> Result<(), ViewError> + 'static,
    ) where
        V: View + Default,
        C: ViewController<V>,
    {
        self.insert::<V, C>(
            Box::new(|_: &dyn InstanceResolver| Ok::<V, ViewError>(V::default())),
            Attachment::Custom(Rc::new(attach)),
        );
    }

    /// Registers `V` with controller `C` and a custom constructor.
    pub fn register_with<V, C>(
        &self,
        construct: impl Fn(&dyn InstanceResolver) -> Result<V, ViewError> + 'static,
        attach: impl Fn(Option<&dyn Any>, AnyView) -> Result<(), ViewError> + 'static,
    ) where
        V: View,
        C: ViewController<V>,
    {
        self.insert::<V, C>(Box::new(construct), Attachment::Custom(Rc::new(attach)));
    }

    /// Registers `V` on the HUD layer.
    pub fn register_hud_view<V, C>(&self)
    where
        V: View + Default,
        C: ViewController<V>,
    {
        self.insert::<V, C>(
            Box::new(|_: &dyn InstanceResolver| Ok::<V, ViewError>(V::default())),
            Attachment::Hud,
        );
    }

    /// Registers `V` on the world layer.
    pub fn register_world_view<V, C>(&self)
    where
        V: View + Default,
        C: ViewController<V>,
    {
        self.insert::<V, C>(
            Box::new(|_: &dyn InstanceResolver| Ok::<V, ViewError>(V::default())),
            Attachment::World,
        );
    }

    /// Returns `true` if `V` has a registration.
    pub fn is_registered<V: View>(&self) -> bool {
        self.inner.registry.borrow().contains_key(&TypeId::of::<V>())
    }

    /// Installs the layer containers used by HUD and world registrations.
    pub fn set_view_containers(
        &self,
        world: Option<Rc<dyn ViewContainer>>,
        hud: Option<Rc<dyn ViewContainer>>,
    ) {
        *self.inner.world.borrow_mut() = world;
        *self.inner.hud.borrow_mut() = hud;
    }

    /// Creates `V` together with controller `C`.
    pub fn create<V: View, C: ViewController<V>>(
        &self,
        parent: Option<&dyn Any>,
    ) -> Result<Created<V, C>, ViewError> {
        self.inner.create::<V, C>(parent)
    }

    /// Creates `V` with its registered controller.
    pub fn create_view<V: View>(&self, parent: Option<&dyn Any>) -> Result<ViewHandle<V>, ViewError> {
        self.inner.create_view::<V>(parent)
    }

    /// Makes a new `V` the active screen.
    ///
    /// Screens still exiting from an earlier swap are destroyed first. The
    /// current screen then exits; the new one is created, receives the last
    /// known size and enters.
    pub fn create_screen<V: Screen>(
        &self,
        parent: Option<&dyn Any>,
        transition: &Transition,
    ) -> Result<ViewHandle<V>, ViewError> {
        self.inner.create_screen::<V>(parent, transition)
    }

    /// The active screen, if any.
    pub fn active_screen(&self) -> Option<AnyScreen> {
        self.inner.active_screen.borrow().clone()
    }

    /// Screens whose exit is still animating.
    pub fn exiting_count(&self) -> usize {
        self.inner.prune_exiting();
        self.inner.exiting.borrow().len()
    }

    /// Records the window size and forwards it to the active screen.
    ///
    /// View containers are resized by their owner.
    pub fn resize(&self, width: f32, height: f32, dpr: f32) {
        self.inner.resize(width, height, dpr);
    }

    /// The last recorded size as `(width, height, dpr)`.
    pub fn last_resize(&self) -> Option<(f32, f32, f32)> {
        self.inner.last_resize.get()
    }

    /// The installed world and HUD containers.
    pub fn view_containers(
        &self,
    ) -> (Option<Rc<dyn ViewContainer>>, Option<Rc<dyn ViewContainer>>) {
        (self.inner.world.borrow().clone(), self.inner.hud.borrow().clone())
    }

    /// The restricted surface handed to views.
    pub fn restricted(&self) -> ViewCreator {
        self.inner.creator()
    }

    /// Destroys the active and exiting screens.
    pub fn destroy_screens(&self) {
        self.inner.destroy_exiting();
        let active = self.inner.active_screen.borrow_mut().take();
        if let Some(active) = active {
            destroy_screen(&active);
        }
    }
}

impl fmt::Debug for ViewFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewFactory")
            .field("registrations", &self.inner.registry.borrow().len())
            .field("has_active_screen", &self.inner.active_screen.borrow().is_some())
            .field("exiting", &self.inner.exiting.borrow().len())
            .field("last_resize", &self.inner.last_resize.get())
            .finish()
    }
}

/// The part of the factory views may use: creating children and screens.
///
/// Holds the factory weakly; every call fails with
/// [`ViewError::FactoryDropped`] once the factory is gone.
#[derive(Clone)]
pub struct ViewCreator {
    factory: Weak<FactoryInner>,
    scheduler: Rc<dyn Scheduler>,
}

impl ViewCreator {
    fn factory(&self) -> Result<Rc<FactoryInner>, ViewError> {
        self.factory.upgrade().ok_or(ViewError::FactoryDropped)
    }

    /// See [`ViewFactory::create`].
    pub fn create<V: View, C: ViewController<V>>(
        &self,
        parent: Option<&dyn Any>,
    ) -> Result<Created<V, C>, ViewError> {
        self.factory()?.create::<V, C>(parent)
    }

    /// See [`ViewFactory::create_view`].
    pub fn create_view<V: View>(&self, parent: Option<&dyn Any>) -> Result<ViewHandle<V>, ViewError> {
        self.factory()?.create_view::<V>(parent)
    }

    /// See [`ViewFactory::create_screen`].
    pub fn create_screen<V: Screen>(
        &self,
        parent: Option<&dyn Any>,
        transition: &Transition,
    ) -> Result<ViewHandle<V>, ViewError> {
        self.factory()?.create_screen::<V>(parent, transition)
    }

    /// The frame scheduler transitions run on.
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.scheduler.clone()
    }

    /// Last known window size, if the factory is alive and has seen one.
    pub fn window_size(&self) -> Option<(f32, f32)> {
        self.factory
            .upgrade()
            .and_then(|factory| factory.last_resize.get())
            .map(|(width, height, _)| (width, height))
    }
}

impl fmt::Debug for ViewCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCreator")
            .field("factory_alive", &(self.factory.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::ViewBase;
    use crate::screen::ScreenBase;
    use crate::view::Controller;
    use futures::executor::LocalPool;
    use tessera_core::{Container, FrameMode, ManualClock, TaskQueue};
    use tessera_io::MemoryFetcher;

    #[derive(Default)]
    struct Idle;

    impl Controller for Idle {
        fn destroy(&mut self) {}
    }

    impl ViewController<ScreenBase> for Idle {
        fn initialize(
            &mut self,
            _view: &ViewHandle<ScreenBase>,
            _resolver: &dyn InstanceResolver,
        ) -> Result<(), ViewError> {
            Ok(())
        }
    }

    fn factory(pool: &LocalPool) -> ViewFactory {
        let queue = TaskQueue::new(Rc::new(ManualClock::new()), FrameMode::Frames);
        let assets = AssetLoader::new(Rc::new(MemoryFetcher::new()), pool.spawner());
        ViewFactory::new(Rc::new(Container::new()), Rc::new(assets), Rc::new(queue))
    }

    #[test]
    fn registration_building_another_type_is_reported_as_such() {
        let pool = LocalPool::new();
        let factory = factory(&pool);
        let registration: Rc<dyn Registration> = Rc::new(TypedRegistration::<ScreenBase, Idle> {
            construct: Box::new(|_: &dyn InstanceResolver| {
                Ok::<ScreenBase, ViewError>(ScreenBase::new())
            }),
            attachment: Attachment::Custom(Rc::new(|_: Option<&dyn Any>, _: AnyView| {
                Ok::<(), ViewError>(())
            })),
            _controller: PhantomData,
        });
        factory
            .inner
            .registry
            .borrow_mut()
            .insert(TypeId::of::<ViewBase>(), registration);

        let err = factory.create_view::<ViewBase>(None).unwrap_err();
        assert!(matches!(
            err,
            ViewError::ConstructedTypeMismatch { constructed, .. }
                if constructed.ends_with("ScreenBase")
        ));
    }
}
