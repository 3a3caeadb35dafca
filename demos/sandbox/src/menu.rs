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

//! The demo's module: a main menu and a level screen.

use anyhow::Result;
use std::rc::Rc;
use tessera_sdk::prelude::*;

pub const BACKGROUND: &str = "MainScreen.Background";
pub const SHIP: &str = "Level.Ship";

/// Clicks coming from the menu UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    Settings,
}

/// App-level UI events, shared through the container.
#[derive(Default)]
pub struct MenuEvents {
    pub actions: Signal<MenuAction>,
}

pub struct MenuModule {
    assets: AssetSet,
}

impl MenuModule {
    pub fn new() -> Self {
        Self {
            assets: AssetSet::new()
                .with(AssetRequest::new(
                    AssetType::HudTexture,
                    BACKGROUND,
                    "mainscreen/background.png",
                ))
                .with(AssetRequest::new(AssetType::Gltf, SHIP, "level/ship.gltf")),
        }
    }
}

impl Default for MenuModule {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBinding for MenuModule {
    fn name(&self) -> &str {
        "menu"
    }

    fn configure_di(&self, container: &Container) -> Result<()> {
        container.bind_instance(&Token::<MenuEvents>::of(), Rc::new(MenuEvents::default()), &[])?;
        Ok(())
    }

    fn configure_views(&self, views: &ViewFactory) -> Result<()> {
        views.register_hud_view::<MainScreen, MainScreenController>();
        views.register_hud_view::<LevelScreen, LevelController>();
        Ok(())
    }

    fn asset_requests(&self) -> Vec<AssetRequest> {
        self.assets.to_vec()
    }
}

#[derive(Default)]
pub struct MainScreen {
    base: ScreenBase,
}

impl View for MainScreen {
    fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>) {
        self.base.initialize(creator, assets);
    }

    fn post_initialize(&mut self) -> Result<(), ViewError> {
        match self.base.view().assets().and_then(|a| a.texture(BACKGROUND)) {
            Some(texture) => log::info!(
                "MainScreen: background {}x{}",
                texture.width,
                texture.height
            ),
            None => log::warn!("MainScreen: background missing, drawing a flat color"),
        }
        Ok(())
    }

    fn set_controller(&mut self, controller: Option<ControllerRef>) {
        self.base.set_controller(controller);
    }

    fn destroy(&mut self) {
        self.base.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.base.is_destroyed()
    }

    fn bind_handle(&mut self, handle: WeakView) {
        self.base.bind_handle(handle);
    }

    fn node(&self) -> Option<NodeRef> {
        Some(self.base.node().clone())
    }
}

impl Screen for MainScreen {
    fn on_enter(&mut self, transition: &Transition) {
        log::info!("MainScreen: enter ({:?})", transition.kind);
        self.base.enter(transition);
    }

    fn on_exit(&mut self, transition: &Transition) -> ExitStatus {
        log::info!("MainScreen: exit ({:?})", transition.kind);
        self.base.exit(transition)
    }

    fn on_resize(&mut self, width: f32, height: f32, _dpr: f32) {
        self.base.resize(width, height);
    }
}

#[derive(Default)]
pub struct MainScreenController {
    subscriptions: UnsubscribeBag,
}

impl Controller for MainScreenController {
    fn destroy(&mut self) {
        self.subscriptions.flush();
    }
}

impl ViewController<MainScreen> for MainScreenController {
    fn initialize(
        &mut self,
        view: &ViewHandle<MainScreen>,
        resolver: &dyn InstanceResolver,
    ) -> Result<(), ViewError> {
        let events = resolver.resolve::<MenuEvents>()?;
        let creator = view
            .borrow()
            .base
            .view()
            .creator()
            .cloned()
            .ok_or(ViewError::FactoryDropped)?;

        self.subscriptions.add(events.actions.connect(move |action| match action {
            MenuAction::Play => {
                let slide = Transition::from_millis(TransitionKind::SlideInLeft, 400);
                if let Err(e) = creator.create_screen::<LevelScreen>(None, &slide) {
                    log::error!("MainScreen: cannot start level: {e}");
                }
            }
            MenuAction::Settings => log::info!("MainScreen: settings are not available yet"),
        }));
        Ok(())
    }
}

#[derive(Default)]
pub struct LevelScreen {
    base: ScreenBase,
}

impl View for LevelScreen {
    fn initialize(&mut self, creator: ViewCreator, assets: Rc<AssetLoader>) {
        self.base.initialize(creator, assets);
    }

    fn post_initialize(&mut self) -> Result<(), ViewError> {
        if let Some(ship) = self.base.view().assets().and_then(|a| a.gltf(SHIP)) {
            log::info!("LevelScreen: ship has {} mesh(es)", ship.mesh_count());
        }
        Ok(())
    }

    fn set_controller(&mut self, controller: Option<ControllerRef>) {
        self.base.set_controller(controller);
    }

    fn destroy(&mut self) {
        self.base.destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.base.is_destroyed()
    }

    fn bind_handle(&mut self, handle: WeakView) {
        self.base.bind_handle(handle);
    }

    fn node(&self) -> Option<NodeRef> {
        Some(self.base.node().clone())
    }
}

impl Screen for LevelScreen {
    fn on_enter(&mut self, transition: &Transition) {
        log::info!("LevelScreen: enter ({:?})", transition.kind);
        self.base.enter(transition);
    }

    fn on_exit(&mut self, transition: &Transition) -> ExitStatus {
        self.base.exit(transition)
    }

    fn on_resize(&mut self, width: f32, height: f32, _dpr: f32) {
        self.base.resize(width, height);
    }
}

#[derive(Default)]
pub struct LevelController {
    subscriptions: UnsubscribeBag,
}

impl Controller for LevelController {
    fn destroy(&mut self) {
        self.subscriptions.flush();
    }
}

impl ViewController<LevelScreen> for LevelController {
    fn initialize(
        &mut self,
        view: &ViewHandle<LevelScreen>,
        resolver: &dyn InstanceResolver,
    ) -> Result<(), ViewError> {
        let updates = resolver.resolve::<UpdateService>()?;
        let node = view.borrow().base.node().clone();
        let mut elapsed = 0.0_f32;
        let mut next_report = 0.5_f32;
        self.subscriptions.add(updates.register(10, move |dt| {
            elapsed += dt;
            if elapsed >= next_report {
                next_report += 0.5;
                let (x, _) = node.borrow().position();
                log::info!("LevelScreen: t={elapsed:.2}s x={x:.1}");
            }
        }));
        Ok(())
    }
}
