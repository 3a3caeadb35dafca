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

use crate::error::ViewError;
use crate::node::{DisplayNode, NodeRef};
use crate::view::{AnyView, WeakView};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A place views attach to: the HUD layer, the world layer or anything a
/// host provides.
pub trait ViewContainer {
    /// Attaches `child`. `parent` is the caller-supplied attachment target,
    /// or `None` for the container's own root.
    fn attach_child(&self, child: AnyView, parent: Option<&dyn Any>) -> Result<(), ViewError>;

    /// The window was resized.
    fn resize(&self, width: f32, height: f32, dpr: f32);
}

/// A [`ViewContainer`] backed by a root [`DisplayNode`].
///
/// Children are held weakly; a parent given to `attach_child` must be a
/// [`NodeRef`].
pub struct LayerContainer {
    name: &'static str,
    root: NodeRef,
    children: RefCell<Vec<WeakView>>,
    size: Cell<Option<(f32, f32, f32)>>,
}

impl LayerContainer {
    /// An empty layer.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            root: DisplayNode::shared(),
            children: RefCell::new(Vec::new()),
            size: Cell::new(None),
        }
    }

    /// The layer's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The root node children are linked under by default.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// The last size received, as `(width, height, dpr)`.
    pub fn size(&self) -> Option<(f32, f32, f32)> {
        self.size.get()
    }

    /// Live, undestroyed children in attachment order.
    pub fn children(&self) -> Vec<AnyView> {
        let mut children = self.children.borrow_mut();
        children.retain(|child| child.strong_count() > 0);
        children
            .iter()
            .filter_map(|child| child.upgrade())
            .filter(|child| child.try_borrow().map_or(true, |c| !c.is_destroyed()))
            .collect()
    }

    /// Number of live children.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }
}

impl ViewContainer for LayerContainer {
    fn attach_child(&self, child: AnyView, parent: Option<&dyn Any>) -> Result<(), ViewError> {
        let parent_node = match parent {
            None => self.root.clone(),
            Some(parent) => parent
                .downcast_ref::<NodeRef>()
                .cloned()
                .ok_or_else(|| {
                    ViewError::Attach(format!("{}: parent is not a display node", self.name))
                })?,
        };

        let node = child
            .try_borrow()
            .map_err(|_| ViewError::Attach(format!("{}: child is busy", self.name)))?
            .node();
        if let Some(node) = node {
            node.borrow_mut().set_parent(Some(&parent_node));
        }

        log::trace!("LayerContainer '{}': child attached", self.name);
        self.children.borrow_mut().push(Rc::downgrade(&child));
        Ok(())
    }

    fn resize(&self, width: f32, height: f32, dpr: f32) {
        self.size.set(Some((width, height, dpr)));
        self.root.borrow_mut().layout_size = Some((width.max(1.0), height.max(1.0)));
    }
}

impl fmt::Debug for LayerContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerContainer")
            .field("name", &self.name)
            .field("children", &self.children.borrow().len())
            .field("size", &self.size.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::ScreenBase;

    #[test]
    fn children_link_under_root_and_follow_its_size() {
        let layer = LayerContainer::new("hud");
        let screen = Rc::new(RefCell::new(ScreenBase::new()));
        let child: AnyView = screen.clone();

        layer.attach_child(child, None).unwrap();
        layer.resize(800.0, 600.0, 2.0);

        assert_eq!(layer.child_count(), 1);
        assert_eq!(screen.borrow().viewport(), (800.0, 600.0));
        assert_eq!(layer.size(), Some((800.0, 600.0, 2.0)));

        screen.borrow_mut().destroy();
        assert_eq!(layer.child_count(), 0);
    }

    #[test]
    fn explicit_parent_must_be_a_node() {
        let layer = LayerContainer::new("world");
        let child: AnyView = Rc::new(RefCell::new(ScreenBase::new()));

        let err = layer.attach_child(child.clone(), Some(&42u32 as &dyn Any)).unwrap_err();
        assert!(matches!(err, ViewError::Attach(_)));

        let parent = DisplayNode::shared();
        parent.borrow_mut().layout_size = Some((10.0, 20.0));
        layer.attach_child(child.clone(), Some(&parent as &dyn Any)).unwrap();
        let node = child.borrow().node().unwrap();
        assert_eq!(node.borrow().parent_layout_size(), Some((10.0, 20.0)));
    }
}
