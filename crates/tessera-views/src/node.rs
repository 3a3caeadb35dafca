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

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a display node.
pub type NodeRef = Rc<RefCell<DisplayNode>>;

/// The presentation state of a view, as read by a rendering layer.
#[derive(Debug, Clone)]
pub struct DisplayNode {
    /// Whether the node is drawn at all.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Horizontal offset from the parent's origin.
    pub x: f32,
    /// Vertical offset from the parent's origin.
    pub y: f32,
    /// Clip rectangle anchored at the node's natural origin.
    pub clip: Option<(f32, f32)>,
    /// Size computed by the layout engine, if any.
    pub layout_size: Option<(f32, f32)>,
    /// Set once the owning view is destroyed.
    pub destroyed: bool,
    parent: Option<Weak<RefCell<DisplayNode>>>,
}

impl Default for DisplayNode {
    fn default() -> Self {
        Self {
            visible: true,
            alpha: 1.0,
            x: 0.0,
            y: 0.0,
            clip: None,
            layout_size: None,
            destroyed: false,
            parent: None,
        }
    }
}

impl DisplayNode {
    /// A visible, opaque node at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a fresh node in a shared handle.
    pub fn shared() -> NodeRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Links this node under `parent`.
    pub fn set_parent(&mut self, parent: Option<&NodeRef>) {
        self.parent = parent.map(Rc::downgrade);
    }

    /// The parent node, if it is still alive.
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// The parent's computed layout size.
    pub fn parent_layout_size(&self) -> Option<(f32, f32)> {
        let parent = self.parent()?;
        let size = parent.try_borrow().ok()?.layout_size;
        size
    }

    /// Current offset as `(x, y)`.
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_layout_is_read_through_weak_link() {
        let parent = DisplayNode::shared();
        parent.borrow_mut().layout_size = Some((640.0, 480.0));

        let mut child = DisplayNode::new();
        child.set_parent(Some(&parent));
        assert_eq!(child.parent_layout_size(), Some((640.0, 480.0)));

        drop(parent);
        assert_eq!(child.parent_layout_size(), None);
    }
}
