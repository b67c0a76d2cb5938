use crate::scene::NativeHandle;
use crate::scene::transform::Transform;
use glam::Affine3A;

/// Blend state created on demand the first time a node becomes translucent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendState {
    pub alpha: f32,
}

/// A node of the reference [`SceneGraph`](super::SceneGraph) backend.
///
/// Only hierarchy, transform and the few render flags the animation core
/// pushes (visibility, blend/alpha) are kept here.
#[derive(Debug, Clone)]
pub struct NativeNode {
    pub name: String,
    pub(crate) parent: Option<NativeHandle>,
    pub(crate) children: Vec<NativeHandle>,
    pub transform: Transform,
    pub visible: bool,
    pub(crate) blend: Option<BlendState>,
}

impl NativeNode {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            blend: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NativeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NativeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn blend(&self) -> Option<BlendState> {
        self.blend
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}
