//! Parent-child hierarchy between entities.
//!
//! Links are stored in an arena indexed by entity index: every slot keeps
//! its parent handle and its ordered child list. The graph is a forest by
//! construction, since [`Hierarchy::try_set_parent`] walks the ancestor chain
//! of the new parent and rejects any link that would close a loop.
//!
//! The [`World`](crate::World) owns one hierarchy and exposes it through
//! `set_parent`, `remove_parent`, `parent`, `children` and `is_ancestor`.

use crate::Entity;

/// Rejected hierarchy mutation. The hierarchy is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("cannot set {0} as its own parent")]
    SelfParent(Entity),
    #[error("parenting {child} under {parent} would create a cycle")]
    Cycle { child: Entity, parent: Entity },
    #[error("{0} is not alive")]
    DeadEntity(Entity),
}

#[derive(Debug, Default, Clone)]
struct Node {
    parent: Option<Entity>,
    children: Vec<Entity>,
}

/// Arena of parent/child links keyed by entity index.
#[derive(Debug, Default)]
pub struct Hierarchy {
    nodes: Vec<Node>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, entity: Entity) -> Option<&Node> {
        self.nodes.get(entity.index() as usize)
    }

    fn node_mut(&mut self, entity: Entity) -> &mut Node {
        let index = entity.index() as usize;
        if index >= self.nodes.len() {
            self.nodes.resize_with(index + 1, Node::default);
        }
        &mut self.nodes[index]
    }

    /// Parent of `entity`, if any.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.node(entity)?.parent
    }

    /// Ordered children of `entity`, `None` when it has none.
    pub fn children(&self, entity: Entity) -> Option<&[Entity]> {
        self.node(entity)
            .map(|node| node.children.as_slice())
            .filter(|children| !children.is_empty())
    }

    /// Returns `true` if `ancestor` appears on the parent chain of `entity`.
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.parent(entity);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Links `child` under `parent`, detaching it from any previous parent.
    ///
    /// Liveness is checked by the caller. Re-parenting to the current parent
    /// is a no-op.
    pub fn try_set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        if child == parent {
            return Err(HierarchyError::SelfParent(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(HierarchyError::Cycle { child, parent });
        }
        if self.parent(child) == Some(parent) {
            return Ok(());
        }

        self.remove_parent(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        Ok(())
    }

    /// Detaches `child` from its parent. Returns the former parent.
    pub fn remove_parent(&mut self, child: Entity) -> Option<Entity> {
        let old = self.node_mut(child).parent.take()?;
        self.node_mut(old).children.retain(|&c| c != child);
        Some(old)
    }

    /// `root` and all of its descendants in pre-order (parents before
    /// children).
    pub fn subtree(&self, root: Entity) -> Vec<Entity> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            order.push(entity);
            if let Some(children) = self.children(entity) {
                stack.extend(children.iter().rev().copied());
            }
        }
        order
    }

    /// Entities without a parent among `entities`, keeping their order.
    pub fn roots<'a>(&'a self, entities: &'a [Entity]) -> impl Iterator<Item = Entity> + 'a {
        entities
            .iter()
            .copied()
            .filter(|&e| self.parent(e).is_none())
    }

    /// Drops every link touching `entity`: it leaves its parent's child list
    /// and its children become roots.
    pub(crate) fn remove(&mut self, entity: Entity) {
        self.remove_parent(entity);
        let children = std::mem::take(&mut self.node_mut(entity).children);
        for child in children {
            if self.parent(child) == Some(entity) {
                self.node_mut(child).parent = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
