// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The scene graph: a tree of polymorphic 2D entities, driven once per
//! simulation tick through [`EntityTree::update`] and once per frame
//! through [`EntityTree::render`].
//!
//! Entities are owned by the tree and addressed by [`EntityId`] handles
//! instead of references, which is what lets an entity mutate the rest
//! of the tree (spawn, adopt, destroy, even destroy itself) from inside
//! its own operations. The entity is taken out of its slot for the
//! duration of an operation, and the slot remembers that it is out on
//! loan rather than free, so the id stays reserved the whole time. The
//! tree structure (parent links and child lists) lives in the slots,
//! not in the entities, so it can be changed while its entities are
//! out. Child lists are allocated from the tree's arena, so tearing the
//! tree down can't leak them no matter how the entities were destroyed.

use core::mem;

use pal::{Pal, Vec2};

use crate::{
    allocators::{ArenaAllocator, SystemAllocator},
    collections::{List, NodeRef, Stack},
    render::RenderContext,
};

/// Handle to an entity in an [`EntityTree`]. Slots are reused after a
/// destroy, so a stale id may come to name a different entity; holders
/// of long-lived ids are expected to learn about destruction through
/// their own means (usually by being the one who destroys).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(u32);

/// The state every entity has: a position relative to its parent and a
/// size. The tree structure itself is not here but in the tree's slots,
/// keyed by [`EntityId`], so it stays reachable while the entity is out
/// running one of its operations.
pub struct EntityBase {
    pub position: Vec2,
    pub width: f32,
    pub height: f32,
}

impl EntityBase {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> EntityBase {
        EntityBase {
            position: Vec2::new(x, y),
            width,
            height,
        }
    }
}

impl Default for EntityBase {
    /// A unit-sized entity at the origin.
    fn default() -> EntityBase {
        EntityBase::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// A node in the scene graph. The five operations all have default
/// bodies that do the plain tree-structural thing, so a specialization
/// only overrides what it adds behavior to, and usually ends its
/// override by looping [`EntityTree::child_ids`] into the tree the way
/// the default body does.
pub trait Entity: Send {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    /// Advances this entity by `delta_seconds` of simulated time and
    /// recurses into the children.
    fn update(&mut self, tree: &mut EntityTree, id: EntityId, delta_seconds: f64) {
        let children = tree.child_ids(id);
        for &child in children.as_slice() {
            tree.update(child, delta_seconds);
        }
        tree.recycle(children);
    }

    /// Pushes this entity's coordinate space: the parent's transform
    /// plus this entity's position, truncated to whole surface units so
    /// children never land between pixels.
    fn pre_render(&mut self, _tree: &mut EntityTree, _id: EntityId, ctx: &mut RenderContext) {
        let position = self.base().position;
        let tf = ctx.transform();
        ctx.push_transform(Vec2::new(
            tf.x + position.x.trunc(),
            tf.y + position.y.trunc(),
        ));
    }

    /// Draws this entity and recurses into the children. The default
    /// body draws nothing of its own.
    fn render(&mut self, tree: &mut EntityTree, id: EntityId, ctx: &mut RenderContext) {
        let children = tree.child_ids(id);
        for &child in children.as_slice() {
            tree.render(child, ctx);
        }
        tree.recycle(children);
    }

    /// Pops what [`Entity::pre_render`] pushed. Overrides must keep the
    /// pair balanced.
    fn post_render(&mut self, _tree: &mut EntityTree, _id: EntityId, ctx: &mut RenderContext) {
        ctx.pop_transform();
    }

    /// Releases whatever this entity owns outside the tree and recurses
    /// into the children. The tree itself reclaims the entity's memory
    /// after this returns.
    fn destroy(&mut self, tree: &mut EntityTree, id: EntityId) {
        let children = tree.child_ids(id);
        for &child in children.as_slice() {
            tree.destroy(child);
        }
        tree.recycle(children);
    }
}

enum SlotState {
    Free,
    Live(Box<dyn Entity>),
    /// The entity is out on loan, running one of its own operations.
    Borrowed,
    /// Destroyed from inside its own operation; the destroy finishes
    /// when the operation returns the entity to [`EntityTree::put_back`].
    Condemned,
}

/// One entity's place in the tree. The links outlive the entity's
/// presence in the slot, so operations like [`EntityTree::add_child`]
/// work even while either end is out on loan.
struct Slot {
    state: SlotState,
    parent: Option<EntityId>,
    parent_link: Option<NodeRef<EntityId>>,
    children: List<EntityId>,
}

/// Owner of the scene graph's entities and of the arena their child
/// lists (and the slot table) are allocated from.
pub struct EntityTree<'p> {
    arena: ArenaAllocator<SystemAllocator<'p>>,
    slots: Stack<Slot>,
}

impl<'p> EntityTree<'p> {
    /// Creates an empty tree backed by the platform's heap, through an
    /// arena so everything tree-owned is released together.
    pub fn new(platform: &'p dyn Pal) -> EntityTree<'p> {
        let mut arena = ArenaAllocator::new(SystemAllocator::new(platform));
        let slots = Stack::new(&mut arena);
        EntityTree { arena, slots }
    }

    /// Takes ownership of `entity` and returns its handle. Slots freed
    /// by a destroy get reused, lowest index first. Slots whose entity
    /// is merely out running an operation are not free and never get
    /// handed out.
    pub fn insert(&mut self, entity: Box<dyn Entity>) -> EntityId {
        for (index, slot) in self.slots.as_mut_slice().iter_mut().enumerate() {
            if matches!(slot.state, SlotState::Free) {
                slot.state = SlotState::Live(entity);
                return EntityId(index as u32);
            }
        }
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(
            &mut self.arena,
            Slot {
                state: SlotState::Live(entity),
                parent: None,
                parent_link: None,
                children: List::new(),
            },
        );
        id
    }

    /// Links `child` under `parent`. A `None` child is ignored, so
    /// optional spawns can be passed straight through. A live entity
    /// has at most one parent; linking an already linked child is a
    /// fatal usage error in checked builds. Only the slots are touched,
    /// so this works while either entity is out running an operation,
    /// letting an entity adopt children from inside its own update.
    pub fn add_child(&mut self, parent: EntityId, child: Option<EntityId>) {
        let Some(child_id) = child else {
            return;
        };
        debug_assert!(parent != child_id, "entity can't be its own child");
        if !self.is_occupied(parent) || !self.is_occupied(child_id) {
            return;
        }
        debug_assert!(
            self.slots.as_slice()[child_id.0 as usize].parent.is_none(),
            "entity already has a parent",
        );
        let link = self.slots.as_mut_slice()[parent.0 as usize]
            .children
            .push(&mut self.arena, child_id);
        let child_slot = &mut self.slots.as_mut_slice()[child_id.0 as usize];
        child_slot.parent = Some(parent);
        child_slot.parent_link = Some(link);
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        match &self.slots.as_slice().get(id.0 as usize)?.state {
            SlotState::Live(entity) => Some(entity.as_ref()),
            _ => None,
        }
    }

    // The object lifetime is spelled out: behind `&mut` it can't
    // shrink from `'static` to an inferred one.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        match &mut self.slots.as_mut_slice().get_mut(id.0 as usize)?.state {
            SlotState::Live(entity) => Some(entity.as_mut()),
            _ => None,
        }
    }

    /// The parent this entity was last linked under, or None for roots
    /// (and for destroyed ids).
    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.slots.as_slice().get(id.0 as usize)?.parent
    }

    /// Snapshots the ids of `id`'s children, oldest first, into a
    /// scratch buffer from the tree's arena. The snapshot is owned, so
    /// the tree can be mutated freely while walking it, including
    /// destroying the very children being walked. Hand the buffer back
    /// with [`EntityTree::recycle`] when done.
    pub fn child_ids(&mut self, id: EntityId) -> Stack<EntityId> {
        let mut ids = Stack::new(&mut self.arena);
        if let Some(slot) = self.slots.as_slice().get(id.0 as usize) {
            for &child in slot.children.iter() {
                ids.push(&mut self.arena, child);
            }
        }
        ids
    }

    /// Returns a [`EntityTree::child_ids`] buffer to the arena. A
    /// buffer that never comes back is reclaimed when the tree goes
    /// away, like every other arena block.
    pub fn recycle(&mut self, ids: Stack<EntityId>) {
        ids.destroy(&mut self.arena);
    }

    /// Runs [`Entity::update`] on the given entity, usually the scene
    /// root. Ids of destroyed entities are skipped silently, since a
    /// child list may well contain entities destroyed earlier in the
    /// same pass.
    pub fn update(&mut self, id: EntityId, delta_seconds: f64) {
        let Some(mut entity) = self.take(id) else {
            return;
        };
        entity.update(self, id, delta_seconds);
        self.put_back(id, entity);
    }

    /// Runs the three-phase render on the given entity: pre_render,
    /// render, post_render, in that order, ids of destroyed entities
    /// skipped silently.
    pub fn render(&mut self, id: EntityId, ctx: &mut RenderContext) {
        let Some(mut entity) = self.take(id) else {
            return;
        };
        entity.pre_render(self, id, ctx);
        entity.render(self, id, ctx);
        entity.post_render(self, id, ctx);
        self.put_back(id, entity);
    }

    /// Destroys the given entity and its whole subtree: runs
    /// [`Entity::destroy`], unlinks it from its parent, releases its
    /// child list back to the arena, and frees its slot for reuse.
    /// Destroying an already destroyed id is a no-op. Destroying an
    /// entity that is out running one of its operations (itself
    /// included) takes effect when that operation returns.
    pub fn destroy(&mut self, id: EntityId) {
        if let Some(entity) = self.take(id) {
            self.finish_destroy(id, entity);
        } else if let Some(slot) = self.slots.as_mut_slice().get_mut(id.0 as usize) {
            if matches!(slot.state, SlotState::Borrowed) {
                slot.state = SlotState::Condemned;
            }
        }
    }

    /// The non-recursive tail of a destroy, run once the entity's box
    /// is in hand: the destroy operation, the unlink from the parent,
    /// then the slot itself.
    fn finish_destroy(&mut self, id: EntityId, mut entity: Box<dyn Entity>) {
        entity.destroy(self, id);
        let slot = &mut self.slots.as_mut_slice()[id.0 as usize];
        let parent = slot.parent.take();
        let link = slot.parent_link.take();
        if let (Some(parent), Some(link)) = (parent, link) {
            // Safety: `link` came from the add_child push on this exact
            // list, and every unlink path clears it, so the node can't
            // be removed twice.
            unsafe {
                self.slots.as_mut_slice()[parent.0 as usize]
                    .children
                    .remove(&mut self.arena, link);
            }
        }
        // A destroy override that didn't recurse leaves survivors in
        // the child list. Cut them loose as roots; their links into
        // this list die with it.
        while let Some(orphan) = self.slots.as_mut_slice()[id.0 as usize]
            .children
            .pop(&mut self.arena)
        {
            if let Some(orphan_slot) = self.slots.as_mut_slice().get_mut(orphan.0 as usize) {
                orphan_slot.parent = None;
                orphan_slot.parent_link = None;
            }
        }
        self.slots.as_mut_slice()[id.0 as usize].state = SlotState::Free;
    }

    /// Takes the entity out of its slot for the duration of one of its
    /// operations, so the operation can be handed `&mut self` without
    /// aliasing the entity. The slot keeps counting as occupied the
    /// whole time; only [`EntityTree::put_back`] can free it (via the
    /// condemned path).
    fn take(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let slot = self.slots.as_mut_slice().get_mut(id.0 as usize)?;
        match mem::replace(&mut slot.state, SlotState::Borrowed) {
            SlotState::Live(entity) => Some(entity),
            state => {
                slot.state = state;
                None
            }
        }
    }

    fn put_back(&mut self, id: EntityId, entity: Box<dyn Entity>) {
        let condemned = matches!(
            self.slots.as_slice()[id.0 as usize].state,
            SlotState::Condemned,
        );
        if condemned {
            // destroy() was called on the entity from inside its own
            // operation. The box is back in hand now, so finish the job.
            self.finish_destroy(id, entity);
        } else {
            self.slots.as_mut_slice()[id.0 as usize].state = SlotState::Live(entity);
        }
    }

    fn is_occupied(&self, id: EntityId) -> bool {
        match self.slots.as_slice().get(id.0 as usize) {
            Some(slot) => !matches!(slot.state, SlotState::Free),
            None => false,
        }
    }
}

impl Drop for EntityTree<'_> {
    fn drop(&mut self) {
        // Drop the entities themselves; the slot table and any
        // remaining child-list nodes and scratch buffers are swept up
        // by the arena right after this.
        while !self.slots.is_empty() {
            drop(self.slots.pop());
        }
    }
}
