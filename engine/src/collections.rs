// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Containers backed by the [`Allocator`](crate::allocators::Allocator)
//! capability instead of the global heap. The scene graph's child lists
//! and the render pass's transform stack live on these.
//!
//! Neither container stores its allocator: every growing or freeing
//! operation takes the allocator as a parameter, and it must always be
//! the same instance that the container was created with (blocks can
//! only go back to the allocator that issued them). Dropping a
//! non-destroyed container leaks its blocks to whatever owns the
//! allocator, which an [`ArenaAllocator`](crate::allocators::ArenaAllocator)
//! reclaims wholesale.

mod list;
mod stack;

pub use list::{List, ListIter, NodeRef};
pub use stack::Stack;
