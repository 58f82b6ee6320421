// SPDX-FileCopyrightText: 2025 Ashton Warner
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The runtime core of a small real-time 2D simulation: a tracking
//! memory-ownership layer, allocator-backed containers, a polymorphic
//! scene graph, and a two-thread execution model that separates
//! fixed-rate simulation stepping from the variable-rate render loop.
//!
//! Rendering, physics, and raw input are consumed through the traits in
//! [`pal`]; this crate contains no backend code of its own.

pub mod allocators;
pub mod app;
pub mod collections;
pub mod entities;
pub mod input;
pub mod render;

#[cfg(test)]
mod test_platform;
