//! Pure layout logic for PlanGen.
//!
//! This crate turns a building envelope into a multi-floor room layout,
//! derives plumbing and electrical graphs from it, and projects the result
//! into renderable drawings. Everything except the oracle request and file
//! export takes plain data and returns plain data, so the whole pipeline is
//! unit-testable without a renderer or a network.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`geometry`] | Axis-aligned rectangles, overlap/containment, scaling transforms |
//! | [`model`] | Room types, rooms, flats, floors, and the `Blueprint` record |
//! | [`params`] | Building input parameters and their validation |
//! | [`generation`] | Layout strategies (oracle, procedural), fallback planner, envelope metadata |
//! | [`validation`] | Layout invariant checks (bounds, overlap, shafts, flats) |
//! | [`network`] | Plumbing and electrical graph builders and graph queries |
//! | [`projection`] | Component-filtered 2D plan drawing, door/window marks, 3D wireframe |
//! | [`export`] | SVG, PNG and JSON output |

pub mod export;
pub mod generation;
pub mod geometry;
pub mod model;
pub mod network;
pub mod params;
pub mod projection;
pub mod validation;
