//! Geometry on top of detected finder patterns.
//!
//! Three pattern centers fix three corners of the marker. This crate assigns
//! their roles ([`assign_corner_roles`]), completes the quadrilateral with the
//! parallelogram rule ([`solve_fourth_corner`]) and validates it
//! ([`Quadrilateral`]). When more patterns survive fusion the combinatorial
//! searches ([`best_triple`], [`best_rectangle`]) pick the most consistent
//! subset. [`sample_grid`] finally rectifies the quadrilateral and reads a
//! logical `W x H` bit grid out of it.

mod error;
mod grid;
mod quad;
mod roles;
mod search;

pub use error::{GeometryError, SideAxis};
pub use grid::{
    expand_corners, extract_border_cells, sample_grid, BorderCell, BorderCells, BorderSummary,
    Grid, GridParams, FINDER_EXPANSION_RATIO,
};
pub use quad::{solve_fourth_corner, QuadParams, QuadSides, Quadrilateral};
pub use roles::{assign_corner_roles, corner_roles, CornerRoles};
pub use search::{
    best_rectangle, best_triple, clockwise_order, order_clockwise, Anchor, RectangleMatch,
    SearchParams, TripleMatch,
};
