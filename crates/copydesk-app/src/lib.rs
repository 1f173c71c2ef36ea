// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod cell;
pub mod export;
pub mod grid;
pub mod history;
pub mod ids;
pub mod model;
pub mod state;

pub use cell::*;
pub use export::*;
pub use grid::*;
pub use history::*;
pub use ids::*;
pub use model::*;
pub use state::*;
