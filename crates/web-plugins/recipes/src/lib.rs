//! Recipe records served over HTTP.
//!
//! The [`plugin::Recipes`] plugin seeds a [`store::RecipeStore`] at mount
//! time and exposes it under `/recipes`:
//!
//! | route | operation |
//! |---|---|
//! | `POST /recipes` | create |
//! | `GET /recipes` | list |
//! | `GET /recipes/search?tag=` | search by tag |
//! | `GET /recipes/:id` | get |
//! | `PUT /recipes/:id` | update |
//! | `DELETE /recipes/:id` | delete |

mod error;
mod web;

pub mod model;
pub mod plugin;
pub mod seed;
pub mod store;

// Re-exports
pub use model::{Recipe, RecipeInput};
pub use seed::{load_seed, SeedError};
pub use store::{InMemoryRecipeStore, MongoRecipeStore, RecipeStore, StoreError};
