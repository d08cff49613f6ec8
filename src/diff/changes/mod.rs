//! Change computers, one per category of difference.

mod components;
mod dependencies;

pub use components::ComponentChangeComputer;
pub use dependencies::DependencyChangeComputer;
