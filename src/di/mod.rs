mod builder;
mod container;
mod state;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use state::HasContainer;
