mod builder;
mod container;

pub use builder::ContainerBuilder;
pub use container::Container;
