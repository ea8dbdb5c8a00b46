pub mod resource_bar;

pub use resource_bar::ResourceBar;
