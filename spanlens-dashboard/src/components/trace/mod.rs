pub mod detail;
pub mod live;
pub mod styles;
pub mod tree;
pub mod types;
pub mod view;

pub use view::TraceView;
