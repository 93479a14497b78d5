pub mod analysis;
pub mod app;
pub mod capture;
pub mod error;
pub mod options;
pub mod render;

pub use app::App;
pub use options::Options;
