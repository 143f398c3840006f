pub mod model_client;

pub use model_client::{Content, ModelClient, Part};
