//! Language model adapters.

mod dto;
mod http_model;

pub use http_model::{ModelClientBuildError, OpenAiCompatibleModel};
