//! devpack - Development-mode bundler configuration composer
//!
//! This crate composes the development configuration for a web-application
//! bundler by merging a project-supplied common layer, built-in development
//! defaults, and a browser overlay (DLL bundle planning, module caching,
//! commons-chunk extraction, HTML asset injection, loader options) into one
//! deterministic configuration object.

pub mod compose;
pub mod merge;
pub mod pkg;
pub mod plugins;
pub mod project;
pub mod settings;

pub use compose::{
    compose, CommonSource, ComposeError, ComposeOptions, ComposedConfig, Environment,
    JsonFileCommon, Platform, StaticCommon,
};
pub use project::ProjectRoot;
pub use settings::{BundleDescriptor, Settings};
