//! Column voxel renderer.
//!
//! A 2D grid of vertical voxel columns is rendered one screen column at a time: a 2D DDA
//! walks the grid, every run of same-colored voxels in a visited cell is projected to a
//! near-face and a far-face span, and two per-row depth buffers keep the nearest one.
//!
//! - [`world`] - grid storage, run-length encoding, map bytes
//! - [`camera`] - camera state and movement
//! - [`raycast`] - per-column DDA state
//! - [`span`] - run to screen-span projection and shading
//! - [`depth`] - near/far depth buffers
//! - [`renderer`] - whole-frame drivers
//! - [`edit`] - editor commands applied between frames

pub mod camera;
pub mod color;
pub mod config;
pub mod depth;
pub mod edit;
pub mod error;
pub mod raycast;
pub mod renderer;
pub mod scaler;
pub mod span;
pub mod world;

pub use camera::{Camera, CameraInput};
pub use color::Rgb;
pub use config::EngineConfig;
pub use error::{CommandError, ConfigError, RenderError, WorldError};
pub use renderer::{FrameStats, render_frame, render_frame_parallel};
pub use world::{GridDims, WorldGrid};
