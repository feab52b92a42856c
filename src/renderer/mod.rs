//! Rendering backends for the ripple
//!
//! Both run the same field function: `cpu` as a plain image filter, `gpu`
//! as a WGSL port in a fullscreen-triangle WebGPU pipeline.

pub mod cpu;
pub mod gpu;

pub use cpu::{CpuRenderer, apply_ripple, compose_layer};
pub use gpu::{RippleRenderState, layer_padding, pad_layer};
