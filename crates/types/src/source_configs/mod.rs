//! Configuration types for sensor sampling.

pub mod sampler;

pub use sampler::SamplerConfig;
