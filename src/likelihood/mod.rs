//! Gene tree likelihood: kernel contract, CPU kernel, Jukes-Cantor model and the scoring engine.

pub mod cpu;
pub mod engine;
pub mod kernel;
pub mod model;

pub use cpu::CpuKernel;
pub use engine::{EngineConfig, EngineState, LikelihoodEngine};
pub use kernel::{KernelConfig, KernelError, KernelErrorKind, LikelihoodKernel, PeelOperation};
