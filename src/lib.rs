//! Lv2_R - A Rust emulation core for the PS3 lv2 kernel's event facility
//!
//! This crate provides the synchronization and resource-lifecycle engine
//! behind the `sys_event` family of lv2 system calls: bounded event
//! queues that guest PPU threads block on, and event ports that
//! producers use to deliver notifications into a queue.

// Kernel object constructors take required parameters, Default does not fit
#![allow(clippy::new_without_default)]

// Core types
pub mod types;

// Error vocabulary
pub mod error;

// Collaborators
pub mod emu;
pub mod idm;
pub mod ppu;

// Event subsystem
pub mod event;

// Syscall surface
pub mod syscalls;

pub use error::CellError;
pub use syscalls::Lv2Kernel;
