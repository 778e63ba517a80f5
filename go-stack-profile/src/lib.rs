//! # go-stack-profile - Goroutine Stack Space Breakdown
//!
//! Turns a Go goroutine profile into a profile of *stack bytes*: how much of
//! each goroutine's stack segment every frame occupies, and how much is
//! reserved but unused.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────────┐
//! │   Go executable  │        │  goroutine profile   │
//! │  (ELF / Mach-O)  │        │  (pprof, gzipped)    │
//! └────────┬─────────┘        └──────────┬───────────┘
//!          │                             │
//!          ▼                             ▼
//! ┌──────────────────┐        ┌──────────────────────┐
//! │  binary::loader  │        │    profile::codec    │
//! │ text + gopclntab │        │  decode + validate   │
//! └────────┬─────────┘        └──────────┬───────────┘
//!          ▼                             │
//! ┌──────────────────┐                   │
//! │ binary::pclntab  │                   │
//! │ func_index       │── max SP delta ──▶│
//! └──────────────────┘                   ▼
//!                             ┌──────────────────────┐
//!                             │   profile::rewrite   │
//!                             │ per-frame + free     │
//!                             └──────────┬───────────┘
//!                                        ▼
//!                               stack space profile
//! ```
//!
//! ## Module Structure
//!
//! - [`binary`]: executable loading and `gopclntab` decoding
//! - [`profile`]: pprof reading/writing and the stack space rewrite
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core domain types and errors
//!
//! ## The Stack Model
//!
//! A goroutine's stack holds one frame per call, each as large as the
//! function's max SP delta. The runtime allocates stacks in power-of-two
//! sizes starting at 2048 bytes, so the reserved size of a goroutine is its
//! used bytes rounded up, and the difference is free space.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Capture a goroutine profile from a running server
//! curl -o goroutine.pprof http://localhost:6060/debug/pprof/goroutine
//!
//! # Rewrite it and open the stack bytes view
//! go-stack-profile ./server goroutine.pprof > stacks.pprof
//! go tool pprof -sample_index=goroutine_space -http=: stacks.pprof
//! ```

pub mod binary;
pub mod cli;
pub mod domain;
pub mod profile;
