//! # Go Executable Analysis
//!
//! Turns a compiled Go program into a per-function table of stack frame
//! sizes.
//!
//! ## Pipeline
//!
//! ```text
//! 1. loader      ELF / Mach-O file  ->  text address + gopclntab bytes
//! 2. pclntab     gopclntab bytes    ->  functab, _func records, pcsp tables
//! 3. func_index  name               ->  max SP delta (memoized)
//! ```
//!
//! The max SP delta of a function is the largest number of bytes its own
//! frame pushes the stack pointer down at any PC inside it. It does not
//! include frames of functions it calls, so summing it along a call stack
//! gives the stack bytes that call stack occupies.
//!
//! ## Limitations
//!
//! - **Private layout**: `_func` and the pclntab header are not a stable Go
//!   interface. Supported: go1.2 through go1.20+ table formats.
//! - **Go only**: functions outside the pclntab (C code via cgo) resolve to 0.

pub mod func_index;
pub mod loader;
pub mod pclntab;

pub use func_index::FunctionIndex;
pub use loader::CompiledImage;
pub use pclntab::{LineTable, PclnVersion};
