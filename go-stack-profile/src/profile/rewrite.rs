//! Goroutine profile → stack space profile
//!
//! Each goroutine sample becomes one sample per frame plus one sample for
//! the unused part of the stack segment:
//!
//! ```text
//! input   [g, f]                        count 5
//!
//! output  [<free stack space>, g, f]    count 5   5 * (2048 - 300)
//!         [g, f]                        count 5   5 * 200
//!         [f]                           count 5   5 * 100
//! ```
//!
//! Each frame sample carries the *self* cost of its leaf function only, so
//! a flame graph built from the output stacks frames on top of each other
//! and the root's total is the whole reserved stack. Summing a frame with
//! its callers' samples is not a cumulative cost, it double counts.

use log::{debug, info};
use std::collections::HashMap;
use std::hash::BuildHasher;

use super::proto::{Function, Line, Location, Profile, Sample, ValueType};
use super::tables::{intern, ProfileTables};
use crate::binary::FunctionIndex;
use crate::domain::{ProfileError, StackCapacity};

/// Name of the synthetic frame that holds unused stack bytes
pub const FREE_STACK_FUNCTION: &str = "<free stack space>";
/// Sample type appended to the profile
pub const STACK_SPACE_TYPE: &str = "goroutine_space";
pub const STACK_SPACE_UNIT: &str = "bytes";

/// Provides the max SP delta of a function by name
pub trait SpDeltaSource {
    /// Bytes `function`'s own frame adds to the stack; 0 when unknown
    fn max_sp_delta(&self, function: &str) -> u32;
}

impl SpDeltaSource for FunctionIndex<'_> {
    fn max_sp_delta(&self, function: &str) -> u32 {
        self.resolve(function)
    }
}

impl<S: BuildHasher> SpDeltaSource for HashMap<String, u32, S> {
    fn max_sp_delta(&self, function: &str) -> u32 {
        self.get(function).copied().unwrap_or(0)
    }
}

/// Totals over one rewrite, for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub samples_in: usize,
    pub samples_out: usize,
    /// Goroutines with a non-empty stack
    pub goroutines: i64,
    pub used_bytes: i64,
    pub free_bytes: i64,
}

impl RewriteStats {
    /// Reserved stack bytes across all goroutines
    #[must_use]
    pub fn reserved_bytes(&self) -> i64 {
        self.used_bytes + self.free_bytes
    }
}

/// Rewrite a goroutine profile into a stack space profile
///
/// # Errors
/// Returns an error if `input` has dangling references or no sample types.
pub fn rewrite(deltas: &impl SpDeltaSource, input: &Profile) -> Result<Profile, ProfileError> {
    rewrite_with_stats(deltas, input).map(|(profile, _)| profile)
}

/// [`rewrite`], also returning totals
///
/// # Errors
/// Same as [`rewrite`].
pub fn rewrite_with_stats(
    deltas: &impl SpDeltaSource,
    input: &Profile,
) -> Result<(Profile, RewriteStats), ProfileError> {
    let tables = ProfileTables::new(input)?;

    let mut output = Profile { sample: Vec::new(), ..input.clone() };

    // Keep only the goroutine count column, then add the bytes column.
    output.sample_type.truncate(1);
    let space_type = ValueType {
        r#type: intern(&mut output.string_table, STACK_SPACE_TYPE),
        unit: intern(&mut output.string_table, STACK_SPACE_UNIT),
    };
    output.sample_type.push(space_type);

    let free_function = Function {
        id: tables.max_function_id() + 1,
        name: intern(&mut output.string_table, FREE_STACK_FUNCTION),
        ..Default::default()
    };
    let free_location = Location {
        id: tables.max_location_id() + 1,
        line: vec![Line { function_id: free_function.id, ..Default::default() }],
        ..Default::default()
    };
    let free_location_id = free_location.id;
    output.function.push(free_function);
    output.location.push(free_location);

    let mut stats = RewriteStats { samples_in: input.sample.len(), ..Default::default() };

    for sample in &input.sample {
        let stack = &sample.location_id;
        if stack.is_empty() {
            continue;
        }
        let count = sample.value[0];

        let frame_sizes: Vec<i64> = stack
            .iter()
            .map(|&id| match tables.frame_function(id) {
                Some(name) => i64::from(deltas.max_sp_delta(name)),
                None => {
                    debug!("Location {id} has no function, charging 0 bytes");
                    0
                }
            })
            .collect();

        let stack_used: i64 = frame_sizes.iter().sum();
        let capacity = StackCapacity::for_used(stack_used);
        let free = capacity.free(stack_used);

        let mut free_stack = Vec::with_capacity(stack.len() + 1);
        free_stack.push(free_location_id);
        free_stack.extend_from_slice(stack);
        output.sample.push(derive_sample(sample, free_stack, count, free));

        for (i, &frame_size) in frame_sizes.iter().enumerate() {
            output.sample.push(derive_sample(sample, stack[i..].to_vec(), count, frame_size));
        }

        stats.goroutines = stats.goroutines.saturating_add(count);
        stats.used_bytes = stats.used_bytes.saturating_add(count.saturating_mul(stack_used));
        stats.free_bytes = stats.free_bytes.saturating_add(count.saturating_mul(free));
    }

    stats.samples_out = output.sample.len();
    info!(
        "Rewrote {} samples into {}: {} goroutines, {} bytes used, {} bytes free",
        stats.samples_in, stats.samples_out, stats.goroutines, stats.used_bytes, stats.free_bytes
    );

    Ok((output, stats))
}

/// Copy of `sample` on a new stack with values `[count, count * bytes]`
fn derive_sample(sample: &Sample, location_id: Vec<u64>, count: i64, bytes: i64) -> Sample {
    Sample {
        location_id,
        value: vec![count, count.saturating_mul(bytes)],
        label: sample.label.clone(),
    }
}
