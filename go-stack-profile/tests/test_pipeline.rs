mod common;

use common::{goroutine_profile, PclntabBuilder};
use go_stack_profile::binary::{CompiledImage, FunctionIndex};
use go_stack_profile::domain::StackCapacity;
use go_stack_profile::profile::rewrite::FREE_STACK_FUNCTION;
use go_stack_profile::profile::{decode_profile, encode_profile, rewrite, ProfileTables};

fn image() -> CompiledImage {
    let pclntab = PclntabBuilder::new()
        .func("main.f", 100)
        .func("main.g", 200)
        .func("main.deep", 1500)
        .func("runtime.goexit", 0)
        .build();
    CompiledImage::from_parts(0x40_1000, pclntab)
}

/// (stack as function names, count, bytes) for every output sample
fn flatten(profile: &go_stack_profile::profile::Profile) -> Vec<(Vec<String>, i64, i64)> {
    let tables = ProfileTables::new(profile).expect("output should validate");
    profile
        .sample
        .iter()
        .map(|s| {
            let names = s
                .location_id
                .iter()
                .map(|&id| tables.frame_function(id).unwrap_or("?").to_string())
                .collect();
            (names, s.value[0], s.value[1])
        })
        .collect()
}

#[test]
fn test_two_frame_stack() {
    let image = image();
    let index = FunctionIndex::new(&image).expect("index should build");
    let input = goroutine_profile(&[(vec!["main.g", "main.f"], 5)]);

    let output = rewrite(&index, &input).expect("rewrite should succeed");

    let strs = |v: &[&str]| v.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    assert_eq!(
        flatten(&output),
        vec![
            (strs(&[FREE_STACK_FUNCTION, "main.g", "main.f"]), 5, 8740),
            (strs(&["main.g", "main.f"]), 5, 1000),
            (strs(&["main.f"]), 5, 500),
        ]
    );
}

#[test]
fn test_empty_stack_produces_nothing() {
    let image = image();
    let index = FunctionIndex::new(&image).expect("index should build");
    let input = goroutine_profile(&[(vec![], 3)]);

    let output = rewrite(&index, &input).expect("rewrite should succeed");
    assert!(output.sample.is_empty());
}

#[test]
fn test_bytes_add_up_to_capacity() {
    let image = image();
    let index = FunctionIndex::new(&image).expect("index should build");
    let stacks = vec![
        (vec!["main.g", "main.f", "runtime.goexit"], 1000),
        (vec!["main.f", "runtime.goexit"], 1000),
        (vec!["main.deep", "main.deep", "main.g", "runtime.goexit"], 7),
        (vec!["main.deep", "main.deep", "main.deep", "main.deep", "main.deep", "main.deep"], 2),
        (vec!["runtime.asmcgocall", "main.f"], 11),
        (vec!["runtime.goexit"], 4),
    ];
    let input = goroutine_profile(&stacks);

    let output = rewrite(&index, &input).expect("rewrite should succeed");

    let mut samples = output.sample.iter();
    for (stack, count) in &stacks {
        // One free sample plus one per frame, in input order.
        let derived: Vec<_> = samples.by_ref().take(stack.len() + 1).collect();
        let used: i64 = stack.iter().map(|name| i64::from(index.resolve(name))).sum();
        let capacity = StackCapacity::for_used(used);

        assert!(derived.iter().all(|s| s.value[0] == *count), "count must be preserved");
        let total: i64 = derived.iter().map(|s| s.value[1]).sum();
        assert_eq!(total, count * capacity.0, "stack {stack:?}");
    }
    assert!(samples.next().is_none());
}

#[test]
fn test_output_survives_encoding() {
    let image = image();
    let index = FunctionIndex::new(&image).expect("index should build");
    let input = goroutine_profile(&[(vec!["main.g", "main.f"], 5), (vec!["main.f"], 2)]);

    let output = rewrite(&index, &input).expect("rewrite should succeed");
    let bytes = encode_profile(&output).expect("encode should succeed");
    assert_eq!(decode_profile(&bytes).expect("decode should succeed"), output);
}

#[test]
fn test_each_function_decoded_once() {
    let image = image();
    let index = FunctionIndex::new(&image).expect("index should build");
    let input = goroutine_profile(&[
        (vec!["main.g", "main.f"], 1),
        (vec!["main.g", "main.f"], 2),
        (vec!["main.f"], 3),
    ]);

    rewrite(&index, &input).expect("rewrite should succeed");
    assert_eq!(index.decode_count(), 2);
}
