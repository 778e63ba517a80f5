//! Fixtures shared by the integration tests: synthetic Go pclntabs, ELF
//! images carrying them, and goroutine profiles.

#![allow(dead_code)]

use go_stack_profile::profile::proto::{Function, Line, Location, Profile, Sample, ValueType};
use object::write;
use object::{Architecture, BinaryFormat, Endianness, SectionKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const GO116_MAGIC: u32 = 0xffff_fffa;
pub const GO118_MAGIC: u32 = 0xffff_fff0;
pub const GO120_MAGIC: u32 = 0xffff_fff1;

/// Distance between synthetic function entries
pub const FUNC_SPACING: u64 = 0x40;

const FUNC_RECORD_LEN: usize = 40;

/// Builds a little-endian go1.16, go1.18 or go1.20 pclntab
pub struct PclntabBuilder {
    magic: u32,
    ptr_size: usize,
    funcs: Vec<(String, i32)>,
}

impl PclntabBuilder {
    pub fn new() -> Self {
        Self { magic: GO120_MAGIC, ptr_size: 8, funcs: Vec::new() }
    }

    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Pointer size of the target, 4 or 8
    pub fn ptr_size(mut self, ptr_size: usize) -> Self {
        self.ptr_size = ptr_size;
        self
    }

    /// Add a function whose frame grows the stack by `delta` bytes
    pub fn func(mut self, name: &str, delta: i32) -> Self {
        self.funcs.push((name.to_string(), delta));
        self
    }

    /// go1.16 uses pointer-sized functab fields, go1.18+ 4-byte offsets
    fn field_size(&self) -> usize {
        if self.magic == GO116_MAGIC {
            self.ptr_size
        } else {
            4
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let field = self.field_size();

        let mut funcnametab = Vec::new();
        let mut name_offs = Vec::new();
        for (name, _) in &self.funcs {
            name_offs.push(funcnametab.len() as u32);
            funcnametab.extend_from_slice(name.as_bytes());
            funcnametab.push(0);
        }

        // Offset 0 means "no table", so pctab starts with a pad byte.
        let mut pctab = vec![0u8];
        let mut pcsp_offs = Vec::new();
        for (_, delta) in &self.funcs {
            pcsp_offs.push(pctab.len() as u32);
            pctab.extend_from_slice(&pcsp_table(*delta));
        }

        let nfunc = self.funcs.len();
        let functab_len = (2 * nfunc + 1) * field;
        let mut funcdata = Vec::new();
        for i in 0..nfunc {
            put(&mut funcdata, i as u64 * FUNC_SPACING, field);
            put(&mut funcdata, (functab_len + i * FUNC_RECORD_LEN) as u64, field);
        }
        put(&mut funcdata, nfunc as u64 * FUNC_SPACING, field);
        for i in 0..nfunc {
            let mut record = Vec::with_capacity(FUNC_RECORD_LEN);
            put(&mut record, i as u64 * FUNC_SPACING, field); // entry
            record.extend_from_slice(&name_offs[i].to_le_bytes()); // nameOff
            record.extend_from_slice(&0u32.to_le_bytes()); // args
            record.extend_from_slice(&0u32.to_le_bytes()); // deferreturn
            record.extend_from_slice(&pcsp_offs[i].to_le_bytes()); // pcsp
            record.resize(FUNC_RECORD_LEN, 0);
            funcdata.extend_from_slice(&record);
        }

        let header_words = if self.magic == GO116_MAGIC { 7 } else { 8 };
        let funcname_off = 8 + header_words * self.ptr_size;
        let pctab_off = funcname_off + funcnametab.len();
        let funcdata_off = pctab_off + pctab.len();

        let words: Vec<usize> = if self.magic == GO116_MAGIC {
            // nfunc, nfiles, funcnametab, cutab, filetab, pctab, pclntable
            vec![nfunc, 0, funcname_off, pctab_off, pctab_off, pctab_off, funcdata_off]
        } else {
            // nfunc, nfiles, textStart, funcnametab, cutab, filetab, pctab, pclntable
            vec![nfunc, 0, 0, funcname_off, pctab_off, pctab_off, pctab_off, funcdata_off]
        };

        let mut table = Vec::new();
        table.extend_from_slice(&self.magic.to_le_bytes());
        table.extend_from_slice(&[0, 0, 1, self.ptr_size as u8]);
        for word in words {
            put(&mut table, word as u64, self.ptr_size);
        }
        table.extend_from_slice(&funcnametab);
        table.extend_from_slice(&pctab);
        table.extend_from_slice(&funcdata);
        table
    }
}

/// Append the low `size` bytes of `v`, little-endian
fn put(out: &mut Vec<u8>, v: u64, size: usize) {
    out.extend_from_slice(&v.to_le_bytes()[..size]);
}

fn varint(mut v: u32, out: &mut Vec<u8>) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

/// pcsp table shaped like a real prologue/epilogue: -1 → 0 → delta → 0
fn pcsp_table(delta: i32) -> Vec<u8> {
    let mut out = Vec::new();
    for (value_delta, pc_delta) in [(1i32, 4u32), (delta, 20), (-delta, 2)] {
        if value_delta == 0 {
            break;
        }
        varint(((value_delta << 1) ^ (value_delta >> 31)) as u32, &mut out);
        varint(pc_delta, &mut out);
    }
    out.push(0);
    out
}

/// ELF relocatable object with `.text` and `.gopclntab`
pub fn elf_image(pclntab: &[u8]) -> Vec<u8> {
    elf_image_for(Architecture::X86_64, pclntab)
}

/// Like [`elf_image`], for a given architecture (`I386` gives a 32-bit ELF)
pub fn elf_image_for(arch: Architecture, pclntab: &[u8]) -> Vec<u8> {
    let mut obj = write::Object::new(BinaryFormat::Elf, arch, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.set_section_data(text, vec![0xcc; 64], 16);
    let pcln = obj.add_section(Vec::new(), b".gopclntab".to_vec(), SectionKind::ReadOnlyData);
    obj.set_section_data(pcln, pclntab.to_vec(), 8);
    obj.write().expect("failed to write test ELF")
}

/// Write an ELF image for `pclntab` into `dir`
pub fn write_elf(dir: &Path, pclntab: &[u8]) -> PathBuf {
    let path = dir.join("server");
    std::fs::write(&path, elf_image(pclntab)).expect("failed to write test binary");
    path
}

/// Goroutine profile with one sample per `(stack, count)`, stacks leaf first
pub fn goroutine_profile(stacks: &[(Vec<&str>, i64)]) -> Profile {
    let mut profile = Profile {
        sample_type: vec![ValueType { r#type: 1, unit: 2 }],
        period_type: Some(ValueType { r#type: 1, unit: 2 }),
        period: 1,
        string_table: vec![String::new(), "goroutine".to_string(), "count".to_string()],
        ..Default::default()
    };

    let mut location_ids: HashMap<&str, u64> = HashMap::new();
    for (stack, count) in stacks {
        let mut location_id = Vec::new();
        for &name in stack {
            let next_id = location_ids.len() as u64 + 1;
            let id = *location_ids.entry(name).or_insert_with(|| {
                profile.string_table.push(name.to_string());
                profile.function.push(Function {
                    id: next_id,
                    name: profile.string_table.len() as i64 - 1,
                    ..Default::default()
                });
                profile.location.push(Location {
                    id: next_id,
                    address: 0x40_0000 + next_id * 0x10,
                    line: vec![Line { function_id: next_id, line: 1, column: 0 }],
                    ..Default::default()
                });
                next_id
            });
            location_id.push(id);
        }
        profile.sample.push(Sample { location_id, value: vec![*count], label: vec![] });
    }
    profile
}
