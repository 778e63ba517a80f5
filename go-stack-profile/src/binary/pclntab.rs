//! Go `pclntab` decoding
//!
//! The pclntab is the toolchain-private table the Go runtime uses to map
//! program counters to function metadata. Its layout changes between Go
//! releases, so everything version-dependent lives in [`PclnVersion`]:
//!
//! ```text
//! magic       version  functab field  _func.nameOff  _func.pcsp   entries
//! 0xfffffffb  go1.2    ptrsize        ptrsize        ptrsize+12   absolute
//! 0xfffffffa  go1.16   ptrsize        ptrsize        ptrsize+12   absolute
//! 0xfffffff0  go1.18   4              4              16           text-relative
//! 0xfffffff1  go1.20   4              4              16           text-relative
//! ```
//!
//! A layout mismatch does not fail loudly, it just yields wrong numbers, so
//! bump this table together with the toolchain.

use log::debug;
use object::{Endian, Endianness};
use std::borrow::Cow;
use std::fmt;

use crate::domain::{FuncIndex, ImageError};

/// Size of the fixed header prefix: magic, two pad bytes, quantum, ptrsize.
const HEADER_PREFIX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PclnVersion {
    Go12,
    Go116,
    Go118,
    Go120,
}

impl PclnVersion {
    fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            0xffff_fffb => Some(Self::Go12),
            0xffff_fffa => Some(Self::Go116),
            0xffff_fff0 => Some(Self::Go118),
            0xffff_fff1 => Some(Self::Go120),
            _ => None,
        }
    }

    /// Width of one functab field and of `_func.entry`.
    fn field_size(self, ptr_size: usize) -> usize {
        match self {
            Self::Go12 | Self::Go116 => ptr_size,
            Self::Go118 | Self::Go120 => 4,
        }
    }

    /// Byte offset of `_func.pcsp` inside a function record.
    ///
    /// Layout after the entry field: nameOff, args, deferreturn, pcsp (all 4 bytes).
    fn pcsp_offset(self, ptr_size: usize) -> usize {
        self.field_size(ptr_size) + 12
    }

    fn text_relative(self) -> bool {
        matches!(self, Self::Go118 | Self::Go120)
    }
}

impl fmt::Display for PclnVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Go12 => "go1.2",
            Self::Go116 => "go1.16",
            Self::Go118 => "go1.18",
            Self::Go120 => "go1.20",
        };
        f.write_str(name)
    }
}

/// One step of a pc-value table: `value` holds for pcs below `end_pc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcValue {
    pub end_pc: u64,
    pub value: i32,
}

/// Borrowed, parsed view over a `gopclntab` section
#[derive(Debug, Clone)]
pub struct LineTable<'a> {
    version: PclnVersion,
    endian: Endianness,
    quantum: u8,
    ptr_size: usize,
    nfunc: usize,
    text_start: u64,
    funcnametab: &'a [u8],
    pctab: &'a [u8],
    funcdata: &'a [u8],
    functab: &'a [u8],
}

impl<'a> LineTable<'a> {
    /// Parse the header and locate the sub-tables
    ///
    /// `text_addr` is the image's text section address, which Go 1.18+
    /// entry offsets are relative to.
    ///
    /// # Errors
    /// Returns [`ImageError::BadPclntab`] if the magic is unknown or the header
    /// points outside the table.
    pub fn parse(data: &'a [u8], text_addr: u64) -> Result<Self, ImageError> {
        let bad = ImageError::BadPclntab;

        let prefix: [u8; HEADER_PREFIX] = data
            .get(..HEADER_PREFIX)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| bad(format!("table is only {} bytes", data.len())))?;
        let magic = [prefix[0], prefix[1], prefix[2], prefix[3]];
        let (endian, version) = [Endianness::Little, Endianness::Big]
            .into_iter()
            .find_map(|e| PclnVersion::from_magic(e.read_u32_bytes(magic)).map(|v| (e, v)))
            .ok_or_else(|| bad(format!("unknown magic {:02x?}", magic)))?;
        if prefix[4] != 0 || prefix[5] != 0 {
            return Err(bad("non-zero header padding".to_string()));
        }
        let quantum = prefix[6];
        if !matches!(quantum, 1 | 2 | 4) {
            return Err(bad(format!("invalid pc quantum {quantum}")));
        }
        let ptr_size = usize::from(prefix[7]);
        if !matches!(ptr_size, 4 | 8) {
            return Err(bad(format!("invalid pointer size {ptr_size}")));
        }

        let word = |n: usize| -> Result<usize, ImageError> {
            let start = HEADER_PREFIX + n * ptr_size;
            data.get(start..start + ptr_size)
                .map(|b| read_uint(endian, b))
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| bad(format!("header word {n} out of range")))
        };
        let from = |offset: usize, what: &str| -> Result<&'a [u8], ImageError> {
            data.get(offset..).ok_or_else(|| bad(format!("{what} offset {offset:#x} out of range")))
        };

        let nfunc = word(0)?;
        let (text_start, funcnametab, pctab, funcdata, functab) = match version {
            PclnVersion::Go12 => {
                let functab = from(HEADER_PREFIX + ptr_size, "functab")?;
                (0, data, data, data, functab)
            }
            PclnVersion::Go116 => {
                let funcdata = from(word(6)?, "funcdata")?;
                (0, from(word(2)?, "funcnametab")?, from(word(5)?, "pctab")?, funcdata, funcdata)
            }
            PclnVersion::Go118 | PclnVersion::Go120 => {
                let funcdata = from(word(7)?, "funcdata")?;
                (
                    text_addr,
                    from(word(3)?, "funcnametab")?,
                    from(word(6)?, "pctab")?,
                    funcdata,
                    funcdata,
                )
            }
        };

        let functab_len = nfunc
            .checked_mul(2)
            .and_then(|n| n.checked_add(1))
            .and_then(|n| n.checked_mul(version.field_size(ptr_size)))
            .filter(|&len| len <= functab.len())
            .ok_or_else(|| bad(format!("functab for {nfunc} functions exceeds table")))?;

        debug!("pclntab {version}: {nfunc} functions, quantum {quantum}, ptrsize {ptr_size}");

        Ok(Self {
            version,
            endian,
            quantum,
            ptr_size,
            nfunc,
            text_start,
            funcnametab,
            pctab,
            funcdata,
            functab: &functab[..functab_len],
        })
    }

    #[must_use]
    pub fn version(&self) -> PclnVersion {
        self.version
    }

    /// Number of functions in the functab
    #[must_use]
    pub fn func_count(&self) -> usize {
        self.nfunc
    }

    fn field_size(&self) -> usize {
        self.version.field_size(self.ptr_size)
    }

    fn functab_field(&self, n: usize) -> Option<u64> {
        let size = self.field_size();
        let start = n.checked_mul(size)?;
        self.functab.get(start..start + size).map(|b| read_uint(self.endian, b))
    }

    /// Entry PC of the function at `index`
    #[must_use]
    pub fn entry_pc(&self, index: FuncIndex) -> Option<u64> {
        let raw = self.functab_field(2 * index.0 as usize)?;
        if self.version.text_relative() {
            Some(self.text_start.wrapping_add(raw))
        } else {
            Some(raw)
        }
    }

    /// The `_func` record of the function at `index`, running to the end of funcdata
    fn func_record(&self, index: FuncIndex) -> Option<&'a [u8]> {
        if index.0 as usize >= self.nfunc {
            return None;
        }
        let offset = usize::try_from(self.functab_field(2 * index.0 as usize + 1)?).ok()?;
        self.funcdata.get(offset..)
    }

    fn record_u32(&self, record: &[u8], offset: usize) -> Option<u32> {
        record.get(offset..offset + 4).map(|b| self.endian.read_u32_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Name of the function at `index`
    #[must_use]
    pub fn func_name(&self, index: FuncIndex) -> Option<Cow<'a, str>> {
        let record = self.func_record(index)?;
        let name_off = self.record_u32(record, self.field_size())? as usize;
        let bytes = self.funcnametab.get(name_off..)?;
        let end = bytes.iter().position(|&b| b == 0)?;
        Some(String::from_utf8_lossy(&bytes[..end]))
    }

    /// Decoded `pcsp` table of the function at `index`
    ///
    /// Returns an empty table when the function has none, and `None` when the
    /// record or table is out of range or truncated.
    #[must_use]
    pub fn pcsp(&self, index: FuncIndex) -> Option<Vec<PcValue>> {
        let record = self.func_record(index)?;
        let offset = self.record_u32(record, self.version.pcsp_offset(self.ptr_size))?;
        if offset == 0 {
            return Some(Vec::new());
        }
        let table = self.pctab.get(offset as usize..)?;
        decode_pcvalue(table, self.entry_pc(index)?, u64::from(self.quantum))
    }

    /// Largest stack pointer growth of the function's own frame, in bytes
    ///
    /// This is the maximum of the `pcsp` table, floored at zero. Calls made by
    /// the function are not included.
    #[must_use]
    pub fn max_sp_delta(&self, index: FuncIndex) -> Option<u32> {
        let table = self.pcsp(index)?;
        let most = table.iter().max_by_key(|step| step.value).filter(|step| step.value > 0);
        if let Some(step) = most {
            debug!("{index}: {} bytes below pc {:#x}", step.value, step.end_pc);
        }
        Some(most.map_or(0, |step| step.value.unsigned_abs()))
    }
}

fn read_uint(endian: Endianness, bytes: &[u8]) -> u64 {
    match bytes.len() {
        4 => u64::from(endian.read_u32_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        8 => {
            let mut word = [0; 8];
            word.copy_from_slice(bytes);
            endian.read_u64_bytes(word)
        }
        _ => unreachable!("pclntab fields are 4 or 8 bytes"),
    }
}

/// Read an unsigned LEB128 value of at most 32 bits
///
/// Returns the value and the number of bytes consumed.
fn read_varint(data: &[u8]) -> Option<(u32, usize)> {
    let mut value = 0u32;
    for (n, &byte) in data.iter().take(5).enumerate() {
        value |= u32::from(byte & 0x7f) << (7 * n);
        if byte & 0x80 == 0 {
            return Some((value, n + 1));
        }
    }
    None
}

fn zigzag(raw: u32) -> i32 {
    i32::from_ne_bytes((0u32.wrapping_sub(raw & 1) ^ (raw >> 1)).to_ne_bytes())
}

/// Decode a pc-value table starting at `entry`
///
/// The value starts at -1. Each step is a zig-zag value delta followed by a
/// pc delta in units of `quantum`. A zero value delta ends the table unless
/// the pc is still at `entry`.
fn decode_pcvalue(mut data: &[u8], entry: u64, quantum: u64) -> Option<Vec<PcValue>> {
    let mut steps = Vec::new();
    let mut pc = entry;
    let mut value: i32 = -1;
    loop {
        let (value_delta, n) = read_varint(data)?;
        if value_delta == 0 && pc != entry {
            return Some(steps);
        }
        data = &data[n..];
        value = value.wrapping_add(zigzag(value_delta));

        let (pc_delta, n) = read_varint(data)?;
        data = &data[n..];
        pc = pc.wrapping_add(u64::from(pc_delta) * quantum);

        steps.push(PcValue { end_pc: pc, value });
    }
}
