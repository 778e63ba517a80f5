//! Compiled image loading
//!
//! Finds the two things the pclntab decoder needs from a Go executable: the
//! address of the text section and the raw `gopclntab` bytes. ELF and Mach-O
//! are tried in that order; both go through the same section scan.

use log::{debug, info};
use object::read::elf::{ElfFile32, ElfFile64};
use object::read::macho::{MachOFile32, MachOFile64};
use object::{Endianness, Object, ObjectSection};
use std::fs;
use std::path::Path;

use crate::domain::ImageError;

/// Section names are matched by substring, the same way on every format
/// (`.text` / `__text`, `.gopclntab` / `__gopclntab`).
const TEXT_SECTION: &str = "text";
const PCLNTAB_SECTION: &str = "gopclntab";

/// Parses one container format.
///
/// The outer `Err` means "not this format" and lets the next backend try. The
/// inner result carries errors from a file that *was* recognised.
type Backend = fn(&[u8]) -> object::Result<Result<CompiledImage, ImageError>>;

const BACKENDS: [(&str, Backend); 2] = [("ELF", load_elf), ("Mach-O", load_macho)];

/// A Go executable reduced to what stack analysis needs
#[derive(Debug, Clone)]
pub struct CompiledImage {
    text_addr: u64,
    pclntab: Vec<u8>,
}

impl CompiledImage {
    /// Read and parse the executable at `path`
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is neither ELF nor Mach-O,
    /// or lacks a text or `gopclntab` section.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|source| ImageError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&data)
    }

    /// Parse an in-memory executable
    ///
    /// # Errors
    /// Same as [`CompiledImage::open`], minus the I/O.
    pub fn parse(data: &[u8]) -> Result<Self, ImageError> {
        let mut rejected = Vec::new();
        for (format, backend) in BACKENDS {
            match backend(data) {
                Ok(image) => {
                    let image = image?;
                    info!(
                        "Loaded {format} image: text at 0x{:x}, gopclntab {} bytes",
                        image.text_addr,
                        image.pclntab.len()
                    );
                    return Ok(image);
                }
                Err(e) => {
                    debug!("Not a {format} file: {e}");
                    rejected.push(format!("{format}: {e}"));
                }
            }
        }
        Err(ImageError::UnsupportedFormat(rejected.join("; ")))
    }

    /// Build an image from already extracted parts
    #[must_use]
    pub fn from_parts(text_addr: u64, pclntab: Vec<u8>) -> Self {
        Self { text_addr, pclntab }
    }

    /// Address of the text section, the base that Go 1.18+ entry offsets are relative to
    #[must_use]
    pub fn text_addr(&self) -> u64 {
        self.text_addr
    }

    /// Raw bytes of the `gopclntab` section
    #[must_use]
    pub fn pclntab(&self) -> &[u8] {
        &self.pclntab
    }
}

fn load_elf(data: &[u8]) -> object::Result<Result<CompiledImage, ImageError>> {
    match ElfFile64::<Endianness>::parse(data) {
        Ok(file) => Ok(scan_sections(&file)),
        Err(_) => ElfFile32::<Endianness>::parse(data).map(|file| scan_sections(&file)),
    }
}

fn load_macho(data: &[u8]) -> object::Result<Result<CompiledImage, ImageError>> {
    match MachOFile64::<Endianness>::parse(data) {
        Ok(file) => Ok(scan_sections(&file)),
        Err(_) => MachOFile32::<Endianness>::parse(data).map(|file| scan_sections(&file)),
    }
}

fn scan_sections<'data>(file: &impl Object<'data>) -> Result<CompiledImage, ImageError> {
    // Several sections can match; the last one in section order wins.
    let text_addr = file
        .sections()
        .filter(|section| section.name().is_ok_and(|name| name.contains(TEXT_SECTION)))
        .map(|section| section.address())
        .last()
        .ok_or(ImageError::MissingSection { section: TEXT_SECTION })?;

    let section = file
        .sections()
        .find(|section| section.name().is_ok_and(|name| name.contains(PCLNTAB_SECTION)))
        .ok_or(ImageError::MissingSection { section: PCLNTAB_SECTION })?;
    let pclntab = section
        .uncompressed_data()
        .map_err(|e| ImageError::BadPclntab(format!("cannot read section data: {e}")))?
        .into_owned();

    Ok(CompiledImage { text_addr, pclntab })
}
