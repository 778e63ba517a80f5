use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::loader::CompiledImage;
use super::pclntab::LineTable;
use crate::domain::{FuncIndex, ImageError};

/// Name → max SP delta lookup over one image
///
/// Decoding is lazy: construction only reads names, and each function's
/// `pcsp` table is walked the first time its name is resolved. Results are
/// cached for the lifetime of the index.
pub struct FunctionIndex<'a> {
    table: LineTable<'a>,
    /// Names in pclntab order, duplicates included
    names: Vec<String>,
    by_name: HashMap<String, FuncIndex>,
    /// Cache of resolved deltas by function name, including unknown names
    cache: RefCell<HashMap<String, u32>>,
    decodes: Cell<usize>,
}

impl<'a> FunctionIndex<'a> {
    /// Index every function in the image's pclntab
    ///
    /// # Errors
    /// Returns an error if the pclntab header is malformed or a functab entry
    /// points outside the table.
    pub fn new(image: &'a CompiledImage) -> Result<Self, ImageError> {
        let table = LineTable::parse(image.pclntab(), image.text_addr())?;

        let count = u32::try_from(table.func_count())
            .map_err(|_| ImageError::BadPclntab("too many functions".to_string()))?;
        let mut names = Vec::with_capacity(table.func_count());
        let mut by_name = HashMap::with_capacity(table.func_count());
        for index in (0..count).map(FuncIndex) {
            let (Some(name), Some(_)) = (table.func_name(index), table.entry_pc(index)) else {
                return Err(ImageError::BadPclntab(format!("unreadable functab entry {index}")));
            };
            let name = name.into_owned();
            // Later duplicates shadow earlier ones, the listing keeps both.
            by_name.insert(name.clone(), index);
            names.push(name);
        }

        info!("Indexed {} functions from {} pclntab", names.len(), table.version());

        Ok(Self {
            table,
            names,
            by_name,
            cache: RefCell::new(HashMap::new()),
            decodes: Cell::new(0),
        })
    }

    /// Function names in pclntab order
    pub fn func_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Max SP delta of `name`, in bytes
    ///
    /// Unknown names (assembly stubs, cgo trampolines, symbols from another
    /// binary) resolve to 0, as do functions whose `pcsp` table is damaged.
    pub fn resolve(&self, name: &str) -> u32 {
        if let Some(&cached) = self.cache.borrow().get(name) {
            return cached;
        }

        let delta = match self.by_name.get(name) {
            Some(&index) => {
                self.decodes.set(self.decodes.get() + 1);
                self.table.max_sp_delta(index).unwrap_or_else(|| {
                    debug!("Damaged pcsp table for {name} ({index}), assuming 0");
                    0
                })
            }
            None => {
                debug!("No pclntab entry for {name}, assuming 0");
                0
            }
        };

        self.cache.borrow_mut().insert(name.to_string(), delta);
        delta
    }

    /// Number of `pcsp` tables decoded so far
    #[must_use]
    pub fn decode_count(&self) -> usize {
        self.decodes.get()
    }
}
