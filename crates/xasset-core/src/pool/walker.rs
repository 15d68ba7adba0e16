//! Pool iteration.
//!
//! [`FixedPoolWalker`] and [`LinkedPoolWalker`] produce raw records; the
//! [`AssetPoolWalker`] on top of them filters placeholders and turns every
//! surviving record into an [`AssetDescriptor`]. All walkers are lazy and
//! only read from the source, so walking the same pool twice yields the same
//! sequence.

use std::collections::HashSet;

use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::memory::{PointerWidth, ReadMemory, Window};
use crate::schema::{Field, FieldWidth, Record};

use super::{AssetDescriptor, AssetStatus, LayoutDescriber, PlaceholderFilter};

/// Records fetched per read
const BATCH_RECORDS: u32 = 256;

/// Upper bound on nodes followed in a linked pool
const MAX_LINKED_NODES: usize = 1 << 20;

/// A fixed-capacity pool: `count` records of `stride` bytes from `base`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpan {
    pub base: u64,
    pub stride: u64,
    pub count: u32,
}

impl PoolSpan {
    pub fn new(base: u64, stride: u64, count: u32) -> Self {
        Self {
            base,
            stride,
            count,
        }
    }

    pub fn end(&self) -> u64 {
        self.base + self.stride * self.count as u64
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.end()
    }
}

/// One raw record taken from a pool
#[derive(Debug, Clone)]
pub struct PoolRecord {
    pub index: u32,
    pub record: Record,
    /// The pool itself marks the slot as a placeholder (linked pools)
    pub placeholder_hint: bool,
}

/// Walks a fixed-capacity pool, skipping free and uninitialized slots.
///
/// A slot is skipped when its name pointer is null or points back into the
/// pool: free slots reuse their first field as a free-list link.
pub struct FixedPoolWalker<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    span: PoolSpan,
    pointer: PointerWidth,
    name: Field,
    next: u32,
    batch: Option<Window>,
    done: bool,
}

impl<'a, R: ReadMemory + ?Sized> FixedPoolWalker<'a, R> {
    pub fn new(reader: &'a R, span: PoolSpan, pointer: PointerWidth, name: Field) -> Self {
        Self {
            reader,
            span,
            pointer,
            name,
            next: 0,
            batch: None,
            done: false,
        }
    }

    fn load_batch(&mut self) -> Result<()> {
        let count = BATCH_RECORDS.min(self.span.count - self.next);
        let base = self.span.base + self.span.stride * self.next as u64;
        let len = (self.span.stride * count as u64) as usize;
        self.batch = Some(Window::read(self.reader, base, len)?);
        Ok(())
    }

    fn take(&mut self, index: u32) -> Result<Record> {
        let address = self.span.base + self.span.stride * index as u64;
        let covered = self
            .batch
            .as_ref()
            .is_some_and(|w| w.cursor().contains(address, self.span.stride as usize));
        if !covered {
            self.load_batch()?;
        }

        let window = self.batch.as_ref().ok_or_else(|| Error::MemoryReadFailed {
            address,
            message: "pool batch missing".to_string(),
        })?;
        let bytes = window.cursor().bytes_at(address, self.span.stride as usize)?;
        Ok(Record::from_bytes(address, bytes.to_vec(), self.pointer))
    }
}

impl<R: ReadMemory + ?Sized> Iterator for FixedPoolWalker<'_, R> {
    type Item = Result<PoolRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.next < self.span.count {
            let index = self.next;
            self.next += 1;

            let record = match self.take(index) {
                Ok(record) => record,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let name_ptr = match record.get(self.name) {
                Ok(ptr) => ptr,
                Err(e) => return Some(Err(e)),
            };
            if name_ptr == 0 || self.span.contains(name_ptr) {
                trace!("Skipping free slot {} at {:#x}", index, record.address());
                continue;
            }

            return Some(Ok(PoolRecord {
                index,
                record,
                placeholder_hint: false,
            }));
        }
        None
    }
}

/// Field layout of linked pool roots and nodes, all pointer sized
#[derive(Debug, Clone, Copy)]
pub struct LinkedLayout {
    pub pointer: PointerWidth,
}

impl LinkedLayout {
    fn slot(&self, index: u64) -> u64 {
        self.pointer.bytes() as u64 * index
    }

    /// Root `{first, end, lookup, header_mem, asset_mem}`
    pub fn root_size(&self) -> u64 {
        self.slot(5)
    }

    pub fn first(&self) -> u64 {
        self.slot(0)
    }

    /// Node `{header, temp, next, previous}`
    pub fn node_size(&self) -> u64 {
        self.slot(4)
    }

    pub fn header(&self) -> u64 {
        self.slot(0)
    }

    pub fn temp(&self) -> u64 {
        self.slot(1)
    }

    pub fn next(&self) -> u64 {
        self.slot(2)
    }
}

/// Walks a null-terminated linked pool starting at its root
pub struct LinkedPoolWalker<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    layout: LinkedLayout,
    record_size: u64,
    node: u64,
    index: u32,
    seen: HashSet<u64>,
    done: bool,
}

impl<'a, R: ReadMemory + ?Sized> LinkedPoolWalker<'a, R> {
    pub fn new(reader: &'a R, root: u64, record_size: u64, pointer: PointerWidth) -> Result<Self> {
        let layout = LinkedLayout { pointer };
        let first = reader.read_ptr(root + layout.first(), pointer)?;
        Ok(Self {
            reader,
            layout,
            record_size,
            node: first,
            index: 0,
            seen: HashSet::new(),
            done: false,
        })
    }

    fn read_node(&self, node: u64) -> Result<(PoolRecord, u64)> {
        let pointer = self.layout.pointer;
        let bytes = self
            .reader
            .read_bytes(node, self.layout.node_size() as usize)?;
        let node_record = Record::from_bytes(node, bytes, pointer);

        let header = node_record.get(Field::new(self.layout.header(), FieldWidth::Ptr))?;
        let temp = node_record.get(Field::new(self.layout.temp(), FieldWidth::Ptr))?;
        let next = node_record.get(Field::new(self.layout.next(), FieldWidth::Ptr))?;

        let record = Record::read(self.reader, header, self.record_size, pointer)?;
        Ok((
            PoolRecord {
                index: self.index,
                record,
                placeholder_hint: temp == 1,
            },
            next,
        ))
    }
}

impl<R: ReadMemory + ?Sized> Iterator for LinkedPoolWalker<'_, R> {
    type Item = Result<PoolRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.node == 0 {
            return None;
        }
        if !self.seen.insert(self.node) || self.seen.len() > MAX_LINKED_NODES {
            warn!("Linked pool loops back to {:#x}, stopping", self.node);
            self.done = true;
            return None;
        }

        match self.read_node(self.node) {
            Ok((record, next)) => {
                self.node = next;
                self.index += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Raw record source for an [`AssetPoolWalker`]
pub enum RecordSource<'a, R: ReadMemory + ?Sized> {
    Fixed(FixedPoolWalker<'a, R>),
    Linked(LinkedPoolWalker<'a, R>),
    Empty,
}

impl<R: ReadMemory + ?Sized> Iterator for RecordSource<'_, R> {
    type Item = Result<PoolRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RecordSource::Fixed(walker) => walker.next(),
            RecordSource::Linked(walker) => walker.next(),
            RecordSource::Empty => None,
        }
    }
}

/// Lazy sequence of descriptors for one pool.
///
/// Per-asset failures (unreadable name, malformed record) are logged and
/// skipped. A failure of the source itself ends the sequence with an error.
pub struct AssetPoolWalker<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    records: RecordSource<'a, R>,
    describer: LayoutDescriber<'a>,
    filter: PlaceholderFilter,
    include_placeholders: bool,
    done: bool,
}

impl<'a, R: ReadMemory + ?Sized> AssetPoolWalker<'a, R> {
    pub fn new(
        reader: &'a R,
        records: RecordSource<'a, R>,
        describer: LayoutDescriber<'a>,
        filter: PlaceholderFilter,
        include_placeholders: bool,
    ) -> Self {
        Self {
            reader,
            records,
            describer,
            filter,
            include_placeholders,
            done: false,
        }
    }

    fn describe(&mut self, slot: PoolRecord) -> Result<Option<AssetDescriptor>> {
        let name_ptr = slot.record.get(self.describer.name_field())?;
        let raw_name = self.reader.read_cstring(name_ptr)?;
        let name = self.describer.name_style().apply(&raw_name);

        let status = if slot.placeholder_hint {
            AssetStatus::Placeholder
        } else {
            self.filter.classify(&name, &slot.record)?
        };
        if status == AssetStatus::Placeholder && !self.include_placeholders {
            return Ok(None);
        }

        let (detail, size_hint) = self.describer.describe(&slot.record, &raw_name)?;
        Ok(Some(AssetDescriptor {
            name,
            source_pointer: slot.record.address(),
            pool_index: slot.index,
            status,
            size_hint,
            is_file_backed: false,
            detail,
        }))
    }
}

impl<R: ReadMemory + ?Sized> Iterator for AssetPoolWalker<'_, R> {
    type Item = Result<AssetDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let slot = match self.records.next()? {
                Ok(slot) => slot,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let address = slot.record.address();
            match self.describe(slot) {
                Ok(Some(descriptor)) => return Some(Ok(descriptor)),
                Ok(None) => continue,
                Err(e) if e.is_fatal() => {
                    self.done = true;
                    return Some(Err(e));
                }
                Err(e) => {
                    warn!("Skipping {} at {:#x}: {}", self.describer.kind(), address, e);
                    continue;
                }
            }
        }
        None
    }
}
