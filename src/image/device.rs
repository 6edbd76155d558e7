use super::error::{Error, Result};
use super::structures::{Entry, Header};

/// A read-only view over one xrofs image.
///
/// `Image` borrows a caller-owned byte region (usually a memory map) and never
/// copies or allocates. Construction validates the header, the entry table and
/// every entry's data and name bounds, so every accessor afterwards is a
/// bounds-checked slice of the region.
///
/// ## Example
///
/// ```
/// use xrofs::{Image, ImageBuilder};
///
/// let mut builder = ImageBuilder::new();
/// builder.add_file("a.txt", b"xyz".to_vec())?;
/// let bytes = builder.build()?;
///
/// let image = Image::new(&bytes)?;
/// let mut file = image.open("a.txt").expect("present");
/// let mut buf = [0u8; 4];
/// assert_eq!(file.read(&mut buf), 3);
/// assert_eq!(&buf[..3], b"xyz");
/// assert_eq!(file.read(&mut buf), 0);
/// # Ok::<(), xrofs::image::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Image<'a> {
    data: &'a [u8],
    header: Header,
}

impl<'a> Image<'a> {
    /// Validate `data` as an image and wrap it.
    ///
    /// # Errors
    ///
    /// Fails if the header or entry table is cut short, if an entry's data
    /// runs past the end of the region, or if an entry's name has no NUL
    /// terminator before the end of the region. Table ordering is not checked
    /// (see [`Image::is_sorted`]).
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = Header::from_bytes(data)?;

        let table_end = header.table_end();
        if data.len() < table_end {
            return Err(Error::Truncated {
                what: "entry table",
                needed: table_end,
                available: data.len(),
            });
        }

        let image = Self { data, header };
        for index in 0..header.entry_count {
            image.validate_entry(index)?;
        }

        Ok(image)
    }

    fn validate_entry(&self, index: u16) -> Result<()> {
        let entry = self.raw_entry(index)?;
        let start = entry.data_start();
        let end = start
            .checked_add(entry.size as usize)
            .filter(|end| *end <= self.data.len())
            .ok_or(Error::EntryOutOfBounds {
                index,
                start,
                end: start.saturating_add(entry.size as usize),
                len: self.data.len(),
            })?;

        if !self.data[end..].contains(&0) {
            return Err(Error::MissingNameTerminator { index });
        }

        Ok(())
    }

    fn raw_entry(&self, index: u16) -> Result<Entry> {
        let start = Header::SIZE + index as usize * Entry::SIZE;
        let raw = self.data.get(start..start + Entry::SIZE).unwrap_or(&[]);
        Entry::from_bytes(raw)
    }

    /// Format tag from the header.
    pub fn magic(&self) -> u16 {
        self.header.magic
    }

    pub fn num_entries(&self) -> u16 {
        self.header.entry_count
    }

    /// Total length of the backing region in bytes.
    pub fn region_len(&self) -> usize {
        self.data.len()
    }

    pub fn has_no_entries(&self) -> bool {
        self.header.entry_count == 0
    }

    /// Decode the table record at `index`.
    pub fn entry(&self, index: u16) -> Option<Entry> {
        if index >= self.header.entry_count {
            return None;
        }
        self.raw_entry(index).ok()
    }

    /// Iterate the raw entry table in stored order.
    pub fn entries(&self) -> Entries<'a> {
        Entries {
            table: &self.data[Header::SIZE..self.header.table_end()],
        }
    }

    /// Offset from the start of the region to the entry's first data byte.
    pub fn entry_data_start(&self, index: u16) -> Option<usize> {
        self.entry(index).map(|e| e.data_start())
    }

    /// The entry's data bytes.
    pub fn entry_data(&self, index: u16) -> Option<&'a [u8]> {
        let entry = self.entry(index)?;
        self.data.get(entry.data_start()..entry.name_start())
    }

    /// The entry's derived name, without its NUL terminator.
    pub fn entry_name(&self, index: u16) -> Option<&'a [u8]> {
        let entry = self.entry(index)?;
        let tail = self.data.get(entry.name_start()..)?;
        let len = tail.iter().position(|&b| b == 0)?;
        Some(&tail[..len])
    }

    /// Whether the table is in strictly ascending name order.
    ///
    /// Lookups assume this holds and do not fall back to a linear scan when
    /// it does not.
    pub fn is_sorted(&self) -> bool {
        (1..self.header.entry_count).all(|i| self.entry_name(i - 1) < self.entry_name(i))
    }
}

/// Iterator over the raw entry table.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    table: &'a [u8],
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        if self.table.len() < Entry::SIZE {
            return None;
        }
        let (raw, rest) = self.table.split_at(Entry::SIZE);
        self.table = rest;
        Entry::from_bytes(raw).ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.table.len() / Entry::SIZE;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Entries<'_> {}
