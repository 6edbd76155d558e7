use byteorder::{ByteOrder, LittleEndian};

use super::error::{Error, Result};

/// Magic tag written by the image generator.
pub const DEFAULT_MAGIC: u16 = 0x8000;

/// Image header - 4 bytes at offset 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u16,
    pub entry_count: u16,
}

impl Header {
    pub const SIZE: usize = 4;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                what: "header",
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            magic: LittleEndian::read_u16(&data[0..2]),
            entry_count: LittleEndian::read_u16(&data[2..4]),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u16(&mut buf[0..2], self.magic);
        LittleEndian::write_u16(&mut buf[2..4], self.entry_count);
        buf
    }

    /// Length of the header plus the entry table it announces.
    pub fn table_end(&self) -> usize {
        Self::SIZE + self.entry_count as usize * Entry::SIZE
    }
}

/// Entry table record - 7 bytes: a 24-bit data size followed by a 32-bit node offset.
///
/// The entry's name is not stored in the table. It starts right after the
/// data at `offset + size` and runs up to a NUL terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub size: u32,
    pub offset: u32,
}

impl Entry {
    pub const SIZE: usize = 7;
    /// Largest file the 24-bit size field can describe.
    pub const MAX_SIZE: u32 = 0xFF_FFFF;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Truncated {
                what: "entry",
                needed: Self::SIZE,
                available: data.len(),
            });
        }

        Ok(Self {
            size: LittleEndian::read_u24(&data[0..3]),
            offset: LittleEndian::read_u32(&data[3..7]),
        })
    }

    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE]> {
        if self.size > Self::MAX_SIZE {
            return Err(Error::FileTooLarge(self.size as u64));
        }

        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u24(&mut buf[0..3], self.size);
        LittleEndian::write_u32(&mut buf[3..7], self.offset);
        Ok(buf)
    }

    /// Offset of the first data byte, relative to the start of the image.
    pub fn data_start(&self) -> usize {
        self.offset as usize
    }

    /// Offset of the derived name, which is also one past the last data byte.
    pub fn name_start(&self) -> usize {
        self.offset as usize + self.size as usize
    }
}
