//! Name lookup over the sorted entry table.

use std::cmp::Ordering;

use super::device::Image;

impl Image<'_> {
    /// Find the index of the entry named exactly `name`.
    ///
    /// Binary search over the table, comparing names as unsigned bytes. The
    /// table must be in ascending name order; on an unsorted table an existing
    /// name may be reported as missing.
    pub fn search(&self, name: impl AsRef<[u8]>) -> Option<u16> {
        let name = name.as_ref();
        let mut low: i32 = 0;
        let mut high: i32 = self.num_entries() as i32 - 1;

        while low <= high {
            let mid = (low + high) / 2;
            // mid is within [0, entry_count) here
            let candidate = self.entry_name(mid as u16)?;
            match candidate.cmp(name) {
                Ordering::Equal => return Some(mid as u16),
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid - 1,
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use crate::image::{Image, ImageBuilder};

    fn sample() -> Vec<u8> {
        let mut builder = ImageBuilder::new();
        for name in ["b", "a", "dir/x.txt", "c.bin", "ab", "dir/y.txt", "z"] {
            builder.add_file(name, name.as_bytes().to_vec()).unwrap();
        }
        builder.build().unwrap()
    }

    #[test]
    fn finds_every_stored_name() {
        let bytes = sample();
        let image = Image::new(&bytes).unwrap();
        for index in 0..image.num_entries() {
            let name = image.entry_name(index).unwrap();
            assert_eq!(image.search(name), Some(index));
        }
    }

    #[test]
    fn misses_absent_names() {
        let bytes = sample();
        let image = Image::new(&bytes).unwrap();
        for name in ["", "0", "aa", "abc", "dir", "dir/", "dir/x.txt\0", "zz", "\u{7f}"] {
            assert_eq!(image.search(name), None, "{name:?}");
        }
    }

    #[test]
    fn prefix_is_not_a_match() {
        let bytes = sample();
        let image = Image::new(&bytes).unwrap();
        assert!(image.search("a").is_some());
        assert!(image.search("ab").is_some());
        assert_ne!(image.search("a"), image.search("ab"));
    }

    #[test]
    fn empty_table_reports_not_found() {
        let bytes = ImageBuilder::new().build().unwrap();
        let image = Image::new(&bytes).unwrap();
        assert_eq!(image.search("anything"), None);
        assert_eq!(image.search(""), None);
    }
}
