use std::str;

/// Bounded read cursor over a borrowed byte range.
///
/// Every accessor is bounds-checked: a read that would run past the end
/// returns zero (or an empty range) and leaves the cursor where it was.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryReader<'a> {
    data: &'a [u8],
    offset: usize,
}

macro_rules! reader_accessors {
    ($read:ident, $read_at:ident, $ty:ty, $from:ident) => {
        pub fn $read(&mut self) -> $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            if self.offset + WIDTH <= self.data.len() {
                let mut bytes = [0u8; WIDTH];
                bytes.copy_from_slice(&self.data[self.offset..self.offset + WIDTH]);
                self.offset += WIDTH;
                <$ty>::$from(bytes)
            } else {
                0
            }
        }

        /// Seek to `offset`, then read.
        pub fn $read_at(&mut self, offset: usize) -> $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            if offset + WIDTH <= self.data.len() {
                self.offset = offset;
                self.$read()
            } else {
                0
            }
        }
    };
}

impl<'a> MemoryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.data.len());
    }

    pub fn skip(&mut self, count: usize) {
        self.offset = (self.offset + count).min(self.data.len());
    }

    pub fn read8(&mut self) -> u8 {
        if self.offset < self.data.len() {
            let value = self.data[self.offset];
            self.offset += 1;
            value
        } else {
            0
        }
    }

    pub fn read8_at(&mut self, offset: usize) -> u8 {
        if offset < self.data.len() {
            self.offset = offset;
            self.read8()
        } else {
            0
        }
    }

    reader_accessors!(read16_le, read16_le_at, u16, from_le_bytes);
    reader_accessors!(read16_be, read16_be_at, u16, from_be_bytes);
    reader_accessors!(read32_le, read32_le_at, u32, from_le_bytes);
    reader_accessors!(read32_be, read32_be_at, u32, from_be_bytes);
    reader_accessors!(read64_le, read64_le_at, u64, from_le_bytes);
    reader_accessors!(read64_be, read64_be_at, u64, from_be_bytes);

    /// Borrow the next `length` bytes and advance. Returns an empty slice
    /// without moving the cursor if fewer than `length` bytes remain.
    pub fn read_span(&mut self, length: usize) -> &'a [u8] {
        if self.offset + length <= self.data.len() {
            let span = &self.data[self.offset..self.offset + length];
            self.offset += length;
            span
        } else {
            &[]
        }
    }

    pub fn read_span_at(&mut self, offset: usize, length: usize) -> &'a [u8] {
        if offset + length <= self.data.len() {
            self.offset = offset;
            self.read_span(length)
        } else {
            &[]
        }
    }

    /// Read a string bounded by `length` bytes, trimmed at the first NUL.
    pub fn read_string(&mut self, length: usize) -> &'a str {
        let bytes = self.read_span(length);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let bytes = &bytes[..end];
        match str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    pub fn read_string_at(&mut self, offset: usize, length: usize) -> &'a str {
        if offset + length <= self.data.len() {
            self.offset = offset;
            self.read_string(length)
        } else {
            ""
        }
    }

    /// Carve a sub-reader over the next `size` bytes and advance past them.
    /// `size` must not exceed `remaining()`.
    pub fn span(&mut self, size: usize) -> MemoryReader<'a> {
        debug_assert!(size <= self.remaining());
        let size = size.min(self.remaining());
        let reader = MemoryReader::new(&self.data[self.offset..self.offset + size]);
        self.offset += size;
        reader
    }

    pub fn span_at(&mut self, offset: usize, size: usize) -> MemoryReader<'a> {
        self.seek(offset);
        self.span(size)
    }
}

/// Bounded write cursor over a borrowed byte range.
///
/// A write past the end truncates silently to the remaining capacity;
/// callers that care compare `offset()` with `size()` afterwards.
#[derive(Debug, Default)]
pub struct MemoryWriter<'a> {
    data: &'a mut [u8],
    offset: usize,
}

macro_rules! writer_accessors {
    ($put:ident, $put_at:ident, $ty:ty, $to:ident) => {
        pub fn $put(&mut self, value: $ty) {
            self.put_bytes(&value.$to());
        }

        /// Seek to `offset`, then write.
        pub fn $put_at(&mut self, offset: usize, value: $ty) {
            self.seek(offset);
            self.$put(value);
        }
    };
}

impl<'a> MemoryWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn data(&self) -> &[u8] {
        self.data
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset.min(self.data.len());
    }

    pub fn skip(&mut self, count: usize) {
        self.offset = (self.offset + count).min(self.data.len());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        let count = bytes.len().min(self.remaining());
        self.data[self.offset..self.offset + count].copy_from_slice(&bytes[..count]);
        self.offset += count;
    }

    pub fn put_bytes_at(&mut self, offset: usize, bytes: &[u8]) {
        self.seek(offset);
        self.put_bytes(bytes);
    }

    pub fn put8(&mut self, value: u8) {
        if self.offset < self.data.len() {
            self.data[self.offset] = value;
            self.offset += 1;
        }
    }

    pub fn put8_at(&mut self, offset: usize, value: u8) {
        self.seek(offset);
        self.put8(value);
    }

    writer_accessors!(put16_le, put16_le_at, u16, to_le_bytes);
    writer_accessors!(put16_be, put16_be_at, u16, to_be_bytes);
    writer_accessors!(put32_le, put32_le_at, u32, to_le_bytes);
    writer_accessors!(put32_be, put32_be_at, u32, to_be_bytes);
    writer_accessors!(put64_le, put64_le_at, u64, to_le_bytes);
    writer_accessors!(put64_be, put64_be_at, u64, to_be_bytes);

    pub fn put_string(&mut self, s: &str) {
        self.put_bytes(s.as_bytes());
    }

    pub fn put_string_at(&mut self, offset: usize, s: &str) {
        self.seek(offset);
        self.put_string(s);
    }

    pub fn put_zero(&mut self, count: usize) {
        let count = count.min(self.remaining());
        for byte in &mut self.data[self.offset..self.offset + count] {
            *byte = 0;
        }
        self.offset += count;
    }

    /// Carve a fixed-size sub-writer over the next `size` bytes and advance
    /// past them. Used to reserve a header that is filled in later.
    pub fn object_writer(&mut self, size: usize) -> MemoryWriter<'_> {
        let size = size.min(self.remaining());
        let start = self.offset;
        self.offset += size;
        MemoryWriter::new(&mut self.data[start..start + size])
    }

    pub fn object_writer_at(&mut self, offset: usize, size: usize) -> MemoryWriter<'_> {
        self.seek(offset);
        self.object_writer(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Fnva64, Hasher, Md5, Sha256};

    #[test]
    fn read_both_endians() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut reader = MemoryReader::new(&data);
        assert_eq!(reader.read16_be(), 0x0102);
        assert_eq!(reader.read16_le(), 0x0403);
        assert_eq!(reader.read32_be(), 0x05060708);
        assert_eq!(reader.remaining(), 0);

        reader.reset();
        assert_eq!(reader.read32_le(), 0x04030201);
        assert_eq!(reader.read64_be_at(0), 0x0102030405060708);
    }

    #[test]
    fn short_read_returns_zero_and_keeps_cursor() {
        let data = [0xaa, 0xbb, 0xcc];
        let mut reader = MemoryReader::new(&data);
        reader.skip(2);
        assert_eq!(reader.read16_be(), 0);
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read8(), 0xcc);
        assert_eq!(reader.read8(), 0);
        assert_eq!(reader.offset(), 3);
    }

    #[test]
    fn read_string_trims_at_nul() {
        let data = b"ping\0pong";
        let mut reader = MemoryReader::new(data);
        assert_eq!(reader.read_string(9), "ping");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn span_advances_parent() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut reader = MemoryReader::new(&data);
        let mut head = reader.span(4);
        assert_eq!(head.read32_be(), 0x01020304);
        assert_eq!(reader.offset(), 4);
        assert_eq!(reader.read16_be(), 0x0506);
    }

    #[test]
    fn writer_reader_pairing() {
        let mut buffer = [0u8; 32];
        {
            let mut writer = MemoryWriter::new(&mut buffer);
            writer.put16_le(0xbeef);
            writer.put32_be(0xdeadc0de);
            writer.put64_le(0x0102030405060708);
            writer.put8(0x7f);
            assert_eq!(writer.offset(), 15);
        }
        let mut reader = MemoryReader::new(&buffer);
        assert_eq!(reader.read16_le(), 0xbeef);
        assert_eq!(reader.read32_be(), 0xdeadc0de);
        assert_eq!(reader.read64_le(), 0x0102030405060708);
        assert_eq!(reader.read8(), 0x7f);
    }

    #[test]
    fn writer_truncates_silently() {
        let mut buffer = [0u8; 3];
        let mut writer = MemoryWriter::new(&mut buffer);
        writer.put32_be(0x11223344);
        assert_eq!(writer.offset(), 3);
        assert_eq!(writer.data(), &[0x11, 0x22, 0x33]);
        writer.put8(0x55);
        assert_eq!(writer.offset(), 3);
    }

    #[test]
    fn object_writer_reserves_header() {
        let mut buffer = [0u8; 12];
        let mut writer = MemoryWriter::new(&mut buffer);
        {
            let mut header = writer.object_writer(4);
            header.put32_le(0);
        }
        writer.put_string("body");
        let body_len = (writer.offset() - 4) as u32;
        writer.put32_le_at(0, body_len);

        let mut reader = MemoryReader::new(&buffer);
        assert_eq!(reader.read32_le(), 4);
        assert_eq!(reader.read_string(4), "body");
    }

    #[test]
    fn put_zero_and_bounded_strings() {
        let mut buffer = [0xffu8; 8];
        let mut writer = MemoryWriter::new(&mut buffer);
        writer.put_string("ok");
        writer.put_zero(6);
        let mut reader = MemoryReader::new(&buffer);
        assert_eq!(reader.read_string(8), "ok");
    }

    // Packed archive layout, as consumers author it: a header {length,
    // fnv64} whose length spans the whole block section (each block is a
    // 12-byte {length, fnv64} header plus its bytes) and whose hash is the
    // multiply-then-xor FNV over that section, then a SHA-256 footer over
    // everything before it.
    fn write_archive(buffer: &mut [u8], blocks: &[&[u8]], big_endian: bool) -> usize {
        let mut writer = MemoryWriter::new(buffer);

        // the header is back-patched once the block section is in place
        writer.put_zero(12);

        for block in blocks {
            let fnv = Fnva64::hash_bytes(block);
            if big_endian {
                writer.put32_be(block.len() as u32);
                writer.put64_be(fnv);
            } else {
                writer.put32_le(block.len() as u32);
                writer.put64_le(fnv);
            }
            writer.put_bytes(block);
        }

        let section_end = writer.offset();
        let section_fnv = Fnva64::hash_bytes(&writer.data()[12..section_end]);
        if big_endian {
            writer.put32_be_at(0, (section_end - 12) as u32);
            writer.put64_be(section_fnv);
        } else {
            writer.put32_le_at(0, (section_end - 12) as u32);
            writer.put64_le(section_fnv);
        }
        writer.seek(section_end);

        let mut sha = Sha256::default();
        sha.process(&writer.data()[..section_end]);
        let mut footer = [0u8; 32];
        sha.finish(&mut footer);
        writer.put_bytes(&footer);
        writer.offset()
    }

    fn check_archive(data: &[u8], blocks: &[&[u8]], big_endian: bool) {
        let mut reader = MemoryReader::new(data);
        let section_len = if big_endian {
            reader.read32_be()
        } else {
            reader.read32_le()
        } as usize;
        let header_fnv = if big_endian {
            reader.read64_be()
        } else {
            reader.read64_le()
        };

        let expected: usize = blocks.iter().map(|block| 12 + block.len()).sum();
        assert_eq!(section_len, expected);
        assert_eq!(Fnva64::hash_bytes(&data[12..12 + section_len]), header_fnv);

        for block in blocks {
            let length = if big_endian {
                reader.read32_be()
            } else {
                reader.read32_le()
            } as usize;
            let fnv = if big_endian {
                reader.read64_be()
            } else {
                reader.read64_le()
            };
            assert_eq!(length, block.len());
            let bytes = reader.read_span(length);
            assert_eq!(bytes, *block);
            assert_eq!(Fnva64::hash_bytes(bytes), fnv);
        }

        let body_end = reader.offset();
        assert_eq!(body_end, 12 + section_len);

        let mut sha = Sha256::default();
        sha.process(&data[..body_end]);
        let mut digest = [0u8; 32];
        sha.finish(&mut digest);
        assert_eq!(reader.read_span(32), &digest[..]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn archive_round_trip_little_endian() {
        let blocks: [&[u8]; 3] = [b"first block", b"second", b"third block of data"];
        let mut buffer = [0u8; 256];
        let written = write_archive(&mut buffer, &blocks, false);
        check_archive(&buffer[..written], &blocks, false);
    }

    #[test]
    fn archive_round_trip_big_endian() {
        let blocks: [&[u8]; 2] = [b"alpha", b"beta"];
        let mut buffer = [0u8; 128];
        let written = write_archive(&mut buffer, &blocks, true);
        check_archive(&buffer[..written], &blocks, true);
    }

    // Reference archives, byte for byte. The reader must reproduce their
    // parsed structure and the writer must rebuild them identically.

    const PACKED_LE_ARCHIVE_A: [u8; 148] = [
        0x68, 0x00, 0x00, 0x00, 0x11, 0x7c, 0xed, 0xdd, 0xfc, 0x5d, 0x7b, 0xb9,
        0x10, 0x00, 0x00, 0x00, 0xdf, 0xdf, 0x41, 0xa1, 0x98, 0x7a, 0xa2, 0x17,
        0x3a, 0x5f, 0x62, 0x4d, 0x57, 0x56, 0x77, 0x6f, 0x33, 0x4d, 0x3f, 0x4d,
        0x3b, 0x47, 0x51, 0x64, 0x40, 0x00, 0x00, 0x00, 0x26, 0xb5, 0xd7, 0xcb,
        0x67, 0x58, 0x43, 0x2b, 0x39, 0x76, 0x6e, 0x35, 0x4b, 0x30, 0x46, 0x32,
        0x4e, 0x53, 0x70, 0x50, 0x49, 0x3d, 0x6c, 0x5a, 0x6c, 0x69, 0x6e, 0x59,
        0x77, 0x6d, 0x56, 0x60, 0x74, 0x42, 0x5e, 0x60, 0x5a, 0x4b, 0x44, 0x52,
        0x78, 0x5a, 0x68, 0x7a, 0x49, 0x5e, 0x69, 0x73, 0x33, 0x39, 0x5f, 0x75,
        0x54, 0x62, 0x72, 0x77, 0x51, 0x6c, 0x3f, 0x54, 0x42, 0x6c, 0x33, 0x34,
        0x51, 0x6a, 0x33, 0x42, 0x38, 0x60, 0x6a, 0x61, 0xbd, 0x99, 0x4f, 0x0b,
        0x17, 0x87, 0x51, 0xc9, 0x51, 0xf6, 0xd5, 0xc0, 0x03, 0xf6, 0xa8, 0x70,
        0x68, 0x7c, 0x8e, 0xf1, 0xef, 0xfd, 0x68, 0x6e, 0xe8, 0x14, 0x43, 0x0b,
        0x14, 0x77, 0x88, 0xf8,
    ];

    const PACKED_LE_ARCHIVE_B: [u8; 268] = [
        0xe0, 0x00, 0x00, 0x00, 0xaf, 0x20, 0xa4, 0xfb, 0x61, 0xea, 0x66, 0xb0,
        0x10, 0x00, 0x00, 0x00, 0xba, 0x15, 0x5d, 0x74, 0xb7, 0x44, 0xf7, 0x28,
        0x31, 0x5e, 0x3f, 0x60, 0x30, 0x64, 0x4a, 0x34, 0x4d, 0x6e, 0x43, 0x3e,
        0x67, 0x3a, 0x37, 0x6d, 0x10, 0x00, 0x00, 0x00, 0xfa, 0xb4, 0x88, 0x6c,
        0x5f, 0xe8, 0x96, 0xa0, 0x63, 0x50, 0x76, 0x63, 0x47, 0x6c, 0x6f, 0x50,
        0x4c, 0x51, 0x55, 0x39, 0x5e, 0x54, 0x5b, 0x4f, 0x10, 0x00, 0x00, 0x00,
        0xef, 0x06, 0x94, 0x7d, 0x3e, 0x01, 0x6d, 0x87, 0x40, 0x57, 0x40, 0x73,
        0x56, 0x60, 0x4c, 0x69, 0x58, 0x52, 0x38, 0x71, 0x3e, 0x6d, 0x75, 0x6e,
        0x80, 0x00, 0x00, 0x00, 0x6a, 0x64, 0x8b, 0x04, 0x78, 0x25, 0x99, 0x96,
        0x75, 0x76, 0x56, 0x58, 0x35, 0x35, 0x6b, 0x62, 0x33, 0x5d, 0x4c, 0x58,
        0x4d, 0x5d, 0x56, 0x70, 0x70, 0x58, 0x46, 0x37, 0x64, 0x3e, 0x4e, 0x73,
        0x44, 0x64, 0x6e, 0x42, 0x77, 0x3d, 0x53, 0x77, 0x61, 0x46, 0x52, 0x6c,
        0x3d, 0x31, 0x4d, 0x74, 0x70, 0x35, 0x42, 0x5a, 0x4a, 0x69, 0x6e, 0x6a,
        0x52, 0x4b, 0x62, 0x67, 0x64, 0x3f, 0x47, 0x3c, 0x42, 0x54, 0x4f, 0x4a,
        0x7a, 0x38, 0x73, 0x69, 0x35, 0x34, 0x5a, 0x6c, 0x33, 0x64, 0x51, 0x67,
        0x48, 0x4d, 0x58, 0x39, 0x6b, 0x4f, 0x32, 0x43, 0x3c, 0x43, 0x30, 0x69,
        0x62, 0x31, 0x4d, 0x4a, 0x30, 0x74, 0x6d, 0x74, 0x38, 0x35, 0x53, 0x7a,
        0x6e, 0x3f, 0x44, 0x51, 0x5b, 0x6b, 0x41, 0x56, 0x74, 0x33, 0x7a, 0x74,
        0x5b, 0x54, 0x3f, 0x68, 0x63, 0x3b, 0x74, 0x36, 0x5b, 0x75, 0x52, 0x6f,
        0x37, 0x5b, 0x6a, 0x40, 0x4b, 0x38, 0x45, 0x4b, 0x00, 0x0a, 0x64, 0x00,
        0xea, 0x66, 0xae, 0x06, 0x41, 0x5f, 0x2c, 0x11, 0x30, 0x3b, 0x1d, 0xfe,
        0xba, 0xc5, 0x93, 0x8d, 0x76, 0xcd, 0xa8, 0x67, 0x2b, 0x0d, 0xf5, 0x34,
        0x50, 0x29, 0x23, 0x8c,
    ];

    const PACKED_BE_ARCHIVE_A: [u8; 332] = [
        0x00, 0x00, 0x01, 0x20, 0x30, 0x4c, 0xe9, 0x3a, 0xbc, 0x45, 0xb9, 0xe8,
        0x00, 0x00, 0x00, 0x10, 0xf5, 0xa5, 0x1f, 0xd7, 0x0e, 0x05, 0x92, 0x79,
        0x32, 0x79, 0x6d, 0x30, 0x33, 0x59, 0x31, 0x4a, 0x4a, 0x45, 0x3c, 0x57,
        0x5d, 0x52, 0x73, 0x35, 0x00, 0x00, 0x00, 0x20, 0x8f, 0x4d, 0x3c, 0x38,
        0xef, 0x13, 0x98, 0x17, 0x57, 0x5e, 0x46, 0x63, 0x62, 0x72, 0x52, 0x38,
        0x35, 0x6a, 0x33, 0x56, 0x38, 0x4c, 0x59, 0x49, 0x37, 0x39, 0x56, 0x73,
        0x72, 0x36, 0x45, 0x78, 0x59, 0x6b, 0x31, 0x3d, 0x77, 0x66, 0x76, 0x33,
        0x00, 0x00, 0x00, 0x40, 0xf6, 0xb1, 0x04, 0x4c, 0x87, 0x7b, 0xad, 0x0c,
        0x44, 0x44, 0x3c, 0x68, 0x6b, 0x41, 0x33, 0x73, 0x30, 0x52, 0x63, 0x57,
        0x73, 0x38, 0x3d, 0x5e, 0x50, 0x65, 0x76, 0x5d, 0x53, 0x72, 0x49, 0x79,
        0x76, 0x4c, 0x38, 0x5b, 0x49, 0x76, 0x56, 0x53, 0x70, 0x35, 0x43, 0x37,
        0x55, 0x4c, 0x66, 0x3e, 0x69, 0x4a, 0x41, 0x70, 0x35, 0x34, 0x73, 0x6f,
        0x4f, 0x7a, 0x31, 0x6d, 0x66, 0x3e, 0x78, 0x66, 0x3b, 0x57, 0x6b, 0x76,
        0x61, 0x74, 0x5a, 0x51, 0x00, 0x00, 0x00, 0x80, 0xdf, 0x44, 0x4f, 0x2d,
        0x2c, 0xcc, 0x1b, 0x60, 0x78, 0x79, 0x5a, 0x72, 0x62, 0x67, 0x6a, 0x70,
        0x78, 0x3c, 0x41, 0x3a, 0x60, 0x76, 0x31, 0x5f, 0x42, 0x3d, 0x75, 0x55,
        0x46, 0x4d, 0x5a, 0x52, 0x52, 0x46, 0x40, 0x77, 0x66, 0x74, 0x68, 0x40,
        0x36, 0x61, 0x58, 0x58, 0x72, 0x57, 0x41, 0x4e, 0x4c, 0x4d, 0x6b, 0x3b,
        0x51, 0x4c, 0x4b, 0x76, 0x6d, 0x4a, 0x34, 0x40, 0x4a, 0x51, 0x4d, 0x4e,
        0x3a, 0x51, 0x51, 0x46, 0x44, 0x41, 0x4a, 0x74, 0x37, 0x4d, 0x44, 0x7a,
        0x45, 0x42, 0x5f, 0x4f, 0x36, 0x6c, 0x42, 0x55, 0x53, 0x37, 0x4c, 0x6c,
        0x33, 0x57, 0x66, 0x3f, 0x5f, 0x56, 0x7a, 0x49, 0x63, 0x58, 0x69, 0x75,
        0x58, 0x68, 0x38, 0x75, 0x70, 0x4d, 0x4a, 0x30, 0x3c, 0x39, 0x50, 0x41,
        0x50, 0x36, 0x62, 0x6f, 0x4a, 0x6e, 0x47, 0x5a, 0x56, 0x58, 0x3a, 0x71,
        0x76, 0x5b, 0x5a, 0x35, 0x79, 0x58, 0x30, 0x58, 0x3e, 0x56, 0x6e, 0x63,
        0x3d, 0x3f, 0xb7, 0x32, 0xbb, 0xde, 0x05, 0x96, 0xa1, 0xc4, 0x1f, 0x0f,
        0xd4, 0x82, 0x1b, 0x8b, 0x6b, 0x59, 0xa3, 0x70, 0x67, 0xc1, 0xd6, 0xae,
        0xe4, 0x10, 0x4f, 0x7d, 0xfa, 0x8a, 0x7f, 0x58,
    ];

    const PACKED_BE_ARCHIVE_B: [u8; 185] = [
        0x00, 0x00, 0x00, 0x8d, 0xdd, 0xfb, 0x5d, 0x76, 0x54, 0x12, 0xc8, 0xd7,
        0x00, 0x00, 0x00, 0x1c, 0x68, 0xd7, 0x9e, 0x97, 0xf4, 0x3b, 0x0a, 0x09,
        0x68, 0x76, 0x4e, 0x6a, 0x46, 0x3d, 0x35, 0x32, 0x64, 0x4d, 0x6e, 0x64,
        0x47, 0x49, 0x4f, 0x54, 0x71, 0x40, 0x72, 0x32, 0x36, 0x4b, 0x61, 0x57,
        0x5f, 0x3f, 0x5b, 0x6b, 0x00, 0x00, 0x00, 0x1d, 0xf6, 0x35, 0x6c, 0x65,
        0x3f, 0xe5, 0x8d, 0x64, 0x70, 0x67, 0x37, 0x77, 0x3d, 0x3b, 0x31, 0x6c,
        0x50, 0x76, 0x59, 0x6f, 0x69, 0x32, 0x5d, 0x5b, 0x79, 0x3c, 0x4e, 0x51,
        0x50, 0x65, 0x30, 0x4b, 0x57, 0x6a, 0x79, 0x77, 0x4b, 0x00, 0x00, 0x00,
        0x0b, 0x35, 0x48, 0xd1, 0xe1, 0x82, 0xe4, 0xe8, 0x47, 0x72, 0x52, 0x58,
        0x51, 0x53, 0x43, 0x44, 0x40, 0x72, 0x69, 0x40, 0x00, 0x00, 0x00, 0x19,
        0x38, 0xf2, 0xb9, 0x79, 0xf8, 0xc0, 0xfe, 0x26, 0x6b, 0x72, 0x79, 0x6b,
        0x4c, 0x51, 0x6a, 0x32, 0x71, 0x44, 0x59, 0x34, 0x5e, 0x3f, 0x40, 0x6f,
        0x79, 0x3e, 0x5b, 0x47, 0x57, 0x5e, 0x49, 0x56, 0x5e, 0xc5, 0xf4, 0x0f,
        0xb4, 0x7b, 0x6d, 0x65, 0x68, 0xc3, 0x0e, 0x56, 0xe8, 0xfe, 0xbc, 0x61,
        0xea, 0xc3, 0x50, 0xec, 0x8e, 0x46, 0xe8, 0x40, 0x37, 0xdc, 0xb5, 0x51,
        0xa1, 0xc5, 0x67, 0xdb, 0x5b,
    ];

    fn hex(digest: &[u8]) -> String {
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn check_reference_archive(
        archive: &[u8],
        blocks: &[&[u8]],
        big_endian: bool,
        md5: &str,
    ) {
        // the reader reproduces the parsed structure
        check_archive(archive, blocks, big_endian);

        // the writer reproduces the reference bytes identically
        let mut buffer = [0u8; 512];
        let written = write_archive(&mut buffer, blocks, big_endian);
        assert_eq!(&buffer[..written], archive);

        // whole-archive digest recorded alongside the reference data
        assert_eq!(hex(&Md5::hash_bytes(archive)), md5);
    }

    #[test]
    fn reference_archive_le_a() {
        let blocks: [&[u8]; 2] = [
            b":_bMWVwo3M?M;GQd",
            b"9vn5K0F2NSpPI=lZlinYwmV`tB^`ZKDRxZhzI^is39_uTbrwQl?TBl34Qj3B8`ja",
        ];
        check_reference_archive(
            &PACKED_LE_ARCHIVE_A,
            &blocks,
            false,
            "ca2f18d63d03e3a5e11c0d7dd605daf1",
        );
    }

    #[test]
    fn reference_archive_le_b() {
        let blocks: [&[u8]; 4] = [
            b"1^?`0dJ4MnC>g:7m",
            b"cPvcGloPLQU9^T[O",
            b"@W@sV`LiXR8q>mun",
            b"uvVX55kb3]LXM]VppXF7d>NsDdnBw=SwaFRl=1Mtp5BZJinjRKbgd?G<BTOJz8si54Zl3dQgHMX9kO2C<C0ib1MJ0tmt85Szn?DQ[kAVt3zt[T?hc;t6[uRo7[j@K8EK",
        ];
        check_reference_archive(
            &PACKED_LE_ARCHIVE_B,
            &blocks,
            false,
            "28c47c619493baf4b9f65d1b0f026fbd",
        );
    }

    #[test]
    fn reference_archive_be_a() {
        let blocks: [&[u8]; 4] = [
            b"2ym03Y1JJE<W]Rs5",
            b"W^FcbrR85j3V8LYI79Vsr6ExYk1=wfv3",
            b"DD<hkA3s0RcWs8=^Pev]SrIyvL8[IvVSp5C7ULf>iJAp54soOz1mf>xf;WkvatZQ",
            b"xyZrbgjpx<A:`v1_B=uUFMZRRF@wfth@6aXXrWANLMk;QLKvmJ4@JQMN:QQFDAJt7MDzEB_O6lBUS7Ll3Wf?_VzIcXiuXh8upMJ0<9PAP6boJnGZVX:qv[Z5yX0X>Vnc",
        ];
        check_reference_archive(
            &PACKED_BE_ARCHIVE_A,
            &blocks,
            true,
            "e350aa0b706e54adb465131f075e8f7c",
        );
    }

    #[test]
    fn reference_archive_be_b() {
        let blocks: [&[u8]; 4] = [
            b"hvNjF=52dMndGIOTq@r26KaW_?[k",
            b"pg7w=;1lPvYoi2][y<NQPe0KWjywK",
            b"rRXQSCD@ri@",
            b"krykLQj2qDY4^?@oy>[GW^IV^",
        ];
        check_reference_archive(
            &PACKED_BE_ARCHIVE_B,
            &blocks,
            true,
            "83ad7d235dd222e02cb4490926b3c219",
        );
    }
}
