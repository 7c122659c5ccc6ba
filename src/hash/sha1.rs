use super::Hasher;

const INIT: [u32; 5] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476, 0xc3d2e1f0];

/// SHA-1 hasher (FIPS 180-4). Digest words are big-endian.
#[derive(Clone)]
pub struct Sha1 {
    state: [u32; 5],
    buffer: [u8; 64],
    buffer_len: usize,
    total_len: u64,
}

impl Sha1 {
    pub fn new() -> Self {
        Self {
            state: INIT,
            buffer: [0u8; 64],
            buffer_len: 0,
            total_len: 0,
        }
    }

    pub fn hash_bytes(data: &[u8]) -> [u8; 20] {
        let mut hash = Self::new();
        hash.process(data);
        let mut digest = [0u8; 20];
        hash.finish(&mut digest);
        digest
    }

    fn compress(state: &mut [u32; 5], block: &[u8]) {
        debug_assert_eq!(block.len(), 64);

        let mut w = [0u32; 80];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        for i in 16..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
        }

        let mut a = state[0];
        let mut b = state[1];
        let mut c = state[2];
        let mut d = state[3];
        let mut e = state[4];

        for (i, &word) in w.iter().enumerate() {
            let (f, k) = match i / 20 {
                0 => (d ^ (b & (c ^ d)), 0x5a827999),
                1 => (b ^ c ^ d, 0x6ed9eba1),
                2 => ((b & c) | (b & d) | (c & d), 0x8f1bbcdc),
                _ => (b ^ c ^ d, 0xca62c1d6),
            };

            let temp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
        state[4] = state[4].wrapping_add(e);
    }
}

impl Default for Sha1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Sha1 {
    const DIGEST_SIZE: usize = 20;

    fn reset(&mut self) {
        self.state = INIT;
        self.buffer = [0u8; 64];
        self.buffer_len = 0;
        self.total_len = 0;
    }

    fn process(&mut self, data: &[u8]) {
        self.total_len += data.len() as u64;

        let mut data = data;

        if self.buffer_len > 0 {
            let space = 64 - self.buffer_len;
            if data.len() < space {
                self.buffer[self.buffer_len..self.buffer_len + data.len()].copy_from_slice(data);
                self.buffer_len += data.len();
                return;
            }
            self.buffer[self.buffer_len..].copy_from_slice(&data[..space]);
            let block = self.buffer;
            Self::compress(&mut self.state, &block);
            data = &data[space..];
            self.buffer_len = 0;
        }

        for chunk in data.chunks_exact(64) {
            Self::compress(&mut self.state, chunk);
        }

        let remainder = data.len() % 64;
        if remainder > 0 {
            self.buffer[..remainder].copy_from_slice(&data[data.len() - remainder..]);
            self.buffer_len = remainder;
        }
    }

    fn finish(&mut self, digest: &mut [u8]) {
        let saved = self.state;

        let mut tail = [0u8; 128];
        let len = self.buffer_len;
        tail[..len].copy_from_slice(&self.buffer[..len]);
        tail[len] = 0x80;

        let pad_end = if len < 56 { 56 } else { 120 };
        let total_bits = self.total_len.wrapping_mul(8);
        tail[pad_end..pad_end + 8].copy_from_slice(&total_bits.to_be_bytes());

        let blocks = pad_end + 8;
        for block in tail[..blocks].chunks_exact(64) {
            Self::compress(&mut self.state, block);
        }

        let mut output = [0u8; 20];
        for (i, word) in self.state.iter().enumerate() {
            output[i * 4..(i + 1) * 4].copy_from_slice(&word.to_be_bytes());
        }
        self.state = saved;

        let count = digest.len().min(Self::DIGEST_SIZE);
        digest[..count].copy_from_slice(&output[..count]);
    }
}
