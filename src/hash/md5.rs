use super::Hasher;

// Per-round left-rotation amounts.
const S: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22,
    5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9, 14, 20,
    4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23,
    6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21,
];

// Binary integer parts of the sines of integers, as per RFC 1321.
const K: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee,
    0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be,
    0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa,
    0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed,
    0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c,
    0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05,
    0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039,
    0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1,
    0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

const INIT: [u32; 4] = [0x67452301, 0xefcdab89, 0x98badcfe, 0x10325476];

/// MD5 hasher (RFC 1321). Digest words are little-endian.
#[derive(Clone)]
pub struct Md5 {
    state: [u32; 4],
    buffer: [u8; 64],
    buffer_len: usize,
    total_len: u64,
}

impl Md5 {
    pub fn new() -> Self {
        Self {
            state: INIT,
            buffer: [0u8; 64],
            buffer_len: 0,
            total_len: 0,
        }
    }

    pub fn hash_bytes(data: &[u8]) -> [u8; 16] {
        let mut hash = Self::new();
        hash.process(data);
        let mut digest = [0u8; 16];
        hash.finish(&mut digest);
        digest
    }

    fn compress(state: &mut [u32; 4], block: &[u8]) {
        debug_assert_eq!(block.len(), 64);

        let mut m = [0u32; 16];
        for (i, chunk) in block.chunks_exact(4).enumerate() {
            m[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        let mut a = state[0];
        let mut b = state[1];
        let mut c = state[2];
        let mut d = state[3];

        for i in 0..64 {
            let (f, g) = match i / 16 {
                0 => (d ^ (b & (c ^ d)), i),
                1 => (c ^ (d & (b ^ c)), (5 * i + 1) % 16),
                2 => (b ^ c ^ d, (3 * i + 5) % 16),
                _ => (c ^ (b | !d), (7 * i) % 16),
            };

            let temp = d;
            d = c;
            c = b;
            b = b.wrapping_add(
                a.wrapping_add(f)
                    .wrapping_add(K[i])
                    .wrapping_add(m[g])
                    .rotate_left(S[i]),
            );
            a = temp;
        }

        state[0] = state[0].wrapping_add(a);
        state[1] = state[1].wrapping_add(b);
        state[2] = state[2].wrapping_add(c);
        state[3] = state[3].wrapping_add(d);
    }
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Md5 {
    const DIGEST_SIZE: usize = 16;

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
        // Pad a copy of the tail so the running state survives the digest.
        let saved = self.state;

        let mut tail = [0u8; 128];
        let len = self.buffer_len;
        tail[..len].copy_from_slice(&self.buffer[..len]);
        tail[len] = 0x80;

        let pad_end = if len < 56 { 56 } else { 120 };
        let total_bits = self.total_len.wrapping_mul(8);
        tail[pad_end..pad_end + 8].copy_from_slice(&total_bits.to_le_bytes());

        let blocks = pad_end + 8;
        for block in tail[..blocks].chunks_exact(64) {
            Self::compress(&mut self.state, block);
        }

        let mut output = [0u8; 16];
        for (i, word) in self.state.iter().enumerate() {
            output[i * 4..(i + 1) * 4].copy_from_slice(&word.to_le_bytes());
        }
        self.state = saved;

        let count = digest.len().min(Self::DIGEST_SIZE);
        digest[..count].copy_from_slice(&output[..count]);
    }
}
