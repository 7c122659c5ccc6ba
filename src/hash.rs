pub mod fnv;
pub mod md5;
pub mod sha1;
pub mod sha256;

pub use fnv::{Fnv32, Fnv64, Fnva32, Fnva64};
pub use md5::Md5;
pub use sha1::Sha1;
pub use sha256::Sha256;

/// Streaming hash contract shared by every algorithm in the crate.
///
/// `finish` is destructive-but-recoverable: the implementation saves its
/// state before padding and restores it afterwards, so the same object can
/// keep accepting data after a digest has been taken.
pub trait Hasher {
    /// Digest width in bytes.
    const DIGEST_SIZE: usize;

    /// Input block width in bytes. Every block algorithm here uses 64.
    const BLOCK_SIZE: usize = 64;

    fn reset(&mut self);

    fn process(&mut self, data: &[u8]);

    /// Write the digest into `digest`, capped at `DIGEST_SIZE` bytes.
    fn finish(&mut self, digest: &mut [u8]);
}

/// HMAC over any block-oriented hash (RFC 2104).
///
/// Keys longer than the block size are hashed down first; shorter keys are
/// zero-padded. `finish` inherits the recoverable behaviour of the inner
/// hash, so a MAC can be taken mid-stream.
pub struct Hmac<H: Hasher + Default> {
    inner: H,
    ipad: [u8; 64],
    opad: [u8; 64],
}

impl<H: Hasher + Default> Hmac<H> {
    pub fn new(key: &[u8]) -> Self {
        debug_assert!(H::BLOCK_SIZE == 64);
        debug_assert!(H::DIGEST_SIZE <= 64);

        let mut block = [0u8; 64];
        if key.len() > 64 {
            let mut hash = H::default();
            hash.process(key);
            hash.finish(&mut block[..H::DIGEST_SIZE]);
        } else {
            block[..key.len()].copy_from_slice(key);
        }

        let mut ipad = [0x36u8; 64];
        let mut opad = [0x5cu8; 64];
        for i in 0..64 {
            ipad[i] ^= block[i];
            opad[i] ^= block[i];
        }

        let mut inner = H::default();
        inner.process(&ipad);

        Self { inner, ipad, opad }
    }

    /// One-shot MAC into `digest`.
    pub fn mac(key: &[u8], data: &[u8], digest: &mut [u8]) {
        let mut hmac = Self::new(key);
        hmac.process(data);
        hmac.finish(digest);
    }
}

impl<H: Hasher + Default> Hasher for Hmac<H> {
    const DIGEST_SIZE: usize = H::DIGEST_SIZE;
    const BLOCK_SIZE: usize = H::BLOCK_SIZE;

    fn reset(&mut self) {
        self.inner.reset();
        self.inner.process(&self.ipad);
    }

    fn process(&mut self, data: &[u8]) {
        self.inner.process(data);
    }

    fn finish(&mut self, digest: &mut [u8]) {
        let mut inner_digest = [0u8; 64];
        self.inner.finish(&mut inner_digest[..H::DIGEST_SIZE]);

        let mut outer = H::default();
        outer.process(&self.opad);
        outer.process(&inner_digest[..H::DIGEST_SIZE]);
        outer.finish(digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(digest: &[u8]) -> String {
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn digest_of<H: Hasher + Default>(parts: &[&[u8]]) -> Vec<u8> {
        let mut hash = H::default();
        for part in parts {
            hash.process(part);
        }
        let mut digest = vec![0u8; H::DIGEST_SIZE];
        hash.finish(&mut digest);
        digest
    }

    #[test]
    fn empty_input_vectors() {
        assert_eq!(
            hex(&digest_of::<Md5>(&[])),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex(&digest_of::<Sha1>(&[])),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            hex(&digest_of::<Sha256>(&[])),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn alphabet_vectors() {
        let alphabet = b"abcdefghijklmnopqrstuvwxyz";
        assert_eq!(
            hex(&digest_of::<Sha1>(&[alphabet])),
            "32d10c7b8cf96570ca04ce37f2a19d84240d3a89"
        );
        assert_eq!(
            hex(&digest_of::<Md5>(&[alphabet])),
            "c3fcd3d76192e4007dfb496cca67e13b"
        );
    }

    #[test]
    fn partitioning_never_changes_the_digest() {
        let data = b"The quick brown fox jumps over the lazy dog, twice around the block";
        let whole = digest_of::<Sha256>(&[data]);

        for split in [1usize, 7, 31, 63, 64, 65] {
            let mut hash = Sha256::default();
            for chunk in data.chunks(split) {
                hash.process(chunk);
            }
            let mut digest = [0u8; 32];
            hash.finish(&mut digest);
            assert_eq!(digest[..], whole[..], "split {}", split);
        }
    }

    #[test]
    fn finish_is_recoverable() {
        let mut hash = Sha1::default();
        hash.process(b"hello ");

        let mut first = [0u8; 20];
        hash.finish(&mut first);

        // the object keeps accepting data as if finish never happened
        hash.process(b"world");
        let mut second = [0u8; 20];
        hash.finish(&mut second);

        assert_eq!(first, digest_of::<Sha1>(&[b"hello "])[..]);
        assert_eq!(second, digest_of::<Sha1>(&[b"hello world"])[..]);
    }

    #[test]
    fn hmac_rfc2202_md5_vectors() {
        let mut digest = [0u8; 16];
        Hmac::<Md5>::mac(&[0x0b; 16], b"Hi There", &mut digest);
        assert_eq!(hex(&digest), "9294727a3638bb1c13f48ef8158bfc9d");

        Hmac::<Md5>::mac(b"Jefe", b"what do ya want for nothing?", &mut digest);
        assert_eq!(hex(&digest), "750c783e6ab0b503eaa86e310a5db738");
    }

    #[test]
    fn hmac_rfc2202_sha1_vectors() {
        let mut digest = [0u8; 20];
        Hmac::<Sha1>::mac(&[0x0b; 20], b"Hi There", &mut digest);
        assert_eq!(hex(&digest), "b617318655057264e28bc0b6fb378c8ef146be00");

        Hmac::<Sha1>::mac(b"Jefe", b"what do ya want for nothing?", &mut digest);
        assert_eq!(hex(&digest), "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79");
    }

    #[test]
    fn hmac_long_key_is_hashed_down() {
        // RFC 2202 case 6: 80-byte key forces the pre-hash path
        let key = [0xaa_u8; 80];
        let mut digest = [0u8; 20];
        Hmac::<Sha1>::mac(&key, b"Test Using Larger Than Block-Size Key - Hash Key First", &mut digest);
        assert_eq!(hex(&digest), "aa4ae5e15272d00e95705637ce8a3b55ed402112");
    }

    #[test]
    fn hmac_matches_two_pass_definition_under_partitioning() {
        let key = b"a modest key";
        let message = b"split me into uneven pieces and nothing changes";

        let mut reference = [0u8; 32];
        Hmac::<Sha256>::mac(key, message, &mut reference);

        for split in [1usize, 3, 11, 64] {
            let mut hmac = Hmac::<Sha256>::new(key);
            for chunk in message.chunks(split) {
                hmac.process(chunk);
            }
            let mut digest = [0u8; 32];
            hmac.finish(&mut digest);
            assert_eq!(digest, reference, "split {}", split);
        }
    }
}
