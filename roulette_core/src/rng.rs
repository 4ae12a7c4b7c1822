use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

// server_seed (secret) keys an HMAC over "client_seed:nonce"; the digest is
// read as big-endian u32 words mapped onto [0,1) and re-hashed when exhausted.

pub type HmacSha256 = Hmac<Sha256>;

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

#[derive(Debug, Clone)]
pub struct SeededRng {
    server_seed_hash: String,
    buffer: Vec<u8>,
    cursor: usize,
}

impl SeededRng {
    pub fn new(server_seed: &str, client_seed: &str, nonce: u64) -> Result<Self, CoreError> {
        let mut mac =
            HmacSha256::new_from_slice(server_seed.as_bytes()).map_err(|_| CoreError::SeedKey)?;
        mac.update(format!("{client_seed}:{nonce}").as_bytes());
        Ok(Self {
            server_seed_hash: derive_hash_hex(server_seed.as_bytes()),
            buffer: mac.finalize().into_bytes().to_vec(),
            cursor: 0,
        })
    }

    /// SHA-256 commitment of the server seed, safe to publish before the spin.
    pub fn server_seed_hash_hex(&self) -> &str {
        &self.server_seed_hash
    }

    pub fn next_f64(&mut self) -> f64 {
        if self.cursor + 4 > self.buffer.len() {
            self.buffer = Sha256::digest(&self.buffer).to_vec();
            self.cursor = 0;
        }
        let chunk = &self.buffer[self.cursor..self.cursor + 4];
        self.cursor += 4;
        let v = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        (v as f64) / (u32::MAX as f64 + 1.0)
    }

    /// Uniform pick in `min..=max`.
    pub fn next_in(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        let span = (max - min) as f64 + 1.0;
        min + ((self.next_f64() * span).floor() as u64).min(max - min)
    }
}
