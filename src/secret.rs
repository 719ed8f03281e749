//! Bit layout of the circuit's secret inputs.
//!
//! Model: for each internal slot the feature index as 8 bits, then the
//! threshold as a 16-bit two's-complement integer; then for each leaf one
//! bit per class. Sample: each value as a 16-bit two's-complement
//! integer. Every integer is written least-significant bit first and bits
//! are packed into bytes starting at bit 0.

use crate::artifact::CompiledArtifact;
use crate::config::CircuitConfig;
use crate::error::{Error, Result};
use crate::eval::check_input;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn push_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append the low `width` bits of `value`, least significant first.
    pub fn push_bits(&mut self, value: u64, width: u32) {
        for i in 0..width {
            self.bits.push((value >> i) & 1 == 1);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.bits.len().div_ceil(8)];
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                out[i / 8] |= 1 << (i % 8);
            }
        }
        out
    }

    pub fn to_hex(&self) -> String {
        self.to_bytes().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn push_i16(buf: &mut BitBuffer, value: i32, what: impl FnOnce() -> String) -> Result<()> {
    let v = i16::try_from(value)
        .map_err(|_| Error::Encoding(format!("{} = {} does not fit 16 bits", what(), value)))?;
    buf.push_bits(u64::from(v as u16), 16);
    Ok(())
}

/// Encode a capacity-exact artifact as the model secret input.
pub fn encode_model(artifact: &CompiledArtifact, config: &CircuitConfig) -> Result<BitBuffer> {
    if artifact.internals.len() != config.internal_capacity
        || artifact.leaves.len() != config.leaf_capacity
    {
        return Err(Error::Encoding(format!(
            "artifact has {} internal / {} leaf slots, circuit expects {} / {}",
            artifact.internals.len(),
            artifact.leaves.len(),
            config.internal_capacity,
            config.leaf_capacity
        )));
    }

    let mut buf = BitBuffer::new();
    for (i, record) in artifact.internals.iter().enumerate() {
        let feature = u8::try_from(record.feature).map_err(|_| {
            Error::Encoding(format!(
                "internal {} feature {} does not fit 8 bits",
                i, record.feature
            ))
        })?;
        buf.push_bits(u64::from(feature), 8);
        push_i16(&mut buf, record.threshold, || format!("internal {} threshold", i))?;
    }
    for (j, leaf) in artifact.leaves.iter().enumerate() {
        if leaf.classification.len() != config.num_classes {
            return Err(Error::Encoding(format!(
                "leaf {} has {} classes, circuit expects {}",
                j,
                leaf.classification.len(),
                config.num_classes
            )));
        }
        for &bit in &leaf.classification {
            if bit > 1 {
                return Err(Error::Encoding(format!(
                    "leaf {} classification entry {} is not a bit",
                    j, bit
                )));
            }
            buf.push_bit(bit == 1);
        }
    }
    Ok(buf)
}

/// Encode an input vector as the sample secret input.
pub fn encode_sample(input: &[i32], config: &CircuitConfig) -> Result<BitBuffer> {
    check_input(input, config)?;
    let mut buf = BitBuffer::new();
    for (i, &value) in input.iter().enumerate() {
        push_i16(&mut buf, value, || format!("sample value {}", i))?;
    }
    Ok(buf)
}
