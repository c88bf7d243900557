//! Stored knowledge format
//!
//! A trained network, as read out of save mode, packed into a flat
//! little-endian blob:
//!
//! ```text
//! Offset  Size          Field
//! ──────  ────────────  ─────────────────────────────────────
//! 0       4             magic "PME1"
//! 4       2             record count N (N <= 128)
//! 6       N * 264       records
//!
//! Record:
//! 0       2             context (raw NCR)
//! 2       2             influence (AIF)
//! 4       2             min_influence (MINIF)
//! 6       2             category (raw CAT)
//! 8       128 * 2       vector components
//! ```

use crate::error::{PmeError, Result};
use crate::neuron::NeuronRecord;
use pme_chip::network::{MAX_NEURONS, SAVE_RESTORE_SIZE};

/// Magic bytes at the start of every knowledge blob
pub const KNOWLEDGE_MAGIC: [u8; 4] = *b"PME1";

const HEADER_LEN: usize = KNOWLEDGE_MAGIC.len() + 2;

/// Encoded size of one neuron record in bytes.
pub const RECORD_LEN: usize = (4 + SAVE_RESTORE_SIZE) * 2;

/// Encode `records` into a knowledge blob.
///
/// # Errors
///
/// Returns [`PmeError::TooManyNeurons`] if there are more records than the
/// engine has neurons.
pub fn pack_knowledge(records: &[NeuronRecord]) -> Result<Vec<u8>> {
    if records.len() > MAX_NEURONS {
        return Err(PmeError::TooManyNeurons {
            count: records.len(),
            max: MAX_NEURONS,
        });
    }

    let mut out = Vec::with_capacity(HEADER_LEN + records.len() * RECORD_LEN);
    out.extend_from_slice(&KNOWLEDGE_MAGIC);
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(records.len() as u16).to_le_bytes());

    for record in records {
        for word in [
            record.context,
            record.influence,
            record.min_influence,
            record.category,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for component in &record.vector {
            out.extend_from_slice(&component.to_le_bytes());
        }
    }

    tracing::debug!("Packed {} neurons ({} bytes)", records.len(), out.len());
    Ok(out)
}

/// Decode a knowledge blob produced by [`pack_knowledge`].
///
/// # Errors
///
/// Returns [`PmeError::InvalidKnowledge`] if the magic is wrong, the count
/// exceeds the neuron capacity, or the length does not match the count.
pub fn unpack_knowledge(data: &[u8]) -> Result<Vec<NeuronRecord>> {
    if data.len() < HEADER_LEN {
        return Err(PmeError::invalid_knowledge("Blob too small for header"));
    }

    if data[..4] != KNOWLEDGE_MAGIC {
        tracing::error!("Invalid magic bytes: {:02x?}", &data[..4]);
        return Err(PmeError::invalid_knowledge("bad magic"));
    }

    let count = usize::from(u16::from_le_bytes([data[4], data[5]]));
    if count > MAX_NEURONS {
        return Err(PmeError::invalid_knowledge(format!(
            "{count} records exceed capacity of {MAX_NEURONS}"
        )));
    }

    let body = &data[HEADER_LEN..];
    if body.len() != count * RECORD_LEN {
        return Err(PmeError::invalid_knowledge(format!(
            "expected {} bytes for {count} records, found {}",
            count * RECORD_LEN,
            body.len()
        )));
    }

    let records: Vec<NeuronRecord> = body.chunks_exact(RECORD_LEN).map(decode_record).collect();
    tracing::debug!("Unpacked {} neurons", records.len());
    Ok(records)
}

fn decode_record(chunk: &[u8]) -> NeuronRecord {
    let mut words = chunk
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let mut next = || words.next().unwrap_or(0);

    let context = next();
    let influence = next();
    let min_influence = next();
    let category = next();
    let mut vector = [0u16; SAVE_RESTORE_SIZE];
    for slot in &mut vector {
        *slot = next();
    }

    NeuronRecord {
        context,
        vector,
        influence,
        min_influence,
        category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<NeuronRecord> {
        vec![
            NeuronRecord::from_pattern(1, &[10, 20, 30], 0x4000, 2, 7),
            NeuronRecord::from_pattern(0x0102, &[255; 128], 2, 2, 0x8003),
        ]
    }

    #[test]
    fn layout_is_little_endian() {
        let blob = pack_knowledge(&sample()).unwrap();
        assert_eq!(&blob[..4], b"PME1");
        assert_eq!(&blob[4..6], &[2, 0]);
        // first record: context 1, influence 0x4000, minif 2, category 7
        assert_eq!(&blob[6..14], &[1, 0, 0x00, 0x40, 2, 0, 7, 0]);
        assert_eq!(&blob[14..16], &[10, 0]);
        assert_eq!(blob.len(), HEADER_LEN + 2 * RECORD_LEN);
    }

    #[test]
    fn decode_restores_records() {
        let records = sample();
        let decoded = unpack_knowledge(&pack_knowledge(&records).unwrap()).unwrap();
        assert_eq!(decoded, records);
        assert!(decoded[1].is_degenerate());
        assert_eq!(decoded[1].context_id(), 2);
    }

    #[test]
    fn empty_network() {
        let blob = pack_knowledge(&[]).unwrap();
        assert_eq!(blob.len(), HEADER_LEN);
        assert!(unpack_knowledge(&blob).unwrap().is_empty());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut blob = pack_knowledge(&sample()).unwrap();
        blob[0] = b'X';
        assert!(matches!(
            unpack_knowledge(&blob),
            Err(PmeError::InvalidKnowledge { .. })
        ));
    }

    #[test]
    fn rejects_truncated_body() {
        let blob = pack_knowledge(&sample()).unwrap();
        let err = unpack_knowledge(&blob[..blob.len() - 1]).unwrap_err();
        assert!(err.to_string().contains("expected"));
    }

    #[test]
    fn rejects_oversized_count() {
        let mut blob = KNOWLEDGE_MAGIC.to_vec();
        blob.extend_from_slice(&129u16.to_le_bytes());
        assert!(unpack_knowledge(&blob).is_err());
        assert!(unpack_knowledge(&blob[..3]).is_err());
    }

    #[test]
    fn pack_rejects_too_many() {
        let records = vec![NeuronRecord::default(); MAX_NEURONS + 1];
        assert!(matches!(
            pack_knowledge(&records),
            Err(PmeError::TooManyNeurons { count: 129, .. })
        ));
    }
}
