//! Property tests for the line framer
//!
//! The framing contract: however a byte stream is split into chunks, the
//! emitted records and the final pending buffer are identical.

use proptest::prelude::*;
use serialink_core::LineFramer;

fn frame_in_one_feed(bytes: &[u8]) -> (Vec<String>, String) {
    let mut framer = LineFramer::new();
    let records = framer.feed(bytes).expect("ascii input").into_vec();
    (records, framer.pending().to_string())
}

fn frame_in_chunks(bytes: &[u8], mut cuts: Vec<usize>) -> (Vec<String>, String) {
    cuts.iter_mut().for_each(|cut| *cut = (*cut).min(bytes.len()));
    cuts.sort_unstable();
    cuts.push(bytes.len());

    let mut framer = LineFramer::new();
    let mut records = Vec::new();
    let mut start = 0;
    for cut in cuts {
        records.extend(framer.feed(&bytes[start..cut]).expect("ascii input"));
        start = cut;
    }
    (records, framer.pending().to_string())
}

proptest! {
    // ASCII-only input: a chunk is required to decode on its own, so the
    // invariance claim holds for splits that respect character boundaries.
    #[test]
    fn records_invariant_under_chunking(
        text in "[a-zA-Z0-9,. \\n]{0,200}",
        cuts in proptest::collection::vec(0usize..200, 0..8),
    ) {
        let bytes = text.as_bytes();
        let (expected_records, expected_pending) = frame_in_one_feed(bytes);
        let (records, pending) = frame_in_chunks(bytes, cuts);

        prop_assert_eq!(records, expected_records);
        prop_assert_eq!(pending, expected_pending);
    }

    #[test]
    fn no_bytes_dropped_or_duplicated(
        text in "[a-zA-Z0-9 \\n]{0,200}",
        cuts in proptest::collection::vec(0usize..200, 0..8),
    ) {
        let bytes = text.as_bytes();
        let (records, pending) = frame_in_chunks(bytes, cuts);

        // Reinserting the delimiters reconstructs the original stream.
        let mut rebuilt = String::new();
        for record in &records {
            rebuilt.push_str(record);
            rebuilt.push('\n');
        }
        rebuilt.push_str(&pending);
        prop_assert_eq!(rebuilt, text);
    }
}
