//! Property-based tests for the SSE relay.
//!
//! These tests verify that line splitting and reframing hold regardless of
//! how the upstream body is chunked on the wire.

use bytes::Bytes;
use futures::StreamExt;
use llm_chat_relay::api::streaming::{relay_lines, DATA_PREFIX};
use llm_chat_relay::api::{reframe_line, LineSplitter};
use llm_chat_relay::RelayEvent;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

/// A single upstream line without line terminators.
fn line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 {}\":,\\[\\]]{0,40}".prop_map(|s| s),
        "[a-zA-Z0-9 {}\":,]{1,40}".prop_map(|s| format!("data: {}", s)),
        Just(String::new()),
        Just("   ".to_string()),
        Just("data: [DONE]".to_string()),
        Just("ünïcødé ✓ 日本語".to_string()),
    ]
}

fn body_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(line_strategy(), 0..20)
}

/// Split `data` at the given (sorted, deduplicated) cut points.
fn chunk_at(data: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for point in points {
        chunks.push(data[start..point].to_vec());
        start = point;
    }
    chunks.push(data[start..].to_vec());
    chunks
}

fn split_all(chunks: &[Vec<u8>]) -> Vec<String> {
    let mut splitter = LineSplitter::new();
    let mut lines: Vec<String> = chunks.iter().flat_map(|c| splitter.push(c)).collect();
    lines.extend(splitter.finish());
    lines
}

fn reframe_all(lines: &[String]) -> Vec<String> {
    lines.iter().filter_map(|l| reframe_line(l)).collect()
}

// ============================================================================
// Line splitting properties
// ============================================================================

proptest! {
    #[test]
    fn prop_chunking_does_not_change_lines(
        lines in body_strategy(),
        cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let body = lines.join("\n");
        let whole = split_all(&[body.as_bytes().to_vec()]);
        let chunked = split_all(&chunk_at(body.as_bytes(), &cuts));
        prop_assert_eq!(whole, chunked);
    }

    #[test]
    fn prop_crlf_equivalent_to_lf(lines in body_strategy()) {
        let lf = lines.join("\n") + "\n";
        let crlf = lines.join("\r\n") + "\r\n";
        prop_assert_eq!(
            split_all(&[lf.into_bytes()]),
            split_all(&[crlf.into_bytes()])
        );
    }

    #[test]
    fn prop_terminated_lines_round_trip(lines in body_strategy()) {
        let body: String = lines.iter().map(|l| format!("{}\n", l)).collect();
        prop_assert_eq!(split_all(&[body.into_bytes()]), lines);
    }
}

// ============================================================================
// Reframing properties
// ============================================================================

proptest! {
    #[test]
    fn prop_every_frame_is_well_formed(line in line_strategy()) {
        if let Some(frame) = reframe_line(&line) {
            prop_assert!(frame.starts_with(DATA_PREFIX));
            prop_assert!(frame.ends_with("\n\n"));
            if line.starts_with(DATA_PREFIX) {
                prop_assert_eq!(frame, format!("{}\n\n", line));
            }
        }
    }

    #[test]
    fn prop_blank_lines_produce_no_frames(spaces in "[ \t]{0,10}") {
        prop_assert!(reframe_line(&spaces).is_none());
    }

    #[test]
    fn prop_frames_preserve_order(lines in body_strategy()) {
        let frames = reframe_all(&lines);
        let expected: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
        prop_assert_eq!(frames.len(), expected.len());
        for (frame, line) in frames.iter().zip(expected) {
            prop_assert!(frame.trim_end_matches("\n\n").ends_with(line.as_str()));
        }
    }
}

// ============================================================================
// Stream properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_relay_matches_offline_reframing(
        lines in body_strategy(),
        cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let body = lines.join("\n");
        let chunks: Vec<Result<Bytes, std::io::Error>> = chunk_at(body.as_bytes(), &cuts)
            .into_iter()
            .map(|c| Ok(Bytes::from(c)))
            .collect();

        let events: Vec<RelayEvent> = tokio_test::block_on(
            relay_lines(futures::stream::iter(chunks)).collect(),
        );

        let frames: Vec<String> = events
            .into_iter()
            .filter_map(|e| match e {
                RelayEvent::Data(frame) => Some(frame),
                RelayEvent::Error(message) => panic!("unexpected error: {message}"),
                RelayEvent::End => None,
            })
            .collect();

        prop_assert_eq!(frames, reframe_all(&split_all(&[body.into_bytes()])));
    }
}
