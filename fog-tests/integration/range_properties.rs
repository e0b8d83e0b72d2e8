//! Property tests for ranged responses over the router
//!
//! Every satisfiable window must come back byte-exact with matching framing
//! headers; every window past the end must be refused with 416.

use axum::http::{StatusCode, header};
use fog_core::storage::test_fixtures::audio_bytes;
use proptest::prelude::*;

use crate::common::{PODCAST_LEN, body_bytes, header_str, podcast_server_with_chunk_size};

const LEN: u64 = PODCAST_LEN as u64;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_satisfiable_window_is_byte_exact(
        start in 0..LEN,
        span in 0u64..20_000,
        chunk_size in 1usize..16_384,
    ) {
        let end = (start + span).min(LEN - 1);
        let server = podcast_server_with_chunk_size(chunk_size);

        let (status, content_range, content_length, body) = tokio_test::block_on(async {
            let response = server
                .stream(42, Some(&format!("bytes={start}-{end}")), None)
                .await;
            let status = response.status();
            let content_range = header_str(&response, header::CONTENT_RANGE).map(str::to_string);
            let content_length = header_str(&response, header::CONTENT_LENGTH).map(str::to_string);
            (status, content_range, content_length, body_bytes(response).await)
        });

        prop_assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        prop_assert_eq!(content_range, Some(format!("bytes {start}-{end}/{LEN}")));
        prop_assert_eq!(content_length, Some((end - start + 1).to_string()));
        prop_assert_eq!(body, audio_bytes(PODCAST_LEN)[start as usize..=end as usize].to_vec());
    }

    #[test]
    fn test_window_past_end_is_refused(
        start in 0..LEN * 2,
        overshoot in 0u64..1_000,
    ) {
        let end = LEN + overshoot;
        let server = podcast_server_with_chunk_size(8192);

        let (status, content_range) = tokio_test::block_on(async {
            let response = server
                .stream(42, Some(&format!("bytes={start}-{end}")), None)
                .await;
            (
                response.status(),
                header_str(&response, header::CONTENT_RANGE).map(str::to_string),
            )
        });

        prop_assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
        prop_assert_eq!(content_range, Some(format!("bytes */{LEN}")));
        prop_assert_eq!(server.play_count(42), 0);
    }
}
