mod common;

use std::time::Duration;

use archifolio_pdf::{FetchError, ImageSlot, Layout, normalize};
use common::{MockFetcher, ids, png_bytes, records};

#[tokio::test(start_paused = true)]
async fn fetches_run_concurrently() {
    let _ = env_logger::try_init();
    let recs = records(5);
    let mut fetcher = MockFetcher::new();
    for (i, r) in recs.iter().enumerate() {
        let delay = Duration::from_millis(100 * (i as u64 + 1));
        fetcher = fetcher.with_image(&r.image, delay, png_bytes(2, 2, [0, 0, 0]));
    }

    let start = tokio::time::Instant::now();
    let normalized = normalize(&recs, Layout::Full, &fetcher).await;
    let elapsed = start.elapsed();

    // Slowest fetch is 500ms, the sequential sum would be 1500ms.
    assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "{elapsed:?}");
    assert_eq!(fetcher.calls(), 5);
    assert!(normalized.iter().all(|n| matches!(n.image, ImageSlot::Loaded(_))));
}

#[tokio::test(start_paused = true)]
async fn slow_first_record_keeps_its_position() {
    let recs = records(3);
    let fetcher = MockFetcher::new()
        .with_image(&recs[0].image, Duration::from_secs(2), png_bytes(7, 5, [1, 2, 3]))
        .with_image(&recs[1].image, Duration::ZERO, png_bytes(3, 3, [1, 2, 3]))
        .with_image(&recs[2].image, Duration::from_millis(10), png_bytes(1, 9, [1, 2, 3]));

    let normalized = normalize(&recs, Layout::Compact, &fetcher).await;
    let got: Vec<String> = normalized.iter().map(|n| n.record.id.clone()).collect();
    assert_eq!(got, ids(&recs));

    let widths: Vec<u32> = normalized
        .iter()
        .map(|n| match &n.image {
            ImageSlot::Loaded(b) => b.pixel_width,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(widths, vec![7, 3, 1]);
}

#[tokio::test]
async fn one_failure_does_not_affect_the_others() {
    let recs = records(4);
    let fetcher = MockFetcher::serving(&recs).with_error(
        &recs[2].image,
        Duration::ZERO,
        FetchError::Timeout {
            origin: recs[2].image.clone(),
            secs: 30,
        },
    );

    let normalized = normalize(&recs, Layout::Full, &fetcher).await;
    assert_eq!(normalized.len(), 4);
    for (i, n) in normalized.iter().enumerate() {
        if i == 2 {
            assert!(matches!(n.image, ImageSlot::Failed(FetchError::Timeout { secs: 30, .. })));
        } else {
            assert!(matches!(n.image, ImageSlot::Loaded(_)), "record {i}: {:?}", n.image);
        }
    }
}

#[tokio::test]
async fn undecodable_bytes_become_a_failed_slot() {
    let recs = records(1);
    let fetcher = MockFetcher::new().with_image(&recs[0].image, Duration::ZERO, b"<html>".to_vec());
    let normalized = normalize(&recs, Layout::Full, &fetcher).await;
    assert!(matches!(normalized[0].image, ImageSlot::Failed(FetchError::Decode { .. })));
}

#[tokio::test]
async fn missing_reference_is_not_fetched() {
    let mut recs = records(2);
    recs[1].image = "  ".into();
    let fetcher = MockFetcher::serving(&recs);
    let normalized = normalize(&recs, Layout::Full, &fetcher).await;
    assert_eq!(fetcher.calls(), 1);
    assert!(matches!(normalized[1].image, ImageSlot::Failed(FetchError::MissingSource)));
}

#[tokio::test]
async fn text_only_skips_fetching() {
    let recs = records(6);
    let fetcher = MockFetcher::serving(&recs);
    let normalized = normalize(&recs, Layout::TextOnly, &fetcher).await;
    assert_eq!(fetcher.calls(), 0);
    assert_eq!(normalized.len(), 6);
    assert!(normalized.iter().all(|n| matches!(n.image, ImageSlot::Skipped)));
}
