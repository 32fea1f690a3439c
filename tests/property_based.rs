use proptest::prelude::*;
use recompress::codecs::{CodecAdapter, EncodeStage};
use recompress::config::{LensCorrection, SearchConfig, TargetQuality};
use recompress::engine::{bisect, defish, SearchState};
use recompress::error::Result;
use recompress::metadata::{scan_metadata, SegmentCursor};
use recompress::metrics::{Metric, MetricEvaluator, Polarity};
use recompress::plane::{LumaPlane, OriginalImage};
use recompress::JPEG_SIGNATURE;

/// Encodes an image as a single byte: the quality it was asked for.
struct QualityEcho;

impl CodecAdapter for QualityEcho {
    fn format(&self) -> &'static str {
        "echo"
    }

    fn encode(&self, _image: &OriginalImage, quality: u8, _stage: EncodeStage) -> Result<Vec<u8>> {
        Ok(vec![quality])
    }

    fn decode_luma(&self, bytes: &[u8]) -> Result<LumaPlane> {
        LumaPlane::new(1, 1, bytes.to_vec())
    }
}

/// Score rises with quality: `1 - (100 - q) * slope`.
struct LinearScore {
    slope: f64,
}

impl MetricEvaluator for LinearScore {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn polarity(&self) -> Polarity {
        Polarity::HigherIsBetter
    }

    fn score(&self, _original: &LumaPlane, candidate: &LumaPlane) -> Result<f64> {
        let q = candidate.as_slice()[0] as f64;
        Ok(1.0 - (100.0 - q) * self.slope)
    }
}

fn tiny_original() -> OriginalImage {
    OriginalImage::from_rgb(vec![0, 0, 0], 1, 1).unwrap()
}

fn bounds_strategy() -> impl Strategy<Value = (u8, u8)> {
    (1u8..=100).prop_flat_map(|min| (Just(min), min..=100))
}

fn gray_plane(width: u32, height: u32) -> impl Strategy<Value = LumaPlane> {
    prop::collection::vec(any::<u8>(), (width * height) as usize)
        .prop_map(move |data| LumaPlane::new(width, height, data).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_search_state_keeps_bounds_ordered(
        (min, max) in bounds_strategy(),
        attempts in 1u32..16,
        verdicts in prop::collection::vec(any::<bool>(), 16),
    ) {
        let mut state = SearchState::new(min, max, attempts);
        for distorted in verdicts.into_iter().take(attempts as usize) {
            let q = state.next_quality();
            let (lo, hi) = state.bounds();
            prop_assert!(lo <= q && q <= hi);
            // 0.5 vs target 1.0 is distorted, 1.0 vs 0.5 is not
            let (score, target) = if distorted { (0.5, 1.0) } else { (1.0, 0.5) };
            state.narrow(q, score, target, Polarity::HigherIsBetter);
            let (lo, hi) = state.bounds();
            prop_assert!(lo <= hi);
            prop_assert!(lo >= min && hi <= max);
        }
        prop_assert_eq!(state.remaining(), 0);
    }

    #[test]
    fn prop_bisect_respects_budget_and_keeps_best(
        (min, max) in bounds_strategy(),
        attempts in 1u32..12,
        slope in 0.0001f64..0.01,
        target in 0.5f64..1.0,
    ) {
        let config = SearchConfig {
            min_quality: min,
            max_quality: max,
            attempts,
            metric: Metric::Ssim,
            target: TargetQuality::Explicit(target),
        };
        let metric = LinearScore { slope };
        let outcome = bisect(&QualityEcho, &tiny_original(), &metric, target, &config).unwrap();

        prop_assert!(!outcome.trials.is_empty());
        prop_assert!(outcome.trials.len() <= attempts as usize);
        prop_assert!(min <= outcome.quality && outcome.quality <= max);
        for trial in &outcome.trials {
            prop_assert!(outcome.diff <= trial.diff);
            prop_assert!(trial.min <= trial.quality && trial.quality <= trial.max);
        }
        prop_assert_eq!(outcome.trials.last().unwrap().stage, EncodeStage::Final);
        // The emitted bytes are always a final encode of the winner
        prop_assert_eq!(outcome.candidate, vec![outcome.quality]);
    }

    #[test]
    fn prop_segment_cursor_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        if let Ok(cursor) = SegmentCursor::new(&data) {
            for segment in cursor {
                if let Ok(segment) = segment {
                    prop_assert!(segment.offset + segment.len <= data.len());
                } else {
                    break;
                }
            }
        }
        let _ = scan_metadata(&data, JPEG_SIGNATURE.as_bytes());
    }

    #[test]
    fn prop_jpeg_prefix_never_panics(tail in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut data = vec![0xFF, 0xD8];
        data.extend(tail);
        let _ = scan_metadata(&data, JPEG_SIGNATURE.as_bytes());
    }

    #[test]
    fn prop_identical_planes_score_perfectly(plane in gray_plane(16, 16)) {
        for metric in Metric::ALL {
            let score = metric.evaluator().score(&plane, &plane).unwrap();
            prop_assert!(!metric.polarity().is_distorted(score, perfect(metric)), "{metric}: {score}");
        }
    }

    #[test]
    fn prop_ssim_is_bounded(a in gray_plane(16, 16), b in gray_plane(16, 16)) {
        let score = Metric::Ssim.evaluator().score(&a, &b).unwrap();
        prop_assert!(score <= 1.0 + 1e-9);
        let mpe = Metric::Mpe.evaluator().score(&a, &b).unwrap();
        prop_assert!((0.0..=255.0).contains(&mpe));
    }

    #[test]
    fn prop_defish_keeps_buffer_size(
        width in 1u32..24,
        height in 1u32..24,
        strength in 0.0f32..3.0,
        zoom in 0.5f32..2.0,
    ) {
        let rgb = vec![200u8; (width * height * 3) as usize];
        let out = defish(&rgb, width, height, &LensCorrection { strength, zoom });
        prop_assert_eq!(out.len(), rgb.len());
    }
}

/// Score an identical pair must reach.
fn perfect(metric: Metric) -> f64 {
    match metric.polarity() {
        Polarity::HigherIsBetter => 1.0 - 1e-6,
        // Anything above zero error counts as distortion at a tiny target
        Polarity::LowerIsBetter => 1e-9,
    }
}
