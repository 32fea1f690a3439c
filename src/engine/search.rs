// src/engine/search.rs
//
// Quality bisection: encode, decode, score, narrow, repeat.
//
// Each trial depends on the bounds left by the previous one, so the loop is
// strictly sequential. Only one candidate (bytes and decoded luma) is alive
// at a time.

use crate::codecs::{CodecAdapter, EncodeStage};
use crate::config::SearchConfig;
use crate::engine::common::EngineResult;
use crate::error::RecompressError;
use crate::metrics::{MetricEvaluator, Polarity};
use crate::plane::OriginalImage;
use tracing::{debug, info};

/// Bisection bookkeeping. `min <= max` always holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    min: u8,
    max: u8,
    best: Option<(u8, f64)>,
    remaining: u32,
}

impl SearchState {
    pub fn new(min: u8, max: u8, attempts: u32) -> Self {
        debug_assert!(min <= max);
        Self {
            min,
            max,
            best: None,
            remaining: attempts,
        }
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.min, self.max)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn best_quality(&self) -> Option<u8> {
        self.best.map(|(q, _)| q)
    }

    pub fn best_diff(&self) -> Option<f64> {
        self.best.map(|(_, d)| d)
    }

    pub fn next_quality(&self) -> u8 {
        ((self.min as u16 + self.max as u16) / 2) as u8
    }

    /// The trial at `quality` has to be the last one: the budget is spent,
    /// the interval is a single point, or the search came back to its best.
    pub fn is_final(&self, quality: u8) -> bool {
        self.remaining <= 1 || self.min == self.max || self.best_quality() == Some(quality)
    }

    /// Keep `quality` if it lands strictly closer to the target. Returns
    /// whether it did.
    pub fn record(&mut self, quality: u8, diff: f64) -> bool {
        let improved = match self.best {
            None => !diff.is_nan(),
            Some((_, best)) => diff < best,
        };
        if improved {
            self.best = Some((quality, diff));
        }
        improved
    }

    /// Move one bound past `quality` and use up one attempt.
    pub fn narrow(&mut self, quality: u8, score: f64, target: f64, polarity: Polarity) {
        if polarity.is_distorted(score, target) {
            self.min = quality.saturating_add(1).min(self.max);
        } else {
            self.max = quality.saturating_sub(1).max(self.min);
        }
        self.remaining = self.remaining.saturating_sub(1);
        debug_assert!(self.min <= self.max);
    }
}

/// One encode/decode/score cycle as it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub quality: u8,
    pub min: u8,
    pub max: u8,
    pub score: f64,
    pub diff: f64,
    pub size: usize,
    pub stage: EncodeStage,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub quality: u8,
    pub score: f64,
    pub diff: f64,
    /// Final-stage encode at `quality`.
    pub candidate: Vec<u8>,
    pub trials: Vec<Trial>,
    /// The loop ended elsewhere and the winner had to be encoded again.
    pub reencoded: bool,
}

/// Find the quality whose score lands closest to `target`.
pub fn bisect<C>(
    codec: &C,
    original: &OriginalImage,
    evaluator: &dyn MetricEvaluator,
    target: f64,
    config: &SearchConfig,
) -> EngineResult<SearchOutcome>
where
    C: CodecAdapter + ?Sized,
{
    let polarity = evaluator.polarity();
    let mut state = SearchState::new(config.min_quality, config.max_quality, config.attempts);
    let mut trials: Vec<Trial> = Vec::with_capacity(config.attempts as usize);
    let mut last: Option<(u8, EncodeStage, Vec<u8>)> = None;

    while state.remaining() > 0 {
        let quality = state.next_quality();
        let (min, max) = state.bounds();
        let stage = if state.is_final(quality) {
            EncodeStage::Final
        } else {
            EncodeStage::Exploratory
        };

        // Release the previous candidate before making the next one
        drop(last.take());

        let bytes = codec.encode(original, quality, stage)?;
        let score = {
            let decoded = codec.decode_luma(&bytes)?;
            evaluator.score(original.luma(), &decoded)?
        };
        let diff = (target - score).abs();
        let improved = state.record(quality, diff);

        info!(
            metric = evaluator.name(),
            quality,
            min,
            max,
            score,
            size = bytes.len(),
            "{} at q={} ({} - {}): {:.6}",
            evaluator.name(),
            quality,
            min,
            max,
            score
        );
        debug!(diff, improved, ?stage, "trial scored");

        trials.push(Trial {
            quality,
            min,
            max,
            score,
            diff,
            size: bytes.len(),
            stage,
        });
        state.narrow(quality, score, target, polarity);
        last = Some((quality, stage, bytes));

        if stage == EncodeStage::Final {
            break;
        }
    }

    let (quality, diff) = state.best.ok_or_else(|| {
        RecompressError::internal_panic(format!(
            "{} produced no comparable score",
            evaluator.name()
        ))
    })?;
    let score = trials
        .iter()
        .find(|t| t.quality == quality && t.diff == diff)
        .map(|t| t.score)
        .unwrap_or(target);

    let (candidate, reencoded) = match last {
        Some((q, EncodeStage::Final, bytes)) if q == quality => (bytes, false),
        other => {
            drop(other);
            debug!(quality, "last trial was not the best one, encoding it again");
            (codec.encode(original, quality, EncodeStage::Final)?, true)
        }
    };

    Ok(SearchOutcome {
        quality,
        score,
        diff,
        candidate,
        trials,
        reencoded,
    })
}
