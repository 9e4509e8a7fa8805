use serde::Serialize;
use std::num::NonZeroU64;

/// Position of a block height within the fixed-length epoch schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochState {
    /// 1-indexed
    pub current_epoch: u64,
    /// Blocks elapsed in the current epoch
    pub progress: u64,
    /// Rounded to the nearest percent, capped at 99 until the epoch rolls over
    pub progress_pct: u8,
    pub epoch_length: u64,
    pub next_full_dkg_epoch: u64,
    pub epoch_start_block: u64,
    pub blocks_remaining: u64,
    pub epochs_until_dkg: u64,
    pub blocks_until_dkg: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochRange {
    pub epoch: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub is_current: bool,
}

impl EpochState {
    pub fn derive(height: u64, epoch_length: NonZeroU64, next_full_dkg_epoch: u64) -> Self {
        let length = epoch_length.get();
        let index = height / length;
        let progress = height % length;
        let progress_pct = progress_percent(progress, length);
        let current_epoch = index + 1;
        let epoch_start_block = index * length;
        let blocks_remaining = length - progress;
        let epochs_until_dkg = next_full_dkg_epoch.saturating_sub(current_epoch);
        let blocks_until_dkg = next_full_dkg_epoch
            .saturating_sub(1)
            .saturating_mul(length)
            .saturating_sub(height);

        Self {
            current_epoch,
            progress,
            progress_pct,
            epoch_length: length,
            next_full_dkg_epoch,
            epoch_start_block,
            blocks_remaining,
            epochs_until_dkg,
            blocks_until_dkg,
        }
    }

    /// Block ranges of the current and up to `count - 1` preceding epochs,
    /// newest first.
    pub fn recent_epochs(&self, count: usize) -> Vec<EpochRange> {
        (1..=self.current_epoch)
            .rev()
            .take(count)
            .map(|epoch| {
                let start_block = (epoch - 1) * self.epoch_length;
                EpochRange {
                    epoch,
                    start_block,
                    end_block: start_block + self.epoch_length - 1,
                    is_current: epoch == self.current_epoch,
                }
            })
            .collect()
    }
}

/// Half-up rounding of `progress / length` as a percentage. `progress < length`
/// always holds, so 100 is reserved for the rollover itself.
fn progress_percent(progress: u64, length: u64) -> u8 {
    let rounded = (u128::from(progress) * 200 + u128::from(length)) / (2 * u128::from(length));
    rounded.min(99) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn length() -> NonZeroU64 {
        NonZeroU64::new(900).unwrap()
    }

    #[test]
    fn test_genesis_height() {
        let state = EpochState::derive(0, length(), 3);
        assert_eq!(state.current_epoch, 1);
        assert_eq!(state.progress, 0);
        assert_eq!(state.progress_pct, 0);
        assert_eq!(state.epoch_start_block, 0);
        assert_eq!(state.blocks_remaining, 900);
    }

    #[test]
    fn test_last_block_of_epoch() {
        let state = EpochState::derive(899, length(), 3);
        assert_eq!(state.current_epoch, 1);
        assert_eq!(state.progress, 899);
        assert_eq!(state.progress_pct, 99);
        assert_eq!(state.blocks_remaining, 1);
    }

    #[test]
    fn test_progress_pct_rounds_to_nearest() {
        // 5/900 = 0.56%
        assert_eq!(EpochState::derive(5, length(), 3).progress_pct, 1);
        // 449/900 = 49.89%
        assert_eq!(EpochState::derive(449, length(), 3).progress_pct, 50);
        // 4/900 = 0.44%
        assert_eq!(EpochState::derive(4, length(), 3).progress_pct, 0);
        // exactly half rounds up
        assert_eq!(EpochState::derive(450, length(), 3).progress_pct, 50);
        assert_eq!(EpochState::derive(1_349, length(), 3).progress_pct, 50);
    }

    #[test]
    fn test_progress_pct_capped_before_rollover() {
        // 895/900 = 99.44%, 896/900 = 99.56%
        assert_eq!(EpochState::derive(895, length(), 3).progress_pct, 99);
        assert_eq!(EpochState::derive(896, length(), 3).progress_pct, 99);
        let short = NonZeroU64::new(3).unwrap();
        // 2/3 = 66.67%
        assert_eq!(EpochState::derive(2, short, 3).progress_pct, 67);
        let tiny = NonZeroU64::new(1).unwrap();
        assert_eq!(EpochState::derive(7, tiny, 3).progress_pct, 0);
    }

    #[test]
    fn test_epoch_rollover() {
        let state = EpochState::derive(900, length(), 3);
        assert_eq!(state.current_epoch, 2);
        assert_eq!(state.progress, 0);
        assert_eq!(state.progress_pct, 0);
        assert_eq!(state.epoch_start_block, 900);
    }

    #[test]
    fn test_distance_to_dkg() {
        let state = EpochState::derive(1_000, length(), 4);
        assert_eq!(state.current_epoch, 2);
        assert_eq!(state.epochs_until_dkg, 2);
        // epoch 4 starts at block 2700
        assert_eq!(state.blocks_until_dkg, 1_700);

        let past = EpochState::derive(5_000, length(), 4);
        assert_eq!(past.epochs_until_dkg, 0);
        assert_eq!(past.blocks_until_dkg, 0);
    }

    #[test]
    fn test_recent_epochs_stop_at_first() {
        let state = EpochState::derive(1_000, length(), 4);
        let ranges = state.recent_epochs(5);
        assert_eq!(ranges.len(), 2);
        assert_eq!(
            ranges[0],
            EpochRange {
                epoch: 2,
                start_block: 900,
                end_block: 1_799,
                is_current: true,
            }
        );
        assert_eq!(ranges[1].epoch, 1);
        assert!(!ranges[1].is_current);
        assert_eq!(state.recent_epochs(1).len(), 1);
    }
}
