//! Cut plan: where the horizontal cut lines go, and which tracks get
//! disconnected at each vertical channel.
//!
//! The cutting pattern is a uniform cut with rotation. Uniform: the
//! cut tracks are spread over the whole channel width instead of
//! forming one contiguous block. Tracks are always cut in adjacent
//! pairs, since unidirectional wires alternate INC/DEC and cutting
//! singles could remove one polarity entirely. Rotation: the starting
//! track shifts with the channel's x-coordinate, so the cut pattern
//! does not line up as a single physical strip across the chip.

use std::collections::HashSet;

/// Y-coordinates of the `num_cuts` evenly spaced cut lines. Each value
/// is the last row below the interposer boundary at that band.
pub fn cut_locations(height: u32, num_cuts: usize) -> Vec<u32> {
    if num_cuts == 0 {
        return vec![];
    }
    let step = height / (num_cuts as u32 + 1);
    assert!(
        step > 0,
        "grid height {height} is too small for {num_cuts} cuts"
    );
    (1..=num_cuts as u32).map(|i| i * step).collect()
}

/// Number of tracks to disconnect per channel: `percent` of the
/// channel width, rounded up to the next even number.
pub fn num_wires_to_cut(chan_width: u32, percent: u32) -> u32 {
    let mut num = (chan_width * percent).div_ceil(100);
    if num % 2 == 1 {
        num += 1;
    }
    assert!(
        percent == 0 || num <= chan_width,
        "cannot cut {num} wires out of a channel of width {chan_width}"
    );
    num
}

/// Rotation offset for the channel at `x`: proportional position
/// across the grid, rounded up to even to stay pair-aligned.
fn rotation_offset(x: u32, chan_width: u32, grid_width: u32) -> u32 {
    let mut offset = (x * chan_width) / grid_width;
    if offset % 2 == 1 {
        offset += 1;
    }
    offset % chan_width
}

/// Picks the tracks to disconnect at the vertical channel at `x`.
/// Tracks come in `num_wires_cut / 2` chunks spaced `step` apart; a
/// step of 2 or less would degenerate into one contiguous block cut
/// that starves a local region, so the step is clamped to 3 and the
/// chunk count recomputed.
pub fn select_cut_tracks(chan_width: u32, percent: u32, x: u32, grid_width: u32) -> Vec<u32> {
    let num = num_wires_to_cut(chan_width, percent);
    if num == 0 {
        return vec![];
    }
    let offset = rotation_offset(x, chan_width, grid_width);
    let mut num_chunks = num / 2;
    let mut step = chan_width / num_chunks;
    if step <= 2 {
        step = 3;
        num_chunks = (chan_width / 3).max(1);
    }

    let mut picked = Vec::with_capacity(num as usize);
    let mut seen = HashSet::new();
    let mut base = offset;
    while picked.len() < num as usize {
        for chunk in 0..num_chunks {
            if picked.len() == num as usize {
                break;
            }
            let track = (base + step * chunk) % chan_width;
            assert!(
                seen.insert(track),
                "track {track} selected twice in channel x={x}"
            );
            picked.push(track);
        }
        base = (base + 1) % chan_width;
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    #[test]
    fn cut_rows_are_evenly_spaced() {
        assert_eq!(cut_locations(8, 1), vec![4]);
        assert_eq!(cut_locations(24, 3), vec![6, 12, 18]);
        assert_eq!(cut_locations(10, 0), Vec::<u32>::new());
    }

    #[test]
    #[should_panic(expected = "too small")]
    fn too_many_cuts_for_grid() {
        cut_locations(3, 5);
    }

    #[test]
    fn wire_count_rounds_up_to_even() {
        // 10 * 25% = 2.5 -> 4
        assert_eq!(num_wires_to_cut(10, 25), 4);
        // 10 * 70% = 7 -> 8
        assert_eq!(num_wires_to_cut(10, 70), 8);
        assert_eq!(num_wires_to_cut(10, 0), 0);
        assert_eq!(num_wires_to_cut(10, 40), 4);
    }

    #[test]
    fn quarter_cut_selects_four_distinct_tracks() {
        // W=10, 25%: num=4, 2 chunks, step 5
        let tracks = select_cut_tracks(10, 25, 0, 4);
        assert_eq!(tracks.len(), 4);
        assert_eq!(tracks.iter().unique().count(), 4);
        assert_eq!(tracks, vec![0, 5, 1, 6]);
    }

    #[test]
    fn step_clamp_avoids_block_cut() {
        // W=10, 70%: num=8; the raw step of 2 is clamped to 3 with 3 chunks
        let tracks = select_cut_tracks(10, 70, 0, 4);
        assert_eq!(tracks.len(), 8);
        assert_eq!(tracks.iter().unique().count(), 8);
        assert_eq!(tracks, vec![0, 3, 6, 1, 4, 7, 2, 5]);
    }

    #[test]
    fn rotation_offset_shifts_with_x_and_stays_even() {
        let at0 = select_cut_tracks(12, 50, 0, 6);
        let at3 = select_cut_tracks(12, 50, 3, 6);
        assert_ne!(at0, at3);
        assert_eq!(at0[0], 0);
        // x=3: offset = 36/6 = 6, already even
        assert_eq!(at3[0], 6);
        for x in 0..=6 {
            let tracks = select_cut_tracks(12, 50, x, 6);
            assert_eq!(tracks.len(), 6);
            assert_eq!(tracks.iter().unique().count(), 6);
        }
    }
}
