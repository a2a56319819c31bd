// SPDX-License-Identifier: MPL-2.0

//! Test pattern generation for synthetic frames

/// SMPTE-style bar colors, left to right
const BARS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Render eight vertical color bars as tightly packed RGBA.
///
/// The bars run from white on the left to black on the right, so a mirrored
/// still is easy to tell from an unmirrored one.
pub fn color_bars(width: u32, height: u32) -> Vec<u8> {
    let width = width as usize;
    let height = height as usize;
    let mut data = vec![0u8; width * height * 4];

    if width == 0 {
        return data;
    }

    let row: Vec<u8> = (0..width)
        .flat_map(|x| {
            let [r, g, b] = BARS[x * BARS.len() / width];
            [r, g, b, 255]
        })
        .collect();

    for chunk in data.chunks_exact_mut(width * 4) {
        chunk.copy_from_slice(&row);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_run_white_to_black() {
        let data = color_bars(16, 2);
        assert_eq!(data.len(), 16 * 2 * 4);
        assert_eq!(&data[0..4], &[235, 235, 235, 255]);
        let last = 15 * 4;
        assert_eq!(&data[last..last + 4], &[16, 16, 16, 255]);
    }

    #[test]
    fn test_rows_are_identical() {
        let data = color_bars(9, 3);
        let row = 9 * 4;
        assert_eq!(&data[0..row], &data[row..2 * row]);
        assert_eq!(&data[0..row], &data[2 * row..3 * row]);
    }

    #[test]
    fn test_zero_width_is_empty() {
        assert!(color_bars(0, 10).is_empty());
    }
}
