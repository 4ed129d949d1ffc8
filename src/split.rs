// Dividing the flat PLTT color buffer into sub-palettes and joining them back
use crate::{
    common::{Color, ColorDepth},
    error::{NclrError, Result},
};

/// Logical sub-palettes, indexed by slot. Slots that no physical palette maps
/// to are left empty.
pub type PaletteSet = Vec<Vec<Color>>;

/// Number of physical palettes stored in a buffer of `num_colors` colors.
/// A partial palette at the end still counts.
pub fn num_palettes(num_colors: usize, colors_per_palette: usize) -> usize {
    if colors_per_palette == 0 {
        return 0;
    }
    num_colors.div_ceil(colors_per_palette)
}

/// Splits `colors` into `num_palettes` physical palettes of
/// `colors_per_palette` colors each. With an index table, physical palette
/// `i` lands in slot `indices[i]`; when two palettes map to the same slot
/// the later one wins.
pub fn split(
    colors_per_palette: usize,
    num_palettes: usize,
    colors: &[Color],
    indices: Option<&[u16]>,
) -> Result<PaletteSet> {
    if colors_per_palette == 0 {
        return Err(NclrError::Argument(
            "colors per palette must be positive".to_string(),
        ));
    }
    if let Some(indices) = indices {
        if indices.len() != num_palettes {
            return Err(NclrError::Argument(format!(
                "index table holds {} entries for {} palettes",
                indices.len(),
                num_palettes
            )));
        }
    }

    let num_slots = match indices {
        Some(indices) => indices.iter().max().map_or(0, |&m| m as usize + 1),
        None => num_palettes,
    };
    let mut palettes: PaletteSet = vec![vec![]; num_slots];

    for i in 0..num_palettes {
        let slot = indices.map_or(i, |indices| indices[i] as usize);
        // Palettes past the end of the buffer stay empty.
        palettes[slot] = match i.checked_mul(colors_per_palette) {
            Some(start) if start < colors.len() => {
                let end = colors.len().min(start.saturating_add(colors_per_palette));
                colors[start..end].to_vec()
            }
            _ => vec![],
        };
    }
    Ok(palettes)
}

/// Joins all slots, in slot order, back into one color buffer.
pub fn flatten(palettes: &[Vec<Color>]) -> Vec<Color> {
    palettes.iter().flatten().copied().collect()
}

/// Depth to write for a palette set. Only the first slot is consulted, so a
/// set whose first slot is small but whose later slots are large will be
/// written as 16-color. This matches how the files are produced.
pub fn infer_depth(palettes: &[Vec<Color>]) -> ColorDepth {
    match palettes.first() {
        Some(first) if first.len() > 16 => ColorDepth::Depth256,
        _ => ColorDepth::Depth16,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn buffer(n: usize) -> Vec<Color> {
        (0..n).map(|i| Color::from_bgr555(i as u16)).collect()
    }

    #[rstest]
    #[case(16, 16, 1, 16)]
    #[case(40, 16, 3, 8)]
    #[case(48, 16, 3, 16)]
    #[case(300, 256, 2, 44)]
    #[case(1, 256, 1, 1)]
    fn splits_without_index_table(
        #[case] len: usize,
        #[case] per_palette: usize,
        #[case] expected_slots: usize,
        #[case] last_len: usize,
    ) {
        let colors = buffer(len);
        let n = num_palettes(len, per_palette);
        assert_eq!(n, expected_slots);
        let palettes = split(per_palette, n, &colors, None).unwrap();
        assert_eq!(palettes.len(), expected_slots);
        assert!(palettes[..n - 1].iter().all(|p| p.len() == per_palette));
        assert_eq!(palettes[n - 1].len(), last_len);
        assert_eq!(flatten(&palettes), colors);
    }

    #[test]
    fn empty_buffer_has_no_palettes() {
        assert_eq!(num_palettes(0, 16), 0);
        assert!(split(16, 0, &[], None).unwrap().is_empty());
    }

    #[test]
    fn remaps_through_index_table() {
        let colors = buffer(32);
        let palettes = split(16, 2, &colors, Some(&[3, 1])).unwrap();
        assert_eq!(palettes.len(), 4);
        assert!(palettes[0].is_empty());
        assert_eq!(palettes[1], colors[16..32]);
        assert!(palettes[2].is_empty());
        assert_eq!(palettes[3], colors[0..16]);
    }

    #[test]
    fn round_trips_with_ordered_unique_indices() {
        let colors = buffer(48);
        let palettes = split(16, 3, &colors, Some(&[0, 2, 5])).unwrap();
        assert_eq!(palettes.len(), 6);
        assert_eq!(flatten(&palettes), colors);
    }

    #[test]
    fn later_palette_wins_on_collision() {
        let colors = buffer(32);
        let palettes = split(16, 2, &colors, Some(&[0, 0])).unwrap();
        assert_eq!(palettes.len(), 1);
        assert_eq!(palettes[0], colors[16..32]);
    }

    #[test]
    fn palettes_past_end_of_buffer_stay_empty() {
        let colors = buffer(20);
        let palettes = split(16, 4, &colors, Some(&[0, 1, 2, 3])).unwrap();
        assert_eq!(palettes[0].len(), 16);
        assert_eq!(palettes[1].len(), 4);
        assert!(palettes[2].is_empty());
        assert!(palettes[3].is_empty());
    }

    #[test]
    fn huge_palette_size_leaves_later_slots_empty() {
        let colors = buffer(4);
        let palettes = split(usize::MAX, 2, &colors, None).unwrap();
        assert_eq!(palettes, vec![colors, vec![]]);

        let palettes = split(usize::MAX / 2 + 1, 3, &buffer(4), Some(&[2, 1, 0])).unwrap();
        assert_eq!(palettes[2], buffer(4));
        assert!(palettes[1].is_empty());
        assert!(palettes[0].is_empty());
    }

    #[rstest]
    #[case(2, &[0])]
    #[case(1, &[0, 1])]
    #[case(0, &[0])]
    fn index_table_length_must_match(#[case] n: usize, #[case] indices: &[u16]) {
        let res = split(16, n, &buffer(32), Some(indices));
        assert!(matches!(res, Err(NclrError::Argument(_))));
    }

    #[test]
    fn zero_colors_per_palette_is_rejected() {
        assert!(matches!(
            split(0, 1, &buffer(4), None),
            Err(NclrError::Argument(_))
        ));
    }

    #[rstest]
    #[case(vec![32, 0, 4], ColorDepth::Depth256)]
    #[case(vec![17], ColorDepth::Depth256)]
    #[case(vec![16, 256], ColorDepth::Depth16)]
    #[case(vec![10], ColorDepth::Depth16)]
    #[case(vec![], ColorDepth::Depth16)]
    fn depth_comes_from_first_slot(#[case] sizes: Vec<usize>, #[case] expected: ColorDepth) {
        let palettes: PaletteSet = sizes.into_iter().map(buffer).collect();
        assert_eq!(infer_depth(&palettes), expected);
    }
}
