use crate::models::{ImagePair, InspectionImage, SEQ_MATCH};

/// Pair move-out photos with move-in photos.
///
/// First pass: each move-out photo takes the first unused move-in photo with
/// the identical orientation hint. Second pass: leftovers on both sides are
/// sorted by capture sequence and zipped. Photos left over after that are
/// dropped. Sequence pairing does not check that both photos show the same
/// part of the room.
pub fn pair_images(move_in: &[InspectionImage], move_out: &[InspectionImage]) -> Vec<ImagePair> {
    let mut in_used = vec![false; move_in.len()];
    let mut out_used = vec![false; move_out.len()];
    let mut pairs = Vec::new();

    for (j, out_img) in move_out.iter().enumerate() {
        let Some(hint) = out_img.hint() else {
            continue;
        };
        let found = move_in
            .iter()
            .enumerate()
            .find(|(i, in_img)| !in_used[*i] && in_img.hint() == Some(hint));
        if let Some((i, in_img)) = found {
            in_used[i] = true;
            out_used[j] = true;
            pairs.push(make_pair(in_img, out_img, hint));
        }
    }

    let mut rest_in: Vec<&InspectionImage> = move_in
        .iter()
        .enumerate()
        .filter(|(i, _)| !in_used[*i])
        .map(|(_, img)| img)
        .collect();
    let mut rest_out: Vec<&InspectionImage> = move_out
        .iter()
        .enumerate()
        .filter(|(j, _)| !out_used[*j])
        .map(|(_, img)| img)
        .collect();
    rest_in.sort_by_key(|img| img.seq);
    rest_out.sort_by_key(|img| img.seq);

    for (in_img, out_img) in rest_in.into_iter().zip(rest_out) {
        pairs.push(make_pair(in_img, out_img, SEQ_MATCH));
    }

    pairs
}

fn make_pair(in_img: &InspectionImage, out_img: &InspectionImage, orientation: &str) -> ImagePair {
    ImagePair {
        move_in_id: in_img.id.clone(),
        move_in_path: in_img.file_path.clone(),
        move_out_id: out_img.id.clone(),
        move_out_path: out_img.file_path.clone(),
        orientation: orientation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(id: &str, hint: Option<&str>, seq: u32) -> InspectionImage {
        let image = InspectionImage::new(id, format!("/photos/{id}.jpg")).with_seq(seq);
        match hint {
            Some(h) => image.with_hint(h),
            None => image,
        }
    }

    #[test]
    fn pairs_by_hint_first() {
        let move_in = vec![img("in-a", Some("floor"), 0), img("in-b", Some("ceiling"), 1)];
        let move_out = vec![img("out-b", Some("ceiling"), 0), img("out-a", Some("floor"), 1)];
        let pairs = pair_images(&move_in, &move_out);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].move_in_id, "in-b");
        assert_eq!(pairs[0].move_out_id, "out-b");
        assert_eq!(pairs[0].orientation, "ceiling");
        assert_eq!(pairs[1].move_in_id, "in-a");
    }

    #[test]
    fn falls_back_to_sequence() {
        let move_in = vec![img("in-2", None, 2), img("in-1", Some("x"), 1)];
        let move_out = vec![img("out-9", Some("y"), 9), img("out-3", None, 3)];
        let pairs = pair_images(&move_in, &move_out);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].move_in_id.as_str(), pairs[0].move_out_id.as_str()), ("in-1", "out-3"));
        assert_eq!((pairs[1].move_in_id.as_str(), pairs[1].move_out_id.as_str()), ("in-2", "out-9"));
        assert!(pairs.iter().all(|p| p.orientation == SEQ_MATCH));
    }

    #[test]
    fn move_in_used_at_most_once() {
        let move_in = vec![img("in-a", Some("floor"), 0)];
        let move_out = vec![img("out-a", Some("floor"), 0), img("out-b", Some("floor"), 1)];
        let pairs = pair_images(&move_in, &move_out);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].move_out_id, "out-a");
    }

    #[test]
    fn unmatched_move_in_dropped() {
        let move_in = vec![img("a", None, 0), img("b", None, 1), img("c", None, 2)];
        let move_out = vec![img("z", None, 0)];
        let pairs = pair_images(&move_in, &move_out);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].move_in_id, "a");
    }

    #[test]
    fn blank_hint_does_not_match() {
        let move_in = vec![img("in", Some("  "), 5)];
        let move_out = vec![img("out", Some(""), 1)];
        let pairs = pair_images(&move_in, &move_out);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].orientation, SEQ_MATCH);
    }

    #[test]
    fn empty_sides_yield_no_pairs() {
        assert!(pair_images(&[], &[img("out", None, 0)]).is_empty());
        assert!(pair_images(&[img("in", None, 0)], &[]).is_empty());
    }
}
