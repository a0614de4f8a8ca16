use crate::post::{Annotation, AnnotationSet};

/// Flatten the per-kind groups into one sequence ordered by span start.
///
/// Groups are visited in kind order and each group in delivery order; the
/// sort is stable, so annotations sharing a start offset keep that order.
pub fn normalize(annotations: &AnnotationSet) -> Vec<Annotation> {
    let mut ordered: Vec<Annotation> = annotations
        .groups()
        .flat_map(|(_, group)| group.iter().cloned())
        .collect();
    ordered.sort_by_key(|annotation| annotation.span.start);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::{AnnotationKind, Span};
    use proptest::prelude::*;

    fn starts(annotations: &[Annotation]) -> Vec<usize> {
        annotations.iter().map(|a| a.span.start).collect()
    }

    #[test]
    fn test_empty_set_yields_empty_sequence() {
        assert!(normalize(&AnnotationSet::new()).is_empty());
    }

    #[test]
    fn test_interleaves_kinds_by_start() {
        let set: AnnotationSet = vec![
            Annotation::hashtag(Span::new(27, 31), "fun"),
            Annotation::link(Span::new(14, 25), "http://x.co", "http://x.co/full", "x.co"),
            Annotation::mention(Span::new(3, 7), "bob", "Bob"),
        ]
        .into_iter()
        .collect();

        let ordered = normalize(&set);
        assert_eq!(starts(&ordered), vec![3, 14, 27]);
        assert_eq!(ordered[0].kind(), AnnotationKind::Mention);
        assert_eq!(ordered[1].kind(), AnnotationKind::Link);
        assert_eq!(ordered[2].kind(), AnnotationKind::Hashtag);
    }

    #[test]
    fn test_unsorted_group_is_sorted() {
        let set: AnnotationSet = vec![
            Annotation::hashtag(Span::new(20, 24), "c"),
            Annotation::hashtag(Span::new(0, 4), "a"),
            Annotation::hashtag(Span::new(10, 14), "b"),
        ]
        .into_iter()
        .collect();

        assert_eq!(starts(&normalize(&set)), vec![0, 10, 20]);
    }

    #[test]
    fn test_ties_keep_kind_then_delivery_order() {
        let set: AnnotationSet = vec![
            Annotation::media(Span::new(5, 6), "http://m", "m"),
            Annotation::hashtag(Span::new(5, 7), "first"),
            Annotation::hashtag(Span::new(5, 8), "second"),
        ]
        .into_iter()
        .collect();

        let ordered = normalize(&set);
        assert_eq!(ordered[0].span, Span::new(5, 7));
        assert_eq!(ordered[1].span, Span::new(5, 8));
        assert_eq!(ordered[2].kind(), AnnotationKind::Media);
    }

    fn arb_annotation() -> impl Strategy<Value = Annotation> {
        (0usize..200, 1usize..10, 0usize..4).prop_map(|(start, len, kind)| {
            let span = Span::new(start, start + len);
            match kind {
                0 => Annotation::mention(span, "user", "User"),
                1 => Annotation::link(span, "http://s", "http://e", "e"),
                2 => Annotation::hashtag(span, "tag"),
                _ => Annotation::media(span, "http://m", "m"),
            }
        })
    }

    proptest! {
        #[test]
        fn prop_output_is_non_decreasing(annotations in prop::collection::vec(arb_annotation(), 0..40)) {
            let set: AnnotationSet = annotations.into_iter().collect();
            let ordered = normalize(&set);
            prop_assert_eq!(ordered.len(), set.len());
            prop_assert!(ordered.windows(2).all(|w| w[0].span.start <= w[1].span.start));
        }

        #[test]
        fn prop_sorting_sorted_sequence_is_identity(annotations in prop::collection::vec(arb_annotation(), 0..40)) {
            let set: AnnotationSet = annotations.into_iter().collect();
            let once = normalize(&set);
            let mut twice = once.clone();
            twice.sort_by_key(|annotation| annotation.span.start);
            prop_assert_eq!(&once, &twice);

            let again = normalize(&set);
            prop_assert_eq!(once, again);
        }
    }
}
