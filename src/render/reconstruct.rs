use super::entity::{render_entity, RenderOptions};
use crate::error::{AnnotationIssue, RenderError};
use crate::post::Annotation;

/// One piece of a partitioned post text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'t, 'a> {
    /// Text between annotations. May be empty.
    Literal(&'t str),
    /// Text covered by an annotation.
    Entity {
        annotation: &'a Annotation,
        source: &'t str,
    },
}

impl<'t> Segment<'t, '_> {
    pub fn source(&self) -> &'t str {
        match self {
            Segment::Literal(text) => *text,
            Segment::Entity { source, .. } => *source,
        }
    }
}

/// Forward-only conversion from UTF-16 offsets to byte offsets.
struct Utf16Walker<'t> {
    text: &'t str,
    byte: usize,
    unit: usize,
}

impl<'t> Utf16Walker<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            byte: 0,
            unit: 0,
        }
    }

    /// Byte offset of `target`, or `None` if it falls inside a surrogate pair.
    /// `target` must not be behind the last position sought.
    fn seek(&mut self, target: usize) -> Option<usize> {
        while self.unit < target {
            let ch = self.text[self.byte..].chars().next()?;
            self.unit += ch.len_utf16();
            self.byte += ch.len_utf8();
        }
        (self.unit == target).then_some(self.byte)
    }
}

/// Partition `text` into alternating literal and entity segments.
///
/// `annotations` must be ordered by span start (see [`super::normalize`]).
/// The result always holds `2k + 1` segments for `k` annotations, starting and
/// ending with a literal.
pub fn segments<'t, 'a>(
    text: &'t str,
    annotations: &'a [Annotation],
) -> Result<Vec<Segment<'t, 'a>>, RenderError> {
    let len = text.encode_utf16().count();
    let mut walker = Utf16Walker::new(text);
    let mut parts = Vec::with_capacity(annotations.len() * 2 + 1);
    let mut cursor_unit = 0;
    let mut cursor_byte = 0;

    for annotation in annotations {
        let span = annotation.span;
        let fail = |reason| RenderError::invalid(Some(annotation.kind()), span, reason);

        if span.start >= span.end {
            return Err(fail(AnnotationIssue::EmptySpan));
        }
        if span.end > len {
            return Err(fail(AnnotationIssue::OutOfBounds { len }));
        }
        if span.start < cursor_unit {
            return Err(fail(AnnotationIssue::Overlapping {
                previous_end: cursor_unit,
            }));
        }

        let start = walker
            .seek(span.start)
            .ok_or_else(|| fail(AnnotationIssue::NotCharBoundary { offset: span.start }))?;
        let end = walker
            .seek(span.end)
            .ok_or_else(|| fail(AnnotationIssue::NotCharBoundary { offset: span.end }))?;

        parts.push(Segment::Literal(&text[cursor_byte..start]));
        parts.push(Segment::Entity {
            annotation,
            source: &text[start..end],
        });
        cursor_unit = span.end;
        cursor_byte = end;
    }

    parts.push(Segment::Literal(&text[cursor_byte..]));
    Ok(parts)
}

/// Rebuild `text` with every annotated span replaced by its rendered anchor.
///
/// Literal text is copied through untouched. Any malformed annotation fails
/// the whole post; nothing is returned for it.
pub fn reconstruct(
    text: &str,
    annotations: &[Annotation],
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let parts = segments(text, annotations)?;
    let mut output = String::with_capacity(text.len() + annotations.len() * 96);
    for part in &parts {
        match part {
            Segment::Literal(literal) => output.push_str(literal),
            Segment::Entity { annotation, .. } => {
                output.push_str(&render_entity(annotation, options));
            }
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Span;
    use proptest::prelude::*;

    fn opts() -> RenderOptions {
        RenderOptions::default()
    }

    #[test]
    fn test_no_annotations_is_passthrough() {
        let text = "just <plain> text & more";
        assert_eq!(reconstruct(text, &[], &opts()).unwrap(), text);
        assert_eq!(reconstruct("", &[], &opts()).unwrap(), "");
    }

    #[test]
    fn test_mixed_entities_example() {
        let text = "hi @bob check http://x.co #fun";
        let annotations = vec![
            Annotation::mention(Span::new(3, 7), "bob", "Bob"),
            Annotation::link(Span::new(14, 25), "http://x.co", "http://x.co/full", "x.co"),
            Annotation::hashtag(Span::new(26, 30), "fun"),
        ];

        let expected = format!(
            "hi {} check {} {}",
            render_entity(&annotations[0], &opts()),
            render_entity(&annotations[1], &opts()),
            render_entity(&annotations[2], &opts()),
        );
        assert_eq!(reconstruct(text, &annotations, &opts()).unwrap(), expected);

        let parts = segments(text, &annotations).unwrap();
        assert_eq!(parts.len(), 7);
        assert_eq!(parts[0], Segment::Literal("hi "));
        assert_eq!(parts[1].source(), "@bob");
        assert_eq!(parts[2], Segment::Literal(" check "));
        assert_eq!(parts[3].source(), "http://x.co");
        assert_eq!(parts[4], Segment::Literal(" "));
        assert_eq!(parts[5].source(), "#fun");
        assert_eq!(parts[6], Segment::Literal(""));
    }

    #[test]
    fn test_adjacent_spans_have_empty_gap() {
        let text = "abcdeFGHIJklmnoXYZ";
        let annotations = vec![
            Annotation::hashtag(Span::new(5, 10), "one"),
            Annotation::hashtag(Span::new(10, 15), "two"),
        ];

        let parts = segments(text, &annotations).unwrap();
        assert_eq!(parts[0], Segment::Literal("abcde"));
        assert_eq!(parts[2], Segment::Literal(""));
        assert_eq!(parts[4], Segment::Literal("XYZ"));

        let expected = format!(
            "abcde{}{}XYZ",
            render_entity(&annotations[0], &opts()),
            render_entity(&annotations[1], &opts()),
        );
        assert_eq!(reconstruct(text, &annotations, &opts()).unwrap(), expected);
    }

    #[test]
    fn test_annotation_at_start_and_end() {
        let text = "#a middle #b";
        let annotations = vec![
            Annotation::hashtag(Span::new(0, 2), "a"),
            Annotation::hashtag(Span::new(10, 12), "b"),
        ];

        let parts = segments(text, &annotations).unwrap();
        assert_eq!(parts.first(), Some(&Segment::Literal("")));
        assert_eq!(parts.last(), Some(&Segment::Literal("")));
        assert_eq!(parts[2], Segment::Literal(" middle "));
    }

    #[test]
    fn test_empty_span_is_rejected() {
        let annotations = vec![Annotation::hashtag(Span::new(2, 2), "x")];
        let err = reconstruct("hello", &annotations, &opts()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidAnnotation {
                reason: AnnotationIssue::EmptySpan,
                ..
            }
        ));
    }

    #[test]
    fn test_reversed_span_is_rejected() {
        let annotations = vec![Annotation::hashtag(Span::new(4, 2), "x")];
        assert!(reconstruct("hello", &annotations, &opts()).is_err());
    }

    #[test]
    fn test_span_past_end_is_rejected() {
        let annotations = vec![Annotation::hashtag(Span::new(3, 9), "x")];
        let err = reconstruct("hello", &annotations, &opts()).unwrap_err();
        assert_eq!(
            err,
            RenderError::InvalidAnnotation {
                kind: Some(crate::post::AnnotationKind::Hashtag),
                span: Span::new(3, 9),
                reason: AnnotationIssue::OutOfBounds { len: 5 },
            }
        );
    }

    #[test]
    fn test_overlap_is_rejected_not_panicking() {
        let annotations = vec![
            Annotation::hashtag(Span::new(0, 6), "a"),
            Annotation::hashtag(Span::new(4, 8), "b"),
        ];
        let err = reconstruct("0123456789", &annotations, &opts()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidAnnotation {
                reason: AnnotationIssue::Overlapping { previous_end: 6 },
                ..
            }
        ));
    }

    #[test]
    fn test_offsets_count_utf16_units() {
        // "é" is one UTF-16 unit, "😀" is two.
        let text = "é😀 @bob!";
        let annotations = vec![Annotation::mention(Span::new(4, 8), "bob", "Bob")];
        let out = reconstruct(text, &annotations, &opts()).unwrap();
        assert!(out.starts_with("é😀 <a "));
        assert!(out.ends_with("</a>!"));
    }

    #[test]
    fn test_offset_inside_surrogate_pair_is_rejected() {
        let text = "😀abc";
        let annotations = vec![Annotation::hashtag(Span::new(1, 3), "x")];
        let err = reconstruct(text, &annotations, &opts()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidAnnotation {
                reason: AnnotationIssue::NotCharBoundary { offset: 1 },
                ..
            }
        ));
    }

    /// Builds text from alternating literal/entity pieces and the matching
    /// annotations.
    fn assemble(pieces: &[(String, String)], tail: &str) -> (String, Vec<Annotation>) {
        let mut text = String::new();
        let mut annotations = Vec::new();
        let mut units = 0;
        for (literal, covered) in pieces {
            text.push_str(literal);
            units += literal.encode_utf16().count();
            let start = units;
            text.push_str(covered);
            units += covered.encode_utf16().count();
            annotations.push(Annotation::hashtag(Span::new(start, units), covered));
        }
        text.push_str(tail);
        (text, annotations)
    }

    proptest! {
        #[test]
        fn prop_segments_partition_text(
            pieces in prop::collection::vec(("\\PC{0,6}", "\\PC{1,6}"), 0..12),
            tail in "\\PC{0,6}",
        ) {
            let (text, annotations) = assemble(&pieces, &tail);
            let parts = segments(&text, &annotations).unwrap();

            prop_assert_eq!(parts.len(), annotations.len() * 2 + 1);
            let rebuilt: String = parts.iter().map(Segment::source).collect();
            prop_assert_eq!(rebuilt, text.clone());

            let mut expected = String::new();
            for (literal, covered) in &pieces {
                expected.push_str(literal);
                expected.push_str(&render_entity(&Annotation::hashtag(Span::new(0, 1), covered), &opts()));
            }
            expected.push_str(&tail);
            prop_assert_eq!(reconstruct(&text, &annotations, &opts()).unwrap(), expected);
        }

        #[test]
        fn prop_passthrough_without_annotations(text in "\\PC*") {
            prop_assert_eq!(reconstruct(&text, &[], &opts()).unwrap(), text);
        }
    }
}
