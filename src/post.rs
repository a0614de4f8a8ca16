use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of annotation kinds a post can carry.
///
/// Declaration order is also the iteration order of an [`AnnotationSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationKind {
    Mention,
    Link,
    Hashtag,
    Media,
}

impl AnnotationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationKind::Mention => "mention",
            AnnotationKind::Link => "link",
            AnnotationKind::Hashtag => "hashtag",
            AnnotationKind::Media => "media",
        }
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open `[start, end)` range of UTF-16 code units into a post's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Kind-specific fields. The variant determines the annotation's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationPayload {
    Mention {
        screen_name: String,
        display_name: String,
    },
    Link {
        short_url: String,
        expanded_url: String,
        display_url: String,
    },
    Hashtag {
        tag_text: String,
    },
    Media {
        media_url: String,
        display_url: String,
    },
}

impl AnnotationPayload {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationPayload::Mention { .. } => AnnotationKind::Mention,
            AnnotationPayload::Link { .. } => AnnotationKind::Link,
            AnnotationPayload::Hashtag { .. } => AnnotationKind::Hashtag,
            AnnotationPayload::Media { .. } => AnnotationKind::Media,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub span: Span,
    pub payload: AnnotationPayload,
}

impl Annotation {
    pub fn new(span: Span, payload: AnnotationPayload) -> Self {
        Self { span, payload }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.payload.kind()
    }

    pub fn mention(span: Span, screen_name: &str, display_name: &str) -> Self {
        Self::new(
            span,
            AnnotationPayload::Mention {
                screen_name: screen_name.to_string(),
                display_name: display_name.to_string(),
            },
        )
    }

    pub fn link(span: Span, short_url: &str, expanded_url: &str, display_url: &str) -> Self {
        Self::new(
            span,
            AnnotationPayload::Link {
                short_url: short_url.to_string(),
                expanded_url: expanded_url.to_string(),
                display_url: display_url.to_string(),
            },
        )
    }

    pub fn hashtag(span: Span, tag_text: &str) -> Self {
        Self::new(
            span,
            AnnotationPayload::Hashtag {
                tag_text: tag_text.to_string(),
            },
        )
    }

    pub fn media(span: Span, media_url: &str, display_url: &str) -> Self {
        Self::new(
            span,
            AnnotationPayload::Media {
                media_url: media_url.to_string(),
                display_url: display_url.to_string(),
            },
        )
    }
}

/// Annotations grouped by kind, each group in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    by_kind: BTreeMap<AnnotationKind, Vec<Annotation>>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the group matching the annotation's own kind.
    pub fn push(&mut self, annotation: Annotation) {
        self.by_kind
            .entry(annotation.kind())
            .or_default()
            .push(annotation);
    }

    pub fn of_kind(&self, kind: AnnotationKind) -> &[Annotation] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Groups in kind order, each group in delivery order.
    pub fn groups(&self) -> impl Iterator<Item = (AnnotationKind, &[Annotation])> {
        self.by_kind
            .iter()
            .map(|(kind, group)| (*kind, group.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Annotation> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        let mut set = AnnotationSet::new();
        for annotation in iter {
            set.push(annotation);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub annotations: AnnotationSet,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>, annotations: AnnotationSet) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            annotations,
        }
    }

    /// The same post with entities disabled.
    pub fn without_annotations(&self) -> Self {
        Self {
            id: self.id.clone(),
            text: self.text.clone(),
            annotations: AnnotationSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub id: String,
    pub markup: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_groups_by_payload_kind() {
        let set: AnnotationSet = vec![
            Annotation::hashtag(Span::new(10, 14), "fun"),
            Annotation::mention(Span::new(0, 4), "bob", "Bob"),
            Annotation::hashtag(Span::new(2, 6), "rust"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.of_kind(AnnotationKind::Mention).len(), 1);
        assert_eq!(set.of_kind(AnnotationKind::Link).len(), 0);
        let tags = set.of_kind(AnnotationKind::Hashtag);
        assert_eq!(tags[0].span, Span::new(10, 14));
        assert_eq!(tags[1].span, Span::new(2, 6));
    }

    #[test]
    fn test_groups_iterate_in_kind_order() {
        let set: AnnotationSet = vec![
            Annotation::media(Span::new(0, 1), "http://m", "m"),
            Annotation::link(Span::new(2, 3), "http://s", "http://e", "d"),
            Annotation::mention(Span::new(4, 5), "a", "A"),
        ]
        .into_iter()
        .collect();

        let kinds: Vec<AnnotationKind> = set.groups().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![
                AnnotationKind::Mention,
                AnnotationKind::Link,
                AnnotationKind::Media
            ]
        );
    }

    #[test]
    fn test_without_annotations_keeps_text() {
        let post = Post::new(
            "1",
            "hi @bob",
            vec![Annotation::mention(Span::new(3, 7), "bob", "Bob")]
                .into_iter()
                .collect(),
        );
        let plain = post.without_annotations();
        assert_eq!(plain.id, "1");
        assert_eq!(plain.text, "hi @bob");
        assert!(plain.annotations.is_empty());
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 7).to_string(), "[3, 7)");
    }
}
