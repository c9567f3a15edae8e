/*
 * Parses the slash-delimited path text a user types into a column. Segments are
 * either literal names or the `*` wildcard that is resolved through a dropdown.
 * Empty segments are dropped, so leading, trailing and doubled slashes are harmless.
 */

pub const WILDCARD: &str = "*";
pub const SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTemplate {
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(text: &str) -> Self {
        let segments = split_segments(text)
            .map(|part| {
                if part == WILDCARD {
                    Segment::Wildcard
                } else {
                    Segment::Literal(part.to_string())
                }
            })
            .collect();
        PathTemplate { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/* Non-empty parts of a slash-separated path, in order. */
pub fn split_segments(text: &str) -> impl Iterator<Item = &str> {
    text.split(SEPARATOR).filter(|part| !part.is_empty())
}

pub fn join_segments<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("/")
}
