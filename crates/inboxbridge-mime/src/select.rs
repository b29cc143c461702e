//! Best-body selection over a [`MimePart`] tree.

use crate::part::MimePart;

/// Which representation was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BodyKind {
    /// `text/plain`.
    Plain,
    /// `text/html`.
    Html,
}

impl BodyKind {
    /// The MIME type this kind corresponds to.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Plain => "text/plain",
            Self::Html => "text/html",
        }
    }
}

/// The body chosen for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBody {
    /// Decoded body text.
    pub content: String,
    /// Plain or HTML.
    pub kind: BodyKind,
}

/// Picks the best body from a part tree.
///
/// The walk is depth-first and left-to-right. The first `text/plain` part with
/// data ends the search wherever it sits in the tree. A `text/html` part with
/// data is only remembered (the first one wins) and the search continues.
/// When the tree holds no plain text at all, the remembered HTML part is
/// returned.
#[must_use]
pub fn select_body(root: &MimePart) -> Option<SelectedBody> {
    let mut html = None;
    if let Some(plain) = find_plain(root, &mut html) {
        return Some(SelectedBody {
            content: plain.to_string(),
            kind: BodyKind::Plain,
        });
    }

    html.map(|content: &str| SelectedBody {
        content: content.to_string(),
        kind: BodyKind::Html,
    })
}

fn find_plain<'a>(part: &'a MimePart, html: &mut Option<&'a str>) -> Option<&'a str> {
    if let Some(data) = part.data() {
        if part.is(BodyKind::Plain.mime_type()) {
            return Some(data);
        }
        if part.is(BodyKind::Html.mime_type()) && html.is_none() {
            *html = Some(data);
        }
    }

    part.children
        .iter()
        .find_map(|child| find_plain(child, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn plain(text: &str) -> MimePart {
        MimePart::leaf("text/plain", Some(text.to_string()))
    }

    fn html(text: &str) -> MimePart {
        MimePart::leaf("text/html", Some(text.to_string()))
    }

    #[test]
    fn single_plain_part() {
        let body = select_body(&plain("hello")).unwrap();
        assert_eq!(body.kind, BodyKind::Plain);
        assert_eq!(body.content, "hello");
    }

    #[test]
    fn alternative_prefers_plain_even_when_html_first() {
        let tree = MimePart::container("multipart/alternative", vec![html("<p>hi</p>"), plain("hi")]);
        let body = select_body(&tree).unwrap();
        assert_eq!(body.kind, BodyKind::Plain);
        assert_eq!(body.content, "hi");
    }

    #[test]
    fn deeper_plain_beats_shallower_html() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![
                html("<b>top</b>"),
                MimePart::container(
                    "multipart/related",
                    vec![MimePart::container("multipart/alternative", vec![plain("deep")])],
                ),
            ],
        );
        let body = select_body(&tree).unwrap();
        assert_eq!(body.kind, BodyKind::Plain);
        assert_eq!(body.content, "deep");
    }

    #[test]
    fn first_plain_in_document_order_wins() {
        let tree = MimePart::container("multipart/mixed", vec![plain("first"), plain("second")]);
        assert_eq!(select_body(&tree).unwrap().content, "first");
    }

    #[test]
    fn only_html_returns_first_html() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![
                MimePart::container("multipart/related", vec![html("one")]),
                html("two"),
            ],
        );
        let body = select_body(&tree).unwrap();
        assert_eq!(body.kind, BodyKind::Html);
        assert_eq!(body.content, "one");
    }

    #[test]
    fn parts_without_data_are_skipped() {
        let tree = MimePart::container(
            "multipart/alternative",
            vec![MimePart::leaf("text/plain", None), html("<i>x</i>")],
        );
        assert_eq!(select_body(&tree).unwrap().kind, BodyKind::Html);
    }

    #[test]
    fn nothing_renderable() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![MimePart::leaf("application/pdf", Some("%PDF".to_string()))],
        );
        assert!(select_body(&tree).is_none());
        assert!(select_body(&MimePart::default()).is_none());
    }
}
