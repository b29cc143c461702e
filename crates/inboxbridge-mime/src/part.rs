//! Transient MIME part tree.

/// One node of a message's body structure.
///
/// `body_data` holds the transfer-decoded text of a leaf part. Multipart
/// containers carry no data of their own and list their sub-parts in
/// `children`, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MimePart {
    /// Bare `type/subtype`, lowercased.
    pub mime_type: String,
    /// Decoded body text, if the part has any.
    pub body_data: Option<String>,
    /// Nested parts.
    pub children: Vec<Self>,
}

impl MimePart {
    /// Creates a leaf part.
    #[must_use]
    pub fn leaf(mime_type: impl Into<String>, body_data: Option<String>) -> Self {
        Self {
            mime_type: mime_type.into().to_ascii_lowercase(),
            body_data,
            children: Vec::new(),
        }
    }

    /// Creates a container part.
    #[must_use]
    pub fn container(mime_type: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            mime_type: mime_type.into().to_ascii_lowercase(),
            body_data: None,
            children,
        }
    }

    /// Returns the body text when it is present and non-empty.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.body_data.as_deref().filter(|d| !d.is_empty())
    }

    /// Case-insensitive match on the bare MIME type.
    #[must_use]
    pub fn is(&self, mime_type: &str) -> bool {
        self.mime_type.eq_ignore_ascii_case(mime_type)
    }

    /// Depth-first, left-to-right iterator over this part and its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_counts_as_missing() {
        let part = MimePart::leaf("text/plain", Some(String::new()));
        assert!(part.data().is_none());
    }

    #[test]
    fn walk_is_document_order() {
        let tree = MimePart::container(
            "multipart/mixed",
            vec![
                MimePart::container(
                    "multipart/alternative",
                    vec![MimePart::leaf("text/plain", None), MimePart::leaf("text/html", None)],
                ),
                MimePart::leaf("image/png", None),
            ],
        );

        let order: Vec<&str> = tree.walk().map(|p| p.mime_type.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/plain",
                "text/html",
                "image/png"
            ]
        );
    }

    #[test]
    fn mime_type_is_case_insensitive() {
        let part = MimePart::leaf("Text/HTML", None);
        assert_eq!(part.mime_type, "text/html");
        assert!(part.is("TEXT/html"));
    }
}
