//! Table cell text and the inline link markers the editor stores in it.
//!
//! The editor encodes attached forms and videos directly in a cell as
//! `[FORM] Title||URL` or `[VIDEO] Title||URL`. For print output only the
//! title is shown; video titles additionally become clickable.

const FORM_MARKER: &str = "[FORM] ";
const VIDEO_MARKER: &str = "[VIDEO] ";
const URL_SEPARATOR: &str = "||";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Form,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellLink {
    pub kind: LinkKind,
    pub url: String,
}

/// A cell ready for layout: the text to display plus an optional link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub link: Option<CellLink>,
}

impl Cell {
    pub fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            link: None,
        }
    }

    /// Parse raw cell text, recognizing the form and video markers.
    pub fn parse(raw: &str) -> Self {
        let (kind, rest) = if let Some(rest) = raw.strip_prefix(FORM_MARKER) {
            (LinkKind::Form, rest)
        } else if let Some(rest) = raw.strip_prefix(VIDEO_MARKER) {
            (LinkKind::Video, rest)
        } else {
            return Self::plain(raw);
        };

        let (title, url) = match rest.split_once(URL_SEPARATOR) {
            Some((title, url)) => (title.trim(), url.trim()),
            None => (rest.trim(), ""),
        };

        let text = if title.is_empty() { url } else { title };
        let link = if url.is_empty() {
            None
        } else {
            Some(CellLink {
                kind,
                url: url.to_string(),
            })
        };

        Self {
            text: text.to_string(),
            link,
        }
    }

    /// The URL to attach as a clickable annotation in print output.
    pub fn clickable_url(&self) -> Option<&str> {
        match &self.link {
            Some(CellLink {
                kind: LinkKind::Video,
                url,
            }) => Some(url),
            _ => None,
        }
    }
}
