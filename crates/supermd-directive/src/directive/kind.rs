//! `Kind` discriminant and the per-kind field bodies.

use super::Src;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Section,
    Block,
    Heading,
    Text,
    Katex,
    Link,
    Code,
    Image,
    Video,
}

impl Kind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Kind::Section => "section",
            Kind::Block => "block",
            Kind::Heading => "heading",
            Kind::Text => "text",
            Kind::Katex => "katex",
            Kind::Link => "link",
            Kind::Code => "code",
            Kind::Image => "image",
            Kind::Video => "video",
        }
    }

    #[must_use]
    pub fn all() -> [Kind; 9] {
        [
            Kind::Section,
            Kind::Block,
            Kind::Heading,
            Kind::Text,
            Kind::Katex,
            Kind::Link,
            Kind::Code,
            Kind::Image,
            Kind::Video,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub w: i64,
    pub h: i64,
}

/// Kind-specific fields. Each `Option` field obeys the same
/// single-assignment discipline as the common fields on `Directive`.
#[derive(Debug, Clone, Default)]
pub struct SectionBody {
    pub end: bool,
}

#[derive(Debug, Clone, Default)]
pub struct KatexBody {
    /// Populated by the placement validator from a child code literal;
    /// never directly user-settable.
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageBody {
    pub src: Option<Src>,
    pub alt: Option<String>,
    pub linked: Option<bool>,
    pub size: Option<Size>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoBody {
    pub src: Option<Src>,
    pub loop_: Option<bool>,
    pub muted: Option<bool>,
    pub autoplay: Option<bool>,
    pub controls: Option<bool>,
    pub pip: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CodeBody {
    pub src: Option<Src>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LinkBody {
    pub src: Option<Src>,
    pub alternative: Option<String>,
    pub reference: Option<String>,
    pub ref_unsafe: bool,
    pub new: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum Body {
    Section(SectionBody),
    Block,
    Heading,
    Text,
    Katex(KatexBody),
    Link(LinkBody),
    Code(CodeBody),
    Image(ImageBody),
    Video(VideoBody),
}

impl Body {
    #[must_use]
    pub fn default_for(kind: Kind) -> Self {
        match kind {
            Kind::Section => Body::Section(SectionBody::default()),
            Kind::Block => Body::Block,
            Kind::Heading => Body::Heading,
            Kind::Text => Body::Text,
            Kind::Katex => Body::Katex(KatexBody::default()),
            Kind::Link => Body::Link(LinkBody::default()),
            Kind::Code => Body::Code(CodeBody::default()),
            Kind::Image => Body::Image(ImageBody::default()),
            Kind::Video => Body::Video(VideoBody::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Body::Section(_) => Kind::Section,
            Body::Block => Kind::Block,
            Body::Heading => Kind::Heading,
            Body::Text => Kind::Text,
            Body::Katex(_) => Kind::Katex,
            Body::Link(_) => Kind::Link,
            Body::Code(_) => Kind::Code,
            Body::Image(_) => Kind::Image,
            Body::Video(_) => Kind::Video,
        }
    }

    /// Fields on the kind-specific body that the placement validator must
    /// find set before the directive is accepted.
    #[must_use]
    pub fn mandatory_unset_field(&self) -> Option<&'static str> {
        match self {
            Body::Image(b) if b.src.is_none() => Some("src"),
            Body::Video(b) if b.src.is_none() => Some("src"),
            Body::Code(b) if b.src.is_none() => Some("src"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_body_matches_requested_kind() {
        for kind in Kind::all() {
            assert_eq!(Body::default_for(kind).kind(), kind);
        }
    }

    #[test]
    fn media_kinds_require_src() {
        assert_eq!(
            Body::default_for(Kind::Image).mandatory_unset_field(),
            Some("src")
        );
        assert_eq!(
            Body::default_for(Kind::Video).mandatory_unset_field(),
            Some("src")
        );
        assert_eq!(
            Body::default_for(Kind::Code).mandatory_unset_field(),
            Some("src")
        );
        assert_eq!(Body::default_for(Kind::Text).mandatory_unset_field(), None);
    }
}
