//! The typed directive record and its enclosing `Content` namespace.

pub mod builtins;
pub mod kind;
pub mod src;

pub use kind::{Body, Kind, Size};
pub use src::{AssetRef, PageKind, PageRef, Resolved, Src};

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::errors::BuiltinError;

/// A directive record: four single-assignment common fields plus a
/// kind-specific body. `kind` is fixed at construction and never changes.
#[derive(Debug, Clone)]
pub struct Directive {
    pub id: Option<String>,
    pub attrs: Option<Vec<String>>,
    pub title: Option<String>,
    pub data: IndexMap<String, String>,
    pub body: Body,
}

impl Directive {
    #[must_use]
    pub fn new(kind: Kind) -> Self {
        Self {
            id: None,
            attrs: None,
            title: None,
            data: IndexMap::new(),
            body: Body::default_for(kind),
        }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.body.kind()
    }

    pub fn set_id(&mut self, s: String) -> Result<(), BuiltinError> {
        if self.id.is_some() {
            return Err(BuiltinError::FieldAlreadySet);
        }
        self.id = Some(s);
        Ok(())
    }

    pub fn set_title(&mut self, s: String) -> Result<(), BuiltinError> {
        if self.title.is_some() {
            return Err(BuiltinError::FieldAlreadySet);
        }
        self.title = Some(s);
        Ok(())
    }

    pub fn set_attrs(&mut self, values: Vec<String>) -> Result<(), BuiltinError> {
        if self.attrs.is_some() {
            return Err(BuiltinError::FieldAlreadySet);
        }
        self.attrs = Some(values);
        Ok(())
    }

    pub fn set_data(&mut self, pairs: Vec<(String, String)>) -> Result<(), BuiltinError> {
        if !self.data.is_empty() {
            return Err(BuiltinError::FieldAlreadySet);
        }
        let mut staged = IndexMap::new();
        for (k, v) in pairs {
            if staged.insert(k.clone(), v).is_some() {
                return Err(BuiltinError::DuplicateKey(k));
            }
        }
        self.data = staged;
        Ok(())
    }

    /// `true` once any single-assignment `Src`-setting builtin has run.
    #[must_use]
    pub fn src(&self) -> Option<&Src> {
        match &self.body {
            Body::Image(b) => b.src.as_ref(),
            Body::Video(b) => b.src.as_ref(),
            Body::Code(b) => b.src.as_ref(),
            Body::Link(b) => b.src.as_ref(),
            _ => None,
        }
    }

    pub fn set_src(&mut self, src: Src) -> Result<(), BuiltinError> {
        let slot = match &mut self.body {
            Body::Image(b) => &mut b.src,
            Body::Video(b) => &mut b.src,
            Body::Code(b) => &mut b.src,
            Body::Link(b) => &mut b.src,
            _ => return Err(BuiltinError::BuiltinNotFound(self.kind().name().to_owned())),
        };
        if slot.is_some() {
            return Err(BuiltinError::FieldAlreadySet);
        }
        *slot = Some(src);
        Ok(())
    }
}

/// The global root exposed to each directive expression: one
/// default-constructed `Directive` per kind, stack-scoped to a single
/// expression evaluation.
#[derive(Debug)]
pub struct Content {
    pub section: Rc<RefCell<Directive>>,
    pub block: Rc<RefCell<Directive>>,
    pub heading: Rc<RefCell<Directive>>,
    pub text: Rc<RefCell<Directive>>,
    pub katex: Rc<RefCell<Directive>>,
    pub link: Rc<RefCell<Directive>>,
    pub code: Rc<RefCell<Directive>>,
    pub image: Rc<RefCell<Directive>>,
    pub video: Rc<RefCell<Directive>>,
}

impl Default for Content {
    fn default() -> Self {
        Self::new()
    }
}

impl Content {
    #[must_use]
    pub fn new() -> Self {
        Self {
            section: Rc::new(RefCell::new(Directive::new(Kind::Section))),
            block: Rc::new(RefCell::new(Directive::new(Kind::Block))),
            heading: Rc::new(RefCell::new(Directive::new(Kind::Heading))),
            text: Rc::new(RefCell::new(Directive::new(Kind::Text))),
            katex: Rc::new(RefCell::new(Directive::new(Kind::Katex))),
            link: Rc::new(RefCell::new(Directive::new(Kind::Link))),
            code: Rc::new(RefCell::new(Directive::new(Kind::Code))),
            image: Rc::new(RefCell::new(Directive::new(Kind::Image))),
            video: Rc::new(RefCell::new(Directive::new(Kind::Video))),
        }
    }

    /// Field access on the root by name; the sole way an expression picks
    /// which directive it is constructing.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Rc<RefCell<Directive>>> {
        let rc = match name {
            "section" => &self.section,
            "block" => &self.block,
            "heading" => &self.heading,
            "text" => &self.text,
            "katex" => &self.katex,
            "link" => &self.link,
            "code" => &self.code,
            "image" => &self.image,
            "video" => &self.video,
            _ => return None,
        };
        Some(Rc::clone(rc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access_returns_shared_handle() {
        let content = Content::new();
        let a = content.field("heading").unwrap();
        let b = content.field("heading").unwrap();
        a.borrow_mut().set_id("x".to_string()).unwrap();
        assert_eq!(b.borrow().id.as_deref(), Some("x"));
    }

    #[test]
    fn unknown_field_name_is_none() {
        assert!(Content::new().field("nope").is_none());
    }

    #[test]
    fn common_fields_are_single_assignment() {
        let mut d = Directive::new(Kind::Text);
        d.set_id("a".to_string()).unwrap();
        assert_eq!(d.set_id("b".to_string()), Err(BuiltinError::FieldAlreadySet));
    }

    #[test]
    fn data_rejects_duplicate_keys() {
        let mut d = Directive::new(Kind::Text);
        let err = d
            .set_data(vec![("k".to_string(), "1".to_string()), ("k".to_string(), "2".to_string())])
            .unwrap_err();
        assert_eq!(err, BuiltinError::DuplicateKey("k".to_string()));
    }
}
