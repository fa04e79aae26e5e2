//! Context-sensitive checker that accepts or rejects a directive based on
//! its parent/grandparent node kinds, siblings, and embedded text. Runs
//! once the directive expression has evaluated successfully.

use std::cell::RefCell;
use std::rc::Rc;

use crate::directive::{Body, Directive, Src};
use crate::node::{Node, NodeKind};

pub fn validate(node: Node, handle: &Rc<RefCell<Directive>>) -> Result<(), String> {
    use crate::directive::Kind;

    let kind = handle.borrow().kind();
    match kind {
        Kind::Section => validate_section(node, handle)?,
        Kind::Block => validate_block(node)?,
        Kind::Heading => validate_heading(node)?,
        Kind::Text => validate_text(node)?,
        Kind::Katex => validate_katex(node, handle)?,
        Kind::Link => validate_link(handle)?,
        Kind::Image | Kind::Video | Kind::Code => {}
    }
    mandatory_fields(handle)
}

const SECTION_PLACEMENT_ERROR: &str =
    "sections must be top level elements or be embedded in headings";

fn validate_section(node: Node, handle: &Rc<RefCell<Directive>>) -> Result<(), String> {
    let parent = node.parent().ok_or(SECTION_PLACEMENT_ERROR)?;
    let top_level = match parent.kind() {
        NodeKind::Paragraph => {
            node.is_first_child_of_parent()
                && node.first_child().is_none()
                && parent.parent().map(|g| g.kind()) == Some(NodeKind::Document)
        }
        NodeKind::Heading => parent.parent().map(|g| g.kind()) == Some(NodeKind::Document),
        _ => false,
    };
    if !top_level {
        return Err(SECTION_PLACEMENT_ERROR.to_owned());
    }
    let d = handle.borrow();
    if let Body::Section(s) = &d.body {
        if s.end && (d.id.is_some() || d.attrs.is_some() || d.title.is_some() || !d.data.is_empty())
        {
            return Err("section end directives must not set any other field".to_owned());
        }
    }
    Ok(())
}

const BLOCK_TEXT_ERROR: &str =
    "block definitions directly under a quote block cannot embed any text";

fn validate_block(node: Node) -> Result<(), String> {
    let parent = node.parent().ok_or_else(block_parent_error)?;
    match parent.kind() {
        NodeKind::Paragraph => {
            let under_block_quote =
                parent.parent().map(|g| g.kind()) == Some(NodeKind::BlockQuote);
            if node.first_child().is_some()
                || (under_block_quote && !parent.is_first_child_of_parent())
            {
                return Err(BLOCK_TEXT_ERROR.to_owned());
            }
            if !under_block_quote {
                return Err(block_parent_error());
            }
            Ok(())
        }
        NodeKind::Heading => {
            if parent.parent().map(|g| g.kind()) != Some(NodeKind::BlockQuote) {
                return Err(block_parent_error());
            }
            Ok(())
        }
        _ => Err(block_parent_error()),
    }
}

fn block_parent_error() -> String {
    "block directives must be placed directly under a quote block".to_owned()
}

fn validate_heading(node: Node) -> Result<(), String> {
    match node.parent().map(|p| p.kind()) {
        Some(NodeKind::Heading) => Ok(()),
        _ => Err("heading directives must have a heading as their parent".to_owned()),
    }
}

fn validate_text(node: Node) -> Result<(), String> {
    match node.first_child().and_then(|c| c.literal()) {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err("text directive must contain some text between square brackets".to_owned()),
    }
}

fn validate_katex(node: Node, handle: &Rc<RefCell<Directive>>) -> Result<(), String> {
    const KATEX_ERROR: &str = "katex directives must wrap a single code span";
    let child = node.first_child().ok_or(KATEX_ERROR)?;
    if child.kind() != NodeKind::Code {
        return Err(KATEX_ERROR.to_owned());
    }
    let literal = child.literal().filter(|s| !s.is_empty()).ok_or(KATEX_ERROR)?;
    child.unlink();
    if let Body::Katex(k) = &mut handle.borrow_mut().body {
        k.formula = Some(literal);
    }
    Ok(())
}

fn validate_link(handle: &Rc<RefCell<Directive>>) -> Result<(), String> {
    let mut d = handle.borrow_mut();
    let Body::Link(body) = &mut d.body else {
        unreachable!("validate_link called on non-link directive")
    };
    let has_ref_or_alt = body.reference.is_some() || body.alternative.is_some();
    if has_ref_or_alt && body.src.is_none() {
        body.src = Some(Src::SelfPage(None));
    }
    if has_ref_or_alt {
        match &body.src {
            Some(Src::Page(_) | Src::SelfPage(_)) => {}
            Some(_) => {
                return Err(
                    "'ref' and 'alternative' can only be specified when linking to a content page"
                        .to_owned(),
                )
            }
            None => unreachable!("src was just synthesized above"),
        }
    }
    if body.src.is_none() {
        return Err("missing call to 'url', 'asset', or another src-setting builtin".to_owned());
    }
    Ok(())
}

fn mandatory_fields(handle: &Rc<RefCell<Directive>>) -> Result<(), String> {
    if let Some(field) = handle.borrow().body.mandatory_unset_field() {
        return Err(format!("mandatory field '{field}' is unset"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Kind;
    use crate::node::DirectiveMap;
    use comrak::{Arena, Options};

    #[test]
    fn section_heading_requires_document_top_level() {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, "# [Welcome](#)\n", &Options::default());
        let directives = DirectiveMap::new();
        let doc = Node::new(root, &directives);
        let heading = doc.first_child().unwrap();
        let link = heading.first_child().unwrap();
        let handle = Rc::new(RefCell::new(Directive::new(Kind::Section)));
        assert!(validate_section(link, &handle).is_ok());
    }

    #[test]
    fn heading_directive_needs_heading_parent() {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, "[x](#)\n", &Options::default());
        let directives = DirectiveMap::new();
        let doc = Node::new(root, &directives);
        let paragraph = doc.first_child().unwrap();
        let link = paragraph.first_child().unwrap();
        assert!(validate_heading(link).is_err());
    }

    #[test]
    fn text_directive_requires_nonempty_literal() {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, "[hello](#)\n", &Options::default());
        let directives = DirectiveMap::new();
        let doc = Node::new(root, &directives);
        let paragraph = doc.first_child().unwrap();
        let link = paragraph.first_child().unwrap();
        assert!(validate_text(link).is_ok());
    }

    #[test]
    fn link_without_src_or_ref_fails() {
        let handle = Rc::new(RefCell::new(Directive::new(Kind::Link)));
        assert!(validate_link(&handle).is_err());
    }

    #[test]
    fn block_placeholder_after_sibling_text_reports_embed_text_error() {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, ">body\n>\n>[]($block)\n", &Options::default());
        let directives = DirectiveMap::new();
        let doc = Node::new(root, &directives);
        let block_quote = doc.first_child().unwrap();
        let second_paragraph = block_quote.first_child().unwrap().next_sibling().unwrap();
        let link = second_paragraph.first_child().unwrap();
        let err = validate_block(link).unwrap_err();
        assert_eq!(err, BLOCK_TEXT_ERROR);
    }

    #[test]
    fn link_ref_without_src_synthesizes_self_page() {
        let handle = Rc::new(RefCell::new(Directive::new(Kind::Link)));
        if let Body::Link(b) = &mut handle.borrow_mut().body {
            b.reference = Some("sec-a".to_string());
        }
        assert!(validate_link(&handle).is_ok());
        let d = handle.borrow();
        let Body::Link(b) = &d.body else { unreachable!() };
        assert_eq!(b.src, Some(Src::SelfPage(None)));
    }
}
