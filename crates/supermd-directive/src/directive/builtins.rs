//! Named, typed mutators callable from a directive expression, plus the
//! two-level (kind-specific, then common) dispatch protocol.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use super::{AssetRef, Body, Directive, Kind, PageKind, PageRef, Resolved, Src};
use crate::errors::BuiltinError;
use crate::path::{path_validation_error, strip_trailing_slash};
use crate::value::Value;

fn handle_value(handle: &Rc<RefCell<Directive>>) -> Value {
    Value::Directive(Rc::clone(handle))
}

fn one_str(args: &[Value]) -> Result<&str, BuiltinError> {
    match args {
        [Value::Str(s)] => Ok(s.as_str()),
        _ => Err(BuiltinError::ArityOrType(1, "string")),
    }
}

fn one_bool(args: &[Value]) -> Result<bool, BuiltinError> {
    match args {
        [Value::Bool(b)] => Ok(*b),
        _ => Err(BuiltinError::ArityOrType(1, "bool")),
    }
}

fn many_str(args: &[Value]) -> Result<Vec<String>, BuiltinError> {
    if args.is_empty() {
        return Err(BuiltinError::ArityOrType(1, "string"));
    }
    args.iter()
        .map(|v| v.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .ok_or(BuiltinError::ArityOrType(1, "string"))
}

fn ref_and_optional_locale(args: &[Value]) -> Result<(&str, Option<&str>), BuiltinError> {
    match args {
        [Value::Str(r)] => Ok((r.as_str(), None)),
        [Value::Str(r), Value::Str(l)] => Ok((r.as_str(), Some(l.as_str()))),
        _ => Err(BuiltinError::ArityOrType(1, "string")),
    }
}

/// Dispatches a call on `handle`. Tries the active kind's table first,
/// then falls back to the common table that applies regardless of kind.
pub fn call_fallback(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Value {
    let kind = handle.borrow().kind();
    if let Some(v) = dispatch_kind_specific(handle, kind, name, args) {
        return v;
    }
    if let Some(v) = dispatch_common(handle, name, args) {
        return v;
    }
    Value::err(BuiltinError::BuiltinNotFound(kind.name().to_owned()).to_string())
}

fn dispatch_common(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Option<Value> {
    let result = match name {
        "id" => one_str(args).and_then(|s| handle.borrow_mut().set_id(s.to_owned())),
        "title" => one_str(args).and_then(|s| handle.borrow_mut().set_title(s.to_owned())),
        "attrs" => many_str(args).and_then(|v| handle.borrow_mut().set_attrs(v)),
        "data" => {
            if args.is_empty() || args.len() % 2 != 0 {
                Err(BuiltinError::DataArity)
            } else {
                many_str(args).and_then(|flat| {
                    let pairs = flat
                        .chunks_exact(2)
                        .map(|c| (c[0].clone(), c[1].clone()))
                        .collect();
                    handle.borrow_mut().set_data(pairs)
                })
            }
        }
        _ => return None,
    };
    Some(match result {
        Ok(()) => handle_value(handle),
        Err(e) => Value::err(e.to_string()),
    })
}

fn set_src(handle: &Rc<RefCell<Directive>>, src: Src) -> Value {
    match handle.borrow_mut().set_src(src) {
        Ok(()) => handle_value(handle),
        Err(e) => Value::err(e.to_string()),
    }
}

fn has_src_slot(kind: Kind) -> bool {
    matches!(kind, Kind::Image | Kind::Video | Kind::Code | Kind::Link)
}

fn src_setting_builtin(handle: &Rc<RefCell<Directive>>, kind: Kind, name: &str, args: &[Value]) -> Option<Value> {
    if !has_src_slot(kind) {
        return None;
    }
    match name {
        "url" => Some(match one_str(args) {
            Ok(s) => match Url::parse(s) {
                Ok(u) if !u.scheme().is_empty() => set_src(handle, Src::Url(s.to_owned())),
                _ => Value::err(BuiltinError::UrlMissingScheme.to_string()),
            },
            Err(e) => Value::err(e.to_string()),
        }),
        "asset" => Some(path_checked(handle, args, |r| {
            Src::PageAsset(AssetRef {
                reference: r,
                resolved: Resolved::Pending,
            })
        })),
        "siteAsset" => Some(path_checked(handle, args, |r| {
            Src::SiteAsset(AssetRef {
                reference: r,
                resolved: Resolved::Pending,
            })
        })),
        "buildAsset" => Some(match one_str(args) {
            Ok(s) => set_src(handle, Src::BuildAsset { reference: s.to_owned() }),
            Err(e) => Value::err(e.to_string()),
        }),
        "page" => Some(page_like(handle, args, PageKind::Absolute)),
        "sub" => Some(page_like(handle, args, PageKind::Sub)),
        "sibling" => Some(page_like(handle, args, PageKind::Sibling)),
        _ => None,
    }
}

fn path_checked(handle: &Rc<RefCell<Directive>>, args: &[Value], make: impl FnOnce(String) -> Src) -> Value {
    match one_str(args) {
        Ok(s) => match path_validation_error(s) {
            Some(e) => Value::err(e.to_string()),
            None => set_src(handle, make(s.to_owned())),
        },
        Err(e) => Value::err(e.to_string()),
    }
}

fn page_like(handle: &Rc<RefCell<Directive>>, args: &[Value], kind: PageKind) -> Value {
    match ref_and_optional_locale(args) {
        Ok((r, locale)) => match path_validation_error(r) {
            Some(e) => Value::err(e.to_string()),
            None => set_src(
                handle,
                Src::Page(PageRef {
                    kind,
                    reference: strip_trailing_slash(r).to_owned(),
                    locale: locale.map(str::to_owned),
                    resolved: Resolved::Pending,
                }),
            ),
        },
        Err(e) => Value::err(e.to_string()),
    }
}

fn dispatch_kind_specific(
    handle: &Rc<RefCell<Directive>>,
    kind: Kind,
    name: &str,
    args: &[Value],
) -> Option<Value> {
    if let Some(v) = src_setting_builtin(handle, kind, name, args) {
        return Some(v);
    }
    match kind {
        Kind::Link => link_builtin(handle, name, args),
        Kind::Image => image_builtin(handle, name, args),
        Kind::Video => video_builtin(handle, name, args),
        Kind::Code => code_builtin(handle, name, args),
        _ => None,
    }
}

fn link_builtin(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "ref" => Some(set_link_ref(handle, args, false)),
        "unsafeRef" => Some(set_link_ref(handle, args, true)),
        "alternative" => Some(match one_str(args) {
            Ok(s) => {
                let mut d = handle.borrow_mut();
                let Body::Link(b) = &mut d.body else { unreachable!() };
                if b.alternative.is_some() {
                    Value::err(BuiltinError::FieldAlreadySet.to_string())
                } else {
                    b.alternative = Some(s.to_owned());
                    drop(d);
                    handle_value(handle)
                }
            }
            Err(e) => Value::err(e.to_string()),
        }),
        "new" => Some(match one_bool(args) {
            Ok(b) => {
                let mut d = handle.borrow_mut();
                let Body::Link(body) = &mut d.body else { unreachable!() };
                if body.new.is_some() {
                    Value::err(BuiltinError::FieldAlreadySet.to_string())
                } else {
                    body.new = Some(b);
                    drop(d);
                    handle_value(handle)
                }
            }
            Err(e) => Value::err(e.to_string()),
        }),
        _ => None,
    }
}

fn set_link_ref(handle: &Rc<RefCell<Directive>>, args: &[Value], unsafe_: bool) -> Value {
    match one_str(args) {
        Ok(s) => {
            let mut d = handle.borrow_mut();
            let Body::Link(b) = &mut d.body else { unreachable!() };
            if b.reference.is_some() {
                Value::err(BuiltinError::FieldAlreadySet.to_string())
            } else {
                b.reference = Some(s.to_owned());
                b.ref_unsafe = unsafe_;
                drop(d);
                handle_value(handle)
            }
        }
        Err(e) => Value::err(e.to_string()),
    }
}

fn image_builtin(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "alt" => Some(match one_str(args) {
            Ok(s) => {
                let mut d = handle.borrow_mut();
                let Body::Image(b) = &mut d.body else { unreachable!() };
                if b.alt.is_some() {
                    Value::err(BuiltinError::FieldAlreadySet.to_string())
                } else {
                    b.alt = Some(s.to_owned());
                    drop(d);
                    handle_value(handle)
                }
            }
            Err(e) => Value::err(e.to_string()),
        }),
        "linked" => Some(set_image_bool(handle, args, |b| &mut b.linked)),
        _ => None,
    }
}

fn set_image_bool(
    handle: &Rc<RefCell<Directive>>,
    args: &[Value],
    field: impl FnOnce(&mut super::kind::ImageBody) -> &mut Option<bool>,
) -> Value {
    match one_bool(args) {
        Ok(value) => {
            let mut d = handle.borrow_mut();
            let Body::Image(b) = &mut d.body else { unreachable!() };
            let slot = field(b);
            if slot.is_some() {
                Value::err(BuiltinError::FieldAlreadySet.to_string())
            } else {
                *slot = Some(value);
                drop(d);
                handle_value(handle)
            }
        }
        Err(e) => Value::err(e.to_string()),
    }
}

fn video_builtin(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Option<Value> {
    let field: fn(&mut super::kind::VideoBody) -> &mut Option<bool> = match name {
        "loop" => |b| &mut b.loop_,
        "muted" => |b| &mut b.muted,
        "autoplay" => |b| &mut b.autoplay,
        "controls" => |b| &mut b.controls,
        "pip" => |b| &mut b.pip,
        _ => return None,
    };
    Some(match one_bool(args) {
        Ok(value) => {
            let mut d = handle.borrow_mut();
            let Body::Video(b) = &mut d.body else { unreachable!() };
            let slot = field(b);
            if slot.is_some() {
                Value::err(BuiltinError::FieldAlreadySet.to_string())
            } else {
                *slot = Some(value);
                drop(d);
                handle_value(handle)
            }
        }
        Err(e) => Value::err(e.to_string()),
    })
}

fn code_builtin(handle: &Rc<RefCell<Directive>>, name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "language" => Some(match one_str(args) {
            Ok(s) => {
                let mut d = handle.borrow_mut();
                let Body::Code(b) = &mut d.body else { unreachable!() };
                if b.language.is_some() {
                    Value::err(BuiltinError::FieldAlreadySet.to_string())
                } else {
                    b.language = Some(s.to_owned());
                    drop(d);
                    handle_value(handle)
                }
            }
            Err(e) => Value::err(e.to_string()),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn new_handle(kind: Kind) -> Rc<RefCell<Directive>> {
        Rc::new(RefCell::new(Directive::new(kind)))
    }

    #[test]
    fn id_sets_once_then_errors() {
        let h = new_handle(Kind::Text);
        let v = call_fallback(&h, "id", &[Value::Str("a".into())]);
        assert!(matches!(v, Value::Directive(_)));
        let v = call_fallback(&h, "id", &[Value::Str("b".into())]);
        assert_eq!(v.is_err(), true);
    }

    #[test]
    fn attrs_requires_nonempty_strings() {
        let h = new_handle(Kind::Text);
        assert!(call_fallback(&h, "attrs", &[]).is_err());
        assert!(call_fallback(&h, "attrs", &[Value::Int(1)]).is_err());
        let v = call_fallback(&h, "attrs", &[Value::Str("warn".into())]);
        assert!(matches!(v, Value::Directive(_)));
    }

    #[test]
    fn data_requires_even_nonzero_args() {
        let h = new_handle(Kind::Text);
        assert!(call_fallback(&h, "data", &[]).is_err());
        assert!(call_fallback(&h, "data", &[Value::Str("k".into())]).is_err());
        let v = call_fallback(
            &h,
            "data",
            &[Value::Str("k".into()), Value::Str("v".into())],
        );
        assert!(matches!(v, Value::Directive(_)));
    }

    #[test]
    fn data_rejects_duplicate_key_in_one_call() {
        let h = new_handle(Kind::Text);
        let v = call_fallback(
            &h,
            "data",
            &[
                Value::Str("k".into()),
                Value::Str("1".into()),
                Value::Str("k".into()),
                Value::Str("2".into()),
            ],
        );
        match v {
            Value::Err(m) => assert_eq!(m, "duplicate key: 'k'"),
            other => panic!("expected err, got {other:?}"),
        }
    }

    #[test]
    fn src_builtins_are_mutually_exclusive() {
        let h = new_handle(Kind::Image);
        let v = call_fallback(&h, "asset", &[Value::Str("pic.png".into())]);
        assert!(matches!(v, Value::Directive(_)));
        let v = call_fallback(&h, "siteAsset", &[Value::Str("pic2.png".into())]);
        assert!(v.is_err());
    }

    #[test]
    fn url_requires_scheme() {
        let h = new_handle(Kind::Link);
        assert!(call_fallback(&h, "url", &[Value::Str(String::new())]).is_err());
        assert!(call_fallback(&h, "url", &[Value::Str("foo".into())]).is_err());
        let h2 = new_handle(Kind::Link);
        let v = call_fallback(&h2, "url", &[Value::Str("https://example".into())]);
        assert!(matches!(v, Value::Directive(_)));
    }

    #[test]
    fn page_strips_trailing_slash() {
        let h = new_handle(Kind::Link);
        call_fallback(&h, "page", &[Value::Str("a/b/".into())]);
        let Body::Link(b) = &h.borrow().body else { unreachable!() };
        match b.src.as_ref().unwrap() {
            Src::Page(p) => assert_eq!(p.reference, "a/b"),
            other => panic!("unexpected src {other:?}"),
        }
    }

    #[test]
    fn page_rejects_bad_paths() {
        let h = new_handle(Kind::Link);
        assert!(call_fallback(&h, "page", &[Value::Str("/abs".into())]).is_err());
        let h = new_handle(Kind::Link);
        assert!(call_fallback(&h, "page", &[Value::Str("a/./b".into())]).is_err());
        let h = new_handle(Kind::Link);
        assert!(call_fallback(&h, "page", &[Value::Str("a//b".into())]).is_err());
    }

    #[test]
    fn ref_and_unsafe_ref_share_one_field() {
        let h = new_handle(Kind::Link);
        call_fallback(&h, "ref", &[Value::Str("sec-a".into())]);
        let Body::Link(b) = &h.borrow().body else { unreachable!() };
        assert_eq!(b.reference.as_deref(), Some("sec-a"));
        assert!(!b.ref_unsafe);
    }

    #[test]
    fn unknown_builtin_for_kind_is_ambient_error() {
        let h = new_handle(Kind::Text);
        let v = call_fallback(&h, "language", &[Value::Str("rs".into())]);
        match v {
            Value::Err(m) => assert_eq!(m, "builtin not found in 'text'"),
            other => panic!("expected err, got {other:?}"),
        }
    }
}
