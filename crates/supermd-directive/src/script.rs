//! The embedded script evaluator boundary (`SPEC_FULL.md` §10).
//!
//! No corpus crate offers an embeddable language whose property-access and
//! call semantics return first-class error values rather than throwing on
//! a miss, so the directive expression grammar — a narrow, non-recursive
//! chain of field access followed by method calls — is parsed and
//! evaluated in-crate, behind the [`ScriptEngine`] trait so a future
//! embedder can swap in a different evaluator without touching the
//! object model or dispatch tables.

use std::rc::Rc;

use crate::directive::{builtins, Content};
use crate::value::Value;

pub trait ScriptEngine {
    /// Evaluates `expr` (the directive URL with its leading `$` already
    /// stripped) against `content`, returning the resulting directive
    /// handle or an error value.
    fn eval(&self, content: &Rc<Content>, expr: &str) -> Value;
}

/// The crate's one concrete [`ScriptEngine`]: a recursive-descent parser
/// for `field ("." call)*` where `call` is `ident "(" (literal ",")* ")"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChainEvalEngine;

impl ScriptEngine for ChainEvalEngine {
    fn eval(&self, content: &Rc<Content>, expr: &str) -> Value {
        let mut parser = Parser::new(expr);
        match parser.parse_chain(content) {
            Ok(v) => v,
            Err(msg) => Value::err(msg),
        }
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: u8) -> Result<(), String> {
        self.skip_ws();
        if self.bump() == Some(c) {
            Ok(())
        } else {
            Err(format!("expected '{}' in directive expression", c as char))
        }
    }

    fn parse_ident(&mut self) -> Result<&'a str, String> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err("expected an identifier in directive expression".to_owned());
        }
        Ok(std::str::from_utf8(&self.bytes[start..self.pos]).unwrap())
    }

    fn parse_chain(&mut self, content: &Rc<Content>) -> Result<Value, String> {
        let field = self.parse_ident()?;
        let handle = content
            .field(field)
            .ok_or_else(|| format!("unknown directive field '{field}'"))?;
        let mut value = Value::Directive(handle);
        self.skip_ws();
        while self.peek() == Some(b'.') {
            self.pos += 1;
            let name = self.parse_ident()?;
            let args = self.parse_args()?;
            let handle = value
                .as_directive()
                .ok_or_else(|| "field access on directive".to_owned())?;
            value = builtins::call_fallback(&handle, name, &args);
            if value.is_err() {
                return Ok(value);
            }
            self.skip_ws();
        }
        self.skip_ws();
        if self.pos != self.bytes.len() {
            return Err("unexpected trailing input in directive expression".to_owned());
        }
        Ok(value)
    }

    fn parse_args(&mut self) -> Result<Vec<Value>, String> {
        self.expect(b'(')?;
        let mut args = vec![];
        self.skip_ws();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_literal()?);
            self.skip_ws();
            match self.bump() {
                Some(b',') => continue,
                Some(b')') => break,
                _ => return Err("malformed argument list in directive expression".to_owned()),
            }
        }
        Ok(args)
    }

    fn parse_literal(&mut self) -> Result<Value, String> {
        self.skip_ws();
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|b| b != q) {
                    self.pos += 1;
                }
                if self.peek() != Some(q) {
                    return Err("malformed literal: unterminated string".to_owned());
                }
                let s = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap().to_owned();
                self.pos += 1;
                Ok(Value::Str(s))
            }
            Some(b) if b.is_ascii_digit() || b == b'-' => {
                let start = self.pos;
                self.pos += 1;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
                let text = std::str::from_utf8(&self.bytes[start..self.pos]).unwrap();
                text.parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| format!("malformed literal: '{text}'"))
            }
            Some(b) if b.is_ascii_alphabetic() => {
                let ident = self.parse_ident()?;
                match ident {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    other => Err(format!("malformed literal: '{other}'")),
                }
            }
            _ => Err("expected a literal in directive expression".to_owned()),
        }
    }
}
