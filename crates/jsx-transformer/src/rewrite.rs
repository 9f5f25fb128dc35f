//! JSX to factory-call rewriting.
//!
//! Each element becomes `factory(tag, props[, key])` and each fragment
//! `factory(Fragment, props)`. Rewriting is bottom-up: attribute values and
//! children are produced first, with any JSX nested inside them (including
//! JSX inside arbitrary expressions) rewritten in place. Everything that is
//! not JSX is copied from the source untouched.
//!
//! Props are emitted in source order with `children` last. Reactive values
//! (see [`crate::classify`]) are deferred:
//!
//! | value                       | intrinsic tag        | component tag |
//! |-----------------------------|----------------------|---------------|
//! | `on*` attribute             | plain                | plain         |
//! | `is:*` attribute            | getter               | getter        |
//! | other attribute             | thunk `() => e`      | getter        |
//! | single child                | thunk                | getter        |
//!
//! Child lists with a reactive spread are deferred as a whole (thunk for
//! intrinsic tags, getter for components), as are intrinsic child lists that
//! are reactive throughout. Otherwise only the reactive entries are thunked.

use crate::classify::is_reactive;
use crate::context::{Namespace, RuntimeName, ScopeFrame, Tag};
use crate::emit::{self, Edit, Pieces, Style};
use crate::error::{TransformError, TransformErrorKind};
use crate::imports::ImportTable;
use crate::input::SourceFile;
use crate::text;
use crate::TranspileOptions;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    Expr, JSXAttr, JSXAttrName, JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXElementChild,
    JSXElementName, JSXExpr, JSXFragment, JSXMemberExpr, JSXObject, Lit, Module,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::trace;

/// How a prop value is deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrap {
    Plain,
    /// `name: () => value`
    Thunk,
    /// `get name() { return value; }`
    Getter,
}

/// A rewritten attribute value or child.
struct Value {
    pieces: Pieces,
    reactive: bool,
    /// An object literal needs parentheses as an arrow body.
    object_literal: bool,
}

impl Value {
    fn generated(pieces: Pieces) -> Self {
        Self {
            pieces,
            reactive: false,
            object_literal: false,
        }
    }

    fn literal(text: &str, origin: Span) -> Self {
        let mut pieces = Pieces::default();
        pieces.text(text, origin);
        Self::generated(pieces)
    }
}

enum Prop {
    Spread(Value),
    Field { key: String, value: Value, wrap: Wrap },
}

enum Segment<'c> {
    Text { raw: String, span: Span },
    Node(&'c JSXElementChild),
}

enum Child {
    Item(Value),
    Spread(Value),
}

impl Child {
    fn value(&self) -> &Value {
        match self {
            Self::Item(value) | Self::Spread(value) => value,
        }
    }
}

/// Rewrites the JSX in one file.
pub(crate) struct Rewriter<'a> {
    file: &'a SourceFile<'a>,
    options: &'a TranspileOptions,
    imports: &'a mut ImportTable,
    style: Style,
    rewritten: usize,
}

impl<'a> Rewriter<'a> {
    pub(crate) fn new(
        file: &'a SourceFile<'a>,
        options: &'a TranspileOptions,
        imports: &'a mut ImportTable,
        style: Style,
    ) -> Self {
        Self {
            file,
            options,
            imports,
            style,
            rewritten: 0,
        }
    }

    /// Number of elements and fragments rewritten so far.
    pub(crate) fn rewritten(&self) -> usize {
        self.rewritten
    }

    /// Returns one edit per outermost JSX node in the module.
    pub(crate) fn rewrite_module(&mut self, module: &Module) -> Result<Vec<Edit>, TransformError> {
        let root = ScopeFrame::root();
        let mut splicer = JsxSplicer::new(self, &root);
        module.visit_with(&mut splicer);
        splicer.finish()
    }

    // ---------------------------------------------------------------------
    // Elements
    // ---------------------------------------------------------------------

    fn element(
        &mut self,
        element: &JSXElement,
        scope: &ScopeFrame<'_>,
    ) -> Result<Pieces, TransformError> {
        let origin = self.file.span(element.span);
        let name_origin = self.file.span(element.opening.name.span());
        let (tag, tag_namespace) = resolve_tag(&element.opening.name);
        let xmlns = self.xmlns(&element.opening.attrs)?;
        let frame = scope.child(xmlns.or(tag_namespace));
        let factory = frame.factory();
        self.imports.use_name(factory);
        self.rewritten += 1;
        trace!(?tag, factory = factory.as_str(), "rewriting element");

        let intrinsic = tag.is_intrinsic();
        let mut props = Vec::with_capacity(element.opening.attrs.len() + 1);
        let mut key = None;
        for attr in &element.opening.attrs {
            match attr {
                JSXAttrOrSpread::SpreadElement(spread) => {
                    props.push(Prop::Spread(self.expr(&spread.expr, &frame)?));
                }
                JSXAttrOrSpread::JSXAttr(attr) => {
                    let name = attr_name(&attr.name);
                    if name == "key" {
                        key = self.key(attr, &frame)?;
                        continue;
                    }
                    let Some(value) = self.attr_value(attr, &frame)? else {
                        continue;
                    };
                    let wrap = attribute_wrap(&name, value.reactive, intrinsic);
                    props.push(Prop::Field {
                        key: name,
                        value,
                        wrap,
                    });
                }
            }
        }
        if let Some(children) = self.children(&element.children, intrinsic, &frame, origin)? {
            props.push(children);
        }

        let mut out = Pieces::default();
        out.text(factory.as_str(), origin);
        out.text("(", origin);
        match &tag {
            Tag::Identifier(name) | Tag::Member(name) => out.text(name, name_origin),
            Tag::Literal(name) => out.text(&text::quote(name), name_origin),
        }
        out.text(self.style.comma(), origin);
        self.write_object(&mut out, props, origin);
        if let Some(key) = key {
            out.text(self.style.comma(), origin);
            out.append(key.pieces);
        }
        out.text(")", origin);
        Ok(out)
    }

    fn fragment(
        &mut self,
        fragment: &JSXFragment,
        scope: &ScopeFrame<'_>,
    ) -> Result<Pieces, TransformError> {
        let origin = self.file.span(fragment.span);
        let factory = scope.factory();
        self.imports.use_name(factory);
        self.imports.use_name(RuntimeName::Fragment);
        self.rewritten += 1;

        let mut props = Vec::with_capacity(1);
        if let Some(children) = self.children(&fragment.children, true, scope, origin)? {
            props.push(children);
        }

        let mut out = Pieces::default();
        out.text(factory.as_str(), origin);
        out.text("(", origin);
        out.text(RuntimeName::Fragment.as_str(), origin);
        out.text(self.style.comma(), origin);
        self.write_object(&mut out, props, origin);
        out.text(")", origin);
        Ok(out)
    }

    /// Validates the element's `xmlns` attribute and returns the namespace
    /// it selects.
    fn xmlns(&self, attrs: &[JSXAttrOrSpread]) -> Result<Option<Namespace>, TransformError> {
        for attr in attrs {
            let JSXAttrOrSpread::JSXAttr(attr) = attr else {
                continue;
            };
            let JSXAttrName::Ident(name) = &attr.name else {
                continue;
            };
            if name.sym.as_ref() != "xmlns" {
                continue;
            }

            let span = self.file.span(attr.span);
            let non_string = || self.file.error(TransformErrorKind::NonStringXmlns, span);
            let uri = match &attr.value {
                None => return Err(non_string()),
                Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                    JSXExpr::Expr(expr) => match &**expr {
                        Expr::Lit(Lit::Str(s)) => s.value.to_string_lossy().into_owned(),
                        _ => return Err(non_string()),
                    },
                    JSXExpr::JSXEmptyExpr(_) => return Err(non_string()),
                },
                Some(JSXAttrValue::JSXElement(_) | JSXAttrValue::JSXFragment(_)) => {
                    return Err(non_string())
                }
                Some(string) => self.string_attr(self.file.span(string.span())),
            };

            return match Namespace::from_uri(&uri) {
                Some(namespace) => Ok(Some(namespace)),
                None => Err(self
                    .file
                    .error(TransformErrorKind::InvalidXmlns { value: uri }, span)),
            };
        }
        Ok(None)
    }

    // ---------------------------------------------------------------------
    // Attributes
    // ---------------------------------------------------------------------

    fn attr_value(
        &mut self,
        attr: &JSXAttr,
        frame: &ScopeFrame<'_>,
    ) -> Result<Option<Value>, TransformError> {
        let value = match &attr.value {
            None => Value::literal("true", self.file.span(attr.span)),
            Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                JSXExpr::Expr(expr) => self.expr(expr, frame)?,
                JSXExpr::JSXEmptyExpr(_) => return Ok(None),
            },
            Some(JSXAttrValue::JSXElement(element)) => Value::generated(self.element(element, frame)?),
            Some(JSXAttrValue::JSXFragment(fragment)) => {
                Value::generated(self.fragment(fragment, frame)?)
            }
            Some(string) => {
                let span = self.file.span(string.span());
                Value::literal(&text::quote(&self.string_attr(span)), span)
            }
        };
        Ok(Some(value))
    }

    fn key(&mut self, attr: &JSXAttr, frame: &ScopeFrame<'_>) -> Result<Option<Value>, TransformError> {
        let value = self.attr_value(attr, frame)?;
        if self.options.strict_keys && value.as_ref().is_some_and(|value| value.reactive) {
            return Err(self
                .file
                .error(TransformErrorKind::ReactiveKey, self.file.span(attr.span)));
        }
        Ok(value)
    }

    /// Decodes a quoted JSX attribute string.
    fn string_attr(&self, span: Span) -> String {
        let raw = self.file.slice(span);
        let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or(raw);
        text::decode_entities(inner)
    }

    // ---------------------------------------------------------------------
    // Children
    // ---------------------------------------------------------------------

    fn children(
        &mut self,
        children: &[JSXElementChild],
        intrinsic: bool,
        frame: &ScopeFrame<'_>,
        origin: Span,
    ) -> Result<Option<Prop>, TransformError> {
        let segments = self.segments(children);
        let last = segments.len().saturating_sub(1);

        let mut entries = Vec::with_capacity(segments.len());
        for (index, segment) in segments.into_iter().enumerate() {
            let child = match segment {
                Segment::Text { raw, span } => {
                    let Some(collapsed) =
                        text::collapse_whitespace(&raw, index == 0, index == last)
                    else {
                        continue;
                    };
                    let literal = text::quote(&text::decode_entities(&collapsed));
                    entries.push(Child::Item(Value::literal(&literal, span)));
                    continue;
                }
                Segment::Node(child) => child,
            };
            let entry = match child {
                JSXElementChild::JSXText(_) => continue,
                JSXElementChild::JSXExprContainer(container) => match &container.expr {
                    JSXExpr::Expr(expr) => Child::Item(self.expr(expr, frame)?),
                    JSXExpr::JSXEmptyExpr(_) => continue,
                },
                JSXElementChild::JSXSpreadChild(spread) => {
                    Child::Spread(self.expr(&spread.expr, frame)?)
                }
                JSXElementChild::JSXElement(element) => {
                    Child::Item(Value::generated(self.element(element, frame)?))
                }
                JSXElementChild::JSXFragment(fragment) => {
                    Child::Item(Value::generated(self.fragment(fragment, frame)?))
                }
            };
            entries.push(entry);
        }

        Ok(self.children_prop(entries, intrinsic, origin))
    }

    /// Drops empty `{}` containers and joins the text runs around them.
    fn segments<'c>(&self, children: &'c [JSXElementChild]) -> Vec<Segment<'c>> {
        let mut segments: Vec<Segment<'c>> = Vec::with_capacity(children.len());
        for child in children.iter().filter(|child| !is_empty_container(child)) {
            let JSXElementChild::JSXText(jsx_text) = child else {
                segments.push(Segment::Node(child));
                continue;
            };
            let span = self.file.span(jsx_text.span);
            let slice = self.file.slice(span);
            if let Some(Segment::Text { raw, span: joined }) = segments.last_mut() {
                raw.push_str(slice);
                *joined = Span::new(joined.start, span.end);
                continue;
            }
            segments.push(Segment::Text {
                raw: slice.to_string(),
                span,
            });
        }
        segments
    }

    fn children_prop(&self, mut entries: Vec<Child>, intrinsic: bool, origin: Span) -> Option<Prop> {
        let key = "children".to_string();
        if entries.is_empty() {
            return None;
        }
        if entries.len() == 1 && matches!(entries[0], Child::Item(_)) {
            let Some(Child::Item(value)) = entries.pop() else {
                return None;
            };
            let wrap = match (value.reactive, intrinsic) {
                (false, _) => Wrap::Plain,
                (true, true) => Wrap::Thunk,
                (true, false) => Wrap::Getter,
            };
            return Some(Prop::Field { key, value, wrap });
        }

        let any_reactive = entries.iter().any(|entry| entry.value().reactive);
        let all_reactive = entries.iter().all(|entry| entry.value().reactive);
        let reactive_spread = entries
            .iter()
            .any(|entry| matches!(entry, Child::Spread(value) if value.reactive));

        let (per_entry, wrap) = if !any_reactive {
            (false, Wrap::Plain)
        } else if reactive_spread || (intrinsic && all_reactive) {
            (false, if intrinsic { Wrap::Thunk } else { Wrap::Getter })
        } else {
            (true, Wrap::Plain)
        };

        let mut array = Pieces::default();
        array.text("[", origin);
        for (index, entry) in entries.into_iter().enumerate() {
            if index > 0 {
                array.text(self.style.comma(), origin);
            }
            match entry {
                Child::Spread(value) => {
                    array.text("...", origin);
                    array.append(value.pieces);
                }
                Child::Item(value) if per_entry && value.reactive => {
                    array.text(self.style.arrow(), origin);
                    self.write_arrow_body(&mut array, value, origin);
                }
                Child::Item(value) => array.append(value.pieces),
            }
        }
        array.text("]", origin);

        Some(Prop::Field {
            key,
            value: Value::generated(array),
            wrap,
        })
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    /// Copies `expr` from the source with nested JSX rewritten.
    fn expr(&mut self, expr: &Expr, scope: &ScopeFrame<'_>) -> Result<Value, TransformError> {
        let range = self.file.span(expr.span());
        let mut splicer = JsxSplicer::new(self, scope);
        expr.visit_with(&mut splicer);
        let mut edits = splicer.finish()?;
        edits.extend(self.imports.rewrites_within(range));
        let spliced = emit::splice(range, edits);

        let pieces = if matches!(expr, Expr::Seq(_)) {
            let mut wrapped = Pieces::default();
            wrapped.text("(", range);
            wrapped.append(spliced);
            wrapped.text(")", range);
            wrapped
        } else {
            spliced
        };
        Ok(Value {
            pieces,
            reactive: is_reactive(expr),
            object_literal: matches!(strip_parens(expr), Expr::Object(_)),
        })
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    fn write_object(&self, out: &mut Pieces, props: Vec<Prop>, origin: Span) {
        if props.is_empty() {
            out.text("{}", origin);
            return;
        }
        out.text(self.style.open_object(), origin);
        for (index, prop) in props.into_iter().enumerate() {
            if index > 0 {
                out.text(self.style.comma(), origin);
            }
            match prop {
                Prop::Spread(value) => {
                    out.text("...", origin);
                    out.append(value.pieces);
                }
                Prop::Field { key, value, wrap } => {
                    let key = text::property_key(&key);
                    match wrap {
                        Wrap::Plain => {
                            out.text(&key, origin);
                            out.text(self.style.colon(), origin);
                            out.append(value.pieces);
                        }
                        Wrap::Thunk => {
                            out.text(&key, origin);
                            out.text(self.style.colon(), origin);
                            out.text(self.style.arrow(), origin);
                            self.write_arrow_body(out, value, origin);
                        }
                        Wrap::Getter => {
                            let (open, close) = self.style.getter(&key);
                            out.text(&open, origin);
                            out.append(value.pieces);
                            out.text(close, origin);
                        }
                    }
                }
            }
        }
        out.text(self.style.close_object(), origin);
    }

    fn write_arrow_body(&self, out: &mut Pieces, value: Value, origin: Span) {
        if value.object_literal {
            out.text("(", origin);
            out.append(value.pieces);
            out.text(")", origin);
        } else {
            out.append(value.pieces);
        }
    }
}

/// Collects an edit for every outermost JSX node it visits.
struct JsxSplicer<'r, 'a, 's> {
    rewriter: &'r mut Rewriter<'a>,
    scope: &'s ScopeFrame<'s>,
    edits: Vec<Edit>,
    error: Option<TransformError>,
}

impl<'r, 'a, 's> JsxSplicer<'r, 'a, 's> {
    fn new(rewriter: &'r mut Rewriter<'a>, scope: &'s ScopeFrame<'s>) -> Self {
        Self {
            rewriter,
            scope,
            edits: Vec::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<Vec<Edit>, TransformError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.edits),
        }
    }

    fn record(&mut self, span: swc_common::Span, result: Result<Pieces, TransformError>) {
        match result {
            Ok(pieces) => {
                let span = self.rewriter.file.span(span);
                self.edits.push(Edit::replace(span, pieces));
            }
            Err(error) => self.error = Some(error),
        }
    }
}

impl Visit for JsxSplicer<'_, '_, '_> {
    fn visit_jsx_element(&mut self, element: &JSXElement) {
        if self.error.is_none() {
            let result = self.rewriter.element(element, self.scope);
            self.record(element.span, result);
        }
    }

    fn visit_jsx_fragment(&mut self, fragment: &JSXFragment) {
        if self.error.is_none() {
            let result = self.rewriter.fragment(fragment, self.scope);
            self.record(fragment.span, result);
        }
    }
}

/// Resolves an element name to its tag and the namespace the name selects.
fn resolve_tag(name: &JSXElementName) -> (Tag, Option<Namespace>) {
    match name {
        JSXElementName::Ident(ident) => {
            let name: &str = ident.sym.as_ref();
            if name == "svg" {
                (Tag::Literal(name.into()), Some(Namespace::Svg))
            } else {
                (Tag::from_name(name), None)
            }
        }
        JSXElementName::JSXMemberExpr(member) => (Tag::Member(member_path(member).into()), None),
        JSXElementName::JSXNamespacedName(namespaced) => {
            let prefix: &str = namespaced.ns.sym.as_ref();
            let local: &str = namespaced.name.sym.as_ref();
            match Namespace::from_prefix(prefix) {
                Some(namespace) => (Tag::Literal(local.into()), Some(namespace)),
                None => (Tag::Literal(format!("{prefix}:{local}").into()), None),
            }
        }
    }
}

fn member_path(member: &JSXMemberExpr) -> String {
    let object = match &member.obj {
        JSXObject::Ident(ident) => ident.sym.to_string(),
        JSXObject::JSXMemberExpr(inner) => member_path(inner),
    };
    format!("{object}.{}", member.prop.sym)
}

fn attr_name(name: &JSXAttrName) -> String {
    match name {
        JSXAttrName::Ident(ident) => ident.sym.to_string(),
        JSXAttrName::JSXNamespacedName(namespaced) => {
            format!("{}:{}", namespaced.ns.sym, namespaced.name.sym)
        }
    }
}

fn attribute_wrap(name: &str, reactive: bool, intrinsic: bool) -> Wrap {
    if !reactive || name.starts_with("on") {
        Wrap::Plain
    } else if name.starts_with("is:") || !intrinsic {
        Wrap::Getter
    } else {
        Wrap::Thunk
    }
}

fn is_empty_container(child: &JSXElementChild) -> bool {
    matches!(
        child,
        JSXElementChild::JSXExprContainer(container)
            if matches!(container.expr, JSXExpr::JSXEmptyExpr(_))
    )
}

fn strip_parens(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_wrap() {
        assert_eq!(attribute_wrap("onClick", true, true), Wrap::Plain);
        assert_eq!(attribute_wrap("on:click", true, false), Wrap::Plain);
        assert_eq!(attribute_wrap("is:visible", true, true), Wrap::Getter);
        assert_eq!(attribute_wrap("title", true, true), Wrap::Thunk);
        assert_eq!(attribute_wrap("title", true, false), Wrap::Getter);
        assert_eq!(attribute_wrap("title", false, false), Wrap::Plain);
    }

    #[test]
    fn test_resolve_namespaced_tags() {
        let parse = |src: &str| {
            let (_, module) = SourceFile::parse("t.jsx", src).unwrap();
            let mut found = None;
            struct Find<'x>(&'x mut Option<(Tag, Option<Namespace>)>);
            impl Visit for Find<'_> {
                fn visit_jsx_element(&mut self, element: &JSXElement) {
                    if self.0.is_none() {
                        *self.0 = Some(resolve_tag(&element.opening.name));
                    }
                }
            }
            module.visit_with(&mut Find(&mut found));
            found.unwrap()
        };
        assert_eq!(
            parse("<svg:g/>"),
            (Tag::Literal("g".into()), Some(Namespace::Svg))
        );
        assert_eq!(
            parse("<xhtml:div/>"),
            (Tag::Literal("div".into()), Some(Namespace::Xhtml))
        );
        assert_eq!(parse("<foo:bar/>"), (Tag::Literal("foo:bar".into()), None));
        assert_eq!(parse("<svg/>"), (Tag::Literal("svg".into()), Some(Namespace::Svg)));
        assert_eq!(parse("<A.B.C/>"), (Tag::Member("A.B.C".into()), None));
    }
}
