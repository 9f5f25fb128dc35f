//! Reactivity classification for attribute values and children.
//!
//! An expression is reactive when evaluating it may read a signal, which the
//! transpiler approximates as "performs a call or a property access". Such
//! expressions are deferred into thunks or getters so the runtime can
//! re-evaluate them; everything else is evaluated once, inline.
//!
//! The search does not enter code whose evaluation the caller does not
//! control: function and arrow bodies, class bodies, `new` expressions and
//! nested JSX (which is rewritten into its own factory call).

use swc_ecma_ast::{
    ArrowExpr, CallExpr, Class, Expr, Function, GetterProp, JSXElement, JSXFragment, MemberExpr,
    NewExpr, OptChainExpr, SetterProp, SuperPropExpr, TaggedTpl,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Returns true if `expr` must be deferred for reactive re-evaluation.
pub fn is_reactive(expr: &Expr) -> bool {
    let mut finder = ReactiveAccessFinder::default();
    expr.visit_with(&mut finder);
    finder.found
}

#[derive(Default)]
struct ReactiveAccessFinder {
    found: bool,
}

impl Visit for ReactiveAccessFinder {
    fn visit_expr(&mut self, expr: &Expr) {
        if !self.found {
            expr.visit_children_with(self);
        }
    }

    fn visit_call_expr(&mut self, _: &CallExpr) {
        self.found = true;
    }

    fn visit_member_expr(&mut self, _: &MemberExpr) {
        self.found = true;
    }

    fn visit_opt_chain_expr(&mut self, _: &OptChainExpr) {
        self.found = true;
    }

    fn visit_super_prop_expr(&mut self, _: &SuperPropExpr) {
        self.found = true;
    }

    fn visit_tagged_tpl(&mut self, _: &TaggedTpl) {
        self.found = true;
    }

    // Boundaries.

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}

    fn visit_function(&mut self, _: &Function) {}

    fn visit_getter_prop(&mut self, _: &GetterProp) {}

    fn visit_setter_prop(&mut self, _: &SetterProp) {}

    fn visit_class(&mut self, _: &Class) {}

    fn visit_new_expr(&mut self, _: &NewExpr) {}

    fn visit_jsx_element(&mut self, _: &JSXElement) {}

    fn visit_jsx_fragment(&mut self, _: &JSXFragment) {}
}
