//! Runtime import bookkeeping and module specifier rewriting.

use crate::context::RuntimeName;
use crate::emit::{Edit, Style};
use crate::input::SourceFile;
use crate::text;
use crate::TranspileOptions;
use rustc_hash::FxHashSet;
use source_map::{ByteOffset, Span};
use swc_ecma_ast::{
    CallExpr, Callee, ExportAll, Expr, ImportDecl, ImportSpecifier, Lit, Module,
    ModuleExportName, NamedExport, Str,
};
use swc_ecma_visit::{Visit, VisitWith};

/// Where missing runtime names are added to an existing import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeTarget {
    /// After the last `{ ... }` specifier.
    Named(ByteOffset),
    /// After a lone default specifier; a brace group is appended.
    DefaultOnly(ByteOffset),
}

/// Tracks which runtime names a file needs and which it already imports.
///
/// Built fresh for every transform.
#[derive(Debug)]
pub(crate) struct ImportTable {
    runtime_module: String,
    used: FxHashSet<RuntimeName>,
    imported: FxHashSet<RuntimeName>,
    merge: Option<MergeTarget>,
    /// Offset where a new import declaration goes.
    top: ByteOffset,
    /// Specifier string literals to replace.
    rewrites: Vec<(Span, String)>,
}

impl ImportTable {
    /// Scans the module's imports and records specifier rewrites.
    pub(crate) fn scan(module: &Module, file: &SourceFile<'_>, options: &TranspileOptions) -> Self {
        let mut scanner = ImportScanner {
            file,
            options,
            table: Self {
                runtime_module: options.runtime_module.clone(),
                used: FxHashSet::default(),
                imported: FxHashSet::default(),
                merge: None,
                top: top_offset(file.text),
                rewrites: Vec::new(),
            },
        };
        module.visit_with(&mut scanner);
        scanner.table
    }

    /// Marks `name` as referenced by generated code.
    pub(crate) fn use_name(&mut self, name: RuntimeName) {
        self.used.insert(name);
    }

    /// Specifier rewrites that fall inside `range`.
    pub(crate) fn rewrites_within(&self, range: Span) -> Vec<Edit> {
        self.rewrites
            .iter()
            .filter(|(span, _)| range.contains_span(*span))
            .map(|(span, text)| Edit::replace_text(*span, text))
            .collect()
    }

    /// The edit that imports every used name not imported yet.
    pub(crate) fn finish(&self, style: Style) -> Option<Edit> {
        let missing: Vec<&str> = RuntimeName::ALL
            .into_iter()
            .filter(|name| self.used.contains(name) && !self.imported.contains(name))
            .map(RuntimeName::as_str)
            .collect();
        if missing.is_empty() {
            return None;
        }
        let sep = style.comma();
        let edit = match self.merge {
            Some(MergeTarget::Named(offset)) => {
                Edit::insert(offset, &format!("{sep}{}", missing.join(sep)))
            }
            Some(MergeTarget::DefaultOnly(offset)) => Edit::insert(
                offset,
                &format!(
                    "{sep}{}{}{}",
                    style.open_object(),
                    missing.join(sep),
                    style.close_object()
                ),
            ),
            None => Edit::insert(
                self.top,
                &style.import_declaration(&missing, &self.runtime_module),
            ),
        };
        Some(edit)
    }

    fn record_runtime_import(&mut self, decl: &ImportDecl, file: &SourceFile<'_>) {
        let mut last_named = None;
        let mut default = None;
        let mut namespace = false;
        for specifier in &decl.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => {
                    last_named = Some(file.span(named.span).end);
                    if named.is_type_only {
                        continue;
                    }
                    let local: &str = named.local.sym.as_ref();
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => s.value.to_string_lossy().into_owned(),
                        None => local.to_string(),
                    };
                    if let Some(name) = RuntimeName::ALL
                        .into_iter()
                        .find(|name| name.as_str() == local && name.as_str() == imported)
                    {
                        self.imported.insert(name);
                    }
                }
                ImportSpecifier::Default(specifier) => {
                    default = Some(file.span(specifier.span).end);
                }
                ImportSpecifier::Namespace(_) => namespace = true,
            }
        }
        if self.merge.is_none() && !namespace {
            self.merge = last_named
                .map(MergeTarget::Named)
                .or(default.map(MergeTarget::DefaultOnly));
        }
    }
}

/// Just past a leading `#!` line, otherwise the start of the file.
fn top_offset(text: &str) -> ByteOffset {
    if !text.starts_with("#!") {
        return ByteOffset::from(0);
    }
    let end = text.find('\n').map_or(text.len(), |newline| newline + 1);
    ByteOffset::from(end as u32)
}

struct ImportScanner<'f, 'a> {
    file: &'f SourceFile<'a>,
    options: &'f TranspileOptions,
    table: ImportTable,
}

impl ImportScanner<'_, '_> {
    /// Returns the specifier as it will appear in the output.
    fn visit_specifier(&mut self, src: &Str) -> String {
        let value = src.value.to_string_lossy().into_owned();
        let Some(rewritten) = self.options.rewrite_specifier(&value) else {
            return value;
        };
        let span = self.file.span(src.span);
        let quote = self
            .file
            .slice(span)
            .chars()
            .next()
            .filter(|c| *c == '\'' || *c == '"')
            .unwrap_or('"');
        let literal = if rewritten.contains(quote) || rewritten.contains('\\') {
            text::quote(&rewritten)
        } else {
            format!("{quote}{rewritten}{quote}")
        };
        self.table.rewrites.push((span, literal));
        rewritten
    }
}

impl Visit for ImportScanner<'_, '_> {
    fn visit_import_decl(&mut self, decl: &ImportDecl) {
        let specifier = self.visit_specifier(&decl.src);
        if specifier == self.table.runtime_module && !decl.type_only {
            self.table.record_runtime_import(decl, self.file);
        }
    }

    fn visit_export_all(&mut self, export: &ExportAll) {
        self.visit_specifier(&export.src);
    }

    fn visit_named_export(&mut self, export: &NamedExport) {
        if let Some(src) = &export.src {
            self.visit_specifier(src);
        }
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Callee::Import(_) = &call.callee {
            if let Some(arg) = call.args.first().filter(|arg| arg.spread.is_none()) {
                if let Expr::Lit(Lit::Str(src)) = &*arg.expr {
                    self.visit_specifier(src);
                }
            }
        }
        call.visit_children_with(self);
    }
}
