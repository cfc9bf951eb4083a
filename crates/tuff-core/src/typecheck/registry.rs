//! Top-level declaration registry
//!
//! One pass over the program body collects every struct, enum, function and
//! type alias by name so that later declarations can be referenced from
//! earlier ones. The registry borrows from the [`Program`] it was built from.

use crate::ast::{EnumDecl, FnDecl, Program, Stmt, StructDecl, TypeExpr};
use indexmap::IndexMap;
use tracing::debug;

/// A callable known to the checker.
#[derive(Debug, Clone, Copy)]
pub struct FnSignature<'p> {
    pub decl: &'p FnDecl,
    /// Extern functions have no body; their argument types are not checked.
    pub is_extern: bool,
}

/// A typed top-level binding (`let x: T = ...` or `extern let x: T;`).
#[derive(Debug, Clone, Copy)]
pub struct GlobalDecl<'p> {
    pub name: &'p str,
    pub ty: &'p TypeExpr,
}

#[derive(Debug, Default)]
pub struct Registry<'p> {
    structs: IndexMap<&'p str, &'p StructDecl>,
    enums: IndexMap<&'p str, &'p EnumDecl>,
    functions: IndexMap<&'p str, FnSignature<'p>>,
    /// Alias targets; `None` for opaque `extern type` declarations.
    aliases: IndexMap<&'p str, Option<&'p TypeExpr>>,
    globals: Vec<GlobalDecl<'p>>,
}

impl<'p> Registry<'p> {
    pub fn from_program(program: &'p Program) -> Self {
        let mut registry = Registry::default();
        for stmt in &program.body {
            match stmt {
                Stmt::StructDecl(decl) => {
                    registry.structs.insert(&decl.name, decl);
                }
                Stmt::EnumDecl(decl) => {
                    registry.enums.insert(&decl.name, decl);
                }
                Stmt::FnDecl(decl) => {
                    registry.functions.insert(
                        &decl.name,
                        FnSignature {
                            decl,
                            is_extern: false,
                        },
                    );
                }
                Stmt::ExternFnDecl(decl) => {
                    registry.functions.insert(
                        &decl.name,
                        FnSignature {
                            decl,
                            is_extern: true,
                        },
                    );
                }
                Stmt::TypeAlias(decl) => {
                    registry.aliases.insert(&decl.name, Some(&decl.aliased_type));
                }
                Stmt::ExternTypeDecl(decl) => {
                    registry.aliases.insert(&decl.name, None);
                }
                Stmt::LetDecl(decl) => {
                    if let Some(ty) = &decl.ty {
                        registry.globals.push(GlobalDecl { name: &decl.name, ty });
                    }
                }
                Stmt::ExternLetDecl(decl) => {
                    registry.globals.push(GlobalDecl {
                        name: &decl.name,
                        ty: &decl.ty,
                    });
                }
                _ => {}
            }
        }

        debug!(
            structs = registry.structs.len(),
            enums = registry.enums.len(),
            functions = registry.functions.len(),
            aliases = registry.aliases.len(),
            globals = registry.globals.len(),
            "registered declarations"
        );
        registry
    }

    pub fn struct_decl(&self, name: &str) -> Option<&'p StructDecl> {
        self.structs.get(name).copied()
    }

    pub fn enum_decl(&self, name: &str) -> Option<&'p EnumDecl> {
        self.enums.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<FnSignature<'p>> {
        self.functions.get(name).copied()
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.contains_key(name)
    }

    /// Alias target, or `None` when `name` is not an alias. An opaque extern
    /// type is an alias with no target.
    pub fn alias_target(&self, name: &str) -> Option<Option<&'p TypeExpr>> {
        self.aliases.get(name).copied()
    }

    pub fn globals(&self) -> &[GlobalDecl<'p>] {
        &self.globals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    #[test]
    fn test_registers_all_declaration_kinds() {
        let program = parse(
            &lex("struct P { x: I32 }\n\
                  enum Color { Red, Green }\n\
                  type Shape = P | Color;\n\
                  extern type Handle;\n\
                  fn f(): I32 => 1;\n\
                  extern fn g(x: I32): I32;\n\
                  let LIMIT: I32 = 10;\n\
                  let untyped = 3;\n\
                  extern let OUT: I32;")
            .unwrap(),
        )
        .unwrap();
        let registry = Registry::from_program(&program);

        assert!(registry.struct_decl("P").is_some());
        assert_eq!(registry.enum_decl("Color").map(|decl| decl.variants.len()), Some(2));
        assert!(matches!(registry.alias_target("Shape"), Some(Some(TypeExpr::UnionType(_)))));
        assert!(matches!(registry.alias_target("Handle"), Some(None)));
        assert!(registry.alias_target("P").is_none());
        assert!(!registry.function("f").unwrap().is_extern);
        assert!(registry.function("g").unwrap().is_extern);

        let globals: Vec<&str> = registry.globals().iter().map(|global| global.name).collect();
        assert_eq!(globals, vec!["LIMIT", "OUT"]);
    }

    #[test]
    fn test_later_declarations_win() {
        let program = parse(&lex("fn f(): I32 => 1;\nfn f(x: I32): I32 => x;").unwrap()).unwrap();
        let registry = Registry::from_program(&program);
        assert_eq!(registry.function("f").unwrap().decl.params.len(), 1);
    }
}
