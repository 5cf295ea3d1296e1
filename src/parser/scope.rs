//! Local-name analysis for function bodies
//!
//! A name is local to a function if it is a parameter or is bound anywhere in
//! the body (assignment, `for` target, `def`, `import`, `except ... as`,
//! `del`), unless the body declares it `global`. Nested function bodies are
//! separate scopes and are not descended into.

use crate::parser::ast::*;
use rustc_hash::FxHashSet;

/// Compute `(locals, globals)` for a function with the given parameters and body
pub fn analyze_function(
    params: &[Param],
    body: &[Stmt],
) -> (FxHashSet<String>, FxHashSet<String>) {
    let mut bound = FxHashSet::default();
    let mut globals = FxHashSet::default();

    for param in params {
        bound.insert(param.name.clone());
    }
    collect_block(body, &mut bound, &mut globals);

    bound.retain(|name| !globals.contains(name));
    (bound, globals)
}

fn collect_block(body: &[Stmt], bound: &mut FxHashSet<String>, globals: &mut FxHashSet<String>) {
    for stmt in body {
        collect_stmt(stmt, bound, globals);
    }
}

fn collect_stmt(stmt: &Stmt, bound: &mut FxHashSet<String>, globals: &mut FxHashSet<String>) {
    match stmt {
        Stmt::Assign { targets, .. } => {
            for target in targets {
                collect_target(target, bound);
            }
        }
        Stmt::AugAssign { target, .. } => collect_target(target, bound),
        Stmt::Del { targets, .. } => {
            for target in targets {
                collect_target(target, bound);
            }
        }
        Stmt::For {
            target,
            body,
            orelse,
            ..
        } => {
            collect_target(target, bound);
            collect_block(body, bound, globals);
            collect_block(orelse, bound, globals);
        }
        Stmt::If { body, orelse, .. } | Stmt::While { body, orelse, .. } => {
            collect_block(body, bound, globals);
            collect_block(orelse, bound, globals);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finally,
            ..
        } => {
            collect_block(body, bound, globals);
            for handler in handlers {
                if let Some(name) = &handler.name {
                    bound.insert(name.clone());
                }
                collect_block(&handler.body, bound, globals);
            }
            collect_block(orelse, bound, globals);
            collect_block(finally, bound, globals);
        }
        Stmt::FunctionDef(def) => {
            bound.insert(def.name.clone());
        }
        Stmt::Import { modules, .. } => {
            for module in modules {
                // `import a.b` binds `a`
                let binding = match &module.alias {
                    Some(alias) => alias.as_str(),
                    None => module.name.split('.').next().unwrap_or(&module.name),
                };
                bound.insert(binding.to_string());
            }
        }
        Stmt::ImportFrom { names, .. } => {
            for name in names {
                bound.insert(name.binding().to_string());
            }
        }
        Stmt::Global { names, .. } => {
            globals.extend(names.iter().cloned());
        }
        Stmt::Expr { .. }
        | Stmt::Pass { .. }
        | Stmt::Break { .. }
        | Stmt::Continue { .. }
        | Stmt::Return { .. }
        | Stmt::Assert { .. }
        | Stmt::Raise { .. } => {}
    }
}

fn collect_target(target: &Target, bound: &mut FxHashSet<String>) {
    match target {
        Target::Name(name, _) => {
            bound.insert(name.clone());
        }
        Target::Tuple(items, _) => {
            for item in items {
                collect_target(item, bound);
            }
        }
        // Item assignment mutates an object; it binds no name
        Target::Subscript { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::compile;

    fn function(source: &str) -> std::rc::Rc<FunctionDef> {
        let program = compile(source, "<test>").expect("Parsing failed");
        match program.body.into_iter().next() {
            Some(Stmt::FunctionDef(def)) => def,
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_locals_include_nested_bindings() {
        let def = function(
            "def f(n):\n    for i in range(n):\n        if i:\n            a, b = i, n\n    try:\n        pass\n    except ValueError as err:\n        pass\n    import math\n",
        );
        for name in ["n", "i", "a", "b", "err", "math"] {
            assert!(def.locals.contains(name), "missing local {}", name);
        }
    }

    #[test]
    fn test_global_declaration_removes_local() {
        let def = function("def bump():\n    global count\n    count += 1\n");
        assert!(!def.locals.contains("count"));
        assert!(def.globals.contains("count"));
    }

    #[test]
    fn test_nested_def_is_separate_scope() {
        let def = function("def outer():\n    def inner():\n        hidden = 1\n    return inner\n");
        assert!(def.locals.contains("inner"));
        assert!(!def.locals.contains("hidden"));
    }

    #[test]
    fn test_subscript_assignment_binds_nothing() {
        let def = function("def f():\n    data[0] = 1\n");
        assert!(!def.locals.contains("data"));
    }
}
