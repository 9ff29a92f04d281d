use crate::parser::{Case, Expr, Function, Stmt};

/// Removes every `defer` from a function body and replays the deferred
/// expressions, first registered first, in front of each later `return`.
///
/// The pending list is per function: a `defer` inside a nested block keeps
/// firing on returns after that block ends. A body that can run off its
/// closing brace replays the pending list there too.
pub fn rewrite(function: &mut Function) {
    let Some(body) = function.body.take() else {
        return;
    };
    if body.is_empty() {
        function.body = Some(body);
        return;
    }

    let mut body = body;
    let is_main = function.name() == Some("main");
    if !is_main && function.returns_void() && !matches!(body.last(), Some(Stmt::Return(_))) {
        body.push(Stmt::Return(None));
    }

    let falls_off = !matches!(body.last(), Some(Stmt::Return(_)));
    let mut pending = vec![];
    let mut body = rewrite_block(body, &mut pending);
    // control can reach the closing brace without a return
    if falls_off {
        body.extend(pending.iter().cloned().map(Stmt::Expr));
    }
    if !pending.is_empty() {
        log::trace!(
            "{}: {} deferred expression(s)",
            function.name().unwrap_or_default(),
            pending.len()
        );
    }
    function.body = Some(body);
}

fn rewrite_block(stmts: Vec<Stmt>, pending: &mut Vec<Expr>) -> Vec<Stmt> {
    stmts
        .into_iter()
        .flat_map(|stmt| rewrite_stmt(stmt, pending))
        .collect()
}

/// A statement slot that holds exactly one statement, such as an `if` arm.
fn rewrite_single(stmt: Stmt, pending: &mut Vec<Expr>) -> Stmt {
    let mut stmts = rewrite_stmt(stmt, pending);
    match stmts.len() {
        0 => Stmt::Empty,
        1 => stmts.remove(0),
        _ => Stmt::Block(stmts),
    }
}

fn rewrite_stmt(stmt: Stmt, pending: &mut Vec<Expr>) -> Vec<Stmt> {
    let stmt = match stmt {
        Stmt::Defer(expr) => {
            pending.push(expr);
            return vec![];
        }
        Stmt::Return(value) => {
            let mut out = pending.iter().cloned().map(Stmt::Expr).collect::<Vec<_>>();
            out.push(Stmt::Return(value));
            return out;
        }
        Stmt::Block(stmts) => Stmt::Block(rewrite_block(stmts, pending)),
        Stmt::If {
            cond,
            then,
            otherwise,
        } => Stmt::If {
            cond,
            then: Box::new(rewrite_single(*then, pending)),
            otherwise: otherwise.map(|o| Box::new(rewrite_single(*o, pending))),
        },
        Stmt::While { cond, body } => Stmt::While {
            cond,
            body: Box::new(rewrite_single(*body, pending)),
        },
        Stmt::DoWhile { body, cond } => Stmt::DoWhile {
            body: Box::new(rewrite_single(*body, pending)),
            cond,
        },
        Stmt::For {
            init,
            cond,
            step,
            body,
        } => Stmt::For {
            init,
            cond,
            step,
            body: Box::new(rewrite_single(*body, pending)),
        },
        Stmt::Switch { value, cases } => Stmt::Switch {
            value,
            cases: cases
                .into_iter()
                .map(|Case { label, body }| Case {
                    label,
                    body: rewrite_block(body, pending),
                })
                .collect(),
        },
        other @ (Stmt::Declaration(_)
        | Stmt::Expr(_)
        | Stmt::Break
        | Stmt::Continue
        | Stmt::Empty) => other,
    };
    vec![stmt]
}
