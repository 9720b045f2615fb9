//! Stack layout: assigns every local a negative `rbp`-relative offset.
//!
//! Per block, the locals introduced by that block alone (identifiers
//! assigned there that are not already visible in an enclosing scope, and
//! that are not top-level globals) are sorted by size descending and packed
//! downward from the block's starting offset. Sibling blocks (an `if`'s true
//! and false bodies) both start from the same offset and the deeper of the
//! two becomes the frame's high-water mark — they never run concurrently, so
//! there is no reason to reserve space for both at once.

use std::collections::{HashMap, HashSet};

use lumenc_par::ast::{Block, ElseBranch, ExprKind, FunctionDef, IfStmt, Stmt};
use lumenc_util::{Symbol, ValueType};

pub struct FrameLayout {
    pub offsets: HashMap<Symbol, i32>,
    /// Total bytes of local storage this function's frame needs, before the
    /// callee-saved-register and stack-alignment adjustments.
    pub frame_size: u32,
}

fn round_up(n: u64, multiple: u64) -> u64 {
    if multiple == 0 {
        return n;
    }
    n.div_ceil(multiple) * multiple
}

/// Packs `offset` (already negative or zero) downward by `ty`'s size,
/// aligning the result to that size so e.g. an `i64` never straddles a
/// 4-byte boundary left behind by a preceding `i32`.
fn place(offset: i64, ty: ValueType) -> i64 {
    let size = ty.size().max(1) as i64;
    let candidate = offset - size;
    -(round_up((-candidate) as u64, size as u64) as i64)
}

fn is_visible(scopes: &[HashSet<Symbol>], sym: Symbol) -> bool {
    scopes.iter().any(|scope| scope.contains(&sym))
}

/// Insertion sort by type size descending (a stable sort by a coarse key
/// over a handful of locals per block has no reason to reach for anything
/// fancier).
fn sort_by_size_descending(locals: &mut [(Symbol, ValueType)]) {
    for i in 1..locals.len() {
        let mut j = i;
        while j > 0 && locals[j - 1].1.size() < locals[j].1.size() {
            locals.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn collect_new_locals(block: &Block, visible: &[HashSet<Symbol>]) -> Vec<(Symbol, ValueType)> {
    let mut locals = Vec::new();
    for stmt in &block.stmts {
        if let Stmt::Expr(e) = stmt {
            if let ExprKind::Assign { target, .. } = &e.kind {
                if !is_visible(visible, *target) && !locals.iter().any(|(s, _)| s == target) {
                    locals.push((*target, e.value_type));
                }
            }
        }
    }
    sort_by_size_descending(&mut locals);
    locals
}

/// Lays out one block, returns the deepest (most negative) offset reached by
/// it or any of its descendants.
fn layout_block(
    block: &Block,
    visible: &mut Vec<HashSet<Symbol>>,
    offsets: &mut HashMap<Symbol, i32>,
    base_offset: i64,
) -> i64 {
    visible.push(HashSet::new());

    let mut offset = base_offset;
    for (sym, ty) in collect_new_locals(block, visible) {
        offset = place(offset, ty);
        offsets.insert(sym, offset as i32);
        visible.last_mut().unwrap().insert(sym);
    }

    let mut deepest = offset;
    for stmt in &block.stmts {
        let reached = match stmt {
            Stmt::Block(b) => layout_block(b, visible, offsets, offset),
            Stmt::While(w) => layout_block(&w.body, visible, offsets, offset),
            Stmt::If(i) => layout_if(i, visible, offsets, offset),
            _ => offset,
        };
        deepest = deepest.min(reached);
    }

    visible.pop();
    deepest
}

fn layout_if(
    stmt: &IfStmt,
    visible: &mut Vec<HashSet<Symbol>>,
    offsets: &mut HashMap<Symbol, i32>,
    base_offset: i64,
) -> i64 {
    let then_depth = layout_block(&stmt.then_body, visible, offsets, base_offset);
    let else_depth = match &stmt.else_branch {
        None => base_offset,
        Some(ElseBranch::Block(b)) => layout_block(b, visible, offsets, base_offset),
        Some(ElseBranch::If(nested)) => layout_if(nested, visible, offsets, base_offset),
    };
    then_depth.min(else_depth)
}

/// Builds the full offset table for `f`: parameters first (so they land at
/// the shallowest slots), then the body. `globals` is seeded into the
/// outermost visible scope so an assignment whose target is a global never
/// gets mistaken for a new local and re-allocated on the stack.
pub fn build_function_layout(f: &FunctionDef, globals: &HashSet<Symbol>) -> FrameLayout {
    let mut visible = vec![globals.clone()];
    let mut offsets = HashMap::new();
    let mut offset: i64 = 0;

    for param in &f.params {
        offset = place(offset, param.ty);
        offsets.insert(param.name, offset as i32);
        visible[0].insert(param.name);
    }

    let deepest = layout_block(&f.body, &mut visible, &mut offsets, offset);
    FrameLayout {
        offsets,
        frame_size: (-deepest) as u32,
    }
}
