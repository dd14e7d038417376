//! Final pass over statement groups.
//!
//! When this runs every reachable instruction belongs to a statement group
//! and every handler has been folded into a try statement. Groups are not
//! folded into loops or multi-way conditionals: the goto/label form is the
//! output contract, and loop recovery belongs in a pass of its own.

use ildc_ir::stmt::{BlockId, Stmt};

use crate::body::DecompiledBody;

/// Put statement groups, and the statements of every block, in address
/// order.
///
/// The builder explores a branch target before the fallthrough run, so a
/// block receives the target's statements first. Each group covers one
/// contiguous run of instructions; laying groups out by offset puts every
/// fallthrough run directly after the code that falls into it.
pub fn structure_groups(body: &mut DecompiledBody) {
    body.groups.sort_by_key(|group| group.offset);

    let mut order: Vec<Vec<usize>> = vec![Vec::new(); body.blocks.len()];
    for handle in body.groups.iter().flat_map(|g| &g.statements) {
        if let Some(slots) = order.get_mut(handle.block.0 as usize) {
            slots.push(handle.index);
        }
    }

    let mut remap: Vec<Vec<usize>> = Vec::with_capacity(order.len());
    for (block_index, wanted) in order.iter().enumerate() {
        let block = &mut body.blocks[BlockId(block_index as u32)];
        let mut slots: Vec<Option<Stmt>> = std::mem::take(&mut block.statements)
            .into_iter()
            .map(Some)
            .collect();
        let mut new_index = vec![usize::MAX; slots.len()];
        let mut statements = Vec::with_capacity(slots.len());

        let grouped = wanted.iter().copied();
        // Statements outside every group keep their relative order at the end.
        let rest = 0..slots.len();
        for old in grouped.chain(rest) {
            if let Some(stmt) = slots.get_mut(old).and_then(Option::take) {
                new_index[old] = statements.len();
                statements.push(stmt);
            }
        }
        block.statements = statements;
        remap.push(new_index);
    }

    for handle in body.groups.iter_mut().flat_map(|g| &mut g.statements) {
        if let Some(&index) = remap
            .get(handle.block.0 as usize)
            .and_then(|m| m.get(handle.index))
        {
            handle.index = index;
        }
    }

    let labeled = body.groups.iter().filter(|g| g.label.is_some()).count();
    log::debug!(
        "{} statement group(s), {} labeled; keeping goto form",
        body.groups.len(),
        labeled
    );
}
