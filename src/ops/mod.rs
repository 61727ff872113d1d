pub mod export;
pub mod import;
pub mod row_ops;
pub mod search_ops;
pub mod view_ops;

use crate::model::changes::ShadowTableChanges;
use crate::model::outline::Outline;
use crate::model::row::RowId;

/// Reproject the outline and add redraws for the rows in `reload` that are
/// still visible afterwards.
pub(crate) fn reproject(outline: &mut Outline, reload: &[RowId]) -> ShadowTableChanges {
    let mut changes = outline.rebuild_shadow_table();
    changes.merge(ShadowTableChanges::reloading(outline.shadow_indices(reload)));
    changes
}

/// Like [`reproject`], after stamping the outline as modified.
pub(crate) fn rebuild_with_reloads(outline: &mut Outline, reload: &[RowId]) -> ShadowTableChanges {
    outline.touch();
    reproject(outline, reload)
}
