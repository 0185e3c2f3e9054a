//! Table rendering of managed pods and sync results.

mod pod_list_ext;
mod sync_record;

pub use self::{
    pod_list_ext::PodListExt,
    sync_record::{SyncRecord, SyncRecordsExt},
};

fn new_table() -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    let _unused = table
        .load_preset(comfy_table::presets::NOTHING)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}
