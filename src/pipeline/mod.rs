pub mod stage1_resolve;
pub mod stage2_order;
pub mod stage3_labels;
pub mod stage4_stats;
pub mod stage5_dataset;
pub mod stage6_output;
