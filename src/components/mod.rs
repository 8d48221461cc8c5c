//! UI building blocks.

pub mod force_graph;
pub mod report;
pub mod research_form;
mod sidebar;
