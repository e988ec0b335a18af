//! Curation services: task selection, annotation resolution, spellcheck

pub mod composer;
pub mod correction_source;
pub mod fact_sink;
pub mod resolver;
pub mod selection;
pub mod spellcheck;
