// Domain layer: core models and ports (interfaces) for the enrichment run.

pub mod model;
pub mod ports;
