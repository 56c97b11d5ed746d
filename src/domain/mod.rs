// Domain layer: repository models, check results and ports (interfaces).

pub mod model;
pub mod ports;
